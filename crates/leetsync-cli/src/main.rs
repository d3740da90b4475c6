//! leetsync command-line binary.
//!
//! Reads `leetsync.toml` (or the path given with `--config`), opens the
//! SQLite store, and runs one catalog or registry operation. Results are
//! printed to stdout as JSON.
//!
//! ```text
//! leetsync refresh
//! leetsync problem 1
//! leetsync random --difficulty hard
//! leetsync forum set <GROUP_ID> <CHANNEL_ID>
//! leetsync watch
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use leetsync_cli::{Engine, SyncConfig};
use leetsync_core::{catalog::RemoteCatalog as _, problem::Difficulty};
use serde::Serialize;
use serde_json::json;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "LeetCode catalog cache and thread registry")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "leetsync.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Resynchronise the store with the full remote catalog.
  Refresh,
  /// Resolve one problem by its frontend id.
  Problem { id: u32 },
  /// Resolve today's daily problem.
  Daily,
  /// Pick a random problem.
  Random {
    #[arg(short, long)]
    difficulty: Option<Difficulty>,
    /// Also consider premium problems.
    #[arg(long)]
    premium:    bool,
  },
  /// Delete a problem from the store and cache.
  Remove { id: u32 },
  /// List every known topic tag.
  Tags,
  /// Check whether the remote catalog answers.
  Health,
  /// Forum channel configuration.
  Forum {
    #[command(subcommand)]
    action: ForumAction,
  },
  /// Recorded discussion threads.
  Threads {
    #[command(subcommand)]
    action: ThreadsAction,
  },
  /// Refresh now and then every `refresh_interval_hours` until interrupted.
  Watch,
}

#[derive(Subcommand)]
enum ForumAction {
  /// Designate the forum channel for a group.
  Set { group_id: u64, channel_id: u64 },
  /// Show the forum channel configured for a group.
  Get { group_id: u64 },
}

#[derive(Subcommand)]
enum ThreadsAction {
  List,
  /// Forget a thread record, e.g. after deleting the thread by hand.
  Forget { thread_id: u64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = SyncConfig::load(&cli.config)?;
  let engine = Engine::open(&cfg).await?;

  match cli.command {
    Command::Refresh => {
      let summary = engine.problems.refresh().await.context("refresh failed")?;
      emit(&summary)
    }
    Command::Problem { id } => {
      let resolved = engine
        .problems
        .get_by_frontend_id(id)
        .await
        .with_context(|| format!("failed to resolve problem {id}"))?;
      emit(&json!({ "tier": resolved.tier, "problem": &*resolved.entry }))
    }
    Command::Daily => {
      let resolved = engine
        .problems
        .get_daily()
        .await
        .context("failed to resolve the daily problem")?;
      emit(&json!({ "tier": resolved.tier, "problem": &*resolved.entry }))
    }
    Command::Random { difficulty, premium } => {
      let entry = engine.problems.random(difficulty, premium).await?;
      emit(&*entry)
    }
    Command::Remove { id } => {
      let removed = engine.threads.remove_problem(id).await?;
      emit(&json!({ "frontend_id": id, "removed": removed }))
    }
    Command::Tags => emit(&engine.problems.tags().await?),
    Command::Health => {
      let healthy = engine.problems.remote().health_check().await?;
      emit(&json!({ "healthy": healthy }))
    }
    Command::Forum { action } => match action {
      ForumAction::Set { group_id, channel_id } => {
        emit(&engine.threads.set_forum_config(group_id, channel_id).await?)
      }
      ForumAction::Get { group_id } => {
        emit(&engine.threads.get_forum_config(group_id).await?)
      }
    },
    Command::Threads { action } => match action {
      ThreadsAction::List => emit(&engine.threads.list_threads().await?),
      ThreadsAction::Forget { thread_id } => {
        let deleted = engine.threads.delete_thread_record(thread_id).await?;
        emit(&json!({ "thread_id": thread_id, "deleted": deleted }))
      }
    },
    Command::Watch => watch(&engine, &cfg).await,
  }
}

fn emit(value: &impl Serialize) -> anyhow::Result<()> {
  let out = serde_json::to_string_pretty(value).context("failed to encode output")?;
  println!("{out}");
  Ok(())
}

/// Run the bulk refresh on a fixed interval. A failed refresh is logged and
/// retried at the next tick.
async fn watch(engine: &Engine, cfg: &SyncConfig) -> anyhow::Result<()> {
  let mut ticker = tokio::time::interval(cfg.refresh_interval());
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  info!(every_hours = cfg.refresh_interval_hours, "watching remote catalog");

  loop {
    tokio::select! {
      _ = ticker.tick() => match engine.problems.refresh().await {
        Ok(summary) => info!(
          problems = summary.problems,
          new_tags = summary.new_tags,
          associations = summary.associations,
          "scheduled refresh complete"
        ),
        Err(e) => error!(error = %e, "scheduled refresh failed"),
      },
      _ = tokio::signal::ctrl_c() => {
        info!("interrupted, stopping");
        return Ok(());
      }
    }
  }
}
