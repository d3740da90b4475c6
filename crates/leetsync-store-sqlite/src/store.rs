//! [`SqliteStore`]: the SQLite implementation of [`CatalogStore`].

use std::{
  collections::{BTreeSet, HashMap},
  path::Path,
};

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use leetsync_core::{
  forum::{ForumChannelConfig, NewThreadRecord, ThreadRecord},
  problem::{ProblemEntry, ProblemRecord, TopicTag},
  store::CatalogStore,
};

use crate::{
  encode::{
    encode_difficulty, encode_dt, encode_snowflake, forum_channel, raw_problem, raw_thread,
    RawEntry, RawThread, FORUM_COLUMNS, PROBLEM_COLUMNS, THREAD_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread, so every multi-statement read
/// below observes a single consistent state.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Count the rows of the association table. Exposed for diagnostics.
  pub async fn association_count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM problem_tags", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n as usize)
  }
}

// ─── Row loaders (run on the connection thread) ──────────────────────────────

fn load_problem(
  conn: &rusqlite::Connection,
  frontend_id: u32,
) -> rusqlite::Result<Option<RawEntry>> {
  let problem = conn
    .query_row(
      &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE frontend_id = ?1"),
      rusqlite::params![frontend_id],
      raw_problem,
    )
    .optional()?;

  let Some(problem) = problem else {
    return Ok(None);
  };

  let mut stmt = conn.prepare(
    "SELECT t.id, t.name
     FROM problem_tags pt
     JOIN topic_tags t ON t.id = pt.tag_id
     WHERE pt.problem_id = ?1
     ORDER BY t.name",
  )?;
  let tags = stmt
    .query_map(rusqlite::params![problem.id], |row| {
      Ok(TopicTag { id: row.get(0)?, name: row.get(1)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some(RawEntry { problem, tags }))
}

fn load_all_problems(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<RawEntry>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {PROBLEM_COLUMNS} FROM problems ORDER BY frontend_id"))?;
  let problems = stmt
    .query_map([], raw_problem)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut stmt = conn.prepare(
    "SELECT pt.problem_id, t.id, t.name
     FROM problem_tags pt
     JOIN topic_tags t ON t.id = pt.tag_id
     ORDER BY t.name",
  )?;
  let mut tags: HashMap<i64, Vec<TopicTag>> = HashMap::new();
  let rows = stmt.query_map([], |row| {
    Ok((row.get::<_, i64>(0)?, TopicTag { id: row.get(1)?, name: row.get(2)? }))
  })?;
  for row in rows {
    let (problem_row_id, tag) = row?;
    tags.entry(problem_row_id).or_default().push(tag);
  }

  Ok(
    problems
      .into_iter()
      .map(|problem| {
        let tags = tags.remove(&problem.id).unwrap_or_default();
        RawEntry { problem, tags }
      })
      .collect(),
  )
}

/// Owned column values of a [`ProblemRecord`], ready to move onto the
/// connection thread.
struct ProblemParams {
  problem_id:  u32,
  frontend_id: u32,
  title:       String,
  url:         String,
  difficulty:  i64,
  description: String,
  premium:     bool,
}

impl ProblemParams {
  fn from_record(r: &ProblemRecord) -> Self {
    Self {
      problem_id:  r.problem_id,
      frontend_id: r.frontend_id,
      title:       r.title.clone(),
      url:         r.url.clone(),
      difficulty:  encode_difficulty(r.difficulty),
      description: r.description.clone(),
      premium:     r.premium,
    }
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Problems ──────────────────────────────────────────────────────────────

  async fn get_problem(&self, frontend_id: u32) -> Result<Option<ProblemEntry>> {
    let raw = self
      .conn
      .call(move |conn| Ok(load_problem(conn, frontend_id)?))
      .await?;
    raw.map(RawEntry::into_entry).transpose()
  }

  async fn list_problems(&self) -> Result<Vec<ProblemEntry>> {
    let raws = self.conn.call(|conn| Ok(load_all_problems(conn)?)).await?;
    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn insert_problem(&self, record: ProblemRecord) -> Result<ProblemEntry> {
    let frontend_id = record.frontend_id;
    let p = ProblemParams::from_record(&record);
    let tags: Vec<String> = record.tags.into_iter().collect();

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
          .query_row(
            "SELECT id FROM problems WHERE frontend_id = ?1",
            rusqlite::params![p.frontend_id],
            |r| r.get(0),
          )
          .optional()?;

        // A problem the remote renumbered keeps its row under the new id.
        let renumbered: Option<i64> = match existing {
          Some(_) => None,
          None => tx
            .query_row(
              "SELECT id FROM problems WHERE problem_id = ?1",
              rusqlite::params![p.problem_id],
              |r| r.get(0),
            )
            .optional()?,
        };
        if let Some(id) = renumbered {
          tx.execute(
            "UPDATE problems SET frontend_id = ?1 WHERE id = ?2",
            rusqlite::params![p.frontend_id, id],
          )?;
        }

        let problem_row_id = match existing.or(renumbered) {
          Some(id) => id,
          None => {
            tx.execute(
              "INSERT INTO problems (
                 problem_id, frontend_id, title, url, difficulty, description, premium
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
              rusqlite::params![
                p.problem_id,
                p.frontend_id,
                p.title,
                p.url,
                p.difficulty,
                p.description,
                p.premium,
              ],
            )?;
            tx.last_insert_rowid()
          }
        };

        for name in &tags {
          tx.execute(
            "INSERT INTO topic_tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            rusqlite::params![name],
          )?;
          let tag_id: i64 = tx.query_row(
            "SELECT id FROM topic_tags WHERE name = ?1",
            rusqlite::params![name],
            |r| r.get(0),
          )?;
          tx.execute(
            "INSERT INTO problem_tags (problem_id, tag_id) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
            rusqlite::params![problem_row_id, tag_id],
          )?;
        }

        let raw = load_problem(&tx, p.frontend_id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.ok_or(Error::ProblemVanished(frontend_id))?.into_entry()
  }

  async fn upsert_problems(&self, records: Vec<ProblemRecord>) -> Result<usize> {
    let rows: Vec<ProblemParams> = records.iter().map(ProblemParams::from_record).collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        // Rows whose problem moved to another frontend id are parked on a
        // negative id until the upsert below assigns the new one.
        {
          let mut park = tx.prepare(
            "UPDATE problems SET frontend_id = -id
             WHERE problem_id = ?1 AND frontend_id <> ?2",
          )?;
          for p in &rows {
            park.execute(rusqlite::params![p.problem_id, p.frontend_id])?;
          }
        }
        // Any row still holding an incoming frontend id under another
        // problem is absent from the snapshot and goes away.
        {
          let mut evict = tx.prepare(
            "DELETE FROM problems WHERE frontend_id = ?1 AND problem_id <> ?2",
          )?;
          for p in &rows {
            evict.execute(rusqlite::params![p.frontend_id, p.problem_id])?;
          }
        }

        let mut written = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO problems (
               problem_id, frontend_id, title, url, difficulty, description, premium
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(problem_id) DO UPDATE SET
               frontend_id = excluded.frontend_id,
               title       = excluded.title,
               url         = excluded.url,
               difficulty  = excluded.difficulty,
               description = excluded.description,
               premium     = excluded.premium",
          )?;
          for p in &rows {
            written += stmt.execute(rusqlite::params![
              p.problem_id,
              p.frontend_id,
              p.title,
              p.url,
              p.difficulty,
              p.description,
              p.premium,
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    Ok(written)
  }

  async fn remove_problem(&self, frontend_id: u32) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM problems WHERE frontend_id = ?1",
          rusqlite::params![frontend_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Tags ──────────────────────────────────────────────────────────────────

  async fn upsert_tags(&self, names: Vec<String>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO topic_tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
          )?;
          for name in &names {
            inserted += stmt.execute(rusqlite::params![name])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;
    Ok(inserted)
  }

  async fn list_tags(&self) -> Result<Vec<TopicTag>> {
    let tags = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, name FROM topic_tags ORDER BY name")?;
        let rows = stmt
          .query_map([], |row| Ok(TopicTag { id: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(tags)
  }

  async fn replace_associations(&self, links: Vec<(u32, String)>) -> Result<usize> {
    let links: BTreeSet<(u32, String)> = links.into_iter().collect();

    let outcome: std::result::Result<usize, (u32, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let problems: HashMap<u32, i64> = {
          let mut stmt = tx.prepare("SELECT frontend_id, id FROM problems")?;
          let rows = stmt
            .query_map([], |r| Ok((r.get::<_, u32>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };
        let tags: HashMap<String, i64> = {
          let mut stmt = tx.prepare("SELECT name, id FROM topic_tags")?;
          let rows = stmt
            .query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
          rows
        };

        let mut resolved = Vec::with_capacity(links.len());
        for (frontend_id, name) in links {
          match (problems.get(&frontend_id), tags.get(&name)) {
            (Some(&p), Some(&t)) => resolved.push((p, t)),
            // Dropping `tx` rolls back; the table is left untouched.
            _ => return Ok(Err((frontend_id, name))),
          }
        }

        tx.execute("DELETE FROM problem_tags", [])?;
        {
          let mut stmt =
            tx.prepare("INSERT INTO problem_tags (problem_id, tag_id) VALUES (?1, ?2)")?;
          for (problem_row_id, tag_id) in &resolved {
            stmt.execute(rusqlite::params![problem_row_id, tag_id])?;
          }
        }
        tx.commit()?;
        Ok(Ok(resolved.len()))
      })
      .await?;

    outcome.map_err(|(frontend_id, tag)| Error::DanglingLink { frontend_id, tag })
  }

  // ── Forum channels ────────────────────────────────────────────────────────

  async fn get_forum_channel(&self, group_id: u64) -> Result<Option<ForumChannelConfig>> {
    let group = encode_snowflake(group_id);
    let config = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {FORUM_COLUMNS} FROM forum_channels WHERE group_id = ?1"),
            rusqlite::params![group],
            forum_channel,
          )
          .optional()?)
      })
      .await?;
    Ok(config)
  }

  async fn list_forum_channels(&self) -> Result<Vec<ForumChannelConfig>> {
    let configs = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {FORUM_COLUMNS} FROM forum_channels ORDER BY id"))?;
        let rows = stmt
          .query_map([], forum_channel)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(configs)
  }

  async fn upsert_forum_channel(
    &self,
    group_id:   u64,
    channel_id: u64,
  ) -> Result<ForumChannelConfig> {
    let group = encode_snowflake(group_id);
    let channel = encode_snowflake(channel_id);
    let config = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO forum_channels (group_id, channel_id) VALUES (?1, ?2)
             ON CONFLICT(group_id) DO UPDATE SET channel_id = excluded.channel_id
             RETURNING {FORUM_COLUMNS}"
          ),
          rusqlite::params![group, channel],
          forum_channel,
        )?)
      })
      .await?;
    Ok(config)
  }

  // ── Threads ───────────────────────────────────────────────────────────────

  async fn get_thread(&self, thread_id: u64) -> Result<Option<ThreadRecord>> {
    let thread = encode_snowflake(thread_id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {THREAD_COLUMNS} FROM problem_threads WHERE thread_id = ?1"),
            rusqlite::params![thread],
            raw_thread,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawThread::into_record).transpose()
  }

  async fn find_thread(
    &self,
    problem_row_id:       i64,
    forum_channel_row_id: i64,
  ) -> Result<Option<ThreadRecord>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {THREAD_COLUMNS} FROM problem_threads
               WHERE problem_row_id = ?1 AND forum_channel_row_id = ?2
               ORDER BY id
               LIMIT 1"
            ),
            rusqlite::params![problem_row_id, forum_channel_row_id],
            raw_thread,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawThread::into_record).transpose()
  }

  async fn list_threads(&self) -> Result<Vec<ThreadRecord>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {THREAD_COLUMNS} FROM problem_threads ORDER BY id"))?;
        let rows = stmt
          .query_map([], raw_thread)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawThread::into_record).collect()
  }

  async fn insert_thread(&self, input: NewThreadRecord) -> Result<ThreadRecord> {
    let created_at = Utc::now();
    let thread = encode_snowflake(input.thread_id);
    let at_str = encode_dt(created_at);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO problem_threads (
             thread_id, problem_row_id, forum_channel_row_id, created_at
           ) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            thread,
            input.problem_row_id,
            input.forum_channel_row_id,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(ThreadRecord {
      id,
      thread_id: input.thread_id,
      problem_row_id: input.problem_row_id,
      forum_channel_row_id: input.forum_channel_row_id,
      created_at,
    })
  }

  async fn upsert_threads(&self, inputs: Vec<NewThreadRecord>) -> Result<usize> {
    let at_str = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written = 0;
        {
          let mut replace = tx.prepare(
            "DELETE FROM problem_threads
             WHERE problem_row_id = ?1 AND forum_channel_row_id = ?2 AND thread_id <> ?3",
          )?;
          let mut stmt = tx.prepare(
            "INSERT INTO problem_threads (
               thread_id, problem_row_id, forum_channel_row_id, created_at
             ) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(thread_id) DO UPDATE SET
               problem_row_id       = excluded.problem_row_id,
               forum_channel_row_id = excluded.forum_channel_row_id",
          )?;
          for input in &inputs {
            let thread = encode_snowflake(input.thread_id);
            replace.execute(rusqlite::params![
              input.problem_row_id,
              input.forum_channel_row_id,
              thread,
            ])?;
            written += stmt.execute(rusqlite::params![
              thread,
              input.problem_row_id,
              input.forum_channel_row_id,
              at_str,
            ])?;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;
    Ok(written)
  }

  async fn delete_thread(&self, thread_id: u64) -> Result<bool> {
    let thread = encode_snowflake(thread_id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM problem_threads WHERE thread_id = ?1",
          rusqlite::params![thread],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }
}
