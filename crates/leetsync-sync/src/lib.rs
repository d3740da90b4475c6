//! The leetsync synchronisation engine.
//!
//! [`ProblemCache`] resolves problems through memory, the relational store
//! and the remote catalog, and runs the bulk refresh pipeline.
//! [`ThreadRegistry`] maps (problem, group) pairs to discussion threads on
//! the chat platform with create-or-reuse semantics.
//!
//! Both are generic over the [`leetsync_core`] collaborator traits and are
//! constructed explicitly; there is no process-wide state.
//!
//! # Wiring
//!
//! ```rust,ignore
//! let problems = Arc::new(ProblemCache::new(store.clone(), remote));
//! let threads = ThreadRegistry::new(store, problems.clone());
//! problems.warm().await?;
//! threads.warm().await?;
//! ```

pub mod error;
pub mod migrate;
pub mod problems;
pub mod threads;

pub use error::{Error, Result};
pub use problems::{ProblemCache, RefreshSummary, Resolved, Tier};
pub use threads::{ThreadOutcome, ThreadRegistry};
