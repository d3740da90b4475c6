//! Remote catalog client for leetsync.
//!
//! [`HttpCatalog`] implements [`leetsync_core::catalog::RemoteCatalog`] over
//! the public LeetCode mirror API. The payload parsers are exposed separately
//! and are pure functions over response bodies.
//!
//! # Quick start
//!
//! ```no_run
//! use leetsync_catalog::{CatalogConfig, HttpCatalog};
//! use leetsync_core::catalog::RemoteCatalog;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = HttpCatalog::new(CatalogConfig::default())?;
//! if let Some(problem) = catalog.fetch_by_id(1).await? {
//!   println!("{}. {}", problem.frontend_id, problem.title);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
pub mod error;
mod parse;

pub use client::{CatalogConfig, DEFAULT_BASE_URL, DEFAULT_SNAPSHOT_URL, HttpCatalog};
pub use error::{Error, Result};
pub use parse::{
  DescriptionFormat, LEETCODE_ORIGIN, Sanitizer, parse_daily, parse_problem, parse_snapshot,
};
