//! Claims for threads created before the registry existed.
//!
//! Legacy threads follow the title convention `"<frontend id>. <title>"`.
//! The chat layer lists a forum's threads; this module turns that listing
//! into the mapping [`ThreadRegistry::bulk_register_threads`] consumes.
//!
//! [`ThreadRegistry::bulk_register_threads`]: crate::ThreadRegistry::bulk_register_threads

use std::collections::BTreeMap;

use leetsync_core::forum::{ThreadClaim, frontend_id_from_title};
use tracing::debug;

/// Build claims for every `(thread id, title)` whose title names a problem.
/// Threads with other titles are ignored.
pub fn claims_from_titles<'a>(
  group_id: u64,
  threads: impl IntoIterator<Item = (u64, &'a str)>,
) -> BTreeMap<u64, ThreadClaim> {
  threads
    .into_iter()
    .filter_map(|(thread_id, title)| match frontend_id_from_title(title) {
      Some(frontend_id) => Some((thread_id, ThreadClaim { frontend_id, group_id })),
      None => {
        debug!(thread_id, title, "thread title does not name a problem");
        None
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_conventional_titles_become_claims() {
    let claims = claims_from_titles(
      7,
      [(100, "1. Two Sum"), (101, "General chat"), (102, "15. 3Sum")],
    );
    assert_eq!(claims.len(), 2);
    assert_eq!(claims[&100], ThreadClaim { frontend_id: 1, group_id: 7 });
    assert_eq!(claims[&102].frontend_id, 15);
  }
}
