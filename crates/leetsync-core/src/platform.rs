//! The `ThreadPlatform` trait: the chat platform hosting discussion threads.
//!
//! The platform is the only tier that knows whether a thread still exists.
//! The thread registry asks it to create threads and to resolve recorded
//! ones, and treats an unresolvable id as "deleted externally".

use std::future::Future;

use crate::forum::ThreadDraft;

/// A live reference to an external thread.
pub trait ThreadHandle: Clone + Send + Sync {
  /// The platform-assigned thread id recorded in the store.
  fn thread_id(&self) -> u64;
}

/// Abstraction over the external chat platform.
pub trait ThreadPlatform: Send + Sync {
  type Handle: ThreadHandle;
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a thread in `draft.channel_id`.
  fn create_thread(
    &self,
    draft: ThreadDraft,
  ) -> impl Future<Output = Result<Self::Handle, Self::Error>> + Send + '_;

  /// Resolve a previously created thread. `Ok(None)` means it no longer
  /// exists on the platform.
  fn resolve_thread(
    &self,
    thread_id: u64,
  ) -> impl Future<Output = Result<Option<Self::Handle>, Self::Error>> + Send + '_;
}
