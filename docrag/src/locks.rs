//! Per-document mutual exclusion.
//!
//! Re-indexing is delete-then-insert, which is not atomic at the store. Two
//! interleaved re-indexes of one document could leave a mix of both
//! generations, so every mutation of a document runs under its lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A table of async locks keyed by document id.
///
/// The table holds weak references only; a lock lives as long as someone
/// holds or waits on it, and dead entries are pruned on every acquisition.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

/// Held while a document is being mutated; released on drop.
pub type DocumentGuard = OwnedMutexGuard<()>;

impl DocumentLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `document_id`.
    pub async fn acquire(&self, document_id: &str) -> DocumentGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(document_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(AsyncMutex::new(()));
                    locks.insert(document_id.to_string(), Arc::downgrade(&lock));
                    lock
                }
            }
        };
        lock.lock_owned().await
    }

    /// Number of documents with a live lock.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }
}
