use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per batch id.
///
/// Serializes mutations of the same batch inside this process. Backends with
/// row locks additionally take `SELECT ... FOR UPDATE` inside the transaction.
#[derive(Default)]
pub struct BatchLocks {
    inner: DashMap<i32, Arc<Mutex<()>>>,
}

impl BatchLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, batch_id: i32) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting.
        let lock = self.inner.entry(batch_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop the entry for a batch that reached a terminal state.
    pub fn forget(&self, batch_id: i32) {
        self.inner.remove(&batch_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
