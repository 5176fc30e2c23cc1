use parley_core::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};

/// Process-wide slot allowing one document conversation at a time.
///
/// Entry never waits: a held slot means the caller is turned away.
#[derive(Clone)]
pub struct FileSlot {
    permits: Arc<Semaphore>,
}

/// Proof of holding the [`FileSlot`]; the slot frees when this drops.
#[derive(Debug)]
pub struct FilePermit {
    _permit: OwnedSemaphorePermit,
}

impl FileSlot {
    #[must_use]
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }

    #[must_use]
    pub fn try_enter(&self) -> Option<FilePermit> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .ok()
            .map(|permit| FilePermit { _permit: permit })
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

impl Default for FileSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// One async mutex per user, for serializing a user's turns.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(user_id).or_default())
        };
        lock.lock_owned().await
    }
}
