//! Per-user write serialization.
//!
//! Every folder or file mutation for a user runs while holding that user's
//! lock, so a uniqueness pre-check and the mutation that follows it cannot
//! interleave with another request from the same user.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Guard held for the duration of one user's mutation.
pub type UserGuard = OwnedMutexGuard<()>;

/// Registry of per-user async mutexes.
#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<RwLock<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl UserLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create(&self, user_id: i64) -> Arc<Mutex<()>> {
        {
            let read_guard = self.locks.read().unwrap_or_else(|e| e.into_inner());
            if let Some(lock) = read_guard.get(&user_id) {
                return lock.clone();
            }
        }

        let mut write_guard = self.locks.write().unwrap_or_else(|e| e.into_inner());
        write_guard
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for and take the user's lock.
    pub async fn acquire(&self, user_id: i64) -> UserGuard {
        self.get_or_create(user_id).lock_owned().await
    }
}
