//! Per-path serialization of remote I/O
//!
//! Writes to distinct remote paths may run concurrently; reads and writes to
//! the same path must not interleave, so each sha precondition is read
//! immediately before the write that uses it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-path async lock manager.
///
/// The map itself is guarded by a short-lived synchronous lock; the per-path
/// locks are async so a guard can be held across remote calls. An entry lives
/// only while some task holds or waits for its lock.
pub struct PathLockManager {
    locks: Arc<LockMap>,
}

type LockMap = RwLock<HashMap<String, Arc<Mutex<()>>>>;

/// Exclusive access to one path; released on drop.
pub struct PathGuard {
    guard: Option<OwnedMutexGuard<()>>,
    lock: Arc<Mutex<()>>,
    path: String,
    locks: Arc<LockMap>,
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.locks.write();
        // One reference in the map, one here: nobody else is waiting
        let idle = map
            .get(&self.path)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2);
        if idle {
            map.remove(&self.path);
        }
    }
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn get_path_lock(&self, path: &str) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(path) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another task may have inserted it between the two locks
        map.entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to `path`.
    pub async fn lock(&self, path: &str) -> PathGuard {
        let lock = self.get_path_lock(path);
        let guard = lock.clone().lock_owned().await;
        PathGuard {
            guard: Some(guard),
            lock,
            path: path.to_string(),
            locks: self.locks.clone(),
        }
    }

    /// Number of paths currently locked or awaited.
    pub fn tracked_paths(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}
