use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Registry of async mutexes keyed by row id.
///
/// Every state-changing operation on an order or wallet runs inside the
/// critical section for its key, giving single-writer semantics per row
/// without serializing unrelated rows against each other.
///
/// Lock order is always order-then-wallet; nothing acquires an order lock
/// while holding a wallet lock.
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the critical section for `key`, creating it on first use.
    pub async fn acquire(&self, key: u64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(key)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
