//! In-process row-level lock registry.
//!
//! The duplicate-or-update check must run inside a transaction that also
//! inserts the new appointment, using a row-level lock on a key derived
//! from `(chat_id, hash(title), date_bucket)`. A single `sea_orm`
//! transaction already gives atomicity against the database; this registry
//! adds the cross-task mutual exclusion so two concurrent extractions for
//! the same chat/title/day race safely within one process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for `key`, holding it until the returned guard
    /// drops.
    pub async fn acquire(&self, key: &str) -> tokio::sync::OwnedMutexGuard<()> {
        self.entry(key).lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_waits_for_first_release() {
        let registry = Arc::new(LockRegistry::new());
        let order = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        let r1 = registry.clone();
        let o1 = order.clone();
        let first = tokio::spawn(async move {
            let _guard = r1.acquire("k").await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            o1.lock().await.push(1);
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        let r2 = registry.clone();
        let o2 = order.clone();
        let second = tokio::spawn(async move {
            let _guard = r2.acquire("k").await;
            o2.lock().await.push(2);
        });

        first.await.expect("first task");
        second.await.expect("second task");
        assert_eq!(*order.lock().await, vec![1, 2]);
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let registry = LockRegistry::new();
        let _a = registry.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(50), registry.acquire("b")).await;
        assert!(b.is_ok());
    }
}
