//! The bounded pool `MemoryClient::memorize` dispatches into.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Semaphore;
use tracing::warn;

const MAX_IN_FLIGHT: usize = 512;

/// Tracks in-flight and dropped memorize dispatches, exposed for
/// `health`/status reporting.
#[derive(Debug, Default)]
pub struct PoolStats {
    dropped: AtomicU64,
}

impl PoolStats {
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct DetachedPool {
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
}

impl DetachedPool {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(MAX_IN_FLIGHT)),
            stats: Arc::new(PoolStats::default()),
        }
    }

    #[must_use]
    pub fn stats(&self) -> Arc<PoolStats> {
        self.stats.clone()
    }

    /// Dispatch `task` onto the pool without waiting for it. Drops the task
    /// (incrementing the counter) instead of queuing when saturated —
    /// `memorize` callers must never block on pool pressure.
    pub fn dispatch<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(permit) = self.semaphore.clone().try_acquire_owned() else {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            warn!("memory memorize pool saturated, dropping task");
            return;
        };
        tokio::spawn(async move {
            task.await;
            drop(permit);
        });
    }
}

impl Default for DetachedPool {
    fn default() -> Self {
        Self::new()
    }
}
