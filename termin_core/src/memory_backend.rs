//! The `MemoryBackend` trait seam for the external semantic-memory service.
//! `termin_memory_client::MemoryClient` is the sole implementation; the
//! trait exists so `termin_context` can be tested against a fake without a
//! network dependency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::prompt::MemoryContext;

#[derive(Debug, Clone)]
pub struct MemoryHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Fire-and-forget write plus best-effort recall against the external
/// semantic-memory service. `recall` and `health` must never raise —
/// callers get `MemoryContext::empty()` / a disconnected health on any
/// failure, not an `Err`.
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// Dispatches onto a bounded pool and returns immediately; the caller
    /// must not await completion of the underlying write.
    fn memorize(&self, chat_id: &str, sender: &str, text: &str, timestamp: DateTime<Utc>);

    async fn recall(&self, query: &str, chat_id: &str, top_k: usize) -> MemoryContext;

    async fn health(&self) -> MemoryHealth;
}
