use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use termin_core::{MemoryBackend, MemoryContext, MemoryHealth};
use tracing::{debug, warn};

use crate::pool::DetachedPool;

/// Connection settings for the external semantic-memory service.
#[derive(Debug, Clone)]
pub struct MemoryClientConfig {
    pub base_url: String,
    pub recall_timeout: Duration,
    /// Bound on concurrent in-flight requests against the service
    /// (a bounded concurrent limit, e.g. 16).
    pub max_concurrent_requests: usize,
}

impl MemoryClientConfig {
    #[must_use]
    pub fn from_url(base_url: impl Into<String>, recall_timeout_s: u64) -> Self {
        Self {
            base_url: base_url.into(),
            recall_timeout: Duration::from_secs(recall_timeout_s),
            max_concurrent_requests: 16,
        }
    }
}

#[derive(Debug, Serialize)]
struct MemorizePayload<'a> {
    chat_id: &'a str,
    sender: &'a str,
    text: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct RecallPayload<'a> {
    query: &'a str,
    chat_id: &'a str,
    top_k: usize,
}

#[derive(Debug, Default, Deserialize)]
struct RecallResponse {
    #[serde(default)]
    episodes: String,
    #[serde(default)]
    profiles: String,
    #[serde(default)]
    facts: String,
}

/// Async client to the external semantic-memory service.
///
/// Holds a persistent connection pool (`reqwest::Client` already pools
/// connections internally) bounded by a semaphore, plus a detached-task
/// pool for fire-and-forget `memorize` dispatches.
#[derive(Clone)]
pub struct MemoryClient {
    http: Client,
    config: MemoryClientConfig,
    inflight: std::sync::Arc<tokio::sync::Semaphore>,
    pool: std::sync::Arc<DetachedPool>,
}

impl MemoryClient {
    #[must_use]
    pub fn new(config: MemoryClientConfig) -> Self {
        let inflight = std::sync::Arc::new(tokio::sync::Semaphore::new(
            config.max_concurrent_requests,
        ));
        Self {
            http: Client::new(),
            config,
            inflight,
            pool: std::sync::Arc::new(DetachedPool::new()),
        }
    }

    #[must_use]
    pub fn pool_stats(&self) -> std::sync::Arc<crate::pool::PoolStats> {
        self.pool.stats()
    }

    /// One attempt at the POST, used by both the first try and the single
    /// retry.
    async fn try_memorize(&self, payload: &MemorizePayload<'_>) -> anyhow::Result<()> {
        let _permit = self
            .inflight
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("memory client semaphore closed: {e}"))?;
        self.http
            .post(format!("{}/memorize", self.config.base_url))
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl MemoryBackend for MemoryClient {
    fn memorize(&self, chat_id: &str, sender: &str, text: &str, timestamp: DateTime<Utc>) {
        let client = self.clone();
        let chat_id = chat_id.to_string();
        let sender = sender.to_string();
        let text = text.to_string();

        self.pool.dispatch(async move {
            let payload = MemorizePayload {
                chat_id: &chat_id,
                sender: &sender,
                text: &text,
                timestamp,
            };
            if let Err(err) = client.try_memorize(&payload).await {
                debug!(%err, "memorize attempt 1 failed, retrying after 250ms");
                tokio::time::sleep(Duration::from_millis(250)).await;
                if let Err(err) = client.try_memorize(&payload).await {
                    warn!(%err, "memorize failed after retry, dropping (message store remains authoritative)");
                }
            }
        });
    }

    async fn recall(&self, query: &str, chat_id: &str, top_k: usize) -> MemoryContext {
        let payload = RecallPayload {
            query,
            chat_id,
            top_k,
        };

        let call = async {
            let _permit = self.inflight.acquire().await.ok()?;
            let response = self
                .http
                .post(format!("{}/recall", self.config.base_url))
                .json(&payload)
                .send()
                .await
                .ok()?
                .error_for_status()
                .ok()?
                .json::<RecallResponse>()
                .await
                .ok()?;
            Some(response)
        };

        match tokio::time::timeout(self.config.recall_timeout, call).await {
            Ok(Some(body)) if body.episodes.is_empty() && body.profiles.is_empty() && body.facts.is_empty() => {
                MemoryContext::empty()
            }
            Ok(Some(body)) => MemoryContext {
                episodes: body.episodes,
                profiles: body.profiles,
                facts: body.facts,
                empty: false,
            },
            Ok(None) => {
                debug!(chat_id, "memory recall failed, returning empty context");
                MemoryContext::empty()
            }
            Err(_) => {
                warn!(chat_id, "memory recall timed out");
                MemoryContext::empty()
            }
        }
    }

    async fn health(&self) -> MemoryHealth {
        let started = std::time::Instant::now();
        let probe = self
            .http
            .get(format!("{}/health", self.config.base_url))
            .send();

        match tokio::time::timeout(Duration::from_secs(1), probe).await {
            Ok(Ok(resp)) if resp.status().is_success() => MemoryHealth {
                connected: true,
                latency_ms: Some(u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)),
            },
            _ => MemoryHealth {
                connected: false,
                latency_ms: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recall_against_unreachable_service_returns_empty() {
        let client = MemoryClient::new(MemoryClientConfig::from_url(
            "http://127.0.0.1:1",
            1,
        ));
        let ctx = client.recall("Termine / Familienkontext: test", "chat-1", 10).await;
        assert!(ctx.empty);
    }

    #[tokio::test]
    async fn health_against_unreachable_service_is_disconnected() {
        let client = MemoryClient::new(MemoryClientConfig::from_url(
            "http://127.0.0.1:1",
            1,
        ));
        let health = client.health().await;
        assert!(!health.connected);
    }

    #[tokio::test]
    async fn memorize_does_not_block_caller() {
        let client = MemoryClient::new(MemoryClientConfig::from_url(
            "http://127.0.0.1:1",
            1,
        ));
        let started = std::time::Instant::now();
        client.memorize("chat-1", "alex", "hallo", Utc::now());
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
