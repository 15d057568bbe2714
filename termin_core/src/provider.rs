//! The `LlmProvider` trait seam the cascade is built on: each provider is a self-contained
//! variant sharing `invoke(prompt, timeout) -> raw_response`.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// The assembled prompt handed to a provider: system preamble plus the
/// fixed-order user content the cascade builds for one extraction.
#[derive(Debug, Clone)]
pub struct CascadePrompt {
    pub system: String,
    pub user: String,
}

/// Errors an `LlmProvider` can report. The cascade only
/// ever advances or stops based on which variant it sees — it never
/// propagates these past its own boundary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {provider} timed out")]
    Timeout { provider: String },

    #[error("network error calling {provider}: {source}")]
    Network {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{provider} returned server error {status}")]
    ServerError { provider: String, status: u16 },

    #[error("{provider} rate-limited the request")]
    RateLimited { provider: String },

    #[error("{provider} rejected the request: {status}")]
    ClientError { provider: String, status: u16 },

    #[error("{provider} is not authorized: {status}")]
    AuthFailure { provider: String, status: u16 },
}

/// One provider in the cascade. Implementors are hot-swappable via
/// configuration without touching the extractor.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Invoke the provider with a hard timeout. Returns the raw response
    /// body; resilient parsing happens downstream in the cascade.
    async fn invoke(
        &self,
        prompt: &CascadePrompt,
        timeout: Duration,
    ) -> Result<String, ProviderError>;
}
