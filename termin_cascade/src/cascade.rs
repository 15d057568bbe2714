//! `LlmCascade`: tries providers in order, advancing past any recoverable
//! failure, and accepting the first tier whose response is a parseable
//! answer — even a parseable "no appointment here" — rather than the first
//! one that happens to return a non-empty result.

use std::sync::Arc;
use std::time::Duration;

use termin_core::{CascadePrompt, CascadeResponse, LlmProvider};
use tracing::warn;

use crate::parsing::{self, ParseOutcome};
use crate::rate_limit::TokenBucket;

/// One provider slot in the cascade: a provider, the hard timeout applied
/// to its invocation, and its own rate-limit bucket.
pub struct CascadeTier {
    pub provider: Arc<dyn LlmProvider>,
    pub timeout: Duration,
    pub rate_limit: TokenBucket,
}

impl CascadeTier {
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration, rate_limit: TokenBucket) -> Self {
        Self {
            provider,
            timeout,
            rate_limit,
        }
    }
}

pub struct LlmCascade {
    tiers: Vec<CascadeTier>,
}

impl LlmCascade {
    #[must_use]
    pub fn new(tiers: Vec<CascadeTier>) -> Self {
        Self { tiers }
    }

    /// Run `prompt` through each tier in order. A tier's rate-limit
    /// exhaustion, network error, timeout, or server error advances to the
    /// next tier rather than failing the whole call. A non-rate-limit
    /// client error is logged and also advances: the provider rejected the
    /// request shape, which retrying won't fix, but the next tier might
    /// still succeed.
    ///
    /// A response that parses into a JSON object — [`ParseOutcome::Parsed`],
    /// whether or not its `actions` array is empty — is the final answer
    /// and returns immediately; that is the provider authoritatively
    /// reporting "no appointment here", not a failure to advance past. Only
    /// a response with no parseable structure at all
    /// ([`ParseOutcome::Unparseable`]) falls back to pattern-driven
    /// synthesis, and only advances to the next tier if that synthesis also
    /// comes up empty.
    pub async fn run(&self, prompt: &CascadePrompt) -> CascadeResponse {
        let mut last = CascadeResponse::default();

        for tier in &self.tiers {
            if !tier.rate_limit.try_acquire() {
                warn!(provider = tier.provider.name(), "rate limit exhausted, advancing");
                continue;
            }

            match tier.provider.invoke(prompt, tier.timeout).await {
                Ok(raw) => match parsing::parse(&raw) {
                    ParseOutcome::Parsed(response) => return response,
                    ParseOutcome::Unparseable => {
                        let synthesized = parsing::synthesize_fallback(&raw);
                        if !synthesized.actions.is_empty() {
                            return synthesized;
                        }
                        warn!(provider = tier.provider.name(), "unparseable response, advancing");
                        last = synthesized;
                    }
                },
                Err(err) => {
                    warn!(provider = tier.provider.name(), %err, "provider call failed, advancing");
                }
            }
        }

        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use termin_core::ProviderError;

    enum Outcome {
        Ok(String),
        Timeout,
        ServerError(u16),
    }

    struct FakeProvider {
        name: String,
        outcome: Outcome,
    }

    #[async_trait]
    impl LlmProvider for FakeProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(
            &self,
            _prompt: &CascadePrompt,
            _timeout: Duration,
        ) -> Result<String, ProviderError> {
            match &self.outcome {
                Outcome::Ok(body) => Ok(body.clone()),
                Outcome::Timeout => Err(ProviderError::Timeout {
                    provider: self.name.clone(),
                }),
                Outcome::ServerError(status) => Err(ProviderError::ServerError {
                    provider: self.name.clone(),
                    status: *status,
                }),
            }
        }
    }

    fn prompt() -> CascadePrompt {
        CascadePrompt {
            system: "sys".into(),
            user: "user".into(),
        }
    }

    #[tokio::test]
    async fn falls_through_to_second_tier_on_timeout() {
        let primary = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "primary".into(),
                outcome: Outcome::Timeout,
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );
        let fallback = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "fallback".into(),
                outcome: Outcome::Ok(
                    r#"{"actions": [{"action": "create", "title": "x"}], "reasoning": "ok"}"#
                        .into(),
                ),
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );

        let cascade = LlmCascade::new(vec![primary, fallback]);
        let response = cascade.run(&prompt()).await;
        assert_eq!(response.actions.len(), 1);
    }

    #[tokio::test]
    async fn accepts_parseable_empty_actions_without_advancing() {
        let primary = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "primary".into(),
                outcome: Outcome::Ok(
                    r#"{"actions": [], "reasoning": "kein Termin erkennbar"}"#.into(),
                ),
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );
        let fallback = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "fallback".into(),
                outcome: Outcome::Ok(
                    r#"{"actions": [{"action": "create", "title": "should not be reached"}], "reasoning": "x"}"#
                        .into(),
                ),
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );

        let cascade = LlmCascade::new(vec![primary, fallback]);
        let response = cascade.run(&prompt()).await;
        assert!(response.actions.is_empty());
        assert_eq!(response.reasoning, "kein Termin erkennbar");
    }

    #[tokio::test]
    async fn returns_empty_when_all_tiers_exhausted() {
        let primary = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "primary".into(),
                outcome: Outcome::ServerError(500),
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );

        let cascade = LlmCascade::new(vec![primary]);
        let response = cascade.run(&prompt()).await;
        assert!(response.actions.is_empty());
    }

    #[tokio::test]
    async fn skips_tier_whose_bucket_is_exhausted() {
        let exhausted_bucket = TokenBucket::new(1, 0.0);
        assert!(exhausted_bucket.try_acquire());
        let primary = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "primary".into(),
                outcome: Outcome::Ok(
                    r#"{"actions": [{"action": "create"}], "reasoning": "should not be reached"}"#
                        .into(),
                ),
            }),
            Duration::from_secs(1),
            exhausted_bucket,
        );
        let fallback = CascadeTier::new(
            Arc::new(FakeProvider {
                name: "fallback".into(),
                outcome: Outcome::Ok(r#"{"actions": [{"action": "update"}], "reasoning": "ok"}"#.into()),
            }),
            Duration::from_secs(1),
            crate::rate_limit::unlimited(),
        );

        let cascade = LlmCascade::new(vec![primary, fallback]);
        let response = cascade.run(&prompt()).await;
        assert_eq!(response.actions[0].action, Some(termin_core::ActionKind::Update));
    }
}
