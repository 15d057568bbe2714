#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

//! `LLMCascade` and `ExtractionValidator`: turns a
//! `PromptContext` plus the message under analysis into validated
//! `AppointmentAction`s, or an empty list when nothing is worth writing.

pub mod cascade;
pub mod error;
pub mod http_provider;
pub mod parsing;
pub mod prompt_builder;
pub mod rate_limit;
pub mod validator;

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use termin_config::Config;
use termin_core::{Appointment, AppointmentAction, Message, PromptContext};
use termin_person::PersonStore;

pub use cascade::{CascadeTier, LlmCascade};
pub use error::CascadeError;
pub use http_provider::HttpLlmProvider;
pub use rate_limit::TokenBucket;
pub use validator::ValidationContext;

const PRIMARY_TIMEOUT: Duration = Duration::from_secs(45);
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Ties `LlmCascade`, `prompt_builder`, and `ExtractionValidator` together
/// into the single call the pipeline makes per message.
pub struct Extractor {
    cascade: LlmCascade,
    zone: Tz,
    user_name: String,
    partner_name: String,
    duplicate_threshold: f64,
    duplicate_suppress_threshold: f64,
}

impl Extractor {
    /// Build from process configuration: `Primary(45s)` then `Fallback(30s)`,
    /// each with its own token-bucket rate limit (60 requests/min).
    pub fn new(config: &Config) -> Result<Self, CascadeError> {
        let primary = CascadeTier::new(
            Arc::new(HttpLlmProvider::new("primary", &config.providers.primary)),
            PRIMARY_TIMEOUT,
            TokenBucket::new(60, 1.0),
        );
        let fallback = CascadeTier::new(
            Arc::new(HttpLlmProvider::new("fallback", &config.providers.fallback)),
            FALLBACK_TIMEOUT,
            TokenBucket::new(60, 1.0),
        );

        let zone = config
            .timezone
            .parse::<Tz>()
            .map_err(|_| CascadeError::InvalidTimezone(config.timezone.clone()))?;

        Ok(Self {
            cascade: LlmCascade::new(vec![primary, fallback]),
            zone,
            user_name: config.family.user_name.clone(),
            partner_name: config.family.partner_name.clone(),
            duplicate_threshold: config.extraction.duplicate_threshold,
            duplicate_suppress_threshold: config.extraction.duplicate_suppress_threshold,
        })
    }

    /// Run the full cascade-then-validate path for one message.
    pub async fn extract(
        &self,
        context: &PromptContext,
        message: &Message,
        persons: &PersonStore,
    ) -> Vec<AppointmentAction> {
        let prompt = prompt_builder::build(context, message);
        let response = self.cascade.run(&prompt).await;

        let existing: Vec<Appointment> = context.existing_appointments.clone();
        let validation_ctx = ValidationContext {
            message,
            zone: self.zone,
            user_name: &self.user_name,
            partner_name: &self.partner_name,
            existing_appointments: &existing,
            duplicate_threshold: self.duplicate_threshold,
            duplicate_suppress_threshold: self.duplicate_suppress_threshold,
            persons,
        };
        validator::validate(response.actions, &validation_ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use termin_core::{CascadePrompt, LlmProvider, MemoryContext, ProviderError};

    struct StaticProvider(&'static str);

    #[async_trait]
    impl LlmProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn invoke(
            &self,
            _prompt: &CascadePrompt,
            _timeout: Duration,
        ) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    fn context() -> PromptContext {
        PromptContext {
            user_name: "Alex".into(),
            partner_name: "Sam".into(),
            children_names: vec!["Enno".into()],
            today: "2026-07-29".into(),
            timezone: "Europe/Berlin".into(),
            calendar_lookup: vec![("morgen".into(), "2026-07-30".into())],
            recent_messages: vec![],
            existing_appointments: vec![],
            memory: MemoryContext::empty(),
            feedback_examples: vec![],
            persons: vec![],
        }
    }

    fn message() -> Message {
        Message {
            message_id: "m1".into(),
            chat_id: "c1".into(),
            sender: "Alex".into(),
            text: "Enno hat morgen um 17:00 Training".into(),
            timestamp: chrono::DateTime::parse_from_rfc3339("2026-07-29T10:00:00Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
            reply_to: None,
        }
    }

    #[tokio::test]
    async fn cascade_response_survives_validation_end_to_end() {
        let raw = r#"{"actions": [{"action": "create", "title": "Enno Training",
            "datetime": "2026-07-30T17:00:00", "category": "appointment",
            "confidence": 0.95}], "reasoning": "klarer Termin"}"#;
        let tier = CascadeTier::new(Arc::new(StaticProvider(raw)), Duration::from_secs(1), TokenBucket::new(10, 10.0));
        let cascade = LlmCascade::new(vec![tier]);
        let prompt = prompt_builder::build(&context(), &message());
        let response = cascade.run(&prompt).await;

        let dir = tempfile::tempdir().expect("tempdir");
        let persons = PersonStore::load(dir.path()).expect("load empty store");
        let existing: Vec<Appointment> = vec![];
        let validation_ctx = ValidationContext {
            message: &message(),
            zone: chrono_tz::Europe::Berlin,
            user_name: "Alex",
            partner_name: "Sam",
            existing_appointments: &existing,
            duplicate_threshold: 0.7,
            duplicate_suppress_threshold: 0.9,
            persons: &persons,
        };
        let validated = validator::validate(response.actions, &validation_ctx);
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].relevance, Some(termin_core::Relevance::Shared));
    }
}
