//! `ContextAssembler`: composes a [`PromptContext`] from
//! `PersonStore`, `MemoryClient`, `ConversationWindow`, and recent
//! `FeedbackExample`s for one message.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use termin_config::Config;
use termin_core::{MemoryBackend, MemoryContext, Message, PromptContext};
use termin_person::PersonStore;
use termin_store::ConversationWindow;
use tokio::sync::Mutex;
use tracing::warn;

use crate::calendar_lookup;
use crate::error::ContextError;
use crate::profile;

const DB_STEP_TIMEOUT: Duration = Duration::from_millis(500);
const RECALL_TIMEOUT: Duration = Duration::from_secs(3);
const FEEDBACK_EXAMPLE_COUNT: u64 = 5;

pub struct ContextAssembler {
    db: DatabaseConnection,
    persons: Arc<Mutex<PersonStore>>,
    memory: Arc<dyn MemoryBackend>,
    user_name: String,
    partner_name: String,
    children_names: Vec<String>,
    conversation_window_size: u64,
    existing_appointments_window_days: i64,
    max_existing: u64,
    zone: Tz,
}

impl ContextAssembler {
    pub fn new(
        db: DatabaseConnection,
        persons: Arc<Mutex<PersonStore>>,
        memory: Arc<dyn MemoryBackend>,
        config: &Config,
    ) -> Result<Self, ContextError> {
        let zone = Tz::from_str(&config.timezone)
            .map_err(|_| ContextError::InvalidTimezone(config.timezone.clone()))?;
        Ok(Self {
            db,
            persons,
            memory,
            user_name: config.family.user_name.clone(),
            partner_name: config.family.partner_name.clone(),
            children_names: config.family.children_names.clone(),
            conversation_window_size: config.extraction.conversation_window_size as u64,
            existing_appointments_window_days: config.extraction.existing_appointments_window_days,
            max_existing: config.extraction.max_existing as u64,
            zone,
        })
    }

    /// Assemble the full context for `message`.
    ///
    /// Steps 1 (recent messages), 2 (existing appointments), 4 (memory
    /// recall), and 5 (feedback examples) are independent reads dispatched
    /// concurrently. Step 3 (person detection) is a pure in-memory scan that
    /// needs step 1's result as input, so it runs immediately after the
    /// join rather than inside it; it costs no meaningful latency since
    /// nothing else is waiting on it.
    pub async fn assemble(&self, message: &Message) -> Result<PromptContext, ContextError> {
        let window = ConversationWindow::new(&self.db);
        let now = Utc::now();

        let recent_messages_fut = with_db_timeout(
            "recent_messages",
            window.recent_messages(&message.chat_id, self.conversation_window_size),
        );
        let existing_appointments_fut = with_db_timeout(
            "existing_appointments",
            window.existing_appointments(
                &message.chat_id,
                now,
                self.existing_appointments_window_days,
                self.max_existing,
            ),
        );
        let feedback_examples_fut = with_db_timeout(
            "feedback_examples",
            termin_feedback::recent_examples(&self.db, &message.chat_id, FEEDBACK_EXAMPLE_COUNT),
        );
        let recall_query = format!("Termine / Familienkontext: {}", message.text);
        let memory_fut = self.recall_with_timeout(&recall_query, &message.chat_id);

        let (recent_messages, existing_appointments, feedback_examples, memory) = tokio::join!(
            recent_messages_fut,
            existing_appointments_fut,
            feedback_examples_fut,
            memory_fut,
        );
        let recent_messages = recent_messages.unwrap_or_default();
        let existing_appointments = existing_appointments.unwrap_or_default();
        let feedback_examples = feedback_examples.unwrap_or_default();

        let persons = self.persons.lock().await;
        let mut detected: Vec<_> = persons
            .detect(&message.text)
            .into_iter()
            .chain(recent_messages.iter().flat_map(|m| persons.detect(&m.text)))
            .collect();
        detected.sort_by(|a, b| a.key.cmp(&b.key));
        detected.dedup_by(|a, b| a.key == b.key);
        let person_fragments = detected.into_iter().map(profile::render).collect();
        drop(persons);

        let today = now.with_timezone(&self.zone).date_naive();
        let calendar_lookup = calendar_lookup::materialize(today);

        let recent_messages_rendered = recent_messages
            .iter()
            .map(|m| m.render_line(&m.timestamp.with_timezone(&self.zone).format("%Y-%m-%d %H:%M").to_string()))
            .collect();

        Ok(PromptContext {
            user_name: self.user_name.clone(),
            partner_name: self.partner_name.clone(),
            children_names: self.children_names.clone(),
            today: today.to_string(),
            timezone: self.zone.name().to_string(),
            calendar_lookup,
            recent_messages: recent_messages_rendered,
            existing_appointments,
            memory,
            feedback_examples,
            persons: person_fragments,
        })
    }

    async fn recall_with_timeout(&self, query: &str, chat_id: &str) -> MemoryContext {
        match tokio::time::timeout(RECALL_TIMEOUT, self.memory.recall(query, chat_id, 10)).await {
            Ok(ctx) => ctx,
            Err(_) => {
                warn!(chat_id, "memory recall exceeded assembler timeout");
                MemoryContext::empty()
            }
        }
    }
}

/// Run a DB-backed step with a 500ms budget.
/// On timeout or error, log and return `None` so the caller can fall back
/// to an empty result rather than failing the whole context.
async fn with_db_timeout<T, E, F>(step: &'static str, fut: F) -> Option<T>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(DB_STEP_TIMEOUT, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(step, %err, "context assembly step failed");
            None
        }
        Err(_) => {
            warn!(step, "context assembly step timed out");
            None
        }
    }
}
