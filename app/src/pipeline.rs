//! The single-message pipeline: `DateGate` → `ContextAssembler` →
//! `Extractor` → `AppointmentStore` + `CalendarSink` + `MemoryClient`.
//! Exercised directly by the `process` CLI surface; a future ingest
//! collaborator would call the same function per inbound message.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use termin_cascade::Extractor;
use termin_calendar::CalendarSink;
use termin_config::Config;
use termin_context::{date_gate_passes, ContextAssembler};
use termin_core::{
    ActionKind, Appointment, AppointmentAction, AppointmentStatus, MemoryBackend, Message,
    TimingRepr,
};
use termin_entities::messages;
use termin_person::PersonStore;
use termin_store::{AppointmentStore, ConversationWindow};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// What one `process_message` call did, mirroring's "single
/// outcome per message" requirement: whatever failed inside, the caller
/// only ever learns how many appointments were written.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutcome {
    pub appointments_extracted: usize,
    pub gate_passed: bool,
}

/// Collaborators the pipeline needs for one message. Built once per process
/// and shared across calls (`app::main` constructs one set at startup).
pub struct Pipeline {
    pub db: DatabaseConnection,
    pub config: Config,
    pub persons: Arc<Mutex<PersonStore>>,
    pub memory: Arc<dyn MemoryBackend>,
    pub store: Arc<AppointmentStore>,
    pub calendar: Arc<CalendarSink>,
    pub assembler: ContextAssembler,
    pub extractor: Extractor,
}

impl Pipeline {
    /// Run the full pipeline for one inbound message. Persists the message
    /// row first (the debug `process` surface stands in for the ingest
    /// collaborator that would normally own this write), dispatches
    /// `memorize`, then gates, assembles context, extracts, and applies.
    pub async fn process_message(&self, message: &Message) -> anyhow::Result<PipelineOutcome> {
        let window = ConversationWindow::new(&self.db);
        let preceding = window
            .recent_messages(&message.chat_id, self.config.extraction.conversation_window_size as u64)
            .await?;

        self.persist_message(message).await?;
        self.memory
            .memorize(&message.chat_id, &message.sender, &message.text, message.timestamp);

        if !date_gate_passes(&message.text, &preceding) {
            info!(chat_id = %message.chat_id, "message did not pass the date gate, skipping extraction");
            return Ok(PipelineOutcome {
                appointments_extracted: 0,
                gate_passed: false,
            });
        }

        let persons_guard = self.persons.lock().await;
        let context = self.assembler.assemble(message).await?;
        let actions = self.extractor.extract(&context, message, &persons_guard).await;
        drop(persons_guard);

        let mut applied = 0usize;
        for action in actions {
            if self.apply_action(message, action).await {
                applied += 1;
            }
        }

        Ok(PipelineOutcome {
            appointments_extracted: applied,
            gate_passed: true,
        })
    }

    async fn persist_message(&self, message: &Message) -> anyhow::Result<()> {
        use sea_orm::ActiveValue::Set;
        let am = messages::ActiveModel {
            message_id: Set(message.message_id.clone()),
            chat_id: Set(message.chat_id.clone()),
            sender: Set(message.sender.clone()),
            text: Set(message.text.clone()),
            timestamp: Set(message.timestamp),
            reply_to: Set(message.reply_to.clone()),
        };
        messages::Entity::insert(am).exec(&self.db).await?;
        Ok(())
    }

    /// Apply one validated action: write or merge a new appointment, edit
    /// an existing one by id, or cancel it, syncing the calendar for
    /// whichever row ends up live. Returns whether something was written.
    async fn apply_action(&self, message: &Message, action: AppointmentAction) -> bool {
        match action.action {
            Some(ActionKind::Cancel) => self.apply_cancel(action).await,
            Some(ActionKind::Update) if action.updates_termin_id.is_some() => {
                self.apply_update(action).await
            }
            _ => self.apply_create(message, action).await,
        }
    }

    async fn apply_create(&self, message: &Message, action: AppointmentAction) -> bool {
        let now = Utc::now();
        let mut source_message_ids = action.source_message_ids.clone();
        source_message_ids.insert(message.message_id.clone());

        let candidate = Appointment {
            id: uuid::Uuid::now_v7().to_string(),
            chat_id: message.chat_id.clone(),
            title: action.title.unwrap_or_default(),
            timing_repr: TimingRepr {
                datetime: action.datetime,
                date: action.date,
                all_day: action.all_day,
                end_datetime: action.end_datetime,
            },
            participants: action.participants,
            category: action.category.unwrap_or_default(),
            relevance: action.relevance.unwrap_or(termin_core::Relevance::Shared),
            status: AppointmentStatus::Suggested,
            confidence: action.confidence.unwrap_or(0.5),
            source_message_ids,
            calendar_uid: None,
            reasoning: action.reasoning.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let outcome = match self
            .store
            .create_or_update(
                candidate,
                self.config.extraction.confidence_auto_threshold,
                self.config.extraction.duplicate_suppress_threshold,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "failed to write extracted appointment");
                return false;
            }
        };

        let attendees = attendee_names(outcome.appointment());
        match &outcome {
            termin_store::CreateOutcome::Created(appt) => {
                self.calendar.sync_create(appt, &attendees).await;
            }
            termin_store::CreateOutcome::Updated(appt) => {
                self.calendar.sync_update(appt, &attendees).await;
            }
        }
        true
    }

    async fn apply_update(&self, action: AppointmentAction) -> bool {
        let Some(id) = action.updates_termin_id else {
            return false;
        };
        let timing = Some(TimingRepr {
            datetime: action.datetime,
            date: action.date,
            all_day: action.all_day,
            end_datetime: action.end_datetime,
        });
        match self.store.apply_edit(&id, action.title, timing).await {
            Ok(appt) => {
                let attendees = attendee_names(&appt);
                self.calendar.sync_update(&appt, &attendees).await;
                true
            }
            Err(err) => {
                warn!(%err, id, "update action referenced an appointment that no longer exists, dropping");
                false
            }
        }
    }

    async fn apply_cancel(&self, action: AppointmentAction) -> bool {
        let Some(id) = action.updates_termin_id else {
            warn!("cancel action carried no updates_termin_id, dropping");
            return false;
        };
        let before = match self.store.get(&id).await {
            Ok(appt) => appt,
            Err(err) => {
                warn!(%err, id, "cancel action referenced an appointment that no longer exists, dropping");
                return false;
            }
        };
        let from_calendar = termin_calendar::current_calendar(before.status);

        match self.store.cancel(&id).await {
            Ok(_) => {
                if let Some(calendar) = from_calendar {
                    self.calendar.sync_delete(&before, calendar).await;
                }
                true
            }
            Err(err) => {
                warn!(%err, id, "failed to cancel appointment");
                false
            }
        }
    }
}

fn attendee_names(appt: &Appointment) -> Vec<String> {
    appt.participants.iter().cloned().collect()
}
