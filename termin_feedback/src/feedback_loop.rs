//! `FeedbackLoop`: the single writer of the `feedback`
//! table. Drives the `AppointmentStore` state transition, pushes the
//! correction to `CalendarSink`, and updates `PersonStore` — all three
//! side effects of one user correction.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use termin_calendar::{CalendarSink, current_calendar};
use termin_core::{Appointment, FeedbackAction, FeedbackRecord};
use termin_entities::feedback;
use termin_person::PersonStore;
use termin_store::AppointmentStore;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::convert::record_to_active_model;
use crate::error::FeedbackError;

/// One user correction, as received from the dashboard/feedback
/// collaborator.
#[derive(Debug, Clone)]
pub struct FeedbackInput {
    pub appointment_id: String,
    pub action: FeedbackAction,
    pub correction: Option<serde_json::Value>,
    pub reason: Option<String>,
}

pub struct FeedbackLoop {
    db: DatabaseConnection,
    store: Arc<AppointmentStore>,
    calendar: Arc<CalendarSink>,
    persons: Arc<Mutex<PersonStore>>,
}

impl FeedbackLoop {
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        store: Arc<AppointmentStore>,
        calendar: Arc<CalendarSink>,
        persons: Arc<Mutex<PersonStore>>,
    ) -> Self {
        Self {
            db,
            store,
            calendar,
            persons,
        }
    }

    /// Apply one correction end to end: persist the `FeedbackRecord`, drive
    /// the appointment state machine, sync the calendar, and push any
    /// discovered profile edits.
    pub async fn apply(&self, input: FeedbackInput) -> Result<FeedbackRecord, FeedbackError> {
        let appt = self.store.get(&input.appointment_id).await?;

        let updated = match input.action {
            FeedbackAction::Confirmed => {
                let confirmed = self.store.confirm(&input.appointment_id).await?;
                if appt.status == termin_core::AppointmentStatus::Suggested {
                    let names = attendee_names(&confirmed, &*self.persons.lock().await);
                    self.calendar.move_to_confirmed(&confirmed, &names).await;
                }
                confirmed
            }
            FeedbackAction::Rejected => {
                let rejected = self.store.reject(&input.appointment_id).await?;
                if let Some(calendar) = current_calendar(appt.status) {
                    self.calendar.sync_delete(&appt, calendar).await;
                }
                rejected
            }
            FeedbackAction::Edited => {
                // open question 2: applying an edit to a row in a
                // terminal state is left unenforced here — a product
                // decision, not a guard this loop imposes.
                let (title, timing) = extract_correction_fields(input.correction.as_ref());
                let edited = self
                    .store
                    .apply_edit(&input.appointment_id, title, timing)
                    .await?;
                let names = attendee_names(&edited, &*self.persons.lock().await);
                self.calendar.sync_update(&edited, &names).await;
                edited
            }
            FeedbackAction::Skipped => appt,
        };

        self.apply_person_updates(&updated, input.action, input.correction.as_ref(), input.reason.as_deref())
            .await?;

        let record = FeedbackRecord {
            id: Uuid::now_v7().to_string(),
            appointment_id: input.appointment_id,
            action: input.action,
            correction: input.correction,
            reason: input.reason,
            created_at: Utc::now(),
        };
        let am = record_to_active_model(&record, &updated.chat_id);
        feedback::Entity::insert(am).exec(&self.db).await?;

        info!(
            appointment_id = %record.appointment_id,
            action = ?record.action,
            "feedback applied"
        );
        Ok(record)
    }

    /// Last K `rejected`/`edited` examples for a chat.
    pub async fn recent_examples(
        &self,
        chat_id: &str,
        k: u64,
    ) -> Result<Vec<termin_core::FeedbackExample>, FeedbackError> {
        crate::examples::recent_examples(&self.db, chat_id, k).await
    }

    /// Translate the correction into profile edits. Only ever appends: a
    /// `confirmed` outcome promotes anything already observed about a
    /// participant; an `edited` correction is recorded as a fresh
    /// `uncertain` observation rather than assumed confirmed.
    async fn apply_person_updates(
        &self,
        appt: &Appointment,
        action: FeedbackAction,
        correction: Option<&serde_json::Value>,
        reason: Option<&str>,
    ) -> Result<(), FeedbackError> {
        if appt.participants.is_empty() {
            return Ok(());
        }
        let mut persons = self.persons.lock().await;
        match action {
            FeedbackAction::Confirmed => {
                let observation = format!("{}: {}", appt.title, appt.reasoning);
                for key in &appt.participants {
                    let already_observed = persons
                        .get(key)
                        .is_some_and(|p| p.uncertain.contains(&observation));
                    if already_observed {
                        persons.apply_feedback(key, &observation)?;
                    }
                }
            }
            FeedbackAction::Edited => {
                let detail = correction
                    .map(|c| format!("Korrektur an \"{}\": {c}", appt.title))
                    .or_else(|| reason.map(|r| format!("Korrektur an \"{}\": {r}", appt.title)));
                if let Some(observation) = detail {
                    for key in appt.participants.clone() {
                        if persons.get(&key).is_some() {
                            persons.observe_uncertain(&key, [observation.clone()])?;
                        }
                    }
                }
            }
            FeedbackAction::Rejected | FeedbackAction::Skipped => {}
        }
        Ok(())
    }
}

fn attendee_names(appt: &Appointment, persons: &PersonStore) -> Vec<String> {
    appt.participants
        .iter()
        .map(|key| {
            persons
                .get(key)
                .map_or_else(|| key.clone(), |p| p.name.clone())
        })
        .collect()
}

fn extract_correction_fields(
    correction: Option<&serde_json::Value>,
) -> (Option<String>, Option<termin_core::TimingRepr>) {
    let Some(value) = correction else {
        return (None, None);
    };
    let title = value
        .get("title")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let timing = serde_json::from_value::<termin_core::TimingRepr>(value.clone()).ok();
    (title, timing)
}
