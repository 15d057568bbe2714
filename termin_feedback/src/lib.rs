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

//! `FeedbackLoop`: the sole writer of the `feedback` table,
//! coordinating `AppointmentStore`, `CalendarSink`, and `PersonStore` for
//! one user correction.

mod convert;
mod error;
mod examples;
mod feedback_loop;

pub use error::FeedbackError;
pub use examples::recent_examples;
pub use feedback_loop::{FeedbackInput, FeedbackLoop};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{ConnectionTrait, Database, Schema};
    use termin_calendar::CalendarSink;
    use termin_core::{
        Appointment, AppointmentStatus, CalendarClient, CalendarError, CalendarEventDraft,
        CalendarName, Category, FeedbackAction, Relevance, TimingRepr,
    };
    use termin_store::AppointmentStore;
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct NoopCalendar;

    #[async_trait]
    impl CalendarClient for NoopCalendar {
        async fn write(
            &self,
            _calendar: CalendarName,
            _event: &CalendarEventDraft,
        ) -> Result<String, CalendarError> {
            Ok("uid-x".to_string())
        }
        async fn update(
            &self,
            _calendar: CalendarName,
            _uid: &str,
            _event: &CalendarEventDraft,
        ) -> Result<(), CalendarError> {
            Ok(())
        }
        async fn delete(&self, _calendar: CalendarName, _uid: &str) -> Result<(), CalendarError> {
            Ok(())
        }
    }

    async fn setup() -> (FeedbackLoop, Arc<AppointmentStore>, String) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let builder = db.get_database_backend();
        let schema = Schema::new(builder);
        for stmt in [
            builder.build(
                &schema.create_table_from_entity(termin_entities::AppointmentEntity),
            ),
            builder.build(&schema.create_table_from_entity(termin_entities::FeedbackEntity)),
        ] {
            db.execute(stmt).await.unwrap();
        }
        let store = Arc::new(AppointmentStore::new(db.clone()));
        let calendar = Arc::new(CalendarSink::new(
            Arc::new(NoopCalendar),
            store.clone(),
            "Europe/Berlin",
        ));

        let dir = tempfile::tempdir().unwrap();
        let persons = Arc::new(Mutex::new(
            termin_person::PersonStore::load(dir.path()).unwrap_or_else(|_| {
                std::fs::create_dir_all(dir.path()).unwrap();
                termin_person::PersonStore::load(dir.path()).unwrap()
            }),
        ));

        let now = Utc::now();
        let appt = Appointment {
            id: "appt-1".to_string(),
            chat_id: "chat-1".to_string(),
            title: "Enno Training".to_string(),
            timing_repr: TimingRepr {
                datetime: Some(
                    chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
                        .unwrap()
                        .and_hms_opt(17, 0, 0)
                        .unwrap(),
                ),
                date: None,
                all_day: false,
                end_datetime: None,
            },
            participants: Default::default(),
            category: Category::Appointment,
            relevance: Relevance::Shared,
            status: AppointmentStatus::Suggested,
            confidence: 0.6,
            source_message_ids: Default::default(),
            calendar_uid: None,
            reasoning: "bare time after question".to_string(),
            created_at: now,
            updated_at: now,
        };
        store
            .create_or_update(appt, 0.85, 0.9)
            .await
            .unwrap();

        let feedback_loop = FeedbackLoop::new(db, store.clone(), calendar, persons);
        (feedback_loop, store, "appt-1".to_string())
    }

    #[tokio::test]
    async fn confirmed_moves_suggested_to_confirmed_and_persists_record() {
        let (loop_, store, appointment_id) = setup().await;
        let record = loop_
            .apply(FeedbackInput {
                appointment_id: appointment_id.clone(),
                action: FeedbackAction::Confirmed,
                correction: None,
                reason: None,
            })
            .await
            .unwrap();
        assert_eq!(record.action, FeedbackAction::Confirmed);

        let appt = store.get(&appointment_id).await.unwrap();
        assert_eq!(appt.status, AppointmentStatus::Confirmed);
    }

    #[tokio::test]
    async fn rejected_reaches_terminal_state() {
        let (loop_, store, appointment_id) = setup().await;
        loop_
            .apply(FeedbackInput {
                appointment_id: appointment_id.clone(),
                action: FeedbackAction::Rejected,
                correction: None,
                reason: Some("not actually happening".to_string()),
            })
            .await
            .unwrap();

        let appt = store.get(&appointment_id).await.unwrap();
        assert_eq!(appt.status, AppointmentStatus::Rejected);
    }

    #[tokio::test]
    async fn edited_feedback_updates_row_and_becomes_a_future_example() {
        let (loop_, _store, appointment_id) = setup().await;
        loop_
            .apply(FeedbackInput {
                appointment_id: appointment_id.clone(),
                action: FeedbackAction::Edited,
                correction: Some(serde_json::json!({"title": "Enno Schwimmtraining"})),
                reason: None,
            })
            .await
            .unwrap();

        let examples = loop_.recent_examples("chat-1", 5).await.unwrap();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].record.action, FeedbackAction::Edited);
    }
}
