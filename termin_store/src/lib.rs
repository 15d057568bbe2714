#![deny(clippy::all, clippy::suspicious, clippy::correctness)]
#![allow(clippy::module_name_repetitions)]

//! The relational store for appointments and the read-only conversation
//! window assembled from it and the `messages` table.

pub mod appointment_store;
pub mod conversation_window;
pub mod convert;
pub mod error;
pub mod lock;

pub use appointment_store::{AppointmentStore, CreateOutcome};
pub use conversation_window::ConversationWindow;
pub use error::StoreError;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
    use std::collections::BTreeSet;
    use termin_core::{Appointment, AppointmentStatus, Category, Relevance, TimingRepr};

    async fn test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite connects");
        let builder = db.get_database_backend();
        let schema = Schema::new(builder);
        for stmt in [
            builder.build(&schema.create_table_from_entity(termin_entities::AppointmentEntity)),
            builder.build(&schema.create_table_from_entity(termin_entities::MessageEntity)),
        ] {
            db.execute(stmt).await.expect("create table");
        }
        db
    }

    fn candidate(chat_id: &str, title: &str, confidence: f64) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: uuid::Uuid::now_v7().to_string(),
            chat_id: chat_id.to_string(),
            title: title.to_string(),
            timing_repr: TimingRepr {
                datetime: Some(chrono::NaiveDate::from_ymd_opt(2026, 8, 1)
                    .unwrap()
                    .and_hms_opt(16, 0, 0)
                    .unwrap()),
                date: None,
                all_day: false,
                end_datetime: None,
            },
            participants: BTreeSet::new(),
            category: Category::Appointment,
            relevance: Relevance::ForMe,
            status: AppointmentStatus::Suggested,
            confidence,
            source_message_ids: BTreeSet::new(),
            calendar_uid: None,
            reasoning: "test".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_routes_by_confidence() {
        let db = test_db().await;
        let store = AppointmentStore::new(db);

        let high = store
            .create_or_update(candidate("chat-1", "Enno Training", 0.95), 0.85, 0.9)
            .await
            .expect("create succeeds");
        assert_eq!(high.appointment().status, AppointmentStatus::Auto);

        let low = store
            .create_or_update(candidate("chat-1", "Romy Geburtstag", 0.6), 0.85, 0.9)
            .await
            .expect("create succeeds");
        assert_eq!(low.appointment().status, AppointmentStatus::Suggested);
    }

    #[tokio::test]
    async fn second_near_identical_title_updates_instead_of_duplicating() {
        let db = test_db().await;
        let store = AppointmentStore::new(db);

        let first = store
            .create_or_update(candidate("chat-1", "Enno Training", 0.7), 0.85, 0.8)
            .await
            .expect("create succeeds");
        let CreateOutcome::Created(first) = first else {
            panic!("expected first write to create a row")
        };

        let second = store
            .create_or_update(candidate("chat-1", "Enno Training", 0.9), 0.85, 0.8)
            .await
            .expect("create succeeds");
        let CreateOutcome::Updated(updated) = second else {
            panic!("expected second write to update the existing row")
        };
        assert_eq!(updated.id, first.id);

        let rows = store.list_for_chat("chat-1").await.expect("list succeeds");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn cancel_then_confirm_transitions_are_both_applied() {
        let db = test_db().await;
        let store = AppointmentStore::new(db);

        let created = store
            .create_or_update(candidate("chat-1", "Zahnarzt", 0.95), 0.85, 0.9)
            .await
            .expect("create succeeds");
        let id = created.appointment().id.clone();

        let confirmed = store.confirm(&id).await.expect("confirm succeeds");
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let cancelled = store.cancel(&id).await.expect("cancel succeeds");
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn pending_sync_rows_are_tracked_until_cleared() {
        let db = test_db().await;
        let store = AppointmentStore::new(db);

        let created = store
            .create_or_update(candidate("chat-1", "Elternabend", 0.95), 0.85, 0.9)
            .await
            .expect("create succeeds");
        let id = created.appointment().id.clone();

        store.mark_pending_sync(&id).await.expect("flag succeeds");
        assert_eq!(store.pending_sync_rows().await.unwrap().len(), 1);

        store
            .mark_calendar_synced(&id, "cal-uid-1")
            .await
            .expect("sync succeeds");
        assert_eq!(store.pending_sync_rows().await.unwrap().len(), 0);
    }
}
