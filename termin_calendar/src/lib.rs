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

//! The `CalendarSink`: translates appointments into events
//! on one of two logical remote calendars and owns the
//! `appointment.id <-> calendar_uid` binding via `termin_store`.

mod draft;
mod http_client;
mod sink;

pub use draft::build_draft;
pub use http_client::HttpCalendarClient;
pub use sink::{CalendarSink, current_calendar};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use sea_orm::{ConnectionTrait, Database, Schema};
    use termin_core::{
        Appointment, AppointmentStatus, CalendarClient, CalendarError, CalendarEventDraft,
        CalendarName, Category, Relevance, TimingRepr,
    };
    use termin_store::AppointmentStore;

    use super::*;

    #[derive(Default)]
    struct FakeCalendar {
        writes: Mutex<Vec<(CalendarName, String)>>,
    }

    #[async_trait]
    impl CalendarClient for FakeCalendar {
        async fn write(
            &self,
            calendar: CalendarName,
            event: &CalendarEventDraft,
        ) -> Result<String, CalendarError> {
            let uid = format!("uid-{}", self.writes.lock().unwrap().len());
            self.writes
                .lock()
                .unwrap()
                .push((calendar, event.title.clone()));
            Ok(uid)
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

    async fn test_store() -> Arc<AppointmentStore> {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let builder = db.get_database_backend();
        let schema = Schema::new(builder);
        db.execute(builder.build(&schema.create_table_from_entity(
            termin_entities::AppointmentEntity,
        )))
        .await
        .unwrap();
        Arc::new(AppointmentStore::new(db))
    }

    fn candidate(status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
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
            status,
            confidence: 0.9,
            source_message_ids: Default::default(),
            calendar_uid: None,
            reasoning: "explicit time given".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn sync_create_routes_by_status_and_persists_uid() {
        let store = test_store().await;
        let appt = candidate(AppointmentStatus::Auto);
        store
            .create_or_update(appt.clone(), 0.85, 0.9)
            .await
            .unwrap();

        let calendar = Arc::new(FakeCalendar::default());
        let sink = CalendarSink::new(calendar.clone(), store.clone(), "Europe/Berlin");
        sink.sync_create(&appt, &["Enno".to_string()]).await;

        let reloaded = store.get("appt-1").await.unwrap();
        assert_eq!(reloaded.calendar_uid, Some("uid-0".to_string()));
        assert_eq!(calendar.writes.lock().unwrap()[0].0, CalendarName::Confirmed);
    }

    #[test]
    fn current_calendar_maps_terminal_states_to_none() {
        assert_eq!(
            current_calendar(AppointmentStatus::Rejected),
            None
        );
        assert_eq!(
            current_calendar(AppointmentStatus::Suggested),
            Some(CalendarName::Suggested)
        );
    }
}
