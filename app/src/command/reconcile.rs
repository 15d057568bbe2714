use std::sync::Arc;

use chrono::Utc;
use termin_calendar::CalendarSink;
use termin_person::PersonStore;
use termin_store::AppointmentStore;
use tokio::sync::Mutex;
use tracing::info;

/// Maintenance pass: re-attempts calendar sync for every row flagged
/// `pending_sync`, then expires stale suggestions.
pub struct ReconcileStrategy {
    pub store: Arc<AppointmentStore>,
    pub calendar: Arc<CalendarSink>,
    pub persons: Arc<Mutex<PersonStore>>,
}

impl super::CommandStrategy for ReconcileStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let pending = self.store.pending_sync_rows().await?;
        let persons_guard = self.persons.lock().await;
        for appt in &pending {
            let attendees: Vec<String> = appt
                .participants
                .iter()
                .map(|key| {
                    persons_guard
                        .get(key)
                        .map_or_else(|| key.clone(), |p| p.name.clone())
                })
                .collect();
            if appt.calendar_uid.is_none() {
                self.calendar.sync_create(appt, &attendees).await;
            } else {
                self.calendar.sync_update(appt, &attendees).await;
            }
        }
        drop(persons_guard);

        let expired = self.store.expire_stale_suggestions(Utc::now()).await?;

        info!(
            resynced = pending.len(),
            expired,
            "reconciliation pass complete"
        );
        println!(
            "resynced {} pending appointment(s), expired {expired} stale suggestion(s)",
            pending.len()
        );
        Ok(())
    }
}
