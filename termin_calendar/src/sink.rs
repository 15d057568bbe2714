//! `CalendarSink`: the appointment <-> remote-calendar binding. Owns the
//! mapping `appointment.id <-> calendar_uid` by delegating
//! storage of that mapping to `termin_store::AppointmentStore`; this type
//! only ever talks to the `CalendarClient` trait object and decides which
//! of the two logical calendars (confirmed/suggested) an appointment
//! belongs in.

use std::str::FromStr;
use std::sync::Arc;

use chrono::TimeZone;
use chrono_tz::Tz;
use termin_core::{Appointment, AppointmentStatus, CalendarClient, CalendarName, Timing};
use termin_store::AppointmentStore;
use tracing::warn;

use crate::draft::build_draft;

/// The calendar an appointment's current status maps to,
/// `None` for terminal states that carry no live remote event.
#[must_use]
pub const fn current_calendar(status: AppointmentStatus) -> Option<CalendarName> {
    match status {
        AppointmentStatus::Auto | AppointmentStatus::Confirmed => Some(CalendarName::Confirmed),
        AppointmentStatus::Suggested => Some(CalendarName::Suggested),
        AppointmentStatus::Rejected | AppointmentStatus::Cancelled | AppointmentStatus::Skipped => {
            None
        }
    }
}

pub struct CalendarSink {
    client: Arc<dyn CalendarClient>,
    store: Arc<AppointmentStore>,
    zone: Tz,
}

impl CalendarSink {
    /// # Panics
    /// If `timezone` is not a valid IANA zone name. Configuration is
    /// validated once at process startup, so this is acceptable here.
    #[must_use]
    pub fn new(client: Arc<dyn CalendarClient>, store: Arc<AppointmentStore>, timezone: &str) -> Self {
        let zone = Tz::from_str(timezone)
            .unwrap_or_else(|_| panic!("invalid configured timezone: {timezone}"));
        Self {
            client,
            store,
            zone,
        }
    }

    fn resolve_utc(&self, timing: &Timing) -> (Option<chrono::DateTime<chrono::Utc>>, Option<chrono::DateTime<chrono::Utc>>) {
        match timing {
            Timing::Timed { start, end } => {
                let start_utc = self
                    .zone
                    .from_local_datetime(start)
                    .single()
                    .map(|dt| dt.with_timezone(&chrono::Utc));
                let end_utc = end.and_then(|e| {
                    self.zone
                        .from_local_datetime(&e)
                        .single()
                        .map(|dt| dt.with_timezone(&chrono::Utc))
                });
                (start_utc, end_utc)
            }
            Timing::AllDay { .. } => (None, None),
        }
    }

    /// Write a freshly created appointment to the calendar its routed
    /// status maps to. Failures are logged and flagged `pending_sync`
    /// rather than propagated.
    pub async fn sync_create(&self, appt: &Appointment, attendee_names: &[String]) {
        let Some(calendar) = current_calendar(appt.status) else {
            return;
        };
        let Some(timing) = appt.timing() else {
            warn!(id = %appt.id, "appointment has no resolvable timing, skipping calendar sync");
            return;
        };
        let (start, end) = self.resolve_utc(&timing);
        let draft = build_draft(appt, &timing, start, end, attendee_names);

        match self.client.write(calendar, &draft).await {
            Ok(uid) => {
                if let Err(err) = self.store.mark_calendar_synced(&appt.id, &uid).await {
                    warn!(%err, id = %appt.id, "failed to persist calendar_uid after write");
                }
            }
            Err(err) => {
                warn!(%err, id = %appt.id, "calendar write failed, flagging pending_sync");
                if let Err(store_err) = self.store.mark_pending_sync(&appt.id).await {
                    warn!(%store_err, id = %appt.id, "failed to flag pending_sync");
                }
            }
        }
    }

    /// Push an `update` action or user `edited` correction to the remote
    /// event at its current calendar. Falls back to a fresh write if the
    /// row has no `calendar_uid` yet.
    pub async fn sync_update(&self, appt: &Appointment, attendee_names: &[String]) {
        let Some(calendar) = current_calendar(appt.status) else {
            return;
        };
        let Some(uid) = appt.calendar_uid.clone() else {
            self.sync_create(appt, attendee_names).await;
            return;
        };
        let Some(timing) = appt.timing() else {
            return;
        };
        let (start, end) = self.resolve_utc(&timing);
        let draft = build_draft(appt, &timing, start, end, attendee_names);

        if let Err(err) = self.client.update(calendar, &uid, &draft).await {
            warn!(%err, id = %appt.id, "calendar update failed, flagging pending_sync");
            if let Err(store_err) = self.store.mark_pending_sync(&appt.id).await {
                warn!(%store_err, id = %appt.id, "failed to flag pending_sync");
            }
        }
    }

    /// Delete the remote event for a `cancel`/`rejected` transition.
    pub async fn sync_delete(&self, appt: &Appointment, from: CalendarName) {
        let Some(uid) = appt.calendar_uid.clone() else {
            return;
        };
        if let Err(err) = self.client.delete(from, &uid).await {
            warn!(%err, id = %appt.id, "calendar delete failed");
            if let Err(store_err) = self.store.mark_pending_sync(&appt.id).await {
                warn!(%store_err, id = %appt.id, "failed to flag pending_sync");
            }
        }
    }

    /// Move a `suggested` appointment's event to the confirmed calendar on
    /// user confirmation. Delete-then-write, best-effort
    /// atomic.
    pub async fn move_to_confirmed(&self, appt: &Appointment, attendee_names: &[String]) {
        if let Some(uid) = &appt.calendar_uid {
            if let Err(err) = self.client.delete(CalendarName::Suggested, uid).await {
                warn!(%err, id = %appt.id, "failed to delete from suggested calendar during move");
            }
        }
        let Some(timing) = appt.timing() else {
            return;
        };
        let (start, end) = self.resolve_utc(&timing);
        let draft = build_draft(appt, &timing, start, end, attendee_names);
        match self.client.write(CalendarName::Confirmed, &draft).await {
            Ok(uid) => {
                if let Err(err) = self.store.mark_calendar_synced(&appt.id, &uid).await {
                    warn!(%err, id = %appt.id, "failed to persist calendar_uid after move");
                }
            }
            Err(err) => {
                warn!(%err, id = %appt.id, "calendar write failed during move, flagging pending_sync");
                if let Err(store_err) = self.store.mark_pending_sync(&appt.id).await {
                    warn!(%store_err, id = %appt.id, "failed to flag pending_sync");
                }
            }
        }
    }
}
