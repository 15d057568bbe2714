//! The `CalendarClient` trait seam and the event shape
//! sent to the external calendar collaborator.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::appointment::Category;

/// Which of the two logical calendars an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarName {
    Confirmed,
    Suggested,
}

/// Reminder offsets before `start`: `{-5d,-2d,-1d,-2h}` for
/// `appointment`, `{-1d,-1h}` for `task`. Milestones and reminders default
/// to a single day-before nudge.
#[must_use]
pub fn default_reminders(category: Category) -> Vec<Duration> {
    match category {
        Category::Appointment => vec![
            Duration::days(-5),
            Duration::days(-2),
            Duration::days(-1),
            Duration::hours(-2),
        ],
        Category::Task => vec![Duration::days(-1), Duration::hours(-1)],
        Category::Milestone | Category::Reminder => vec![Duration::days(-1)],
    }
}

/// The event representation handed to the external calendar.
#[derive(Debug, Clone)]
pub struct CalendarEventDraft {
    pub title: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub date: Option<NaiveDate>,
    pub attendees: Vec<String>,
    pub description: String,
    pub reminders: Vec<Duration>,
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar sync failed: {0}")]
    SyncFailure(#[source] anyhow::Error),
}

/// Write/update/delete against a remote calendar. At most one remote event
/// per `appointment.id` per calendar; moves
/// between calendars are delete-then-write at the call site
/// (`termin_calendar::CalendarSink`), not inside a single trait method.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn write(
        &self,
        calendar: CalendarName,
        event: &CalendarEventDraft,
    ) -> Result<String, CalendarError>;

    async fn update(
        &self,
        calendar: CalendarName,
        uid: &str,
        event: &CalendarEventDraft,
    ) -> Result<(), CalendarError>;

    async fn delete(&self, calendar: CalendarName, uid: &str) -> Result<(), CalendarError>;
}
