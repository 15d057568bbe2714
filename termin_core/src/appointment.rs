//! The `Appointment` domain type and the raw `AppointmentAction` the LLM
//! cascade emits before validation.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of thing an appointment row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Appointment,
    Task,
    Milestone,
    Reminder,
}

impl Default for Category {
    fn default() -> Self {
        Self::Appointment
    }
}

/// Whose calendar an appointment is relevant to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    ForMe,
    Shared,
    PartnerOnly,
    AffectsMe,
}

/// The appointment state machine.
///
/// Terminal states: `Rejected`, `Cancelled`, `Skipped`. `Confirmed` can still
/// receive `update`/`cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Auto,
    Suggested,
    Confirmed,
    Rejected,
    Cancelled,
    Skipped,
}

impl AppointmentStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Skipped)
    }

    /// Route a fresh `create` action to `Auto` or `Suggested` per the
    /// confidence threshold.
    #[must_use]
    pub fn route_for_confidence(confidence: f64, auto_threshold: f64) -> Self {
        if confidence >= auto_threshold {
            Self::Auto
        } else {
            Self::Suggested
        }
    }
}

/// Exactly one of `Timed`/`AllDay` is ever constructed — the type itself
/// enforces the invariant ("exactly one of `datetime` or `date` is set
/// according to `all_day`") instead of relying on a bool-plus-two-Options
/// shape that can be built inconsistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Timing {
    Timed {
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    },
    AllDay {
        date: NaiveDate,
    },
}

impl Timing {
    #[must_use]
    pub const fn all_day(&self) -> bool {
        matches!(self, Self::AllDay { .. })
    }

    #[must_use]
    pub const fn start(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timed { start, .. } => Some(*start),
            Self::AllDay { .. } => None,
        }
    }
}

/// An owned, persisted appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub chat_id: String,
    pub title: String,
    #[serde(flatten)]
    pub timing_repr: TimingRepr,
    pub participants: BTreeSet<String>,
    pub category: Category,
    pub relevance: Relevance,
    pub status: AppointmentStatus,
    pub confidence: f64,
    pub source_message_ids: BTreeSet<String>,
    pub calendar_uid: Option<String>,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire/storage representation of [`Timing`]: flat optional fields, the
/// shape the LLM JSON contract and the `sea_orm` entity both use. Conversion
/// to/from the invariant-holding [`Timing`] happens at the validator and
/// store boundaries (parse, don't validate deep in the pipeline, but stay
/// flat at the edges where JSON/SQL require it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRepr {
    pub datetime: Option<NaiveDateTime>,
    pub date: Option<NaiveDate>,
    pub all_day: bool,
    pub end_datetime: Option<NaiveDateTime>,
}

impl From<&Timing> for TimingRepr {
    fn from(t: &Timing) -> Self {
        match t {
            Timing::Timed { start, end } => Self {
                datetime: Some(*start),
                date: None,
                all_day: false,
                end_datetime: *end,
            },
            Timing::AllDay { date } => Self {
                datetime: None,
                date: Some(*date),
                all_day: true,
                end_datetime: None,
            },
        }
    }
}

impl TimingRepr {
    /// Attempt to recover the invariant-holding [`Timing`]; `None` if the
    /// representation is inconsistent (neither a start nor an all-day date).
    #[must_use]
    pub fn into_timing(self) -> Option<Timing> {
        if self.all_day {
            self.date.map(|date| Timing::AllDay { date })
        } else {
            self.datetime.map(|start| Timing::Timed {
                start,
                end: self.end_datetime,
            })
        }
    }
}

impl Appointment {
    #[must_use]
    pub fn timing(&self) -> Option<Timing> {
        self.timing_repr.clone().into_timing()
    }
}

/// What the LLM wants done with an appointment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Update,
    Cancel,
}

/// Raw LLM output for one appointment action, before `ExtractionValidator`
/// normalizes and checks it. Every field beyond `action` is optional because
/// the model may omit anything; the validator's schema-shape rule decides
/// what is fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentAction {
    pub action: Option<ActionKind>,
    pub updates_termin_id: Option<String>,
    pub title: Option<String>,
    pub datetime: Option<NaiveDateTime>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub all_day: bool,
    pub end_datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub participants: BTreeSet<String>,
    pub category: Option<Category>,
    pub relevance: Option<Relevance>,
    pub confidence: Option<f64>,
    #[serde(default)]
    pub source_message_ids: BTreeSet<String>,
    pub reasoning: Option<String>,
    /// Set by the cascade's natural-language fallback parser; never present
    /// on the wire. Drives the validator's confidence cap.
    #[serde(skip, default)]
    pub synthesized: bool,
}

/// Top-level LLM cascade response: `{actions: [...], reasoning: string}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CascadeResponse {
    #[serde(default)]
    pub actions: Vec<AppointmentAction>,
    #[serde(default)]
    pub reasoning: String,
}
