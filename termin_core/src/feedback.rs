//! `FeedbackRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The outcome of one user review of an extracted appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackAction {
    Confirmed,
    Rejected,
    Edited,
    Skipped,
}

/// A user correction against a previously extracted appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: String,
    pub appointment_id: String,
    pub action: FeedbackAction,
    /// Structured diff for `edited` feedback; opaque JSON since the shape
    /// of a correction mirrors whatever subset of `Appointment` fields the
    /// user changed.
    pub correction: Option<Value>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
