//! The `Message` type read from the ingest collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single chat message, owned and written by the ingest collaborator.
///
/// Messages are never mutated by this core; they are read-only inputs to
/// the pipeline (DateGate, ContextAssembler) and referenced by id from
/// appointments (`source_message_ids`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub chat_id: String,
    pub sender: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub reply_to: Option<String>,
}

impl Message {
    /// Render for inclusion in an LLM prompt: `"[YYYY-MM-DD HH:MM] sender: text"`.
    ///
    /// `local_ts` is the message timestamp already converted to the
    /// configured local zone by the caller (see `termin_context`).
    #[must_use]
    pub fn render_line(&self, local_ts: &str) -> String {
        format!("[{local_ts}] {}: {}", self.sender, self.text)
    }
}
