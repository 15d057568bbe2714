//! `PromptContext` and `MemoryContext`.

use serde::{Deserialize, Serialize};

use crate::appointment::Appointment;
use crate::feedback::FeedbackRecord;

/// Opaque rendered knowledge bundle returned by the external semantic
/// memory service. The core never inspects its contents beyond
/// these three rendered-string sections and the `empty` flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryContext {
    pub episodes: String,
    pub profiles: String,
    pub facts: String,
    pub empty: bool,
}

impl MemoryContext {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }

    /// Render as a single prompt block, or `None` if empty").
    #[must_use]
    pub fn render_block(&self) -> Option<String> {
        if self.empty {
            return None;
        }
        let mut parts = Vec::new();
        if !self.episodes.is_empty() {
            parts.push(format!("Episodes:\n{}", self.episodes));
        }
        if !self.profiles.is_empty() {
            parts.push(format!("Profiles:\n{}", self.profiles));
        }
        if !self.facts.is_empty() {
            parts.push(format!("Facts:\n{}", self.facts));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }
}

/// A single rendered person-profile fragment for the prompt: `{name, role, facts, activities.summaries, termin_hints, latest
/// 3 uncertain}`, already serialized to a bounded-length string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonProfileFragment {
    pub key: String,
    pub rendered: String,
}

/// One rejected/edited feedback example with its correction, rendered for
/// the prompt).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackExample {
    pub record: FeedbackRecord,
    pub rendered: String,
}

/// The fully assembled context handed to the LLM cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptContext {
    pub user_name: String,
    pub partner_name: String,
    pub children_names: Vec<String>,
    /// ISO date in the user's configured zone.
    pub today: String,
    /// IANA zone name `today` was computed in, e.g. `Europe/Berlin`.
    pub timezone: String,
    /// Relative-phrase -> ISO-date table.
    pub calendar_lookup: Vec<(String, String)>,
    /// Oldest-first, rendered lines, never including the message under analysis.
    pub recent_messages: Vec<String>,
    /// Within the `[today-7d, today+53d]` window, capped at `max_existing`.
    pub existing_appointments: Vec<Appointment>,
    pub memory: MemoryContext,
    /// Last K rejected/edited feedback records for this chat.
    pub feedback_examples: Vec<FeedbackExample>,
    pub persons: Vec<PersonProfileFragment>,
}

impl PromptContext {
    #[must_use]
    pub fn calendar_lookup_get(&self, phrase: &str) -> Option<&str> {
        self.calendar_lookup
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(phrase))
            .map(|(_, v)| v.as_str())
    }
}
