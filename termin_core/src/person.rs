//! The `Person` knowledge profile.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// One recurring activity entry: `{type, pattern, termin_logic[]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
    #[serde(default)]
    pub termin_logic: Vec<String>,
}

/// Maximum size of the `uncertain` ring buffer.
pub const UNCERTAIN_CAPACITY: usize = 20;

/// A bounded ring buffer of unverified observations.
///
/// Pushing past capacity drops the oldest entry. Duplicate strings are
/// never pushed twice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UncertainRing(VecDeque<String>);

impl UncertainRing {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    #[must_use]
    pub fn latest(&self, n: usize) -> Vec<String> {
        self.0.iter().rev().take(n).cloned().collect()
    }

    #[must_use]
    pub fn contains(&self, s: &str) -> bool {
        self.0.iter().any(|e| e == s)
    }

    /// Push a new observation; no-op if already present. Drops the oldest
    /// entry once at capacity.
    pub fn push(&mut self, observation: String) {
        if self.contains(&observation) {
            return;
        }
        if self.0.len() >= UNCERTAIN_CAPACITY {
            self.0.pop_front();
        }
        self.0.push_back(observation);
    }
}

/// A per-person knowledge profile; the YAML file on disk is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub facts: Vec<String>,
    #[serde(default)]
    pub activities: std::collections::BTreeMap<String, Activity>,
    #[serde(default)]
    pub termin_hints: Vec<String>,
    #[serde(default)]
    pub uncertain: UncertainRing,
    /// True once any fact in `facts` confirms this person is a child of the
    /// household; drives validator rule 6 (relevance inference).
    #[serde(default)]
    pub is_child: bool,
}

impl Person {
    /// Every name this person can be referenced by, for alias-and-name
    /// detection.
    #[must_use]
    pub fn all_names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        names.extend(self.aliases.iter().map(String::as_str));
        names
    }

    /// Move a string from `uncertain` into `facts`. No-op if the string is
    /// not currently in `uncertain` (an entry is only ever promoted, never
    /// silently demoted.
    pub fn promote_to_fact(&mut self, observation: &str) {
        if let Some(pos) = self.uncertain.0.iter().position(|e| e == observation) {
            self.uncertain.0.remove(pos);
            if !self.facts.iter().any(|f| f == observation) {
                self.facts.push(observation.to_string());
            }
        }
    }

    /// Append an unverified observation to `uncertain`, unless the exact
    /// string is already a confirmed fact (facts and uncertain never share
    /// a string).
    pub fn add_uncertain(&mut self, observation: String) {
        if self.facts.iter().any(|f| f == &observation) {
            return;
        }
        self.uncertain.push(observation);
    }

    /// Append a confirmed fact, deduplicated.
    pub fn add_fact(&mut self, fact: String) {
        if !self.facts.iter().any(|f| f == &fact) {
            self.facts.push(fact);
        }
    }

    /// Merge a reflection-derived activity into `activities`. An unseen
    /// name is inserted outright; an existing one only gains the
    /// `termin_logic` lines it doesn't already have — `kind` and `pattern`
    /// are never overwritten by a merge.
    pub fn merge_activity(&mut self, name: String, activity: Activity) {
        match self.activities.get_mut(&name) {
            Some(existing) => {
                for logic in activity.termin_logic {
                    if !existing.termin_logic.contains(&logic) {
                        existing.termin_logic.push(logic);
                    }
                }
            }
            None => {
                self.activities.insert(name, activity);
            }
        }
    }

    /// Append a termin hint, deduplicated.
    pub fn add_termin_hint(&mut self, hint: String) {
        if !self.termin_hints.iter().any(|h| h == &hint) {
            self.termin_hints.push(hint);
        }
    }
}
