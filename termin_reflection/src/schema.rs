//! The strict JSON schema the reflection provider must answer in, and the
//! parser for it.
//!
//! Unlike `termin_cascade::parsing` there is no natural-language fallback
//! here: a response that carries no recognizable JSON means the cycle
//! learned nothing, not that it should guess.

use std::collections::BTreeMap;

use serde::Deserialize;
use termin_core::Activity;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonUpdate {
    #[serde(default)]
    pub new_facts: Vec<String>,
    #[serde(default)]
    pub new_activities: BTreeMap<String, Activity>,
    #[serde(default)]
    pub new_termin_hints: Vec<String>,
    #[serde(default)]
    pub confidence_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReflectionMeta {
    #[serde(default)]
    pub gaps_identified: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReflectionResponse {
    #[serde(default)]
    pub updates: BTreeMap<String, PersonUpdate>,
    #[serde(default)]
    pub meta: ReflectionMeta,
}

/// Parse a raw provider response: the whole string as JSON, then the first
/// balanced `{...}` span. `None` if neither yields a well-formed
/// `ReflectionResponse`.
#[must_use]
pub fn parse(raw: &str) -> Option<ReflectionResponse> {
    try_whole_json(raw).or_else(|| try_balanced_braces(raw))
}

fn try_whole_json(raw: &str) -> Option<ReflectionResponse> {
    serde_json::from_str(raw.trim()).ok()
}

fn try_balanced_braces(raw: &str) -> Option<ReflectionResponse> {
    let start = raw.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in raw[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return serde_json::from_str(&raw[start..end]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_json_response() {
        let raw = r#"{"updates": {"enno": {"new_facts": ["spielt Klavier"]}}, "meta": {"gaps_identified": []}}"#;
        let response = parse(raw).expect("parses");
        assert_eq!(
            response.updates["enno"].new_facts,
            vec!["spielt Klavier".to_string()]
        );
    }

    #[test]
    fn extracts_balanced_braces_around_prose() {
        let raw = "Hier die Analyse: {\"updates\": {}, \"meta\": {\"gaps_identified\": [\"kein Profil fuer Tom\"]}} Ende.";
        let response = parse(raw).expect("parses");
        assert_eq!(
            response.meta.gaps_identified,
            vec!["kein Profil fuer Tom".to_string()]
        );
    }

    #[test]
    fn unparseable_response_yields_none_not_a_guess() {
        assert!(parse("Ich habe heute nichts Neues gelernt.").is_none());
    }
}
