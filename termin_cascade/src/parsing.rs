//! Resilient parsing of a provider's raw text response into a
//! [`CascadeResponse`].
//!
//! Models do not reliably return bare JSON even when told to. Three
//! structural strategies are tried in order, each a fallback for the
//! previous one's failure mode:
//!
//! 1. Parse the whole response as JSON.
//! 2. Extract the first balanced `{...}` span and parse that.
//! 3. Extract a fenced code block (` ```json ` or bare ` ``` `) and parse
//!    its contents.
//!
//! Any of these yielding a JSON object — including one with an empty
//! `actions` array — is a definitive answer: the model looked and found
//! nothing. Only when all three fail to find anything shaped like JSON does
//! the caller fall further, to [`synthesize_fallback`], as a last resort
//! rather than a hard error.

use once_cell::sync::Lazy;
use regex::Regex;
use termin_core::{ActionKind, AppointmentAction, Category, CascadeResponse, Relevance};

#[allow(clippy::expect_used)]
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").expect("valid regex"));

/// A cautious German/English date-ish phrase, used only to decide whether
/// the fallback strategy has enough signal to synthesize an action at all.
#[allow(clippy::expect_used)]
static DATE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(morgen|übermorgen|heute|montag|dienstag|mittwoch|donnerstag|freitag|samstag|sonntag|\d{1,2}\.\d{1,2}\.|\d{1,2}:\d{2})")
        .expect("valid regex")
});

/// A handful of common family-appointment nouns. The fallback path only
/// fires when BOTH this and [`DATE_HINT`] match — a bare date mention
/// ("seit dem 3.4. ist es wärmer") is not an event on its own.
#[allow(clippy::expect_used)]
static EVENT_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(termin|training|geburtstag|elternabend|arzt|zahnarzt|schule|kita|fußball|turnier|ausflug|ferien|besuch|konzert|meeting|abgabe|prüfung)")
        .expect("valid regex")
});

/// The result of attempting the three structural parse strategies.
pub enum ParseOutcome {
    /// A JSON object was found and decoded, `actions` possibly empty. This
    /// is authoritative and must not trigger cascade advancement.
    Parsed(CascadeResponse),
    /// None of the structural strategies found anything shaped like JSON.
    Unparseable,
}

#[must_use]
pub fn parse(raw: &str) -> ParseOutcome {
    if let Some(response) = try_whole_json(raw) {
        return ParseOutcome::Parsed(response);
    }
    if let Some(response) = try_balanced_braces(raw) {
        return ParseOutcome::Parsed(response);
    }
    if let Some(response) = try_fenced_block(raw) {
        return ParseOutcome::Parsed(response);
    }
    ParseOutcome::Unparseable
}

fn try_whole_json(raw: &str) -> Option<CascadeResponse> {
    serde_json::from_str(raw.trim()).ok()
}

fn try_balanced_braces(raw: &str) -> Option<CascadeResponse> {
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

fn try_fenced_block(raw: &str) -> Option<CascadeResponse> {
    let captures = FENCED_BLOCK.captures(raw)?;
    let inner = captures.get(1)?.as_str().trim();
    try_whole_json(inner).or_else(|| try_balanced_braces(inner))
}

/// Last resort, called only after [`parse`] returns [`ParseOutcome::Unparseable`]:
/// the response carries no recognizable JSON at all. Rather than discarding
/// a plausible extraction outright, synthesize one low-confidence `create`
/// action when the text has date-shaped content, and an empty response
/// otherwise.
#[must_use]
pub fn synthesize_fallback(raw: &str) -> CascadeResponse {
    if !DATE_HINT.is_match(raw) || !EVENT_NOUN.is_match(raw) {
        return CascadeResponse::default();
    }

    let title = raw
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or(raw)
        .chars()
        .take(120)
        .collect::<String>();

    CascadeResponse {
        actions: vec![AppointmentAction {
            action: Some(ActionKind::Create),
            title: Some(title),
            category: Some(Category::Appointment),
            relevance: Some(Relevance::Shared),
            confidence: Some(0.2),
            reasoning: Some("synthesized from unstructured provider response".to_string()),
            synthesized: true,
            ..AppointmentAction::default()
        }],
        reasoning: "provider response carried no parseable JSON".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_parsed(outcome: ParseOutcome) -> CascadeResponse {
        match outcome {
            ParseOutcome::Parsed(response) => response,
            ParseOutcome::Unparseable => panic!("expected a parsed response"),
        }
    }

    #[test]
    fn parses_whole_json() {
        let raw = r#"{"actions": [{"action": "create", "title": "Training"}], "reasoning": "ok"}"#;
        let response = unwrap_parsed(parse(raw));
        assert_eq!(response.actions.len(), 1);
        assert_eq!(response.actions[0].title.as_deref(), Some("Training"));
    }

    #[test]
    fn extracts_balanced_braces_around_prose() {
        let raw = "Hier ist das Ergebnis: {\"actions\": [], \"reasoning\": \"nichts gefunden\"} Danke.";
        let response = unwrap_parsed(parse(raw));
        assert!(response.actions.is_empty());
        assert_eq!(response.reasoning, "nichts gefunden");
    }

    #[test]
    fn extracts_fenced_json_block() {
        let raw = "Hier:\n```json\n{\"actions\": [{\"action\": \"cancel\"}], \"reasoning\": \"x\"}\n```\n";
        let response = unwrap_parsed(parse(raw));
        assert_eq!(response.actions.len(), 1);
        assert_eq!(response.actions[0].action, Some(ActionKind::Cancel));
    }

    #[test]
    fn structural_parse_is_unparseable_for_prose_without_json() {
        let raw = "Enno hat morgen um 15:00 Training, das sollten wir eintragen.";
        assert!(matches!(parse(raw), ParseOutcome::Unparseable));
    }

    #[test]
    fn synthesizes_from_unstructured_response_with_date_hint() {
        let raw = "Enno hat morgen um 15:00 Training, das sollten wir eintragen.";
        let response = synthesize_fallback(raw);
        assert_eq!(response.actions.len(), 1);
        assert!(response.actions[0].synthesized);
        assert!(response.actions[0].confidence.unwrap() < 0.5);
    }

    #[test]
    fn returns_empty_when_nothing_parseable_and_no_date_hint() {
        let raw = "Das ist nur ein netter Plausch ohne jeden Termin.";
        assert!(matches!(parse(raw), ParseOutcome::Unparseable));
        assert!(synthesize_fallback(raw).actions.is_empty());
    }
}
