//! Pre-filter deciding whether a message plausibly carries appointment
//! timing information. A disjunction of compiled regex
//! families; generous on purpose, since a false negative silently drops an
//! appointment while a false positive only costs one LLM call.

use once_cell::sync::Lazy;
use regex::Regex;
use termin_core::Message;

static EXPLICIT_DATE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)\b\d{1,2}[./]\d{1,2}(?:[./]\d{2,4})?\b").unwrap()
});

static EXPLICIT_TIME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)\b\d{1,2}:\d{2}\b|\b\d{1,2}\s*uhr\b").unwrap()
});

static BARE_TIME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\s*\d{1,2}(:\d{2})?\s*(uhr)?\s*\.?\s*$").unwrap()
});

static BARE_DATE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\s*\d{1,2}[./]\d{1,2}(?:[./]\d{2,4})?\s*\.?\s*$").unwrap()
});

static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r"(?i)\b(montag|dienstag|mittwoch|donnerstag|freitag|samstag|sonntag)\b",
    )
    .unwrap()
});

static RELATIVE_PHRASE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r"(?i)\b(heute|morgen|übermorgen|nächste woche|nächsten|kommenden|kommende woche)\b",
    )
    .unwrap()
});

static DURATION_PHRASE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)\b(bis|von\s+\d{1,2}\s*(uhr)?\s*bis|für\s+\d+\s*(stunden|tage))\b").unwrap()
});

static EVENT_NOUN: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(
        r"(?i)\b(termin|training|schule|geburtstag|feier|abholung|ankunft|arzt|kita|elternabend|wettkampf)\b",
    )
    .unwrap()
});

static QUESTION_WORD: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?i)\b(wann|welche uhrzeit|wann genau)\b").unwrap()
});

/// A question cue: the message ends with `?` AND contains one of the
/// `wann`/`welche Uhrzeit`/`wann genau` phrases — either
/// alone is too weak a signal to resolve a bare time/date against.
fn is_question_cue(text: &str) -> bool {
    text.trim_end().ends_with('?') && QUESTION_WORD.is_match(text)
}

/// Whether `text` alone contains any of the positive signal families.
#[must_use]
fn has_direct_signal(text: &str) -> bool {
    EXPLICIT_DATE.is_match(text)
        || EXPLICIT_TIME.is_match(text)
        || WEEKDAY.is_match(text)
        || RELATIVE_PHRASE.is_match(text)
        || DURATION_PHRASE.is_match(text)
        || EVENT_NOUN.is_match(text)
}

/// Decide whether `text` (with `preceding` as the last-10 window, oldest
/// first) should proceed to extraction.
///
/// Regex compilation failures are a programming fault, not a runtime
/// condition this function can hit — `Lazy` patterns above are fixed
/// strings; if one were ever invalid the `unwrap` panics at first use, never
/// silently returning `false` and losing an appointment.
#[must_use]
pub fn passes(text: &str, preceding: &[Message]) -> bool {
    let trimmed = text.trim();
    if BARE_TIME.is_match(trimmed) || BARE_DATE.is_match(trimmed) {
        return preceding.iter().rev().any(|m| is_question_cue(&m.text));
    }

    has_direct_signal(text)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn msg(text: &str) -> Message {
        Message {
            message_id: "m".to_string(),
            chat_id: "c".to_string(),
            sender: "s".to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_to: None,
        }
    }

    #[test]
    fn explicit_date_passes() {
        assert!(passes("Am 18.02. ist Romys Geburtstag", &[]));
    }

    #[test]
    fn event_noun_passes() {
        assert!(passes("Enno hat morgen Training", &[]));
    }

    #[test]
    fn bare_time_without_question_context_fails() {
        assert!(!passes("13:45", &[msg("Was gibt es zum Abendessen?")]));
    }

    #[test]
    fn bare_time_after_question_passes() {
        assert!(passes("13:45", &[msg("Wann kommt Enno morgen?")]));
    }

    #[test]
    fn empty_text_fails() {
        assert!(!passes("", &[]));
    }

    #[test]
    fn unrelated_chatter_fails() {
        assert!(!passes("Wie war dein Tag?", &[]));
    }
}
