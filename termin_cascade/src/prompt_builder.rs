//! Builds the `CascadePrompt` handed to each provider: a fixed system
//! preamble plus user content assembled from `PromptContext` in a fixed
//! order, so the model sees the same structure on every call regardless of
//! which sections are empty.

use termin_core::{CascadePrompt, Message, PromptContext};

const SYSTEM_PREAMBLE: &str = "Du bist ein Terminextraktor für familiäre Chatnachrichten. \
Begründe jede Entscheidung entlang sechs Dimensionen: Zeit (wann genau, relativ oder absolut), \
Familie (wer ist betroffen), Handlung (anlegen, aktualisieren, stornieren), Kontext (frühere \
Nachrichten, bestehende Termine, Gedächtnis), Plausibilität (ist das wirklich ein Termin oder nur \
eine beiläufige Erwähnung), und Absicht (ist die Nachricht an die Familie gerichtet oder reine \
Konversation). \
Antworte ausschließlich mit einem JSON-Objekt der Form \
{\"actions\": [{\"action\": \"create|update|cancel\", \"updates_termin_id\": string|null, \
\"title\": string, \"datetime\": string|null, \"date\": string|null, \"all_day\": bool, \
\"end_datetime\": string|null, \"participants\": [string], \"category\": \
\"appointment|task|milestone|reminder\", \"relevance\": \"for_me|shared|partner_only|affects_me\", \
\"confidence\": number, \"source_message_ids\": [string], \"reasoning\": string}], \
\"reasoning\": string}. Ein Update oder Cancel muss `updates_termin_id` auf eine der im Kontext \
genannten Termin-IDs setzen. Wenn kein Termin erkennbar ist, antworte mit leerem actions-Array.";

/// Assemble the user content in the fixed order (a)–(i): today's date and
/// zone; calendar lookup table; user/partner/children names; detected
/// person profiles; memory context (skipped if empty); existing
/// appointments window; recent messages; feedback examples; the message
/// under analysis.
#[must_use]
pub fn build(context: &PromptContext, message: &Message) -> CascadePrompt {
    let mut sections = Vec::new();

    // (a) today's date and zone
    sections.push(format!(
        "Heutiges Datum: {} (Zeitzone: {})",
        context.today, context.timezone
    ));

    // (b) calendar lookup table
    if !context.calendar_lookup.is_empty() {
        let table = context
            .calendar_lookup
            .iter()
            .map(|(phrase, date)| format!("{phrase} -> {date}"))
            .collect::<Vec<_>>()
            .join(", ");
        sections.push(format!("Kalender-Nachschlagetabelle: {table}"));
    }

    // (c) user/partner/children names
    let mut family = format!(
        "Familie: Nutzer={}, Partner={}",
        context.user_name, context.partner_name
    );
    if !context.children_names.is_empty() {
        family.push_str(&format!(", Kinder={}", context.children_names.join(", ")));
    }
    sections.push(family);

    // (d) detected person profiles
    if !context.persons.is_empty() {
        let rendered = context
            .persons
            .iter()
            .map(|p| p.rendered.clone())
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Personenprofile:\n{rendered}"));
    }

    // (e) memory context block, skipped if empty
    if let Some(block) = context.memory.render_block() {
        sections.push(format!("Gedächtniskontext:\n{block}"));
    }

    // (f) existing appointments in the lookback/lookahead window
    if !context.existing_appointments.is_empty() {
        let rendered = context
            .existing_appointments
            .iter()
            .map(|a| format!("- [{}] {} ({:?}, {:?})", a.id, a.title, a.category, a.status))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Bestehende Termine:\n{rendered}"));
    }

    // (g) recent messages (oldest first, never including the message under analysis)
    if !context.recent_messages.is_empty() {
        sections.push(format!(
            "Bisheriger Gesprächsverlauf:\n{}",
            context.recent_messages.join("\n")
        ));
    }

    // (h) recent rejected/edited feedback examples
    if !context.feedback_examples.is_empty() {
        let rendered = context
            .feedback_examples
            .iter()
            .map(|e| e.rendered.clone())
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Frühere Korrekturen:\n{rendered}"));
    }

    // (i) the message under analysis
    sections.push(format!(
        "Zu analysierende Nachricht von {}: {}",
        message.sender, message.text
    ));

    CascadePrompt {
        system: SYSTEM_PREAMBLE.to_string(),
        user: sections.join("\n\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use termin_core::MemoryContext;

    fn message() -> Message {
        Message {
            message_id: "m1".into(),
            chat_id: "c1".into(),
            sender: "Alex".into(),
            text: "Enno hat morgen Training".into(),
            timestamp: Utc::now(),
            reply_to: None,
        }
    }

    fn context() -> PromptContext {
        PromptContext {
            user_name: "Alex".into(),
            partner_name: "Sam".into(),
            children_names: vec!["Enno".into()],
            today: "2026-07-29".into(),
            timezone: "Europe/Berlin".into(),
            calendar_lookup: vec![("morgen".into(), "2026-07-30".into())],
            recent_messages: vec![],
            existing_appointments: vec![],
            memory: MemoryContext::empty(),
            feedback_examples: vec![],
            persons: vec![],
        }
    }

    #[test]
    fn orders_sections_and_includes_message_last() {
        let prompt = build(&context(), &message());
        let today_idx = prompt.user.find("Heutiges Datum").unwrap();
        let lookup_idx = prompt.user.find("Nachschlagetabelle").unwrap();
        let family_idx = prompt.user.find("Familie:").unwrap();
        let message_idx = prompt.user.find("Zu analysierende Nachricht").unwrap();
        assert!(today_idx < lookup_idx);
        assert!(lookup_idx < family_idx);
        assert!(family_idx < message_idx);
        assert!(message_idx > prompt.user.len() / 2);
    }

    #[test]
    fn renders_the_configured_zone_not_a_hardcoded_one() {
        let mut ctx = context();
        ctx.timezone = "Asia/Tokyo".into();
        let prompt = build(&ctx, &message());
        assert!(prompt.user.contains("Zeitzone: Asia/Tokyo"));
        assert!(!prompt.user.contains("Europe/Berlin"));
    }

    #[test]
    fn skips_empty_memory_block() {
        let prompt = build(&context(), &message());
        assert!(!prompt.user.contains("Gedächtniskontext"));
    }

    #[test]
    fn includes_memory_block_when_present() {
        let mut ctx = context();
        ctx.memory = MemoryContext {
            episodes: "Enno war letztes Jahr beim Zahnarzt".into(),
            profiles: String::new(),
            facts: String::new(),
            empty: false,
        };
        let prompt = build(&ctx, &message());
        assert!(prompt.user.contains("Gedächtniskontext"));
    }

    #[test]
    fn system_preamble_names_all_six_dimensions() {
        let prompt = build(&context(), &message());
        for term in ["Zeit", "Familie", "Handlung", "Kontext", "Plausibilität", "Absicht"] {
            assert!(prompt.system.contains(term), "missing dimension: {term}");
        }
    }
}
