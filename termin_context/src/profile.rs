//! Renders a detected [`Person`] into the `{name, role, facts,
//! activities.summaries, termin_hints, latest 3 uncertain}` prompt fragment,
//! bounded to ~80 lines.

use termin_core::{Person, PersonProfileFragment};

const MAX_LINES: usize = 80;

#[must_use]
pub fn render(person: &Person) -> PersonProfileFragment {
    let mut lines = Vec::new();
    lines.push(format!("Name: {}", person.name));
    if !person.role.is_empty() {
        lines.push(format!("Rolle: {}", person.role));
    }

    if !person.facts.is_empty() {
        lines.push("Fakten:".to_string());
        lines.extend(person.facts.iter().map(|f| format!("- {f}")));
    }

    if !person.activities.is_empty() {
        lines.push("Aktivitäten:".to_string());
        for (name, activity) in &person.activities {
            lines.push(format!("- {name}: {} ({})", activity.pattern, activity.kind));
        }
    }

    if !person.termin_hints.is_empty() {
        lines.push("Termin-Hinweise:".to_string());
        lines.extend(person.termin_hints.iter().map(|h| format!("- {h}")));
    }

    let latest_uncertain = person.uncertain.latest(3);
    if !latest_uncertain.is_empty() {
        lines.push("Unsicher (jüngste 3):".to_string());
        lines.extend(latest_uncertain.into_iter().map(|u| format!("- {u}")));
    }

    lines.truncate(MAX_LINES);
    PersonProfileFragment {
        key: person.key.clone(),
        rendered: lines.join("\n"),
    }
}
