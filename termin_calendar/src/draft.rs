//! Build the `CalendarEventDraft` the external collaborator receives from
//! an `Appointment`: attendees resolved to names,
//! description embedding reasoning and source message ids, category
//! default reminders.

use chrono::{DateTime, Utc};
use termin_core::{Appointment, CalendarEventDraft, Timing, default_reminders};

#[must_use]
pub fn build_draft(
    appt: &Appointment,
    timing: &Timing,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    attendee_names: &[String],
) -> CalendarEventDraft {
    let mut description = format!("Grund: {}", appt.reasoning);
    if !appt.source_message_ids.is_empty() {
        description.push_str("\nQuellnachrichten: ");
        description.push_str(
            &appt
                .source_message_ids
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
        );
    }

    CalendarEventDraft {
        title: appt.title.clone(),
        start,
        end,
        all_day: timing.all_day(),
        date: match timing {
            Timing::AllDay { date } => Some(*date),
            Timing::Timed { .. } => None,
        },
        attendees: attendee_names.to_vec(),
        description,
        reminders: default_reminders(appt.category),
    }
}
