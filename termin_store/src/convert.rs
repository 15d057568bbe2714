//! Translate between `termin_entities` `sea_orm` models and `termin_core`
//! domain types, kept as its own boundary module next to the store.

use std::collections::BTreeSet;

use termin_core::{Appointment, Category, Message, Relevance, AppointmentStatus, TimingRepr};
use termin_entities::appointments;
use termin_entities::messages;

use crate::error::StoreError;

pub fn category_to_str(c: Category) -> &'static str {
    match c {
        Category::Appointment => "appointment",
        Category::Task => "task",
        Category::Milestone => "milestone",
        Category::Reminder => "reminder",
    }
}

pub fn category_from_str(s: &str) -> Result<Category, StoreError> {
    Ok(match s {
        "appointment" => Category::Appointment,
        "task" => Category::Task,
        "milestone" => Category::Milestone,
        "reminder" => Category::Reminder,
        other => {
            return Err(StoreError::UnknownCategory {
                value: other.to_string(),
            })
        }
    })
}

pub fn relevance_to_str(r: Relevance) -> &'static str {
    match r {
        Relevance::ForMe => "for_me",
        Relevance::Shared => "shared",
        Relevance::PartnerOnly => "partner_only",
        Relevance::AffectsMe => "affects_me",
    }
}

pub fn relevance_from_str(s: &str) -> Result<Relevance, StoreError> {
    Ok(match s {
        "for_me" => Relevance::ForMe,
        "shared" => Relevance::Shared,
        "partner_only" => Relevance::PartnerOnly,
        "affects_me" => Relevance::AffectsMe,
        other => {
            return Err(StoreError::UnknownRelevance {
                value: other.to_string(),
            })
        }
    })
}

pub fn status_to_str(s: AppointmentStatus) -> &'static str {
    match s {
        AppointmentStatus::Auto => "auto",
        AppointmentStatus::Suggested => "suggested",
        AppointmentStatus::Confirmed => "confirmed",
        AppointmentStatus::Rejected => "rejected",
        AppointmentStatus::Cancelled => "cancelled",
        AppointmentStatus::Skipped => "skipped",
    }
}

pub fn status_from_str(s: &str) -> Result<AppointmentStatus, StoreError> {
    Ok(match s {
        "auto" => AppointmentStatus::Auto,
        "suggested" => AppointmentStatus::Suggested,
        "confirmed" => AppointmentStatus::Confirmed,
        "rejected" => AppointmentStatus::Rejected,
        "cancelled" => AppointmentStatus::Cancelled,
        "skipped" => AppointmentStatus::Skipped,
        other => {
            return Err(StoreError::UnknownStatus {
                value: other.to_string(),
            })
        }
    })
}

pub fn appointment_from_model(model: appointments::Model) -> Result<Appointment, StoreError> {
    let participants: BTreeSet<String> = serde_json::from_value(model.participants)?;
    let source_message_ids: BTreeSet<String> = serde_json::from_value(model.source_message_ids)?;

    Ok(Appointment {
        id: model.id,
        chat_id: model.chat_id,
        title: model.title,
        timing_repr: TimingRepr {
            datetime: model.datetime,
            date: model.date,
            all_day: model.all_day,
            end_datetime: model.end_datetime,
        },
        participants,
        category: category_from_str(&model.category)?,
        relevance: relevance_from_str(&model.relevance)?,
        status: status_from_str(&model.status)?,
        confidence: model.confidence,
        source_message_ids,
        calendar_uid: model.calendar_uid,
        reasoning: model.reasoning,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Build an `ActiveModel` ready for `insert`/`update`. `pending_sync` is left
/// to the caller (default `false` on insert, explicit on sync-failure paths).
pub fn appointment_to_active_model(
    appt: &Appointment,
    pending_sync: bool,
) -> Result<appointments::ActiveModel, StoreError> {
    use sea_orm::ActiveValue::Set;

    let timing = appt.timing_repr.clone();
    Ok(appointments::ActiveModel {
        id: Set(appt.id.clone()),
        chat_id: Set(appt.chat_id.clone()),
        title: Set(appt.title.clone()),
        datetime: Set(timing.datetime),
        date: Set(timing.date),
        all_day: Set(timing.all_day),
        end_datetime: Set(timing.end_datetime),
        participants: Set(serde_json::to_value(&appt.participants)?),
        category: Set(category_to_str(appt.category).to_string()),
        relevance: Set(relevance_to_str(appt.relevance).to_string()),
        status: Set(status_to_str(appt.status).to_string()),
        confidence: Set(appt.confidence),
        source_message_ids: Set(serde_json::to_value(&appt.source_message_ids)?),
        calendar_uid: Set(appt.calendar_uid.clone()),
        reasoning: Set(appt.reasoning.clone()),
        pending_sync: Set(pending_sync),
        created_at: Set(appt.created_at),
        updated_at: Set(appt.updated_at),
    })
}

pub fn message_from_model(model: messages::Model) -> Message {
    Message {
        message_id: model.message_id,
        chat_id: model.chat_id,
        sender: model.sender,
        text: model.text,
        timestamp: model.timestamp,
        reply_to: model.reply_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_round_trips() {
        for c in [
            Category::Appointment,
            Category::Task,
            Category::Milestone,
            Category::Reminder,
        ] {
            assert_eq!(category_from_str(category_to_str(c)).unwrap(), c);
        }
    }

    #[test]
    fn status_round_trips() {
        for s in [
            AppointmentStatus::Auto,
            AppointmentStatus::Suggested,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Rejected,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Skipped,
        ] {
            assert_eq!(status_from_str(status_to_str(s)).unwrap(), s);
        }
    }

    #[test]
    fn unknown_category_errors() {
        assert!(category_from_str("bogus").is_err());
    }
}
