//! `FeedbackAction` <-> string, and model <-> domain conversion for the
//! `feedback` table this crate owns.

use termin_core::{FeedbackAction, FeedbackRecord};
use termin_entities::feedback;

use crate::error::FeedbackError;

#[must_use]
pub fn action_to_str(action: FeedbackAction) -> &'static str {
    match action {
        FeedbackAction::Confirmed => "confirmed",
        FeedbackAction::Rejected => "rejected",
        FeedbackAction::Edited => "edited",
        FeedbackAction::Skipped => "skipped",
    }
}

pub fn action_from_str(s: &str) -> Result<FeedbackAction, FeedbackError> {
    Ok(match s {
        "confirmed" => FeedbackAction::Confirmed,
        "rejected" => FeedbackAction::Rejected,
        "edited" => FeedbackAction::Edited,
        "skipped" => FeedbackAction::Skipped,
        other => return Err(FeedbackError::UnknownAction(other.to_string())),
    })
}

pub fn record_from_model(model: feedback::Model) -> Result<FeedbackRecord, FeedbackError> {
    Ok(FeedbackRecord {
        id: model.id,
        appointment_id: model.appointment_id,
        action: action_from_str(&model.action)?,
        correction: model.correction,
        reason: model.reason,
        created_at: model.created_at,
    })
}

pub fn record_to_active_model(
    record: &FeedbackRecord,
    chat_id: &str,
) -> feedback::ActiveModel {
    use sea_orm::ActiveValue::Set;

    feedback::ActiveModel {
        id: Set(record.id.clone()),
        appointment_id: Set(record.appointment_id.clone()),
        chat_id: Set(chat_id.to_string()),
        action: Set(action_to_str(record.action).to_string()),
        correction: Set(record.correction.clone()),
        reason: Set(record.reason.clone()),
        created_at: Set(record.created_at),
    }
}
