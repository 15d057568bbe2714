//! Read-side queries for one reflection cycle:
//! the last 24h of messages across every chat, last 24h of appointments,
//! and the last 7 days of feedback. Unlike `termin_store::ConversationWindow`
//! these are not scoped to a single `chat_id` — reflection looks at the
//! whole family, not one conversation.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect};
use termin_core::{Appointment, FeedbackAction, FeedbackRecord, Message};
use termin_entities::{appointments, feedback, messages};

use crate::error::ReflectionError;

/// Last `limit` messages in the last 24h, oldest first.
pub async fn recent_messages(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    limit: u64,
) -> Result<Vec<Message>, ReflectionError> {
    let since = (now - Duration::hours(24)).naive_utc();
    let mut rows = messages::Entity::find()
        .filter(messages::Column::Timestamp.gte(since))
        .order_by(messages::Column::Timestamp, Order::Desc)
        .limit(limit)
        .all(db)
        .await?;
    rows.reverse();
    Ok(rows
        .into_iter()
        .map(|model| Message {
            message_id: model.message_id,
            chat_id: model.chat_id,
            sender: model.sender,
            text: model.text,
            timestamp: model.timestamp,
            reply_to: model.reply_to,
        })
        .collect())
}

/// Appointments created or updated in the last 24h, across all chats.
pub async fn recent_appointments(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<Appointment>, ReflectionError> {
    let since = (now - Duration::hours(24)).naive_utc();
    let rows = appointments::Entity::find()
        .filter(appointments::Column::UpdatedAt.gte(since))
        .order_by(appointments::Column::UpdatedAt, Order::Desc)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|model| {
            let participants = serde_json::from_value(model.participants)?;
            let source_message_ids = serde_json::from_value(model.source_message_ids)?;
            Ok(Appointment {
                id: model.id,
                chat_id: model.chat_id,
                title: model.title,
                timing_repr: termin_core::TimingRepr {
                    datetime: model.datetime,
                    date: model.date,
                    all_day: model.all_day,
                    end_datetime: model.end_datetime,
                },
                participants,
                category: category_from_str(&model.category),
                relevance: relevance_from_str(&model.relevance),
                status: status_from_str(&model.status),
                confidence: model.confidence,
                source_message_ids,
                calendar_uid: model.calendar_uid,
                reasoning: model.reasoning,
                created_at: model.created_at,
                updated_at: model.updated_at,
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()
        .map_err(ReflectionError::Parse)
}

/// Feedback records created in the last 7 days, across all chats.
pub async fn recent_feedback(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
) -> Result<Vec<FeedbackRecord>, ReflectionError> {
    let since = (now - Duration::days(7)).naive_utc();
    let rows = feedback::Entity::find()
        .filter(feedback::Column::CreatedAt.gte(since))
        .order_by(feedback::Column::CreatedAt, Order::Desc)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|model| FeedbackRecord {
            id: model.id,
            appointment_id: model.appointment_id,
            action: action_from_str(&model.action),
            correction: model.correction,
            reason: model.reason,
            created_at: model.created_at,
        })
        .collect())
}

fn category_from_str(s: &str) -> termin_core::Category {
    match s {
        "task" => termin_core::Category::Task,
        "milestone" => termin_core::Category::Milestone,
        "reminder" => termin_core::Category::Reminder,
        _ => termin_core::Category::Appointment,
    }
}

fn status_from_str(s: &str) -> termin_core::AppointmentStatus {
    match s {
        "suggested" => termin_core::AppointmentStatus::Suggested,
        "confirmed" => termin_core::AppointmentStatus::Confirmed,
        "rejected" => termin_core::AppointmentStatus::Rejected,
        "cancelled" => termin_core::AppointmentStatus::Cancelled,
        "skipped" => termin_core::AppointmentStatus::Skipped,
        _ => termin_core::AppointmentStatus::Auto,
    }
}

fn relevance_from_str(s: &str) -> termin_core::Relevance {
    match s {
        "partner_only" => termin_core::Relevance::PartnerOnly,
        "affects_me" => termin_core::Relevance::AffectsMe,
        "shared" => termin_core::Relevance::Shared,
        _ => termin_core::Relevance::ForMe,
    }
}

fn action_from_str(s: &str) -> FeedbackAction {
    match s {
        "rejected" => FeedbackAction::Rejected,
        "edited" => FeedbackAction::Edited,
        "skipped" => FeedbackAction::Skipped,
        _ => FeedbackAction::Confirmed,
    }
}
