//! Read-side: the last K rejected/edited feedback records for a chat,
//! rendered for the cascade prompt.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect};
use termin_core::FeedbackExample;
use termin_entities::feedback;

use crate::convert::record_from_model;
use crate::error::FeedbackError;

/// Render one feedback record as a single prompt line, including its
/// correction payload when present.
fn render(record: &termin_core::FeedbackRecord) -> String {
    let action = match record.action {
        termin_core::FeedbackAction::Confirmed => "bestätigt",
        termin_core::FeedbackAction::Rejected => "abgelehnt",
        termin_core::FeedbackAction::Edited => "korrigiert",
        termin_core::FeedbackAction::Skipped => "übersprungen",
    };
    let mut line = format!("Termin {} wurde {action}", record.appointment_id);
    if let Some(correction) = &record.correction {
        line.push_str(&format!(" — Korrektur: {correction}"));
    }
    if let Some(reason) = &record.reason {
        line.push_str(&format!(" ({reason})"));
    }
    line
}

/// Last `k` `rejected`/`edited` feedback records for `chat_id`, newest
/// first.
pub async fn recent_examples(
    db: &DatabaseConnection,
    chat_id: &str,
    k: u64,
) -> Result<Vec<FeedbackExample>, FeedbackError> {
    let rows = feedback::Entity::find()
        .filter(feedback::Column::ChatId.eq(chat_id))
        .filter(
            feedback::Column::Action
                .eq("rejected")
                .or(feedback::Column::Action.eq("edited")),
        )
        .order_by(feedback::Column::CreatedAt, Order::Desc)
        .limit(k)
        .all(db)
        .await?;

    rows.into_iter()
        .map(|model| {
            let record = record_from_model(model)?;
            let rendered = render(&record);
            Ok(FeedbackExample { record, rendered })
        })
        .collect()
}
