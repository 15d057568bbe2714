//! Read-side window assembly for the cascade prompt.
//!
//! Both methods are pure reads against tables this crate does not own
//! (`messages`) or only partially owns (`appointments` is read here and
//! written by [`crate::AppointmentStore`]).

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect};
use termin_core::{Appointment, Message};
use termin_entities::{appointments, messages};

use crate::convert::appointment_from_model;
use crate::convert::message_from_model;
use crate::error::StoreError;

pub struct ConversationWindow<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ConversationWindow<'a> {
    #[must_use]
    pub const fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// The last `limit` messages in `chat_id`, oldest first.
    pub async fn recent_messages(
        &self,
        chat_id: &str,
        limit: u64,
    ) -> Result<Vec<Message>, StoreError> {
        let mut rows = messages::Entity::find()
            .filter(messages::Column::ChatId.eq(chat_id))
            .order_by(messages::Column::Timestamp, Order::Desc)
            .limit(limit)
            .all(self.db)
            .await?;
        rows.reverse();
        Ok(rows.into_iter().map(message_from_model).collect())
    }

    /// Existing, non-terminal appointments in `chat_id` whose timing falls
    /// within `[now - 7d, now + (window_days - 7d)]`, so the total span is
    /// exactly `window_days`, capped at `max_existing`.
    pub async fn existing_appointments(
        &self,
        chat_id: &str,
        now: DateTime<Utc>,
        window_days: i64,
        max_existing: u64,
    ) -> Result<Vec<Appointment>, StoreError> {
        let lower = (now - Duration::days(7)).naive_utc();
        let upper = (now + Duration::days(window_days - 7)).naive_utc();

        let rows = appointments::Entity::find()
            .filter(appointments::Column::ChatId.eq(chat_id))
            .filter(
                appointments::Column::Datetime
                    .gte(lower)
                    .and(appointments::Column::Datetime.lte(upper))
                    .or(appointments::Column::Date
                        .gte(lower.date())
                        .and(appointments::Column::Date.lte(upper.date()))),
            )
            .order_by(appointments::Column::UpdatedAt, Order::Desc)
            .limit(max_existing)
            .all(self.db)
            .await?;

        rows.into_iter().map(appointment_from_model).collect()
    }
}
