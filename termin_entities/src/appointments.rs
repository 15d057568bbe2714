//! `appointments` — owned exclusively by `termin_store::AppointmentStore`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub chat_id: String,
    pub title: String,
    pub datetime: Option<DateTime>,
    pub date: Option<Date>,
    pub all_day: bool,
    pub end_datetime: Option<DateTime>,
    /// JSON array of person keys.
    pub participants: Json,
    pub category: String,
    pub relevance: String,
    pub status: String,
    pub confidence: f64,
    /// JSON array of message ids.
    pub source_message_ids: Json,
    pub calendar_uid: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub reasoning: String,
    /// Best-effort sync flag set when a `CalendarSyncFailure` occurs;
    /// a reconciliation pass clears it later.
    #[sea_orm(default_value = "false")]
    pub pending_sync: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
