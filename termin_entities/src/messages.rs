//! `messages` — owned by the ingest collaborator; the core
//! only reads this table.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub message_id: String,
    #[sea_orm(indexed)]
    pub chat_id: String,
    pub sender: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub timestamp: DateTimeUtc,
    pub reply_to: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
