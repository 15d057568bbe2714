use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("malformed JSON column: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] termin_store::StoreError),

    #[error(transparent)]
    Person(#[from] termin_person::PersonError),

    #[error("unknown feedback action value {0:?}")]
    UnknownAction(String),
}
