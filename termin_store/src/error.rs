use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    #[error("appointment {id} not found")]
    NotFound { id: String },

    #[error("appointment {id} has an inconsistent timing representation")]
    InvalidTiming { id: String },

    #[error("unknown category value {value:?}")]
    UnknownCategory { value: String },

    #[error("unknown relevance value {value:?}")]
    UnknownRelevance { value: String },

    #[error("unknown status value {value:?}")]
    UnknownStatus { value: String },

    #[error("malformed JSON column: {0}")]
    Json(#[from] serde_json::Error),
}
