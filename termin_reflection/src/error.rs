//! Errors surfaced at the boundary of this crate.

use std::io;

use termin_core::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("a reflection cycle is already running (lock held, reclaimed after ttl)")]
    LockHeld,

    #[error("lock file I/O error: {0}")]
    LockIo(#[from] io::Error),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("no reflection provider configured")]
    NoProvider,

    #[error("reflection provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("could not parse reflection response as the expected schema: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("person store error: {0}")]
    Person(#[from] termin_person::PersonError),
}
