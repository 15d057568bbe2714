//! Errors `ContextAssembler` can surface. Per-step failures (recall
//! timeout, a slow feedback query) are swallowed and logged inside
//! `assemble` itself — this type only covers failures that
//! make the whole context unusable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("invalid configured timezone {0:?}")]
    InvalidTimezone(String),

    #[error(transparent)]
    Store(#[from] termin_store::StoreError),
}
