//! Errors surfaced at the boundary of this crate. The cascade itself never
//! raises past its own boundary on a recoverable per-message failure —
//! these variants exist for the handful of genuinely exceptional paths (a
//! misconfigured provider, an unusable prompt) that the caller (`app`)
//! should see as a startup/programming fault, not a per-message outcome.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("no providers configured for the cascade")]
    NoProviders,

    #[error("invalid IANA timezone: {0}")]
    InvalidTimezone(String),
}
