#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

//! `ReflectionAgent`: a periodic, file-lock-guarded,
//! globally-singleton pass over the last day's chat activity that proposes
//! person-profile updates through a high-capability model.

pub mod agent;
pub mod error;
pub mod lock;
pub mod query;
pub mod schema;

pub use agent::{ReflectionAgent, ReflectionOutcome};
pub use error::ReflectionError;
