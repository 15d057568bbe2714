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

//! Async client to the external semantic-memory service.
//!
//! The sole implementation of `termin_core::MemoryBackend`: fire-and-forget
//! `memorize`, best-effort `recall` with a hard timeout, and a cheap
//! `health` probe. Every method is built so it cannot propagate an error to
//! its caller — the contract is "tolerates unavailability", not "retries
//! until success".

mod client;
mod pool;

pub use client::{MemoryClient, MemoryClientConfig};
pub use pool::PoolStats;
