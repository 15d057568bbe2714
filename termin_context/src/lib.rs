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

//! `DateGate` and `ContextAssembler`: decide whether a
//! message is worth an LLM call, then assemble the `PromptContext` handed
//! to the cascade.

mod assembler;
mod calendar_lookup;
mod date_gate;
mod error;
mod profile;

pub use assembler::ContextAssembler;
pub use date_gate::passes as date_gate_passes;
pub use error::ContextError;
