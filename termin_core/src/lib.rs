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

//! Shared domain types and trait seams for the appointment extraction core.
//!
//! Other crates in this workspace depend on `termin_core` for the data
//! model and the points of polymorphism the pipeline is built
//! around: `LlmProvider` (the cascade), `CalendarClient` (the calendar
//! sink), and `MemoryBackend` (the semantic-memory client).

pub mod appointment;
pub mod calendar;
pub mod feedback;
pub mod memory_backend;
pub mod message;
pub mod person;
pub mod prompt;
pub mod provider;
pub mod util;

pub use appointment::{
    ActionKind, Appointment, AppointmentAction, AppointmentStatus, CascadeResponse, Category,
    Relevance, Timing, TimingRepr,
};
pub use calendar::{CalendarClient, CalendarError, CalendarEventDraft, CalendarName};
pub use feedback::{FeedbackAction, FeedbackRecord};
pub use memory_backend::{MemoryBackend, MemoryHealth};
pub use message::Message;
pub use person::{Activity, Person, UncertainRing, UNCERTAIN_CAPACITY};
pub use prompt::{FeedbackExample, MemoryContext, PersonProfileFragment, PromptContext};
pub use provider::{CascadePrompt, LlmProvider, ProviderError};
