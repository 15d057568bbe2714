#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

//! `sea_orm` entity models for the three tables the core owns or reads:
//! `messages` (read-only), `appointments`, `feedback`.

pub mod appointments;
pub mod feedback;
pub mod messages;

pub use appointments::Entity as AppointmentEntity;
pub use feedback::Entity as FeedbackEntity;
pub use messages::Entity as MessageEntity;
