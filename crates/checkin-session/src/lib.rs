//! The employee check-in flow: restoring a session, recording, rating,
//! submitting.
//!
//! [`CheckIn`] is the composition root. It owns the view state machine, the
//! voice capture controller, the submission pipeline and the durable auth
//! facts, and is the only thing a front end talks to.

mod app;
mod auth;
mod pipeline;

pub mod error;

pub use app::CheckIn;
pub use auth::AuthFacts;
pub use error::{CheckInError, SubmissionError};
pub use pipeline::SubmissionPipeline;

#[cfg(test)]
mod testing;
