//! Error types for `checkin-core`.

use thiserror::Error;

use crate::view::View;

#[derive(Debug, Error)]
pub enum Error {
  #[error("mood rating must be between 1 and 5, got {0}")]
  InvalidMood(u8),

  #[error("required field is empty: {0}")]
  MissingField(&'static str),

  #[error("audio artifact is empty")]
  EmptyArtifact,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure reported by a [`crate::backend::WellnessBackend`].
///
/// The backend only distinguishes "could not reach / could not trust the
/// answer" from "the server said no".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  #[error("network error: {0}")]
  Network(String),

  #[error("rejected: {0}")]
  Rejected(String),

  /// The server answered but the body could not be understood.
  #[error("unreadable response: {0}")]
  Decode(String),
}

/// A refused [`crate::view::ViewStateMachine`] transition. The view is left
/// unchanged whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
  #[error("`{event}` is not valid from the {from} view")]
  InvalidTransition { from: View, event: &'static str },

  #[error("`{event}` requires {guard}")]
  GuardFailed {
    event: &'static str,
    guard: &'static str,
  },
}
