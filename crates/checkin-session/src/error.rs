//! Error types for `checkin-session`.

use checkin_capture::CaptureError;
use checkin_core::{BackendError, ViewError, view::View};
use thiserror::Error;

/// Why a check-in could not be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
  /// The request may not have arrived, or its answer was lost. The user
  /// decides whether to try again.
  #[error("could not reach the wellness service: {0}")]
  Network(String),

  #[error("the wellness service declined the check-in: {0}")]
  Rejected(String),

  #[error("no mood rating selected")]
  MissingMood,

  #[error("no audio recorded")]
  EmptyArtifact,
}

impl SubmissionError {
  pub fn is_contract_violation(&self) -> bool {
    matches!(self, Self::MissingMood | Self::EmptyArtifact)
  }
}

impl From<BackendError> for SubmissionError {
  fn from(error: BackendError) -> Self {
    match error {
      BackendError::Network(reason) => Self::Network(reason),
      BackendError::Rejected(reason) => Self::Rejected(reason),
      // The server may have stored the check-in; treat it like a lost reply.
      BackendError::Decode(reason) => Self::Network(reason),
    }
  }
}

/// Everything [`crate::CheckIn`] can report back to a front end.
#[derive(Debug, Error)]
pub enum CheckInError {
  #[error("sign-in failed: {0}")]
  Auth(BackendError),

  #[error(transparent)]
  Capture(#[from] CaptureError),

  #[error(transparent)]
  Submission(#[from] SubmissionError),

  #[error(transparent)]
  Invalid(#[from] checkin_core::Error),

  #[error(transparent)]
  View(#[from] ViewError),

  #[error("`{action}` is not available on the {view} view")]
  WrongView { view: View, action: &'static str },

  /// The front end asked for something its own guards should have
  /// prevented.
  #[error("contract violation: {0}")]
  Contract(&'static str),
}

impl CheckInError {
  /// Failures worth showing the user with a way to retry, as opposed to
  /// front-end bugs.
  pub fn is_recoverable(&self) -> bool {
    match self {
      Self::Auth(_) | Self::Invalid(_) => true,
      Self::Capture(e) => !e.is_contract_violation(),
      Self::Submission(e) => !e.is_contract_violation(),
      Self::View(_) | Self::WrongView { .. } | Self::Contract(_) => false,
    }
  }
}
