//! Error type for `checkin-capture`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
  /// The user (or the OS on their behalf) refused microphone access.
  #[error("microphone permission denied")]
  PermissionDenied,

  #[error("audio device error: {0}")]
  Device(String),

  /// `start()` while a recording is already running.
  #[error("a recording is already in progress")]
  AlreadyRecording,

  /// `stop()` with nothing recorded.
  #[error("no recording to stop")]
  NotRecording,
}

impl CaptureError {
  /// Programmer errors that a front end should have prevented, as opposed
  /// to failures the user can retry.
  pub fn is_contract_violation(&self) -> bool {
    matches!(self, Self::AlreadyRecording | Self::NotRecording)
  }
}
