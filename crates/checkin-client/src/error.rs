//! Error type for `checkin-client`.

use thiserror::Error;

/// Failure to set the client up. Request failures are reported as
/// [`checkin_core::BackendError`] instead.
#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[from] reqwest::Error),

  #[error("invalid base URL {0:?}")]
  BaseUrl(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
