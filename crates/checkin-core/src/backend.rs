//! The `WellnessBackend` trait — the remote service the client talks to.
//!
//! The client never looks inside the service. It authenticates, hands over
//! check-ins, and relays whatever summary comes back.

use std::future::Future;

use crate::{
  BackendError,
  checkin::{SubmissionOutcome, SubmissionRequest},
  identity::{Identity, OnboardingProfile},
};

pub trait WellnessBackend: Send + Sync {
  /// `POST /employee/login` — exchange an email address for an identity.
  fn login<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Identity, BackendError>> + Send + 'a;

  /// `POST /employee/onboard` — create an account. The returned identity's
  /// display name is the profile's `name`.
  fn onboard<'a>(
    &'a self,
    profile: &'a OnboardingProfile,
  ) -> impl Future<Output = Result<Identity, BackendError>> + Send + 'a;

  /// `POST /employee/voice-session` — exactly one attempt, authorised with
  /// `token` as a bearer credential. Implementations must not retry.
  fn submit_voice_session<'a>(
    &'a self,
    token: &'a str,
    request: &'a SubmissionRequest,
  ) -> impl Future<Output = Result<SubmissionOutcome, BackendError>> + Send + 'a;
}
