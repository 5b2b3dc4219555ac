//! Test doubles shared by the unit tests in this crate.

use std::{collections::VecDeque, sync::Arc, time::Duration};

use bytes::Bytes;
use checkin_core::{
  BackendError,
  backend::WellnessBackend,
  checkin::{Artifact, SubmissionOutcome, SubmissionRequest},
  identity::{Identity, OnboardingProfile},
};
use parking_lot::Mutex;

pub fn identity() -> Identity {
  Identity {
    token:        "tok-1".into(),
    employee_id:  "emp-1".into(),
    display_name: "Ada".into(),
  }
}

pub fn artifact(bytes: &'static [u8]) -> Artifact {
  Artifact {
    capture_id:   uuid::Uuid::new_v4(),
    bytes:        Bytes::from_static(bytes),
    content_type: "audio/webm".into(),
    started_at:   chrono::Utc::now(),
    duration:     Duration::from_secs(4),
  }
}

pub fn ok_outcome() -> SubmissionOutcome {
  let mut summary = serde_json::Map::new();
  summary.insert("message".into(), "Check-in recorded".into());
  SubmissionOutcome { success: true, summary }
}

/// Everything the backend was asked to do.
#[derive(Debug, Default)]
pub struct Calls {
  pub logins:      Vec<String>,
  pub onboardings: Vec<OnboardingProfile>,
  /// `(bearer token, request)` per submission.
  pub submissions: Vec<(String, SubmissionRequest)>,
}

/// A backend that answers from a script. Unscripted submissions succeed.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
  pub calls:      Arc<Mutex<Calls>>,
  login:          Arc<Mutex<Option<Result<Identity, BackendError>>>>,
  submit_replies: Arc<Mutex<VecDeque<Result<SubmissionOutcome, BackendError>>>>,
}

impl ScriptedBackend {
  pub fn fail_login(&self, error: BackendError) {
    *self.login.lock() = Some(Err(error));
  }

  pub fn reply_to_next_submit(&self, reply: Result<SubmissionOutcome, BackendError>) {
    self.submit_replies.lock().push_back(reply);
  }

  pub fn submission_count(&self) -> usize { self.calls.lock().submissions.len() }
}

impl WellnessBackend for ScriptedBackend {
  async fn login(&self, email: &str) -> Result<Identity, BackendError> {
    self.calls.lock().logins.push(email.to_owned());
    self.login.lock().clone().unwrap_or_else(|| Ok(identity()))
  }

  async fn onboard(&self, profile: &OnboardingProfile) -> Result<Identity, BackendError> {
    self.calls.lock().onboardings.push(profile.clone());
    Ok(Identity {
      token:        "tok-new".into(),
      employee_id:  "emp-new".into(),
      display_name: profile.name.clone(),
    })
  }

  async fn submit_voice_session(
    &self,
    token: &str,
    request: &SubmissionRequest,
  ) -> Result<SubmissionOutcome, BackendError> {
    self
      .calls
      .lock()
      .submissions
      .push((token.to_owned(), request.clone()));
    self
      .submit_replies
      .lock()
      .pop_front()
      .unwrap_or_else(|| Ok(ok_outcome()))
  }
}
