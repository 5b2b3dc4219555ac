//! [`CheckIn`] — the composition root a front end drives.

use std::sync::Arc;

use checkin_capture::{CaptureConfig, CaptureError, CaptureState, Microphone, VoiceCapture};
use checkin_core::{
  backend::WellnessBackend,
  checkin::{Artifact, MoodRating, SubmissionOutcome},
  identity::{Identity, OnboardingProfile},
  store::FactStore,
  view::{View, ViewEvent, ViewStateMachine},
};
use tracing::{debug, info, warn};

use crate::{AuthFacts, CheckInError, SubmissionPipeline};

type Result<T, E = CheckInError> = std::result::Result<T, E>;

// ─── CheckIn ──────────────────────────────────────────────────────────────────

/// One employee's check-in flow, from sign-in to a submitted session.
pub struct CheckIn<S: FactStore, B: WellnessBackend, M: Microphone> {
  auth:         AuthFacts<S>,
  backend:      Arc<B>,
  pipeline:     SubmissionPipeline<B>,
  capture:      VoiceCapture<M>,
  view:         ViewStateMachine,
  identity:     Option<Identity>,
  mood:         Option<MoodRating>,
  artifact:     Option<Artifact>,
  last_outcome: Option<SubmissionOutcome>,
}

impl<S, B, M> CheckIn<S, B, M>
where
  S: FactStore,
  B: WellnessBackend,
  M: Microphone,
{
  /// Restore any persisted sign-in and land on `Welcome` or `Login`.
  pub async fn open(store: S, backend: B, microphone: M, config: CaptureConfig) -> Self {
    let auth = AuthFacts::new(store);
    let identity = auth.restore().await;
    let view = ViewStateMachine::new(identity.as_ref());
    info!(view = %view.current(), restored = identity.is_some(), "check-in opened");

    let backend = Arc::new(backend);
    Self {
      auth,
      pipeline: SubmissionPipeline::new(backend.clone()),
      backend,
      capture: VoiceCapture::new(microphone, config),
      view,
      identity,
      mood: None,
      artifact: None,
      last_outcome: None,
    }
  }

  // ── Accessors ─────────────────────────────────────────────────────────────

  pub fn view(&self) -> View { self.view.current() }

  pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }

  pub fn mood(&self) -> Option<MoodRating> { self.mood }

  /// The artifact that would be submitted right now.
  pub fn artifact(&self) -> Option<&Artifact> { self.artifact.as_ref() }

  pub fn capture_state(&self) -> CaptureState { self.capture.state() }

  /// Direct access to the capture controller, e.g. to
  /// [`subscribe`](VoiceCapture::subscribe) to the ceiling stop.
  pub fn capture(&self) -> &VoiceCapture<M> { &self.capture }

  /// What the backend said about the last accepted check-in.
  pub fn last_outcome(&self) -> Option<&SubmissionOutcome> { self.last_outcome.as_ref() }

  // ── Authentication ────────────────────────────────────────────────────────

  /// Sign in with an email address. On failure the view stays on `Login`.
  pub async fn login(&mut self, email: &str) -> Result<()> {
    self.expect_view(View::Login, "login")?;
    let email = email.trim();
    if email.is_empty() {
      return Err(checkin_core::Error::MissingField("email").into());
    }

    let identity = self.backend.login(email).await.map_err(|e| {
      warn!(error = %e, "login failed");
      CheckInError::Auth(e)
    })?;
    self.authenticate(identity, ViewEvent::LoginSucceeded).await
  }

  pub fn show_onboarding(&mut self) -> Result<()> {
    self.transition(ViewEvent::CreateAccount)
  }

  /// Create an account. The profile is validated before anything is sent.
  pub async fn onboard(&mut self, profile: &OnboardingProfile) -> Result<()> {
    self.expect_view(View::Onboarding, "onboard")?;
    profile.validate()?;

    let identity = self.backend.onboard(profile).await.map_err(|e| {
      warn!(error = %e, "onboarding failed");
      CheckInError::Auth(e)
    })?;
    self.authenticate(identity, ViewEvent::OnboardingSucceeded).await
  }

  pub fn back_to_login(&mut self) -> Result<()> {
    self.expect_view(View::Onboarding, "back to login")?;
    self.transition(ViewEvent::Back)
  }

  /// Forget the session and return to `Login` from any signed-in view.
  pub async fn logout(&mut self) -> Result<()> {
    self.transition(ViewEvent::Logout)?;
    self.capture.reset().await;
    self.auth.clear().await;
    self.identity = None;
    self.clear_session();
    self.last_outcome = None;
    info!("signed out");
    Ok(())
  }

  async fn authenticate(&mut self, identity: Identity, event: ViewEvent) -> Result<()> {
    if !identity.is_complete() {
      return Err(CheckInError::Auth(checkin_core::BackendError::Decode(
        "the server returned an incomplete identity".into(),
      )));
    }
    self.auth.commit(&identity).await;
    self.view.apply(&event, Some(&identity))?;
    info!(employee_id = %identity.employee_id, "signed in");
    self.identity = Some(identity);
    Ok(())
  }

  // ── Session ───────────────────────────────────────────────────────────────

  /// Enter `Session` with a fresh capture and no mood selected.
  pub async fn start_session(&mut self) -> Result<()> {
    self.transition(ViewEvent::StartSession)?;
    self.capture.reset().await;
    self.clear_session();
    self.last_outcome = None;
    Ok(())
  }

  pub async fn start_recording(&mut self) -> Result<()> {
    self.expect_view(View::Session, "start recording")?;
    if self.capture.is_recording() {
      return Err(CheckInError::Contract("a recording is already running"));
    }
    self.artifact = None;
    self.capture.start().await?;
    Ok(())
  }

  /// Stop recording and keep the artifact for submission. Also picks up an
  /// artifact produced by the ceiling stop.
  pub async fn stop_recording(&mut self) -> Result<&Artifact> {
    self.expect_view(View::Session, "stop recording")?;
    match self.capture.state() {
      CaptureState::Recording | CaptureState::Stopped => {}
      _ => return Err(CaptureError::NotRecording.into()),
    }
    let artifact = self.capture.stop().await?;
    debug!(bytes = artifact.len(), "artifact ready");
    Ok(self.artifact.insert(artifact))
  }

  pub fn select_mood(&mut self, value: u8) -> Result<MoodRating> {
    self.expect_view(View::Session, "select mood")?;
    let mood = MoodRating::new(value)?;
    self.mood = Some(mood);
    Ok(mood)
  }

  /// Submit the selected mood and recorded audio, once.
  ///
  /// On success the view moves to `Complete`. On failure the view, mood and
  /// artifact are kept so the user can decide to try again.
  pub async fn submit(&mut self) -> Result<&SubmissionOutcome> {
    self.expect_view(View::Session, "submit")?;
    if self.capture.is_recording() {
      return Err(CheckInError::Contract("stop recording before submitting"));
    }
    if self.artifact.is_none() {
      self.artifact = self.capture.artifact();
    }
    if self.mood.is_none() {
      return Err(CheckInError::Contract("no mood rating selected"));
    }
    if self.artifact.as_ref().is_none_or(Artifact::is_empty) {
      return Err(CheckInError::Contract("no audio recorded"));
    }
    let Some(identity) = self.identity.as_ref() else {
      return Err(CheckInError::Contract("no signed-in identity"));
    };

    let outcome = self
      .pipeline
      .submit(identity, self.mood, self.artifact.as_ref())
      .await?;

    self
      .view
      .apply(&ViewEvent::SubmissionSucceeded(outcome.clone()), Some(identity))?;
    self.capture.reset().await;
    self.clear_session();
    Ok(self.last_outcome.insert(outcome))
  }

  /// Leave the current view for the previous one. Leaving `Session`
  /// releases the microphone and drops the unsubmitted check-in.
  pub async fn back(&mut self) -> Result<()> {
    let leaving_session = self.view() == View::Session;
    self.transition(ViewEvent::Back)?;
    if leaving_session {
      self.capture.reset().await;
      self.clear_session();
    }
    Ok(())
  }

  pub fn new_session(&mut self) -> Result<()> {
    self.transition(ViewEvent::NewSession)?;
    self.last_outcome = None;
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  fn transition(&mut self, event: ViewEvent) -> Result<()> {
    let t = self.view.apply(&event, self.identity.as_ref())?;
    debug!(from = %t.from, to = %t.to, event = event.name(), "view changed");
    Ok(())
  }

  fn expect_view(&self, view: View, action: &'static str) -> Result<()> {
    let current = self.view();
    if current == view {
      Ok(())
    } else {
      Err(CheckInError::WrongView { view: current, action })
    }
  }

  fn clear_session(&mut self) {
    self.mood = None;
    self.artifact = None;
  }
}
