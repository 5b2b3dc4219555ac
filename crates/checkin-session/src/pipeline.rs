//! [`SubmissionPipeline`] — mood + audio in, one backend call out.
//!
//! There is no retry here. Audio is sent once per explicit user action.

use std::sync::Arc;

use checkin_core::{
  backend::WellnessBackend,
  checkin::{Artifact, MoodRating, SubmissionOutcome, SubmissionRequest},
  identity::Identity,
};
use tracing::{info, warn};

use crate::SubmissionError;

pub struct SubmissionPipeline<B: WellnessBackend> {
  backend: Arc<B>,
}

impl<B: WellnessBackend> SubmissionPipeline<B> {
  pub fn new(backend: Arc<B>) -> Self { Self { backend } }

  /// Check the preconditions and encode the request. Nothing touches the
  /// network.
  pub fn prepare(
    identity: &Identity,
    mood: Option<MoodRating>,
    artifact: Option<&Artifact>,
  ) -> Result<SubmissionRequest, SubmissionError> {
    let mood = mood.ok_or(SubmissionError::MissingMood)?;
    let artifact = artifact
      .filter(|a| !a.is_empty())
      .ok_or(SubmissionError::EmptyArtifact)?;
    SubmissionRequest::encode(identity.employee_id.as_str(), mood, artifact)
      .map_err(|_| SubmissionError::EmptyArtifact)
  }

  /// Submit one check-in. Contract violations are returned before any
  /// encoding or network work; otherwise exactly one backend call is made.
  pub async fn submit(
    &self,
    identity: &Identity,
    mood: Option<MoodRating>,
    artifact: Option<&Artifact>,
  ) -> Result<SubmissionOutcome, SubmissionError> {
    let request = Self::prepare(identity, mood, artifact)?;
    info!(
      employee_id = %identity.employee_id,
      mood = request.mood_rating().value(),
      payload_len = request.audio_data().len(),
      "submitting check-in"
    );

    let outcome = self
      .backend
      .submit_voice_session(&identity.token, &request)
      .await
      .map_err(SubmissionError::from);

    match outcome {
      Ok(outcome) if outcome.success => {
        info!(employee_id = %identity.employee_id, "check-in accepted");
        Ok(outcome)
      }
      Ok(_) => {
        warn!("backend answered without confirming the check-in");
        Err(SubmissionError::Rejected(
          "the server did not confirm success".into(),
        ))
      }
      Err(error) => {
        warn!(%error, "check-in not submitted");
        Err(error)
      }
    }
  }
}
