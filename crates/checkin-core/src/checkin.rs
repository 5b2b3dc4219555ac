//! Check-in values — the mood rating, the captured audio artifact, and the
//! request/outcome pair exchanged with the backend.
//!
//! A check-in is built once and sent once. Nothing here is persisted.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Mood ────────────────────────────────────────────────────────────────────

/// A self-reported mood on a five-point scale.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct MoodRating(u8);

impl MoodRating {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn new(value: u8) -> Result<Self> {
    if (Self::MIN..=Self::MAX).contains(&value) {
      Ok(Self(value))
    } else {
      Err(Error::InvalidMood(value))
    }
  }

  pub fn value(self) -> u8 { self.0 }

  /// Human-readable label shown next to the rating.
  pub fn label(self) -> &'static str {
    match self.0 {
      1 => "Very Sad",
      2 => "Sad",
      3 => "Neutral",
      4 => "Happy",
      _ => "Very Happy",
    }
  }
}

impl TryFrom<u8> for MoodRating {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<MoodRating> for u8 {
  fn from(rating: MoodRating) -> Self { rating.0 }
}

// ─── Artifact ────────────────────────────────────────────────────────────────

/// A finished recording: every captured fragment, concatenated in arrival
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
  /// Correlates log lines for one capture attempt.
  pub capture_id:   Uuid,
  pub bytes:        Bytes,
  /// MIME type reported by the capture device, e.g. `audio/webm`.
  pub content_type: String,
  pub started_at:   DateTime<Utc>,
  /// Wall time between the start of capture and the stop.
  pub duration:     Duration,
}

impl Artifact {
  pub fn len(&self) -> usize { self.bytes.len() }

  pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

// ─── SubmissionRequest ───────────────────────────────────────────────────────

/// Body of `POST /employee/voice-session`.
///
/// Immutable once built; the audio is already encoded for transport.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
  employee_id: String,
  #[serde(rename = "audioData")]
  audio_data:  String,
  mood_rating: MoodRating,
}

impl SubmissionRequest {
  /// Encode `artifact` as standard padded base64 and bundle it with the
  /// rating. Refuses an empty artifact.
  pub fn encode(
    employee_id: impl Into<String>,
    mood_rating: MoodRating,
    artifact: &Artifact,
  ) -> Result<Self> {
    if artifact.is_empty() {
      return Err(Error::EmptyArtifact);
    }
    Ok(Self {
      employee_id: employee_id.into(),
      audio_data: B64.encode(&artifact.bytes),
      mood_rating,
    })
  }

  pub fn employee_id(&self) -> &str { &self.employee_id }

  pub fn mood_rating(&self) -> MoodRating { self.mood_rating }

  /// The base64 audio payload.
  pub fn audio_data(&self) -> &str { &self.audio_data }
}

// The payload can be megabytes of someone's voice; print its size only.
impl std::fmt::Debug for SubmissionRequest {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubmissionRequest")
      .field("employee_id", &self.employee_id)
      .field("mood_rating", &self.mood_rating)
      .field("audio_data_len", &self.audio_data.len())
      .finish()
  }
}

// ─── SubmissionOutcome ───────────────────────────────────────────────────────

/// The backend's acknowledgement of a submission. Everything besides
/// `success` is kept verbatim and never interpreted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
  pub success: bool,
  #[serde(flatten)]
  pub summary: serde_json::Map<String, serde_json::Value>,
}

impl SubmissionOutcome {
  /// A string field from the summary, if the backend sent one.
  pub fn summary_str(&self, key: &str) -> Option<&str> {
    self.summary.get(key).and_then(serde_json::Value::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn artifact(bytes: &'static [u8]) -> Artifact {
    Artifact {
      capture_id:   Uuid::new_v4(),
      bytes:        Bytes::from_static(bytes),
      content_type: "audio/webm".into(),
      started_at:   Utc::now(),
      duration:     Duration::from_secs(3),
    }
  }

  #[test]
  fn mood_bounds() {
    assert!(MoodRating::new(0).is_err());
    assert!(MoodRating::new(6).is_err());
    assert_eq!(MoodRating::new(1).unwrap().label(), "Very Sad");
    assert_eq!(MoodRating::new(5).unwrap().label(), "Very Happy");
  }

  #[test]
  fn mood_deserialisation_is_validated() {
    let ok: MoodRating = serde_json::from_str("4").unwrap();
    assert_eq!(ok.value(), 4);
    assert!(serde_json::from_str::<MoodRating>("9").is_err());
  }

  #[test]
  fn request_wire_shape() {
    let request = SubmissionRequest::encode(
      "emp-7",
      MoodRating::new(4).unwrap(),
      &artifact(b"hello"),
    )
    .unwrap();
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "employeeId": "emp-7",
        "audioData": "aGVsbG8=",
        "moodRating": 4,
      })
    );
  }

  #[test]
  fn request_refuses_empty_artifact() {
    let result =
      SubmissionRequest::encode("emp-7", MoodRating::new(2).unwrap(), &artifact(b""));
    assert!(matches!(result, Err(Error::EmptyArtifact)));
  }

  #[test]
  fn request_debug_hides_payload() {
    let request = SubmissionRequest::encode(
      "emp-7",
      MoodRating::new(3).unwrap(),
      &artifact(b"private words"),
    )
    .unwrap();
    let rendered = format!("{request:?}");
    assert!(!rendered.contains(request.audio_data()));
  }

  #[test]
  fn outcome_keeps_unknown_fields() {
    let outcome: SubmissionOutcome = serde_json::from_str(
      r#"{"success":true,"message":"Thanks","sentiment":0.4}"#,
    )
    .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.summary_str("message"), Some("Thanks"));
    assert_eq!(outcome.summary.get("sentiment"), Some(&serde_json::json!(0.4)));
  }
}
