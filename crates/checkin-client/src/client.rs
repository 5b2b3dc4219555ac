//! [`HttpBackend`] — the wellness REST API over reqwest.

use std::time::Duration;

use checkin_core::{
  BackendError,
  backend::WellnessBackend,
  checkin::{SubmissionOutcome, SubmissionRequest},
  identity::{Identity, OnboardingProfile},
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use crate::{Error, Result};

/// Connection settings for the wellness API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  /// e.g. `http://127.0.0.1:8000`; paths are appended to it.
  pub base_url: String,
  pub timeout:  Duration,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      base_url: "http://127.0.0.1:8000".to_string(),
      timeout:  Duration::from_secs(30),
    }
  }
}

/// Async HTTP client for the wellness JSON API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpBackend {
  client: Client,
  config: ClientConfig,
}

impl HttpBackend {
  pub fn new(config: ClientConfig) -> Result<Self> {
    if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://"))
    {
      return Err(Error::BaseUrl(config.base_url));
    }
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// POST `body` as JSON and return the response body once it is known to
  /// be an acknowledged success. Sends exactly one request.
  async fn post<B, R>(&self, path: &str, body: &B, token: Option<&str>) -> Result<R, BackendError>
  where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
  {
    let mut req = self.client.post(self.url(path)).json(body);
    if let Some(token) = token {
      req = req.bearer_auth(token);
    }

    let resp = req
      .send()
      .await
      .map_err(|e| BackendError::Network(format!("POST {path}: {e}")))?;
    let status = resp.status();
    debug!(path, %status, "backend responded");

    let text = resp
      .text()
      .await
      .map_err(|e| BackendError::Network(format!("reading {path} response: {e}")))?;
    let parsed = serde_json::from_str::<Value>(&text);

    if !status.is_success() {
      let reason = parsed
        .as_ref()
        .ok()
        .and_then(failure_reason)
        .unwrap_or_else(|| status_line(status));
      return Err(if status.is_server_error() {
        BackendError::Network(format!("server error ({}): {reason}", status.as_u16()))
      } else {
        BackendError::Rejected(reason)
      });
    }

    let value = parsed.map_err(|e| BackendError::Decode(format!("{path}: {e}")))?;
    if value.get("success").and_then(Value::as_bool) != Some(true) {
      let reason = failure_reason(&value)
        .unwrap_or_else(|| "the server did not confirm success".to_string());
      return Err(BackendError::Rejected(reason));
    }
    serde_json::from_value(value).map_err(|e| BackendError::Decode(format!("{path}: {e}")))
  }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct LoginBody<'a> {
  email: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
  token:       String,
  #[serde(rename = "employeeId", alias = "employee_id")]
  employee_id: String,
  name:        String,
}

#[derive(Deserialize)]
struct OnboardResponse {
  token:       String,
  #[serde(rename = "employeeId", alias = "employee_id")]
  employee_id: String,
}

/// The human-readable part of a failure body. FastAPI-style servers put it
/// in `detail`; others use `message` or `error`.
fn failure_reason(body: &Value) -> Option<String> {
  ["detail", "message", "error"].iter().find_map(|key| match body.get(*key)? {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Null => None,
    Value::String(_) => None,
    other => Some(other.to_string()),
  })
}

fn status_line(status: StatusCode) -> String {
  match status.canonical_reason() {
    Some(reason) => format!("{} {reason}", status.as_u16()),
    None => status.as_u16().to_string(),
  }
}

fn require_token(token: String) -> Result<String, BackendError> {
  if token.is_empty() {
    Err(BackendError::Decode("response carried an empty token".into()))
  } else {
    Ok(token)
  }
}

// ─── WellnessBackend impl ─────────────────────────────────────────────────────

impl WellnessBackend for HttpBackend {
  /// `POST /employee/login`
  async fn login(&self, email: &str) -> Result<Identity, BackendError> {
    let resp: LoginResponse = self
      .post("/employee/login", &LoginBody { email }, None)
      .await?;
    Ok(Identity {
      token:        require_token(resp.token)?,
      employee_id:  resp.employee_id,
      display_name: resp.name,
    })
  }

  /// `POST /employee/onboard`
  async fn onboard(&self, profile: &OnboardingProfile) -> Result<Identity, BackendError> {
    let resp: OnboardResponse = self.post("/employee/onboard", profile, None).await?;
    Ok(Identity {
      token:        require_token(resp.token)?,
      employee_id:  resp.employee_id,
      display_name: profile.name.clone(),
    })
  }

  /// `POST /employee/voice-session`
  async fn submit_voice_session(
    &self,
    token: &str,
    request: &SubmissionRequest,
  ) -> Result<SubmissionOutcome, BackendError> {
    self
      .post("/employee/voice-session", request, Some(token))
      .await
  }
}
