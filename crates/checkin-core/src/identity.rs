//! Identity — the authenticated employee — and the onboarding profile that
//! creates one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The authenticated employee. Created on login or onboarding success,
/// destroyed on logout; the only state that survives a restart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Opaque bearer token issued by the backend.
  pub token:        String,
  pub employee_id:  String,
  pub display_name: String,
}

impl Identity {
  /// `true` when every field is non-empty. A partially populated identity is
  /// never treated as a session.
  pub fn is_complete(&self) -> bool {
    !self.token.is_empty()
      && !self.employee_id.is_empty()
      && !self.display_name.is_empty()
  }
}

// The token is a credential; keep it out of logs.
impl fmt::Debug for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Identity")
      .field("token", &"<redacted>")
      .field("employee_id", &self.employee_id)
      .field("display_name", &self.display_name)
      .finish()
  }
}

// ─── Onboarding ──────────────────────────────────────────────────────────────

/// Everything a new employee fills in before their first check-in.
///
/// Serialises to the body of `POST /employee/onboard`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProfile {
  pub name:                String,
  pub email:               String,
  pub department:          String,
  pub role:                String,
  pub github:              Option<String>,
  pub linkedin:            Option<String>,
  pub cultural_background: Option<String>,
  #[serde(default = "default_language")]
  pub preferred_language:  String,
}

fn default_language() -> String { "en".to_string() }

impl OnboardingProfile {
  /// A profile with only the required fields set.
  pub fn new(
    name: impl Into<String>,
    email: impl Into<String>,
    department: impl Into<String>,
    role: impl Into<String>,
  ) -> Self {
    Self {
      name:                name.into(),
      email:               email.into(),
      department:          department.into(),
      role:                role.into(),
      github:              None,
      linkedin:            None,
      cultural_background: None,
      preferred_language:  default_language(),
    }
  }

  /// Check that every required field has content.
  pub fn validate(&self) -> Result<()> {
    let required = [
      ("name", &self.name),
      ("email", &self.email),
      ("department", &self.department),
      ("role", &self.role),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(Error::MissingField(field));
      }
    }
    Ok(())
  }
}
