//! The screen sequence an employee moves through.
//!
//! ```text
//!   Login ──create account──▶ Onboarding
//!     │  ◀────────back──────────  │
//!     │ login ok                  │ onboarding ok
//!     ▼                           ▼
//!   Welcome ◀──────────────────────
//!     │ start session    ▲ back / new session
//!     ▼                  │
//!   Session ──submitted──▶ Complete
//! ```
//!
//! Logout leads from Welcome, Session or Complete back to Login. Exactly one
//! view is current at any time and [`ViewStateMachine::apply`] is its only
//! mutator.

use serde::{Deserialize, Serialize};

use crate::{ViewError, checkin::SubmissionOutcome, identity::Identity};

// ─── View ────────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum View {
  Login,
  Onboarding,
  Welcome,
  Session,
  Complete,
}

// ─── Events ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
  LoginSucceeded,
  CreateAccount,
  OnboardingSucceeded,
  StartSession,
  /// Carries the backend's acknowledgement; there is no way to reach
  /// [`View::Complete`] without one.
  SubmissionSucceeded(SubmissionOutcome),
  Back,
  Logout,
  NewSession,
}

impl ViewEvent {
  pub fn name(&self) -> &'static str {
    match self {
      Self::LoginSucceeded => "login succeeded",
      Self::CreateAccount => "create account",
      Self::OnboardingSucceeded => "onboarding succeeded",
      Self::StartSession => "start session",
      Self::SubmissionSucceeded(_) => "submission succeeded",
      Self::Back => "back",
      Self::Logout => "logout",
      Self::NewSession => "new session",
    }
  }
}

/// A completed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
  pub from: View,
  pub to:   View,
}

// ─── Machine ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ViewStateMachine {
  current: View,
}

impl ViewStateMachine {
  /// Start on `Welcome` when a session was restored, otherwise on `Login`.
  pub fn new(restored: Option<&Identity>) -> Self {
    let current = match restored {
      Some(_) => View::Welcome,
      None => View::Login,
    };
    Self { current }
  }

  pub fn current(&self) -> View { self.current }

  /// Apply `event`. `identity` is the identity as it stands *after* the
  /// event's side effects (e.g. the committed login).
  ///
  /// On error the current view is unchanged.
  pub fn apply(
    &mut self,
    event: &ViewEvent,
    identity: Option<&Identity>,
  ) -> Result<Transition, ViewError> {
    use View::*;

    let from = self.current;
    let to = match (from, event) {
      (Login, ViewEvent::LoginSucceeded) => {
        require_identity(event, identity)?;
        Welcome
      }
      (Login, ViewEvent::CreateAccount) => Onboarding,
      (Onboarding, ViewEvent::OnboardingSucceeded) => {
        require_identity(event, identity)?;
        Welcome
      }
      (Onboarding, ViewEvent::Back) => Login,
      (Welcome, ViewEvent::StartSession) => {
        require_identity(event, identity)?;
        Session
      }
      (Session, ViewEvent::SubmissionSucceeded(outcome)) => {
        if !outcome.success {
          return Err(ViewError::GuardFailed {
            event: event.name(),
            guard: "a successful submission outcome",
          });
        }
        Complete
      }
      (Session, ViewEvent::Back) => Welcome,
      (Welcome | Session | Complete, ViewEvent::Logout) => Login,
      (Complete, ViewEvent::NewSession) => Welcome,
      _ => {
        return Err(ViewError::InvalidTransition {
          from,
          event: event.name(),
        });
      }
    };

    self.current = to;
    Ok(Transition { from, to })
  }
}

fn require_identity(
  event: &ViewEvent,
  identity: Option<&Identity>,
) -> Result<(), ViewError> {
  match identity {
    Some(id) if id.is_complete() => Ok(()),
    _ => Err(ViewError::GuardFailed {
      event: event.name(),
      guard: "an authenticated identity",
    }),
  }
}
