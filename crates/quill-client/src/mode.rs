//! The note façade's authentication mode and its transition table.
//!
//! | From             | Event                        | To                 |
//! |------------------|------------------------------|--------------------|
//! | `Guest`          | `SignInReceived`             | `Transitioning`    |
//! | `Transitioning`  | `MigrationSucceeded`         | `Authenticated`    |
//! | `Transitioning`  | `MigrationFailed`            | `Guest`            |
//! | `Authenticated`  | `SignedOut`                  | `Guest`            |
//! | `Authenticated`  | `SessionRefreshed` (same id) | `Authenticated`    |
//!
//! Every other pair leaves the mode unchanged. `SignedOut` from `Guest` or
//! `Transitioning` lands in `Guest`.

use quill_core::Session;
use serde::Serialize;

/// Which tier the façade routes to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
  /// Notes live in the local store.
  #[default]
  Guest,
  /// A sign-in is being processed; guest notes are moving to the account.
  Transitioning(Session),
  /// Notes live in the remote store under the session's user.
  Authenticated(Session),
}

/// Payload-free view of [`Mode`] for observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
  Guest,
  Transitioning,
  Authenticated,
}

/// Inputs to the transition table.
#[derive(Debug, Clone)]
pub enum ModeEvent {
  SignInReceived(Session),
  MigrationSucceeded,
  MigrationFailed,
  SignedOut,
  SessionRefreshed(Session),
}

impl Mode {
  pub fn kind(&self) -> ModeKind {
    match self {
      Self::Guest => ModeKind::Guest,
      Self::Transitioning(_) => ModeKind::Transitioning,
      Self::Authenticated(_) => ModeKind::Authenticated,
    }
  }

  pub fn session(&self) -> Option<&Session> {
    match self {
      Self::Guest => None,
      Self::Transitioning(s) | Self::Authenticated(s) => Some(s),
    }
  }

  /// Apply `event`, returning the next mode.
  pub fn next(self, event: ModeEvent) -> Mode {
    match (self, event) {
      (Self::Guest, ModeEvent::SignInReceived(s)) => Self::Transitioning(s),
      (Self::Transitioning(s), ModeEvent::MigrationSucceeded) => Self::Authenticated(s),
      (Self::Transitioning(_), ModeEvent::MigrationFailed) => Self::Guest,
      (_, ModeEvent::SignedOut) => Self::Guest,
      (Self::Authenticated(old), ModeEvent::SessionRefreshed(new)) => {
        if old.identity() == new.identity() {
          Self::Authenticated(new)
        } else {
          tracing::warn!(
            held = %old.user_id,
            refreshed = %new.user_id,
            "ignoring refresh for a different user"
          );
          Self::Authenticated(old)
        }
      }
      (mode, event) => {
        tracing::debug!(?event, mode = ?mode.kind(), "no transition");
        mode
      }
    }
  }
}
