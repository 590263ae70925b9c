//! Sessions and authentication events.
//!
//! Both are produced by an external authentication subsystem; Quill only
//! reacts to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The credential bundle representing an authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub access_token:  String,
  pub refresh_token: String,
  pub user_id:       Uuid,
  pub expires_at:    DateTime<Utc>,
}

impl Session {
  /// Stable identity of the session across token refreshes; used as the
  /// migration idempotency key.
  pub fn identity(&self) -> Uuid { self.user_id }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// Kinds of authentication state change.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
  SignedIn,
  SignedUp,
  SignedOut,
  TokenRefreshed,
  UserUpdated,
  InitialSession,
}

impl AuthEventKind {
  /// Events that start a sign-in transition when they carry a session. The
  /// other session-carrying kinds only replace the held session.
  pub fn is_sign_in(self) -> bool {
    matches!(self, Self::SignedIn | Self::SignedUp | Self::InitialSession)
  }
}

/// A discrete notification that the authentication state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
  pub kind:    AuthEventKind,
  pub session: Option<Session>,
}

impl AuthEvent {
  pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
    Self { kind, session }
  }

  pub fn signed_in(session: Session) -> Self {
    Self::new(AuthEventKind::SignedIn, Some(session))
  }

  pub fn signed_out() -> Self { Self::new(AuthEventKind::SignedOut, None) }
}

// ─── Server-rendered view ────────────────────────────────────────────────────

/// Which session control a rendered page should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
  Login,
  Logout,
}

/// What the server can see of the session, derived from its cookie alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
  pub signed_in:  bool,
  pub user_id:    Option<Uuid>,
  pub affordance: Affordance,
}

impl SessionView {
  pub fn signed_in(user_id: Uuid) -> Self {
    Self { signed_in: true, user_id: Some(user_id), affordance: Affordance::Logout }
  }

  pub fn signed_out() -> Self {
    Self { signed_in: false, user_id: None, affordance: Affordance::Login }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_uses_screaming_snake_case() {
    assert_eq!(AuthEventKind::TokenRefreshed.to_string(), "TOKEN_REFRESHED");
    assert_eq!(
      "INITIAL_SESSION".parse::<AuthEventKind>().unwrap(),
      AuthEventKind::InitialSession
    );
    assert_eq!(
      serde_json::to_value(AuthEventKind::SignedUp).unwrap(),
      "SIGNED_UP"
    );
    assert!("SIGNED_SIDEWAYS".parse::<AuthEventKind>().is_err());
  }

  #[test]
  fn sign_in_kinds() {
    assert!(AuthEventKind::SignedIn.is_sign_in());
    assert!(AuthEventKind::InitialSession.is_sign_in());
    assert!(!AuthEventKind::TokenRefreshed.is_sign_in());
    assert!(!AuthEventKind::UserUpdated.is_sign_in());
  }
}
