//! Access-token verification and the current-owner extractor.
//!
//! The real identity provider is external. [`TokenKeys`] is a stand-in that
//! issues and verifies `base64url(claims).hex(hmac-sha256)` tokens with a
//! shared secret, which is enough for local deployments and tests.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use quill_core::{Owner, RemoteNoteStore, Session};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::{AppState, cookie, error::ApiError};

type HmacSha256 = Hmac<Sha256>;

/// What a verified access token asserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  /// Expiry as a unix timestamp (seconds).
  pub exp: i64,
}

/// Signing keys for access tokens.
#[derive(Clone)]
pub struct TokenKeys {
  secret: Vec<u8>,
}

impl TokenKeys {
  pub fn new(secret: impl AsRef<[u8]>) -> Self {
    Self { secret: secret.as_ref().to_vec() }
  }

  fn mac(&self, payload: &str) -> Result<HmacSha256, ApiError> {
    let mut mac = HmacSha256::new_from_slice(&self.secret)
      .map_err(|e| ApiError::Store(format!("hmac key: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(mac)
  }

  /// Issue a fresh session for `user_id`, valid for `ttl`.
  pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<Session, ApiError> {
    let expires_at = Utc::now() + ttl;
    let claims = Claims { sub: user_id, exp: expires_at.timestamp() };
    let payload = B64.encode(
      serde_json::to_vec(&claims).map_err(|e| ApiError::Store(e.to_string()))?,
    );
    let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());

    let mut refresh = [0u8; 32];
    OsRng.fill_bytes(&mut refresh);

    Ok(Session {
      access_token: format!("{payload}.{signature}"),
      refresh_token: hex::encode(refresh),
      user_id,
      expires_at,
    })
  }

  /// Verify signature and expiry of an access token.
  pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, ApiError> {
    let (payload, signature) = token.split_once('.').ok_or(ApiError::Unauthorized)?;
    let signature = hex::decode(signature).map_err(|_| ApiError::Unauthorized)?;

    self
      .mac(payload)?
      .verify_slice(&signature)
      .map_err(|_| ApiError::Unauthorized)?;

    let raw = B64.decode(payload).map_err(|_| ApiError::Unauthorized)?;
    let claims: Claims = serde_json::from_slice(&raw).map_err(|_| ApiError::Unauthorized)?;

    if claims.exp <= now.timestamp() {
      return Err(ApiError::Unauthorized);
    }
    Ok(claims)
  }
}

/// Pull an access token from `Authorization: Bearer …` or the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "));
  bearer.or_else(|| cookie::read(headers, cookie::SESSION_COOKIE))
}

/// Present in a handler means the request carried a valid session.
pub struct CurrentOwner(pub Owner);

impl<S> FromRequestParts<AppState<S>> for CurrentOwner
where
  S: RemoteNoteStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = token_from_headers(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let claims = state.keys.verify(token, Utc::now())?;
    Ok(CurrentOwner(Owner::verified(claims.sub)))
  }
}
