//! Session cookie endpoints.
//!
//! The client observes authentication events the server cannot see and
//! mirrors them here so server-rendered views know who is signed in.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/callback` | Body: `{"event":"SIGNED_IN","session":{...}}` |
//! | `POST` | `/auth/logout`   | Clears the cookie and redirects to `/` |
//! | `GET`  | `/auth/session`  | Session view derived from the cookie alone |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::Utc;
use quill_core::{AuthEventKind, RemoteNoteStore, Session, SessionView};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, cookie, error::ApiError};

// ─── Callback ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackBody {
  #[serde(default)]
  pub event:   String,
  #[serde(default)]
  pub session: Option<Session>,
}

/// `POST /auth/callback`: set, refresh or clear the session cookie.
pub async fn callback<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CallbackBody>,
) -> Result<Response, ApiError>
where
  S: RemoteNoteStore + 'static,
{
  let secure = state.config.cookie_secure;
  let mut res = Json(json!({ "ok": true })).into_response();

  match (body.event.parse::<AuthEventKind>().ok(), body.session) {
    (Some(AuthEventKind::SignedOut), _) => {
      res
        .headers_mut()
        .insert(header::SET_COOKIE, cookie::clear_session(secure));
      tracing::info!("session cookie cleared");
    }
    (Some(kind), Some(session)) => {
      let now = Utc::now();
      let claims = state.keys.verify(&session.access_token, now)?;
      if claims.sub != session.user_id {
        tracing::warn!(%kind, "session user does not match its token");
        return Err(ApiError::Unauthorized);
      }
      let value = cookie::set_session(
        &session.access_token,
        claims.exp - now.timestamp(),
        secure,
      )
      .ok_or_else(|| ApiError::BadRequest("access token is not a valid cookie value".into()))?;
      res.headers_mut().insert(header::SET_COOKIE, value);
      tracing::info!(%kind, user = %session.user_id, "session cookie persisted");
    }
    (kind, None) => {
      tracing::debug!(event = %body.event, known = kind.is_some(), "no session to persist");
    }
    (None, Some(_)) => {
      tracing::debug!(event = %body.event, "ignoring unknown auth event");
    }
  }

  Ok(res)
}

// ─── Logout ───────────────────────────────────────────────────────────────────

/// `POST /auth/logout`: server-side sign-out for plain form posts.
pub async fn logout<S>(State(state): State<AppState<S>>) -> Response
where
  S: RemoteNoteStore + 'static,
{
  (
    StatusCode::SEE_OTHER,
    [
      (header::SET_COOKIE, cookie::clear_session(state.config.cookie_secure)),
      (header::LOCATION, header::HeaderValue::from_static("/")),
    ],
  )
    .into_response()
}

// ─── View ─────────────────────────────────────────────────────────────────────

/// `GET /auth/session`: what a server-rendered page would show.
pub async fn view<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Json<SessionView>
where
  S: RemoteNoteStore + 'static,
{
  let view = cookie::read(&headers, cookie::SESSION_COOKIE)
    .and_then(|token| state.keys.verify(token, Utc::now()).ok())
    .map(|claims| SessionView::signed_in(claims.sub))
    .unwrap_or_else(SessionView::signed_out);
  Json(view)
}
