//! Async HTTP client for the Quill server.
//!
//! [`ApiClient`] is the client-side [`RemoteNoteStore`] (bearer-token note
//! calls) and the [`SessionSink`] that forwards auth events to
//! `/auth/callback`, where the server turns them into a session cookie.

use std::time::Duration;

use quill_core::{
  AuthEvent, AuthEventKind, Error, NewNote, Note, NoteId, Owner, RemoteNoteStore, Result,
  Session, SessionView,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::bridge::SessionSink;

#[derive(Serialize)]
struct CreateBody<'a> {
  content: &'a str,
}

#[derive(Serialize)]
struct BatchBody<'a> {
  notes: &'a [NewNote],
}

#[derive(Serialize)]
struct CallbackBody<'a> {
  event:   AuthEventKind,
  session: Option<&'a Session>,
}

#[derive(Deserialize)]
struct BatchReply {
  success: bool,
  notes:   Vec<Note>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the Quill JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] and its cookie jar are
/// shared.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .cookie_store(true)
      .build()
      .map_err(transport)?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  fn authed(&self, req: RequestBuilder, owner: &Owner) -> Result<RequestBuilder> {
    let token = owner.access_token.as_deref().ok_or(Error::Unauthorized)?;
    Ok(req.bearer_auth(token))
  }

  /// `GET /auth/session`: what server-rendered pages currently see, based on
  /// the cookie this client holds.
  pub async fn session_view(&self) -> Result<SessionView> {
    let resp = self.client.get(self.url("/auth/session")).send().await.map_err(transport)?;
    check(resp, None).await?.json().await.map_err(transport)
  }
}

// ─── RemoteNoteStore impl ────────────────────────────────────────────────────

impl RemoteNoteStore for ApiClient {
  type Error = Error;

  /// `GET /api/notes`
  async fn list<'a>(&'a self, owner: &'a Owner) -> Result<Vec<Note>> {
    let req = self.authed(self.client.get(self.url("/api/notes")), owner)?;
    let resp = req.send().await.map_err(transport)?;
    check(resp, None).await?.json().await.map_err(transport)
  }

  /// `POST /api/notes`
  async fn add<'a>(&'a self, content: &'a str, owner: &'a Owner) -> Result<Note> {
    let req = self.authed(self.client.post(self.url("/api/notes")), owner)?;
    let resp = req.json(&CreateBody { content }).send().await.map_err(transport)?;
    check(resp, None).await?.json().await.map_err(transport)
  }

  /// `DELETE /api/notes/{id}`
  async fn remove<'a>(&'a self, id: NoteId, owner: &'a Owner) -> Result<()> {
    if id.is_local() {
      return Err(Error::NotFound(id));
    }
    let req = self.authed(self.client.delete(self.url(&format!("/api/notes/{id}"))), owner)?;
    let resp = req.send().await.map_err(transport)?;
    check(resp, Some(id)).await?;
    Ok(())
  }

  /// `POST /api/notes/batch-insert`
  async fn batch_insert<'a>(&'a self, notes: &'a [NewNote], owner: &'a Owner) -> Result<Vec<Note>> {
    let req = self.authed(self.client.post(self.url("/api/notes/batch-insert")), owner)?;
    let resp = req.json(&BatchBody { notes }).send().await.map_err(transport)?;
    let reply: BatchReply = check(resp, None).await?.json().await.map_err(transport)?;
    if !reply.success {
      return Err(Error::Storage("batch insert reported failure".into()));
    }
    Ok(reply.notes)
  }
}

// ─── SessionSink impl ────────────────────────────────────────────────────────

impl SessionSink for ApiClient {
  /// `POST /auth/callback`
  async fn persist<'a>(&'a self, event: &'a AuthEvent) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/auth/callback"))
      .json(&CallbackBody { event: event.kind, session: event.session.as_ref() })
      .send()
      .await
      .map_err(transport)?;
    check(resp, None).await?;
    tracing::debug!(kind = %event.kind, "auth event persisted to server");
    Ok(())
  }
}

// ─── Response mapping ────────────────────────────────────────────────────────

fn transport(e: reqwest::Error) -> Error { Error::TransientNetwork(e.to_string()) }

/// Map a non-success response onto the error taxonomy. `id` is the note a
/// `404` refers to, if any.
async fn check(resp: Response, id: Option<NoteId>) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }

  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status.to_string(),
  };

  Err(match (status, id) {
    (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => Error::Unauthorized,
    (StatusCode::NOT_FOUND, Some(id)) => Error::NotFound(id),
    (StatusCode::BAD_REQUEST, _) => Error::Validation(message),
    _ => Error::TransientNetwork(format!("{status}: {message}")),
  })
}
