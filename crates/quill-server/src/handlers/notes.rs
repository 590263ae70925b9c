//! Handlers for `/api/notes` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/notes` | Notes of the current owner, oldest first |
//! | `POST`   | `/api/notes` | Body: `{"content":"..."}`; returns 201 + note |
//! | `DELETE` | `/api/notes/{id}` | 204; 403 if the note belongs to another owner |
//! | `POST`   | `/api/notes/batch-insert` | Body: `{"notes":[{"content":"..."}]}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use quill_core::{NewNote, Note, NoteId, RemoteNoteStore, note::validate_content};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentOwner, error::ApiError};

fn store_err<E: Into<quill_core::Error>>(e: E) -> ApiError { ApiError::from(e.into()) }

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/notes`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentOwner(owner): CurrentOwner,
) -> Result<Json<Vec<Note>>, ApiError>
where
  S: RemoteNoteStore + 'static,
{
  let notes = state.store.list(&owner).await.map_err(store_err)?;
  Ok(Json(notes))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub content: String,
}

/// `POST /api/notes`: body `{"content":"buy milk"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentOwner(owner): CurrentOwner,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RemoteNoteStore + 'static,
{
  validate_content(&body.content)?;
  let note = state.store.add(&body.content, &owner).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(note)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /api/notes/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  CurrentOwner(owner): CurrentOwner,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: RemoteNoteStore + 'static,
{
  let id: NoteId = id.parse()?;
  state.store.remove(id, &owner).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Batch insert ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub notes: Vec<NewNote>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchReply {
  pub success: bool,
  pub notes:   Vec<Note>,
}

/// `POST /api/notes/batch-insert`: moves guest notes into the account.
pub async fn batch_insert<S>(
  State(state): State<AppState<S>>,
  CurrentOwner(owner): CurrentOwner,
  Json(body): Json<BatchBody>,
) -> Result<Json<BatchReply>, ApiError>
where
  S: RemoteNoteStore + 'static,
{
  for note in &body.notes {
    validate_content(&note.content)?;
  }
  let notes = state
    .store
    .batch_insert(&body.notes, &owner)
    .await
    .map_err(store_err)?;
  tracing::info!(count = notes.len(), owner = %owner.user_id, "guest notes migrated");
  Ok(Json(BatchReply { success: true, notes }))
}
