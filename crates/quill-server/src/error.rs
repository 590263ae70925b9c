//! API error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable session was presented.
  #[error("unauthorized")]
  Unauthorized,
  /// The session is valid but the resource belongs to another account.
  #[error("forbidden")]
  Forbidden,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("store error: {0}")]
  Store(String),
}

impl From<quill_core::Error> for ApiError {
  fn from(err: quill_core::Error) -> Self {
    use quill_core::Error as E;
    match err {
      E::Validation(msg) => Self::BadRequest(msg),
      E::InvalidNoteId(id) => Self::BadRequest(format!("invalid note id: {id}")),
      E::NotFound(id) => Self::NotFound(format!("note {id} not found")),
      E::Unauthorized => Self::Forbidden,
      other => Self::Store(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
