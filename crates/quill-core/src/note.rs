//! Notes and their tier-tagged identifiers.
//!
//! A note created while signed out lives in the local store and carries a
//! `local-<millis>` id. Once it reaches the durable store it is re-created
//! there with an opaque UUID; the two id spaces never overlap.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

const LOCAL_PREFIX: &str = "local-";

// ─── NoteId ──────────────────────────────────────────────────────────────────

/// Identity of a note within its owning store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoteId {
  /// Not yet synced; a monotonic millisecond timestamp unique in the local
  /// store.
  Local(i64),
  /// Assigned by the durable store.
  Remote(Uuid),
}

impl NoteId {
  pub fn is_local(&self) -> bool { matches!(self, Self::Local(_)) }

  pub fn as_remote(&self) -> Option<Uuid> {
    match self {
      Self::Remote(id) => Some(*id),
      Self::Local(_) => None,
    }
  }
}

impl fmt::Display for NoteId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Local(millis) => write!(f, "{LOCAL_PREFIX}{millis}"),
      Self::Remote(id) => write!(f, "{}", id.hyphenated()),
    }
  }
}

impl FromStr for NoteId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if let Some(millis) = s.strip_prefix(LOCAL_PREFIX) {
      return millis
        .parse()
        .map(Self::Local)
        .map_err(|_| Error::InvalidNoteId(s.to_owned()));
    }
    Uuid::parse_str(s)
      .map(Self::Remote)
      .map_err(|_| Error::InvalidNoteId(s.to_owned()))
  }
}

impl TryFrom<String> for NoteId {
  type Error = Error;

  fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<NoteId> for String {
  fn from(id: NoteId) -> Self { id.to_string() }
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// A short note. Content never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
  pub id:         NoteId,
  pub content:    String,
  /// Assigned by whichever store persisted the note.
  pub created_at: DateTime<Utc>,
  /// `None` for guest notes.
  pub owner_id:   Option<Uuid>,
}

/// Input to a batch insert; ids and timestamps are always store-assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
  pub content: String,
}

impl From<&Note> for NewNote {
  fn from(note: &Note) -> Self { Self { content: note.content.clone() } }
}

/// Reject content that is empty once surrounding whitespace is ignored.
pub fn validate_content(content: &str) -> crate::Result<()> {
  if content.trim().is_empty() {
    return Err(Error::Validation("note content must not be empty".into()));
  }
  Ok(())
}
