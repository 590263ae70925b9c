//! [`SqliteStore`] is the SQLite implementation of [`RemoteNoteStore`].

use std::path::Path;

use chrono::{DateTime, Duration, SubsecRound as _, Utc};
use quill_core::{NewNote, Note, NoteId, Owner, RemoteNoteStore, note::validate_content};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawNote, encode_dt, encode_uuid},
  schema::SCHEMA,
};

/// Outcome of a scoped delete, decided inside one connection call.
enum Removal {
  Deleted,
  Missing,
  OtherOwner,
}

fn check_content(content: &str) -> Result<()> {
  validate_content(content).map_err(|_| Error::Validation("note content must not be empty".into()))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A durable note store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total number of rows across all owners.
  pub async fn count_all(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))?))
      .await?;
    Ok(n as usize)
  }

  /// Store-assigned creation time, truncated to the stored precision so the
  /// returned note equals what a later `list` reads back.
  fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }
}

// ─── RemoteNoteStore impl ────────────────────────────────────────────────────

impl RemoteNoteStore for SqliteStore {
  type Error = Error;

  async fn list<'a>(&'a self, owner: &'a Owner) -> Result<Vec<Note>> {
    let owner_str = encode_uuid(owner.user_id);

    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT note_id, owner_id, content, created_at
           FROM notes
           WHERE owner_id = ?1
           ORDER BY created_at ASC, rowid ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawNote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  async fn add<'a>(&'a self, content: &'a str, owner: &'a Owner) -> Result<Note> {
    check_content(content)?;

    let note = Note {
      id:         NoteId::Remote(Uuid::new_v4()),
      content:    content.to_owned(),
      created_at: Self::now(),
      owner_id:   Some(owner.user_id),
    };

    let id_str      = note.id.to_string();
    let owner_str   = encode_uuid(owner.user_id);
    let content_str = note.content.clone();
    let at_str      = encode_dt(note.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notes (note_id, owner_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, owner_str, content_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(note_id = %note.id, owner = %owner.user_id, "note inserted");
    Ok(note)
  }

  async fn remove<'a>(&'a self, id: NoteId, owner: &'a Owner) -> Result<()> {
    let uuid      = id.as_remote().ok_or(Error::NotRemote(id))?;
    let id_str    = encode_uuid(uuid);
    let owner_str = encode_uuid(owner.user_id);

    let removal = self
      .conn
      .call(move |conn| {
        let deleted = conn.execute(
          "DELETE FROM notes WHERE note_id = ?1 AND owner_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?;
        if deleted > 0 {
          return Ok(Removal::Deleted);
        }

        let exists = conn
          .query_row(
            "SELECT 1 FROM notes WHERE note_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        Ok(if exists { Removal::OtherOwner } else { Removal::Missing })
      })
      .await?;

    match removal {
      Removal::Deleted => Ok(()),
      Removal::Missing => Err(Error::NoteNotFound(uuid)),
      Removal::OtherOwner => {
        tracing::warn!(note_id = %uuid, owner = %owner.user_id, "refused cross-owner delete");
        Err(Error::NotOwner(uuid))
      }
    }
  }

  async fn batch_insert<'a>(
    &'a self,
    notes: &'a [NewNote],
    owner: &'a Owner,
  ) -> Result<Vec<Note>> {
    for n in notes {
      check_content(&n.content)?;
    }

    // Consecutive microseconds keep the batch in its original order.
    let base = Self::now();
    let inserted: Vec<Note> = notes
      .iter()
      .enumerate()
      .map(|(i, n)| Note {
        id:         NoteId::Remote(Uuid::new_v4()),
        content:    n.content.clone(),
        created_at: base + Duration::microseconds(i as i64),
        owner_id:   Some(owner.user_id),
      })
      .collect();

    let owner_str = encode_uuid(owner.user_id);
    let rows: Vec<(String, String, String)> = inserted
      .iter()
      .map(|n| (n.id.to_string(), n.content.clone(), encode_dt(n.created_at)))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO notes (note_id, owner_id, content, created_at)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for (id, content, at) in &rows {
            stmt.execute(rusqlite::params![id, owner_str, content, at])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(count = inserted.len(), owner = %owner.user_id, "batch inserted notes");
    Ok(inserted)
  }
}
