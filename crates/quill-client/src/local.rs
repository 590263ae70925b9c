//! Guest note storage scoped to one client.
//!
//! Notes written before sign-in live here, serialised as one JSON list under
//! a fixed key. All operations are synchronous.

use std::{
  collections::HashMap,
  fs,
  io::ErrorKind,
  path::PathBuf,
  sync::{Arc, Mutex},
};

use chrono::Utc;
use quill_core::{Error, Note, NoteId, Result};

/// Key under which the guest note list is persisted.
pub const GUEST_NOTES_KEY: &str = "quill.guest-notes";

// ─── Persistence surface ─────────────────────────────────────────────────────

/// String storage under fixed keys, the way a browser's local storage works.
pub trait LocalPersistence: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>>;
  fn set(&self, key: &str, value: &str) -> Result<()>;
  fn remove(&self, key: &str) -> Result<()>;
}

impl<P: LocalPersistence> LocalPersistence for Arc<P> {
  fn get(&self, key: &str) -> Result<Option<String>> { (**self).get(key) }
  fn set(&self, key: &str, value: &str) -> Result<()> { (**self).set(key, value) }
  fn remove(&self, key: &str) -> Result<()> { (**self).remove(key) }
}

/// Volatile persistence; everything is lost with the value.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryPersistence {
  pub fn new() -> Self { Self::default() }

  fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
    self
      .entries
      .lock()
      .map_err(|_| Error::Persistence("memory persistence poisoned".into()))
  }
}

impl LocalPersistence for MemoryPersistence {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.entries()?.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self.entries()?.insert(key.to_owned(), value.to_owned());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.entries()?.remove(key);
    Ok(())
  }
}

/// One file per key inside a client data directory.
#[derive(Debug, Clone)]
pub struct FilePersistence {
  dir: PathBuf,
}

impl FilePersistence {
  pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
    let dir = dir.into();
    fs::create_dir_all(&dir)
      .map_err(|e| Error::Persistence(format!("creating {}: {e}", dir.display())))?;
    Ok(Self { dir })
  }

  fn path(&self, key: &str) -> PathBuf { self.dir.join(format!("{key}.json")) }
}

impl LocalPersistence for FilePersistence {
  fn get(&self, key: &str) -> Result<Option<String>> {
    match fs::read_to_string(self.path(key)) {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::Persistence(format!("reading {key}: {e}"))),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    // Write-then-rename so a crash never leaves a truncated list behind.
    let path = self.path(key);
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, value).map_err(|e| Error::Persistence(format!("writing {key}: {e}")))?;
    fs::rename(&tmp, &path).map_err(|e| Error::Persistence(format!("writing {key}: {e}")))
  }

  fn remove(&self, key: &str) -> Result<()> {
    match fs::remove_file(self.path(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::Persistence(format!("removing {key}: {e}"))),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Guest notes, capped at `limit`.
pub struct LocalNoteStore<P> {
  persistence: P,
  limit:       usize,
  notes:       Vec<Note>,
}

impl<P: LocalPersistence> LocalNoteStore<P> {
  /// Load whatever is persisted under [`GUEST_NOTES_KEY`].
  pub fn open(persistence: P, limit: usize) -> Result<Self> {
    let notes = match persistence.get(GUEST_NOTES_KEY)? {
      Some(raw) => serde_json::from_str(&raw)?,
      None => Vec::new(),
    };
    Ok(Self { persistence, limit, notes })
  }

  fn is_full(&self) -> bool { self.notes.len() >= self.limit }

  pub fn list(&self) -> &[Note] { &self.notes }

  /// Append a note. The in-memory list only changes once persisted.
  pub fn add(&mut self, content: &str) -> Result<Note> {
    if self.is_full() {
      return Err(Error::QuotaExceeded { limit: self.limit });
    }

    let note = Note {
      id:         self.next_id(),
      content:    content.to_owned(),
      created_at: Utc::now(),
      owner_id:   None,
    };

    let mut next = self.notes.clone();
    next.push(note.clone());
    self.persist(&next)?;
    self.notes = next;
    Ok(note)
  }

  pub fn remove(&mut self, id: NoteId) -> Result<()> {
    if !self.notes.iter().any(|n| n.id == id) {
      return Err(Error::NotFound(id));
    }
    let next: Vec<Note> = self.notes.iter().filter(|n| n.id != id).cloned().collect();
    self.persist(&next)?;
    self.notes = next;
    Ok(())
  }

  /// Drop every note. When the persisted key cannot be removed an empty list
  /// is written in its place, so a reload never sees the old notes. Only if
  /// both fail is the error returned; the in-memory list is emptied anyway.
  pub fn clear(&mut self) -> Result<()> {
    self.notes.clear();
    match self.persistence.remove(GUEST_NOTES_KEY) {
      Ok(()) => Ok(()),
      Err(e) => {
        tracing::warn!(error = %e, "removing guest notes failed; writing an empty list");
        self.persist(&[]).map_err(|_| e)
      }
    }
  }

  fn persist(&self, notes: &[Note]) -> Result<()> {
    let raw = serde_json::to_string(notes)?;
    self.persistence.set(GUEST_NOTES_KEY, &raw)
  }

  /// Millisecond timestamp, bumped past the newest existing local id.
  fn next_id(&self) -> NoteId {
    let now = Utc::now().timestamp_millis();
    let newest = self
      .notes
      .iter()
      .filter_map(|n| match n.id {
        NoteId::Local(ms) => Some(ms),
        NoteId::Remote(_) => None,
      })
      .max();
    match newest {
      Some(ms) if ms >= now => NoteId::Local(ms + 1),
      _ => NoteId::Local(now),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::Undeletable;

  /// Persistence that refuses every write.
  struct ReadOnly;

  impl LocalPersistence for ReadOnly {
    fn get(&self, _: &str) -> Result<Option<String>> { Ok(None) }
    fn set(&self, _: &str, _: &str) -> Result<()> {
      Err(Error::Persistence("read-only".into()))
    }
    fn remove(&self, _: &str) -> Result<()> { Err(Error::Persistence("read-only".into())) }
  }

  fn store() -> LocalNoteStore<MemoryPersistence> {
    LocalNoteStore::open(MemoryPersistence::new(), 3).unwrap()
  }

  #[test]
  fn ids_are_local_and_strictly_increasing() {
    let mut s = store();
    let a = s.add("a").unwrap();
    let b = s.add("b").unwrap();
    let c = s.add("c").unwrap();
    let ms = |id: NoteId| match id {
      NoteId::Local(ms) => ms,
      NoteId::Remote(_) => panic!("expected local id"),
    };
    assert!(ms(a.id) < ms(b.id));
    assert!(ms(b.id) < ms(c.id));
    assert!(a.owner_id.is_none());
  }

  #[test]
  fn quota_is_enforced() {
    let mut s = store();
    for c in ["buy milk", "walk dog", "read book"] {
      s.add(c).unwrap();
    }
    assert!(matches!(s.add("call mom"), Err(Error::QuotaExceeded { limit: 3 })));
    assert_eq!(s.list().len(), 3);
  }

  #[test]
  fn notes_survive_reopen() {
    let p = Arc::new(MemoryPersistence::new());
    {
      let mut s = LocalNoteStore::open(Arc::clone(&p), 3).unwrap();
      s.add("persisted").unwrap();
    }
    let s = LocalNoteStore::open(p, 3).unwrap();
    assert_eq!(s.list().len(), 1);
    assert_eq!(s.list()[0].content, "persisted");
  }

  #[test]
  fn remove_filters_and_persists() {
    let p = Arc::new(MemoryPersistence::new());
    let mut s = LocalNoteStore::open(Arc::clone(&p), 3).unwrap();
    let keep = s.add("keep").unwrap();
    let gone = s.add("gone").unwrap();
    s.remove(gone.id).unwrap();
    assert_eq!(s.list(), &[keep.clone()]);

    let reopened = LocalNoteStore::open(p, 3).unwrap();
    assert_eq!(reopened.list(), &[keep]);
  }

  #[test]
  fn remove_unknown_id_is_not_found() {
    let mut s = store();
    assert!(matches!(s.remove(NoteId::Local(7)), Err(Error::NotFound(_))));
  }

  #[test]
  fn failed_write_leaves_no_phantom_note() {
    let mut s = LocalNoteStore::open(ReadOnly, 3).unwrap();
    assert!(matches!(s.add("lost"), Err(Error::Persistence(_))));
    assert!(s.list().is_empty());
  }

  #[test]
  fn clear_removes_persisted_key() {
    let p = Arc::new(MemoryPersistence::new());
    let mut s = LocalNoteStore::open(Arc::clone(&p), 3).unwrap();
    s.add("x").unwrap();
    s.clear().unwrap();
    assert!(s.list().is_empty());
    assert_eq!(p.get(GUEST_NOTES_KEY).unwrap(), None);
  }

  #[test]
  fn clear_falls_back_to_an_empty_list() {
    let p = Arc::new(Undeletable::default());
    let mut s = LocalNoteStore::open(Arc::clone(&p), 3).unwrap();
    s.add("migrated").unwrap();
    s.clear().unwrap();

    let reopened = LocalNoteStore::open(p, 3).unwrap();
    assert!(reopened.list().is_empty());
  }

  #[test]
  fn clear_reports_failure_when_nothing_can_be_written() {
    let mut s = LocalNoteStore::open(ReadOnly, 3).unwrap();
    assert!(matches!(s.clear(), Err(Error::Persistence(_))));
    assert!(s.list().is_empty());
  }

  #[test]
  fn file_persistence_round_trip() {
    let dir = std::env::temp_dir().join(format!("quill-local-{}", uuid::Uuid::new_v4()));
    let p = FilePersistence::new(&dir).unwrap();
    assert_eq!(p.get("k").unwrap(), None);
    p.set("k", "v").unwrap();
    assert_eq!(p.get("k").unwrap().as_deref(), Some("v"));
    p.remove("k").unwrap();
    p.remove("k").unwrap();
    assert_eq!(p.get("k").unwrap(), None);
    fs::remove_dir_all(&dir).ok();
  }
}
