//! Shared fixtures for unit tests.

use std::sync::{
  Arc,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{Duration, Utc};
use quill_core::{Error, NewNote, Note, NoteId, Owner, RemoteNoteStore, Result, Session};
use quill_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  facade::NoteFacade,
  local::{LocalNoteStore, LocalPersistence, MemoryPersistence},
};

pub fn session_for(user_id: Uuid, token: &str) -> Session {
  Session {
    access_token:  token.into(),
    refresh_token: format!("{token}-refresh"),
    user_id,
    expires_at:    Utc::now() + Duration::hours(1),
  }
}

pub fn session() -> Session { session_for(Uuid::new_v4(), "token") }

/// Persistence whose keys can be written but never removed.
#[derive(Default)]
pub struct Undeletable(MemoryPersistence);

impl LocalPersistence for Undeletable {
  fn get(&self, key: &str) -> Result<Option<String>> { self.0.get(key) }
  fn set(&self, key: &str, value: &str) -> Result<()> { self.0.set(key, value) }
  fn remove(&self, _: &str) -> Result<()> { Err(Error::Persistence("locked".into())) }
}

/// A SQLite-backed remote whose batch inserts can be made to fail.
pub struct Flaky {
  pub inner:        SqliteStore,
  pub fail_batches: AtomicBool,
  pub batch_calls:  AtomicUsize,
}

impl Flaky {
  pub async fn new() -> Self {
    Self {
      inner:        SqliteStore::open_in_memory().await.unwrap(),
      fail_batches: AtomicBool::new(false),
      batch_calls:  AtomicUsize::new(0),
    }
  }

  pub fn set_failing(&self, failing: bool) { self.fail_batches.store(failing, Ordering::SeqCst) }

  pub fn batch_calls(&self) -> usize { self.batch_calls.load(Ordering::SeqCst) }
}

impl RemoteNoteStore for Flaky {
  type Error = Error;

  async fn list<'a>(&'a self, owner: &'a Owner) -> Result<Vec<Note>> {
    Ok(self.inner.list(owner).await?)
  }

  async fn add<'a>(&'a self, content: &'a str, owner: &'a Owner) -> Result<Note> {
    Ok(self.inner.add(content, owner).await?)
  }

  async fn remove<'a>(&'a self, id: NoteId, owner: &'a Owner) -> Result<()> {
    Ok(self.inner.remove(id, owner).await?)
  }

  async fn batch_insert<'a>(&'a self, notes: &'a [NewNote], owner: &'a Owner) -> Result<Vec<Note>> {
    self.batch_calls.fetch_add(1, Ordering::SeqCst);
    if self.fail_batches.load(Ordering::SeqCst) {
      return Err(Error::TransientNetwork("connection reset".into()));
    }
    Ok(self.inner.batch_insert(notes, owner).await?)
  }
}

pub type TestFacade = NoteFacade<Arc<MemoryPersistence>, Arc<Flaky>>;

/// A guest-mode façade over fresh persistence and a fresh remote, seeded with
/// `contents` as guest notes.
pub async fn facade(contents: &[&str]) -> (Arc<TestFacade>, Arc<MemoryPersistence>, Arc<Flaky>) {
  let persistence = Arc::new(MemoryPersistence::new());
  let mut local = LocalNoteStore::open(Arc::clone(&persistence), 3).unwrap();
  for c in contents {
    local.add(c).unwrap();
  }
  let remote = Arc::new(Flaky::new().await);
  let facade = Arc::new(NoteFacade::new(local, Arc::clone(&remote)));
  (facade, persistence, remote)
}
