//! Integration tests for `SqliteStore` against an in-memory database.

use quill_core::{NewNote, NoteId, Owner, RemoteNoteStore};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn owner() -> Owner { Owner::verified(Uuid::new_v4()) }

fn batch(contents: &[&str]) -> Vec<NewNote> {
  contents
    .iter()
    .map(|c| NewNote { content: (*c).to_owned() })
    .collect()
}

// ─── add / list ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_round_trip() {
  let s = store().await;
  let alice = owner();

  let note = s.add("buy milk", &alice).await.unwrap();
  assert!(!note.id.is_local());
  assert_eq!(note.owner_id, Some(alice.user_id));

  let listed = s.list(&alice).await.unwrap();
  assert_eq!(listed, vec![note]);
}

#[tokio::test]
async fn list_is_scoped_to_owner() {
  let s = store().await;
  let alice = owner();
  let bob = owner();

  s.add("alice one", &alice).await.unwrap();
  s.add("bob one", &bob).await.unwrap();
  s.add("alice two", &alice).await.unwrap();

  let notes = s.list(&alice).await.unwrap();
  let contents: Vec<_> = notes.iter().map(|n| n.content.as_str()).collect();
  assert_eq!(contents, ["alice one", "alice two"]);
  assert!(notes.iter().all(|n| n.owner_id == Some(alice.user_id)));
}

#[tokio::test]
async fn list_is_ascending_by_creation() {
  let s = store().await;
  let alice = owner();
  for c in ["first", "second", "third"] {
    s.add(c, &alice).await.unwrap();
  }

  let notes = s.list(&alice).await.unwrap();
  assert!(notes.windows(2).all(|w| w[0].created_at <= w[1].created_at));
  assert_eq!(notes[0].content, "first");
  assert_eq!(notes[2].content, "third");
}

#[tokio::test]
async fn blank_content_is_rejected() {
  let s = store().await;
  let err = s.add("   ", &owner()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(s.count_all().await.unwrap(), 0);
}

// ─── remove ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_own_note() {
  let s = store().await;
  let alice = owner();
  let note = s.add("walk dog", &alice).await.unwrap();

  s.remove(note.id, &alice).await.unwrap();
  assert!(s.list(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_other_owners_note_is_refused() {
  let s = store().await;
  let alice = owner();
  let mallory = owner();
  let note = s.add("private", &alice).await.unwrap();

  let err = s.remove(note.id, &mallory).await.unwrap_err();
  assert!(matches!(err, Error::NotOwner(_)));
  assert!(matches!(
    quill_core::Error::from(err),
    quill_core::Error::Unauthorized
  ));

  // The row is still there for its owner.
  assert_eq!(s.list(&alice).await.unwrap().len(), 1);
}

#[tokio::test]
async fn remove_missing_note_is_not_found() {
  let s = store().await;
  let err = s
    .remove(NoteId::Remote(Uuid::new_v4()), &owner())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoteNotFound(_)));
}

#[tokio::test]
async fn remove_local_id_is_not_found() {
  let s = store().await;
  let err = s.remove(NoteId::Local(1), &owner()).await.unwrap_err();
  assert!(matches!(err, Error::NotRemote(_)));
  assert!(matches!(
    quill_core::Error::from(err),
    quill_core::Error::NotFound(NoteId::Local(1))
  ));
}

// ─── batch_insert ────────────────────────────────────────────────────────────

#[tokio::test]
async fn batch_insert_preserves_order_and_assigns_ids() {
  let s = store().await;
  let alice = owner();

  let inserted = s
    .batch_insert(&batch(&["buy milk", "walk dog", "read book"]), &alice)
    .await
    .unwrap();
  assert_eq!(inserted.len(), 3);
  assert!(inserted.iter().all(|n| !n.id.is_local()));

  let listed = s.list(&alice).await.unwrap();
  assert_eq!(listed, inserted);
  let contents: Vec<_> = listed.iter().map(|n| n.content.as_str()).collect();
  assert_eq!(contents, ["buy milk", "walk dog", "read book"]);
}

#[tokio::test]
async fn batch_insert_is_all_or_nothing() {
  let s = store().await;
  let alice = owner();

  let err = s
    .batch_insert(&batch(&["fine", "  ", "also fine"]), &alice)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  assert_eq!(s.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
  let s = store().await;
  let inserted = s.batch_insert(&[], &owner()).await.unwrap();
  assert!(inserted.is_empty());
  assert_eq!(s.count_all().await.unwrap(), 0);
}

#[tokio::test]
async fn reopening_file_store_keeps_notes() {
  let dir = std::env::temp_dir().join(format!("quill-store-{}", Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("notes.db");
  let alice = owner();

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.add("durable", &alice).await.unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  let notes = s.list(&alice).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].content, "durable");

  std::fs::remove_dir_all(&dir).ok();
}
