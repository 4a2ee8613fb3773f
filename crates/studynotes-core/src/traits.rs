//! Core traits for studynotes abstractions.
//!
//! These traits define the seams between the repositories and the storage
//! backend, enabling pluggable backends (in-memory emulator, PostgreSQL)
//! and testability.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::item::Item;
use crate::models::{NewSubject, Note, NoteDraft, Subject};

// =============================================================================
// STORAGE BACKEND TRAITS
// =============================================================================

/// Object (blob) operations. The bucket is fixed per deployment.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key, replacing any existing object.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Fetch the bytes stored under a key.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete the object under a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Table operations over attribute-value items.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Write an item, replacing any existing item with the same id.
    async fn put_item(&self, table: &str, item: Item) -> Result<()>;

    /// Write an item only if the stored `version` attribute still equals
    /// `expected_version` (`None` = the item must not exist yet).
    ///
    /// Returns `Ok(false)` when the condition fails, without writing.
    async fn put_item_versioned(
        &self,
        table: &str,
        item: Item,
        expected_version: Option<i64>,
    ) -> Result<bool>;

    /// Point lookup by primary key.
    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>>;

    /// Query a secondary index for items whose `key_attr` equals `key_value`.
    async fn query_index(
        &self,
        table: &str,
        index: &str,
        key_attr: &str,
        key_value: &str,
    ) -> Result<Vec<Item>>;

    /// Full scan of a table.
    async fn scan(&self, table: &str) -> Result<Vec<Item>>;

    /// Delete by primary key. Deleting a missing id is not an error.
    async fn delete_item(&self, table: &str, id: &str) -> Result<()>;
}

/// Function-invocation interface (the mock search function speaks this).
#[async_trait]
pub trait FunctionInvoker: Send + Sync {
    /// Invoke a named function with a JSON payload and return its response.
    async fn invoke(&self, function: &str, payload: JsonValue) -> Result<JsonValue>;
}

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

/// Repository of note metadata merged from the live backend and the seed
/// collection.
///
/// Read operations fail open: when the backend is unreachable they degrade
/// to the seed collection and log the failure instead of surfacing it.
/// Write operations propagate backend errors.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// All notes: live records first, then seed, deduplicated first-wins.
    async fn list_all(&self) -> Result<Vec<Note>>;

    /// Point lookup; consults the seed collection when the backend misses.
    async fn get_by_id(&self, id: &str) -> Result<Option<Note>>;

    /// Notes belonging to a subject, merged under the same first-wins rule.
    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Note>>;

    /// The `count` most recently uploaded notes.
    async fn list_recent(&self, count: usize) -> Result<Vec<Note>>;

    /// Notes with the shared flag set, over the merged collection.
    async fn list_shared(&self) -> Result<Vec<Note>>;

    /// Case-insensitive substring match on title or tags, over the merged
    /// collection.
    async fn search(&self, query: &str) -> Result<Vec<Note>>;

    /// Validate, allocate an id and blob key, upload the blob, and persist
    /// the metadata record. Validation failures reject before any backend
    /// call.
    async fn create(&self, draft: NoteDraft, blob: &[u8]) -> Result<Note>;

    /// Idempotently add a recipient and set the shared flag, using a
    /// version-conditioned write. Returns the updated note.
    async fn mark_shared(&self, note_id: &str, recipient: &str) -> Result<Note>;

    /// Delete the blob and the metadata record. Both are attempted; overall
    /// success requires both, and completed steps are not undone.
    async fn delete(&self, note: &Note) -> Result<()>;
}

/// Directory of subjects: the seed set plus anything created by users.
#[async_trait]
pub trait SubjectDirectory: Send + Sync {
    /// All subjects, live records first, then seed, deduplicated first-wins.
    async fn list(&self) -> Result<Vec<Subject>>;

    /// Linear scan of `list()` by id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Subject>>;

    /// Allocate a time-ordered id and persist the subject. Note count
    /// starts at zero.
    async fn create(&self, subject: NewSubject) -> Result<Subject>;

    /// Replace the matching entry by id; silently a no-op when missing.
    async fn update(&self, subject: &Subject) -> Result<()>;

    /// Remove by id; returns whether a removal occurred.
    async fn delete(&self, id: &str) -> Result<bool>;
}
