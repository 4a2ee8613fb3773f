//! Backed note repository: merges live table records with the seed
//! collection and drives the blob store.
//!
//! Read policy is fail-open: a backend failure degrades to the seed
//! collection with a warning instead of surfacing an error. Write policy
//! is fail-closed. Multi-step writes are guarded by record lifecycle
//! markers (pending on create, tombstone on delete) so readers never see
//! a half-finished note, and shared-with updates go through a
//! version-conditioned put.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use studynotes_core::{
    defaults, merge_notes, note_from_item, note_to_item, sort_notes, validate_upload, Error, Item,
    Note, NoteDraft, NoteRepository, ObjectStore, RecordStatus, Result, SortMode, TableStore,
};

/// Note repository over pluggable table and object backends.
pub struct BackedNoteRepository {
    tables: Arc<dyn TableStore>,
    objects: Arc<dyn ObjectStore>,
    seed: Vec<Note>,
    max_upload_bytes: u64,
}

impl BackedNoteRepository {
    pub fn new(tables: Arc<dyn TableStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self {
            tables,
            objects,
            seed: Vec::new(),
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
        }
    }

    /// Inject a seed collection merged behind live records.
    pub fn with_seed(mut self, seed: Vec<Note>) -> Self {
        self.seed = seed;
        self
    }

    /// Override the upload size limit.
    pub fn with_max_upload_bytes(mut self, max: u64) -> Self {
        self.max_upload_bytes = max;
        self
    }

    fn seed_ids(&self) -> HashSet<&str> {
        self.seed.iter().map(|n| n.id.as_str()).collect()
    }

    /// Split raw items into visible notes and the set of ids suppressed by
    /// lifecycle markers. Undecodable records are skipped with a warning.
    fn partition(items: Vec<Item>) -> (Vec<Note>, HashSet<String>) {
        let mut notes = Vec::with_capacity(items.len());
        let mut suppressed = HashSet::new();
        for item in items {
            match RecordStatus::of(&item) {
                RecordStatus::Active => match note_from_item(&item) {
                    Ok(note) => notes.push(note),
                    Err(e) => {
                        warn!(subsystem = "repo", component = "notes", error = %e,
                              "skipping undecodable note record");
                    }
                },
                RecordStatus::Pending | RecordStatus::Tombstone => {
                    if let Ok(note) = note_from_item(&item) {
                        suppressed.insert(note.id);
                    }
                }
            }
        }
        (notes, suppressed)
    }

    fn seed_minus(&self, suppressed: &HashSet<String>) -> Vec<Note> {
        self.seed
            .iter()
            .filter(|n| !suppressed.contains(&n.id))
            .cloned()
            .collect()
    }

    async fn scan_merged(&self) -> Result<Vec<Note>> {
        match self.tables.scan(defaults::NOTES_TABLE).await {
            Ok(items) => {
                let (live, suppressed) = Self::partition(items);
                Ok(merge_notes(live, self.seed_minus(&suppressed)))
            }
            Err(e) => {
                warn!(subsystem = "repo", component = "notes", op = "scan", error = %e,
                      "backend unreachable, serving seed collection");
                Ok(self.seed.clone())
            }
        }
    }

    fn validate_draft(&self, draft: &NoteDraft, blob: &[u8]) -> Result<()> {
        if draft.title.trim().is_empty() {
            return Err(Error::Validation("title is required".into()));
        }
        if draft.subject_id.trim().is_empty() {
            return Err(Error::Validation("subject is required".into()));
        }
        if draft.file_name.trim().is_empty() {
            return Err(Error::Validation("file name is required".into()));
        }
        let verdict = validate_upload(
            &draft.file_name,
            draft.file_type.content_type(),
            blob,
            self.max_upload_bytes,
        );
        if !verdict.allowed {
            return Err(Error::Validation(
                verdict
                    .block_reason
                    .unwrap_or_else(|| "upload rejected".into()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for BackedNoteRepository {
    async fn list_all(&self) -> Result<Vec<Note>> {
        let notes = self.scan_merged().await?;
        debug!(
            subsystem = "repo",
            component = "notes",
            op = "list_all",
            result_count = notes.len()
        );
        Ok(notes)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Note>> {
        match self.tables.get_item(defaults::NOTES_TABLE, id).await {
            Ok(Some(item)) => match RecordStatus::of(&item) {
                RecordStatus::Active => Ok(Some(note_from_item(&item)?)),
                // A marker means the id is mid-create or mid-delete; the
                // seed copy must not leak through.
                RecordStatus::Pending | RecordStatus::Tombstone => Ok(None),
            },
            Ok(None) => Ok(self.seed.iter().find(|n| n.id == id).cloned()),
            Err(e) => {
                warn!(subsystem = "repo", component = "notes", op = "get_by_id",
                      note_id = id, error = %e,
                      "backend unreachable, consulting seed collection");
                Ok(self.seed.iter().find(|n| n.id == id).cloned())
            }
        }
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Note>> {
        let seed_of_subject = |suppressed: &HashSet<String>| {
            self.seed_minus(suppressed)
                .into_iter()
                .filter(|n| n.subject_id == subject_id)
                .collect::<Vec<_>>()
        };
        match self
            .tables
            .query_index(
                defaults::NOTES_TABLE,
                defaults::SUBJECT_INDEX,
                defaults::SUBJECT_INDEX_KEY,
                subject_id,
            )
            .await
        {
            Ok(items) => {
                let (live, suppressed) = Self::partition(items);
                Ok(merge_notes(live, seed_of_subject(&suppressed)))
            }
            Err(e) => {
                warn!(subsystem = "repo", component = "notes", op = "list_by_subject",
                      subject_id = subject_id, error = %e,
                      "backend unreachable, serving seed collection");
                Ok(seed_of_subject(&HashSet::new()))
            }
        }
    }

    async fn list_recent(&self, count: usize) -> Result<Vec<Note>> {
        let all = self.list_all().await?;
        let mut sorted = sort_notes(&all, SortMode::NewestFirst);
        sorted.truncate(count);
        Ok(sorted)
    }

    async fn list_shared(&self) -> Result<Vec<Note>> {
        let all = self.list_all().await?;
        Ok(all.into_iter().filter(|n| n.is_shared).collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Note>> {
        let all = self.list_all().await?;
        let hits: Vec<Note> = all.into_iter().filter(|n| n.matches(query)).collect();
        debug!(
            subsystem = "repo",
            component = "notes",
            op = "search",
            query = query,
            result_count = hits.len()
        );
        Ok(hits)
    }

    async fn create(&self, draft: NoteDraft, blob: &[u8]) -> Result<Note> {
        self.validate_draft(&draft, blob)?;

        let id = Uuid::now_v7().to_string();
        let file_key = Note::file_key_for(&id, &draft.file_name);
        let note = Note {
            id: id.clone(),
            title: draft.title,
            file_name: draft.file_name,
            file_type: draft.file_type,
            subject_id: draft.subject_id,
            subject_name: None,
            file_size: blob.len() as u64,
            upload_date: Utc::now(),
            last_access_date: None,
            tags: draft.tags,
            is_shared: false,
            shared_with: None,
            file_key: file_key.clone(),
            content: draft.content,
            version: 0,
        };

        // Pending marker first: a reader never sees a note whose blob is
        // still uploading, and a crashed create leaves a resumable marker
        // rather than a dangling visible record.
        self.tables
            .put_item(
                defaults::NOTES_TABLE,
                note_to_item(&note, RecordStatus::Pending),
            )
            .await?;

        if let Err(e) = self
            .objects
            .put(&file_key, blob, note.file_type.content_type())
            .await
        {
            // Best-effort removal of the marker; the upload itself failed.
            let _ = self.tables.delete_item(defaults::NOTES_TABLE, &id).await;
            return Err(e);
        }

        self.tables
            .put_item(
                defaults::NOTES_TABLE,
                note_to_item(&note, RecordStatus::Active),
            )
            .await?;

        info!(
            subsystem = "repo",
            component = "notes",
            op = "create",
            note_id = %note.id,
            object_key = %note.file_key,
            blob_size = note.file_size
        );
        Ok(note)
    }

    async fn mark_shared(&self, note_id: &str, recipient: &str) -> Result<Note> {
        for attempt in 0..defaults::MARK_SHARED_MAX_RETRIES {
            let stored = self.tables.get_item(defaults::NOTES_TABLE, note_id).await?;
            let (current, expected_version) = match stored {
                Some(item) => match RecordStatus::of(&item) {
                    RecordStatus::Active => {
                        let note = note_from_item(&item)?;
                        let version = note.version;
                        (note, Some(version))
                    }
                    _ => return Err(Error::NoteNotFound(note_id.to_string())),
                },
                // Seed-only notes are materialized into the backend on
                // first share so later reads reflect the update.
                None => match self.seed.iter().find(|n| n.id == note_id) {
                    Some(note) => (note.clone(), None),
                    None => return Err(Error::NoteNotFound(note_id.to_string())),
                },
            };

            let mut recipients = current.shared_with.clone().unwrap_or_default();
            if current.is_shared && recipients.iter().any(|r| r == recipient) {
                return Ok(current);
            }
            if !recipients.iter().any(|r| r == recipient) {
                recipients.push(recipient.to_string());
            }

            let updated = Note {
                is_shared: true,
                shared_with: Some(recipients),
                version: current.version + 1,
                ..current
            };

            let written = self
                .tables
                .put_item_versioned(
                    defaults::NOTES_TABLE,
                    note_to_item(&updated, RecordStatus::Active),
                    expected_version,
                )
                .await?;
            if written {
                info!(
                    subsystem = "repo",
                    component = "notes",
                    op = "mark_shared",
                    note_id = note_id,
                    attempt = attempt
                );
                return Ok(updated);
            }
            debug!(
                subsystem = "repo",
                component = "notes",
                op = "mark_shared",
                note_id = note_id,
                attempt = attempt,
                "conditional write lost the race, retrying"
            );
        }
        Err(Error::Conflict(format!(
            "mark_shared on note {note_id} kept losing the version race"
        )))
    }

    async fn delete(&self, note: &Note) -> Result<()> {
        // Tombstone first: the note disappears from reads before either
        // teardown step runs, and a seed id stays suppressed afterwards.
        self.tables
            .put_item(
                defaults::NOTES_TABLE,
                note_to_item(note, RecordStatus::Tombstone),
            )
            .await?;

        let blob_result = self.objects.delete(&note.file_key).await;

        // Seed ids keep their tombstone so the seed copy cannot resurrect;
        // everything else loses its record entirely.
        let record_result = if self.seed_ids().contains(note.id.as_str()) {
            Ok(())
        } else {
            self.tables
                .delete_item(defaults::NOTES_TABLE, &note.id)
                .await
        };

        match (&blob_result, &record_result) {
            (Ok(()), Ok(())) => {
                info!(
                    subsystem = "repo",
                    component = "notes",
                    op = "delete",
                    note_id = %note.id
                );
                Ok(())
            }
            _ => {
                warn!(
                    subsystem = "repo",
                    component = "notes",
                    op = "delete",
                    note_id = %note.id,
                    blob_ok = blob_result.is_ok(),
                    record_ok = record_result.is_ok(),
                    "partial delete; completed steps are not rolled back"
                );
                blob_result.and(record_result)
            }
        }
    }
}
