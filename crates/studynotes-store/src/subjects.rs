//! Backed subject directory.
//!
//! Mutations persist to the table store; listings merge live records with
//! the seed set under the same first-wins rule the note repository uses.
//! Deleting a seed subject leaves a tombstone so it stays deleted across
//! sessions. Notes are never cascaded: an orphaned subject id resolves to
//! the placeholder name at view time.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use studynotes_core::{
    defaults, merge_subjects, subject_from_item, subject_to_item, AttrValue, Item, NewSubject,
    RecordStatus, Result, Subject, SubjectDirectory, TableStore,
};

fn tombstone_item(id: &str) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttrValue::s(id));
    item.insert("name".into(), AttrValue::s(""));
    item.insert(
        "recordStatus".into(),
        AttrValue::s(RecordStatus::Tombstone.as_str()),
    );
    item
}

/// Subject directory over a pluggable table backend.
pub struct BackedSubjectDirectory {
    tables: Arc<dyn TableStore>,
    seed: Vec<Subject>,
}

impl BackedSubjectDirectory {
    pub fn new(tables: Arc<dyn TableStore>) -> Self {
        Self {
            tables,
            seed: Vec::new(),
        }
    }

    /// Inject a seed directory merged behind live records.
    pub fn with_seed(mut self, seed: Vec<Subject>) -> Self {
        self.seed = seed;
        self
    }

    fn is_seed_id(&self, id: &str) -> bool {
        self.seed.iter().any(|s| s.id == id)
    }
}

#[async_trait]
impl SubjectDirectory for BackedSubjectDirectory {
    async fn list(&self) -> Result<Vec<Subject>> {
        match self.tables.scan(defaults::SUBJECTS_TABLE).await {
            Ok(items) => {
                let mut live = Vec::with_capacity(items.len());
                let mut suppressed = Vec::new();
                for item in items {
                    match RecordStatus::of(&item) {
                        RecordStatus::Active => match subject_from_item(&item) {
                            Ok(subject) => live.push(subject),
                            Err(e) => {
                                warn!(subsystem = "repo", component = "subjects", error = %e,
                                      "skipping undecodable subject record");
                            }
                        },
                        _ => {
                            if let Some(AttrValue::S(id)) = item.get("id") {
                                suppressed.push(id.clone());
                            }
                        }
                    }
                }
                let seed = self
                    .seed
                    .iter()
                    .filter(|s| !suppressed.contains(&s.id))
                    .cloned()
                    .collect();
                Ok(merge_subjects(live, seed))
            }
            Err(e) => {
                warn!(subsystem = "repo", component = "subjects", op = "list", error = %e,
                      "backend unreachable, serving seed directory");
                Ok(self.seed.clone())
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Subject>> {
        let subjects = self.list().await?;
        Ok(subjects.into_iter().find(|s| s.id == id))
    }

    async fn create(&self, subject: NewSubject) -> Result<Subject> {
        let created = Subject {
            id: Uuid::now_v7().to_string(),
            name: subject.name,
            color: subject.color,
            description: subject.description,
            note_count: Some(0),
        };
        self.tables
            .put_item(defaults::SUBJECTS_TABLE, subject_to_item(&created))
            .await?;
        debug!(
            subsystem = "repo",
            component = "subjects",
            op = "create",
            subject_id = %created.id
        );
        Ok(created)
    }

    async fn update(&self, subject: &Subject) -> Result<()> {
        // Silent no-op when the id is not visible; a seed subject is
        // materialized into the backend on first edit.
        if self.get_by_id(&subject.id).await?.is_none() {
            return Ok(());
        }
        self.tables
            .put_item(defaults::SUBJECTS_TABLE, subject_to_item(subject))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        if self.get_by_id(id).await?.is_none() {
            return Ok(false);
        }
        if self.is_seed_id(id) {
            self.tables
                .put_item(defaults::SUBJECTS_TABLE, tombstone_item(id))
                .await?;
        } else {
            self.tables
                .delete_item(defaults::SUBJECTS_TABLE, id)
                .await?;
        }
        debug!(
            subsystem = "repo",
            component = "subjects",
            op = "delete",
            subject_id = id
        );
        Ok(true)
    }
}
