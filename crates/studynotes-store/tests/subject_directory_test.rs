//! Subject directory lifecycle over the in-memory backend.

use std::sync::Arc;

use studynotes_core::{
    seed_subjects, with_subject_name, NewSubject, Subject, SubjectDirectory, TableStore,
};
use studynotes_store::{BackedSubjectDirectory, MemoryTableStore};

fn directory(tables: Arc<MemoryTableStore>) -> BackedSubjectDirectory {
    BackedSubjectDirectory::new(tables).with_seed(seed_subjects())
}

#[tokio::test]
async fn test_created_subject_listed_alongside_seed() {
    let dir = directory(Arc::new(MemoryTableStore::new()));

    let created = dir
        .create(NewSubject {
            name: "Chemistry".into(),
            color: Some("#16A34A".into()),
            description: Some("Organic and inorganic".into()),
        })
        .await
        .unwrap();
    assert_eq!(created.note_count, Some(0));

    let listed = dir.list().await.unwrap();
    assert_eq!(listed.len(), seed_subjects().len() + 1);
    assert!(listed.iter().any(|s| s.id == created.id));
}

#[tokio::test]
async fn test_update_materializes_seed_subject() {
    let tables = Arc::new(MemoryTableStore::new());
    let dir = directory(tables.clone());

    let mut math = dir.get_by_id("1").await.unwrap().unwrap();
    math.name = "Pure Mathematics".into();
    dir.update(&math).await.unwrap();

    // The edit is persisted and wins over the seed copy.
    let listed = dir.get_by_id("1").await.unwrap().unwrap();
    assert_eq!(listed.name, "Pure Mathematics");
    assert!(tables.get_item("Subjects", "1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_update_of_unknown_subject_is_a_no_op() {
    let tables = Arc::new(MemoryTableStore::new());
    let dir = directory(tables.clone());

    let ghost = Subject {
        id: "no-such-subject".into(),
        name: "Ghost".into(),
        color: None,
        description: None,
        note_count: None,
    };
    dir.update(&ghost).await.unwrap();
    assert!(tables
        .get_item("Subjects", "no-such-subject")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_seed_subject_leaves_tombstone() {
    let dir = directory(Arc::new(MemoryTableStore::new()));

    assert!(dir.delete("4").await.unwrap());
    assert!(dir.get_by_id("4").await.unwrap().is_none());
    let listed = dir.list().await.unwrap();
    assert_eq!(listed.len(), seed_subjects().len() - 1);

    // A second delete reports nothing to remove.
    assert!(!dir.delete("4").await.unwrap());
}

#[tokio::test]
async fn test_delete_never_cascades_to_notes() {
    let dir = directory(Arc::new(MemoryTableStore::new()));
    dir.delete("1").await.unwrap();

    // A note still pointing at the deleted subject resolves to the
    // placeholder name at view time.
    let subjects = dir.list().await.unwrap();
    let calculus = with_subject_name(&studynotes_core::seed_notes()[0], &subjects);
    assert_eq!(calculus.subject_name.as_deref(), Some("Unknown Subject"));
}
