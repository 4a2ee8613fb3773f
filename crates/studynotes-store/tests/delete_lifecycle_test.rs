//! Delete semantics: blob and record teardown, marker suppression, and
//! the permanent tombstone that keeps a deleted seed note deleted.

use std::sync::Arc;

use studynotes_core::{
    defaults, note_to_item, seed_notes, FileType, NoteDraft, NoteRepository, ObjectStore,
    RecordStatus, TableStore,
};
use studynotes_store::{BackedNoteRepository, MemoryObjectStore, MemoryTableStore};

fn stores() -> (Arc<MemoryTableStore>, Arc<MemoryObjectStore>) {
    (
        Arc::new(MemoryTableStore::new()),
        Arc::new(MemoryObjectStore::new()),
    )
}

#[tokio::test]
async fn test_delete_removes_record_and_blob() {
    let (tables, objects) = stores();
    let repo = BackedNoteRepository::new(tables.clone(), objects.clone());

    let draft = NoteDraft {
        title: "Thermodynamics".into(),
        file_name: "thermo.txt".into(),
        file_type: FileType::Txt,
        subject_id: "2".into(),
        tags: None,
        content: None,
    };
    let note = repo.create(draft, b"entropy never decreases").await.unwrap();
    assert!(objects.get(&note.file_key).await.is_ok());

    repo.delete(&note).await.unwrap();

    assert!(repo.get_by_id(&note.id).await.unwrap().is_none());
    assert!(repo.list_all().await.unwrap().is_empty());
    assert!(objects.get(&note.file_key).await.is_err());
    // Non-seed ids lose their record entirely.
    assert!(tables
        .get_item(defaults::NOTES_TABLE, &note.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_deleted_seed_note_stays_deleted() {
    let (tables, objects) = stores();
    let repo = BackedNoteRepository::new(tables.clone(), objects)
        .with_seed(seed_notes());

    let target = seed_notes()[0].clone();
    repo.delete(&target).await.unwrap();

    // The tombstone suppresses the seed copy instead of letting it
    // resurface on the next listing.
    assert!(repo.get_by_id("1").await.unwrap().is_none());
    let all = repo.list_all().await.unwrap();
    assert_eq!(all.len(), seed_notes().len() - 1);
    assert!(all.iter().all(|n| n.id != "1"));

    let marker = tables
        .get_item(defaults::NOTES_TABLE, "1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(RecordStatus::of(&marker), RecordStatus::Tombstone);
}

#[tokio::test]
async fn test_pending_marker_hides_note_from_reads() {
    let (tables, objects) = stores();

    let mut note = seed_notes()[2].clone();
    note.id = "uploading".into();
    tables
        .put_item(
            defaults::NOTES_TABLE,
            note_to_item(&note, RecordStatus::Pending),
        )
        .await
        .unwrap();

    let repo = BackedNoteRepository::new(tables, objects);
    assert!(repo.get_by_id("uploading").await.unwrap().is_none());
    assert!(repo.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tombstoned_seed_id_excluded_from_subject_listing() {
    let (tables, objects) = stores();
    let repo = BackedNoteRepository::new(tables, objects).with_seed(seed_notes());

    let target = seed_notes()[0].clone();
    repo.delete(&target).await.unwrap();

    let math = repo.list_by_subject("1").await.unwrap();
    assert!(math.is_empty());
}
