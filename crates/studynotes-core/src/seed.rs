//! Seed/demo fixture data.
//!
//! The seed collection is what the application shows before any live data
//! exists, and what read operations degrade to when the storage backend is
//! unreachable. Constructors return fresh values so no instance ever shares
//! mutable fixture state with another.

use chrono::{TimeZone, Utc};

use crate::models::{FileType, Note, Subject};

/// The demo note collection.
pub fn seed_notes() -> Vec<Note> {
    vec![
        Note {
            id: "1".into(),
            title: "Calculus Lecture 1".into(),
            file_name: "calculus_lecture_1.pdf".into(),
            file_type: FileType::Pdf,
            subject_id: "1".into(),
            subject_name: Some("Mathematics".into()),
            file_size: 2_500_000,
            upload_date: Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap(),
            last_access_date: Some(Utc.with_ymd_and_hms(2025, 5, 10, 0, 0, 0).unwrap()),
            tags: Some(vec!["calculus".into(), "derivatives".into()]),
            is_shared: false,
            shared_with: None,
            file_key: "notes/1/calculus_lecture_1.pdf".into(),
            content: None,
            version: 0,
        },
        Note {
            id: "2".into(),
            title: "Mechanics Notes".into(),
            file_name: "mechanics_notes.pdf".into(),
            file_type: FileType::Pdf,
            subject_id: "2".into(),
            subject_name: Some("Physics".into()),
            file_size: 1_800_000,
            upload_date: Utc.with_ymd_and_hms(2025, 5, 3, 0, 0, 0).unwrap(),
            last_access_date: None,
            tags: Some(vec!["mechanics".into(), "forces".into()]),
            is_shared: true,
            shared_with: Some(vec!["friend1@example.com".into()]),
            file_key: "notes/2/mechanics_notes.pdf".into(),
            content: None,
            version: 0,
        },
        Note {
            id: "3".into(),
            title: "Data Structures Summary".into(),
            file_name: "data_structures.txt".into(),
            file_type: FileType::Txt,
            subject_id: "3".into(),
            subject_name: Some("Computer Science".into()),
            file_size: 150_000,
            upload_date: Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap(),
            last_access_date: Some(Utc.with_ymd_and_hms(2025, 5, 12, 0, 0, 0).unwrap()),
            tags: Some(vec!["algorithms".into(), "data structures".into()]),
            is_shared: false,
            shared_with: None,
            file_key: "notes/3/data_structures.txt".into(),
            content: None,
            version: 0,
        },
    ]
}

/// The demo subject directory.
pub fn seed_subjects() -> Vec<Subject> {
    vec![
        Subject {
            id: "1".into(),
            name: "Mathematics".into(),
            color: Some("#2563EB".into()),
            description: None,
            note_count: Some(5),
        },
        Subject {
            id: "2".into(),
            name: "Physics".into(),
            color: Some("#7C3AED".into()),
            description: None,
            note_count: Some(3),
        },
        Subject {
            id: "3".into(),
            name: "Computer Science".into(),
            color: Some("#0D9488".into()),
            description: None,
            note_count: Some(7),
        },
        Subject {
            id: "4".into(),
            name: "History".into(),
            color: Some("#DC2626".into()),
            description: None,
            note_count: Some(2),
        },
    ]
}
