//! # studynotes-core
//!
//! Core types, traits, and abstractions for the studynotes system.
//!
//! This crate defines the note/subject data model, the storage-backend
//! traits the repositories are written against, the attribute-item codec
//! used by the table store, and the pure derived-view functions.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod item;
pub mod logging;
pub mod merge;
pub mod models;
pub mod seed;
pub mod traits;
pub mod view;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{validate_upload, ValidationResult};
pub use item::{
    note_from_item, note_to_item, parse_timestamp, subject_from_item, subject_to_item, AttrValue,
    Item, RecordStatus,
};
pub use merge::{dedup_by_id, merge_notes, merge_subjects};
pub use models::{FileType, NewSubject, Note, NoteDraft, SortMode, Subject};
pub use seed::{seed_notes, seed_subjects};
pub use traits::{
    FunctionInvoker, NoteRepository, ObjectStore, SubjectDirectory, TableStore,
};
pub use view::{filter_notes, format_byte_size, sort_notes, with_subject_name};
