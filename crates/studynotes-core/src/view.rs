//! Derived view builder: presentation-only fields computed at read time.
//!
//! Everything here is a pure function over already-fetched records; none of
//! it touches the storage backend or mutates its input.

use crate::defaults::UNKNOWN_SUBJECT;
use crate::models::{FileType, Note, SortMode, Subject};

/// Return a copy of `note` with `subject_name` resolved against the given
/// subjects, falling back to the placeholder when no subject matches.
pub fn with_subject_name(note: &Note, subjects: &[Subject]) -> Note {
    let name = subjects
        .iter()
        .find(|s| s.id == note.subject_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| UNKNOWN_SUBJECT.to_string());
    Note {
        subject_name: Some(name),
        ..note.clone()
    }
}

/// Sort notes by the given mode. Stable: equal keys keep their input order.
pub fn sort_notes(notes: &[Note], mode: SortMode) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    match mode {
        SortMode::NewestFirst => sorted.sort_by(|a, b| b.upload_date.cmp(&a.upload_date)),
        SortMode::OldestFirst => sorted.sort_by(|a, b| a.upload_date.cmp(&b.upload_date)),
        SortMode::Title => {
            sorted.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        }
    }
    sorted
}

/// Keep notes matching both filters; an absent filter passes everything.
pub fn filter_notes(
    notes: &[Note],
    subject_id: Option<&str>,
    file_type: Option<FileType>,
) -> Vec<Note> {
    notes
        .iter()
        .filter(|n| subject_id.map_or(true, |s| n.subject_id == s))
        .filter(|n| file_type.map_or(true, |t| n.file_type == t))
        .cloned()
        .collect()
}

/// Format a byte count as a human string with base-1024 units.
///
/// Values above Bytes are rounded to two decimals with trailing zeros
/// trimmed: 1024 → "1 KB", 1536 → "1.5 KB". Zero is the literal "0 Bytes".
pub fn format_byte_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exponent = (bytes.ilog2() / 10).min(UNITS.len() as u32 - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent as usize])
}
