//! Data model for notes and subjects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// File type of an uploaded note. Only PDF and plain text are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
}

impl FileType {
    /// Canonical lowercase name as stored in metadata records.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Txt => "txt",
        }
    }

    /// MIME type for blob uploads.
    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Txt => "text/plain",
        }
    }

    /// Map a claimed MIME type to a file type, if allowed.
    pub fn from_content_type(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(FileType::Pdf),
            "text/plain" => Some(FileType::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(FileType::Pdf),
            "txt" => Ok(FileType::Txt),
            other => Err(Error::InvalidInput(format!("unknown file type: {other}"))),
        }
    }
}

/// A user-uploaded file plus its metadata record.
///
/// `subject_name` is a derived field joined on at read time and may be
/// stale relative to the Subject Directory. `version` is the counter the
/// mark-shared compare-and-swap is conditioned on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub file_type: FileType,
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_access_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub is_shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_with: Option<Vec<String>>,
    pub file_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub version: i64,
}

impl Note {
    /// Deterministic blob key for a note: `notes/{id}/{file_name}`.
    pub fn file_key_for(id: &str, file_name: &str) -> String {
        format!("notes/{id}/{file_name}")
    }

    /// True when `query` matches the title or any tag, case-insensitively.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if self.title.to_lowercase().contains(&needle) {
            return true;
        }
        self.tags
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// Metadata supplied by the uploader. Id, upload date, blob key, and size
/// are allocated by the repository at create time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub file_name: String,
    pub file_type: FileType,
    pub subject_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A user-defined category grouping notes.
///
/// `note_count` is derived by scanning notes and is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_count: Option<i64>,
}

/// Input for creating a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Sort modes for note listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    NewestFirst,
    OldestFirst,
    Title,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_roundtrip() {
        assert_eq!("pdf".parse::<FileType>().unwrap(), FileType::Pdf);
        assert_eq!("txt".parse::<FileType>().unwrap(), FileType::Txt);
        assert!("doc".parse::<FileType>().is_err());
        assert_eq!(FileType::Pdf.to_string(), "pdf");
    }

    #[test]
    fn test_file_type_from_content_type() {
        assert_eq!(
            FileType::from_content_type("application/pdf"),
            Some(FileType::Pdf)
        );
        assert_eq!(FileType::from_content_type("text/plain"), Some(FileType::Txt));
        assert_eq!(FileType::from_content_type("image/png"), None);
    }

    #[test]
    fn test_file_key_for() {
        assert_eq!(
            Note::file_key_for("7", "calculus.pdf"),
            "notes/7/calculus.pdf"
        );
    }

    #[test]
    fn test_matches_title_and_tags() {
        let note = Note {
            id: "1".into(),
            title: "Calculus Lecture 1".into(),
            file_name: "calculus.pdf".into(),
            file_type: FileType::Pdf,
            subject_id: "1".into(),
            subject_name: None,
            file_size: 10,
            upload_date: Utc::now(),
            last_access_date: None,
            tags: Some(vec!["derivatives".into()]),
            is_shared: false,
            shared_with: None,
            file_key: "notes/1/calculus.pdf".into(),
            content: None,
            version: 0,
        };
        assert!(note.matches("CALCULUS"));
        assert!(note.matches("deriv"));
        assert!(!note.matches("physics"));
    }

    #[test]
    fn test_note_serde_camel_case() {
        let json = serde_json::json!({
            "id": "1",
            "title": "T",
            "fileName": "t.txt",
            "fileType": "txt",
            "subjectId": "3",
            "fileSize": 5,
            "uploadDate": "2025-05-05T00:00:00Z",
            "isShared": false,
            "fileKey": "notes/1/t.txt"
        });
        let note: Note = serde_json::from_value(json).unwrap();
        assert_eq!(note.file_name, "t.txt");
        assert_eq!(note.version, 0);
    }
}
