//! Attribute-value item codec for the table store.
//!
//! Table records travel as maps of tagged attribute values: strings under
//! `S`, numbers string-encoded under `N`, booleans under `BOOL`, lists
//! under `L`. Timestamps are ISO-8601 strings and are parsed back into
//! `DateTime<Utc>` before any comparison happens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::{FileType, Note, Subject};

/// A single tagged attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "L")]
    L(Vec<AttrValue>),
    #[serde(rename = "NULL")]
    Null(bool),
}

impl AttrValue {
    /// String attribute from anything stringly.
    pub fn s(v: impl Into<String>) -> Self {
        AttrValue::S(v.into())
    }

    /// Number attribute, string-encoded.
    pub fn n(v: impl ToString) -> Self {
        AttrValue::N(v.to_string())
    }

    /// List-of-strings attribute.
    pub fn string_list<I, T>(vals: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        AttrValue::L(vals.into_iter().map(|v| AttrValue::S(v.into())).collect())
    }
}

/// A table record: attribute name → tagged value.
pub type Item = BTreeMap<String, AttrValue>;

/// Lifecycle marker carried on note records.
///
/// `Pending` records exist while a create's blob upload is still in
/// flight; `Tombstone` records exist while a delete is tearing down the
/// blob and metadata. Readers skip both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Active,
    Pending,
    Tombstone,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Pending => "pending",
            RecordStatus::Tombstone => "tombstone",
        }
    }

    /// Records without a status attribute are treated as active; they may
    /// have been written by tooling that predates the marker.
    pub fn of(item: &Item) -> RecordStatus {
        match item.get("recordStatus") {
            Some(AttrValue::S(s)) if s == "pending" => RecordStatus::Pending,
            Some(AttrValue::S(s)) if s == "tombstone" => RecordStatus::Tombstone,
            _ => RecordStatus::Active,
        }
    }
}

// ─── Typed accessors ───────────────────────────────────────────────────────

fn req_s(item: &Item, name: &str) -> Result<String> {
    match item.get(name) {
        Some(AttrValue::S(s)) => Ok(s.clone()),
        _ => Err(Error::Serialization(format!(
            "missing string attribute: {name}"
        ))),
    }
}

fn opt_s(item: &Item, name: &str) -> Option<String> {
    match item.get(name) {
        Some(AttrValue::S(s)) => Some(s.clone()),
        _ => None,
    }
}

fn req_n_u64(item: &Item, name: &str) -> Result<u64> {
    match item.get(name) {
        Some(AttrValue::N(n)) => n
            .parse::<u64>()
            .map_err(|_| Error::Serialization(format!("bad number in attribute {name}: {n}"))),
        _ => Err(Error::Serialization(format!(
            "missing number attribute: {name}"
        ))),
    }
}

fn opt_n_i64(item: &Item, name: &str) -> Option<i64> {
    match item.get(name) {
        Some(AttrValue::N(n)) => n.parse::<i64>().ok(),
        _ => None,
    }
}

fn opt_bool(item: &Item, name: &str) -> Option<bool> {
    match item.get(name) {
        Some(AttrValue::Bool(b)) => Some(*b),
        _ => None,
    }
}

fn opt_string_list(item: &Item, name: &str) -> Option<Vec<String>> {
    match item.get(name) {
        Some(AttrValue::L(vals)) => Some(
            vals.iter()
                .filter_map(|v| match v {
                    AttrValue::S(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    }
}

fn req_timestamp(item: &Item, name: &str) -> Result<DateTime<Utc>> {
    let raw = req_s(item, name)?;
    parse_timestamp(&raw)
        .ok_or_else(|| Error::Serialization(format!("bad timestamp in attribute {name}: {raw}")))
}

fn opt_timestamp(item: &Item, name: &str) -> Option<DateTime<Utc>> {
    opt_s(item, name).and_then(|raw| parse_timestamp(&raw))
}

/// Parse an ISO-8601 timestamp into the shared in-memory representation.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

// ─── Note codec ────────────────────────────────────────────────────────────

/// Encode a note into a table record with the given lifecycle status.
pub fn note_to_item(note: &Note, status: RecordStatus) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttrValue::s(&note.id));
    item.insert("title".into(), AttrValue::s(&note.title));
    item.insert("fileName".into(), AttrValue::s(&note.file_name));
    item.insert("fileType".into(), AttrValue::s(note.file_type.as_str()));
    item.insert("subjectId".into(), AttrValue::s(&note.subject_id));
    if let Some(name) = &note.subject_name {
        item.insert("subjectName".into(), AttrValue::s(name));
    }
    item.insert("fileSize".into(), AttrValue::n(note.file_size));
    item.insert(
        "uploadDate".into(),
        AttrValue::s(note.upload_date.to_rfc3339()),
    );
    if let Some(ts) = note.last_access_date {
        item.insert("lastAccessDate".into(), AttrValue::s(ts.to_rfc3339()));
    }
    if let Some(tags) = &note.tags {
        item.insert("tags".into(), AttrValue::string_list(tags.clone()));
    }
    item.insert("isShared".into(), AttrValue::Bool(note.is_shared));
    if let Some(recipients) = &note.shared_with {
        item.insert(
            "sharedWith".into(),
            AttrValue::string_list(recipients.clone()),
        );
    }
    item.insert("fileKey".into(), AttrValue::s(&note.file_key));
    if let Some(content) = &note.content {
        item.insert("content".into(), AttrValue::s(content));
    }
    item.insert("version".into(), AttrValue::n(note.version));
    item.insert("recordStatus".into(), AttrValue::s(status.as_str()));
    item
}

/// Decode a table record into a note, mapping absent optionals to absence
/// and string-encoded numbers/timestamps into typed fields.
pub fn note_from_item(item: &Item) -> Result<Note> {
    let file_type: FileType = req_s(item, "fileType")?.parse()?;
    Ok(Note {
        id: req_s(item, "id")?,
        title: req_s(item, "title")?,
        file_name: req_s(item, "fileName")?,
        file_type,
        subject_id: req_s(item, "subjectId")?,
        subject_name: opt_s(item, "subjectName"),
        file_size: req_n_u64(item, "fileSize")?,
        upload_date: req_timestamp(item, "uploadDate")?,
        last_access_date: opt_timestamp(item, "lastAccessDate"),
        tags: opt_string_list(item, "tags"),
        is_shared: opt_bool(item, "isShared").unwrap_or(false),
        shared_with: opt_string_list(item, "sharedWith"),
        file_key: req_s(item, "fileKey")?,
        content: opt_s(item, "content"),
        version: opt_n_i64(item, "version").unwrap_or(0),
    })
}

// ─── Subject codec ─────────────────────────────────────────────────────────

/// Encode a subject. The derived `note_count` is intentionally not stored.
pub fn subject_to_item(subject: &Subject) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttrValue::s(&subject.id));
    item.insert("name".into(), AttrValue::s(&subject.name));
    if let Some(color) = &subject.color {
        item.insert("color".into(), AttrValue::s(color));
    }
    if let Some(desc) = &subject.description {
        item.insert("description".into(), AttrValue::s(desc));
    }
    item
}

pub fn subject_from_item(item: &Item) -> Result<Subject> {
    Ok(Subject {
        id: req_s(item, "id")?,
        name: req_s(item, "name")?,
        color: opt_s(item, "color"),
        description: opt_s(item, "description"),
        note_count: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_note() -> Note {
        Note {
            id: "9".into(),
            title: "Linear Algebra".into(),
            file_name: "linalg.pdf".into(),
            file_type: FileType::Pdf,
            subject_id: "1".into(),
            subject_name: Some("Mathematics".into()),
            file_size: 2048,
            upload_date: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            last_access_date: None,
            tags: Some(vec!["matrices".into(), "vectors".into()]),
            is_shared: true,
            shared_with: Some(vec!["a@example.com".into()]),
            file_key: "notes/9/linalg.pdf".into(),
            content: None,
            version: 3,
        }
    }

    #[test]
    fn test_note_roundtrip() {
        let note = sample_note();
        let item = note_to_item(&note, RecordStatus::Active);
        let decoded = note_from_item(&item).unwrap();
        assert_eq!(decoded, note);
        assert_eq!(RecordStatus::of(&item), RecordStatus::Active);
    }

    #[test]
    fn test_numbers_are_string_encoded() {
        let item = note_to_item(&sample_note(), RecordStatus::Active);
        assert_eq!(item.get("fileSize"), Some(&AttrValue::N("2048".into())));
        assert_eq!(item.get("version"), Some(&AttrValue::N("3".into())));
    }

    #[test]
    fn test_absent_optionals_decode_to_none() {
        let mut item = note_to_item(&sample_note(), RecordStatus::Active);
        item.remove("tags");
        item.remove("sharedWith");
        item.remove("subjectName");
        item.remove("isShared");
        item.remove("version");
        let decoded = note_from_item(&item).unwrap();
        assert_eq!(decoded.tags, None);
        assert_eq!(decoded.shared_with, None);
        assert_eq!(decoded.subject_name, None);
        assert!(!decoded.is_shared);
        assert_eq!(decoded.version, 0);
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let mut item = note_to_item(&sample_note(), RecordStatus::Active);
        item.insert("uploadDate".into(), AttrValue::s("yesterday"));
        assert!(matches!(
            note_from_item(&item),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_status_markers() {
        let item = note_to_item(&sample_note(), RecordStatus::Pending);
        assert_eq!(RecordStatus::of(&item), RecordStatus::Pending);
        let item = note_to_item(&sample_note(), RecordStatus::Tombstone);
        assert_eq!(RecordStatus::of(&item), RecordStatus::Tombstone);
    }

    #[test]
    fn test_tagged_json_shape() {
        let json = serde_json::to_value(AttrValue::n(42)).unwrap();
        assert_eq!(json, serde_json::json!({"N": "42"}));
        let json = serde_json::to_value(AttrValue::Bool(true)).unwrap();
        assert_eq!(json, serde_json::json!({"BOOL": true}));
    }

    #[test]
    fn test_subject_roundtrip_drops_note_count() {
        let subject = Subject {
            id: "4".into(),
            name: "History".into(),
            color: Some("#DC2626".into()),
            description: None,
            note_count: Some(2),
        };
        let decoded = subject_from_item(&subject_to_item(&subject)).unwrap();
        assert_eq!(decoded.note_count, None);
        assert_eq!(decoded.name, "History");
    }
}
