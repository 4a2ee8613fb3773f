//! Centralized default constants for the studynotes system.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// STORAGE NAMES
// =============================================================================

/// Fixed bucket name for uploaded note blobs.
pub const BUCKET: &str = "student-notes-bucket";

/// Logical table holding note metadata records. Primary key: note id.
pub const NOTES_TABLE: &str = "Notes";

/// Logical table holding subject records. Primary key: subject id.
pub const SUBJECTS_TABLE: &str = "Subjects";

/// Secondary index on the notes table, keyed by subject id.
pub const SUBJECT_INDEX: &str = "SubjectIndex";

/// Attribute the subject index is keyed on.
pub const SUBJECT_INDEX_KEY: &str = "subjectId";

/// Registered name of the mock search function.
pub const SEARCH_FUNCTION: &str = "search-notes";

// =============================================================================
// UPLOAD LIMITS
// =============================================================================

/// Maximum accepted upload size in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

// =============================================================================
// PRESENTATION
// =============================================================================

/// Placeholder subject name when a note's subject id resolves to nothing.
pub const UNKNOWN_SUBJECT: &str = "Unknown Subject";

/// Default slice size for recent-notes listings.
pub const RECENT_LIMIT: usize = 5;

// =============================================================================
// CONCURRENCY
// =============================================================================

/// Bounded retry count for the mark-shared compare-and-swap loop.
pub const MARK_SHARED_MAX_RETRIES: u32 = 4;

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Default base endpoint blobs are addressed under
/// (`{endpoint}/{bucket}/{key}`).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4566";

/// Default bind address for the HTTP API.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
