//! Upload validation: file type allowlist and size limit.
//!
//! Validation runs entirely in memory, before any storage-backend call.
//! Layers:
//! 1. Size limit
//! 2. Extension allowlist (pdf, txt)
//! 3. Claimed content-type allowlist
//! 4. Magic-byte check for PDFs (claimed PDF must look like one)

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::models::FileType;

/// File extensions accepted for upload (case-insensitive).
static ALLOWED_EXTENSIONS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["pdf", "txt"].into_iter().collect());

/// Result of upload validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub allowed: bool,
    pub block_reason: Option<String>,
    pub detected_type: Option<String>,
}

impl ValidationResult {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            block_reason: None,
            detected_type: None,
        }
    }

    pub fn blocked(reason: impl Into<String>, detected: impl Into<String>) -> Self {
        Self {
            allowed: false,
            block_reason: Some(reason.into()),
            detected_type: Some(detected.into()),
        }
    }
}

/// Validate an upload against the size limit and the pdf/txt allowlist.
pub fn validate_upload(
    file_name: &str,
    claimed_type: &str,
    data: &[u8],
    max_size_bytes: u64,
) -> ValidationResult {
    if data.len() as u64 > max_size_bytes {
        return ValidationResult::blocked(
            format!("File exceeds maximum size of {} bytes", max_size_bytes),
            "oversized",
        );
    }

    let ext = file_name.rsplit('.').next().unwrap_or_default().to_lowercase();
    if !ALLOWED_EXTENSIONS.contains(ext.as_str()) {
        return ValidationResult::blocked(
            "Only PDF and TXT files are allowed",
            format!("extension:{ext}"),
        );
    }

    let file_type = match FileType::from_content_type(claimed_type) {
        Some(t) => t,
        None => {
            return ValidationResult::blocked(
                "Only PDF and TXT files are allowed",
                format!("content_type:{claimed_type}"),
            );
        }
    };

    // A claimed PDF must carry PDF magic bytes; text files have none.
    if file_type == FileType::Pdf {
        let detected = infer::get(data).map(|kind| kind.mime_type());
        if detected != Some("application/pdf") {
            return ValidationResult::blocked(
                "File content does not match the claimed PDF type",
                detected.unwrap_or("unknown").to_string(),
            );
        }
    }

    ValidationResult::allowed()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_HEADER: &[u8] = b"%PDF-1.4\n%stub";

    #[test]
    fn test_valid_pdf_allowed() {
        let result = validate_upload("lecture.pdf", "application/pdf", PDF_HEADER, 1024);
        assert!(result.allowed);
    }

    #[test]
    fn test_valid_txt_allowed() {
        let result = validate_upload("notes.txt", "text/plain", b"plain text", 1024);
        assert!(result.allowed);
    }

    #[test]
    fn test_oversized_blocked() {
        let result = validate_upload("notes.txt", "text/plain", b"12345", 4);
        assert!(!result.allowed);
        assert_eq!(result.detected_type.as_deref(), Some("oversized"));
    }

    #[test]
    fn test_disallowed_extension_blocked() {
        let result = validate_upload("malware.exe", "text/plain", b"MZ", 1024);
        assert!(!result.allowed);
    }

    #[test]
    fn test_disallowed_content_type_blocked() {
        let result = validate_upload("image.pdf", "image/png", PDF_HEADER, 1024);
        assert!(!result.allowed);
    }

    #[test]
    fn test_fake_pdf_blocked() {
        let result = validate_upload("fake.pdf", "application/pdf", b"just text", 1024);
        assert!(!result.allowed);
    }

    #[test]
    fn test_empty_txt_is_legal() {
        let result = validate_upload("empty.txt", "text/plain", b"", 1024);
        assert!(result.allowed);
    }
}
