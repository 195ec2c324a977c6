// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! File upload validation.
//!
//! Extensions are checked against a fixed deny-list before the category's
//! allow-list, so an executable extension is rejected with the security
//! message even if some allow-list happened to contain it.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_FILE_SIZE_BYTES;
use crate::error::{ValidationError, ValidationResult};
use crate::security::sanitize::{FORBIDDEN_FILE_NAME_CHARS, MAX_FILE_NAME_LENGTH};
use crate::security::threat::detect_path_traversal;

/// Executable and script extensions that are never accepted.
pub const DANGEROUS_EXTENSIONS: &[&str] = &[
    "exe", "bat", "cmd", "com", "pif", "scr", "vbs", "js", "jar", "app", "deb", "rpm", "dmg",
    "pkg", "sh", "ps1", "msi", "dll",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt"];
const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "tar", "gz"];
const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xlsx", "csv", "ods"];

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Upload categories, each with its own allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Images,
    Documents,
    Archives,
    Spreadsheets,
}

impl FileCategory {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Images => IMAGE_EXTENSIONS,
            Self::Documents => DOCUMENT_EXTENSIONS,
            Self::Archives => ARCHIVE_EXTENSIONS,
            Self::Spreadsheets => SPREADSHEET_EXTENSIONS,
        }
    }
}

/// Lowercased suffix after the last `.`, if there is one.
fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Check the extension: deny-list first, then the category's allow-list.
pub fn validate_file_extension(name: &str, category: FileCategory) -> ValidationResult {
    let Some(ext) = extension_of(name) else {
        return ValidationResult::fail(ValidationError::MissingExtension);
    };

    if DANGEROUS_EXTENSIONS.contains(&ext.as_str()) {
        tracing::warn!(
            target: "security::upload",
            event = "DANGEROUS_EXTENSION",
            ext = %ext,
            "Rejected dangerous file extension"
        );
        return ValidationResult::fail(ValidationError::DangerousExtension { ext });
    }

    let allowed = category.allowed_extensions();
    if !allowed.contains(&ext.as_str()) {
        return ValidationResult::fail(ValidationError::ExtensionNotAllowed {
            ext,
            allowed: allowed.join(", "),
        });
    }

    ValidationResult::ok()
}

/// Check a size in bytes against `max_bytes`.
///
/// Takes `f64` because sizes arrive from the UI layer as JS numbers; NaN,
/// infinities and negatives are rejected as invalid.
pub fn validate_file_size(size: f64, max_bytes: u64) -> ValidationResult {
    if !size.is_finite() || size < 0.0 {
        return ValidationResult::fail(ValidationError::InvalidSize);
    }
    if size > max_bytes as f64 {
        return ValidationResult::fail(ValidationError::TooLarge {
            max_mb: max_bytes / BYTES_PER_MB,
        });
    }
    ValidationResult::ok()
}

/// [`validate_file_size`] with the default 10 MiB limit.
pub fn validate_file_size_default(size: f64) -> ValidationResult {
    validate_file_size(size, DEFAULT_MAX_FILE_SIZE_BYTES)
}

/// Reject traversal sequences, null bytes, reserved characters and
/// over-long names.
pub fn validate_file_name(name: &str) -> ValidationResult {
    if name.is_empty() {
        return ValidationResult::fail(ValidationError::Empty);
    }
    if !detect_path_traversal(name).is_valid {
        return ValidationResult::fail(ValidationError::PathTraversal);
    }
    if name.contains('\0') {
        return ValidationResult::fail(ValidationError::NullByte);
    }
    if name.contains(FORBIDDEN_FILE_NAME_CHARS) {
        return ValidationResult::fail(ValidationError::ForbiddenCharacters);
    }
    if name.chars().count() > MAX_FILE_NAME_LENGTH {
        return ValidationResult::fail(ValidationError::TooLong {
            max: MAX_FILE_NAME_LENGTH,
        });
    }
    ValidationResult::ok()
}

/// Name, then extension, then size. Returns the first failure.
pub fn validate_file(name: &str, size: f64, category: FileCategory, max_bytes: u64) -> ValidationResult {
    validate_file_name(name)
        .and_then(|| validate_file_extension(name, category))
        .and_then(|| validate_file_size(size, max_bytes))
}

// ============================================================================
// TESTS
// ============================================================================
