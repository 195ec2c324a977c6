// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for lendguard.
//!
//! Two families live here:
//!
//! - [`ConfigError`] is returned as `Err` for malformed configuration. It is
//!   a programmer/deployment error, not user input.
//! - [`ValidationError`] is the typed reason behind a failed input check.
//!   Validators never return it as `Err`; they wrap it in a
//!   [`ValidationResult`] so callers treat bad input as data.
//!
//! Access denials are not errors at all; see
//! [`AccessDecision`](crate::security::authorization::AccessDecision).

use serde::Serialize;
use thiserror::Error;

/// Malformed configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse security configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Session timeout must be greater than zero")]
    ZeroSessionTimeout,

    #[error("Session timeout ({timeout_secs}s) exceeds the maximum of {max_secs}s")]
    SessionTimeoutTooLong { timeout_secs: u64, max_secs: u64 },

    #[error("Warning threshold ({warning_secs}s) must be shorter than the session timeout ({timeout_secs}s)")]
    WarningNotBeforeTimeout { warning_secs: u64, timeout_secs: u64 },

    #[error("Rate limit {0} must be greater than zero")]
    ZeroRateLimit(&'static str),

    #[error("Rate limit window ({window_ms}ms) exceeds the maximum of {max_ms}ms")]
    RateWindowTooLong { window_ms: u64, max_ms: u64 },

    #[error("Maximum upload size must be greater than zero")]
    ZeroUploadLimit,

    #[error("Maximum text length must be greater than zero")]
    ZeroTextLength,

    #[error("Admin role tag must not be empty")]
    EmptyAdminRole,
}

/// Why an input was rejected. The `Display` text is safe to show users.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Value is required")]
    Empty,

    #[error("Value exceeds maximum length of {max} characters")]
    TooLong { max: usize },

    #[error("File name contains invalid characters")]
    ForbiddenCharacters,

    #[error("File name contains null bytes")]
    NullByte,

    #[error("File name contains path traversal sequences")]
    PathTraversal,

    #[error("File type .{ext} is not allowed for security reasons")]
    DangerousExtension { ext: String },

    #[error("File type .{ext} is not allowed. Allowed types: {allowed}")]
    ExtensionNotAllowed { ext: String, allowed: String },

    #[error("File has no extension")]
    MissingExtension,

    #[error("Invalid file size")]
    InvalidSize,

    #[error("File size exceeds maximum of {max_mb}MB")]
    TooLarge { max_mb: u64 },

    #[error("Input rejected: {}", .categories.join(", "))]
    ThreatDetected { categories: Vec<String> },
}

/// The `{isValid, error}` shape returned by every validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<ValidationError>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn fail(error: ValidationError) -> Self {
        Self {
            is_valid: false,
            error: Some(error),
        }
    }

    /// User-facing message for the failure, if any.
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Chain another check, keeping the first failure.
    pub fn and_then(self, next: impl FnOnce() -> ValidationResult) -> ValidationResult {
        if self.is_valid {
            next()
        } else {
            self
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::fail(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_result_ok() {
        let result = ValidationResult::ok();
        assert!(result.is_valid);
        assert!(result.message().is_none());
    }

    #[test]
    fn test_validation_result_chain_keeps_first_failure() {
        let result = ValidationResult::fail(ValidationError::NullByte)
            .and_then(|| ValidationResult::fail(ValidationError::InvalidSize));
        assert_eq!(result.error, Some(ValidationError::NullByte));
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::TooLarge { max_mb: 10 };
        assert_eq!(err.to_string(), "File size exceeds maximum of 10MB");

        let err = ValidationError::ThreatDetected {
            categories: vec!["sql_injection".into(), "xss".into()],
        };
        assert_eq!(err.to_string(), "Input rejected: sql_injection, xss");
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::WarningNotBeforeTimeout {
            warning_secs: 600,
            timeout_secs: 300,
        };
        assert!(err.to_string().contains("600s"));
    }
}
