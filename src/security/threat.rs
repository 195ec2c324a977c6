// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Pattern-based threat detection.
//!
//! Flags injection-style payloads so callers can reject input before it is
//! sanitized or sent anywhere. Detection never modifies the input.
//!
//! A lone single quote counts as a SQL-injection marker, so a surname like
//! `O'Brien` is flagged. A clean scan is advisory; the server remains the
//! authority.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::audit::{SecurityEventKind, SecurityLog};
use crate::error::{ValidationError, ValidationResult};

/// SQL-injection markers: quotes, comment sequences, statements chained
/// after `;`, tautologies and `UNION` selects.
/// JUSTIFICATION for .expect(): static patterns, validated by the tests below.
static SQL_INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)'|%27").expect("SQL quote regex is valid"),
        Regex::new(r"(?i)--|/\*|\*/|%2d%2d").expect("SQL comment regex is valid"),
        Regex::new(r"(?i);\s*(?:select|insert|update|delete|drop|create|alter|truncate|exec|execute|union)\b")
            .expect("SQL chained statement regex is valid"),
        Regex::new(r"(?i)\b(?:or|and)\s+(\d+)\s*=\s*\d+").expect("SQL numeric tautology regex is valid"),
        Regex::new(r#"(?i)\b(?:or|and)\s+["'][^"']*["']\s*=\s*["']"#)
            .expect("SQL string tautology regex is valid"),
        Regex::new(r"(?i)\bunion\b(?:\s+all)?\s*(?:/\*.*?\*/)?\s*\bselect\b")
            .expect("SQL union regex is valid"),
        Regex::new(r"(?i)\bexec(?:\s|\+)+(?:s|x)p\w+").expect("SQL stored procedure regex is valid"),
    ]
});

/// XSS markers: script tags, script URLs, inline handlers, embedding tags
/// and CSS `expression()`.
static XSS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?is)<\s*script\b[^>]*>.*?<\s*/\s*script\s*>").expect("Script block regex is valid"),
        Regex::new(r"(?i)<\s*/?\s*script\b").expect("Script tag regex is valid"),
        Regex::new(r"(?i)javascript\s*:").expect("javascript: regex is valid"),
        Regex::new(r"(?i)vbscript\s*:").expect("vbscript: regex is valid"),
        Regex::new(r"(?i)\bon[a-z]+\s*=").expect("Event handler regex is valid"),
        Regex::new(r"(?i)<\s*(?:iframe|embed|object)\b").expect("Embedding tag regex is valid"),
        Regex::new(r"(?i)expression\s*\(").expect("CSS expression regex is valid"),
    ]
});

/// Path traversal: `../`, `..\` and their URL-encoded forms.
static PATH_TRAVERSAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\.\./|\.\.\\").expect("Traversal regex is valid"),
        Regex::new(r"(?i)(?:\.\.|%2e%2e|%2e\.|\.%2e)(?:/|\\|%2f|%5c)").expect("Encoded traversal regex is valid"),
        Regex::new(r"(?i)%252e%252e").expect("Double-encoded traversal regex is valid"),
    ]
});

/// Shell metacharacters.
static COMMAND_INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![Regex::new(r"[;&|`$()]").expect("Shell metacharacter regex is valid")]
});

/// A class of injection payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatCategory {
    SqlInjection,
    Xss,
    PathTraversal,
    CommandInjection,
}

impl ThreatCategory {
    /// All categories in scan order.
    pub const ALL: [ThreatCategory; 4] = [
        ThreatCategory::SqlInjection,
        ThreatCategory::Xss,
        ThreatCategory::PathTraversal,
        ThreatCategory::CommandInjection,
    ];

    /// Stable machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SqlInjection => "sql_injection",
            Self::Xss => "xss",
            Self::PathTraversal => "path_traversal",
            Self::CommandInjection => "command_injection",
        }
    }

    /// Human-readable message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::SqlInjection => "Potential SQL injection detected",
            Self::Xss => "Potential XSS attack detected",
            Self::PathTraversal => "Path traversal attempt detected",
            Self::CommandInjection => "Potential command injection detected",
        }
    }

    fn patterns(&self) -> &'static [Regex] {
        match self {
            Self::SqlInjection => &SQL_INJECTION_PATTERNS,
            Self::Xss => &XSS_PATTERNS,
            Self::PathTraversal => &PATH_TRAVERSAL_PATTERNS,
            Self::CommandInjection => &COMMAND_INJECTION_PATTERNS,
        }
    }

    /// Whether `input` matches any marker of this category.
    pub fn matches(&self, input: &str) -> bool {
        self.patterns().iter().any(|p| p.is_match(input))
    }
}

impl fmt::Display for ThreatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of checking one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub is_valid: bool,
    pub threat: Option<ThreatCategory>,
}

/// Result of checking every category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreatScanResult {
    pub is_valid: bool,
    /// Matched categories in scan order: SQL, XSS, path, command
    pub threats: Vec<ThreatCategory>,
}

impl ThreatScanResult {
    pub fn contains(&self, category: ThreatCategory) -> bool {
        self.threats.contains(&category)
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.threats.iter().map(ThreatCategory::label).collect()
    }

    pub fn messages(&self) -> Vec<&'static str> {
        self.threats.iter().map(ThreatCategory::message).collect()
    }
}

/// Check one category.
pub fn detect(category: ThreatCategory, input: &str) -> Detection {
    if category.matches(input) {
        Detection {
            is_valid: false,
            threat: Some(category),
        }
    } else {
        Detection {
            is_valid: true,
            threat: None,
        }
    }
}

pub fn detect_sql_injection(input: &str) -> Detection {
    detect(ThreatCategory::SqlInjection, input)
}

pub fn detect_xss(input: &str) -> Detection {
    detect(ThreatCategory::Xss, input)
}

pub fn detect_path_traversal(input: &str) -> Detection {
    detect(ThreatCategory::PathTraversal, input)
}

pub fn detect_command_injection(input: &str) -> Detection {
    detect(ThreatCategory::CommandInjection, input)
}

/// Run every detector.
///
/// ```
/// use lendguard::security::threat::{scan_input, ThreatCategory};
///
/// let result = scan_input("../../etc/passwd");
/// assert!(!result.is_valid);
/// assert!(result.contains(ThreatCategory::PathTraversal));
/// assert!(scan_input("hello world").threats.is_empty());
/// ```
pub fn scan_input(input: &str) -> ThreatScanResult {
    let threats: Vec<ThreatCategory> = ThreatCategory::ALL
        .into_iter()
        .filter(|c| c.matches(input))
        .collect();

    if !threats.is_empty() {
        tracing::debug!(
            target: "security::threat",
            event = "THREAT_MATCH",
            categories = ?threats,
            "Input matched threat patterns"
        );
    }

    ThreatScanResult {
        is_valid: threats.is_empty(),
        threats,
    }
}

/// Scan and record any hit in the security log.
pub fn scan_input_logged(input: &str, log: &SecurityLog, user_id: Option<&str>) -> ThreatScanResult {
    let result = scan_input(input);
    if !result.is_valid {
        log.record(
            SecurityEventKind::ThreatDetected,
            user_id,
            format!("categories={}", result.labels().join(",")),
        );
    }
    result
}

/// Scan and convert a hit into a validation failure.
pub fn validate_input(input: &str) -> ValidationResult {
    let result = scan_input(input);
    if result.is_valid {
        ValidationResult::ok()
    } else {
        ValidationResult::fail(ValidationError::ThreatDetected {
            categories: result.labels().into_iter().map(String::from).collect(),
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        for category in ThreatCategory::ALL {
            assert!(!category.patterns().is_empty());
        }
    }

    #[test]
    fn test_sql_tautology() {
        let result = scan_input("' OR 1=1 --");
        assert!(result.contains(ThreatCategory::SqlInjection));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_sql_markers() {
        assert!(!detect_sql_injection("1; DROP TABLE applications").is_valid);
        assert!(!detect_sql_injection("x UNION ALL SELECT password FROM users").is_valid);
        assert!(!detect_sql_injection("admin/*").is_valid);
        assert!(!detect_sql_injection("name%27").is_valid);
        assert!(!detect_sql_injection("admin%2D%2D").is_valid);
        assert!(!detect_sql_injection("admin%2d%2d").is_valid);
        assert!(detect_sql_injection("union station").is_valid);
    }

    #[test]
    fn test_single_quote_is_flagged() {
        // Heuristic false positive kept intentionally
        let detection = detect_sql_injection("O'Brien");
        assert_eq!(detection.threat, Some(ThreatCategory::SqlInjection));
    }

    #[test]
    fn test_xss_markers() {
        assert!(scan_input("<script>alert(1)</script>").contains(ThreatCategory::Xss));
        assert!(!detect_xss("javascript:alert(1)").is_valid);
        assert!(!detect_xss("<img src=x onerror=alert(1)>").is_valid);
        assert!(!detect_xss("<IFRAME src=evil>").is_valid);
        assert!(!detect_xss("VBScript:msgbox").is_valid);
        assert!(!detect_xss("width: expression(alert(1))").is_valid);
        assert!(detect_xss("plain text").is_valid);
    }

    #[test]
    fn test_path_traversal_markers() {
        assert!(scan_input("../../etc/passwd").contains(ThreatCategory::PathTraversal));
        assert!(!detect_path_traversal(r"..\windows\system32").is_valid);
        assert!(!detect_path_traversal("%2e%2e%2fetc").is_valid);
        assert!(!detect_path_traversal("..%2Fsecret").is_valid);
        assert!(detect_path_traversal("report.v2..final").is_valid);
    }

    #[test]
    fn test_command_injection_markers() {
        for payload in ["a; rm", "a && b", "a | b", "`id`", "$(id)", "$HOME"] {
            assert!(!detect_command_injection(payload).is_valid, "{payload}");
        }
    }

    #[test]
    fn test_clean_input() {
        let result = scan_input("hello world");
        assert!(result.is_valid);
        assert!(result.threats.is_empty());
    }

    #[test]
    fn test_scan_order_and_messages() {
        let result = scan_input("'; <script>x</script> ../ $(id)");
        assert_eq!(result.threats, ThreatCategory::ALL.to_vec());
        assert_eq!(result.messages()[0], "Potential SQL injection detected");
        assert_eq!(result.labels()[3], "command_injection");
    }

    #[test]
    fn test_validate_input() {
        let result = validate_input("1 OR 1=1");
        assert!(!result.is_valid);
        assert_eq!(
            result.error,
            Some(ValidationError::ThreatDetected {
                categories: vec!["sql_injection".to_string()]
            })
        );
        assert!(validate_input("Loan amount 25000").is_valid);
    }
}
