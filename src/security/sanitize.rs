// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Input sanitizers.
//!
//! Every function here is total: any `&str` produces a `String`, possibly
//! empty, and nothing panics. The per-field sanitizers are lossy
//! (characters outside the field's alphabet are dropped, not rejected);
//! callers that need to reject instead should use
//! [`threat`](super::threat) and the file validators.
//!
//! Length limits count characters, not bytes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Default limit for free-text fields.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 10_000;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MAX_FILE_NAME_LENGTH: usize = 255;

/// Characters that are never allowed in a file name.
pub(crate) const FORBIDDEN_FILE_NAME_CHARS: &[char] =
    &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Tag regex is valid"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Whitespace regex is valid"));

/// Kinds of form field with a dedicated sanitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Username,
    Email,
    Phone,
    FileName,
}

/// Escape the characters that are significant in HTML.
///
/// Not idempotent: an already-escaped `&amp;` becomes `&amp;amp;`. Callers
/// must escape exactly once, at the display boundary.
///
/// ```
/// use lendguard::security::sanitize::escape_html;
///
/// assert_eq!(escape_html("<b>\"O'Neil\"</b>"), "&lt;b&gt;&quot;O&#x27;Neil&quot;&lt;&#x2F;b&gt;");
/// ```
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove tag-shaped substrings. Entities are left as they are.
pub fn strip_html(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").into_owned()
}

/// Normalize free text for display or transport.
///
/// Steps, in order: trim, truncate to `max_len` characters, turn newlines
/// and tabs into spaces, collapse whitespace runs, then HTML-escape. The
/// truncation happens on the raw text, so the escaped output may be longer
/// than `max_len`.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let truncated = truncate_chars(input.trim(), max_len);
    let flattened: String = truncated
        .chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
        .collect();
    let collapsed = WHITESPACE_RUN.replace_all(&flattened, " ");
    escape_html(&collapsed)
}

/// Lowercase and keep only `[a-z0-9_-]`, at most 50 characters.
pub fn sanitize_username(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .take(MAX_USERNAME_LENGTH)
        .collect()
}

/// Lowercase and keep only `[a-z0-9@._-]`, at most 254 characters.
pub fn sanitize_email(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '@' | '.' | '_' | '-')
        })
        .take(MAX_EMAIL_LENGTH)
        .collect()
}

/// Keep digits, `+`, parentheses, hyphens and whitespace, at most 20 characters.
pub fn sanitize_phone(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '(' | ')' | '-'))
        .take(MAX_PHONE_LENGTH)
        .collect()
}

/// Drop path separators and reserved characters, remove every `..`, cap at 255.
///
/// `..` removal is a single left-to-right pass, so `"...."` becomes `""`
/// and `"..."` becomes `"."`.
pub fn sanitize_file_name(input: &str) -> String {
    let kept: String = input
        .trim()
        .chars()
        .filter(|c| !FORBIDDEN_FILE_NAME_CHARS.contains(c))
        .collect();
    truncate_chars(&kept.replace("..", ""), MAX_FILE_NAME_LENGTH).to_string()
}

/// Apply the sanitizer matching a field kind.
pub fn sanitize_field(kind: FieldKind, input: &str) -> String {
    match kind {
        FieldKind::Text => sanitize_text(input, DEFAULT_MAX_TEXT_LENGTH),
        FieldKind::Username => sanitize_username(input),
        FieldKind::Email => sanitize_email(input),
        FieldKind::Phone => sanitize_phone(input),
        FieldKind::FileName => sanitize_file_name(input),
    }
}

/// Apply a sanitizer to an optional value; `None` degrades to `""`.
pub fn sanitize_optional(kind: FieldKind, input: Option<&str>) -> String {
    input.map(|s| sanitize_field(kind, s)).unwrap_or_default()
}

/// Borrow at most `max` characters from the front of `s`.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_all_specials() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#x27;&amp;&#x27;&lt;&#x2F;a&gt;"
        );
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_escape_html_is_not_idempotent() {
        let once = escape_html("Smith & Sons");
        let twice = escape_html(&once);
        assert_eq!(once, "Smith &amp; Sons");
        assert_ne!(once, twice);
        assert_eq!(twice, "Smith &amp;amp; Sons");
    }

    #[test]
    fn test_strip_html_keeps_entities() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
        assert_eq!(strip_html("a &lt; b"), "a &lt; b");
        assert_eq!(strip_html("no tags"), "no tags");
    }

    #[test]
    fn test_sanitize_text_collapses_and_escapes() {
        assert_eq!(
            sanitize_text("  line one\n\n\tline   two <x>  ", DEFAULT_MAX_TEXT_LENGTH),
            "line one line two &lt;x&gt;"
        );
    }

    #[test]
    fn test_sanitize_text_truncates_before_escaping() {
        let out = sanitize_text("<<<<<<", 3);
        assert_eq!(out, "&lt;&lt;&lt;");
        assert!(out.len() > 3);
    }

    #[test]
    fn test_sanitize_text_counts_characters() {
        assert_eq!(sanitize_text("ééééé", 2), "éé");
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username("  John.Doe_42!  "), "johndoe_42");
        assert_eq!(sanitize_username(&"a".repeat(80)).len(), MAX_USERNAME_LENGTH);
    }

    #[test]
    fn test_sanitize_email() {
        assert_eq!(sanitize_email(" Jane.Doe+x@Example.COM "), "jane.doex@example.com");
        assert_eq!(sanitize_email("<script>@x.io"), "script@x.io");
    }

    #[test]
    fn test_sanitize_phone() {
        assert_eq!(sanitize_phone(" +1 (555) 010-9999 ext"), "+1 (555) 010-9999 ");
        assert_eq!(sanitize_phone("1234567890123456789012345").len(), MAX_PHONE_LENGTH);
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_file_name(r#"re<port>:"q1"?.pdf"#), "reportq1.pdf");
        assert_eq!(sanitize_file_name("...."), "");
        assert_eq!(sanitize_file_name("..."), ".");
    }

    #[test]
    fn test_sanitize_optional_none_is_empty() {
        assert_eq!(sanitize_optional(FieldKind::Email, None), "");
        assert_eq!(sanitize_optional(FieldKind::Username, Some("Bob")), "bob");
    }
}
