// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Security Event Log
//!
//! Records access attempts, denials, session transitions and detection hits
//! for the current browsing session. The log is ephemeral: it lives as long
//! as the [`SecurityLog`] instance and is cleared on logout.
//!
//! Every entry is also emitted through `tracing` under the
//! `security::audit` target.
//!
//! Log format:
//! `2025-01-15 10:23:45 UTC | ACCESS_DENIED | user=officer-7 | reason=ADMIN_REQUIRED`

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, LazyLock, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::security::locks::{resilient_read, resilient_write};

/// Default number of entries kept in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Redaction patterns for secrets that must never reach the log.
/// JUSTIFICATION for .expect(): static patterns, validated by the tests below.
static REDACTION_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)bearer [a-z0-9\-._~+/]+=*").expect("Bearer token regex is valid"), "Bearer [REDACTED]"),
        (Regex::new(r"(?i)(password|passwd|secret)\s*[=:]\s*\S+").expect("Password regex is valid"), "$1=[REDACTED]"),
        (Regex::new(r"(?i)csrf[_-]?token\s*[=:]\s*\S+").expect("CSRF field regex is valid"), "csrf_token=[REDACTED]"),
        (Regex::new(r"\b[0-9a-fA-F]{64}\b").expect("Hex token regex is valid"), "[REDACTED_TOKEN]"),
        (Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("SSN regex is valid"), "[REDACTED_SSN]"),
        (Regex::new(r"\b(?:\d{4}[-\s]?){3}\d{4}\b").expect("Card number regex is valid"), "[REDACTED_CARD]"),
    ]
});

/// Redact secrets from text before logging
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, replacement) in REDACTION_PATTERNS.iter() {
        result = pattern.replace_all(&result, *replacement).into_owned();
    }
    result
}

/// Kinds of security event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    AccessAttempt,
    AccessDenied,
    SessionStarted,
    SessionWarning,
    SessionExpired,
    SessionExtended,
    SessionTerminated,
    RateLimited,
    ThreatDetected,
    CsrfRegenerated,
}

impl SecurityEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessAttempt => "ACCESS_ATTEMPT",
            Self::AccessDenied => "ACCESS_DENIED",
            Self::SessionStarted => "SESSION_STARTED",
            Self::SessionWarning => "SESSION_WARNING",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::SessionExtended => "SESSION_EXTENDED",
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::RateLimited => "RATE_LIMITED",
            Self::ThreatDetected => "THREAT_DETECTED",
            Self::CsrfRegenerated => "CSRF_REGENERATED",
        }
    }

    fn is_alert(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied | Self::RateLimited | Self::ThreatDetected | Self::SessionExpired
        )
    }
}

impl std::fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: SecurityEventKind,
    pub user_id: Option<String>,
    /// Already redacted
    pub details: String,
}

impl SecurityEvent {
    /// Format as a log line
    pub fn to_log_line(&self) -> String {
        format!(
            "{} | {} | user={} | {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.kind.as_str(),
            self.user_id.as_deref().unwrap_or("-"),
            self.details
        )
    }
}

/// Bounded, session-scoped security event log.
pub struct SecurityLog {
    entries: RwLock<VecDeque<SecurityEvent>>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl SecurityLog {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(DEFAULT_LOG_CAPACITY))),
            capacity: capacity.max(1),
            clock,
        }
    }

    /// Record an event stamped with the log's clock.
    pub fn record(&self, kind: SecurityEventKind, user_id: Option<&str>, details: impl Into<String>) {
        self.record_at(self.clock.now(), kind, user_id, details);
    }

    /// Record an event with an explicit timestamp.
    pub fn record_at(
        &self,
        timestamp: DateTime<Utc>,
        kind: SecurityEventKind,
        user_id: Option<&str>,
        details: impl Into<String>,
    ) {
        let event = SecurityEvent {
            timestamp,
            kind,
            user_id: user_id.map(str::to_string),
            details: redact_secrets(&details.into()),
        };

        if kind.is_alert() {
            tracing::warn!(target: "security::audit", event = kind.as_str(), "{}", event.to_log_line());
        } else {
            tracing::debug!(target: "security::audit", event = kind.as_str(), "{}", event.to_log_line());
        }

        let mut entries = resilient_write(&self.entries);
        entries.push_back(event);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Vec<SecurityEvent> {
        let entries = resilient_read(&self.entries);
        let skip = entries.len().saturating_sub(n);
        entries.iter().skip(skip).cloned().collect()
    }

    /// Entries of one kind, oldest first.
    pub fn by_kind(&self, kind: SecurityEventKind) -> Vec<SecurityEvent> {
        resilient_read(&self.entries)
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        resilient_read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry. Called on logout.
    pub fn clear(&self) {
        resilient_write(&self.entries).clear();
    }

    /// Export the log as pretty JSON.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let entries: Vec<SecurityEvent> = resilient_read(&self.entries).iter().cloned().collect();
        serde_json::to_string_pretty(&entries)
    }
}

impl Default for SecurityLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl std::fmt::Debug for SecurityLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityLog")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
