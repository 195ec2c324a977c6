// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Security controls for the credit-application admin console.
//!
//! Everything here is a client-side, advisory layer. It improves UX and
//! blocks casual misuse; it is not a trust boundary. The backend must
//! re-authorize and re-validate every request.
//!
//! ## Components
//!
//! - **Authorization**: role/permission evaluation ([`AuthorizationEngine`])
//! - **Access guard**: admit/deny with a typed reason ([`AccessGuard`])
//! - **Session lifecycle**: inactivity timeout with a warning window
//!   ([`SessionLifecycleManager`])
//! - **Input hygiene**: threat pattern scanning and field sanitizers
//! - **Abuse controls**: sliding-window rate limiting, CSRF tokens, upload
//!   validation
//!
//! ## Usage
//!
//! ```
//! use chrono::Utc;
//! use lendguard::security::{AccessGuard, SessionLifecycleManager};
//! use lendguard::types::{AccessRequirement, Principal};
//!
//! let sessions = SessionLifecycleManager::default();
//! let guard = AccessGuard::default();
//! let now = Utc::now();
//!
//! let officer = Principal::new("officer-7").with_role("loan_officer");
//! sessions.start("officer-7", now);
//!
//! let requirement = AccessRequirement::any_role(["loan_officer"]).require_active_session(true);
//! let outcome = guard.check(Some(&officer), &sessions, &requirement, now);
//! assert!(outcome.is_admit());
//! ```

pub mod access_guard;
pub mod authorization;
pub mod csrf;
pub mod file_upload;
pub mod locks;
pub mod rate_limit;
pub mod sanitize;
pub mod session_manager;
pub mod threat;

pub use access_guard::{AccessGuard, AccessOutcome};
pub use authorization::{AccessDecision, AuthorizationEngine, DenyReason};
pub use csrf::{
    generate_csrf_token, CsrfTokenManager, MemorySessionStorage, SessionStorage, CSRF_STORAGE_KEY,
    CSRF_TOKEN_LENGTH,
};
pub use file_upload::{
    validate_file, validate_file_extension, validate_file_name, validate_file_size,
    validate_file_size_default, FileCategory, DANGEROUS_EXTENSIONS,
};
pub use locks::{resilient_read, resilient_write};
pub use rate_limit::RateLimiter;
pub use sanitize::{
    escape_html, sanitize_email, sanitize_field, sanitize_file_name, sanitize_optional,
    sanitize_phone, sanitize_text, sanitize_username, strip_html, FieldKind,
};
pub use session_manager::{
    SessionConfig, SessionEvent, SessionLifecycleManager, SessionSnapshot, SessionState,
    SessionTick, DEFAULT_SESSION_TIMEOUT_SECS, DEFAULT_WARNING_THRESHOLD_SECS,
};
pub use threat::{
    detect_command_injection, detect_path_traversal, detect_sql_injection, detect_xss,
    scan_input, scan_input_logged, validate_input, Detection, ThreatCategory, ThreatScanResult,
};
