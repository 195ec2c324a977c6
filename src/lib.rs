// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! lendguard - client-side security layer for a credit-application admin console
//!
//! Decides whether a user may see a page or perform an action, tracks
//! inactivity-based session expiry, and screens, sanitizes and rate-limits
//! user input before it reaches the backend.
//!
//! **Advisory only.** Nothing in this crate is a trust boundary. It exists
//! to keep the UI honest; the server must enforce the same rules.
//!
//! # Core Modules
//!
//! - [`security`] - authorization, access guard, sessions, threat scanning,
//!   sanitizers, rate limiting, CSRF and upload validation
//! - [`audit`] - bounded in-memory security event log with redaction
//! - [`config`] - JSON-loadable tunables with validation
//! - [`types`] - principals and access requirements
//! - [`clock`] - injectable time source
//! - [`error`] - configuration and validation error types
//! - [`logging`] - tracing subscriber setup

pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod security;
pub mod types;
pub mod utils;

pub use audit::{redact_secrets, SecurityEvent, SecurityEventKind, SecurityLog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RateLimitConfig, SecurityConfig, TextConfig, UploadConfig};
pub use error::{ConfigError, ValidationError, ValidationResult};
pub use logging::init_logging;
pub use types::{AccessRequirement, MatchMode, Principal, ADMIN_ROLE};
pub use utils::mask_token;

// Re-export the main security surface
pub use security::{
    AccessDecision, AccessGuard, AccessOutcome, AuthorizationEngine, CsrfTokenManager, DenyReason,
    FileCategory, RateLimiter, SessionConfig, SessionLifecycleManager, SessionSnapshot,
    SessionState, ThreatCategory,
};
