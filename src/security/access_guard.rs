// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Access guard: the single admit/deny entry point used by page wrappers.
//!
//! ## Decision order (first applicable wins)
//!
//! 1. No principal, or not authenticated -> `NoAuth`
//! 2. `require_active_session` and the session is not valid -> `SessionExpired`
//! 3. `admin_only` and not an admin -> `AdminRequired`
//! 4. Required roles not satisfied -> `InsufficientRoles`
//! 5. Required permissions not satisfied -> `InsufficientPermissions`
//! 6. Otherwise `Admit`, plus an advisory timeout-warning flag
//!
//! This is a client-side advisory control. It hides UI the user cannot use;
//! it does not protect anything. The server must re-check every request.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::audit::{SecurityEventKind, SecurityLog};
use crate::security::authorization::{AccessDecision, AuthorizationEngine, DenyReason};
use crate::security::rate_limit::RateLimiter;
use crate::security::session_manager::{SessionLifecycleManager, SessionSnapshot};
use crate::types::{AccessRequirement, Principal};

/// A decision plus the advisory session banner state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessOutcome {
    pub decision: AccessDecision,
    /// Only ever true alongside `Admit`; never a reason to deny
    pub show_timeout_warning: bool,
    /// Remaining session time, when a session snapshot was supplied
    pub time_until_expiry: Option<Duration>,
}

impl AccessOutcome {
    fn denied(reason: DenyReason) -> Self {
        Self::from_decision(AccessDecision::deny(reason))
    }

    fn from_decision(decision: AccessDecision) -> Self {
        Self {
            decision,
            show_timeout_warning: false,
            time_until_expiry: None,
        }
    }

    pub fn is_admit(&self) -> bool {
        self.decision.is_admit()
    }

    pub fn reason(&self) -> Option<DenyReason> {
        self.decision.reason()
    }
}

/// Combines the authorization engine with session state.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    engine: AuthorizationEngine,
    log: Option<Arc<SecurityLog>>,
}

impl AccessGuard {
    pub fn new(engine: AuthorizationEngine) -> Self {
        Self { engine, log: None }
    }

    /// Record every attempt and denial in `log`.
    pub fn with_log(mut self, log: Arc<SecurityLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn engine(&self) -> &AuthorizationEngine {
        &self.engine
    }

    /// Decide from read-only snapshots.
    ///
    /// The decision depends only on the arguments.
    pub fn decide(
        &self,
        principal: Option<&Principal>,
        session: Option<&SessionSnapshot>,
        requirement: &AccessRequirement,
    ) -> AccessOutcome {
        let outcome = evaluate(&self.engine, principal, session, requirement);
        self.record(principal, &outcome.decision);
        outcome
    }

    /// Decide against the live session at `now`.
    pub fn check(
        &self,
        principal: Option<&Principal>,
        sessions: &SessionLifecycleManager,
        requirement: &AccessRequirement,
        now: DateTime<Utc>,
    ) -> AccessOutcome {
        let snapshot = sessions.snapshot(now);
        self.decide(principal, snapshot.as_ref(), requirement)
    }

    /// Decide, then charge an admitted call to `action`'s rate window.
    ///
    /// The window is keyed per user and action. Only admitted calls are
    /// charged, and a limited call is not recorded.
    pub fn check_rate_limited(
        &self,
        principal: Option<&Principal>,
        session: Option<&SessionSnapshot>,
        requirement: &AccessRequirement,
        limiter: &RateLimiter,
        action: &str,
    ) -> AccessOutcome {
        let outcome = evaluate(&self.engine, principal, session, requirement);
        if !outcome.is_admit() {
            self.record(principal, &outcome.decision);
            return outcome;
        }

        // Admit implies an authenticated principal
        let user_id = principal.map(|p| p.user_id.as_str()).unwrap_or_default();
        let key = format!("{}:{}", user_id, action);
        if limiter.check(&key) {
            let limited = AccessOutcome::denied(DenyReason::RateLimited);
            self.record(principal, &limited.decision);
            return limited;
        }

        self.record(principal, &outcome.decision);
        outcome
    }

    fn record(&self, principal: Option<&Principal>, decision: &AccessDecision) {
        let user_id = principal.map(|p| p.user_id.as_str());

        match decision {
            AccessDecision::Admit => {
                tracing::debug!(
                    target: "security::guard",
                    event = "ACCESS_ADMIT",
                    user = ?user_id,
                    "Access admitted"
                );
            }
            AccessDecision::Deny { reason, missing } => {
                tracing::info!(
                    target: "security::guard",
                    event = "ACCESS_DENY",
                    user = ?user_id,
                    reason = %reason,
                    missing = ?missing,
                    "Access denied"
                );
            }
        }

        let Some(log) = &self.log else {
            return;
        };
        log.record(SecurityEventKind::AccessAttempt, user_id, "");
        if let AccessDecision::Deny { reason, missing } = decision {
            let kind = if *reason == DenyReason::RateLimited {
                SecurityEventKind::RateLimited
            } else {
                SecurityEventKind::AccessDenied
            };
            let details = if missing.is_empty() {
                format!("reason={}", reason)
            } else {
                format!("reason={} missing={}", reason, missing.join(","))
            };
            log.record(kind, user_id, details);
        }
    }
}

fn evaluate(
    engine: &AuthorizationEngine,
    principal: Option<&Principal>,
    session: Option<&SessionSnapshot>,
    requirement: &AccessRequirement,
) -> AccessOutcome {
    let Some(principal) = principal.filter(|p| p.authenticated) else {
        return AccessOutcome::denied(DenyReason::NoAuth);
    };

    let session_valid = session.map(|s| s.is_valid).unwrap_or(false);
    if requirement.require_active_session && !session_valid {
        return AccessOutcome::denied(DenyReason::SessionExpired);
    }

    let decision = engine.evaluate(principal, requirement);
    if !decision.is_admit() {
        return AccessOutcome::from_decision(decision);
    }

    AccessOutcome {
        decision,
        show_timeout_warning: session.map(|s| s.show_warning).unwrap_or(false),
        time_until_expiry: session.map(|s| s.time_until_expiry),
    }
}

// ============================================================================
// TESTS
// ============================================================================
