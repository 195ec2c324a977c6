// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Role and permission evaluation.
//!
//! Pure policy: no I/O, no clock, no hidden state. The engine answers
//! whether a [`Principal`]'s claims satisfy an [`AccessRequirement`]; the
//! authentication and session checks that come first live in
//! [`AccessGuard`](super::access_guard::AccessGuard).
//!
//! Evaluation order is admin-only, then roles, then permissions. The first
//! failing check decides; failures are never accumulated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{AccessRequirement, MatchMode, Principal, ADMIN_ROLE};

/// Why access was denied. Exactly one per denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    NoAuth,
    SessionExpired,
    AdminRequired,
    InsufficientRoles,
    InsufficientPermissions,
    RateLimited,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAuth => "NO_AUTH",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::AdminRequired => "ADMIN_REQUIRED",
            Self::InsufficientRoles => "INSUFFICIENT_ROLES",
            Self::InsufficientPermissions => "INSUFFICIENT_PERMISSIONS",
            Self::RateLimited => "RATE_LIMITED",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Admit,
    Deny {
        reason: DenyReason,
        /// Required roles or permissions the principal lacks, for the
        /// `Insufficient*` reasons; empty otherwise
        missing: Vec<String>,
    },
}

impl AccessDecision {
    pub fn deny(reason: DenyReason) -> Self {
        Self::Deny {
            reason,
            missing: Vec::new(),
        }
    }

    pub fn is_admit(&self) -> bool {
        matches!(self, Self::Admit)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            Self::Admit => None,
            Self::Deny { reason, .. } => Some(*reason),
        }
    }

    pub fn missing(&self) -> &[String] {
        match self {
            Self::Admit => &[],
            Self::Deny { missing, .. } => missing,
        }
    }
}

/// Evaluates role/permission requirements against a principal's claims.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine {
    admin_role: String,
}

impl AuthorizationEngine {
    /// Engine treating `admin_role` as the administrator tag.
    pub fn new(admin_role: impl Into<String>) -> Self {
        Self {
            admin_role: admin_role.into(),
        }
    }

    pub fn admin_role(&self) -> &str {
        &self.admin_role
    }

    pub fn has_role(&self, principal: &Principal, role: &str) -> bool {
        principal.roles.contains(role)
    }

    /// False for an empty list.
    pub fn has_any_role<S: AsRef<str>>(&self, principal: &Principal, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(principal, r.as_ref()))
    }

    /// True for an empty list.
    pub fn has_all_roles<S: AsRef<str>>(&self, principal: &Principal, roles: &[S]) -> bool {
        roles.iter().all(|r| self.has_role(principal, r.as_ref()))
    }

    pub fn has_permission(&self, principal: &Principal, permission: &str) -> bool {
        principal.permissions.contains(permission)
    }

    /// False for an empty list.
    pub fn has_any_permission<S: AsRef<str>>(&self, principal: &Principal, permissions: &[S]) -> bool {
        permissions
            .iter()
            .any(|p| self.has_permission(principal, p.as_ref()))
    }

    /// True for an empty list.
    pub fn has_all_permissions<S: AsRef<str>>(&self, principal: &Principal, permissions: &[S]) -> bool {
        permissions
            .iter()
            .all(|p| self.has_permission(principal, p.as_ref()))
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.has_role(principal, &self.admin_role)
    }

    /// Check the claim-based parts of a requirement.
    ///
    /// Authentication and session validity are not considered here.
    pub fn evaluate(&self, principal: &Principal, requirement: &AccessRequirement) -> AccessDecision {
        if requirement.admin_only && !self.is_admin(principal) {
            return AccessDecision::deny(DenyReason::AdminRequired);
        }

        if !requirement.roles.is_empty() {
            let satisfied = match requirement.role_match {
                MatchMode::All => self.has_all_roles(principal, &requirement.roles),
                MatchMode::Any => self.has_any_role(principal, &requirement.roles),
            };
            if !satisfied {
                return AccessDecision::Deny {
                    reason: DenyReason::InsufficientRoles,
                    missing: missing_tags(&requirement.roles, |r| self.has_role(principal, r)),
                };
            }
        }

        if !requirement.permissions.is_empty() {
            let satisfied = match requirement.permission_match {
                MatchMode::All => self.has_all_permissions(principal, &requirement.permissions),
                MatchMode::Any => self.has_any_permission(principal, &requirement.permissions),
            };
            if !satisfied {
                return AccessDecision::Deny {
                    reason: DenyReason::InsufficientPermissions,
                    missing: missing_tags(&requirement.permissions, |p| {
                        self.has_permission(principal, p)
                    }),
                };
            }
        }

        AccessDecision::Admit
    }
}

impl Default for AuthorizationEngine {
    fn default() -> Self {
        Self::new(ADMIN_ROLE)
    }
}

/// Required tags not held, in requirement order, without duplicates.
fn missing_tags(required: &[String], held: impl Fn(&str) -> bool) -> Vec<String> {
    let mut missing: Vec<String> = Vec::new();
    for tag in required {
        if !held(tag.as_str()) && !missing.contains(tag) {
            missing.push(tag.clone());
        }
    }
    missing
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn officer() -> Principal {
        Principal::new("officer-7")
            .with_roles(["loan_officer", "reviewer"])
            .with_permissions(["applications:read", "applications:update"])
    }

    #[test]
    fn test_role_checks() {
        let engine = AuthorizationEngine::default();
        let p = officer();

        assert!(engine.has_role(&p, "loan_officer"));
        assert!(!engine.has_role(&p, "admin"));
        assert!(engine.has_any_role(&p, &["admin", "reviewer"]));
        assert!(!engine.has_all_roles(&p, &["admin", "reviewer"]));
        assert!(engine.has_all_roles(&p, &["loan_officer", "reviewer"]));
    }

    #[test]
    fn test_empty_lists() {
        let engine = AuthorizationEngine::default();
        let p = officer();
        let empty: [&str; 0] = [];

        assert!(!engine.has_any_role(&p, &empty));
        assert!(engine.has_all_roles(&p, &empty));
        assert!(!engine.has_any_permission(&p, &empty));
        assert!(engine.has_all_permissions(&p, &empty));
    }

    #[test]
    fn test_permission_checks() {
        let engine = AuthorizationEngine::default();
        let p = officer();

        assert!(engine.has_permission(&p, "applications:read"));
        assert!(engine.has_any_permission(&p, &["applications:delete", "applications:read"]));
        assert!(!engine.has_all_permissions(&p, &["applications:delete", "applications:read"]));
    }

    #[test]
    fn test_custom_admin_role() {
        let engine = AuthorizationEngine::new("superuser");
        assert!(!engine.is_admin(&Principal::new("a").with_role("admin")));
        assert!(engine.is_admin(&Principal::new("a").with_role("superuser")));
    }

    #[test]
    fn test_admin_only_takes_precedence() {
        let engine = AuthorizationEngine::default();
        let requirement = AccessRequirement::all_roles(["loan_officer"])
            .permissions(["applications:read"], MatchMode::All)
            .admin_only(true);

        assert_eq!(
            engine.evaluate(&officer(), &requirement),
            AccessDecision::deny(DenyReason::AdminRequired)
        );
        assert!(engine
            .evaluate(&officer().with_role("admin"), &requirement)
            .is_admit());
    }

    #[test]
    fn test_roles_checked_before_permissions() {
        let engine = AuthorizationEngine::default();
        let requirement = AccessRequirement::any_role(["underwriter"])
            .permissions(["reports:export"], MatchMode::All);

        let decision = engine.evaluate(&officer(), &requirement);
        assert_eq!(decision.reason(), Some(DenyReason::InsufficientRoles));
        assert_eq!(decision.missing(), ["underwriter".to_string()]);
    }

    #[test]
    fn test_all_permissions_reports_missing() {
        let engine = AuthorizationEngine::default();
        let requirement = AccessRequirement::authenticated().permissions(
            ["applications:read", "reports:export", "reports:export"],
            MatchMode::All,
        );

        let decision = engine.evaluate(&officer(), &requirement);
        assert_eq!(decision.reason(), Some(DenyReason::InsufficientPermissions));
        assert_eq!(decision.missing(), ["reports:export".to_string()]);
    }

    #[test]
    fn test_any_mode_admits_with_one_match() {
        let engine = AuthorizationEngine::default();
        let requirement = AccessRequirement::any_role(["underwriter", "reviewer"])
            .permissions(["reports:export", "applications:read"], MatchMode::Any);
        assert!(engine.evaluate(&officer(), &requirement).is_admit());
    }

    #[test]
    fn test_empty_requirement_admits() {
        let engine = AuthorizationEngine::default();
        assert!(engine
            .evaluate(&Principal::new("nobody"), &AccessRequirement::authenticated())
            .is_admit());
    }

    #[test]
    fn test_decision_serialization() {
        let json = serde_json::to_string(&AccessDecision::deny(DenyReason::NoAuth)).unwrap();
        assert!(json.contains(r#""decision":"deny""#));
        assert!(json.contains(r#""reason":"NO_AUTH""#));
    }
}
