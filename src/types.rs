// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Canonical types used across lendguard.
//!
//! The principal and requirement types are plain data: the guard reads them,
//! never mutates them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default tag identifying the administrator role.
pub const ADMIN_ROLE: &str = "admin";

/// The authenticated actor and its role/permission claims.
///
/// Tags are unique and unordered; a `BTreeSet` keeps `Debug` output stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier, used only for the security log
    pub user_id: String,
    /// Whether the login flow completed for this principal
    pub authenticated: bool,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
}

impl Principal {
    /// Create an authenticated principal with no claims.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            authenticated: true,
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
        }
    }

    /// Add a role tag.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Add several role tags.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    /// Add a permission tag.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Add several permission tags.
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Mark the principal as not (or no longer) authenticated.
    pub fn unauthenticated(mut self) -> Self {
        self.authenticated = false;
        self
    }
}

/// Whether a list of required tags must all be held, or just one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every listed tag must be held
    All,
    /// At least one listed tag must be held
    #[default]
    Any,
}

/// A declarative policy unit composed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRequirement {
    pub roles: Vec<String>,
    pub role_match: MatchMode,
    pub permissions: Vec<String>,
    pub permission_match: MatchMode,
    pub admin_only: bool,
    pub require_active_session: bool,
}

impl AccessRequirement {
    /// A requirement that only asks for an authenticated principal.
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Require the administrator role.
    pub fn admin() -> Self {
        Self {
            admin_only: true,
            ..Self::default()
        }
    }

    /// Require any one of the given roles.
    pub fn any_role<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().roles(roles, MatchMode::Any)
    }

    /// Require all of the given roles.
    pub fn all_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().roles(roles, MatchMode::All)
    }

    /// Set the required roles and how they are matched.
    pub fn roles<I, S>(mut self, roles: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self.role_match = mode;
        self
    }

    /// Set the required permissions and how they are matched.
    pub fn permissions<I, S>(mut self, permissions: I, mode: MatchMode) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self.permission_match = mode;
        self
    }

    /// Toggle the admin-only flag.
    pub fn admin_only(mut self, admin_only: bool) -> Self {
        self.admin_only = admin_only;
        self
    }

    /// Toggle the active-session flag.
    pub fn require_active_session(mut self, require: bool) -> Self {
        self.require_active_session = require;
        self
    }
}
