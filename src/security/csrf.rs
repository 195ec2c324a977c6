// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Anti-forgery token lifecycle.
//!
//! One token per browsing session, held in a single slot of session-scoped
//! storage. Storing a new token overwrites the old one, so at most one token
//! is ever valid. The HTTP client reads it with
//! [`CsrfTokenManager::get_csrf_token`] and attaches it to mutating requests.

use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use subtle::ConstantTimeEq;

use crate::audit::{SecurityEventKind, SecurityLog};
use crate::security::locks::{resilient_read, resilient_write};
use crate::utils::mask_token;

/// Storage key of the token slot.
pub const CSRF_STORAGE_KEY: &str = "csrf_token";

/// Random bytes per token (256 bits).
pub const CSRF_TOKEN_BYTES: usize = 32;

/// Hex-encoded token length.
pub const CSRF_TOKEN_LENGTH: usize = CSRF_TOKEN_BYTES * 2;

/// Key/value storage scoped to one browsing session.
///
/// Survives a page reload within the session; gone when the session ends.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process [`SessionStorage`].
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        resilient_read(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        resilient_write(&self.values).insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        resilient_write(&self.values).remove(key);
    }
}

/// Generate a 256-bit token from the OS CSPRNG, hex-encoded.
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; CSRF_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues, stores and checks the session's CSRF token.
pub struct CsrfTokenManager {
    storage: Arc<dyn SessionStorage>,
    log: Option<Arc<SecurityLog>>,
}

impl CsrfTokenManager {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage, log: None }
    }

    /// Manager backed by fresh in-memory storage.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()))
    }

    pub fn with_log(mut self, log: Arc<SecurityLog>) -> Self {
        self.log = Some(log);
        self
    }

    /// Put `token` in the slot, replacing any previous token.
    pub fn store_csrf_token(&self, token: &str) {
        self.storage.set(CSRF_STORAGE_KEY, token.to_string());
        tracing::debug!(
            target: "security::csrf",
            event = "CSRF_STORED",
            token = %mask_token(token),
            "CSRF token stored"
        );
    }

    /// The live token, if any.
    pub fn get_csrf_token(&self) -> Option<String> {
        self.storage.get(CSRF_STORAGE_KEY)
    }

    /// Generate and store a new token, invalidating the previous one.
    pub fn regenerate(&self) -> String {
        let token = generate_csrf_token();
        self.store_csrf_token(&token);
        if let Some(log) = &self.log {
            log.record(
                SecurityEventKind::CsrfRegenerated,
                None,
                format!("token={}", mask_token(&token)),
            );
        }
        token
    }

    /// The live token, generating one if the slot is empty.
    pub fn ensure_token(&self) -> String {
        match self.get_csrf_token() {
            Some(token) => token,
            None => self.regenerate(),
        }
    }

    /// True iff `candidate` is 64 characters and equals the stored token.
    pub fn validate_csrf_token(&self, candidate: &str) -> bool {
        if candidate.len() != CSRF_TOKEN_LENGTH {
            return false;
        }
        let Some(stored) = self.get_csrf_token() else {
            return false;
        };
        if stored.len() != CSRF_TOKEN_LENGTH {
            return false;
        }

        let valid: bool = stored.as_bytes().ct_eq(candidate.as_bytes()).into();
        if !valid {
            tracing::warn!(
                target: "security::csrf",
                event = "CSRF_MISMATCH",
                "CSRF token did not match the session token"
            );
        }
        valid
    }

    /// Empty the slot. Called on logout.
    pub fn clear_csrf_token(&self) {
        self.storage.remove(CSRF_STORAGE_KEY);
        tracing::debug!(target: "security::csrf", event = "CSRF_CLEARED", "CSRF token cleared");
    }
}

impl Default for CsrfTokenManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for CsrfTokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfTokenManager")
            .field("has_token", &self.get_csrf_token().is_some())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_shape() {
        let token = generate_csrf_token();
        assert_eq!(token.len(), CSRF_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_csrf_token());
    }

    #[test]
    fn test_unstored_token_is_invalid() {
        let manager = CsrfTokenManager::in_memory();
        assert!(!manager.validate_csrf_token(&generate_csrf_token()));
    }

    #[test]
    fn test_store_then_validate() {
        let manager = CsrfTokenManager::in_memory();
        let token = generate_csrf_token();
        manager.store_csrf_token(&token);

        assert!(manager.validate_csrf_token(&token));
        assert!(!manager.validate_csrf_token(&generate_csrf_token()));
        assert!(!manager.validate_csrf_token(""));
        assert!(!manager.validate_csrf_token(&token[..63]));
        assert_eq!(manager.get_csrf_token(), Some(token));
    }

    #[test]
    fn test_new_token_replaces_old() {
        let manager = CsrfTokenManager::in_memory();
        let first = manager.regenerate();
        let second = manager.regenerate();

        assert!(!manager.validate_csrf_token(&first));
        assert!(manager.validate_csrf_token(&second));
    }

    #[test]
    fn test_clear_invalidates() {
        let manager = CsrfTokenManager::in_memory();
        let token = manager.ensure_token();
        manager.clear_csrf_token();

        assert!(manager.get_csrf_token().is_none());
        assert!(!manager.validate_csrf_token(&token));
    }

    #[test]
    fn test_ensure_token_is_stable() {
        let manager = CsrfTokenManager::in_memory();
        let token = manager.ensure_token();
        assert_eq!(manager.ensure_token(), token);
    }

    #[test]
    fn test_short_stored_value_never_validates() {
        let manager = CsrfTokenManager::in_memory();
        manager.store_csrf_token("abc");
        assert!(!manager.validate_csrf_token("abc"));
    }

    #[test]
    fn test_storage_survives_manager_rebuild() {
        // A page reload rebuilds the manager over the same session storage
        let storage: Arc<dyn SessionStorage> = Arc::new(MemorySessionStorage::new());
        let token = CsrfTokenManager::new(storage.clone()).regenerate();
        assert!(CsrfTokenManager::new(storage).validate_csrf_token(&token));
    }

    #[test]
    fn test_regenerate_is_logged_masked() {
        let log = Arc::new(SecurityLog::default());
        let manager = CsrfTokenManager::in_memory().with_log(log.clone());
        let token = manager.regenerate();

        let entry = &log.by_kind(SecurityEventKind::CsrfRegenerated)[0];
        assert!(!entry.details.contains(&token));
        assert!(entry.details.contains(&token[..8]));
    }
}
