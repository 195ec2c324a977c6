// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Utility functions for lendguard.

/// Characters of a secret that may appear in logs.
pub const VISIBLE_TOKEN_PREFIX: usize = 8;

/// Mask a secret (like a CSRF token) for logging.
///
/// Shows only the first 8 characters followed by "...". Shorter inputs are
/// still suffixed so the log never reveals whether the value was complete.
///
/// ```
/// use lendguard::utils::mask_token;
///
/// assert_eq!(mask_token("9f86d081884c7d659a2feaa0c55ad015"), "9f86d081...");
/// assert_eq!(mask_token("abc"), "abc...");
/// ```
pub fn mask_token(token: &str) -> String {
    let prefix: String = token.chars().take(VISIBLE_TOKEN_PREFIX).collect();
    format!("{}...", prefix)
}
