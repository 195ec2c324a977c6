// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sliding-window rate limiter.
//!
//! Keeps one list of request timestamps per identifier. Entries older than
//! the window are pruned lazily whenever that identifier is checked.
//!
//! A rejected call is never recorded, so hammering a limited action does not
//! push the lockout further into the future.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::clock::{Clock, SystemClock};
use crate::config::{RateLimitConfig, MAX_WINDOW_MS};
use crate::security::locks::{resilient_read, resilient_write};

/// Per-identifier sliding-window counter.
pub struct RateLimiter {
    windows: RwLock<HashMap<String, VecDeque<DateTime<Utc>>>>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter on the wall clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter with an injected clock.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and record one request against the configured defaults.
    pub fn check(&self, id: &str) -> bool {
        self.is_rate_limited(id, self.config.max_requests, self.config.window_ms)
    }

    /// Returns `true` if `id` already has `max` requests inside the trailing
    /// `window_ms`. Otherwise records this request and returns `false`.
    pub fn is_rate_limited(&self, id: &str, max: usize, window_ms: u64) -> bool {
        let now = self.clock.now();
        let window = window_duration(window_ms);

        let mut windows = resilient_write(&self.windows);
        let timestamps = windows.entry(id.to_string()).or_default();
        prune(timestamps, now, window);

        if timestamps.len() >= max {
            tracing::warn!(
                target: "security::rate_limit",
                event = "RATE_LIMITED",
                id = %id,
                max = max,
                window_ms = window_ms,
                "Rate limit reached"
            );
            return true;
        }

        timestamps.push_back(now);
        false
    }

    /// How many more requests `id` may make right now. Does not record.
    pub fn remaining_requests(&self, id: &str, max: usize, window_ms: u64) -> usize {
        max.saturating_sub(self.live_count(id, window_ms))
    }

    /// Time until the oldest request in the window ages out, if `id` is
    /// currently at or over `max`.
    pub fn retry_after(&self, id: &str, max: usize, window_ms: u64) -> Option<Duration> {
        let now = self.clock.now();
        let window = window_duration(window_ms);

        let mut windows = resilient_write(&self.windows);
        let timestamps = windows.get_mut(id)?;
        prune(timestamps, now, window);

        if timestamps.len() < max {
            return None;
        }
        // The request that frees a slot is the one `len - max` from the front.
        let freeing = timestamps.get(timestamps.len() - max)?;
        let frees_at = freeing
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Some(frees_at - now)
    }

    /// Drop all history for `id`.
    pub fn clear_rate_limit(&self, id: &str) {
        if resilient_write(&self.windows).remove(id).is_some() {
            tracing::debug!(
                target: "security::rate_limit",
                event = "RATE_LIMIT_CLEARED",
                id = %id,
                "Rate limit history cleared"
            );
        }
    }

    /// Forget identifiers whose every timestamp is older than `window_ms`.
    ///
    /// Returns how many identifiers were dropped.
    pub fn cleanup(&self, window_ms: u64) -> usize {
        let now = self.clock.now();
        let window = window_duration(window_ms);

        let mut windows = resilient_write(&self.windows);
        let before = windows.len();
        windows.retain(|_, timestamps| {
            prune(timestamps, now, window);
            !timestamps.is_empty()
        });
        before - windows.len()
    }

    /// Number of identifiers with recorded history.
    pub fn tracked_identifiers(&self) -> usize {
        resilient_read(&self.windows).len()
    }

    fn live_count(&self, id: &str, window_ms: u64) -> usize {
        let now = self.clock.now();
        let window = window_duration(window_ms);

        let mut windows = resilient_write(&self.windows);
        match windows.get_mut(id) {
            Some(timestamps) => {
                prune(timestamps, now, window);
                timestamps.len()
            }
            None => 0,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked_identifiers", &self.tracked_identifiers())
            .finish()
    }
}

/// Drop timestamps that are at least `window` old. Timestamps are appended in
/// clock order, so the expired ones are always at the front.
fn prune(timestamps: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now - *oldest >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Saturates at [`MAX_WINDOW_MS`].
fn window_duration(window_ms: u64) -> Duration {
    i64::try_from(window_ms.min(MAX_WINDOW_MS))
        .ok()
        .and_then(Duration::try_milliseconds)
        .unwrap_or_else(|| Duration::days(1))
}

// ============================================================================
// TESTS
// ============================================================================
