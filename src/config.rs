// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Security configuration.
//!
//! One [`SecurityConfig`] is built at session start and handed to each
//! component. Missing fields fall back to the defaults below.
//!
//! ```json
//! {
//!   "session": { "timeout_secs": 1800, "warning_threshold_secs": 300 },
//!   "rate_limit": { "max_requests": 100, "window_ms": 60000 },
//!   "upload": { "max_file_size_bytes": 10485760 },
//!   "text": { "max_text_length": 10000 },
//!   "admin_role": "admin"
//! }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::security::sanitize::DEFAULT_MAX_TEXT_LENGTH;
use crate::security::session_manager::{SessionConfig, MAX_SESSION_TIMEOUT_SECS};
use crate::types::ADMIN_ROLE;

/// Default request budget per window.
pub const DEFAULT_MAX_REQUESTS: usize = 100;

/// Default sliding window: one minute.
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

/// Longest sliding window: one day. Larger windows saturate.
pub const MAX_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// Default upload size limit: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_file_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub max_text_length: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// Top-level configuration for the security layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub upload: UploadConfig,
    pub text: TextConfig,
    /// Role tag that satisfies admin-only requirements
    pub admin_role: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
            upload: UploadConfig::default(),
            text: TextConfig::default(),
            admin_role: ADMIN_ROLE.to_string(),
        }
    }
}

impl SecurityConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read security config {}", path.display()))?;
        let config = Self::from_json_str(&raw)
            .with_context(|| format!("Invalid security config {}", path.display()))?;

        tracing::info!(
            target: "security::config",
            event = "CONFIG_LOADED",
            timeout_secs = config.session.timeout_secs,
            warning_threshold_secs = config.session.warning_threshold_secs,
            "Security configuration loaded"
        );
        Ok(config)
    }

    /// Check the semantic rules serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.timeout_secs == 0 {
            return Err(ConfigError::ZeroSessionTimeout);
        }
        if self.session.timeout_secs > MAX_SESSION_TIMEOUT_SECS {
            return Err(ConfigError::SessionTimeoutTooLong {
                timeout_secs: self.session.timeout_secs,
                max_secs: MAX_SESSION_TIMEOUT_SECS,
            });
        }
        if self.session.warning_threshold_secs >= self.session.timeout_secs {
            return Err(ConfigError::WarningNotBeforeTimeout {
                warning_secs: self.session.warning_threshold_secs,
                timeout_secs: self.session.timeout_secs,
            });
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::ZeroRateLimit("max_requests"));
        }
        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::ZeroRateLimit("window_ms"));
        }
        if self.rate_limit.window_ms > MAX_WINDOW_MS {
            return Err(ConfigError::RateWindowTooLong {
                window_ms: self.rate_limit.window_ms,
                max_ms: MAX_WINDOW_MS,
            });
        }
        if self.upload.max_file_size_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        if self.text.max_text_length == 0 {
            return Err(ConfigError::ZeroTextLength);
        }
        if self.admin_role.trim().is_empty() {
            return Err(ConfigError::EmptyAdminRole);
        }
        Ok(())
    }
}
