// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session lifecycle manager.
//!
//! Tracks validity and the expiry countdown for the signed-in user.
//!
//! ## States
//!
//! ```text
//! NoSession --start--> Active --tick (remaining <= warning)--> Warning
//!                        ^                                        |
//!                        +------------- extend_session -----------+
//! Active | Warning --tick (now >= expires_at)--> Expired --logout--> NoSession
//! ```
//!
//! The manager owns no timer. The host calls [`SessionLifecycleManager::tick`]
//! from its own scheduler (a one-second interval is enough) and must stop
//! calling it on logout or when the owning view is torn down. Every method
//! takes `now` explicitly so tests can drive time without sleeping.
//!
//! An expired session is never revived; the user has to sign in again.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::audit::{SecurityEventKind, SecurityLog};
use crate::security::locks::{resilient_read, resilient_write};

/// Default session length: 30 minutes.
pub const DEFAULT_SESSION_TIMEOUT_SECS: u64 = 30 * 60;

/// Default warning threshold: 5 minutes before expiry.
pub const DEFAULT_WARNING_THRESHOLD_SECS: u64 = 5 * 60;

/// Longest horizon a session may have: 7 days. Larger timeouts saturate.
pub const MAX_SESSION_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Lifecycle state of the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nobody is signed in
    NoSession,
    /// Session is valid and not close to expiry
    Active,
    /// Session is valid but inside the warning threshold
    Warning,
    /// Session has expired and requires re-authentication
    Expired,
}

impl SessionState {
    /// Returns true if the session still admits activity
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Active | SessionState::Warning)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::NoSession => write!(f, "NO_SESSION"),
            SessionState::Active => write!(f, "ACTIVE"),
            SessionState::Warning => write!(f, "WARNING"),
            SessionState::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Session events for the security log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    Started {
        session_id: String,
        user_id: String,
        timestamp: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    WarningIssued {
        session_id: String,
        timestamp: DateTime<Utc>,
        expires_in_secs: i64,
    },
    Expired {
        session_id: String,
        timestamp: DateTime<Utc>,
        session_duration_secs: i64,
    },
    Extended {
        session_id: String,
        timestamp: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Terminated {
        session_id: String,
        timestamp: DateTime<Utc>,
        reason: String,
    },
    /// Extension was attempted on an expired session
    ReauthRequired {
        session_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Audit label for the event
    pub fn label(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "SESSION_STARTED",
            SessionEvent::WarningIssued { .. } => "SESSION_WARNING",
            SessionEvent::Expired { .. } => "SESSION_EXPIRED",
            SessionEvent::Extended { .. } => "SESSION_EXTENDED",
            SessionEvent::Terminated { .. } => "SESSION_TERMINATED",
            SessionEvent::ReauthRequired { .. } => "REAUTH_REQUIRED",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::Started { timestamp, .. }
            | SessionEvent::WarningIssued { timestamp, .. }
            | SessionEvent::Expired { timestamp, .. }
            | SessionEvent::Extended { timestamp, .. }
            | SessionEvent::Terminated { timestamp, .. }
            | SessionEvent::ReauthRequired { timestamp, .. } => *timestamp,
        }
    }

    fn details(&self) -> String {
        match self {
            SessionEvent::Started { session_id, user_id, expires_at, .. } => {
                format!("session={} user={} expires_at={}", session_id, user_id, fmt_ts(expires_at))
            }
            SessionEvent::WarningIssued { session_id, expires_in_secs, .. } => {
                format!("session={} expires_in={}s", session_id, expires_in_secs)
            }
            SessionEvent::Expired { session_id, session_duration_secs, .. } => {
                format!("session={} duration={}s", session_id, session_duration_secs)
            }
            SessionEvent::Extended { session_id, expires_at, .. } => {
                format!("session={} expires_at={}", session_id, fmt_ts(expires_at))
            }
            SessionEvent::Terminated { session_id, reason, .. } => {
                format!("session={} reason={}", session_id, reason)
            }
            SessionEvent::ReauthRequired { session_id, .. } => format!("session={}", session_id),
        }
    }

    /// Format event for the audit trail
    pub fn to_audit_string(&self) -> String {
        format!("{} | {} | {}", fmt_ts(&self.timestamp()), self.label(), self.details())
    }

    fn kind(&self) -> SecurityEventKind {
        match self {
            SessionEvent::Started { .. } => SecurityEventKind::SessionStarted,
            SessionEvent::WarningIssued { .. } => SecurityEventKind::SessionWarning,
            SessionEvent::Expired { .. } => SecurityEventKind::SessionExpired,
            SessionEvent::Extended { .. } => SecurityEventKind::SessionExtended,
            SessionEvent::Terminated { .. } => SecurityEventKind::SessionTerminated,
            SessionEvent::ReauthRequired { .. } => SecurityEventKind::AccessDenied,
        }
    }
}

fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session length from sign-in or the last extension
    pub timeout_secs: u64,

    /// Remaining time at or below which the warning is shown
    pub warning_threshold_secs: u64,

    /// Warning message template ({minutes} and {seconds} will be replaced)
    pub warning_message_template: String,

    /// Expiration message
    pub expiration_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_SESSION_TIMEOUT_SECS,
            warning_threshold_secs: DEFAULT_WARNING_THRESHOLD_SECS,
            warning_message_template:
                "Your session expires in {minutes} minute(s) {seconds} second(s). Extend it to keep working."
                    .to_string(),
            expiration_message: "Your session has expired. Please sign in again.".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a custom configuration.
    ///
    /// The warning threshold is clamped below the timeout so the warning
    /// state is always reachable.
    pub fn custom(timeout_secs: u64, warning_secs: u64) -> Self {
        let clamped_timeout = timeout_secs.clamp(1, MAX_SESSION_TIMEOUT_SECS);
        if clamped_timeout != timeout_secs {
            tracing::warn!(
                target: "security::session",
                "SESSION_CONFIG: Timeout {}s is outside 1..={}s. Clamped to {}s.",
                timeout_secs,
                MAX_SESSION_TIMEOUT_SECS,
                clamped_timeout
            );
        }
        let timeout_secs = clamped_timeout;
        let clamped_warning = warning_secs.min(timeout_secs - 1);

        if clamped_warning != warning_secs {
            tracing::warn!(
                target: "security::session",
                "SESSION_CONFIG: Warning threshold {}s is not shorter than timeout {}s. Clamped to {}s.",
                warning_secs,
                timeout_secs,
                clamped_warning
            );
        }

        Self {
            timeout_secs,
            warning_threshold_secs: clamped_warning,
            ..Self::default()
        }
    }

    fn timeout(&self) -> Duration {
        secs(self.timeout_secs)
    }

    fn warning_threshold(&self) -> Duration {
        secs(self.warning_threshold_secs)
    }
}

/// Saturates at [`MAX_SESSION_TIMEOUT_SECS`].
fn secs(value: u64) -> Duration {
    i64::try_from(value.min(MAX_SESSION_TIMEOUT_SECS))
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::days(7))
}

/// `now + timeout`, pinned to the last representable instant on overflow.
fn horizon(now: DateTime<Utc>, timeout: Duration) -> DateTime<Utc> {
    now.checked_add_signed(timeout).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Read-only view of the session at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub last_activity: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `now < expires_at`
    pub is_valid: bool,
    /// Never negative
    pub time_until_expiry: Duration,
    /// Valid and inside the warning threshold
    pub show_warning: bool,
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTick {
    pub state: SessionState,
    /// Set once on entering the warning period, and on expiry
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    id: String,
    user_id: String,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    state: SessionState,
    /// Whether the warning has been issued for the current horizon
    warning_issued: bool,
}

/// Owns the single session of this client.
pub struct SessionLifecycleManager {
    config: SessionConfig,
    session: RwLock<Option<SessionRecord>>,
    log: Option<Arc<SecurityLog>>,
}

impl SessionLifecycleManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: RwLock::new(None),
            log: None,
        }
    }

    /// Attach a security log for session events.
    pub fn with_log(mut self, log: Arc<SecurityLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a session for a freshly authenticated user.
    ///
    /// Any previous session is replaced.
    pub fn start(&self, user_id: impl Into<String>, now: DateTime<Utc>) -> SessionState {
        let record = SessionRecord {
            id: generate_session_id(),
            user_id: user_id.into(),
            started_at: now,
            last_activity: now,
            expires_at: horizon(now, self.config.timeout()),
            state: SessionState::Active,
            warning_issued: false,
        };

        self.emit(SessionEvent::Started {
            session_id: record.id.clone(),
            user_id: record.user_id.clone(),
            timestamp: now,
            expires_at: record.expires_at,
        }, Some(&record.user_id));

        *resilient_write(&self.session) = Some(record);
        SessionState::Active
    }

    /// Current state without advancing anything.
    pub fn state(&self) -> SessionState {
        resilient_read(&self.session)
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::NoSession)
    }

    /// User of the current session, if any.
    pub fn user_id(&self) -> Option<String> {
        resilient_read(&self.session).as_ref().map(|s| s.user_id.clone())
    }

    /// Advance the state machine to `now`.
    pub fn tick(&self, now: DateTime<Utc>) -> SessionTick {
        let mut guard = resilient_write(&self.session);
        let Some(session) = guard.as_mut() else {
            return SessionTick {
                state: SessionState::NoSession,
                message: None,
            };
        };

        if session.state == SessionState::Expired {
            return SessionTick {
                state: SessionState::Expired,
                message: None,
            };
        }

        if now >= session.expires_at {
            session.state = SessionState::Expired;
            let event = SessionEvent::Expired {
                session_id: session.id.clone(),
                timestamp: now,
                session_duration_secs: (now - session.started_at).num_seconds(),
            };
            let user_id = session.user_id.clone();
            drop(guard);
            self.emit(event, Some(&user_id));
            return SessionTick {
                state: SessionState::Expired,
                message: Some(self.config.expiration_message.clone()),
            };
        }

        let remaining = session.expires_at - now;
        if remaining > self.config.warning_threshold() {
            // A tick from an earlier `now` can leave the warning period
            session.state = SessionState::Active;
            session.warning_issued = false;
            return SessionTick {
                state: SessionState::Active,
                message: None,
            };
        }

        session.state = SessionState::Warning;
        if session.warning_issued {
            return SessionTick {
                state: SessionState::Warning,
                message: None,
            };
        }

        session.warning_issued = true;
        let event = SessionEvent::WarningIssued {
            session_id: session.id.clone(),
            timestamp: now,
            expires_in_secs: remaining.num_seconds(),
        };
        let user_id = session.user_id.clone();
        drop(guard);
        self.emit(event, Some(&user_id));

        SessionTick {
            state: SessionState::Warning,
            message: Some(self.format_warning(remaining)),
        }
    }

    /// Push the expiry horizon to `now + timeout`.
    ///
    /// Only a live session can be extended. A session whose horizon has
    /// already passed is marked expired instead.
    pub fn extend_session(&self, now: DateTime<Utc>) -> SessionState {
        let mut guard = resilient_write(&self.session);
        let Some(session) = guard.as_mut() else {
            return SessionState::NoSession;
        };

        if session.state == SessionState::Expired || now >= session.expires_at {
            session.state = SessionState::Expired;
            let event = SessionEvent::ReauthRequired {
                session_id: session.id.clone(),
                timestamp: now,
            };
            let user_id = session.user_id.clone();
            drop(guard);
            self.emit(event, Some(&user_id));
            return SessionState::Expired;
        }

        session.expires_at = horizon(now, self.config.timeout());
        session.last_activity = now;
        session.state = SessionState::Active;
        session.warning_issued = false;

        let event = SessionEvent::Extended {
            session_id: session.id.clone(),
            timestamp: now,
            expires_at: session.expires_at,
        };
        let user_id = session.user_id.clone();
        drop(guard);
        self.emit(event, Some(&user_id));
        SessionState::Active
    }

    /// Note user activity. Does not move the expiry horizon.
    pub fn record_activity(&self, now: DateTime<Utc>) {
        if let Some(session) = resilient_write(&self.session).as_mut() {
            if session.state.is_live() && now > session.last_activity {
                session.last_activity = now;
            }
        }
    }

    /// End the session from any state. Returns false if there was none.
    pub fn terminate(&self, reason: &str, now: DateTime<Utc>) -> bool {
        let Some(session) = resilient_write(&self.session).take() else {
            return false;
        };
        self.emit(SessionEvent::Terminated {
            session_id: session.id,
            timestamp: now,
            reason: reason.to_string(),
        }, Some(&session.user_id));
        true
    }

    /// Explicit sign-out.
    pub fn logout(&self, now: DateTime<Utc>) -> bool {
        self.terminate("logout", now)
    }

    /// Read-only view at `now`, or `None` without a session.
    ///
    /// `state` reflects `now` even when no tick has run since the horizon
    /// or the warning threshold was crossed.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<SessionSnapshot> {
        let guard = resilient_read(&self.session);
        let session = guard.as_ref()?;

        let is_valid = session.state != SessionState::Expired && now < session.expires_at;
        let time_until_expiry = if is_valid {
            session.expires_at - now
        } else {
            Duration::zero()
        };

        let show_warning = is_valid && time_until_expiry <= self.config.warning_threshold();
        let state = if !is_valid {
            SessionState::Expired
        } else if show_warning {
            SessionState::Warning
        } else {
            SessionState::Active
        };

        Some(SessionSnapshot {
            state,
            last_activity: session.last_activity,
            expires_at: session.expires_at,
            is_valid,
            time_until_expiry,
            show_warning,
        })
    }

    fn format_warning(&self, remaining: Duration) -> String {
        let total = remaining.num_seconds().max(0);
        self.config
            .warning_message_template
            .replace("{minutes}", &(total / 60).to_string())
            .replace("{seconds}", &(total % 60).to_string())
    }

    fn emit(&self, event: SessionEvent, user_id: Option<&str>) {
        let line = event.to_audit_string();
        match event {
            SessionEvent::WarningIssued { .. } | SessionEvent::ReauthRequired { .. } => {
                tracing::warn!(target: "security::session", "{}", line)
            }
            _ => tracing::info!(target: "security::session", "{}", line),
        }
        if let Some(log) = &self.log {
            log.record_at(event.timestamp(), event.kind(), user_id, event.details());
        }
    }
}

impl Default for SessionLifecycleManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl std::fmt::Debug for SessionLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycleManager")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

/// 128-bit session id from the OS CSPRNG.
fn generate_session_id() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    format!("sess_{}", hex::encode(bytes))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000)
    }

    fn minutes(m: i64) -> Duration {
        Duration::minutes(m)
    }

    fn started() -> SessionLifecycleManager {
        let manager = SessionLifecycleManager::default();
        manager.start("officer-7", t0());
        manager
    }

    #[test]
    fn test_no_session_by_default() {
        let manager = SessionLifecycleManager::default();
        assert_eq!(manager.state(), SessionState::NoSession);
        assert!(manager.snapshot(t0()).is_none());
        assert_eq!(manager.tick(t0()).state, SessionState::NoSession);
        assert_eq!(manager.extend_session(t0()), SessionState::NoSession);
    }

    #[test]
    fn test_timeline_active_warning_expired() {
        let manager = started();
        assert_eq!(manager.tick(t0()).state, SessionState::Active);

        let tick = manager.tick(t0() + minutes(26));
        assert_eq!(tick.state, SessionState::Warning);
        assert_eq!(
            tick.message.as_deref(),
            Some("Your session expires in 4 minute(s) 0 second(s). Extend it to keep working.")
        );

        let tick = manager.tick(t0() + minutes(31));
        assert_eq!(tick.state, SessionState::Expired);
        assert_eq!(tick.message, Some(manager.config().expiration_message.clone()));
    }

    #[test]
    fn test_warning_message_issued_once() {
        let manager = started();
        assert!(manager.tick(t0() + minutes(26)).message.is_some());
        let again = manager.tick(t0() + minutes(27));
        assert_eq!(again.state, SessionState::Warning);
        assert!(again.message.is_none());
    }

    #[test]
    fn test_warning_boundary_is_inclusive() {
        let manager = started();
        assert_eq!(manager.tick(t0() + minutes(25)).state, SessionState::Warning);

        let manager = started();
        let just_before = t0() + minutes(25) - Duration::seconds(1);
        assert_eq!(manager.tick(just_before).state, SessionState::Active);
    }

    #[test]
    fn test_extend_from_warning() {
        let manager = started();
        manager.tick(t0() + minutes(26));

        assert_eq!(manager.extend_session(t0() + minutes(26)), SessionState::Active);
        let snapshot = manager.snapshot(t0() + minutes(26)).unwrap();
        assert_eq!(snapshot.expires_at, t0() + minutes(56));
        assert_eq!(snapshot.time_until_expiry, minutes(30));
        assert!(!snapshot.show_warning);
        assert_eq!(manager.tick(t0() + minutes(40)).state, SessionState::Active);

        // Warning can be issued again for the new horizon
        assert!(manager.tick(t0() + minutes(52)).message.is_some());
    }

    #[test]
    fn test_expired_is_not_revived() {
        let manager = started();
        manager.tick(t0() + minutes(31));
        assert_eq!(manager.extend_session(t0() + minutes(32)), SessionState::Expired);
        assert_eq!(manager.tick(t0() + minutes(33)).state, SessionState::Expired);
        assert!(manager.tick(t0() + minutes(33)).message.is_none());
    }

    #[test]
    fn test_extend_after_horizon_without_tick_expires() {
        let manager = started();
        assert_eq!(manager.extend_session(t0() + minutes(30)), SessionState::Expired);
        assert_eq!(manager.state(), SessionState::Expired);
    }

    #[test]
    fn test_snapshot_derived_fields() {
        let manager = started();
        let snapshot = manager.snapshot(t0() + minutes(10)).unwrap();
        assert!(snapshot.is_valid);
        assert_eq!(snapshot.time_until_expiry, minutes(20));
        assert!(!snapshot.show_warning);

        let snapshot = manager.snapshot(t0() + minutes(27)).unwrap();
        assert!(snapshot.show_warning);

        let snapshot = manager.snapshot(t0() + minutes(45)).unwrap();
        assert!(!snapshot.is_valid);
        assert_eq!(snapshot.time_until_expiry, Duration::zero());
        assert!(!snapshot.show_warning);
    }

    #[test]
    fn test_snapshot_state_without_tick() {
        let manager = started();

        let snapshot = manager.snapshot(t0() + minutes(26)).unwrap();
        assert_eq!(snapshot.state, SessionState::Warning);
        assert!(snapshot.show_warning);

        let snapshot = manager.snapshot(t0() + minutes(31)).unwrap();
        assert_eq!(snapshot.state, SessionState::Expired);
        assert!(!snapshot.is_valid);

        // Snapshots never advance the stored state
        assert_eq!(manager.state(), SessionState::Active);
        assert_eq!(manager.snapshot(t0() + minutes(1)).unwrap().state, SessionState::Active);
    }

    #[test]
    fn test_earlier_tick_rearms_warning() {
        let manager = started();
        assert!(manager.tick(t0() + minutes(26)).message.is_some());

        assert_eq!(manager.tick(t0() + minutes(20)).state, SessionState::Active);

        let tick = manager.tick(t0() + minutes(27));
        assert_eq!(tick.state, SessionState::Warning);
        assert!(tick.message.is_some());
    }

    #[test]
    fn test_oversized_timeout_saturates() {
        let manager = SessionLifecycleManager::new(SessionConfig {
            timeout_secs: 10_000_000_000_000_000,
            ..SessionConfig::default()
        });
        manager.start("officer-7", t0());
        let snapshot = manager.snapshot(t0()).unwrap();
        assert_eq!(snapshot.expires_at, t0() + Duration::days(7));

        assert_eq!(manager.extend_session(t0() + minutes(1)), SessionState::Active);
        let snapshot = manager.snapshot(t0() + minutes(1)).unwrap();
        assert_eq!(snapshot.expires_at, t0() + minutes(1) + Duration::days(7));
    }

    #[test]
    fn test_horizon_pinned_at_max_instant() {
        let manager = SessionLifecycleManager::default();
        let late = DateTime::<Utc>::MAX_UTC - minutes(1);
        manager.start("officer-7", late);

        let snapshot = manager.snapshot(late).unwrap();
        assert_eq!(snapshot.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(snapshot.is_valid);
        assert_eq!(manager.extend_session(late), SessionState::Active);
    }

    #[test]
    fn test_record_activity_does_not_extend() {
        let manager = started();
        manager.record_activity(t0() + minutes(20));
        let snapshot = manager.snapshot(t0() + minutes(20)).unwrap();
        assert_eq!(snapshot.last_activity, t0() + minutes(20));
        assert_eq!(snapshot.expires_at, t0() + minutes(30));
    }

    #[test]
    fn test_logout_from_expired() {
        let manager = started();
        manager.tick(t0() + minutes(31));
        assert!(manager.logout(t0() + minutes(32)));
        assert_eq!(manager.state(), SessionState::NoSession);
        assert!(!manager.logout(t0() + minutes(33)));
    }

    #[test]
    fn test_events_recorded_in_log() {
        let log = Arc::new(SecurityLog::default());
        let manager = SessionLifecycleManager::default().with_log(log.clone());
        manager.start("u1", t0());
        manager.tick(t0() + minutes(26));
        manager.tick(t0() + minutes(31));
        manager.logout(t0() + minutes(32));

        let kinds: Vec<_> = log.recent(10).into_iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SecurityEventKind::SessionStarted,
                SecurityEventKind::SessionWarning,
                SecurityEventKind::SessionExpired,
                SecurityEventKind::SessionTerminated,
            ]
        );
    }

    #[test]
    fn test_custom_config_clamps_warning() {
        let config = SessionConfig::custom(60, 120);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.warning_threshold_secs, 59);

        let config = SessionConfig::custom(u64::MAX, 300);
        assert_eq!(config.timeout_secs, MAX_SESSION_TIMEOUT_SECS);
        assert_eq!(config.warning_threshold_secs, 300);
    }

    #[test]
    fn test_session_ids_are_random() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert!(a.starts_with("sess_"));
        assert_eq!(a.len(), 5 + 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_event_audit_string() {
        let event = SessionEvent::Terminated {
            session_id: "sess_1".to_string(),
            timestamp: t0(),
            reason: "logout".to_string(),
        };
        let line = event.to_audit_string();
        assert!(line.contains("SESSION_TERMINATED"));
        assert!(line.contains("reason=logout"));
    }
}
