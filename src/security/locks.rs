// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Poison-tolerant lock helpers.
//!
//! The rate-limiter windows, the CSRF slot and the security log are each
//! guarded by an `RwLock` so the read-then-write sequences stay atomic on a
//! multi-threaded host. A panic while one of those locks is held must not
//! turn every later access check into a panic as well, so these helpers
//! recover the guard and log the event instead.
//!
//! ```
//! use std::sync::RwLock;
//! use lendguard::security::locks::{resilient_read, resilient_write};
//!
//! let slot = RwLock::new(Some("token".to_string()));
//! *resilient_write(&slot) = None;
//! assert!(resilient_read(&slot).is_none());
//! ```

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a read lock, recovering from poisoning.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        tracing::error!(
            target: "security::locks",
            event = "LOCK_POISONED_READ",
            "Security state lock was poisoned during read. Recovering last written state."
        );
        poisoned.into_inner()
    })
}

/// Acquire a write lock, recovering from poisoning.
///
/// The recovered state is whatever the panicking writer left behind; every
/// component guarded this way keeps its state valid between statements, so
/// the worst case is one lost update.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        tracing::error!(
            target: "security::locks",
            event = "LOCK_POISONED_WRITE",
            "Security state lock was poisoned during write. Recovering last written state."
        );
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_resilient_write_then_read() {
        let lock = RwLock::new(HashMap::<String, u32>::new());
        resilient_write(&lock).insert("login".to_string(), 3);
        assert_eq!(resilient_read(&lock).get("login"), Some(&3));
    }

    #[test]
    fn test_recovers_poisoned_lock() {
        let lock = Arc::new(RwLock::new(vec![1u64, 2]));
        let lock_clone = Arc::clone(&lock);

        // Poison the lock by panicking while holding it
        let handle = thread::spawn(move || {
            let mut guard = lock_clone.write().unwrap();
            guard.push(3);
            panic!("intentional panic to poison lock");
        });
        let _ = handle.join();
        assert!(lock.is_poisoned());

        assert_eq!(resilient_read(&lock).len(), 3);
        resilient_write(&lock).clear();
        assert!(resilient_read(&lock).is_empty());
    }
}
