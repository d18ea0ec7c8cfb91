//! Bounded-wait lock around registry-level flags

use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;

/// Lock was not acquired within the allowed wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Lock not acquired within {waited:?}")]
pub struct LockTimeout {
    /// How long the caller waited
    pub waited: Duration,
}

/// Boolean guarded by a mutex that is never waited on indefinitely
#[derive(Debug)]
pub struct GuardedFlag {
    value: Mutex<bool>,
}

impl GuardedFlag {
    /// Create a flag with an initial value
    pub fn new(value: bool) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    /// Read the flag, waiting at most `timeout` for the lock
    pub fn get(&self, timeout: Duration) -> Result<bool, LockTimeout> {
        self.value
            .try_lock_for(timeout)
            .map(|guard| *guard)
            .ok_or(LockTimeout { waited: timeout })
    }

    /// Overwrite the flag, waiting at most `timeout` for the lock
    pub fn set(&self, value: bool, timeout: Duration) -> Result<(), LockTimeout> {
        let mut guard = self
            .value
            .try_lock_for(timeout)
            .ok_or(LockTimeout { waited: timeout })?;
        *guard = value;
        Ok(())
    }

    /// Hold the lock until the guard is dropped
    #[cfg(test)]
    pub(crate) fn hold(&self) -> parking_lot::MutexGuard<'_, bool> {
        self.value.lock()
    }
}
