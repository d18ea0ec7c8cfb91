//! Registry configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_LOCK_TIMEOUT_MS, MAX_KEY_LEN};

/// Configuration for a [`SettingsRegistry`](crate::SettingsRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Longest wait for the persistent-storage lock, in milliseconds
    pub lock_timeout_ms: u64,

    /// Longest accepted key, in bytes
    pub max_key_len: usize,

    /// Keep persistent storage disabled even when a backing file is given
    pub force_disable_persistent_storage: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            max_key_len: MAX_KEY_LEN,
            force_disable_persistent_storage: false,
        }
    }
}

impl RegistryConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lock wait
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the longest accepted key
    #[must_use]
    pub const fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }

    /// Force persistent storage off
    #[must_use]
    pub const fn with_persistent_storage_disabled(mut self) -> Self {
        self.force_disable_persistent_storage = true;
        self
    }

    /// Lock wait as a duration
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_millis(100));
        assert_eq!(config.max_key_len, 64);
        assert!(!config.force_disable_persistent_storage);
    }

    #[test]
    fn test_builders() {
        let config = RegistryConfig::new()
            .with_lock_timeout(Duration::from_millis(5))
            .with_max_key_len(16)
            .with_persistent_storage_disabled();
        assert_eq!(config.lock_timeout_ms, 5);
        assert_eq!(config.max_key_len, 16);
        assert!(config.force_disable_persistent_storage);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"max_key_len": 32}"#).expect("valid config");
        assert_eq!(config.max_key_len, 32);
        assert_eq!(config.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);

        let json = serde_json::to_string(&config).expect("serialize");
        let back: RegistryConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}
