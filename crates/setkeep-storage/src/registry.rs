//! Settings registry facade

use std::fmt;

use tracing::{debug, warn};

use setkeep_checksum::{Crc32, RollingChecksum};
use setkeep_formats::{SettingLine, SettingValue, ValueType};

use crate::config::RegistryConfig;
use crate::file::SettingsFile;
use crate::map::{OrderedSettingsMap, SettingsMap, Visit};
use crate::permissions::{FilterMode, Permissions};
use crate::persistence::{self, LoadSummary, PersistenceError, StoreSummary};
use crate::setting::Setting;
use crate::sync::GuardedFlag;
use crate::{Result, SettingsError};

/// Constructor for the checksum used by the persistence passes
pub type ChecksumFactory = fn() -> Box<dyn RollingChecksum + Send>;

type BackingFile = Box<dyn SettingsFile + Send + Sync>;

/// Typed settings registry
///
/// Owns every registered [`Setting`] and, optionally, the backing file used
/// to persist the non-volatile ones. Mutating operations take `&mut self`;
/// share a registry across threads by wrapping it in a lock.
///
/// Dropping the registry force-closes the backing file.
pub struct SettingsRegistry<M: SettingsMap = OrderedSettingsMap> {
    settings: M,
    file: Option<BackingFile>,
    storage_enabled: GuardedFlag,
    config: RegistryConfig,
    new_checksum: ChecksumFactory,
}

impl SettingsRegistry<OrderedSettingsMap> {
    /// Create a registry without persistent storage
    pub fn new(config: RegistryConfig) -> Self {
        Self::from_parts(OrderedSettingsMap::new(), None, config)
    }

    /// Create a registry persisting to `file`
    pub fn with_backing_file<F>(config: RegistryConfig, file: F) -> Self
    where
        F: SettingsFile + Send + Sync + 'static,
    {
        Self::from_parts(OrderedSettingsMap::new(), Some(Box::new(file)), config)
    }
}

impl<M: SettingsMap> SettingsRegistry<M> {
    /// Create a registry from its collaborators
    ///
    /// Persistent storage starts enabled when a file is given and the
    /// configuration does not force it off.
    pub fn from_parts(settings: M, file: Option<BackingFile>, config: RegistryConfig) -> Self {
        let enabled = file.is_some() && !config.force_disable_persistent_storage;
        debug!("Creating settings registry (persistent storage enabled: {enabled})");

        Self {
            settings,
            file,
            storage_enabled: GuardedFlag::new(enabled),
            config,
            new_checksum: Crc32::boxed,
        }
    }

    /// Replace the checksum used for store, validate and load
    #[must_use]
    pub fn with_checksum(mut self, factory: ChecksumFactory) -> Self {
        self.new_checksum = factory;
        self
    }

    /// Configuration the registry was built with
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Number of registered settings
    pub fn len(&self) -> usize {
        self.settings.len()
    }

    /// Whether no setting is registered
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Whether `key` is registered
    pub fn contains_key(&self, key: &str) -> bool {
        self.settings.search(key).is_some()
    }

    /// Registered type of `key`
    pub fn value_type(&self, key: &str) -> Result<ValueType> {
        Ok(self.lookup(key)?.value_type())
    }

    // Registration

    /// Register `key` with a default value; the type is fixed from here on
    pub fn register(
        &mut self,
        key: &str,
        permissions: Permissions,
        default: SettingValue,
    ) -> Result<()> {
        register_entry(&mut self.settings, &self.config, key, permissions, default)
    }

    /// Register an integer setting
    pub fn register_int(
        &mut self,
        key: &str,
        permissions: Permissions,
        default: i64,
    ) -> Result<()> {
        self.register(key, permissions, SettingValue::Integer(default))
    }

    /// Register a real setting
    pub fn register_real(
        &mut self,
        key: &str,
        permissions: Permissions,
        default: f64,
    ) -> Result<()> {
        self.register(key, permissions, SettingValue::Real(default))
    }

    /// Register a string setting
    pub fn register_string(
        &mut self,
        key: &str,
        permissions: Permissions,
        default: &str,
    ) -> Result<()> {
        self.register(key, permissions, SettingValue::from(default))
    }

    // Current values

    /// Current value and permissions of `key`, whatever its type
    pub fn get_value(&self, key: &str) -> Result<(&SettingValue, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((setting.current(), setting.permissions()))
    }

    /// Current value of an integer setting
    pub fn get_int(&self, key: &str) -> Result<(i64, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_int(key, setting.current())?, setting.permissions()))
    }

    /// Current value of a real setting
    pub fn get_real(&self, key: &str) -> Result<(f64, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_real(key, setting.current())?, setting.permissions()))
    }

    /// Current value of a string setting
    pub fn get_string(&self, key: &str) -> Result<(&str, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_str(key, setting.current())?, setting.permissions()))
    }

    /// Copy the current value of a string setting into `buf`
    ///
    /// The bytes are followed by a NUL, so `buf` must be longer than the
    /// value. Returns the value length without the terminator.
    pub fn get_string_into(&self, key: &str, buf: &mut [u8]) -> Result<(usize, Permissions)> {
        ensure_buffer(buf)?;
        let (value, permissions) = self.get_string(key)?;
        Ok((copy_terminated(value, buf)?, permissions))
    }

    // Default values

    /// Default value and permissions of `key`, whatever its type
    pub fn get_default_value(&self, key: &str) -> Result<(&SettingValue, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((setting.default_value(), setting.permissions()))
    }

    /// Default value of an integer setting
    pub fn get_default_int(&self, key: &str) -> Result<(i64, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_int(key, setting.default_value())?, setting.permissions()))
    }

    /// Default value of a real setting
    pub fn get_default_real(&self, key: &str) -> Result<(f64, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_real(key, setting.default_value())?, setting.permissions()))
    }

    /// Default value of a string setting
    pub fn get_default_string(&self, key: &str) -> Result<(&str, Permissions)> {
        let setting = self.lookup(key)?;
        Ok((expect_str(key, setting.default_value())?, setting.permissions()))
    }

    /// Copy the default value of a string setting into `buf`
    pub fn get_default_string_into(
        &self,
        key: &str,
        buf: &mut [u8],
    ) -> Result<(usize, Permissions)> {
        ensure_buffer(buf)?;
        let (value, permissions) = self.get_default_string(key)?;
        Ok((copy_terminated(value, buf)?, permissions))
    }

    // Writes

    /// Overwrite the current value of `key`; the type must match
    pub fn put(&mut self, key: &str, value: SettingValue) -> Result<()> {
        put_entry(&mut self.settings, &self.config, key, value)
    }

    /// Overwrite an integer setting
    pub fn put_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.put(key, SettingValue::Integer(value))
    }

    /// Overwrite a real setting
    pub fn put_real(&mut self, key: &str, value: f64) -> Result<()> {
        self.put(key, SettingValue::Real(value))
    }

    /// Overwrite a string setting
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, SettingValue::from(value))
    }

    // Enumeration

    /// Keys under `prefix` whose permissions pass `filter` against
    /// `permissions`, in store order
    ///
    /// An empty prefix selects every key.
    pub fn list_keys(
        &self,
        prefix: &str,
        permissions: Permissions,
        filter: FilterMode,
    ) -> Result<Vec<String>> {
        permissions.ensure_valid()?;

        let mut keys = Vec::new();
        self.settings
            .visit_prefix(prefix, |key, setting| -> Result<Visit> {
                if filter.keeps(permissions, setting.permissions()) {
                    keys.push(key.to_string());
                }
                Ok(Visit::Continue)
            })?;
        Ok(keys)
    }

    /// Reset every key selected as by [`list_keys`](Self::list_keys) to its
    /// default
    ///
    /// Stops at the first failure; keys reset before it stay reset.
    pub fn restore_defaults(
        &mut self,
        prefix: &str,
        permissions: Permissions,
        filter: FilterMode,
    ) -> Result<()> {
        let keys = self.list_keys(prefix, permissions, filter)?;
        for key in &keys {
            self.settings
                .search_mut(key)
                .ok_or_else(|| SettingsError::KeyNotFound(key.clone()))?
                .restore_default();
        }
        debug!("Restored {} settings under {prefix:?} to defaults", keys.len());
        Ok(())
    }

    // Persistence

    /// Write every non-volatile setting to the backing file
    pub fn store_to_persistent_storage(&mut self) -> Result<StoreSummary> {
        let file = self.file.as_mut().ok_or(PersistenceError::NoBackingFile)?;
        let mut checksum = (self.new_checksum)();
        Ok(persistence::store(
            &self.settings,
            &mut **file,
            &mut *checksum,
        )?)
    }

    /// Check the backing file against its trailer without applying anything
    ///
    /// Returns the validated checksum.
    pub fn validate_checksum(&mut self) -> Result<u32> {
        let file = self.file.as_mut().ok_or(PersistenceError::NoBackingFile)?;
        let mut checksum = (self.new_checksum)();
        Ok(persistence::validate(&mut **file, &mut *checksum)?)
    }

    /// Validate the backing file, then apply every line in it
    ///
    /// A line for a registered key overwrites its current value. A line for
    /// an unknown key registers it as [`Permissions::VOLATILE`] with the
    /// loaded value as default. Nothing is applied if validation fails.
    pub fn load_from_persistent_storage(&mut self) -> Result<LoadSummary> {
        let file = self.file.as_mut().ok_or(PersistenceError::NoBackingFile)?;
        let mut checksum = (self.new_checksum)();
        let settings = &mut self.settings;
        let config = &self.config;

        Ok(persistence::load(&mut **file, &mut *checksum, |line| {
            apply_loaded(settings, config, line)
        })?)
    }

    /// Whether persistent storage is enabled
    ///
    /// Reports `false` if the lock is not acquired in time.
    pub fn is_persistent_storage_enabled(&self) -> bool {
        match self.storage_enabled.get(self.config.lock_timeout()) {
            Ok(enabled) => enabled,
            Err(err) => {
                warn!("Reading persistent storage state failed: {err}");
                false
            }
        }
    }

    /// Turn persistent storage off
    ///
    /// Returns `false` if the lock is not acquired in time and the state is
    /// unchanged.
    pub fn disable_persistent_storage(&self) -> bool {
        match self.storage_enabled.set(false, self.config.lock_timeout()) {
            Ok(()) => {
                debug!("Persistent storage disabled");
                true
            }
            Err(err) => {
                warn!("Disabling persistent storage failed: {err}");
                false
            }
        }
    }

    fn lookup(&self, key: &str) -> Result<&Setting> {
        check_key(key, &self.config)?;
        self.settings
            .search(key)
            .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))
    }
}

impl<M: SettingsMap> Drop for SettingsRegistry<M> {
    fn drop(&mut self) {
        if let Some(file) = self.file.as_mut() {
            file.force_close();
        }
    }
}

impl<M: SettingsMap> fmt::Debug for SettingsRegistry<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsRegistry")
            .field("settings", &self.settings.len())
            .field("backing_file", &self.file.as_ref().map(|file| file.status()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn check_key(key: &str, config: &RegistryConfig) -> Result<()> {
    if key.is_empty() {
        return Err(SettingsError::InvalidInput("empty key".to_string()));
    }
    if key.len() > config.max_key_len {
        return Err(SettingsError::InvalidInput(format!(
            "key of {} bytes exceeds limit of {}",
            key.len(),
            config.max_key_len
        )));
    }
    // These would break the line and trailer syntax of the backing file
    if key.contains(['\t', '\n', '\r']) {
        return Err(SettingsError::InvalidInput(format!(
            "key {key:?} contains a control separator"
        )));
    }
    Ok(())
}

fn register_entry<M: SettingsMap>(
    settings: &mut M,
    config: &RegistryConfig,
    key: &str,
    permissions: Permissions,
    default: SettingValue,
) -> Result<()> {
    check_key(key, config)?;
    permissions.ensure_valid()?;

    let value_type = default.value_type();
    if settings
        .insert_if_absent(key, Setting::new(permissions, default))
        .is_some()
    {
        return Err(SettingsError::KeyExists(key.to_string()));
    }
    debug!("Registered {value_type} setting {key}");
    Ok(())
}

fn put_entry<M: SettingsMap>(
    settings: &mut M,
    config: &RegistryConfig,
    key: &str,
    value: SettingValue,
) -> Result<()> {
    check_key(key, config)?;
    let setting = settings
        .search_mut(key)
        .ok_or_else(|| SettingsError::KeyNotFound(key.to_string()))?;
    setting.permissions().ensure_valid()?;

    let expected = value.value_type();
    setting
        .set_current(value)
        .map_err(|actual| SettingsError::TypeMismatch {
            key: key.to_string(),
            expected,
            actual,
        })
}

fn apply_loaded<M: SettingsMap>(
    settings: &mut M,
    config: &RegistryConfig,
    line: SettingLine,
) -> std::result::Result<(), PersistenceError> {
    let SettingLine { key, value } = line;

    let result = if settings.search(&key).is_some() {
        put_entry(settings, config, &key, value)
    } else {
        debug!("Loaded unregistered setting {key}, registering as volatile");
        register_entry(settings, config, &key, Permissions::VOLATILE, value)
    };

    result.map_err(|err| PersistenceError::Rejected {
        key,
        source: Box::new(err),
    })
}

fn mismatch(key: &str, expected: ValueType, value: &SettingValue) -> SettingsError {
    SettingsError::TypeMismatch {
        key: key.to_string(),
        expected,
        actual: value.value_type(),
    }
}

fn expect_int(key: &str, value: &SettingValue) -> Result<i64> {
    value
        .as_int()
        .ok_or_else(|| mismatch(key, ValueType::Integer, value))
}

fn expect_real(key: &str, value: &SettingValue) -> Result<f64> {
    value
        .as_real()
        .ok_or_else(|| mismatch(key, ValueType::Real, value))
}

fn expect_str<'a>(key: &str, value: &'a SettingValue) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| mismatch(key, ValueType::String, value))
}

fn ensure_buffer(buf: &[u8]) -> Result<()> {
    if buf.is_empty() {
        return Err(SettingsError::InvalidInput("empty output buffer".to_string()));
    }
    Ok(())
}

fn copy_terminated(value: &str, buf: &mut [u8]) -> Result<usize> {
    let len = value.len();
    if len >= buf.len() {
        return Err(SettingsError::InsufficientBufferSize {
            required: len + 1,
            available: buf.len(),
        });
    }
    buf[..len].copy_from_slice(value.as_bytes());
    buf[len] = 0;
    Ok(len)
}
