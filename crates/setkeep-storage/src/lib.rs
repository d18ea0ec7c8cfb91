//! Typed, permission-gated settings registry with checksummed persistence.
//!
//! Independent modules register named settings (integer, real or string)
//! with a default value and a permission mask, then read and write them
//! through a single [`SettingsRegistry`]. The non-volatile subset can be
//! stored to a backing file and loaded back; every load is gated by a
//! checksum pass so a corrupted file never applies a single setting.
//!
//! The registry is built from four replaceable collaborators:
//!
//! - **Key-value store**: [`SettingsMap`], default [`OrderedSettingsMap`]
//! - **Backing file**: [`SettingsFile`], with [`FsSettingsFile`] and
//!   [`MemorySettingsFile`]
//! - **Lock**: [`GuardedFlag`], a bounded-wait mutex around the
//!   persistent-storage switch
//! - **Checksum**: any `setkeep_checksum::RollingChecksum`, CRC-32 by default
//!
//! # Example
//!
//! ```rust
//! use setkeep_storage::{
//!     FilterMode, MemorySettingsFile, Permissions, RegistryConfig, SettingsRegistry,
//! };
//!
//! # fn example() -> setkeep_storage::Result<()> {
//! let file = MemorySettingsFile::new();
//! let mut registry = SettingsRegistry::with_backing_file(RegistryConfig::default(), file.clone());
//!
//! registry.register_int("net.timeout", Permissions::SYSTEM, 30)?;
//! registry.put_int("net.timeout", 45)?;
//! registry.store_to_persistent_storage()?;
//!
//! let mut fresh = SettingsRegistry::with_backing_file(RegistryConfig::default(), file);
//! fresh.register_int("net.timeout", Permissions::SYSTEM, 30)?;
//! fresh.load_from_persistent_storage()?;
//! assert_eq!(fresh.get_int("net.timeout")?, (45, Permissions::SYSTEM));
//!
//! let keys = fresh.list_keys("net.", Permissions::SYSTEM, FilterMode::AnyOfListed)?;
//! assert_eq!(keys, vec!["net.timeout".to_string()]);
//! # Ok(())
//! # }
//! # example().expect("example runs");
//! ```

#![warn(missing_docs)]

use thiserror::Error;

// Permission mask and list filters
pub mod permissions;

// Registry entries
pub mod setting;

// Key-value store abstraction
pub mod map;

// Backing file abstraction and implementations
pub mod file;

// Bounded-wait lock
pub mod sync;

// Configuration
pub mod config;

// Store / validate / load passes
pub mod persistence;

// Public facade
mod registry;

pub use config::RegistryConfig;
pub use file::{
    FileError, FileStatus, FsSettingsFile, MemoryFaults, MemorySettingsFile, SettingsFile,
};
pub use map::{OrderedSettingsMap, SettingsMap, Visit};
pub use permissions::{FilterMode, PERMISSION_STRING_SIZE, Permissions};
pub use persistence::{LoadSummary, PersistenceError, StoreSummary};
pub use registry::{ChecksumFactory, SettingsRegistry};
pub use setting::Setting;
pub use setkeep_formats::{SettingValue, ValueType};
pub use sync::{GuardedFlag, LockTimeout};

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Errors returned by registry operations.
///
/// Every public operation reports failure through one of these variants;
/// output values are only meaningful on `Ok`.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Empty or oversized key, invalid permission bits, unknown filter
    /// policy, or an unusable caller buffer.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No setting is registered under the key.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// A setting is already registered under the key.
    #[error("Key already exists: {0}")]
    KeyExists(String),

    /// Accessor type disagrees with the registered type.
    #[error("Type mismatch for {key}: requested {expected}, registered as {actual}")]
    TypeMismatch {
        /// Key that was addressed
        key: String,
        /// Type the caller asked for
        expected: ValueType,
        /// Type the setting was registered with
        actual: ValueType,
    },

    /// Caller buffer cannot hold the string plus its terminator.
    #[error("Insufficient buffer size: need {required} bytes, have {available}")]
    InsufficientBufferSize {
        /// Bytes needed including the terminator
        required: usize,
        /// Bytes the caller supplied
        available: usize,
    },

    /// Backing file, checksum or parse failure during store or load.
    #[error("Persistent storage error: {0}")]
    PersistentStorage(#[from] PersistenceError),
}

/// Version information for the registry crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default longest accepted key, in bytes.
pub const MAX_KEY_LEN: usize = 64;

/// Default bounded wait for the persistent-storage lock, in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 100;
