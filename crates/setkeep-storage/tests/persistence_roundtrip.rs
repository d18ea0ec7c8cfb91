#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Store and load cycles through the public registry API

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use setkeep_checksum::crc32;
use setkeep_storage::{
    FilterMode, FsSettingsFile, MemoryFaults, MemorySettingsFile, PersistenceError, Permissions,
    RegistryConfig, SettingsError, SettingsRegistry,
};
use tempfile::TempDir;

fn populated(file: MemorySettingsFile) -> SettingsRegistry {
    let mut registry = SettingsRegistry::with_backing_file(RegistryConfig::default(), file);
    registry
        .register_int("net.timeout", Permissions::SYSTEM, 30)
        .unwrap();
    registry
        .register_real("ctl.gain", Permissions::ADMIN, 0.1)
        .unwrap();
    registry
        .register_string("wifi.ssid", Permissions::USER, "home")
        .unwrap();
    registry
        .register_int("session.id", Permissions::USER | Permissions::VOLATILE, 7)
        .unwrap();
    registry
}

/// Fresh registry with the same registrations, as after a restart
fn restarted(file: MemorySettingsFile) -> SettingsRegistry {
    let mut registry = SettingsRegistry::with_backing_file(RegistryConfig::default(), file);
    registry
        .register_int("net.timeout", Permissions::SYSTEM, 30)
        .unwrap();
    registry
        .register_real("ctl.gain", Permissions::ADMIN, 0.1)
        .unwrap();
    registry
        .register_string("wifi.ssid", Permissions::USER, "home")
        .unwrap();
    registry
}

#[test]
fn test_end_to_end_timeout_setting() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.put_int("net.timeout", 45).unwrap();
    registry.store_to_persistent_storage().unwrap();
    drop(registry);

    let mut fresh = restarted(file.clone());
    fresh.load_from_persistent_storage().unwrap();
    assert_eq!(fresh.get_int("net.timeout").unwrap(), (45, Permissions::SYSTEM));

    // Corrupt the first data line; nothing may be applied
    assert!(file.corrupt_byte(2));
    let mut fresh = restarted(file);
    fresh.put_int("net.timeout", 99).unwrap();
    let err = fresh.load_from_persistent_storage().unwrap_err();
    assert!(matches!(
        err,
        SettingsError::PersistentStorage(PersistenceError::ChecksumMismatch { .. })
    ));
    assert_eq!(fresh.get_int("net.timeout").unwrap(), (99, Permissions::SYSTEM));
    assert_eq!(fresh.get_string("wifi.ssid").unwrap().0, "home");
}

#[test]
fn test_stored_file_contents() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.put_string("wifi.ssid", "office net").unwrap();
    let summary = registry.store_to_persistent_storage().unwrap();

    let data = "ctl.gain\t1\t0.1\nnet.timeout\t0\t30\nwifi.ssid\t2\toffice net\n";
    let expected = format!("{data}\r{}\n", crc32(data.as_bytes()));
    assert_eq!(String::from_utf8(file.contents()).unwrap(), expected);
    assert_eq!(summary.written, 3);
    assert_eq!(summary.skipped_volatile, 1);
    assert_eq!(registry.validate_checksum().unwrap(), summary.checksum);
}

#[test]
fn test_volatile_settings_not_persisted() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.put_int("session.id", 1234).unwrap();
    registry.store_to_persistent_storage().unwrap();

    let contents = String::from_utf8(file.contents()).unwrap();
    assert!(!contents.contains("session.id"));

    let mut fresh = restarted(file);
    fresh.load_from_persistent_storage().unwrap();
    assert!(!fresh.contains_key("session.id"));
    assert_eq!(
        fresh
            .list_keys("", Permissions::VOLATILE, FilterMode::AnyOfListed)
            .unwrap(),
        Vec::<String>::new()
    );
}

#[test]
fn test_real_values_survive_exactly() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    for value in [0.1, -2.5e-300, 1.0 / 3.0, f64::MAX, f64::INFINITY] {
        registry.put_real("ctl.gain", value).unwrap();
        registry.store_to_persistent_storage().unwrap();

        let mut fresh = restarted(file.clone());
        fresh.load_from_persistent_storage().unwrap();
        assert_eq!(
            fresh.get_real("ctl.gain").unwrap().0.to_bits(),
            value.to_bits()
        );
    }
}

#[test]
fn test_restore_then_reload() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.put_int("net.timeout", 45).unwrap();
    registry.store_to_persistent_storage().unwrap();

    registry
        .restore_defaults("", Permissions::all(), FilterMode::AnyOfListed)
        .unwrap();
    assert_eq!(registry.get_int("net.timeout").unwrap().0, 30);

    registry.load_from_persistent_storage().unwrap();
    assert_eq!(registry.get_int("net.timeout").unwrap().0, 45);
}

#[test]
fn test_empty_string_breaks_reload() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.put_string("wifi.ssid", "").unwrap();
    registry.store_to_persistent_storage().unwrap();

    // Checksum still holds; the empty value field is what fails
    assert!(registry.validate_checksum().is_ok());
    let mut fresh = restarted(file);
    assert!(matches!(
        fresh.load_from_persistent_storage(),
        Err(SettingsError::PersistentStorage(PersistenceError::Format { .. }))
    ));
}

#[test]
fn test_io_faults_surface_as_storage_errors() {
    let file = MemorySettingsFile::new();
    let mut registry = populated(file.clone());
    registry.store_to_persistent_storage().unwrap();

    let faults = [
        MemoryFaults {
            open_for_write: true,
            ..MemoryFaults::default()
        },
        MemoryFaults {
            write: true,
            ..MemoryFaults::default()
        },
        MemoryFaults {
            close: true,
            ..MemoryFaults::default()
        },
    ];
    for fault in faults {
        file.set_faults(fault);
        assert!(matches!(
            registry.store_to_persistent_storage(),
            Err(SettingsError::PersistentStorage(PersistenceError::File(_)))
        ));
    }

    file.clear_faults();
    registry.store_to_persistent_storage().unwrap();

    for fault in [
        MemoryFaults {
            open_for_read: true,
            ..MemoryFaults::default()
        },
        MemoryFaults {
            read_line: true,
            ..MemoryFaults::default()
        },
    ] {
        file.set_faults(fault);
        let mut fresh = restarted(file.clone());
        fresh.put_int("net.timeout", 5).unwrap();
        assert!(fresh.load_from_persistent_storage().is_err());
        assert_eq!(fresh.get_int("net.timeout").unwrap().0, 5);
    }
}

#[test]
fn test_filesystem_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.dat");

    let mut registry =
        SettingsRegistry::with_backing_file(RegistryConfig::default(), FsSettingsFile::new(&path));
    registry
        .register_string("wifi.ssid", Permissions::USER, "home")
        .unwrap();
    registry.put_string("wifi.ssid", "café").unwrap();
    registry.store_to_persistent_storage().unwrap();
    drop(registry);

    let mut fresh =
        SettingsRegistry::with_backing_file(RegistryConfig::default(), FsSettingsFile::new(&path));
    fresh
        .register_string("wifi.ssid", Permissions::USER, "home")
        .unwrap();
    fresh.load_from_persistent_storage().unwrap();
    assert_eq!(fresh.get_string("wifi.ssid").unwrap().0, "café");
}

#[test]
fn test_missing_file_fails_load() {
    let dir = TempDir::new().unwrap();
    let mut registry = SettingsRegistry::with_backing_file(
        RegistryConfig::default(),
        FsSettingsFile::new(dir.path().join("absent.dat")),
    );
    assert!(matches!(
        registry.load_from_persistent_storage(),
        Err(SettingsError::PersistentStorage(PersistenceError::File(_)))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_any_data_byte_flip_blocks_load(index in any::<prop::sample::Index>()) {
        let file = MemorySettingsFile::new();
        let mut registry = populated(file.clone());
        registry.put_int("net.timeout", 45).unwrap();
        registry.put_string("wifi.ssid", "office").unwrap();
        registry.store_to_persistent_storage().unwrap();

        // Only data bytes; the trailer is the last line
        let contents = file.contents();
        let trailer_start = contents
            .iter()
            .rposition(|&b| b == b'\r')
            .unwrap();
        let offset = index.index(trailer_start);
        prop_assert!(file.corrupt_byte(offset));

        let mut fresh = restarted(file);
        prop_assert!(fresh.load_from_persistent_storage().is_err());
        prop_assert_eq!(fresh.get_int("net.timeout").unwrap().0, 30);
        prop_assert_eq!(fresh.get_string("wifi.ssid").unwrap().0, "home");
    }
}
