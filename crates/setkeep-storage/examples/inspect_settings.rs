#![allow(clippy::expect_used, clippy::panic)]

//! Validate a settings file and print what it holds.
//!
//! Usage:
//!   RUST_LOG=debug cargo run --example inspect_settings -p setkeep-storage -- settings.dat
//!
//! Every key in the file is unknown to this program, so each one is loaded
//! as a volatile setting.

use setkeep_storage::{
    FilterMode, FsSettingsFile, PERMISSION_STRING_SIZE, Permissions, RegistryConfig,
    SettingsRegistry,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .expect("usage: inspect_settings <settings-file>");

    let mut registry =
        SettingsRegistry::with_backing_file(RegistryConfig::default(), FsSettingsFile::new(&path));

    println!("Reading: {path}");
    match registry.validate_checksum() {
        Ok(checksum) => println!("Checksum: {checksum} (valid)"),
        Err(err) => {
            println!("Checksum: {err}");
            return;
        }
    }

    let summary = registry
        .load_from_persistent_storage()
        .expect("failed to load settings");
    println!("Entries: {}\n", summary.applied);

    let keys = registry
        .list_keys("", Permissions::empty(), FilterMode::ExcludeAnyOfListed)
        .expect("empty mask is valid");
    let width = keys.iter().map(String::len).max().unwrap_or(0);

    println!(
        "  {:<width$}  {:<7}  {:<perms$}  value",
        "key",
        "type",
        "permissions",
        perms = PERMISSION_STRING_SIZE - 1
    );
    for key in &keys {
        let (value, permissions) = registry.get_value(key).expect("listed key");
        let permissions = permissions
            .to_fixed_width()
            .expect("loaded permissions are valid");
        println!(
            "  {key:<width$}  {:<7}  {permissions}  {value}",
            value.value_type().name()
        );
    }
}
