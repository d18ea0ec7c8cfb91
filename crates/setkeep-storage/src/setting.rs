//! Registry entries

use crate::permissions::Permissions;
use setkeep_formats::{SettingValue, ValueType};

/// One registered setting: current value, default value and permissions
///
/// The type is fixed by the default given at registration. Current and
/// default are independent owned values, so overwriting one never touches
/// the other.
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    permissions: Permissions,
    current: SettingValue,
    default: SettingValue,
}

impl Setting {
    /// Create an entry whose current value equals its default
    pub fn new(permissions: Permissions, default: SettingValue) -> Self {
        Self {
            permissions,
            current: default.clone(),
            default,
        }
    }

    /// Registered type
    pub fn value_type(&self) -> ValueType {
        self.default.value_type()
    }

    /// Permission mask
    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    /// Current value
    pub fn current(&self) -> &SettingValue {
        &self.current
    }

    /// Default value
    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    /// Whether the entry is kept out of the backing file
    pub fn is_volatile(&self) -> bool {
        self.permissions.is_volatile()
    }

    /// Replace the current value, returning the registered type on mismatch
    pub(crate) fn set_current(&mut self, value: SettingValue) -> Result<(), ValueType> {
        if value.value_type() != self.value_type() {
            return Err(self.value_type());
        }
        self.current = value;
        Ok(())
    }

    /// Copy the default over the current value
    pub(crate) fn restore_default(&mut self) {
        self.current.clone_from(&self.default);
    }
}
