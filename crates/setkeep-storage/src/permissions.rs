//! Permission mask and key-listing filters
//!
//! Every setting carries a mask over four flags. `SYSTEM`, `ADMIN` and
//! `USER` describe who may see or change a setting; `VOLATILE` keeps it out
//! of the backing file. Listing operations select keys by comparing each
//! entry's mask against a target mask under one of four [`FilterMode`]s.

use bitflags::bitflags;

use crate::{Result, SettingsError};

/// Size of the fixed-width permission string plus a terminator, for
/// callers copying it into byte buffers.
pub const PERMISSION_STRING_SIZE: usize = 33;

bitflags! {
    /// Permission flags of a setting
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u8 {
        /// Owned by the platform
        const SYSTEM = 0b0000_0001;
        /// Visible to administrators
        const ADMIN = 0b0000_0010;
        /// Visible to end users
        const USER = 0b0000_0100;
        /// Never written to the backing file
        const VOLATILE = 0b0000_1000;
    }
}

impl Permissions {
    /// Build a mask from raw bits, rejecting undefined bits
    pub fn validate(bits: u8) -> Result<Self> {
        Self::from_bits(bits).ok_or_else(|| {
            SettingsError::InvalidInput(format!("invalid permission bits {bits:#04x}"))
        })
    }

    /// Whether every set bit is a defined flag
    ///
    /// Masks built through `from_bits_retain` can carry undefined bits; the
    /// registry checks this on every write.
    pub fn is_valid(self) -> bool {
        Self::all().contains(self)
    }

    /// Fail with `InvalidInput` if the mask carries undefined bits
    pub fn ensure_valid(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(SettingsError::InvalidInput(format!(
                "invalid permission bits {:#04x}",
                self.bits()
            )))
        }
    }

    /// Whether the setting is excluded from persistence
    pub fn is_volatile(self) -> bool {
        self.contains(Self::VOLATILE)
    }

    /// Render `"SYSTEM | ADMIN | USER | VOLATILE"` with absent flags blanked
    ///
    /// The result is always 32 characters, so columns line up in
    /// diagnostics output.
    pub fn to_fixed_width(self) -> Result<String> {
        self.ensure_valid()?;

        let field = |flag: Self, name: &str| {
            if self.contains(flag) {
                name.to_string()
            } else {
                " ".repeat(name.len())
            }
        };

        Ok(format!(
            "{} | {} | {} | {}",
            field(Self::SYSTEM, "SYSTEM"),
            field(Self::ADMIN, "ADMIN"),
            field(Self::USER, "USER"),
            field(Self::VOLATILE, "VOLATILE"),
        ))
    }
}

/// Policy for selecting entries by permission mask
///
/// With target mask `P` and entry mask `E`:
///
/// | Mode | Keeps entry when |
/// |------|------------------|
/// | `AnyOfListed` | `E & P != 0` |
/// | `AllOfListed` | `E == P` |
/// | `ExcludeAllOfListed` | `E != P` |
/// | `ExcludeAnyOfListed` | `E & P == 0` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterMode {
    /// Entry shares at least one flag with the target
    AnyOfListed = 0,
    /// Entry mask equals the target exactly
    AllOfListed = 1,
    /// Entry mask differs from the target
    ExcludeAllOfListed = 2,
    /// Entry shares no flag with the target
    ExcludeAnyOfListed = 3,
}

impl FilterMode {
    /// Whether an entry with mask `entry` is selected for `target`
    pub fn keeps(self, target: Permissions, entry: Permissions) -> bool {
        match self {
            Self::AnyOfListed => entry.intersects(target),
            Self::AllOfListed => entry == target,
            Self::ExcludeAllOfListed => entry != target,
            Self::ExcludeAnyOfListed => !entry.intersects(target),
        }
    }
}

impl TryFrom<u8> for FilterMode {
    type Error = SettingsError;

    fn try_from(raw: u8) -> Result<Self> {
        match raw {
            0 => Ok(Self::AnyOfListed),
            1 => Ok(Self::AllOfListed),
            2 => Ok(Self::ExcludeAllOfListed),
            3 => Ok(Self::ExcludeAnyOfListed),
            _ => Err(SettingsError::InvalidInput(format!(
                "unknown filter mode {raw}"
            ))),
        }
    }
}
