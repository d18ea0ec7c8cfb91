//! CRC-32 digest for settings file validation
//!
//! Uses CRC-32/ISO-HDLC (polynomial 0x04C11DB7, reflected, init and xorout
//! 0xFFFFFFFF), the variant found in Ethernet, ZIP and PNG. The trailer of a
//! settings file records this value in decimal.

use std::fmt;

use crc::{CRC_32_ISO_HDLC, Crc, Digest};

use crate::rolling::RollingChecksum;

static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Compute the CRC-32 of a complete buffer
///
/// # Example
///
/// ```
/// use setkeep_checksum::crc32;
///
/// assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
/// assert_eq!(crc32(b""), 0);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Incremental CRC-32 digest
#[derive(Clone)]
pub struct Crc32 {
    digest: Digest<'static, u32>,
}

impl Crc32 {
    /// Create a digest over the empty input
    pub fn new() -> Self {
        Self {
            digest: CRC32.digest(),
        }
    }

    /// Boxed constructor, usable as a checksum factory
    pub fn boxed() -> Box<dyn RollingChecksum + Send> {
        Box::new(Self::new())
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crc32")
            .field("value", &format_args!("{:08x}", self.value()))
            .finish()
    }
}

impl RollingChecksum for Crc32 {
    fn update(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    fn value(&self) -> u32 {
        // finalize consumes the digest
        self.digest.clone().finalize()
    }

    fn reset(&mut self) {
        self.digest = CRC32.digest();
    }
}
