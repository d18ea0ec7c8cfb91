//! Checksums for setkeep persisted settings files
//!
//! A settings file is protected by a single 32-bit digest that is fed
//! incrementally while lines are written and again while they are read
//! back. This crate provides the abstraction over that digest and the
//! default algorithm.
//!
//! # Components
//!
//! - [`RollingChecksum`] - Trait for incremental 32-bit digests
//! - [`Crc32`] - CRC-32/ISO-HDLC (Ethernet, ZIP, PNG) implementation
//!
//! # Examples
//!
//! ```
//! use setkeep_checksum::{Crc32, RollingChecksum};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"1234");
//! crc.update(b"56789");
//! assert_eq!(crc.value(), 0xCBF4_3926);
//! assert_eq!(crc.value(), setkeep_checksum::crc32(b"123456789"));
//! ```
//!
//! ## Custom Digest
//!
//! ```
//! use setkeep_checksum::RollingChecksum;
//!
//! #[derive(Default)]
//! struct ByteSum(u32);
//!
//! impl RollingChecksum for ByteSum {
//!     fn update(&mut self, bytes: &[u8]) {
//!         for b in bytes {
//!             self.0 = self.0.wrapping_add(u32::from(*b));
//!         }
//!     }
//!
//!     fn value(&self) -> u32 {
//!         self.0
//!     }
//!
//!     fn reset(&mut self) {
//!         self.0 = 0;
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod crc32;
pub mod rolling;

pub use crc32::{Crc32, crc32};
pub use rolling::RollingChecksum;
