//! Trait-based abstraction for incremental 32-bit digests
//!
//! The persistence layer never names a concrete algorithm. It feeds bytes in
//! emission order and compares the final value against the one recorded in
//! the file trailer, so any digest that can be updated chunk by chunk fits.

/// Incremental 32-bit digest
///
/// Feeding the same bytes in the same order must produce the same value
/// regardless of how the input is split across [`update`](Self::update)
/// calls. A freshly created or reset digest reports the digest of the empty
/// input.
pub trait RollingChecksum {
    /// Feed more bytes into the digest
    fn update(&mut self, bytes: &[u8]);

    /// Current digest of everything fed since creation or the last reset
    fn value(&self) -> u32;

    /// Forget all input
    fn reset(&mut self);

    /// Check the current digest against an expected value
    fn matches(&self, expected: u32) -> bool {
        self.value() == expected
    }
}

impl<T: RollingChecksum + ?Sized> RollingChecksum for Box<T> {
    fn update(&mut self, bytes: &[u8]) {
        (**self).update(bytes);
    }

    fn value(&self) -> u32 {
        (**self).value()
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Xor(u32);

    impl RollingChecksum for Xor {
        fn update(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 ^= u32::from(*b);
            }
        }

        fn value(&self) -> u32 {
            self.0
        }

        fn reset(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn test_matches_uses_value() {
        let mut digest = Xor::default();
        digest.update(&[0x0f, 0xf0]);
        assert!(digest.matches(0xff));
        assert!(!digest.matches(0));
    }

    #[test]
    fn test_boxed_digest_forwards() {
        let mut digest: Box<dyn RollingChecksum> = Box::new(Xor::default());
        digest.update(&[1, 2]);
        assert_eq!(digest.value(), 3);
        digest.reset();
        assert_eq!(digest.value(), 0);
    }
}
