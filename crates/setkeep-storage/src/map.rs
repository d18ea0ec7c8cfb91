//! Key-value store holding registry entries
//!
//! The registry only needs exact lookup, insert-if-absent and ordered
//! enumeration (all entries, or all entries under a key prefix). Those
//! operations form the [`SettingsMap`] trait so a platform can supply its own
//! container, for example a radix tree sized for a small heap.
//!
//! Enumeration takes a visitor closure that returns [`Visit`] to continue or
//! stop, or an error that ends the enumeration and is handed back to the
//! caller unchanged.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::setting::Setting;

/// Visitor decision after each entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Continue with the next entry
    Continue,
    /// End the enumeration successfully
    Stop,
}

/// Container for registry entries
///
/// Implementations must enumerate in a stable order; the registry exposes
/// that order through key listings and the backing file layout.
///
/// The registry does not lock the container. Implementations used from
/// several threads must synchronize internally, or callers must serialize
/// access to the whole registry.
pub trait SettingsMap {
    /// Look up an entry
    fn search(&self, key: &str) -> Option<&Setting>;

    /// Look up an entry for mutation
    fn search_mut(&mut self, key: &str) -> Option<&mut Setting>;

    /// Insert an entry unless the key is present
    ///
    /// Returns the rejected entry when the key already exists; the stored
    /// entry is left untouched.
    fn insert_if_absent(&mut self, key: &str, setting: Setting) -> Option<Setting>;

    /// Visit every entry whose key starts with `prefix`
    fn visit_prefix<E, F>(&self, prefix: &str, visitor: F) -> Result<(), E>
    where
        F: FnMut(&str, &Setting) -> Result<Visit, E>;

    /// Number of entries
    fn len(&self) -> usize;

    /// Visit every entry
    fn visit_all<E, F>(&self, visitor: F) -> Result<(), E>
    where
        F: FnMut(&str, &Setting) -> Result<Visit, E>,
    {
        self.visit_prefix("", visitor)
    }

    /// Check whether the container holds no entries
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered in-memory store, enumerating keys in byte order
#[derive(Debug, Clone, Default)]
pub struct OrderedSettingsMap {
    entries: BTreeMap<String, Setting>,
}

impl OrderedSettingsMap {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsMap for OrderedSettingsMap {
    fn search(&self, key: &str) -> Option<&Setting> {
        self.entries.get(key)
    }

    fn search_mut(&mut self, key: &str) -> Option<&mut Setting> {
        self.entries.get_mut(key)
    }

    fn insert_if_absent(&mut self, key: &str, setting: Setting) -> Option<Setting> {
        if self.entries.contains_key(key) {
            return Some(setting);
        }
        self.entries.insert(key.to_string(), setting);
        None
    }

    fn visit_prefix<E, F>(&self, prefix: &str, mut visitor: F) -> Result<(), E>
    where
        F: FnMut(&str, &Setting) -> Result<Visit, E>,
    {
        let range = self
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded));

        for (key, setting) in range {
            // Keys sharing the prefix are contiguous in byte order
            if !key.starts_with(prefix) {
                break;
            }
            if visitor(key, setting)? == Visit::Stop {
                break;
            }
        }
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::permissions::Permissions;
    use setkeep_formats::SettingValue;
    use std::convert::Infallible;

    fn sample() -> OrderedSettingsMap {
        let mut map = OrderedSettingsMap::new();
        for (key, value) in [
            ("net.timeout", 30),
            ("net.port", 14550),
            ("netmask", 24),
            ("ctl.rate", 50),
            ("net", 1),
        ] {
            let setting = Setting::new(Permissions::SYSTEM, SettingValue::Integer(value));
            assert!(map.insert_if_absent(key, setting).is_none());
        }
        map
    }

    fn keys_under(map: &OrderedSettingsMap, prefix: &str) -> Vec<String> {
        let mut keys = Vec::new();
        map.visit_prefix(prefix, |key, _| {
            keys.push(key.to_string());
            Ok::<_, Infallible>(Visit::Continue)
        })
        .expect("infallible visitor");
        keys
    }

    #[test]
    fn test_insert_if_absent_keeps_original() {
        let mut map = sample();
        let rejected = map.insert_if_absent(
            "net.timeout",
            Setting::new(Permissions::USER, SettingValue::Integer(99)),
        );
        assert_eq!(
            rejected.map(|s| s.current().clone()),
            Some(SettingValue::Integer(99))
        );
        assert_eq!(
            map.search("net.timeout").map(Setting::permissions),
            Some(Permissions::SYSTEM)
        );
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_prefix_enumeration_in_order() {
        let map = sample();
        assert_eq!(
            keys_under(&map, "net."),
            vec!["net.port".to_string(), "net.timeout".to_string()]
        );
        assert_eq!(
            keys_under(&map, "net"),
            vec!["net", "net.port", "net.timeout", "netmask"]
        );
        assert_eq!(keys_under(&map, "zzz"), Vec::<String>::new());
        assert_eq!(keys_under(&map, "").len(), 5);
    }

    #[test]
    fn test_visitor_stop_and_error() {
        let map = sample();

        let mut seen = 0;
        map.visit_all(|_, _| {
            seen += 1;
            Ok::<_, Infallible>(if seen == 2 { Visit::Stop } else { Visit::Continue })
        })
        .expect("infallible visitor");
        assert_eq!(seen, 2);

        let result = map.visit_all(|key, _| {
            if key == "net" {
                Err(key.to_string())
            } else {
                Ok(Visit::Continue)
            }
        });
        assert_eq!(result, Err("net".to_string()));
    }

    #[test]
    fn test_search_mut() {
        let mut map = sample();
        let entry = map.search_mut("ctl.rate").expect("registered");
        assert_eq!(entry.set_current(SettingValue::Integer(100)), Ok(()));
        assert_eq!(
            map.search("ctl.rate").map(Setting::current),
            Some(&SettingValue::Integer(100))
        );
        assert!(map.search("missing").is_none());
    }
}
