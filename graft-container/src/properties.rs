//! Property source: named configuration values for constructor parameters.
//!
//! [`Properties`] is a flat, read-only `key -> string` mapping supplied by
//! the embedding application at the start of a run. It (de)serializes as a
//! plain map, so it can be loaded from any `serde` format.
//!
//! # Examples
//! ```
//! use graft_container::properties::Properties;
//!
//! let properties = Properties::new()
//!     .with("database.url", "postgres://localhost")
//!     .with("pool.size", "8");
//!
//! assert_eq!(properties.get("pool.size"), Some("8"));
//! assert_eq!(properties.get("missing"), None);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Immutable mapping of property keys to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty property source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this source with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Looks up a property. Absence is not an error at this layer.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Converts a looked-up property into a constructor field value.
///
/// `Option<String>` keeps absence visible; `String` turns a missing
/// property into an empty string.
pub trait FromProperty: Sized {
    fn from_property(value: Option<String>) -> Self;
}

impl FromProperty for Option<String> {
    fn from_property(value: Option<String>) -> Self {
        value
    }
}

impl FromProperty for String {
    fn from_property(value: Option<String>) -> Self {
        value.unwrap_or_default()
    }
}
