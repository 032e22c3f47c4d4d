//! Object metadata map.

use std::collections::{BTreeMap, BTreeSet};

use derive_more::{Deref, DerefMut, From, Into};
use serde::{Deserialize, Serialize};

use crate::{Error, MAX_META_KEY_LEN, MAX_META_VALUE_LEN, Result};

/// User metadata attached to an object.
///
/// Keys and values are transmitted as `X-Object-Meta-<key>: <value>` headers.
/// Header names are case-insensitive on the wire, so [`Metadata::insert`] and
/// [`Metadata::get`] ignore ASCII case. Validation only happens when metadata
/// is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize, Deref, DerefMut, From, Into)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    /// Creates an empty metadata map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any previous value for the key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an entry, replacing every key equal to `key` ignoring ASCII
    /// case. The new spelling of the key wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let previous = self
            .find_key(&key)
            .map(str::to_owned)
            .and_then(|existing| self.0.remove(&existing));
        self.0.insert(key, value.into());
        previous
    }

    /// Looks up a value, ignoring ASCII case in the key.
    pub fn get(&self, key: &str) -> Option<&String> {
        self.0
            .get(key)
            .or_else(|| self.find_key(key).and_then(|found| self.0.get(found)))
    }

    fn find_key(&self, key: &str) -> Option<&str> {
        self.0
            .keys()
            .find(|existing| existing.eq_ignore_ascii_case(key))
            .map(String::as_str)
    }

    /// Checks every entry against the service limits.
    ///
    /// Keys must not contain `:`; trimmed keys must fit in
    /// [`MAX_META_KEY_LEN`] bytes and trimmed values in [`MAX_META_VALUE_LEN`].
    ///
    /// Two keys that only differ in ASCII case or surrounding whitespace
    /// would render the same header and are rejected.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for (key, value) in &self.0 {
            if key.contains(':') {
                return Err(Error::Syntax(format!(
                    "Metadata key '{key}' cannot contain a ':' character"
                )));
            }

            let key = key.trim();
            if key.is_empty() {
                return Err(Error::Syntax("Metadata key cannot be empty".into()));
            }
            if key.len() > MAX_META_KEY_LEN {
                return Err(Error::Syntax(format!(
                    "Metadata key '{key}' exceeds {MAX_META_KEY_LEN} bytes"
                )));
            }
            if value.trim().len() > MAX_META_VALUE_LEN {
                return Err(Error::Syntax(format!(
                    "Metadata value for '{key}' exceeds {MAX_META_VALUE_LEN} bytes"
                )));
            }
            if !seen.insert(key.to_ascii_lowercase()) {
                return Err(Error::Syntax(format!(
                    "Metadata key '{key}' is given more than once"
                )));
            }
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;
    type Item = (&'a String, &'a String);

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
