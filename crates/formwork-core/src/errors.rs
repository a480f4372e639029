#![forbid(unsafe_code)]

//! Validation error maps.
//!
//! Validators report problems as data: a mapping from a stable key (the
//! validator's name, e.g. `"required"`) to an [`ErrorValue`]. An empty map
//! means every concern passed.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Key for `required`.
pub const ERROR_KEY_REQUIRED: &str = "required";
/// Key for `email`.
pub const ERROR_KEY_EMAIL: &str = "email";
/// Key for `min_length`.
pub const ERROR_KEY_MIN_LENGTH: &str = "minLength";
/// Key for `max_length`.
pub const ERROR_KEY_MAX_LENGTH: &str = "maxLength";
/// Key for `min`.
pub const ERROR_KEY_MIN: &str = "min";
/// Key for `max`.
pub const ERROR_KEY_MAX: &str = "max";
/// Key for `pattern`.
pub const ERROR_KEY_PATTERN: &str = "pattern";

/// Payload stored under an error key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorValue {
    /// Plain marker: the concern failed.
    Flag,
    /// Free-form detail.
    Message(String),
    /// Length bound violated.
    Length { required: usize, actual: usize },
    /// Numeric bound violated.
    Limit { limit: f64, actual: f64 },
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("true"),
            Self::Message(msg) => f.write_str(msg),
            Self::Length { required, actual } => {
                write!(f, "length {actual} (bound {required})")
            }
            Self::Limit { limit, actual } => write!(f, "{actual} (limit {limit})"),
        }
    }
}

/// Accumulated validation errors of one control.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ValidationErrors {
    entries: BTreeMap<String, ErrorValue>,
}

impl ValidationErrors {
    /// An empty map (no errors).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with a single entry.
    #[must_use]
    pub fn single(key: impl Into<String>, value: ErrorValue) -> Self {
        let mut errors = Self::new();
        errors.insert(key, value);
        errors
    }

    /// A map with a single [`ErrorValue::Flag`] entry.
    #[must_use]
    pub fn flag(key: impl Into<String>) -> Self {
        Self::single(key, ErrorValue::Flag)
    }

    /// Insert an entry, replacing any previous value under the key.
    pub fn insert(&mut self, key: impl Into<String>, value: ErrorValue) -> Option<ErrorValue> {
        self.entries.insert(key.into(), value)
    }

    /// Fold `other` into `self`. On duplicate keys the entry from `other` wins.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.entries.extend(other.entries);
    }

    /// Builder-style [`merge`](Self::merge).
    #[must_use]
    pub fn merged(mut self, other: ValidationErrors) -> Self {
        self.merge(other);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ErrorValue> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ErrorValue> {
        self.entries.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, ErrorValue)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (K, ErrorValue)>>(iter: I) -> Self {
        let mut errors = Self::new();
        for (key, value) in iter {
            errors.insert(key, value);
        }
        errors
    }
}

impl IntoIterator for ValidationErrors {
    type Item = (String, ErrorValue);
    type IntoIter = btree_map::IntoIter<String, ErrorValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = (&'a String, &'a ErrorValue);
    type IntoIter = btree_map::Iter<'a, String, ErrorValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        Ok(())
    }
}
