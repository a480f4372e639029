#![forbid(unsafe_code)]

//! Tagged payload carried by every control.
//!
//! A leaf holds a scalar (or [`FormValue::Absent`]), a group holds the
//! [`FormValue::Group`] mapping of its enabled children's values.

use std::collections::BTreeMap;
use std::fmt;

/// Mapping of child names to values, as produced by a group.
pub type ValueMap = BTreeMap<String, FormValue>;

/// The value of a control.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FormValue {
    /// No value. What `reset` assigns to a leaf.
    #[default]
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Aggregate value of a group, keyed by child name.
    Group(ValueMap),
}

impl FormValue {
    /// Build a group value from `(name, value)` pairs.
    pub fn group<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Group(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Group(_) => "group",
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// `true` for [`FormValue::Absent`] and for empty text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers widen to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&ValueMap> {
        match self {
            Self::Group(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a direct entry of a group value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.as_group().and_then(|map| map.get(name))
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("<absent>"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Group(map) => {
                f.write_str("{")?;
                for (i, (name, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FormValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for FormValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for FormValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ValueMap> for FormValue {
    fn from(value: ValueMap) -> Self {
        Self::Group(value)
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_absent() {
        assert_eq!(FormValue::default(), FormValue::Absent);
        assert!(FormValue::default().is_absent());
    }

    #[test]
    fn conversions() {
        assert_eq!(FormValue::from("a"), FormValue::Text("a".into()));
        assert_eq!(FormValue::from(3), FormValue::Int(3));
        assert_eq!(FormValue::from(true), FormValue::Bool(true));
        assert_eq!(FormValue::from(None::<&str>), FormValue::Absent);
        assert_eq!(FormValue::from(Some(2.5)), FormValue::Float(2.5));
    }

    #[test]
    fn emptiness() {
        assert!(FormValue::Absent.is_empty());
        assert!(FormValue::from("").is_empty());
        assert!(!FormValue::from(" ").is_empty());
        assert!(!FormValue::from(0).is_empty());
    }

    #[test]
    fn numeric_view_widens_ints() {
        assert_eq!(FormValue::from(4).as_f64(), Some(4.0));
        assert_eq!(FormValue::from(0.5).as_f64(), Some(0.5));
        assert_eq!(FormValue::from("4").as_f64(), None);
    }

    #[test]
    fn group_lookup() {
        let value = FormValue::group([("name", FormValue::from("ann")), ("age", 30.into())]);
        assert_eq!(value.get("name"), Some(&FormValue::from("ann")));
        assert_eq!(value.get("missing"), None);
        assert_eq!(FormValue::from("x").get("name"), None);
    }

    #[test]
    fn display_group_is_ordered() {
        let value = FormValue::group([("b", FormValue::from(1)), ("a", FormValue::from("x"))]);
        assert_eq!(value.to_string(), r#"{a: "x", b: 1}"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_untagged_shape() {
        let value = FormValue::group([("email", FormValue::from("a@b.com")), ("n", 2.into())]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"email":"a@b.com","n":2}"#);
        let back: FormValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
