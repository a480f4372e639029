#![forbid(unsafe_code)]

//! Usage errors.
//!
//! These report structural mistakes in how a tree is built or addressed.
//! Validation failures are never reported here; they live in a control's
//! error map.

use std::fmt;

use crate::ControlId;

/// A caller-contract violation detected by the control tree.
///
/// Every operation checks its preconditions before mutating anything, so an
/// `Err` leaves the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No child under this (dotted) path.
    ControlNotFound { path: String },
    /// The path walks through a leaf.
    NotAGroup { path: String },
    /// A leaf-only operation was called on a group.
    NotALeaf { id: ControlId },
    /// A group was given a value that is not a mapping.
    ValueShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The control was dropped from its tree.
    StaleControl { id: ControlId },
    /// The control already has a parent.
    AlreadyAttached { id: ControlId },
    /// The control is still attached and cannot be released on its own.
    StillAttached { id: ControlId },
    /// Attaching would make a control its own ancestor.
    CycleDetected { id: ControlId },
    /// The control belongs to a different tree.
    ForeignControl { id: ControlId },
    /// Async validators need a tokio runtime and none was available.
    NoAsyncRuntime,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControlNotFound { path } => write!(f, "control `{path}` not found"),
            Self::NotAGroup { path } => write!(f, "control `{path}` is not a group"),
            Self::NotALeaf { id } => write!(f, "control {id} is a group, expected a leaf"),
            Self::ValueShape {
                path,
                expected,
                found,
            } => {
                if path.is_empty() {
                    write!(f, "expected a {expected} value, found {found}")
                } else {
                    write!(f, "expected a {expected} value at `{path}`, found {found}")
                }
            }
            Self::StaleControl { id } => write!(f, "control {id} is no longer part of its tree"),
            Self::AlreadyAttached { id } => write!(f, "control {id} already has a parent"),
            Self::StillAttached { id } => {
                write!(f, "control {id} is attached; remove it from its group instead")
            }
            Self::CycleDetected { id } => {
                write!(f, "attaching control {id} would create a cycle")
            }
            Self::ForeignControl { id } => write!(f, "control {id} belongs to another tree"),
            Self::NoAsyncRuntime => {
                f.write_str("async validators require a tokio runtime, none is configured")
            }
        }
    }
}

impl std::error::Error for FormError {}

/// Result type for control-tree operations.
pub type Result<T> = std::result::Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = FormError::ControlNotFound {
            path: "inner.username".into(),
        };
        assert_eq!(err.to_string(), "control `inner.username` not found");

        let err = FormError::ValueShape {
            path: String::new(),
            expected: "group",
            found: "text",
        };
        assert_eq!(err.to_string(), "expected a group value, found text");

        let err = FormError::StaleControl {
            id: ControlId::new(3, 1),
        };
        assert_eq!(err.to_string(), "control #3v1 is no longer part of its tree");
    }
}
