#![forbid(unsafe_code)]

use std::fmt;

/// Validation status of a control.
///
/// The variants are mutually exclusive: a control is never both valid and
/// invalid, or invalid and disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ControlStatus {
    /// Passed every validator.
    Valid,
    /// At least one validator reported an error.
    Invalid,
    /// Async validation is in flight (here or in a descendant).
    Pending,
    /// Exempt from validation and from the parent's aggregate value.
    Disabled,
}

impl ControlStatus {
    #[must_use]
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self, Self::Invalid)
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Any status other than [`ControlStatus::Disabled`].
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !self.is_disabled()
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Pending => "pending",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_are_exclusive() {
        for status in [
            ControlStatus::Valid,
            ControlStatus::Invalid,
            ControlStatus::Pending,
            ControlStatus::Disabled,
        ] {
            let hits = [
                status.is_valid(),
                status.is_invalid(),
                status.is_pending(),
                status.is_disabled(),
            ]
            .into_iter()
            .filter(|hit| *hit)
            .count();
            assert_eq!(hits, 1, "{status} matched {hits} predicates");
        }
    }

    #[test]
    fn enabled_is_not_disabled() {
        assert!(ControlStatus::Pending.is_enabled());
        assert!(!ControlStatus::Disabled.is_enabled());
    }

    #[test]
    fn display() {
        assert_eq!(ControlStatus::Pending.to_string(), "pending");
    }
}
