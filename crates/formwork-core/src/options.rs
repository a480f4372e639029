#![forbid(unsafe_code)]

/// How a change propagates and whether it is published.
///
/// The default (`only_self = false`, `emit_event = true`) updates every
/// ancestor and publishes on the value and status streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateOptions {
    /// Restrict recalculation to the originating control.
    pub only_self: bool,
    /// Publish the new value and status on the event streams.
    pub emit_event: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            only_self: false,
            emit_event: true,
        }
    }
}

impl UpdateOptions {
    /// Local, silent update. Used for construction-time self-validation.
    pub const SILENT_SELF: Self = Self {
        only_self: true,
        emit_event: false,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn only_self(mut self, only_self: bool) -> Self {
        self.only_self = only_self;
        self
    }

    #[must_use]
    pub const fn emit_event(mut self, emit_event: bool) -> Self {
        self.emit_event = emit_event;
        self
    }

    /// Shorthand for `emit_event(false)`.
    #[must_use]
    pub const fn silent(self) -> Self {
        self.emit_event(false)
    }

    /// The options handed to children when a group fans an operation out:
    /// children never re-propagate on their own, emission follows the caller.
    #[must_use]
    pub const fn for_children(self) -> Self {
        Self {
            only_self: true,
            emit_event: self.emit_event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_propagate_and_emit() {
        let opts = UpdateOptions::default();
        assert!(!opts.only_self);
        assert!(opts.emit_event);
    }

    #[test]
    fn children_keep_emission() {
        let opts = UpdateOptions::new().silent().for_children();
        assert_eq!(opts, UpdateOptions::SILENT_SELF);
        assert!(UpdateOptions::new().for_children().emit_event);
    }
}
