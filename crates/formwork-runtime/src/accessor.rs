#![forbid(unsafe_code)]

//! Binding between a leaf control and the widget that edits it.

use std::fmt;
use std::sync::Arc;

use formwork_core::FormValue;

/// Callback a widget invokes when the user changes its value.
pub type ChangeCallback = Box<dyn Fn(FormValue) + Send + Sync>;

/// The widget side of a leaf control.
///
/// The tree calls [`write`](Self::write) whenever the leaf recalculates and
/// [`set_enabled_state`](Self::set_enabled_state) after enable/disable.
/// Calls are made after the tree's lock is released, so implementations may
/// call back into the tree.
pub trait ValueAccessor: Send + Sync {
    /// Show `value` in the widget.
    ///
    /// Values applied through the change callback are written back here.
    /// Must not invoke the change callback itself.
    fn write(&self, value: &FormValue);

    /// Make the widget editable or read-only.
    fn set_enabled_state(&self, enabled: bool);

    /// Remember `callback` and invoke it with each user-edited value.
    ///
    /// Invoking it applies the value to the control with propagation and
    /// events. After the accessor is replaced or cleared the callback does
    /// nothing.
    fn register_on_change(&self, callback: ChangeCallback);
}

/// An accessor bound to a leaf. `epoch` tells its callback apart from the
/// callbacks of previously bound accessors.
#[derive(Clone)]
pub(crate) struct AccessorBinding {
    pub(crate) accessor: Arc<dyn ValueAccessor>,
    pub(crate) epoch: u64,
}

impl fmt::Debug for AccessorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorBinding")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

enum AccessorCall {
    Write(Arc<dyn ValueAccessor>, FormValue),
    SetEnabled(Arc<dyn ValueAccessor>, bool),
    Register(Arc<dyn ValueAccessor>, ChangeCallback),
}

/// Accessor calls collected while the tree is locked.
///
/// Flushed in order once the lock is released.
#[derive(Default)]
pub(crate) struct Outbox {
    calls: Vec<AccessorCall>,
}

impl Outbox {
    pub(crate) fn write(&mut self, binding: &AccessorBinding, value: FormValue) {
        self.calls
            .push(AccessorCall::Write(Arc::clone(&binding.accessor), value));
    }

    pub(crate) fn set_enabled(&mut self, binding: &AccessorBinding, enabled: bool) {
        self.calls
            .push(AccessorCall::SetEnabled(Arc::clone(&binding.accessor), enabled));
    }

    pub(crate) fn register(&mut self, binding: &AccessorBinding, callback: ChangeCallback) {
        self.calls
            .push(AccessorCall::Register(Arc::clone(&binding.accessor), callback));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }

    pub(crate) fn flush(self) {
        for call in self.calls {
            match call {
                AccessorCall::Write(accessor, value) => accessor.write(&value),
                AccessorCall::SetEnabled(accessor, enabled) => accessor.set_enabled_state(enabled),
                AccessorCall::Register(accessor, callback) => accessor.register_on_change(callback),
            }
        }
    }
}
