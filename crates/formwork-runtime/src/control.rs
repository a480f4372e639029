#![forbid(unsafe_code)]

//! Handle to one control of a [`FormTree`].

use std::fmt;
use std::sync::Arc;

use formwork_core::{
    ControlId, ControlStatus, FormValue, Result, UpdateOptions, ValidationErrors,
};
use formwork_validation::{AsyncValidatorRef, ValidationTrace, ValidatorRef};

use crate::accessor::ValueAccessor;
use crate::events::EventStream;
use crate::node::ControlKind;
use crate::tree::FormTree;

/// Value, status and errors of a control, read atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSnapshot {
    pub value: FormValue,
    pub status: ControlStatus,
    pub errors: ValidationErrors,
}

/// A leaf or group control.
///
/// `Control` is a cheap handle: cloning it does not copy the control, and
/// dropping it does not remove the control from its tree. Once the control
/// is removed every method returns
/// [`FormError::StaleControl`](formwork_core::FormError::StaleControl).
///
/// Methods taking [`UpdateOptions`] recalculate the control and, unless
/// `only_self` is set, each of its ancestors. With `emit_event` set every
/// recalculated control publishes its value and status.
#[derive(Clone)]
pub struct Control {
    tree: FormTree,
    id: ControlId,
}

impl Control {
    pub(crate) fn new(tree: FormTree, id: ControlId) -> Self {
        Self { tree, id }
    }

    #[must_use]
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// The tree this control lives in.
    #[must_use]
    pub fn tree(&self) -> &FormTree {
        &self.tree
    }

    // -- Reads --------------------------------------------------------------

    pub fn kind(&self) -> Result<ControlKind> {
        self.tree
            .read(|state| state.node(self.id).map(|node| node.kind.kind()))
    }

    pub fn value(&self) -> Result<FormValue> {
        self.tree
            .read(|state| state.node(self.id).map(|node| node.value.clone()))
    }

    pub fn status(&self) -> Result<ControlStatus> {
        self.tree
            .read(|state| state.node(self.id).map(|node| node.status))
    }

    pub fn errors(&self) -> Result<ValidationErrors> {
        self.tree
            .read(|state| state.node(self.id).map(|node| node.errors.clone()))
    }

    pub fn snapshot(&self) -> Result<ControlSnapshot> {
        self.tree.read(|state| {
            state.node(self.id).map(|node| ControlSnapshot {
                value: node.value.clone(),
                status: node.status,
                errors: node.errors.clone(),
            })
        })
    }

    /// The group this control is attached to, if any.
    pub fn parent(&self) -> Result<Option<Control>> {
        let parent = self.tree.read(|state| state.node(self.id).map(|node| node.parent))?;
        Ok(parent.map(|id| self.tree.handle(id)))
    }

    /// Whether the control exists in its tree.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.tree.read(|state| state.node(self.id).is_ok())
    }

    /// Lifecycle trace of this control's async validation runs.
    pub fn async_trace(&self) -> Result<ValidationTrace> {
        self.tree.read(|state| {
            state
                .node(self.id)
                .map(|node| node.coordinator.trace().clone())
        })
    }

    // -- Value and validity -------------------------------------------------

    /// Assign a value and recalculate.
    ///
    /// For a group the value must be a [`FormValue::Group`] naming only
    /// existing children, checked recursively before anything changes.
    /// Listed children are assigned without propagating past the group;
    /// unlisted children keep their value and status.
    ///
    /// # Errors
    ///
    /// [`FormError::ValueShape`](formwork_core::FormError::ValueShape) for a
    /// non-group value on a group,
    /// [`FormError::ControlNotFound`](formwork_core::FormError::ControlNotFound)
    /// for an unknown child name.
    pub fn set_value(&self, value: impl Into<FormValue>, options: UpdateOptions) -> Result<()> {
        let value = value.into();
        self.tree
            .modify(|state, outbox| state.set_value(self.id, value, options, outbox))
    }

    /// Clear the value (every child's, for a group) and recalculate.
    pub fn reset(&self, options: UpdateOptions) -> Result<()> {
        self.tree
            .modify(|state, outbox| state.reset(self.id, options, outbox))
    }

    /// Re-run validation and recompute status.
    ///
    /// Needed after changing validators; they take effect only on the next
    /// recalculation.
    pub fn update_value_and_validity(&self, options: UpdateOptions) -> Result<()> {
        self.tree
            .modify(|state, outbox| state.update_value_and_validity(self.id, options, outbox))
    }

    /// Enable the control and, for a group, every descendant.
    ///
    /// Unless `only_self` is set, every ancestor's explicit disabled flag is
    /// cleared as well, so no group stays `Disabled` over an enabled child.
    pub fn enable(&self, options: UpdateOptions) -> Result<()> {
        self.tree
            .modify(|state, outbox| state.set_disabled(self.id, false, options, outbox))
    }

    /// Disable the control and, for a group, every descendant.
    ///
    /// A disabled control skips its validators, has no errors and is left
    /// out of its group's value.
    pub fn disable(&self, options: UpdateOptions) -> Result<()> {
        self.tree
            .modify(|state, outbox| state.set_disabled(self.id, true, options, outbox))
    }

    // -- Validators ---------------------------------------------------------

    /// Replace the sync validators. Call
    /// [`update_value_and_validity`](Self::update_value_and_validity) to
    /// apply them.
    pub fn set_validators(&self, validators: Vec<ValidatorRef>) -> Result<()> {
        self.tree
            .modify(|state, _| state.set_validators(self.id, validators))
    }

    /// Replace the async validators. Call
    /// [`update_value_and_validity`](Self::update_value_and_validity) to
    /// apply them.
    ///
    /// # Errors
    ///
    /// [`FormError::NoAsyncRuntime`](formwork_core::FormError::NoAsyncRuntime)
    /// if the list is non-empty and the tree has no runtime.
    pub fn set_async_validators(&self, async_validators: Vec<AsyncValidatorRef>) -> Result<()> {
        self.tree
            .modify(|state, _| state.set_async_validators(self.id, async_validators))
    }

    pub fn clear_validators(&self) -> Result<()> {
        self.set_validators(Vec::new())
    }

    pub fn clear_async_validators(&self) -> Result<()> {
        self.set_async_validators(Vec::new())
    }

    // -- Children -----------------------------------------------------------

    /// Attach `control` under `name`, replacing (and dropping) any child
    /// already there, then recalculate this group and its ancestors.
    pub fn add_control(&self, name: impl Into<String>, control: &Control) -> Result<()> {
        self.tree.ensure_owned(control)?;
        let name = name.into();
        self.tree
            .modify(|state, outbox| state.add_control(self.id, name, control.id, outbox))
    }

    /// Detach and drop the child under `name`.
    ///
    /// The group is not recalculated; call
    /// [`update_value_and_validity`](Self::update_value_and_validity) if its
    /// value and status should reflect the removal right away.
    pub fn remove_control(&self, name: &str) -> Result<()> {
        self.tree
            .modify(|state, _| state.remove_control(self.id, name))
    }

    /// The direct child under `name`.
    pub fn get(&self, name: &str) -> Result<Control> {
        let id = self.tree.read(|state| state.child(self.id, name))?;
        Ok(self.tree.handle(id))
    }

    /// The descendant at a dotted path such as `"address.city"`.
    pub fn get_path(&self, path: &str) -> Result<Control> {
        let id = self.tree.read(|state| state.lookup_path(self.id, path))?;
        Ok(self.tree.handle(id))
    }

    /// Names of the direct children; empty for a leaf.
    pub fn controls(&self) -> Result<Vec<String>> {
        self.tree.read(|state| {
            state.node(self.id).map(|node| {
                node.kind
                    .children()
                    .map(|children| children.keys().cloned().collect())
                    .unwrap_or_default()
            })
        })
    }

    // -- Events -------------------------------------------------------------

    /// Subscribe to value changes emitted from now on.
    pub fn value_changes(&self) -> Result<EventStream<FormValue>> {
        self.tree
            .read(|state| state.node(self.id).map(|node| node.events.subscribe_values()))
    }

    /// Subscribe to status changes emitted from now on.
    pub fn status_changes(&self) -> Result<EventStream<ControlStatus>> {
        self.tree.read(|state| {
            state
                .node(self.id)
                .map(|node| node.events.subscribe_statuses())
        })
    }

    // -- Value accessor -----------------------------------------------------

    /// Bind a widget to this leaf, replacing any previous accessor.
    ///
    /// The accessor receives the current value and enabled state, then
    /// a change callback.
    pub fn set_value_accessor(&self, accessor: Arc<dyn ValueAccessor>) -> Result<()> {
        self.tree
            .modify(|state, outbox| state.bind_accessor(self.id, accessor, outbox))
    }

    /// Unbind the current accessor; its change callback becomes inert.
    pub fn clear_value_accessor(&self) -> Result<()> {
        self.tree.modify(|state, _| state.clear_accessor(self.id))
    }
}

impl PartialEq for Control {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.tree.shared, &other.tree.shared)
    }
}

impl Eq for Control {}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control").field("id", &self.id).finish()
    }
}
