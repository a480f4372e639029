#![forbid(unsafe_code)]

//! The control arena and its recalculation engine.
//!
//! All controls of one form live in a [`FormTree`]. A control is addressed
//! by a generational [`ControlId`]; groups own their children by id and a
//! child's parent link is a plain id used for lookup only.
//!
//! Every mutation runs under the tree's single lock. Value accessor calls
//! produced during a mutation are queued in an outbox and performed after
//! the lock is released.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use formwork_core::{
    ControlId, ControlStatus, FormError, FormValue, Result, UpdateOptions, ValidationErrors,
    ValueMap,
};
use formwork_validation::{AsyncValidatorRef, ValidationToken, ValidatorRef, run_validators};
use tokio::runtime::Handle;

use crate::accessor::{AccessorBinding, ChangeCallback, Outbox, ValueAccessor};
use crate::config::FormConfig;
use crate::control::Control;
use crate::node::{Node, NodeKind};
use crate::runner::AsyncRun;

// ---------------------------------------------------------------------------
// FormTree
// ---------------------------------------------------------------------------

/// Owner of a form's controls.
///
/// `FormTree` is a cheap, clonable handle; clones refer to the same arena.
/// Controls are created through the tree and live until they are removed
/// from their group or, for unattached controls, released.
///
/// # Example
///
/// ```rust
/// use formwork_core::{ControlStatus, FormValue};
/// use formwork_runtime::FormTree;
/// use formwork_validation::{email, required};
///
/// let tree = FormTree::new();
/// let email_field = tree
///     .control_with("a@b.com", vec![required(), email()], Vec::new())
///     .unwrap();
/// let form = tree.group([("email", email_field.clone())]).unwrap();
/// assert_eq!(form.status().unwrap(), ControlStatus::Valid);
///
/// email_field.set_value("matin.com", Default::default()).unwrap();
/// assert_eq!(form.status().unwrap(), ControlStatus::Invalid);
/// assert_eq!(form.value().unwrap(), FormValue::group([("email", "matin.com")]));
/// ```
#[derive(Clone)]
pub struct FormTree {
    pub(crate) shared: Arc<Shared>,
}

pub(crate) struct Shared {
    state: Mutex<TreeState>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, TreeState> {
        // A panicking validator must not wedge the whole form
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FormTree {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FormTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("FormTree")
            .field("controls", &state.len)
            .field("has_runtime", &state.runtime.is_some())
            .finish()
    }
}

impl FormTree {
    /// A tree with default configuration, using the current tokio runtime
    /// (if any) for async validation.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(FormConfig::default())
    }

    #[must_use]
    pub fn with_config(config: FormConfig) -> Self {
        let runtime = config
            .runtime
            .clone()
            .or_else(|| Handle::try_current().ok());
        let shared = Arc::new_cyclic(|weak| Shared {
            state: Mutex::new(TreeState::new(&config, runtime, weak.clone())),
        });
        Self { shared }
    }

    /// Whether async validators can be registered on this tree.
    #[must_use]
    pub fn has_runtime(&self) -> bool {
        self.shared.lock().runtime.is_some()
    }

    /// Number of live controls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock().len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A leaf control without validators.
    pub fn control(&self, value: impl Into<FormValue>) -> Control {
        let mut outbox = Outbox::default();
        let id = {
            let mut state = self.shared.lock();
            let id = state.insert_leaf(value.into(), Vec::new(), Vec::new());
            let validated =
                state.update_value_and_validity(id, UpdateOptions::SILENT_SELF, &mut outbox);
            debug_assert!(validated.is_ok(), "fresh leaf failed to validate");
            id
        };
        outbox.flush();
        self.handle(id)
    }

    /// A leaf control with sync and async validators.
    ///
    /// The control validates itself once without emitting events.
    ///
    /// # Errors
    ///
    /// [`FormError::NoAsyncRuntime`] if `async_validators` is non-empty and
    /// the tree has no runtime.
    pub fn control_with(
        &self,
        value: impl Into<FormValue>,
        validators: Vec<ValidatorRef>,
        async_validators: Vec<AsyncValidatorRef>,
    ) -> Result<Control> {
        let value = value.into();
        let id = self.modify(|state, outbox| {
            state.ensure_runtime(&async_validators)?;
            let id = state.insert_leaf(value, validators, async_validators);
            state.update_value_and_validity(id, UpdateOptions::SILENT_SELF, outbox)?;
            Ok(id)
        })?;
        Ok(self.handle(id))
    }

    /// A group of `children` without validators.
    ///
    /// # Errors
    ///
    /// A child that belongs to another tree, was dropped, or already has a
    /// parent is rejected before anything is attached.
    pub fn group<I, K>(&self, children: I) -> Result<Control>
    where
        I: IntoIterator<Item = (K, Control)>,
        K: Into<String>,
    {
        self.group_with(children, Vec::new(), Vec::new())
    }

    /// A group of `children` with its own sync and async validators.
    ///
    /// If a name repeats, the last control given under it is attached.
    pub fn group_with<I, K>(
        &self,
        children: I,
        validators: Vec<ValidatorRef>,
        async_validators: Vec<AsyncValidatorRef>,
    ) -> Result<Control>
    where
        I: IntoIterator<Item = (K, Control)>,
        K: Into<String>,
    {
        let mut named = BTreeMap::new();
        for (name, control) in children {
            self.ensure_owned(&control)?;
            named.insert(name.into(), control.id());
        }
        let id = self.modify(|state, outbox| {
            state.ensure_runtime(&async_validators)?;
            let id = state.insert_group(named, validators, async_validators)?;
            state.update_value_and_validity(id, UpdateOptions::SILENT_SELF, outbox)?;
            Ok(id)
        })?;
        Ok(self.handle(id))
    }

    /// Drop an unattached control and everything below it.
    ///
    /// Pending async runs in the dropped subtree are cancelled and their
    /// event streams end.
    ///
    /// # Errors
    ///
    /// [`FormError::StillAttached`] for a control that has a parent; remove
    /// it from its group instead.
    pub fn release(&self, control: Control) -> Result<()> {
        self.ensure_owned(&control)?;
        self.modify(|state, _| state.release(control.id()))
    }

    pub(crate) fn handle(&self, id: ControlId) -> Control {
        Control::new(self.clone(), id)
    }

    pub(crate) fn ensure_owned(&self, control: &Control) -> Result<()> {
        if Arc::ptr_eq(&self.shared, &control.tree().shared) {
            Ok(())
        } else {
            Err(FormError::ForeignControl { id: control.id() })
        }
    }

    /// Run a mutation under the lock, then perform the queued accessor calls.
    pub(crate) fn modify<R>(
        &self,
        f: impl FnOnce(&mut TreeState, &mut Outbox) -> Result<R>,
    ) -> Result<R> {
        let mut outbox = Outbox::default();
        let result = {
            let mut state = self.shared.lock();
            f(&mut state, &mut outbox)
        };
        outbox.flush();
        result
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&TreeState) -> R) -> R {
        f(&self.shared.lock())
    }

    fn apply_accessor_change(&self, id: ControlId, epoch: u64, value: FormValue) {
        let result = self.modify(|state, outbox| {
            let bound = state
                .node(id)
                .ok()
                .and_then(|node| node.kind.accessor())
                .is_some_and(|binding| binding.epoch == epoch);
            if !bound {
                tracing::warn!(control = %id, "ignoring change from an unbound value accessor");
                return Ok(());
            }
            state.set_value(id, value, UpdateOptions::default(), outbox)
        });
        if let Err(err) = result {
            tracing::warn!(control = %id, error = %err, "value accessor change failed");
        }
    }
}

fn accessor_callback(shared: Weak<Shared>, id: ControlId, epoch: u64) -> ChangeCallback {
    Box::new(move |value| {
        if let Some(shared) = shared.upgrade() {
            FormTree { shared }.apply_accessor_change(id, epoch, value);
        }
    })
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

// ---------------------------------------------------------------------------
// TreeState
// ---------------------------------------------------------------------------

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub(crate) struct TreeState {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
    next_binding_epoch: u64,
    event_capacity: usize,
    trace_capacity: usize,
    runtime: Option<Handle>,
    shared: Weak<Shared>,
}

impl TreeState {
    fn new(config: &FormConfig, runtime: Option<Handle>, shared: Weak<Shared>) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            next_binding_epoch: 0,
            event_capacity: config.event_capacity,
            trace_capacity: config.async_trace_capacity,
            runtime,
            shared,
        }
    }

    // -- Arena ------------------------------------------------------------

    pub(crate) fn node(&self, id: ControlId) -> Result<&Node> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(FormError::StaleControl { id })
    }

    pub(crate) fn node_mut(&mut self, id: ControlId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(FormError::StaleControl { id })
    }

    fn insert(&mut self, node: Node) -> ControlId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return ControlId::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        ControlId::new(index, 0)
    }

    fn insert_leaf(
        &mut self,
        value: FormValue,
        validators: Vec<ValidatorRef>,
        async_validators: Vec<AsyncValidatorRef>,
    ) -> ControlId {
        let node = Node::new(
            NodeKind::Leaf { accessor: None },
            value,
            validators,
            async_validators,
            self.event_capacity,
            self.trace_capacity,
        );
        self.insert(node)
    }

    fn insert_group(
        &mut self,
        children: BTreeMap<String, ControlId>,
        validators: Vec<ValidatorRef>,
        async_validators: Vec<AsyncValidatorRef>,
    ) -> Result<ControlId> {
        let mut seen = Vec::with_capacity(children.len());
        for &child in children.values() {
            if self.node(child)?.parent.is_some() || seen.contains(&child) {
                return Err(FormError::AlreadyAttached { id: child });
            }
            seen.push(child);
        }

        let node = Node::new(
            NodeKind::Group {
                children: children.clone(),
            },
            FormValue::Group(ValueMap::new()),
            validators,
            async_validators,
            self.event_capacity,
            self.trace_capacity,
        );
        let id = self.insert(node);
        for child in children.into_values() {
            self.node_mut(child)?.parent = Some(id);
        }
        tracing::debug!(control = %id, children = seen.len(), "created group");
        Ok(id)
    }

    /// Drop `id` and all of its descendants.
    fn remove_subtree(&mut self, id: ControlId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index() as usize) else {
                continue;
            };
            if slot.generation != id.generation() {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index());
            self.len -= 1;
            if let Some(children) = node.kind.children() {
                stack.extend(children.values().copied());
            }
            // Dropping the node aborts its run and closes its streams
        }
    }

    fn release(&mut self, id: ControlId) -> Result<()> {
        if self.node(id)?.parent.is_some() {
            return Err(FormError::StillAttached { id });
        }
        self.remove_subtree(id);
        tracing::debug!(control = %id, "released control");
        Ok(())
    }

    /// Whether `candidate` is `of` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: ControlId, of: ControlId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.node(id).ok().and_then(|node| node.parent);
        }
        false
    }

    fn ensure_runtime(&self, async_validators: &[AsyncValidatorRef]) -> Result<()> {
        if async_validators.is_empty() || self.runtime.is_some() {
            Ok(())
        } else {
            Err(FormError::NoAsyncRuntime)
        }
    }

    fn children(&self, id: ControlId) -> Result<&BTreeMap<String, ControlId>> {
        self.node(id)?
            .kind
            .children()
            .ok_or_else(|| FormError::NotAGroup {
                path: id.to_string(),
            })
    }

    // -- Recalculation ----------------------------------------------------

    /// Value of a group: its enabled children's values by name.
    fn aggregate_value(&self, children: &BTreeMap<String, ControlId>) -> FormValue {
        let entries = children
            .iter()
            .filter_map(|(name, &child)| self.node(child).ok().map(|node| (name, node)))
            .filter(|(_, node)| !node.status.is_disabled())
            .map(|(name, node)| (name.clone(), node.value.clone()))
            .collect();
        FormValue::Group(entries)
    }

    fn children_status(&self, children: &BTreeMap<String, ControlId>) -> ControlStatus {
        let statuses: Vec<ControlStatus> = children
            .values()
            .filter_map(|&child| self.node(child).ok().map(|node| node.status))
            .collect();

        if !statuses.is_empty() && statuses.iter().all(|s| s.is_disabled()) {
            ControlStatus::Disabled
        } else if statuses.iter().any(|s| s.is_pending()) {
            ControlStatus::Pending
        } else if statuses.iter().any(|s| s.is_invalid()) {
            ControlStatus::Invalid
        } else {
            ControlStatus::Valid
        }
    }

    /// Status of `id` from its flag, own errors, children and live run.
    fn compute_status(&self, id: ControlId) -> Result<ControlStatus> {
        let node = self.node(id)?;
        if node.disabled {
            return Ok(ControlStatus::Disabled);
        }
        let status = if !node.errors.is_empty() {
            ControlStatus::Invalid
        } else {
            match &node.kind {
                NodeKind::Leaf { .. } => ControlStatus::Valid,
                NodeKind::Group { children } => self.children_status(children),
            }
        };
        if !status.is_invalid() && node.has_live_run() {
            Ok(ControlStatus::Pending)
        } else {
            Ok(status)
        }
    }

    /// Recalculate one control: value, sync errors, status, async run and
    /// events.
    fn recalculate(
        &mut self,
        id: ControlId,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        let aggregate = {
            let node = self.node(id)?;
            match &node.kind {
                NodeKind::Leaf { accessor } => {
                    if let Some(binding) = accessor {
                        outbox.write(binding, node.value.clone());
                    }
                    None
                }
                NodeKind::Group { children } => Some(self.aggregate_value(children)),
            }
        };

        let node = self.node_mut(id)?;
        if let Some(value) = aggregate {
            node.value = value;
        }
        node.cancel_run();
        if node.disabled {
            node.errors.clear();
        } else {
            node.errors = run_validators(&node.validators, &node.value);
        }

        let mut status = self.compute_status(id)?;
        if matches!(status, ControlStatus::Valid | ControlStatus::Pending)
            && self.start_async_run(id, options.emit_event)?
        {
            status = ControlStatus::Pending;
        }

        let node = self.node_mut(id)?;
        node.status = status;
        tracing::trace!(
            control = %id,
            %status,
            errors = node.errors.len(),
            emit = options.emit_event,
            "recalculated control"
        );
        if options.emit_event {
            node.events.emit(&node.value, status);
        }
        Ok(())
    }

    /// Start a run if the control has async validators.
    fn start_async_run(&mut self, id: ControlId, emit_event: bool) -> Result<bool> {
        if self.node(id)?.async_validators.is_empty() {
            return Ok(false);
        }
        let Some(runtime) = self.runtime.clone() else {
            tracing::warn!(control = %id, "async validators present but no runtime, skipping");
            return Ok(false);
        };
        let shared = self.shared.clone();

        let node = self.node_mut(id)?;
        let run = AsyncRun {
            control: id,
            token: node.coordinator.start_validation(),
            validators: node.async_validators.clone(),
            value: node.value.clone(),
            emit_event,
        };
        node.run = Some(run.spawn(&runtime, shared));
        Ok(true)
    }

    /// Recalculate `id`, then each ancestor unless `only_self`.
    pub(crate) fn update_value_and_validity(
        &mut self,
        id: ControlId,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        let mut current = id;
        loop {
            self.recalculate(current, options, outbox)?;
            if options.only_self {
                return Ok(());
            }
            match self.node(current)?.parent {
                Some(parent) => current = parent,
                None => return Ok(()),
            }
        }
    }

    /// Whether the run `token` may keep going. Records a stale discard if
    /// not.
    pub(crate) fn check_run_live(&mut self, id: ControlId, token: ValidationToken) -> bool {
        let Ok(node) = self.node_mut(id) else {
            return false;
        };
        if node.coordinator.is_live(token) {
            true
        } else {
            node.coordinator.discard_stale(token);
            false
        }
    }

    /// Apply the merged result of run `token`, then refresh the status of
    /// every ancestor.
    pub(crate) fn complete_async_run(
        &mut self,
        id: ControlId,
        token: ValidationToken,
        errors: ValidationErrors,
        duration: Duration,
        emit_event: bool,
    ) {
        let Ok(node) = self.node_mut(id) else {
            return;
        };
        if !node.coordinator.try_apply_result(token, &errors, duration) {
            return;
        }
        node.run = None;
        node.errors.merge(errors);

        let mut current = Some(id);
        while let Some(id) = current {
            let Ok(status) = self.compute_status(id) else {
                break;
            };
            let Ok(node) = self.node_mut(id) else {
                break;
            };
            node.status = status;
            tracing::trace!(control = %id, %status, "async validation applied");
            if emit_event {
                node.events.emit_status(status);
            }
            current = node.parent;
        }
    }

    // -- Operations -------------------------------------------------------

    /// Check that `value` can be assigned to `id` without touching anything.
    fn check_assignment(&self, id: ControlId, value: &FormValue, path: &str) -> Result<()> {
        let Some(children) = self.node(id)?.kind.children() else {
            return Ok(());
        };
        let FormValue::Group(entries) = value else {
            return Err(FormError::ValueShape {
                path: path.to_owned(),
                expected: "group",
                found: value.kind(),
            });
        };
        for (name, child_value) in entries {
            let child_path = join_path(path, name);
            let Some(&child) = children.get(name) else {
                return Err(FormError::ControlNotFound { path: child_path });
            };
            self.check_assignment(child, child_value, &child_path)?;
        }
        Ok(())
    }

    fn assign(
        &mut self,
        id: ControlId,
        value: FormValue,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        match self.node(id)?.kind.children().cloned() {
            None => self.node_mut(id)?.value = value,
            Some(children) => {
                if let FormValue::Group(entries) = value {
                    for (name, child_value) in entries {
                        if let Some(&child) = children.get(&name) {
                            self.assign(child, child_value, options.for_children(), outbox)?;
                        }
                    }
                }
            }
        }
        self.update_value_and_validity(id, options, outbox)
    }

    pub(crate) fn set_value(
        &mut self,
        id: ControlId,
        value: FormValue,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        self.check_assignment(id, &value, "")?;
        self.assign(id, value, options, outbox)
    }

    pub(crate) fn reset(
        &mut self,
        id: ControlId,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        match self.node(id)?.kind.children().cloned() {
            None => self.node_mut(id)?.value = FormValue::Absent,
            Some(children) => {
                for child in children.into_values() {
                    self.reset(child, options.for_children(), outbox)?;
                }
            }
        }
        self.update_value_and_validity(id, options, outbox)
    }

    /// Enable or disable `id` and its whole subtree.
    pub(crate) fn set_disabled(
        &mut self,
        id: ControlId,
        disabled: bool,
        options: UpdateOptions,
        outbox: &mut Outbox,
    ) -> Result<()> {
        if let Some(children) = self.node(id)?.kind.children().cloned() {
            for child in children.into_values() {
                self.set_disabled(child, disabled, options.for_children(), outbox)?;
            }
        }
        self.node_mut(id)?.disabled = disabled;
        if !disabled && !options.only_self {
            self.clear_ancestor_disabled(id)?;
        }
        self.update_value_and_validity(id, options, outbox)?;
        if let Some(binding) = self.node(id)?.kind.accessor() {
            outbox.set_enabled(binding, !disabled);
        }
        Ok(())
    }

    /// Clear the explicit flag of every ancestor of `id`, so a group never
    /// stays `Disabled` over an enabled child.
    fn clear_ancestor_disabled(&mut self, id: ControlId) -> Result<()> {
        let mut current = self.node(id)?.parent;
        while let Some(ancestor) = current {
            let node = self.node_mut(ancestor)?;
            if node.disabled {
                tracing::trace!(control = %ancestor, "re-enabled by descendant");
                node.disabled = false;
            }
            current = node.parent;
        }
        Ok(())
    }

    pub(crate) fn set_validators(
        &mut self,
        id: ControlId,
        validators: Vec<ValidatorRef>,
    ) -> Result<()> {
        self.node_mut(id)?.validators = validators;
        Ok(())
    }

    pub(crate) fn set_async_validators(
        &mut self,
        id: ControlId,
        async_validators: Vec<AsyncValidatorRef>,
    ) -> Result<()> {
        self.node(id)?;
        self.ensure_runtime(&async_validators)?;
        self.node_mut(id)?.async_validators = async_validators;
        Ok(())
    }

    pub(crate) fn add_control(
        &mut self,
        group: ControlId,
        name: String,
        child: ControlId,
        outbox: &mut Outbox,
    ) -> Result<()> {
        let replaced = self.children(group)?.get(&name).copied();
        if self.node(child)?.parent.is_some() {
            return Err(FormError::AlreadyAttached { id: child });
        }
        if self.is_ancestor_or_self(child, group) {
            return Err(FormError::CycleDetected { id: child });
        }

        if let Some(old) = replaced {
            self.remove_subtree(old);
        }
        if let NodeKind::Group { children } = &mut self.node_mut(group)?.kind {
            children.insert(name.clone(), child);
        }
        self.node_mut(child)?.parent = Some(group);
        tracing::debug!(
            group = %group,
            control = %child,
            name = %name,
            replaced = replaced.is_some(),
            "attached control"
        );

        self.update_value_and_validity(group, UpdateOptions::default(), outbox)
    }

    pub(crate) fn remove_control(&mut self, group: ControlId, name: &str) -> Result<()> {
        let Some(&child) = self.children(group)?.get(name) else {
            return Err(FormError::ControlNotFound {
                path: name.to_owned(),
            });
        };
        if let NodeKind::Group { children } = &mut self.node_mut(group)?.kind {
            children.remove(name);
        }
        self.remove_subtree(child);
        tracing::debug!(group = %group, control = %child, name, "removed control");
        Ok(())
    }

    pub(crate) fn child(&self, group: ControlId, name: &str) -> Result<ControlId> {
        self.children(group)?
            .get(name)
            .copied()
            .ok_or_else(|| FormError::ControlNotFound {
                path: name.to_owned(),
            })
    }

    /// Resolve a dotted path of child names below `id`.
    pub(crate) fn lookup_path(&self, id: ControlId, path: &str) -> Result<ControlId> {
        let mut current = id;
        let mut walked = String::new();
        for segment in path.split('.') {
            let Some(children) = self.node(current)?.kind.children() else {
                let path = if walked.is_empty() {
                    current.to_string()
                } else {
                    walked
                };
                return Err(FormError::NotAGroup { path });
            };
            walked = join_path(&walked, segment);
            current = *children
                .get(segment)
                .ok_or_else(|| FormError::ControlNotFound {
                    path: walked.clone(),
                })?;
        }
        Ok(current)
    }

    pub(crate) fn bind_accessor(
        &mut self,
        id: ControlId,
        accessor: Arc<dyn ValueAccessor>,
        outbox: &mut Outbox,
    ) -> Result<()> {
        if !matches!(self.node(id)?.kind, NodeKind::Leaf { .. }) {
            return Err(FormError::NotALeaf { id });
        }
        self.next_binding_epoch += 1;
        let binding = AccessorBinding {
            accessor,
            epoch: self.next_binding_epoch,
        };
        let callback = accessor_callback(self.shared.clone(), id, binding.epoch);

        let node = self.node_mut(id)?;
        if let NodeKind::Leaf { accessor } = &mut node.kind {
            *accessor = Some(binding.clone());
        }
        outbox.write(&binding, node.value.clone());
        outbox.set_enabled(&binding, node.status.is_enabled());
        outbox.register(&binding, callback);
        tracing::debug!(control = %id, epoch = binding.epoch, "bound value accessor");
        Ok(())
    }

    pub(crate) fn clear_accessor(&mut self, id: ControlId) -> Result<()> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Leaf { accessor } => {
                *accessor = None;
                Ok(())
            }
            NodeKind::Group { .. } => Err(FormError::NotALeaf { id }),
        }
    }
}
