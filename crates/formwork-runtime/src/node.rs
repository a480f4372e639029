#![forbid(unsafe_code)]

//! Arena-resident state of one control.

use std::collections::BTreeMap;
use std::fmt;

use formwork_core::{ControlId, ControlStatus, FormValue, ValidationErrors};
use formwork_validation::{AsyncValidationCoordinator, AsyncValidatorRef, ValidatorRef};
use tokio::task::AbortHandle;

use crate::accessor::AccessorBinding;
use crate::events::EventChannels;

/// Whether a control holds a scalar value or named children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Leaf,
    Group,
}

impl ControlKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "leaf",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub(crate) enum NodeKind {
    Leaf {
        accessor: Option<AccessorBinding>,
    },
    Group {
        children: BTreeMap<String, ControlId>,
    },
}

impl NodeKind {
    pub(crate) fn kind(&self) -> ControlKind {
        match self {
            Self::Leaf { .. } => ControlKind::Leaf,
            Self::Group { .. } => ControlKind::Group,
        }
    }

    pub(crate) fn children(&self) -> Option<&BTreeMap<String, ControlId>> {
        match self {
            Self::Leaf { .. } => None,
            Self::Group { children } => Some(children),
        }
    }

    pub(crate) fn accessor(&self) -> Option<&AccessorBinding> {
        match self {
            Self::Leaf { accessor } => accessor.as_ref(),
            Self::Group { .. } => None,
        }
    }
}

pub(crate) struct Node {
    pub(crate) kind: NodeKind,
    pub(crate) value: FormValue,
    pub(crate) status: ControlStatus,
    pub(crate) errors: ValidationErrors,
    pub(crate) validators: Vec<ValidatorRef>,
    pub(crate) async_validators: Vec<AsyncValidatorRef>,
    pub(crate) parent: Option<ControlId>,
    /// Set only by enable/disable.
    pub(crate) disabled: bool,
    pub(crate) events: EventChannels,
    pub(crate) coordinator: AsyncValidationCoordinator,
    /// Task of the run in flight.
    pub(crate) run: Option<AbortHandle>,
}

impl Node {
    pub(crate) fn new(
        kind: NodeKind,
        value: FormValue,
        validators: Vec<ValidatorRef>,
        async_validators: Vec<AsyncValidatorRef>,
        event_capacity: usize,
        trace_capacity: usize,
    ) -> Self {
        Self {
            kind,
            value,
            status: ControlStatus::Valid,
            errors: ValidationErrors::new(),
            validators,
            async_validators,
            parent: None,
            disabled: false,
            events: EventChannels::new(event_capacity),
            coordinator: AsyncValidationCoordinator::with_trace_capacity(trace_capacity),
            run: None,
        }
    }

    /// Abort the run in flight, if any.
    pub(crate) fn cancel_run(&mut self) {
        if let Some(run) = self.run.take() {
            run.abort();
        }
        if let Some(token) = self.coordinator.cancel() {
            tracing::trace!(%token, "cancelled async validation run");
        }
    }

    pub(crate) fn has_live_run(&self) -> bool {
        self.coordinator.has_in_flight()
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            run.abort();
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .field("status", &self.status)
            .field("errors", &self.errors)
            .field("validators", &self.validators.len())
            .field("async_validators", &self.async_validators.len())
            .field("parent", &self.parent)
            .field("disabled", &self.disabled)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}
