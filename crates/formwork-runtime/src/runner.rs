#![forbid(unsafe_code)]

//! Async validation runs.
//!
//! A run is a tokio task that executes a control's async validators in
//! sequence and hands the merged result back to the tree. The task holds
//! only a weak reference to the tree, and it applies its result under the
//! tree lock after checking its token, so a superseded run never mutates
//! the control.

use std::sync::Weak;

use formwork_core::{ControlId, FormValue};
use formwork_validation::{AsyncValidatorRef, ValidationToken, run_sequence};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::tree::Shared;

/// Everything a run needs, captured when it starts.
pub(crate) struct AsyncRun {
    pub(crate) control: ControlId,
    pub(crate) token: ValidationToken,
    pub(crate) validators: Vec<AsyncValidatorRef>,
    pub(crate) value: FormValue,
    /// Whether the triggering recalculation emitted events.
    pub(crate) emit_event: bool,
}

impl AsyncRun {
    /// Spawn the run on `runtime`.
    pub(crate) fn spawn(self, runtime: &Handle, shared: Weak<Shared>) -> AbortHandle {
        tracing::trace!(
            control = %self.control,
            token = %self.token,
            validators = self.validators.len(),
            "starting async validation run"
        );
        runtime.spawn(self.execute(shared)).abort_handle()
    }

    async fn execute(self, shared: Weak<Shared>) {
        let Self {
            control,
            token,
            validators,
            value,
            emit_event,
        } = self;
        let started = Instant::now();

        let still_live = || {
            shared
                .upgrade()
                .is_some_and(|shared| shared.lock().check_run_live(control, token))
        };
        let Some(errors) = run_sequence(&validators, &value, still_live).await else {
            tracing::trace!(%control, %token, "async validation run superseded");
            return;
        };

        let Some(shared) = shared.upgrade() else {
            return;
        };
        shared
            .lock()
            .complete_async_run(control, token, errors, started.elapsed(), emit_event);
    }
}
