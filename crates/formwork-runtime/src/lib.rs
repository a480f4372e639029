#![forbid(unsafe_code)]

//! Control-tree runtime.
//!
//! A [`FormTree`] owns leaf and group controls. Each control carries a
//! value, a [`ControlStatus`](formwork_core::ControlStatus), its current
//! validation errors, and value/status event streams. Changing a control
//! recalculates it and, by default, every ancestor up to the root.
//!
//! # Recalculation
//!
//! 1. A group rebuilds its value from its enabled children.
//! 2. Any async run in flight for the control is cancelled.
//! 3. An enabled control runs its sync validators; a disabled one drops
//!    its errors.
//! 4. If the control is `Valid` or `Pending` and has async validators, a
//!    new run starts and the control turns `Pending`. When the run
//!    completes its errors are merged in and the status of the control and
//!    each ancestor is refreshed.
//! 5. Value and status are published if events were requested.
//!
//! Async runs are spawned on a tokio runtime: the one given in
//! [`FormConfig`] or the one current when the tree was created.

mod accessor;
mod config;
mod control;
mod events;
mod node;
mod runner;
mod tree;

pub use accessor::{ChangeCallback, ValueAccessor};
pub use config::{DEFAULT_EVENT_CAPACITY, FormConfig, FormConfigError, FormConfigParse};
pub use control::{Control, ControlSnapshot};
pub use events::EventStream;
pub use node::ControlKind;
pub use tree::FormTree;
