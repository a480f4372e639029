#![forbid(unsafe_code)]

//! Formwork public facade crate.
//!
//! Re-exports the types needed to build and drive a form from the core,
//! validation and runtime crates, plus a prelude for day-to-day usage.
//!
//! # Example
//!
//! ```rust
//! use formwork::prelude::*;
//!
//! let tree = FormTree::new();
//! let email_field = tree
//!     .control_with("matin3238@gmail.com", vec![required(), email()], Vec::new())
//!     .unwrap();
//! let login = tree.group([("email", email_field.clone())]).unwrap();
//! let form = tree.group([("login", login.clone())]).unwrap();
//! assert_eq!(form.status().unwrap(), ControlStatus::Valid);
//!
//! email_field.set_value("matin.com", UpdateOptions::default()).unwrap();
//! assert_eq!(login.status().unwrap(), ControlStatus::Invalid);
//! assert_eq!(form.status().unwrap(), ControlStatus::Invalid);
//! ```

// --- Core re-exports -------------------------------------------------------

pub use formwork_core::{
    ControlId, ControlStatus, ERROR_KEY_EMAIL, ERROR_KEY_MAX, ERROR_KEY_MAX_LENGTH, ERROR_KEY_MIN,
    ERROR_KEY_MIN_LENGTH, ERROR_KEY_PATTERN, ERROR_KEY_REQUIRED, ErrorValue, FormError,
    FormValue, Result, UpdateOptions, ValidationErrors, ValueMap,
};

// --- Validation re-exports -------------------------------------------------

pub use formwork_validation::{
    AsyncValidator, AsyncValidatorRef, Validator, ValidatorBuilder, ValidatorRef,
    async_validator, compose, email, max, max_length, min, min_length, pattern, required,
    validator,
};

// --- Runtime re-exports ----------------------------------------------------

pub use formwork_runtime::{
    ChangeCallback, Control, ControlKind, ControlSnapshot, EventStream, FormConfig,
    FormConfigError, FormConfigParse, FormTree, ValueAccessor,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Control, ControlStatus, ErrorValue, FormError, FormTree, FormValue, Result,
        UpdateOptions, ValidationErrors, ValidatorRef, ValueAccessor, async_validator, email,
        max_length, min_length, required, validator,
    };

    pub use crate::{core, runtime, validation};
}

pub use formwork_core as core;
pub use formwork_runtime as runtime;
pub use formwork_validation as validation;
