#![forbid(unsafe_code)]

//! Validators for formwork controls.
//!
//! Two kinds of validators can be attached to a control:
//!
//! - [`Validator`]: a pure, synchronous check. Built-ins cover required,
//!   email, length, numeric bound and pattern rules.
//! - [`AsyncValidator`]: a check that completes later. Async validators of a
//!   control run strictly one after another, and a newer run cancels an
//!   older one through the [`AsyncValidationCoordinator`].
//!
//! Both produce a [`ValidationErrors`](formwork_core::ValidationErrors) map;
//! an empty map means the value passed.
//!
//! # Example
//!
//! ```rust
//! use formwork_core::FormValue;
//! use formwork_validation::{email, required, run_validators};
//!
//! let validators = vec![required(), email()];
//! assert!(run_validators(&validators, &FormValue::from("a@b.com")).is_empty());
//! assert!(run_validators(&validators, &FormValue::from("matin.com")).contains("email"));
//! ```

pub mod async_validation;
pub mod validators;

pub use async_validation::{
    AsyncValidationCoordinator, AsyncValidator, AsyncValidatorRef, DEFAULT_TRACE_CAPACITY,
    ValidationEvent, ValidationToken, ValidationTrace, async_validator, run_sequence,
};
pub use validators::{
    Compose, Email, Max, MaxLength, Min, MinLength, Pattern, Required, Validator, ValidatorBuilder,
    ValidatorRef, compose, email, max, max_length, min, min_length, pattern, required,
    run_validators, validator,
};
