#![forbid(unsafe_code)]

//! Core: values, statuses, error maps and update options shared by every
//! formwork crate.

pub mod error;
pub mod errors;
pub mod id;
pub mod options;
pub mod status;
pub mod value;

pub use error::{FormError, Result};
pub use errors::{
    ERROR_KEY_EMAIL, ERROR_KEY_MAX, ERROR_KEY_MAX_LENGTH, ERROR_KEY_MIN, ERROR_KEY_MIN_LENGTH,
    ERROR_KEY_PATTERN, ERROR_KEY_REQUIRED, ErrorValue, ValidationErrors,
};
pub use id::ControlId;
pub use options::UpdateOptions;
pub use status::ControlStatus;
pub use value::{FormValue, ValueMap};
