#![forbid(unsafe_code)]

//! Sync validator trait and built-in validators.

use std::fmt;
use std::sync::Arc;

use formwork_core::{
    ERROR_KEY_EMAIL, ERROR_KEY_MAX, ERROR_KEY_MAX_LENGTH, ERROR_KEY_MIN, ERROR_KEY_MIN_LENGTH,
    ERROR_KEY_PATTERN, ERROR_KEY_REQUIRED, ErrorValue, FormValue, ValidationErrors,
};
use regex::Regex;

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// A pure check of a control's value.
///
/// Returns an empty map when the value passes. Validators hold no state
/// between calls; given the same value they return the same errors.
///
/// Any `Fn(&FormValue) -> ValidationErrors + Send + Sync` closure is a
/// validator.
///
/// # Implementing a Custom Validator
///
/// ```rust
/// use formwork_core::{FormValue, ValidationErrors};
/// use formwork_validation::Validator;
///
/// struct NoSpaces;
///
/// impl Validator for NoSpaces {
///     fn validate(&self, value: &FormValue) -> ValidationErrors {
///         match value.as_str() {
///             Some(s) if s.contains(' ') => ValidationErrors::flag("noSpaces"),
///             _ => ValidationErrors::new(),
///         }
///     }
///
///     fn key(&self) -> &str {
///         "noSpaces"
///     }
/// }
///
/// assert!(NoSpaces.validate(&"a b".into()).contains("noSpaces"));
/// ```
pub trait Validator: Send + Sync {
    /// Check `value`, returning the errors it produces.
    fn validate(&self, value: &FormValue) -> ValidationErrors;

    /// The error key this validator reports under, for diagnostics.
    fn key(&self) -> &str {
        "custom"
    }
}

impl<F> Validator for F
where
    F: Fn(&FormValue) -> ValidationErrors + Send + Sync,
{
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        self(value)
    }
}

/// Shared handle to a sync validator, as stored on a control.
pub type ValidatorRef = Arc<dyn Validator>;

/// Wrap a closure as a [`ValidatorRef`].
pub fn validator<F>(f: F) -> ValidatorRef
where
    F: Fn(&FormValue) -> ValidationErrors + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Run every validator against `value` in list order.
///
/// Maps are merged last-writer-wins: on a duplicate key the later
/// validator's entry is kept.
#[must_use]
pub fn run_validators(validators: &[ValidatorRef], value: &FormValue) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for validator in validators {
        errors.merge(validator.validate(value));
    }
    errors
}

// ---------------------------------------------------------------------------
// Built-in Validators
// ---------------------------------------------------------------------------

/// Fails for absent values and empty text.
///
/// By default, whitespace-only text is considered empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required {
    /// If `true`, whitespace-only text passes.
    pub allow_whitespace: bool,
}

impl Required {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let whitespace-only text pass.
    #[must_use]
    pub fn allow_whitespace(mut self) -> Self {
        self.allow_whitespace = true;
        self
    }
}

impl Validator for Required {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        let is_empty = match value {
            FormValue::Absent => true,
            FormValue::Text(s) if self.allow_whitespace => s.is_empty(),
            FormValue::Text(s) => s.trim().is_empty(),
            _ => false,
        };

        if is_empty {
            ValidationErrors::flag(ERROR_KEY_REQUIRED)
        } else {
            ValidationErrors::new()
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_REQUIRED
    }
}

/// Text must have at least `min` characters. Other values pass.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    pub min: usize,
}

impl MinLength {
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Validator for MinLength {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        let Some(text) = value.as_str() else {
            return ValidationErrors::new();
        };
        let len = text.chars().count();
        if len < self.min {
            ValidationErrors::single(
                ERROR_KEY_MIN_LENGTH,
                ErrorValue::Length {
                    required: self.min,
                    actual: len,
                },
            )
        } else {
            ValidationErrors::new()
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_MIN_LENGTH
    }
}

/// Text must have at most `max` characters. Other values pass.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    pub max: usize,
}

impl MaxLength {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Validator for MaxLength {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        let Some(text) = value.as_str() else {
            return ValidationErrors::new();
        };
        let len = text.chars().count();
        if len > self.max {
            ValidationErrors::single(
                ERROR_KEY_MAX_LENGTH,
                ErrorValue::Length {
                    required: self.max,
                    actual: len,
                },
            )
        } else {
            ValidationErrors::new()
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_MAX_LENGTH
    }
}

/// Numbers must be at least `limit`. Other values pass.
///
/// The comparison is signed: `-5` fails `Min::new(1)`. Sign-insensitive
/// bounds can be built from [`validator`] over `abs()`.
#[derive(Debug, Clone, Copy)]
pub struct Min {
    pub limit: f64,
}

impl Min {
    #[must_use]
    pub fn new(limit: impl Into<f64>) -> Self {
        Self {
            limit: limit.into(),
        }
    }
}

impl Validator for Min {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        match value.as_f64() {
            Some(actual) if actual < self.limit => ValidationErrors::single(
                ERROR_KEY_MIN,
                ErrorValue::Limit {
                    limit: self.limit,
                    actual,
                },
            ),
            _ => ValidationErrors::new(),
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_MIN
    }
}

/// Numbers must be at most `limit`. Other values pass.
///
/// Signed like [`Min`], so `-50` satisfies `Max::new(10)`.
#[derive(Debug, Clone, Copy)]
pub struct Max {
    pub limit: f64,
}

impl Max {
    #[must_use]
    pub fn new(limit: impl Into<f64>) -> Self {
        Self {
            limit: limit.into(),
        }
    }
}

impl Validator for Max {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        match value.as_f64() {
            Some(actual) if actual > self.limit => ValidationErrors::single(
                ERROR_KEY_MAX,
                ErrorValue::Limit {
                    limit: self.limit,
                    actual,
                },
            ),
            _ => ValidationErrors::new(),
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_MAX
    }
}

/// Non-empty text must match a regular expression in full.
///
/// Empty and non-text values pass (use [`Required`] for required).
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compile `pattern`; the match is anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self {
            regex,
            source: pattern.to_owned(),
        })
    }

    /// The pattern as given to [`Pattern::new`].
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Validator for Pattern {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        match value.as_str() {
            Some(text) if !text.is_empty() && !self.regex.is_match(text) => {
                let source = ErrorValue::Message(self.source.clone());
                ValidationErrors::single(ERROR_KEY_PATTERN, source)
            }
            _ => ValidationErrors::new(),
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_PATTERN
    }
}

/// Validates that text is an email address of the form `local@domain.tld`.
///
/// Empty, absent and non-text values pass (use [`Required`] for required).
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Email {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn is_well_formed(text: &str) -> bool {
        let Some((local, domain)) = text.split_once('@') else {
            return false;
        };

        let local_ok = !local.is_empty()
            && local
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
        if !local_ok {
            return false;
        }

        // Domain must have at least one dot, no empty labels
        let Some((host, tld)) = domain.rsplit_once('.') else {
            return false;
        };
        let host_ok = !host.is_empty()
            && host.split('.').all(|label| !label.is_empty())
            && host
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        let tld_ok = (2..=64).contains(&tld.len()) && tld.chars().all(|c| c.is_ascii_alphabetic());

        host_ok && tld_ok
    }
}

impl Validator for Email {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        match value.as_str() {
            Some(text) if !text.is_empty() && !Self::is_well_formed(text) => {
                ValidationErrors::flag(ERROR_KEY_EMAIL)
            }
            _ => ValidationErrors::new(),
        }
    }

    fn key(&self) -> &str {
        ERROR_KEY_EMAIL
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Runs a list of validators as one, with the usual merge rule.
pub struct Compose {
    validators: Vec<ValidatorRef>,
}

impl Compose {
    #[must_use]
    pub fn new(validators: Vec<ValidatorRef>) -> Self {
        Self { validators }
    }
}

impl Validator for Compose {
    fn validate(&self, value: &FormValue) -> ValidationErrors {
        run_validators(&self.validators, value)
    }

    fn key(&self) -> &str {
        "compose"
    }
}

impl fmt::Debug for Compose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compose")
            .field(
                "validators",
                &format!("[{} validators]", self.validators.len()),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Shorthands
// ---------------------------------------------------------------------------

/// [`Required`] as a [`ValidatorRef`].
#[must_use]
pub fn required() -> ValidatorRef {
    Arc::new(Required::new())
}

/// [`Email`] as a [`ValidatorRef`].
#[must_use]
pub fn email() -> ValidatorRef {
    Arc::new(Email::new())
}

/// [`MinLength`] as a [`ValidatorRef`].
#[must_use]
pub fn min_length(min: usize) -> ValidatorRef {
    Arc::new(MinLength::new(min))
}

/// [`MaxLength`] as a [`ValidatorRef`].
#[must_use]
pub fn max_length(max: usize) -> ValidatorRef {
    Arc::new(MaxLength::new(max))
}

/// [`Min`] as a [`ValidatorRef`].
#[must_use]
pub fn min(limit: impl Into<f64>) -> ValidatorRef {
    Arc::new(Min::new(limit))
}

/// [`Max`] as a [`ValidatorRef`].
#[must_use]
pub fn max(limit: impl Into<f64>) -> ValidatorRef {
    Arc::new(Max::new(limit))
}

/// [`Pattern`] as a [`ValidatorRef`].
pub fn pattern(pattern: &str) -> Result<ValidatorRef, regex::Error> {
    Ok(Arc::new(Pattern::new(pattern)?))
}

/// [`Compose`] as a [`ValidatorRef`].
#[must_use]
pub fn compose(validators: Vec<ValidatorRef>) -> ValidatorRef {
    Arc::new(Compose::new(validators))
}

// ---------------------------------------------------------------------------
// ValidatorBuilder
// ---------------------------------------------------------------------------

/// Builds an ordered validator list fluently.
///
/// # Example
///
/// ```rust
/// use formwork_core::FormValue;
/// use formwork_validation::{ValidatorBuilder, run_validators};
///
/// let validators = ValidatorBuilder::new()
///     .required()
///     .min_length(3)
///     .max_length(20)
///     .build();
///
/// assert!(run_validators(&validators, &FormValue::from("alice")).is_empty());
/// assert!(run_validators(&validators, &FormValue::from("ab")).contains("minLength"));
/// ```
#[derive(Default)]
pub struct ValidatorBuilder {
    validators: Vec<ValidatorRef>,
}

impl ValidatorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append any validator.
    #[must_use]
    pub fn custom(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    #[must_use]
    pub fn required(self) -> Self {
        self.custom(Required::new())
    }

    #[must_use]
    pub fn email(self) -> Self {
        self.custom(Email::new())
    }

    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.custom(MinLength::new(min))
    }

    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.custom(MaxLength::new(max))
    }

    #[must_use]
    pub fn min(self, limit: impl Into<f64>) -> Self {
        self.custom(Min::new(limit))
    }

    #[must_use]
    pub fn max(self, limit: impl Into<f64>) -> Self {
        self.custom(Max::new(limit))
    }

    /// The validators in the order they were added.
    #[must_use]
    pub fn build(self) -> Vec<ValidatorRef> {
        self.validators
    }
}

impl fmt::Debug for ValidatorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.validators.iter().map(|v| v.key()).collect();
        f.debug_struct("ValidatorBuilder")
            .field("validators", &keys)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
