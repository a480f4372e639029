#![forbid(unsafe_code)]

//! Tree configuration.
//!
//! Defaults work for most forms. Capacities can be overridden in code or
//! through environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FORMWORK_EVENT_CAPACITY` | [`FormConfig::event_capacity`] |
//! | `FORMWORK_ASYNC_TRACE_CAPACITY` | [`FormConfig::async_trace_capacity`] |

use std::env;
use std::fmt;

use formwork_validation::DEFAULT_TRACE_CAPACITY;
use tokio::runtime::Handle;

const ENV_EVENT_CAPACITY: &str = "FORMWORK_EVENT_CAPACITY";
const ENV_ASYNC_TRACE_CAPACITY: &str = "FORMWORK_ASYNC_TRACE_CAPACITY";

/// Default number of buffered events per stream before slow subscribers
/// start skipping.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration of a [`FormTree`](crate::FormTree).
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Events buffered per value/status stream for each subscriber.
    pub event_capacity: usize,
    /// Lifecycle events kept in each control's async trace.
    pub async_trace_capacity: usize,
    /// Runtime that async validation runs are spawned on. When `None`, the
    /// runtime current at tree construction (if any) is used.
    pub runtime: Option<Handle>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            async_trace_capacity: DEFAULT_TRACE_CAPACITY,
            runtime: None,
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct FormConfigParse {
    pub config: FormConfig,
    pub errors: Vec<FormConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl FormConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FormConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for FormConfigError {}

impl FormConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    #[must_use]
    pub fn async_trace_capacity(mut self, capacity: usize) -> Self {
        self.async_trace_capacity = capacity;
        self
    }

    /// Spawn async validation runs on `handle`.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Parse config from environment variables.
    ///
    /// Invalid values are ignored and the default kept; use
    /// [`from_env_with_diagnostics`](Self::from_env_with_diagnostics) to see
    /// them.
    #[must_use]
    pub fn from_env() -> FormConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> FormConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<FormConfigError>> {
        let mut errors = Vec::new();
        validate_positive("event_capacity", self.event_capacity, &mut errors);
        validate_positive(
            "async_trace_capacity",
            self.async_trace_capacity,
            &mut errors,
        );
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn from_env_with<F>(mut get: F) -> FormConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = FormConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_EVENT_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.event_capacity = parsed,
            None => errors.push(FormConfigError::new(
                "event_capacity",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Some(value) = get(ENV_ASYNC_TRACE_CAPACITY) {
        match parse_usize(&value) {
            Some(parsed) => config.async_trace_capacity = parsed,
            None => errors.push(FormConfigError::new(
                "async_trace_capacity",
                value,
                "expected positive integer",
            )),
        }
    }

    if let Err(mut validation) = config.validate() {
        errors.append(&mut validation);
        // Keep the tree usable: zero capacities fall back to defaults
        if config.event_capacity == 0 {
            config.event_capacity = DEFAULT_EVENT_CAPACITY;
        }
        if config.async_trace_capacity == 0 {
            config.async_trace_capacity = DEFAULT_TRACE_CAPACITY;
        }
    }

    FormConfigParse { config, errors }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

fn validate_positive(field: &'static str, value: usize, errors: &mut Vec<FormConfigError>) {
    if value == 0 {
        errors.push(FormConfigError::new(
            field,
            value.to_string(),
            "must be >= 1",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_valid() {
        let config = FormConfig::default();
        assert_eq!(config.event_capacity, DEFAULT_EVENT_CAPACITY);
        assert_eq!(config.async_trace_capacity, DEFAULT_TRACE_CAPACITY);
        assert!(config.runtime.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_parsing() {
        let mut env = HashMap::new();
        env.insert(ENV_EVENT_CAPACITY, " 8 ");
        env.insert(ENV_ASYNC_TRACE_CAPACITY, "32");

        let parsed = from_env_with(|key| env.get(key).map(|value| value.to_string()));
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.config.event_capacity, 8);
        assert_eq!(parsed.config.async_trace_capacity, 32);
    }

    #[test]
    fn env_invalid_values_reported() {
        let mut env = HashMap::new();
        env.insert(ENV_EVENT_CAPACITY, "lots");
        env.insert(ENV_ASYNC_TRACE_CAPACITY, "-1");

        let parsed = from_env_with(|key| env.get(key).map(|value| value.to_string()));
        assert!(parsed.errors.iter().any(|err| err.field == "event_capacity"));
        assert!(
            parsed
                .errors
                .iter()
                .any(|err| err.field == "async_trace_capacity")
        );
        assert_eq!(parsed.config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn env_zero_rejected_and_defaulted() {
        let mut env = HashMap::new();
        env.insert(ENV_EVENT_CAPACITY, "0");

        let parsed = from_env_with(|key| env.get(key).map(|value| value.to_string()));
        assert_eq!(
            parsed.errors,
            vec![FormConfigError::new("event_capacity", "0", "must be >= 1")]
        );
        assert_eq!(parsed.config.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn validate_reports_all_fields() {
        let config = FormConfig::new().event_capacity(0).async_trace_capacity(0);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].to_string(), "event_capacity=0 (must be >= 1)");
    }
}
