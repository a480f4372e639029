#![forbid(unsafe_code)]

//! Async validation with token-based staleness prevention.
//!
//! Every control that has async validators owns one
//! [`AsyncValidationCoordinator`]. Each recalculation that reaches the async
//! phase starts a new run and receives a fresh [`ValidationToken`]; starting
//! a run cancels whatever run was in flight. A run's merged result is applied
//! only while its token is still live, so a superseded run can never
//! overwrite the errors of a newer value.
//!
//! The coordinator records a bounded [`ValidationTrace`] of the run lifecycle
//! for debugging, which can be checked for lifecycle invariants.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use formwork_core::ValidationErrors;
//! use formwork_validation::AsyncValidationCoordinator;
//!
//! let mut coordinator = AsyncValidationCoordinator::new();
//! let first = coordinator.start_validation();
//! let second = coordinator.start_validation(); // supersedes `first`
//!
//! let errors = ValidationErrors::new();
//! assert!(!coordinator.try_apply_result(first, &errors, Duration::ZERO));
//! assert!(coordinator.try_apply_result(second, &errors, Duration::ZERO));
//! assert!(coordinator.trace().contains_event_type(first, "stale_discarded"));
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use formwork_core::{FormValue, ValidationErrors};
use futures_util::future::BoxFuture;

/// Number of trace events kept per coordinator unless configured otherwise.
pub const DEFAULT_TRACE_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// ValidationToken
// ---------------------------------------------------------------------------

/// A monotonically increasing token naming one async validation run.
///
/// # Invariants
///
/// - Tokens are strictly monotonic per coordinator.
/// - Token 0 is reserved for "no validation".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValidationToken(u64);

impl ValidationToken {
    /// The null token representing no validation.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value (for testing).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Default for ValidationToken {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::fmt::Display for ValidationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ValidationEvent
// ---------------------------------------------------------------------------

/// An event in the async validation lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationEvent {
    /// A run started.
    Started {
        token: ValidationToken,
        /// Timestamp relative to coordinator creation.
        elapsed_ns: u64,
    },

    /// A run was cancelled before it completed, either by a newer run or
    /// because the control no longer needs one.
    Cancelled {
        token: ValidationToken,
        elapsed_ns: u64,
    },

    /// A run finished its whole validator sequence.
    Completed {
        token: ValidationToken,
        /// Whether the async validators produced no errors.
        is_valid: bool,
        /// Time spent running the validators.
        duration_ns: u64,
        elapsed_ns: u64,
    },

    /// A run's result was applied to the control.
    Applied {
        token: ValidationToken,
        is_valid: bool,
        elapsed_ns: u64,
    },

    /// A run's result arrived after it was cancelled and was dropped.
    StaleDiscarded {
        token: ValidationToken,
        /// The most recently issued token when the result arrived.
        current_token: ValidationToken,
        elapsed_ns: u64,
    },
}

impl ValidationEvent {
    #[must_use]
    pub fn token(&self) -> ValidationToken {
        match self {
            Self::Started { token, .. }
            | Self::Cancelled { token, .. }
            | Self::Completed { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. } => *token,
        }
    }

    /// Event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Cancelled { .. } => "cancelled",
            Self::Completed { .. } => "completed",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationTrace
// ---------------------------------------------------------------------------

/// A bounded log of validation events.
///
/// Once `capacity` events are stored the oldest event is dropped for each
/// new one.
#[derive(Debug, Clone)]
pub struct ValidationTrace {
    events: VecDeque<ValidationEvent>,
    capacity: usize,
}

impl Default for ValidationTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRACE_CAPACITY)
    }

    /// A trace keeping at most `capacity` events (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_TRACE_CAPACITY)),
            capacity,
        }
    }

    pub fn push(&mut self, event: ValidationEvent) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Events from oldest to newest.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &ValidationEvent> + '_ {
        self.events.iter()
    }

    #[must_use]
    pub fn contains_event_type(&self, token: ValidationToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    #[must_use]
    pub fn events_for_token(&self, token: ValidationToken) -> Vec<&ValidationEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Check the lifecycle invariants over the stored events.
    ///
    /// Returns a description of each violation found.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        // Start tokens strictly increase
        let mut last_started = ValidationToken::NONE;
        for event in &self.events {
            if let ValidationEvent::Started { token, .. } = event {
                if *token <= last_started {
                    violations.push(format!(
                        "Non-monotonic start token: {token} after {last_started}"
                    ));
                }
                last_started = *token;
            }
        }

        // A run is applied at most once and never after a cancel
        for event in &self.events {
            let ValidationEvent::Applied { token, .. } = event else {
                continue;
            };
            let applied = self
                .events
                .iter()
                .filter(|e| matches!(e, ValidationEvent::Applied { token: t, .. } if t == token))
                .count();
            if applied > 1 {
                violations.push(format!("{token} applied {applied} times"));
            }
            if self.contains_event_type(*token, "cancelled") {
                violations.push(format!("{token} applied after being cancelled"));
            }
        }

        // Stale results only for cancelled runs (when the start is still in the window)
        for event in &self.events {
            if let ValidationEvent::StaleDiscarded { token, .. } = event
                && self.contains_event_type(*token, "started")
                && !self.contains_event_type(*token, "cancelled")
            {
                violations.push(format!("StaleDiscarded for live run {token}"));
            }
        }

        violations.dedup();
        violations
    }
}

// ---------------------------------------------------------------------------
// AsyncValidationCoordinator
// ---------------------------------------------------------------------------

/// Issues tokens for async runs and decides which results may apply.
///
/// A control keeps at most one run in flight; starting a run cancels the
/// previous one. The coordinator does not run anything itself. The owner
/// starts a run, executes the validators, and offers the result back through
/// [`try_apply_result`](Self::try_apply_result).
pub struct AsyncValidationCoordinator {
    next_token: u64,
    current_token: ValidationToken,
    in_flight: Option<ValidationToken>,
    trace: ValidationTrace,
    created_at: Instant,
}

impl std::fmt::Debug for AsyncValidationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncValidationCoordinator")
            .field("current_token", &self.current_token)
            .field("in_flight", &self.in_flight)
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl Default for AsyncValidationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncValidationCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_trace_capacity(DEFAULT_TRACE_CAPACITY)
    }

    #[must_use]
    pub fn with_trace_capacity(capacity: usize) -> Self {
        Self {
            next_token: 1,
            current_token: ValidationToken::NONE,
            in_flight: None,
            trace: ValidationTrace::with_capacity(capacity),
            created_at: Instant::now(),
        }
    }

    fn elapsed_ns(&self) -> u64 {
        self.created_at.elapsed().as_nanos() as u64
    }

    /// Start a new run, cancelling the one in flight.
    pub fn start_validation(&mut self) -> ValidationToken {
        self.cancel();
        let token = ValidationToken(self.next_token);
        self.next_token += 1;

        self.in_flight = Some(token);
        self.current_token = token;
        self.trace.push(ValidationEvent::Started {
            token,
            elapsed_ns: self.elapsed_ns(),
        });

        token
    }

    /// Cancel the run in flight, if any, without starting another.
    ///
    /// Returns the cancelled token.
    pub fn cancel(&mut self) -> Option<ValidationToken> {
        let previous = self.in_flight.take()?;
        tracing::trace!(token = %previous, "async validation cancelled");
        self.trace.push(ValidationEvent::Cancelled {
            token: previous,
            elapsed_ns: self.elapsed_ns(),
        });
        Some(previous)
    }

    /// Whether `token` names the run currently in flight.
    #[must_use]
    pub fn is_live(&self, token: ValidationToken) -> bool {
        self.in_flight == Some(token)
    }

    /// The most recently issued token.
    #[must_use]
    pub fn current_token(&self) -> ValidationToken {
        self.current_token
    }

    #[must_use]
    pub fn has_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Offer the result of a run.
    ///
    /// Returns `true` if the run is still live; it is then no longer in
    /// flight and the caller must apply `errors`. Returns `false` if the run
    /// was cancelled, in which case the result must be dropped.
    pub fn try_apply_result(
        &mut self,
        token: ValidationToken,
        errors: &ValidationErrors,
        duration: Duration,
    ) -> bool {
        let elapsed = self.elapsed_ns();
        let is_valid = errors.is_empty();

        self.trace.push(ValidationEvent::Completed {
            token,
            is_valid,
            duration_ns: duration.as_nanos() as u64,
            elapsed_ns: elapsed,
        });

        if !self.is_live(token) {
            tracing::trace!(%token, current = %self.current_token, "discarding stale async result");
            self.trace.push(ValidationEvent::StaleDiscarded {
                token,
                current_token: self.current_token,
                elapsed_ns: elapsed,
            });
            return false;
        }

        self.in_flight = None;
        self.trace.push(ValidationEvent::Applied {
            token,
            is_valid,
            elapsed_ns: elapsed,
        });
        true
    }

    /// Record that a cancelled run noticed it was stale part-way through.
    pub fn discard_stale(&mut self, token: ValidationToken) {
        let elapsed = self.elapsed_ns();
        self.trace.push(ValidationEvent::StaleDiscarded {
            token,
            current_token: self.current_token,
            elapsed_ns: elapsed,
        });
    }

    #[must_use]
    pub fn trace(&self) -> &ValidationTrace {
        &self.trace
    }

    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// `Ok(())` if the trace satisfies its invariants.
    pub fn verify_trace(&self) -> Result<(), Vec<String>> {
        let violations = self.trace.verify_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ---------------------------------------------------------------------------
// AsyncValidator Trait
// ---------------------------------------------------------------------------

/// A check of a control's value that completes later.
///
/// The returned future owns everything it needs; implementations clone the
/// parts of `value` they use. Any
/// `Fn(&FormValue) -> impl Future<Output = ValidationErrors> + Send + 'static`
/// closure is an async validator.
pub trait AsyncValidator: Send + Sync {
    fn validate(&self, value: &FormValue) -> BoxFuture<'static, ValidationErrors>;
}

impl<F, Fut> AsyncValidator for F
where
    F: Fn(&FormValue) -> Fut + Send + Sync,
    Fut: Future<Output = ValidationErrors> + Send + 'static,
{
    fn validate(&self, value: &FormValue) -> BoxFuture<'static, ValidationErrors> {
        Box::pin(self(value))
    }
}

/// Shared handle to an async validator, as stored on a control.
pub type AsyncValidatorRef = Arc<dyn AsyncValidator>;

/// Wrap a closure as an [`AsyncValidatorRef`].
pub fn async_validator<F, Fut>(f: F) -> AsyncValidatorRef
where
    F: Fn(&FormValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ValidationErrors> + Send + 'static,
{
    Arc::new(f)
}

/// Run `validators` one after another against `value`.
///
/// After each validator completes, `still_live` is asked whether the run may
/// continue; `None` is returned as soon as it answers `false`. Otherwise the
/// maps are merged last-writer-wins in list order.
pub async fn run_sequence<F>(
    validators: &[AsyncValidatorRef],
    value: &FormValue,
    mut still_live: F,
) -> Option<ValidationErrors>
where
    F: FnMut() -> bool,
{
    let mut errors = ValidationErrors::new();
    for validator in validators {
        let result = validator.validate(value).await;
        if !still_live() {
            return None;
        }
        errors.merge(result);
    }
    Some(errors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
