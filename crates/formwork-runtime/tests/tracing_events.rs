#![forbid(unsafe_code)]

//! Diagnostics emitted through `tracing`.
//!
//! A capturing layer records every event so tests can assert on the
//! structural changes and warnings the runtime reports.

use std::sync::{Arc, Mutex};

use formwork_core::{FormValue, UpdateOptions};
use formwork_runtime::{ChangeCallback, FormConfig, FormTree, ValueAccessor};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    message: String,
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    fn messages_at(&self, level: Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level == level)
            .map(|event| event.message.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message: visitor.0,
        });
    }
}

fn with_captured_events(f: impl FnOnce()) -> EventCapture {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, f);
    capture
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn structural_changes_are_logged_at_debug() {
    let capture = with_captured_events(|| {
        let tree = FormTree::new();
        let group = tree.group([("a", tree.control("a"))]).unwrap();
        group.add_control("b", &tree.control("b")).unwrap();
        group.remove_control("a").unwrap();
        tree.release(group).unwrap();
    });

    let debug = capture.messages_at(Level::DEBUG);
    for expected in ["attached control", "removed control", "released control"] {
        assert!(
            debug.iter().any(|message| message == expected),
            "missing {expected:?} in {debug:?}"
        );
    }
}

#[test]
fn recalculation_is_logged_at_trace() {
    let capture = with_captured_events(|| {
        let tree = FormTree::new();
        let leaf = tree.control("a");
        leaf.set_value("b", UpdateOptions::default()).unwrap();
    });

    let trace = capture.messages_at(Level::TRACE);
    assert!(trace.iter().filter(|m| *m == "recalculated control").count() >= 2);
}

#[test]
fn stale_accessor_change_warns() {
    struct Keeper(Mutex<Option<ChangeCallback>>);

    impl ValueAccessor for Keeper {
        fn write(&self, _value: &FormValue) {}
        fn set_enabled_state(&self, _enabled: bool) {}
        fn register_on_change(&self, callback: ChangeCallback) {
            *self.0.lock().unwrap() = Some(callback);
        }
    }

    let capture = with_captured_events(|| {
        let tree = FormTree::new();
        let leaf = tree.control("a");
        let keeper = Arc::new(Keeper(Mutex::new(None)));
        leaf.set_value_accessor(keeper.clone()).unwrap();
        leaf.clear_value_accessor().unwrap();

        let callback = keeper.0.lock().unwrap().take().unwrap();
        callback(FormValue::from("late"));
        assert_eq!(leaf.value().unwrap(), FormValue::from("a"));
    });

    assert_eq!(
        capture.messages_at(Level::WARN),
        ["ignoring change from an unbound value accessor"]
    );
}

#[test]
fn lagging_subscriber_warns_and_skips_ahead() {
    let capture = with_captured_events(|| {
        let tree = FormTree::with_config(FormConfig::new().event_capacity(1));
        let leaf = tree.control("");
        let mut values = leaf.value_changes().unwrap();
        for value in ["a", "b", "c"] {
            leaf.set_value(value, UpdateOptions::default()).unwrap();
        }
        assert_eq!(values.try_recv(), Some(FormValue::from("c")));
        assert_eq!(values.try_recv(), None);
    });

    assert_eq!(
        capture.messages_at(Level::WARN),
        ["event subscriber lagged, skipping missed events"]
    );
}
