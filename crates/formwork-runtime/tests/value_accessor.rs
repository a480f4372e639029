//! Binding widgets to leaf controls.

use std::sync::{Arc, Mutex};

use formwork_core::{ControlStatus, FormError, FormValue, UpdateOptions};
use formwork_runtime::{ChangeCallback, FormTree, ValueAccessor};
use formwork_validation::required;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Write(FormValue),
    Enabled(bool),
    Register,
}

/// Records every call and keeps the last registered callback.
#[derive(Default)]
struct Widget {
    calls: Mutex<Vec<Call>>,
    on_change: Mutex<Option<ChangeCallback>>,
}

impl Widget {
    fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Simulate the user typing `value`.
    fn type_value(&self, value: &str) {
        let guard = self.on_change.lock().unwrap();
        let callback = guard.as_ref().expect("no callback registered");
        callback(FormValue::from(value));
    }
}

impl ValueAccessor for Widget {
    fn write(&self, value: &FormValue) {
        self.calls.lock().unwrap().push(Call::Write(value.clone()));
    }

    fn set_enabled_state(&self, enabled: bool) {
        self.calls.lock().unwrap().push(Call::Enabled(enabled));
    }

    fn register_on_change(&self, callback: ChangeCallback) {
        self.calls.lock().unwrap().push(Call::Register);
        *self.on_change.lock().unwrap() = Some(callback);
    }
}

#[test]
fn binding_writes_value_then_state_then_registers() {
    let tree = FormTree::new();
    let leaf = tree.control("hello");
    let widget = Arc::new(Widget::default());

    leaf.set_value_accessor(widget.clone()).unwrap();

    assert_eq!(
        widget.take_calls(),
        [
            Call::Write(FormValue::from("hello")),
            Call::Enabled(true),
            Call::Register
        ]
    );
}

#[test]
fn disabled_leaf_binds_as_read_only() {
    let tree = FormTree::new();
    let leaf = tree.control("x");
    leaf.disable(UpdateOptions::default()).unwrap();
    let widget = Arc::new(Widget::default());

    leaf.set_value_accessor(widget.clone()).unwrap();
    assert!(widget.take_calls().contains(&Call::Enabled(false)));
}

#[test]
fn user_edits_propagate_through_the_tree() {
    let tree = FormTree::new();
    let name = tree.control_with("", vec![required()], Vec::new()).unwrap();
    let form = tree.group([("name", name.clone())]).unwrap();
    let widget = Arc::new(Widget::default());
    name.set_value_accessor(widget.clone()).unwrap();
    widget.take_calls();
    let mut form_statuses = form.status_changes().unwrap();

    widget.type_value("Ada");

    assert_eq!(name.value().unwrap(), FormValue::from("Ada"));
    assert_eq!(form.status().unwrap(), ControlStatus::Valid);
    assert_eq!(form_statuses.drain(), [ControlStatus::Valid]);
    // The edit is echoed back like any other value change
    assert_eq!(widget.take_calls(), [Call::Write(FormValue::from("Ada"))]);
}

#[test]
fn programmatic_changes_reach_the_widget() {
    let tree = FormTree::new();
    let leaf = tree.control("a");
    let form = tree.group([("leaf", leaf.clone())]).unwrap();
    let widget = Arc::new(Widget::default());
    leaf.set_value_accessor(widget.clone()).unwrap();
    widget.take_calls();

    leaf.set_value("b", UpdateOptions::default()).unwrap();
    form.set_value(FormValue::group([("leaf", "c")]), UpdateOptions::default())
        .unwrap();
    form.disable(UpdateOptions::default()).unwrap();

    assert_eq!(
        widget.take_calls(),
        [
            Call::Write(FormValue::from("b")),
            Call::Write(FormValue::from("c")),
            Call::Write(FormValue::from("c")),
            Call::Enabled(false),
        ]
    );
}

#[test]
fn replaced_or_cleared_accessor_is_inert() {
    let tree = FormTree::new();
    let leaf = tree.control("start");
    let first = Arc::new(Widget::default());
    let second = Arc::new(Widget::default());

    leaf.set_value_accessor(first.clone()).unwrap();
    leaf.set_value_accessor(second.clone()).unwrap();
    first.type_value("from first");
    assert_eq!(leaf.value().unwrap(), FormValue::from("start"));

    second.type_value("from second");
    assert_eq!(leaf.value().unwrap(), FormValue::from("from second"));

    leaf.clear_value_accessor().unwrap();
    second.type_value("after clear");
    assert_eq!(leaf.value().unwrap(), FormValue::from("from second"));
    second.take_calls();
    leaf.set_value("quiet", UpdateOptions::default()).unwrap();
    assert!(second.take_calls().is_empty());
}

#[test]
fn callback_outliving_its_control_is_inert() {
    let tree = FormTree::new();
    let leaf = tree.control("x");
    let widget = Arc::new(Widget::default());
    leaf.set_value_accessor(widget.clone()).unwrap();

    tree.release(leaf.clone()).unwrap();
    widget.type_value("ignored");
    assert!(!leaf.is_alive());

    drop(leaf);
    drop(tree);
    widget.type_value("tree gone");
}

#[test]
fn groups_cannot_bind_accessors() {
    let tree = FormTree::new();
    let group = tree.group([("a", tree.control(1))]).unwrap();
    let widget = Arc::new(Widget::default());

    assert_eq!(
        group.set_value_accessor(widget.clone()).unwrap_err(),
        FormError::NotALeaf { id: group.id() }
    );
    assert_eq!(
        group.clear_value_accessor().unwrap_err(),
        FormError::NotALeaf { id: group.id() }
    );
    assert!(widget.take_calls().is_empty());
}

#[test]
fn accessor_may_read_the_tree_while_written() {
    struct Mirror {
        control: Mutex<Option<formwork_runtime::Control>>,
        seen: Mutex<Vec<FormValue>>,
    }

    impl ValueAccessor for Mirror {
        fn write(&self, _value: &FormValue) {
            if let Some(control) = self.control.lock().unwrap().as_ref() {
                // The tree lock is already released here
                self.seen.lock().unwrap().push(control.value().unwrap());
            }
        }

        fn set_enabled_state(&self, _enabled: bool) {}

        fn register_on_change(&self, _callback: ChangeCallback) {}
    }

    let tree = FormTree::new();
    let leaf = tree.control("a");
    let mirror = Arc::new(Mirror {
        control: Mutex::new(Some(leaf.clone())),
        seen: Mutex::new(Vec::new()),
    });
    leaf.set_value_accessor(mirror.clone()).unwrap();
    leaf.set_value("b", UpdateOptions::default()).unwrap();

    assert_eq!(
        *mirror.seen.lock().unwrap(),
        [FormValue::from("a"), FormValue::from("b")]
    );
    mirror.control.lock().unwrap().take();
}
