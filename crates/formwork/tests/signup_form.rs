//! End-to-end signup form built through the facade prelude.

use std::time::Duration;

use formwork::prelude::*;

fn signup(tree: &FormTree) -> (Control, Control, Control) {
    let username_taken = async_validator(|value: &FormValue| {
        let taken = value.as_str() == Some("admin");
        async move {
            tokio::time::sleep(Duration::from_millis(40)).await;
            if taken {
                ValidationErrors::flag("usernameTaken")
            } else {
                ValidationErrors::new()
            }
        }
    });
    let username = tree
        .control_with("", vec![required(), min_length(3)], vec![username_taken])
        .unwrap();
    let email_field = tree
        .control_with("", vec![required(), email()], Vec::new())
        .unwrap();
    let account = tree
        .group([("username", username.clone()), ("email", email_field.clone())])
        .unwrap();
    let form = tree.group([("account", account)]).unwrap();
    (form, username, email_field)
}

#[tokio::test(start_paused = true)]
async fn signup_walkthrough() {
    let tree = FormTree::new();
    let (form, username, email_field) = signup(&tree);
    assert_eq!(form.status().unwrap(), ControlStatus::Invalid);

    let mut statuses = form.status_changes().unwrap();
    form.set_value(
        FormValue::group([(
            "account",
            FormValue::group([("username", "admin"), ("email", "admin@example.com")]),
        )]),
        UpdateOptions::default(),
    )
    .unwrap();
    assert_eq!(form.status().unwrap(), ControlStatus::Pending);
    assert_eq!(email_field.status().unwrap(), ControlStatus::Valid);

    assert_eq!(statuses.recv().await, Some(ControlStatus::Pending));
    assert_eq!(statuses.recv().await, Some(ControlStatus::Invalid));
    assert_eq!(
        username.errors().unwrap().get("usernameTaken"),
        Some(&ErrorValue::Flag)
    );

    username.set_value("ada", UpdateOptions::default()).unwrap();
    assert_eq!(statuses.recv().await, Some(ControlStatus::Pending));
    assert_eq!(statuses.recv().await, Some(ControlStatus::Valid));
    assert_eq!(
        form.value().unwrap(),
        FormValue::group([(
            "account",
            FormValue::group([("username", "ada"), ("email", "admin@example.com")]),
        )])
    );
}

#[test]
fn usage_errors_surface_as_form_errors() {
    let tree = FormTree::new();
    let leaf = tree.control("x");
    let form = tree.group([("leaf", leaf.clone())]).unwrap();

    let err: FormError = form.get_path("leaf.deeper").unwrap_err();
    assert_eq!(err.to_string(), "control `leaf` is not a group");
    assert!(matches!(
        tree.control_with("x", Vec::new(), vec![async_validator(|_: &FormValue| async {
            ValidationErrors::new()
        })]),
        Err(FormError::NoAsyncRuntime)
    ));
}
