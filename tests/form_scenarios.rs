use formstate::{
    ChangeNotification, DynamicDescriptor, FieldAddress, Form, FormError, RuleArgs, RuleRegistry,
    Schema, SetFieldValue, SetFieldValueBulk, StandardDescriptor, ValidationRule, Value, rules,
};
use indexmap::IndexMap;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn serialized(form: &Form) -> String {
    serde_json::to_string(form.state()).expect("state should serialize")
}

fn json_values(value: serde_json::Value) -> IndexMap<String, Value> {
    match Value::from(value) {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn email_scenario_end_to_end() {
    let schema = Schema::new().with_field(
        "email",
        StandardDescriptor::text().with_rule(rules::is_required()),
    );
    let mut form = Form::new(schema, None).expect("form");
    assert_eq!(form.get_field_value("email").expect("email"), Value::text(""));

    form.change("email", ChangeNotification::text("")).expect("change");
    assert_eq!(form.fields()[0].error, "Is required default");

    form.change("email", ChangeNotification::text("a@b.com")).expect("change");
    assert_eq!(form.fields()[0].error, "");

    let payload = form.prepare_for_server();
    assert_eq!(Value::from(payload).to_json(), json!({ "email": "a@b.com" }));
}

#[test]
fn cross_field_propagation_stops_after_one_hop() {
    let schema = Schema::new()
        .with_field(
            "a",
            StandardDescriptor::text()
                .with_rule(rules::min_length(3))
                .with_rule(ValidationRule::validate_another_field("b")),
        )
        .with_field(
            "b",
            StandardDescriptor::text()
                .with_rule(rules::is_required())
                .with_rule(ValidationRule::validate_another_field("a")),
        );
    let mut form = Form::new(schema, None).expect("form");

    form.change("a", ChangeNotification::text("xy")).expect("change");
    let state = form.state();
    assert_eq!(state.field("a").expect("a").error, rules::MIN_LENGTH_MESSAGE);
    assert_eq!(state.field("b").expect("b").error, rules::REQUIRED_MESSAGE);

    form.change("b", ChangeNotification::text("filled")).expect("change");
    let state = form.state();
    assert_eq!(state.field("b").expect("b").error, "");
    // Re-validated from its unchanged value, still too short.
    assert_eq!(state.field("a").expect("a").error, rules::MIN_LENGTH_MESSAGE);
}

#[test]
fn dependency_conditioned_rule_runs_only_on_match() {
    let schema = Schema::new()
        .with_field(
            "a",
            StandardDescriptor::text().with_rule(
                rules::is_required()
                    .with_args(RuleArgs::new().with_dependency("b", Some(Value::text("X")))),
            ),
        )
        .with_field("b", StandardDescriptor::select());
    let mut form = Form::new(schema, None).expect("form");

    form.change("b", ChangeNotification::selection(Value::option("Y", "Why")))
        .expect("change");
    form.change("a", ChangeNotification::text("")).expect("change");
    assert_eq!(form.state().field("a").expect("a").error, "");
    assert!(form.validate().expect("validate"));

    form.change("b", ChangeNotification::selection(Value::option("X", "Ex")))
        .expect("change");
    form.change("a", ChangeNotification::text("")).expect("change");
    assert_eq!(form.state().field("a").expect("a").error, rules::REQUIRED_MESSAGE);
    assert!(!form.validate().expect("validate"));
}

#[test]
fn add_dynamic_item_appends_one_record() {
    let schema = Schema::new().with_field(
        "students",
        DynamicDescriptor::new()
            .with_field("name", StandardDescriptor::text())
            .with_field("gender", StandardDescriptor::select()),
    );
    let mut form = Form::new(schema, None).expect("form");
    let before = form.state().clone();
    let snapshot = serialized(&form);

    form.add_dynamic_item(
        "students",
        Some(json_values(json!({ "name": "Milos1", "gender": "FEMALE" }))),
    )
    .expect("add");

    let students = form.state().dynamic("students").expect("students").clone();
    assert_eq!(students.len(), 1);
    assert_eq!(students.value[0]["name"].value, Value::text("Milos1"));
    assert_eq!(students.value[0]["gender"].value, Value::text("FEMALE"));
    assert_eq!(serde_json::to_string(&before).expect("serialize"), snapshot);
    assert!(before.dynamic("students").expect("students").is_empty());

    form.add_dynamic_item("students", None).expect("add");
    let after = form.state().dynamic("students").expect("students");
    assert!(Arc::ptr_eq(&students.value[0], &after.value[0]));
}

#[test]
fn prepare_for_server_shapes_the_payload() {
    let schema = Schema::new()
        .with_field("name", StandardDescriptor::text())
        .with_field("age", StandardDescriptor::text())
        .with_field("agree", StandardDescriptor::checkbox())
        .with_field("gender", StandardDescriptor::select())
        .with_field("nested", StandardDescriptor::select())
        .with_field("colors", StandardDescriptor::multi_select())
        .with_field("tags", StandardDescriptor::multi_select())
        .with_field("meta", StandardDescriptor::text());
    let initial = json_values(json!({
        "name": "",
        "age": 0,
        "agree": false,
        "gender": { "value": "M", "label": "Male" },
        "nested": { "value": {}, "label": "Empty" },
        "colors": [{ "value": "red", "label": "Red" }, { "value": "blue", "label": "Blue" }],
        "tags": [],
        "meta": { "id": 1 }
    }));
    let form = Form::new(schema, Some(&initial)).expect("form");

    let payload = Value::from(form.prepare_for_server()).to_json();
    assert_eq!(
        payload,
        json!({
            "name": null,
            "age": 0,
            "agree": false,
            "gender": "M",
            "nested": {},
            "colors": ["red", "blue"],
            "tags": [],
            "meta": { "id": 1 }
        })
    );

    let values = form.clone_state_values();
    assert_eq!(values["gender"], Value::option("M", "Male"));
    assert_eq!(values["name"], Value::text(""));
}

#[test]
fn transitions_never_mutate_previous_snapshots() {
    let schema = Schema::new()
        .with_field("email", StandardDescriptor::text().with_rule(rules::email()))
        .with_field("agree", StandardDescriptor::checkbox().with_rule(rules::must_be_checked()))
        .with_field(
            "students",
            DynamicDescriptor::new().with_field("name", StandardDescriptor::text()),
        );
    let mut form = Form::new(schema, None).expect("form");
    form.add_dynamic_item("students", None).expect("add");

    let before = form.state().clone();
    let snapshot = serialized(&form);

    form.change("email", ChangeNotification::text("nope")).expect("change");
    form.change("agree", ChangeNotification::checked(true)).expect("change");
    form.change(
        FieldAddress::item("students", 0, "name"),
        ChangeNotification::text("Ana"),
    )
    .expect("change");
    form.set_field_visibility("email", false).expect("hide");
    form.validate().expect("validate");
    form.remove_dynamic_item("students", 0).expect("remove");

    assert_eq!(serde_json::to_string(&before).expect("serialize"), snapshot);
    assert_ne!(serialized(&form), snapshot);
}

#[test]
fn bulk_set_commits_once_and_reports_values() {
    let schema = Schema::new()
        .with_field(
            "password",
            StandardDescriptor::text().with_rule(ValidationRule::validate_another_field("confirm")),
        )
        .with_field(
            "confirm",
            StandardDescriptor::text().with_rule(rules::equals_dependency("password")),
        );
    let mut form = Form::new(schema, None).expect("form");
    let seen = Rc::new(RefCell::new(IndexMap::new()));
    let sink = seen.clone();

    let values = json_values(json!({ "confirm": "pw", "password": "pw" }));
    form.set_field_values_bulk(
        SetFieldValueBulk::new(values.clone())
            .with_on_complete(move |values| *sink.borrow_mut() = values.clone()),
    )
    .expect("bulk");

    assert_eq!(*seen.borrow(), values);
    assert_eq!(form.state().field("confirm").expect("confirm").error, "");

    form.set_field_value(SetFieldValue::new("password", "other"))
        .expect("set");
    assert_eq!(
        form.state().field("confirm").expect("confirm").error,
        rules::MISMATCH_MESSAGE
    );
}

#[test]
fn configuration_errors_abort() {
    let schema = Schema::new().with_field("agree", StandardDescriptor::checkbox());
    let mut initial = IndexMap::new();
    initial.insert("agree".to_string(), Value::text("yes"));
    let err = Form::new(schema, Some(&initial)).unwrap_err();
    assert!(matches!(err, FormError::InvalidInitValue { .. }));
    assert!(err.to_string().contains("yes"));

    let mut form = Form::new(
        Schema::new().with_field("email", StandardDescriptor::text()),
        None,
    )
    .expect("form");
    let before = serialized(&form);
    let err = form
        .set_field_value(SetFieldValue::new("", "x"))
        .unwrap_err();
    assert_eq!(err, FormError::MissingFieldName);
    assert_eq!(serialized(&form), before);
}

#[test]
fn declarative_schema_drives_a_form() {
    let text = r#"{
        "email": {
            "kind": "TEXT",
            "label": "Email",
            "validationRules": [{ "rule": "isRequired", "message": "Email please" }, { "rule": "email" }]
        },
        "students": {
            "dynamicSchemaItem": {
                "name": { "kind": "TEXT", "validationRules": [{ "rule": "isRequired" }] }
            }
        }
    }"#;
    let schema = Schema::from_json_str(text, &RuleRegistry::with_builtins()).expect("schema");
    let initial = json_values(json!({ "students": [{ "name": "Ana" }, { "name": "" }] }));
    let mut form = Form::new(schema, Some(&initial)).expect("form");

    assert!(!form.validate().expect("validate"));
    let errors: Vec<_> = form
        .fields()
        .into_iter()
        .map(|view| (view.selector, view.error))
        .collect();
    assert_eq!(
        errors,
        vec![
            ("email".to_string(), "Email please".to_string()),
            ("students[0].name".to_string(), String::new()),
            ("students[1].name".to_string(), rules::REQUIRED_MESSAGE.to_string()),
        ]
    );

    form.change("email", ChangeNotification::text("a@b.com")).expect("change");
    form.remove_dynamic_item("students", 1).expect("remove");
    assert!(form.validate().expect("validate"));
    assert_eq!(
        Value::from(form.prepare_for_server()).to_json(),
        json!({ "email": "a@b.com", "students": [{ "name": "Ana" }] })
    );
}
