mod common;

use std::cell::Cell;
use std::rc::Rc;

use adl_veditor::outline::TextOutline;
use adl_veditor::render::{render_struct_field, RenderFactory, RenderProps, Rendered, StructEditorProps};
use adl_veditor::veditor::ValidateAcceptors;
use adl_veditor::visitor::{Acceptors, FieldDescriptor, StructDescriptor, VectorDescriptor};
use adl_veditor::{Customizers, EditState, Error, Event, Kind, Mapper, Operation, Override};
use common::{editor_with, texpr, value};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn person_editor_with_age(customizers: Customizers, age: &str) -> (adl_veditor::VEditor, EditState) {
    let editor = editor_with("examples.Person", customizers);
    let person = value(
        "examples.Person",
        json!({"name": {"first": "A", "last": "B"}, "age": 1, "gender": "male", "role": "r"}),
    );
    let state = editor.state_from_value(person).unwrap();
    let state = editor
        .update(&state, Event::field("age", Event::set_text(age)))
        .unwrap();
    (editor, state)
}

#[test]
fn field_override_replaces_the_default_acceptor() {
    let (plain, state) = person_editor_with_age(Customizers::new(), "abc");
    assert_eq!(plain.validate(&state).unwrap(), vec!["age: not a valid integer".to_string()]);

    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let customizers = Customizers::new().with_override(Override::accept_field(
        Operation::Validate,
        move |_: EditState, _: &FieldDescriptor| {
            counter.set(counter.get() + 1);
            Ok(Vec::<String>::new())
        },
    ));
    let (editor, state) = person_editor_with_age(customizers, "abc");
    assert_eq!(editor.validate(&state).unwrap(), Vec::<String>::new());
    // name.first, name.last, age, role
    assert_eq!(calls.get(), 4);
}

#[test]
fn override_can_delegate_to_the_default_acceptor() {
    let int64 = texpr("Int64");
    let customizers = Customizers::new().with_override(Override::accept_field(
        Operation::Validate,
        move |state: EditState, desc: &FieldDescriptor| match desc.texpr == int64 {
            true => Ok(Vec::new()),
            false => ValidateAcceptors.accept_field(state, desc),
        },
    ));
    let full = editor_with("examples.Full", customizers.clone());
    let state = full.initial_state().unwrap();
    assert_eq!(full.validate(&state).unwrap(), Vec::<String>::new());

    let (person, state) = person_editor_with_age(customizers, "x");
    assert_eq!(person.validate(&state).unwrap(), vec!["age: not a valid integer".to_string()]);
}

#[test]
fn struct_render_override_can_hide_fields() {
    let customizers = Customizers::new().with_override(Override::accept_struct(
        Operation::Render,
        |props: RenderProps, desc: &StructDescriptor| -> adl_veditor::Result<Rendered<String>> {
            let outline = TextOutline::new();
            let state = props.state.as_struct().ok_or_else(|| Error::StateMismatch {
                texpr: desc.texpr.clone(),
                expected: "struct",
            })?;
            let fields = desc
                .fields
                .iter()
                .filter(|f| f.name != "model")
                .map(|f| render_struct_field(&outline, f, state, &props))
                .collect::<adl_veditor::Result<Vec<_>>>()?;
            Ok(outline.render_struct(StructEditorProps {
                texpr: &desc.texpr,
                fields,
                disabled: props.disabled,
            }))
        },
    ));
    let editor = editor_with("examples.Display", customizers);
    let outline = TextOutline::new();
    let state = editor.initial_state().unwrap();
    let rendered = editor.render(&outline, &state, false, Rc::new(|_| {})).unwrap();
    assert_eq!(outline.to_text(rendered), "Name: [<string>]");
}

fn full_as_display() -> Mapper {
    Mapper::new(
        texpr("examples.Full"),
        texpr("examples.Display"),
        |display: Value| display.get("model").cloned().unwrap_or(Value::Null),
        |full: Value| {
            let name = format!(
                "{} {}",
                full["firstname"].as_str().unwrap_or_default(),
                full["surname"].as_str().unwrap_or_default()
            );
            json!({"name": name, "model": full})
        },
    )
}

#[test]
fn mapper_edits_one_type_through_another() {
    let editor = editor_with("examples.Full", Customizers::new().with_mapper(full_as_display()));
    assert_eq!(editor.visitor().kind(), Kind::Struct);
    assert_eq!(editor.visitor().texpr(), &texpr("examples.Display"));

    let full = json!({"id": 7, "firstname": "Grace", "surname": "Hopper"});
    let state = editor.state_from_value(full.clone()).unwrap();
    let display = state.as_struct().unwrap();
    assert_eq!(display.get("name"), Some(&EditState::field("Grace Hopper")));

    // The shadow typedef keeps the inner Full from being mapped again.
    let model = display.get("model").unwrap().as_struct().unwrap();
    assert_eq!(model.get("id"), Some(&EditState::field("7")));
    assert_eq!(editor.value_from_state(&state).unwrap(), full);

    let renamed = editor
        .update(&state, Event::field("model", Event::field("surname", Event::set_text("Brewster"))))
        .unwrap();
    assert_eq!(
        editor.value_from_state(&renamed).unwrap(),
        json!({"id": 7, "firstname": "Grace", "surname": "Brewster"})
    );
}

#[test]
fn mappers_reach_lazily_built_branches() {
    let int32_as_text = Mapper::new(
        texpr("Int32"),
        texpr("String"),
        |text: Value| text.as_str().and_then(|s| s.parse::<i64>().ok()).map(Value::from).unwrap_or(Value::Null),
        |n: Value| Value::String(n.to_string()),
    );
    let editor = editor_with("examples.FixedProps", Customizers::new().with_mapper(int32_as_text));
    let state = editor.state_from_value(json!({"kind": "age", "value": 5})).unwrap();
    assert_eq!(state.as_union().unwrap().branches.get("age"), Some(&EditState::field("5")));
    assert_eq!(editor.value_from_state(&state).unwrap(), json!({"kind": "age", "value": 5}));

    // Edited as a plain string, so no integer validation applies.
    let state = editor.update(&state, Event::branch(Event::set_text("abc"))).unwrap();
    assert!(editor.validate(&state).unwrap().is_empty());
}

#[test]
fn vector_override_plugs_in_sequence_behavior() {
    let customizers = Customizers::new().with_override(Override::accept_vector(
        Operation::Validate,
        |state: EditState, _: &VectorDescriptor| match state {
            EditState::Opaque(Some(Value::Array(items))) if !items.is_empty() => Ok(Vec::new()),
            _ => Ok(vec!["at least one entry required".to_string()]),
        },
    ));
    let editor = editor_with("examples.Hierarchy", customizers);
    let hierarchy = value(
        "examples.Hierarchy",
        json!({
            "leader": {"name": {"first": "A", "last": "B"}, "age": 1, "gender": "male", "role": "r"},
            "testNullMap": null,
            "underlings": [],
            "fixedProps": {"age": 1},
            "properties": {"k": "v"},
        }),
    );
    let state = editor.state_from_value(hierarchy).unwrap();
    assert_eq!(
        editor.validate(&state).unwrap(),
        vec!["underlings: at least one entry required".to_string()]
    );
}

#[test]
fn duplicate_override_is_a_configuration_error() {
    let skip = || {
        Override::accept_field(Operation::Validate, |_: EditState, _: &FieldDescriptor| {
            Ok(Vec::<String>::new())
        })
    };
    let (editor, state) = person_editor_with_age(Customizers::new().with_override(skip()).with_override(skip()), "1");
    let err = editor.validate(&state).unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateOverride {
            operation: Operation::Validate,
            kind: Kind::Field
        }
    ));
}

#[test]
fn override_with_wrong_signature_is_a_configuration_error() {
    let customizers = Customizers::new().with_override(Override::accept_field(
        Operation::Validate,
        |_: String, _: &FieldDescriptor| Ok(Vec::<String>::new()),
    ));
    let (editor, state) = person_editor_with_age(customizers, "1");
    assert!(matches!(editor.validate(&state), Err(Error::OverrideSignature { .. })));
}

#[test]
fn duplicate_mapper_fails_at_construction() {
    let customizers = Customizers::new()
        .with_mapper(full_as_display())
        .with_mapper(full_as_display());
    let err = adl_veditor::create_veditor(&texpr("examples.Full"), common::examples(), customizers).unwrap_err();
    assert!(matches!(err, Error::DuplicateMapper(_)));
}

#[test]
fn overrides_only_match_their_operation() {
    let customizers = Customizers::new().with_override(Override::accept_field(
        Operation::Named("audit"),
        |_: EditState, _: &FieldDescriptor| Ok(Vec::<String>::new()),
    ));
    let (editor, state) = person_editor_with_age(customizers, "x");
    assert_eq!(editor.validate(&state).unwrap(), vec!["age: not a valid integer".to_string()]);
}
