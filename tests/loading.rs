mod common;

use std::rc::Rc;

use adl_veditor::path_de::load_ast_map;
use adl_veditor::{create_veditor, Customizers, DeclResolver, Error, ScopedName};
use common::texpr;
use serde_json::json;

fn string_field(name: &str) -> serde_json::Value {
    json!({
        "annotations": [],
        "serializedName": name,
        "default": {"kind": "nothing"},
        "name": name,
        "typeExpr": {"typeRef": {"kind": "primitive", "value": "String"}, "parameters": []}
    })
}

fn struct_decl(module: &str, name: &str, fields: &[&str]) -> serde_json::Value {
    json!({
        "moduleName": module,
        "decl": {
            "annotations": [],
            "name": name,
            "version": {"kind": "nothing"},
            "type_": {
                "kind": "struct_",
                "value": {
                    "typeParams": [],
                    "fields": fields.iter().map(|f| string_field(f)).collect::<Vec<_>>()
                }
            }
        }
    })
}

#[test]
fn loads_the_bundled_examples() {
    let ast = load_ast_map(&common::schema_path()).unwrap();
    for name in ["Name", "Person", "Hierarchy", "Display", "Settings"] {
        assert!(ast.resolve(&ScopedName::new("examples", name)).is_ok(), "{name}");
    }
}

#[test]
fn files_merge_into_one_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.json");
    let b = dir.path().join("b.json");
    std::fs::write(&a, json!({"m.A": struct_decl("m", "A", &["x"])}).to_string()).unwrap();
    std::fs::write(&b, json!({"n.B": struct_decl("n", "B", &["y", "z"])}).to_string()).unwrap();

    let mut ast = load_ast_map(&a).unwrap();
    ast.extend(load_ast_map(&b).unwrap());
    assert_eq!(ast.len(), 2);

    let editor = create_veditor(&texpr("n.B"), Rc::new(ast), Customizers::new()).unwrap();
    let state = editor.initial_state().unwrap();
    assert_eq!(editor.value_from_state(&state).unwrap(), json!({"y": "", "z": ""}));
}

#[test]
fn malformed_schema_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    let mut decl = struct_decl("m", "A", &["x"]);
    decl["decl"]["type_"]["kind"] = json!("record_");
    std::fs::write(&path, json!({"m.A": decl}).to_string()).unwrap();

    let err = load_ast_map(&path).unwrap_err();
    let Error::Schema { message, .. } = &err else {
        panic!("expected a schema error, got {err:?}");
    };
    assert!(message.contains("at JSON path"), "{message}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_ast_map(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}
