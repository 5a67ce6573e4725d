#![allow(dead_code)]

use std::path::PathBuf;
use std::rc::Rc;

use adl_veditor::path_de::load_ast_map;
use adl_veditor::tree::Resolver;
use adl_veditor::{create_veditor, Customizers, JsonBinding, TypeExpr, VEditor};
use serde_json::Value;

pub fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("schemas/examples.json")
}

pub fn examples() -> Resolver {
    Rc::new(load_ast_map(&schema_path()).expect("examples schema"))
}

pub fn texpr(src: &str) -> TypeExpr {
    src.parse().expect("type expression")
}

pub fn editor(src: &str) -> VEditor {
    editor_with(src, Customizers::new())
}

pub fn editor_with(src: &str, customizers: Customizers) -> VEditor {
    create_veditor(&texpr(src), examples(), customizers).expect("editor")
}

/// Serialized JSON to the in-memory value form.
pub fn value(src: &str, json: Value) -> Value {
    JsonBinding::new(texpr(src), examples())
        .from_json(&json)
        .expect("value matches type")
}
