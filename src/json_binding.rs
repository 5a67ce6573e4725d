//! Conversion between ADL's serialized JSON and the in-memory value form the editor
//! works with.
//!
//! | type            | serialized                    | in memory                          |
//! |-----------------|-------------------------------|------------------------------------|
//! | struct          | keys are serialized names     | keys are field names               |
//! | union, void arm | `"tag"`                       | `{"kind": "tag"}`                  |
//! | union           | `{"tag": v}`                  | `{"kind": "tag", "value": v}`      |
//! | `Nullable<T>`   | `null` or `T`                 | `null` or `T`                      |
//!
//! Missing struct fields take their declared default.
use serde_json::{json, Map, Value};

use crate::adlast::TypeExpr;
use crate::error::{Error, Result};
use crate::tree::{self, Node, NodeKind, NullableShape, Resolver, UnionNode};

#[derive(Clone)]
pub struct JsonBinding {
    texpr: TypeExpr,
    resolver: Resolver,
}

impl JsonBinding {
    pub fn new(texpr: TypeExpr, resolver: Resolver) -> Self {
        Self { texpr, resolver }
    }

    pub fn texpr(&self) -> &TypeExpr {
        &self.texpr
    }

    /// Serialized JSON to in-memory value.
    pub fn from_json(&self, json: &Value) -> Result<Value> {
        let node = tree::build(&self.texpr, &self.resolver)?;
        from_json(&node, &self.resolver, json)
    }

    /// In-memory value to serialized JSON.
    pub fn to_json(&self, value: &Value) -> Result<Value> {
        let node = tree::build(&self.texpr, &self.resolver)?;
        to_json(&node, &self.resolver, value)
    }
}

impl std::fmt::Debug for JsonBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonBinding")
            .field("texpr", &self.texpr.to_string())
            .finish_non_exhaustive()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn mismatch(node: &Node, expected: &'static str, found: &Value) -> Error {
    Error::ValueMismatch {
        texpr: node.texpr.clone(),
        expected,
        found: found.clone(),
    }
}

fn from_json(node: &Node, resolver: &Resolver, json: &Value) -> Result<Value> {
    match &node.kind {
        NodeKind::Primitive(_) => Ok(json.clone()),
        NodeKind::Void => Ok(Value::Null),
        NodeKind::Struct(s) => {
            let obj = json.as_object().ok_or_else(|| mismatch(node, "object", json))?;
            let mut out = Map::new();
            for field in &s.fields {
                let value = match (obj.get(&field.serialized_name), &field.default) {
                    (Some(v), _) | (None, Some(v)) => from_json(&field.node, resolver, v)?,
                    (None, None) => {
                        return Err(Error::Json {
                            texpr: node.texpr.clone(),
                            message: format!("missing field `{}`", field.serialized_name),
                        });
                    }
                };
                out.insert(field.name.clone(), value);
            }
            Ok(Value::Object(out))
        }
        NodeKind::Union(u) => union_from_json(node, u, resolver, json),
        NodeKind::Sequence(item) => {
            let items = json.as_array().ok_or_else(|| mismatch(node, "array", json))?;
            let item = tree::build(item, resolver)?;
            items
                .iter()
                .map(|v| from_json(&item, resolver, v))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        NodeKind::StringMap(value) => {
            let obj = json.as_object().ok_or_else(|| mismatch(node, "object", json))?;
            let value = tree::build(value, resolver)?;
            let mut out = Map::new();
            for (k, v) in obj {
                out.insert(k.clone(), from_json(&value, resolver, v)?);
            }
            Ok(Value::Object(out))
        }
        NodeKind::Nullable(n) => match &n.shape {
            NullableShape::Null if json.is_null() => Ok(Value::Null),
            NullableShape::Null => from_json(&tree::build(&n.param, resolver)?, resolver, json),
            NullableShape::Maybe(u) => union_from_json(node, u, resolver, json),
        },
    }
}

fn union_from_json(node: &Node, union: &UnionNode, resolver: &Resolver, json: &Value) -> Result<Value> {
    let (tag, body) = match json {
        Value::String(tag) => (tag, None),
        Value::Object(obj) if obj.len() == 1 => {
            let (tag, body) = obj.iter().next().ok_or_else(|| mismatch(node, "union", json))?;
            (tag, Some(body))
        }
        _ => return Err(mismatch(node, "union", json)),
    };
    let branch = union
        .branches
        .iter()
        .find(|b| &b.serialized_name == tag)
        .ok_or_else(|| Error::UnknownBranch {
            texpr: node.texpr.clone(),
            branch: tag.clone(),
        })?;
    let branch_node = branch.node()?;
    match (&branch_node.kind, body) {
        (NodeKind::Void, _) => Ok(json!({"kind": branch.name})),
        (_, Some(body)) => Ok(json!({
            "kind": branch.name,
            "value": from_json(&branch_node, resolver, body)?,
        })),
        (_, None) => Err(Error::Json {
            texpr: node.texpr.clone(),
            message: format!("branch `{tag}` requires a value"),
        }),
    }
}

fn to_json(node: &Node, resolver: &Resolver, value: &Value) -> Result<Value> {
    match &node.kind {
        NodeKind::Primitive(_) => Ok(value.clone()),
        NodeKind::Void => Ok(Value::Null),
        NodeKind::Struct(s) => {
            let obj = value.as_object().ok_or_else(|| mismatch(node, "object", value))?;
            let mut out = Map::new();
            for field in &s.fields {
                let v = obj.get(&field.name).unwrap_or(&Value::Null);
                out.insert(field.serialized_name.clone(), to_json(&field.node, resolver, v)?);
            }
            Ok(Value::Object(out))
        }
        NodeKind::Union(u) => union_to_json(node, u, resolver, value),
        NodeKind::Sequence(item) => {
            let items = value.as_array().ok_or_else(|| mismatch(node, "array", value))?;
            let item = tree::build(item, resolver)?;
            items
                .iter()
                .map(|v| to_json(&item, resolver, v))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        NodeKind::StringMap(v) => {
            let obj = value.as_object().ok_or_else(|| mismatch(node, "object", value))?;
            let vnode = tree::build(v, resolver)?;
            let mut out = Map::new();
            for (k, v) in obj {
                out.insert(k.clone(), to_json(&vnode, resolver, v)?);
            }
            Ok(Value::Object(out))
        }
        NodeKind::Nullable(n) => match &n.shape {
            NullableShape::Null if value.is_null() => Ok(Value::Null),
            NullableShape::Null => to_json(&tree::build(&n.param, resolver)?, resolver, value),
            NullableShape::Maybe(u) => union_to_json(node, u, resolver, value),
        },
    }
}

fn union_to_json(node: &Node, union: &UnionNode, resolver: &Resolver, value: &Value) -> Result<Value> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::MissingUnionKind(node.texpr.clone()))?;
    let branch = union.branch(kind).ok_or_else(|| Error::UnknownBranch {
        texpr: node.texpr.clone(),
        branch: kind.to_string(),
    })?;
    let branch_node = branch.node()?;
    if matches!(branch_node.kind, NodeKind::Void) {
        return Ok(Value::String(branch.serialized_name.clone()));
    }
    let body = value.get("value").unwrap_or(&Value::Null);
    let mut out = Map::new();
    out.insert(branch.serialized_name.clone(), to_json(&branch_node, resolver, body)?);
    Ok(Value::Object(out))
}
