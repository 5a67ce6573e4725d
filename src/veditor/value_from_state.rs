use serde_json::{json, Map, Value};

use crate::customize::{Kind, Operation};
use crate::error::{Error, Result};
use crate::state::EditState;
use crate::visitor::{
    Acceptors, Cut, FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor,
    VoidDescriptor,
};

/// Reconstruct the in-memory value from edit state.
///
/// Only meaningful for state that validated cleanly; field text is decoded without
/// re-checking it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFromStateAcceptors;

impl Acceptors for ValueFromStateAcceptors {
    type Input = EditState;
    type Output = Value;

    fn after(&self, value: Value, cut: &Cut<'_>) -> Result<Value> {
        Ok(match cut.mapper {
            Some(mapper) => mapper.a_from_b(value),
            None => value,
        })
    }

    fn accept_field(&self, state: EditState, desc: &FieldDescriptor) -> Result<Value> {
        let text = state.as_field().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "field",
        })?;
        Ok(desc.fieldfns.from_text(text))
    }

    fn accept_struct(&self, state: EditState, desc: &StructDescriptor) -> Result<Value> {
        let state = state.as_struct().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "struct",
        })?;
        let mut out = Map::new();
        for field in &desc.fields {
            let child = state.get(&field.name).ok_or_else(|| Error::StateMismatch {
                texpr: desc.texpr.clone(),
                expected: "complete struct",
            })?;
            let value = field
                .visitor
                .visit(Operation::ValueFromState, child.clone(), self)?;
            out.insert(field.name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    fn accept_union(&self, state: EditState, desc: &UnionDescriptor) -> Result<Value> {
        let state = state.as_union().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "union",
        })?;
        let Some((kind, child)) = state.selected() else {
            return Err(Error::NoBranchSelected(desc.texpr.clone()));
        };
        let branch = desc.branch(kind).ok_or_else(|| Error::UnknownBranch {
            texpr: desc.texpr.clone(),
            branch: kind.to_string(),
        })?;
        let child = child.ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "initialized branch",
        })?;
        let visitor = branch.visitor()?;
        let value = visitor.visit(Operation::ValueFromState, child.clone(), self)?;
        if visitor.kind() == Kind::Void {
            Ok(json!({"kind": kind}))
        } else {
            Ok(json!({"kind": kind, "value": value}))
        }
    }

    fn accept_void(&self, _state: EditState, _desc: &VoidDescriptor) -> Result<Value> {
        Ok(Value::Null)
    }

    /// Hands back whatever value the state was built from; a state that never
    /// carried one yields the empty string.
    fn accept_unimplemented(&self, state: EditState, _desc: &UnimplementedDescriptor) -> Result<Value> {
        match state {
            EditState::Opaque(Some(value)) => Ok(value),
            _ => Ok(Value::String(String::new())),
        }
    }
}
