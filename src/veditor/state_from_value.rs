use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::customize::Operation;
use crate::error::{Error, Result};
use crate::state::{EditState, StructState, UnionState};
use crate::visitor::{
    Acceptors, Cut, FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor,
    VoidDescriptor,
};

/// Project an in-memory value into edit state.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateFromValueAcceptors;

impl Acceptors for StateFromValueAcceptors {
    type Input = Value;
    type Output = EditState;

    fn before(&self, value: Value, cut: &Cut<'_>) -> Result<Value> {
        Ok(match cut.mapper {
            Some(mapper) => mapper.b_from_a(value),
            None => value,
        })
    }

    fn accept_field(&self, value: Value, desc: &FieldDescriptor) -> Result<EditState> {
        Ok(EditState::Field(desc.fieldfns.to_text(&value)))
    }

    fn accept_struct(&self, value: Value, desc: &StructDescriptor) -> Result<EditState> {
        let mut obj = match value {
            Value::Object(obj) => obj,
            found => {
                return Err(Error::ValueMismatch {
                    texpr: desc.texpr.clone(),
                    expected: "object",
                    found,
                });
            }
        };
        let mut fields = IndexMap::with_capacity(desc.fields.len());
        for field in &desc.fields {
            let v = obj.remove(&field.name).unwrap_or(Value::Null);
            let state = field.visitor.visit(Operation::StateFromValue, v, self)?;
            fields.insert(field.name.clone(), state);
        }
        Ok(EditState::Struct(Rc::new(StructState { fields })))
    }

    fn accept_union(&self, mut value: Value, desc: &UnionDescriptor) -> Result<EditState> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::MissingUnionKind(desc.texpr.clone()))?;
        let branch = desc.branch(&kind).ok_or_else(|| Error::UnknownBranch {
            texpr: desc.texpr.clone(),
            branch: kind.clone(),
        })?;
        let inner = value.get_mut("value").map(Value::take).unwrap_or(Value::Null);
        let state = branch
            .visitor()?
            .visit(Operation::StateFromValue, inner, self)?;
        let mut branches = IndexMap::new();
        branches.insert(kind.clone(), state);
        Ok(EditState::Union(Rc::new(UnionState {
            current: Some(kind),
            branches,
        })))
    }

    fn accept_void(&self, _value: Value, _desc: &VoidDescriptor) -> Result<EditState> {
        Ok(EditState::Void)
    }

    fn accept_unimplemented(&self, value: Value, _desc: &UnimplementedDescriptor) -> Result<EditState> {
        Ok(EditState::Opaque(Some(value)))
    }
}
