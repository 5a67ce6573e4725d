use std::rc::Rc;

use indexmap::IndexMap;

use super::StateFromValueAcceptors;
use crate::customize::Operation;
use crate::error::Result;
use crate::state::{EditState, StructState, UnionState};
use crate::visitor::{
    Acceptors, FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor, VoidDescriptor,
};

/// The state a fresh editor starts from: empty fields, no union selection, and
/// struct fields pre-filled from their declared defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitialStateAcceptors;

impl Acceptors for InitialStateAcceptors {
    type Input = ();
    type Output = EditState;

    fn accept_field(&self, _: (), _desc: &FieldDescriptor) -> Result<EditState> {
        Ok(EditState::Field(String::new()))
    }

    fn accept_struct(&self, _: (), desc: &StructDescriptor) -> Result<EditState> {
        let mut fields = IndexMap::with_capacity(desc.fields.len());
        for field in &desc.fields {
            let state = match &field.default {
                Some(default) => {
                    let value = field.binding.from_json(default)?;
                    field
                        .visitor
                        .visit(Operation::StateFromValue, value, &StateFromValueAcceptors)?
                }
                None => field.visitor.visit(Operation::InitialState, (), self)?,
            };
            fields.insert(field.name.clone(), state);
        }
        Ok(EditState::Struct(Rc::new(StructState { fields })))
    }

    fn accept_union(&self, _: (), _desc: &UnionDescriptor) -> Result<EditState> {
        Ok(EditState::Union(Rc::new(UnionState::default())))
    }

    fn accept_void(&self, _: (), _desc: &VoidDescriptor) -> Result<EditState> {
        Ok(EditState::Void)
    }

    fn accept_unimplemented(&self, _: (), _desc: &UnimplementedDescriptor) -> Result<EditState> {
        Ok(EditState::Opaque(None))
    }
}
