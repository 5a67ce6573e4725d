use crate::customize::Operation;
use crate::error::{Error, Result};
use crate::state::EditState;
use crate::visitor::{
    Acceptors, FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor, VoidDescriptor,
};

/// Collect user-facing validation messages. An empty list means the state can be
/// turned back into a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateAcceptors;

impl Acceptors for ValidateAcceptors {
    type Input = EditState;
    type Output = Vec<String>;

    fn accept_field(&self, state: EditState, desc: &FieldDescriptor) -> Result<Vec<String>> {
        let text = state.as_field().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "field",
        })?;
        Ok(desc.fieldfns.validate(text).into_iter().collect())
    }

    fn accept_struct(&self, state: EditState, desc: &StructDescriptor) -> Result<Vec<String>> {
        let state = state.as_struct().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "struct",
        })?;
        let mut errors = Vec::new();
        for field in &desc.fields {
            let child = state.get(&field.name).ok_or_else(|| Error::StateMismatch {
                texpr: desc.texpr.clone(),
                expected: "complete struct",
            })?;
            let found = field.visitor.visit(Operation::Validate, child.clone(), self)?;
            errors.extend(found.into_iter().map(|e| format!("{}: {e}", field.name)));
        }
        Ok(errors)
    }

    fn accept_union(&self, state: EditState, desc: &UnionDescriptor) -> Result<Vec<String>> {
        let state = state.as_union().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "union",
        })?;
        let Some((kind, child)) = state.selected() else {
            return Ok(vec!["selection required".to_string()]);
        };
        let branch = desc.branch(kind).ok_or_else(|| Error::UnknownBranch {
            texpr: desc.texpr.clone(),
            branch: kind.to_string(),
        })?;
        let child = child.ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "initialized branch",
        })?;
        branch
            .visitor()?
            .visit(Operation::Validate, child.clone(), self)
    }

    fn accept_void(&self, _state: EditState, _desc: &VoidDescriptor) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn accept_unimplemented(&self, _state: EditState, _desc: &UnimplementedDescriptor) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
