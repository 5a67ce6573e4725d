use std::rc::Rc;

use tracing::trace;

use super::InitialStateAcceptors;
use crate::customize::Operation;
use crate::error::{Error, Result};
use crate::state::{EditState, Event, StructState, UnionState};
use crate::visitor::{
    Acceptors, FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor, VoidDescriptor,
};

/// Input of an update: the current state and the event to apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pending {
    pub state: EditState,
    pub event: Event,
}

/// Apply one event, producing a new state. Untouched sub-states are shared with
/// the old state; events a node does not understand leave it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateAcceptors;

impl Acceptors for UpdateAcceptors {
    type Input = Pending;
    type Output = EditState;

    fn accept_field(&self, Pending { state, event }: Pending, _desc: &FieldDescriptor) -> Result<EditState> {
        match event {
            Event::SetText(text) => Ok(EditState::Field(text)),
            _ => Ok(state),
        }
    }

    fn accept_struct(&self, Pending { state, event }: Pending, desc: &StructDescriptor) -> Result<EditState> {
        let Event::FieldUpdate { field, event } = event else {
            return Ok(state);
        };
        let details = desc.field(&field).ok_or_else(|| Error::UnknownField {
            texpr: desc.texpr.clone(),
            field: field.clone(),
        })?;
        let current = state.as_struct().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "struct",
        })?;
        let child = current.get(&field).cloned().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "complete struct",
        })?;
        let updated = details.visitor.visit(
            Operation::Update,
            Pending {
                state: child,
                event: *event,
            },
            self,
        )?;
        let mut fields = current.fields.clone();
        fields.insert(field, updated);
        Ok(EditState::Struct(Rc::new(StructState { fields })))
    }

    fn accept_union(&self, Pending { state, event }: Pending, desc: &UnionDescriptor) -> Result<EditState> {
        let current = state.as_union().ok_or_else(|| Error::StateMismatch {
            texpr: desc.texpr.clone(),
            expected: "union",
        })?;
        match event {
            Event::Switch(None) => Ok(EditState::Union(Rc::new(UnionState {
                current: None,
                branches: current.branches.clone(),
            }))),
            Event::Switch(Some(kind)) => {
                let branch = desc.branch(&kind).ok_or_else(|| Error::UnknownBranch {
                    texpr: desc.texpr.clone(),
                    branch: kind.clone(),
                })?;
                let mut branches = current.branches.clone();
                if !branches.contains_key(&kind) {
                    trace!(texpr = %desc.texpr, branch = %kind, "initializing branch state");
                    let initial = branch
                        .visitor()?
                        .visit(Operation::InitialState, (), &InitialStateAcceptors)?;
                    branches.insert(kind.clone(), initial);
                }
                Ok(EditState::Union(Rc::new(UnionState {
                    current: Some(kind),
                    branches,
                })))
            }
            Event::BranchUpdate(event) => {
                let Some(kind) = current.current.clone() else {
                    return Err(Error::UpdateWithoutSelection(desc.texpr.clone()));
                };
                let branch = desc.branch(&kind).ok_or_else(|| Error::UnknownBranch {
                    texpr: desc.texpr.clone(),
                    branch: kind.clone(),
                })?;
                let child = current.branches.get(&kind).cloned().ok_or_else(|| Error::StateMismatch {
                    texpr: desc.texpr.clone(),
                    expected: "initialized branch",
                })?;
                let updated = branch.visitor()?.visit(
                    Operation::Update,
                    Pending {
                        state: child,
                        event: *event,
                    },
                    self,
                )?;
                let mut branches = current.branches.clone();
                branches.insert(kind.clone(), updated);
                Ok(EditState::Union(Rc::new(UnionState {
                    current: Some(kind),
                    branches,
                })))
            }
            _ => Ok(state),
        }
    }

    fn accept_void(&self, Pending { state, .. }: Pending, _desc: &VoidDescriptor) -> Result<EditState> {
        Ok(state)
    }

    fn accept_unimplemented(&self, Pending { state, .. }: Pending, _desc: &UnimplementedDescriptor) -> Result<EditState> {
        Ok(state)
    }
}
