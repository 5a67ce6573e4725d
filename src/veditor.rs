//! Value editor facade.
//!
//! A [`VEditor`] bundles the operations an interactive editor needs over one
//! visitor:
//!
//! ```text
//! value ──stateFromValue──▶ state ──update(event)──▶ state' ──validate──▶ errors
//!                                                       │
//!                                                       └──valueFromState──▶ value'
//! ```
//!
//! Each operation is an [`Acceptors`](crate::visitor::Acceptors) table defined in
//! the submodules below, so callers can also drive them directly through
//! [`Visitor::visit`].
pub mod initial_state;
pub mod state_from_value;
pub mod update;
pub mod validate;
pub mod value_from_state;

use serde_json::Value;
use tracing::debug;

use crate::adlast::TypeExpr;
use crate::customize::{Customizers, Operation};
use crate::error::Result;
use crate::render::{RenderAcceptors, RenderFactory, RenderProps, Rendered, UpdateFn};
use crate::state::{EditState, Event};
use crate::tree::Resolver;
use crate::visitor::{create_visitor, Visitor};

pub use initial_state::InitialStateAcceptors;
pub use state_from_value::StateFromValueAcceptors;
pub use update::{Pending, UpdateAcceptors};
pub use validate::ValidateAcceptors;
pub use value_from_state::ValueFromStateAcceptors;

#[derive(Debug, Clone)]
pub struct VEditor {
    visitor: Visitor,
}

/// Outcome of checking a state: a value only when there are no errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked {
    pub value: Option<Value>,
    pub errors: Vec<String>,
}

pub fn create_veditor(texpr: &TypeExpr, resolver: Resolver, customizers: Customizers) -> Result<VEditor> {
    debug!(%texpr, "creating value editor");
    create_visitor(texpr, resolver, customizers).map(VEditor::new)
}

impl VEditor {
    pub fn new(visitor: Visitor) -> Self {
        Self { visitor }
    }

    pub fn visitor(&self) -> &Visitor {
        &self.visitor
    }

    pub fn initial_state(&self) -> Result<EditState> {
        self.visitor
            .visit(Operation::InitialState, (), &InitialStateAcceptors)
    }

    pub fn state_from_value(&self, value: Value) -> Result<EditState> {
        self.visitor
            .visit(Operation::StateFromValue, value, &StateFromValueAcceptors)
    }

    pub fn validate(&self, state: &EditState) -> Result<Vec<String>> {
        self.visitor
            .visit(Operation::Validate, state.clone(), &ValidateAcceptors)
    }

    /// Assumes `validate(state)` is empty.
    pub fn value_from_state(&self, state: &EditState) -> Result<Value> {
        self.visitor
            .visit(Operation::ValueFromState, state.clone(), &ValueFromStateAcceptors)
    }

    pub fn update(&self, state: &EditState, event: Event) -> Result<EditState> {
        let pending = Pending {
            state: state.clone(),
            event,
        };
        self.visitor.visit(Operation::Update, pending, &UpdateAcceptors)
    }

    /// Validate, and convert back to a value only if that succeeded.
    pub fn value_and_errors(&self, state: &EditState) -> Result<Checked> {
        let errors = self.validate(state)?;
        let value = match errors.is_empty() {
            true => Some(self.value_from_state(state)?),
            false => None,
        };
        Ok(Checked { value, errors })
    }

    pub fn render<F: RenderFactory>(
        &self,
        factory: &F,
        state: &EditState,
        disabled: bool,
        on_update: UpdateFn,
    ) -> Result<Rendered<F::Fragment>> {
        let props = RenderProps {
            state: state.clone(),
            disabled,
            on_update,
        };
        self.visitor
            .visit(Operation::Render, props, &RenderAcceptors::new(factory))
    }
}
