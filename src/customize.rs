//! Customizers: named overrides and bidirectional type mappers.
//!
//! Both are supplied once, when the visitor is created, and apply to every node the
//! visitor reaches, including nodes only reached through lazily-built union branches.
use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::adlast::TypeExpr;
use crate::error::{Error, Result};
use crate::visitor::{
    FieldDescriptor, StructDescriptor, UnimplementedDescriptor, UnionDescriptor, VectorDescriptor,
    VoidDescriptor,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Name of a dispatch; overrides are keyed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InitialState,
    StateFromValue,
    ValueFromState,
    Validate,
    Update,
    Render,
    /// Caller-defined operations driven through [`crate::visitor::Visitor::visit`].
    Named(&'static str),
}

/// Structural kind of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Field,
    Struct,
    Union,
    Void,
    Vector,
    Unimplemented,
}

/// An override body: receives exactly what the default acceptor would have received.
pub type AcceptFn<I, O, D> = Rc<dyn Fn(I, &D) -> Result<O>>;

/// Replaces the acceptor for one `(operation, kind)` pair.
#[derive(Clone)]
pub struct Override {
    operation: Operation,
    kind: Kind,
    func: Rc<dyn Any>,
}

/// A pair of inverse functions between a requested type `A` and the type `B` that is
/// actually edited.
#[derive(Clone)]
pub struct Mapper {
    pub texpr_a: TypeExpr,
    pub texpr_b: TypeExpr,
    a_from_b: Rc<dyn Fn(Value) -> Value>,
    b_from_a: Rc<dyn Fn(Value) -> Value>,
}

#[derive(Clone, Default)]
pub struct Customizers {
    overrides: Vec<Override>,
    mappers: Vec<Mapper>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Override {
    fn new<I: 'static, O: 'static, D: 'static>(
        operation: Operation,
        kind: Kind,
        func: impl Fn(I, &D) -> Result<O> + 'static,
    ) -> Self {
        let func: AcceptFn<I, O, D> = Rc::new(func);
        Self {
            operation,
            kind,
            func: Rc::new(func),
        }
    }

    pub fn accept_field<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &FieldDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Field, func)
    }

    pub fn accept_struct<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &StructDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Struct, func)
    }

    pub fn accept_union<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &UnionDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Union, func)
    }

    pub fn accept_void<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &VoidDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Void, func)
    }

    pub fn accept_vector<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &VectorDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Vector, func)
    }

    pub fn accept_unimplemented<I: 'static, O: 'static>(
        operation: Operation,
        func: impl Fn(I, &UnimplementedDescriptor) -> Result<O> + 'static,
    ) -> Self {
        Self::new(operation, Kind::Unimplemented, func)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl Mapper {
    pub fn new(
        texpr_a: TypeExpr,
        texpr_b: TypeExpr,
        a_from_b: impl Fn(Value) -> Value + 'static,
        b_from_a: impl Fn(Value) -> Value + 'static,
    ) -> Self {
        Self {
            texpr_a,
            texpr_b,
            a_from_b: Rc::new(a_from_b),
            b_from_a: Rc::new(b_from_a),
        }
    }

    pub fn a_from_b(&self, b: Value) -> Value {
        (self.a_from_b)(b)
    }

    pub fn b_from_a(&self, a: Value) -> Value {
        (self.b_from_a)(a)
    }

    /// `self` maps `A <-> B`, `inner` maps `B <-> C`; the result maps `A <-> C`.
    pub fn then(&self, inner: &Mapper) -> Mapper {
        let (outer_ab, outer_ba) = (self.a_from_b.clone(), self.b_from_a.clone());
        let (inner_ab, inner_ba) = (inner.a_from_b.clone(), inner.b_from_a.clone());
        Mapper {
            texpr_a: self.texpr_a.clone(),
            texpr_b: inner.texpr_b.clone(),
            a_from_b: Rc::new(move |c| outer_ab(inner_ab(c))),
            b_from_a: Rc::new(move |a| inner_ba(outer_ba(a))),
        }
    }
}

impl Customizers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, o: Override) -> Self {
        self.overrides.push(o);
        self
    }

    pub fn with_mapper(mut self, m: Mapper) -> Self {
        self.mappers.push(m);
        self
    }

    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    pub fn mappers(&self) -> &[Mapper] {
        &self.mappers
    }

    /// The single override for `(operation, kind)`, if any.
    ///
    /// Two matches, or a match whose function does not take `I`/`&D` and return `O`,
    /// are configuration errors.
    pub fn find_override<I: 'static, O: 'static, D: 'static>(
        &self,
        operation: Operation,
        kind: Kind,
    ) -> Result<Option<AcceptFn<I, O, D>>> {
        let mut matches = self
            .overrides
            .iter()
            .filter(|o| o.operation == operation && o.kind == kind);
        let Some(found) = matches.next() else {
            return Ok(None);
        };
        if matches.next().is_some() {
            return Err(Error::DuplicateOverride { operation, kind });
        }
        found
            .func
            .downcast_ref::<AcceptFn<I, O, D>>()
            .cloned()
            .map(Some)
            .ok_or(Error::OverrideSignature { operation, kind })
    }

    /// The single mapper whose domain type is structurally equal to `texpr`, if any.
    pub fn find_mapper(&self, texpr: &TypeExpr) -> Result<Option<&Mapper>> {
        let mut matches = self.mappers.iter().filter(|m| &m.texpr_a == texpr);
        let found = matches.next();
        if matches.next().is_some() {
            return Err(Error::DuplicateMapper(texpr.clone()));
        }
        Ok(found)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::InitialState => "getInitialState",
            Operation::StateFromValue => "stateFromValue",
            Operation::ValueFromState => "valueFromState",
            Operation::Validate => "validate",
            Operation::Update => "update",
            Operation::Render => "render",
            Operation::Named(name) => name,
        };
        f.write_str(name)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Field => "field",
            Kind::Struct => "struct",
            Kind::Union => "union",
            Kind::Void => "void",
            Kind::Vector => "vector",
            Kind::Unimplemented => "unimplemented",
        };
        f.write_str(name)
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Override")
            .field("operation", &self.operation)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("texpr_a", &self.texpr_a.to_string())
            .field("texpr_b", &self.texpr_b.to_string())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for Customizers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Customizers")
            .field("overrides", &self.overrides)
            .field("mappers", &self.mappers)
            .finish()
    }
}
