//! Dispatch engine.
//!
//! [`create_visitor`] turns a type expression into a [`Visitor`]: a tree of
//! dispatchers, one per structural node, each carrying a descriptor that an
//! [`Acceptors`] table consumes. Every operation the editor supports (initial
//! state, value/state conversion, validation, update, render) is one such table
//! folded over the same visitor.
//!
//! Normalisation rules applied while building:
//! - `Nullable<T>` and `Maybe<T>` of a primitive whose empty text is invalid become
//!   one field whose empty text means "absent".
//! - Any other `Nullable<T>` is edited as `Maybe<T>` through a built-in mapper.
//! - `StringMap<T>` is edited as `Vector<MapEntry<String, T>>` through a built-in mapper.
//! - Union branches are only built when [`UnionBranch::visitor`] is called, so
//!   recursive types terminate.
use std::fmt;
use std::rc::Rc;

use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use crate::adlast::{texpr_map_entry, texpr_maybe, texpr_string, texpr_vector, TypeExpr};
use crate::customize::{Customizers, Kind, Mapper, Operation};
use crate::error::Result;
use crate::fields::{field_label, primitive_field_fns, FieldFnsRef, MaybeField, NullableField};
use crate::json_binding::JsonBinding;
use crate::tree::{self, BranchNode, Node, NodeKind, NullableShape, Resolver, StructNode, UnionNode};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A built dispatch tree. Cheap to clone.
#[derive(Clone)]
pub struct Visitor {
    inner: Rc<VisitorInner>,
}

#[derive(Clone)]
struct VisitorInner {
    texpr: TypeExpr,
    mapper: Option<Mapper>,
    dispatcher: Dispatcher,
    context: Rc<Context>,
}

/// Shared by every visitor built from one [`create_visitor`] call.
struct Context {
    resolver: Resolver,
    customizers: Customizers,
}

#[derive(Debug, Clone)]
pub enum Dispatcher {
    Field(FieldDescriptor),
    Struct(StructDescriptor),
    Union(UnionDescriptor),
    Void(VoidDescriptor),
    Vector(VectorDescriptor),
    Unimplemented(UnimplementedDescriptor),
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub texpr: TypeExpr,
    pub fieldfns: FieldFnsRef,
}

#[derive(Debug, Clone)]
pub struct StructDescriptor {
    pub texpr: TypeExpr,
    pub fields: Vec<FieldDetails>,
}

#[derive(Debug, Clone)]
pub struct FieldDetails {
    pub name: String,
    pub label: String,
    pub index: usize,
    /// Declared default in serialized form; decode it with `binding`.
    pub default: Option<Value>,
    pub binding: JsonBinding,
    pub visitor: Visitor,
}

#[derive(Debug, Clone)]
pub struct UnionDescriptor {
    pub texpr: TypeExpr,
    pub branches: Vec<UnionBranch>,
}

#[derive(Clone)]
pub struct UnionBranch {
    pub name: String,
    pub label: String,
    pub index: usize,
    node: BranchNode,
    context: Rc<Context>,
}

#[derive(Debug, Clone)]
pub struct VoidDescriptor {
    pub texpr: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct VectorDescriptor {
    pub texpr: TypeExpr,
    pub element: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct UnimplementedDescriptor {
    pub texpr: TypeExpr,
}

/// What an acceptor table sees around every dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Cut<'a> {
    pub operation: Operation,
    pub texpr: &'a TypeExpr,
    pub mapper: Option<&'a Mapper>,
}

/// One operation, expressed as a per-kind table.
///
/// `before` sees the input on the way down, before kind dispatch; `after` sees the
/// output on the way up. Operations that cross a type mapper hook in there.
pub trait Acceptors {
    type Input: 'static;
    type Output: 'static;

    fn before(&self, env: Self::Input, _cut: &Cut<'_>) -> Result<Self::Input> {
        Ok(env)
    }

    fn after(&self, out: Self::Output, _cut: &Cut<'_>) -> Result<Self::Output> {
        Ok(out)
    }

    fn accept_field(&self, env: Self::Input, desc: &FieldDescriptor) -> Result<Self::Output>;
    fn accept_struct(&self, env: Self::Input, desc: &StructDescriptor) -> Result<Self::Output>;
    fn accept_union(&self, env: Self::Input, desc: &UnionDescriptor) -> Result<Self::Output>;
    fn accept_void(&self, env: Self::Input, desc: &VoidDescriptor) -> Result<Self::Output>;

    /// Sequences have no built-in editor and behave like any other unimplemented
    /// node unless an override for [`Kind::Vector`] is registered.
    fn accept_vector(&self, env: Self::Input, desc: &VectorDescriptor) -> Result<Self::Output> {
        self.accept_unimplemented(env, &desc.placeholder())
    }

    fn accept_unimplemented(&self, env: Self::Input, desc: &UnimplementedDescriptor) -> Result<Self::Output>;
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

/// Build the visitor for `texpr`. Fails fast on unresolvable references, arity
/// errors and duplicate mappers anywhere outside a union branch.
pub fn create_visitor(texpr: &TypeExpr, resolver: Resolver, customizers: Customizers) -> Result<Visitor> {
    debug!(%texpr, "creating visitor");
    let context = Rc::new(Context { resolver, customizers });
    visitor_for_texpr(texpr, &context)
}

impl Visitor {
    fn new(texpr: TypeExpr, dispatcher: Dispatcher, context: &Rc<Context>) -> Self {
        Self {
            inner: Rc::new(VisitorInner {
                texpr,
                mapper: None,
                dispatcher,
                context: context.clone(),
            }),
        }
    }

    /// Attach `mapper` in front of this visitor, composing with any mapper it
    /// already carries.
    fn mapped(self, mapper: Mapper) -> Self {
        let mut inner = (*self.inner).clone();
        inner.mapper = Some(match &inner.mapper {
            Some(existing) => mapper.then(existing),
            None => mapper,
        });
        Self { inner: Rc::new(inner) }
    }

    /// The resolved expression of the node this visitor dispatches on.
    pub fn texpr(&self) -> &TypeExpr {
        &self.inner.texpr
    }

    pub fn mapper(&self) -> Option<&Mapper> {
        self.inner.mapper.as_ref()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn resolver(&self) -> &Resolver {
        &self.inner.context.resolver
    }

    pub fn kind(&self) -> Kind {
        match &self.inner.dispatcher {
            Dispatcher::Field(_) => Kind::Field,
            Dispatcher::Struct(_) => Kind::Struct,
            Dispatcher::Union(_) => Kind::Union,
            Dispatcher::Void(_) => Kind::Void,
            Dispatcher::Vector(_) => Kind::Vector,
            Dispatcher::Unimplemented(_) => Kind::Unimplemented,
        }
    }

    /// Run one operation at this node. Overrides registered for
    /// `(operation, kind)` take the place of the table's own acceptor.
    pub fn visit<A: Acceptors + ?Sized>(&self, operation: Operation, env: A::Input, acceptors: &A) -> Result<A::Output> {
        let inner = &*self.inner;
        let cut = Cut {
            operation,
            texpr: &inner.texpr,
            mapper: inner.mapper.as_ref(),
        };
        let env = acceptors.before(env, &cut)?;
        let customizers = &inner.context.customizers;
        let out = match &inner.dispatcher {
            Dispatcher::Field(d) => dispatch(customizers, operation, Kind::Field, env, d, |env, d| {
                acceptors.accept_field(env, d)
            }),
            Dispatcher::Struct(d) => dispatch(customizers, operation, Kind::Struct, env, d, |env, d| {
                acceptors.accept_struct(env, d)
            }),
            Dispatcher::Union(d) => dispatch(customizers, operation, Kind::Union, env, d, |env, d| {
                acceptors.accept_union(env, d)
            }),
            Dispatcher::Void(d) => dispatch(customizers, operation, Kind::Void, env, d, |env, d| {
                acceptors.accept_void(env, d)
            }),
            Dispatcher::Vector(d) => dispatch(customizers, operation, Kind::Vector, env, d, |env, d| {
                acceptors.accept_vector(env, d)
            }),
            Dispatcher::Unimplemented(d) => dispatch(customizers, operation, Kind::Unimplemented, env, d, |env, d| {
                acceptors.accept_unimplemented(env, d)
            }),
        }?;
        acceptors.after(out, &cut)
    }
}

impl StructDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDetails> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl UnionDescriptor {
    pub fn branch(&self, name: &str) -> Option<&UnionBranch> {
        self.branches.iter().find(|b| b.name == name)
    }
}

impl UnionBranch {
    /// The branch's declared type, with the union's parameters substituted.
    pub fn texpr(&self) -> &TypeExpr {
        &self.node.texpr
    }

    /// Build the branch visitor. Not memoized: each call builds a fresh, equivalent
    /// visitor.
    pub fn visitor(&self) -> Result<Visitor> {
        if let Some(visitor) = mapped_visitor(&self.node.texpr, &self.context)? {
            return Ok(visitor);
        }
        visitor_for_node(&self.node.node()?, &self.context)
    }
}

impl VectorDescriptor {
    pub fn placeholder(&self) -> UnimplementedDescriptor {
        UnimplementedDescriptor {
            texpr: self.texpr.clone(),
        }
    }
}

impl fmt::Debug for Visitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Visitor")
            .field("texpr", &self.inner.texpr.to_string())
            .field("kind", &self.kind())
            .field("mapper", &self.inner.mapper)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for UnionBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionBranch")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("texpr", &self.node.texpr.to_string())
            .finish_non_exhaustive()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn dispatch<I: 'static, O: 'static, D: 'static>(
    customizers: &Customizers,
    operation: Operation,
    kind: Kind,
    env: I,
    desc: &D,
    default: impl FnOnce(I, &D) -> Result<O>,
) -> Result<O> {
    match customizers.find_override::<I, O, D>(operation, kind)? {
        Some(accept) => {
            trace!(%operation, %kind, "dispatching to override");
            accept(env, desc)
        }
        None => default(env, desc),
    }
}

fn visitor_for_texpr(texpr: &TypeExpr, context: &Rc<Context>) -> Result<Visitor> {
    if let Some(visitor) = mapped_visitor(texpr, context)? {
        return Ok(visitor);
    }
    let node = tree::build(texpr, &context.resolver)?;
    visitor_for_node(&node, context)
}

/// If a caller mapper is registered for exactly `texpr`, the visitor for its target
/// type. The target node itself is never matched against mappers again.
fn mapped_visitor(texpr: &TypeExpr, context: &Rc<Context>) -> Result<Option<Visitor>> {
    let Some(mapper) = context.customizers.find_mapper(texpr)? else {
        return Ok(None);
    };
    debug!(from = %mapper.texpr_a, to = %mapper.texpr_b, "applying type mapper");
    let mapper = mapper.clone();
    let node = tree::build(&mapper.texpr_b, &context.resolver)?;
    Ok(Some(visitor_for_node(&node, context)?.mapped(mapper)))
}

fn visitor_for_node(node: &Node, context: &Rc<Context>) -> Result<Visitor> {
    trace!(texpr = %node.texpr, kind = node.kind.describe(), "building dispatcher");
    let texpr = node.texpr.clone();
    let dispatcher = match &node.kind {
        NodeKind::Void => Dispatcher::Void(VoidDescriptor { texpr: texpr.clone() }),
        NodeKind::Primitive(ptype) => match primitive_field_fns(ptype) {
            Some(fieldfns) => Dispatcher::Field(FieldDescriptor {
                texpr: texpr.clone(),
                fieldfns,
            }),
            None => Dispatcher::Unimplemented(UnimplementedDescriptor { texpr: texpr.clone() }),
        },
        NodeKind::Struct(s) => Dispatcher::Struct(struct_descriptor(node, s, context)?),
        NodeKind::Union(u) => Dispatcher::Union(union_descriptor(node, u, context)),
        NodeKind::Sequence(element) => Dispatcher::Vector(VectorDescriptor {
            texpr: texpr.clone(),
            element: element.clone(),
        }),
        NodeKind::StringMap(value) => {
            let entries = texpr_vector(texpr_map_entry(texpr_string(), value.clone()));
            let mapper = string_map_mapper(&node.texpr, entries.clone());
            return Ok(visitor_for_texpr(&entries, context)?.mapped(mapper));
        }
        NodeKind::Nullable(n) => match (scalar_field_fns(&n.param, context)?, &n.shape) {
            (Some(inner), NullableShape::Null) => Dispatcher::Field(FieldDescriptor {
                texpr: texpr.clone(),
                fieldfns: Rc::new(NullableField::new(inner)),
            }),
            (Some(inner), NullableShape::Maybe(_)) => Dispatcher::Field(FieldDescriptor {
                texpr: texpr.clone(),
                fieldfns: Rc::new(MaybeField::new(inner)),
            }),
            (None, NullableShape::Maybe(u)) => Dispatcher::Union(union_descriptor(node, u, context)),
            (None, NullableShape::Null) => {
                let maybe = texpr_maybe(n.param.clone());
                let mapper = nullable_mapper(&node.texpr, maybe.clone());
                return Ok(visitor_for_texpr(&maybe, context)?.mapped(mapper));
            }
        },
    };
    Ok(Visitor::new(texpr, dispatcher, context))
}

/// Codec for a primitive `param` whose empty text is invalid, so that an empty field
/// can stand for "absent".
fn scalar_field_fns(param: &TypeExpr, context: &Rc<Context>) -> Result<Option<FieldFnsRef>> {
    let node = tree::build(param, &context.resolver)?;
    let NodeKind::Primitive(ptype) = &node.kind else {
        return Ok(None);
    };
    Ok(primitive_field_fns(ptype).filter(|fns| fns.validate("").is_some()))
}

fn struct_descriptor(node: &Node, s: &StructNode, context: &Rc<Context>) -> Result<StructDescriptor> {
    let fields = s
        .fields
        .iter()
        .map(|field| {
            let visitor = match mapped_visitor(&field.texpr, context)? {
                Some(visitor) => visitor,
                None => visitor_for_node(&field.node, context)?,
            };
            Ok(FieldDetails {
                name: field.name.clone(),
                label: field_label(&field.name),
                index: field.index,
                default: field.default.clone(),
                binding: JsonBinding::new(field.texpr.clone(), context.resolver.clone()),
                visitor,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(StructDescriptor {
        texpr: node.texpr.clone(),
        fields,
    })
}

fn union_descriptor(node: &Node, u: &UnionNode, context: &Rc<Context>) -> UnionDescriptor {
    UnionDescriptor {
        texpr: node.texpr.clone(),
        branches: u
            .branches
            .iter()
            .map(|branch| UnionBranch {
                name: branch.name.clone(),
                label: field_label(&branch.name),
                index: branch.index,
                node: branch.clone(),
                context: context.clone(),
            })
            .collect(),
    }
}

// ---- built-in mappers ----

/// `null | T` <-> `{"kind": "nothing"} | {"kind": "just", "value": T}`
fn nullable_mapper(nullable: &TypeExpr, maybe: TypeExpr) -> Mapper {
    Mapper::new(
        nullable.clone(),
        maybe,
        |b| match (b.get("kind").and_then(Value::as_str), b.get("value")) {
            (Some("just"), Some(v)) => v.clone(),
            _ => Value::Null,
        },
        |a| {
            if a.is_null() {
                json!({"kind": "nothing"})
            } else {
                json!({"kind": "just", "value": a})
            }
        },
    )
}

/// `{k: v, ...}` <-> `[{"key": k, "value": v}, ...]`, preserving entry order.
fn string_map_mapper(map: &TypeExpr, entries: TypeExpr) -> Mapper {
    Mapper::new(
        map.clone(),
        entries,
        |b| {
            let mut out = Map::new();
            for entry in b.as_array().into_iter().flatten() {
                if let Some(key) = entry.get("key").and_then(Value::as_str) {
                    let value = entry.get("value").cloned().unwrap_or(Value::Null);
                    out.insert(key.to_string(), value);
                }
            }
            Value::Object(out)
        },
        |a| match a {
            Value::Object(obj) => obj
                .into_iter()
                .map(|(key, value)| json!({"key": key, "value": value}))
                .collect(),
            _ => Value::Array(Vec::new()),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adlast::{
        texpr_nullable, texpr_primitive, texpr_reference, texpr_string_map, Decl, DeclType, Field,
        ScopedDecl, ScopedName, Struct, Union,
    };
    use crate::error::Error;
    use crate::resolver::AstMap;

    fn decl(name: &str, type_: DeclType) -> ScopedDecl {
        ScopedDecl {
            module_name: "test".into(),
            decl: Decl {
                name: name.into(),
                type_,
            },
        }
    }

    fn expr(name: &str) -> TypeExpr {
        texpr_reference(ScopedName::new("test", name), vec![])
    }

    fn resolver() -> Resolver {
        let decls: AstMap = [
            decl(
                "Expr",
                DeclType::Union(Union {
                    type_params: vec![],
                    fields: vec![
                        Field::new("lit", texpr_primitive("Int32", vec![])),
                        Field::new("neg", expr("Expr")),
                        Field::new("add", expr("Add")),
                    ],
                }),
            ),
            decl(
                "Add",
                DeclType::Struct(Struct {
                    type_params: vec![],
                    fields: vec![Field::new("lhs", expr("Expr")), Field::new("rhs", expr("Expr"))],
                }),
            ),
            decl(
                "Broken",
                DeclType::Struct(Struct {
                    type_params: vec![],
                    fields: vec![Field::new("x", expr("Missing"))],
                }),
            ),
        ]
        .into_iter()
        .collect();
        Rc::new(decls)
    }

    /// Names the kind reached at a node, descending into one union branch.
    struct Describe;

    impl Acceptors for Describe {
        type Input = Option<String>;
        type Output = String;

        fn accept_field(&self, _: Option<String>, d: &FieldDescriptor) -> Result<String> {
            Ok(format!("field:{}", d.fieldfns.describe()))
        }
        fn accept_struct(&self, _: Option<String>, d: &StructDescriptor) -> Result<String> {
            let names: Vec<_> = d.fields.iter().map(|f| f.name.as_str()).collect();
            Ok(format!("struct:{}", names.join(",")))
        }
        fn accept_union(&self, branch: Option<String>, d: &UnionDescriptor) -> Result<String> {
            match branch.and_then(|b| d.branch(&b).cloned()) {
                Some(b) => b.visitor()?.visit(Operation::Named("describe"), None, self),
                None => Ok(format!("union:{}", d.branches.len())),
            }
        }
        fn accept_void(&self, _: Option<String>, _: &VoidDescriptor) -> Result<String> {
            Ok("void".into())
        }
        fn accept_unimplemented(&self, _: Option<String>, d: &UnimplementedDescriptor) -> Result<String> {
            Ok(format!("unimplemented:{}", d.texpr))
        }
    }

    fn describe(texpr: &TypeExpr, branch: Option<&str>) -> String {
        let visitor = create_visitor(texpr, resolver(), Customizers::new()).unwrap();
        visitor
            .visit(Operation::Named("describe"), branch.map(String::from), &Describe)
            .unwrap()
    }

    #[test]
    fn test_recursive_union_is_lazy() {
        assert_eq!(describe(&expr("Expr"), None), "union:3");
        assert_eq!(describe(&expr("Expr"), Some("add")), "struct:lhs,rhs");
        assert_eq!(describe(&expr("Expr"), Some("neg")), "union:3");
    }

    #[test]
    fn test_nullable_collapse() {
        let int = texpr_primitive("Int32", vec![]);
        assert_eq!(describe(&texpr_nullable(int.clone()), None), "field:optional integer");
        assert_eq!(describe(&texpr_maybe(int), None), "field:optional integer");
        // Empty text is a valid string, so a nullable string needs a real choice.
        let visitor = create_visitor(&texpr_nullable(texpr_string()), resolver(), Customizers::new()).unwrap();
        assert_eq!(visitor.kind(), Kind::Union);
        assert_eq!(visitor.texpr(), &texpr_maybe(texpr_string()));
        let mapper = visitor.mapper().unwrap();
        assert_eq!(mapper.b_from_a(Value::Null), json!({"kind": "nothing"}));
        assert_eq!(mapper.a_from_b(json!({"kind": "just", "value": "a"})), json!("a"));
    }

    #[test]
    fn test_string_map_is_edited_as_entries() {
        let visitor =
            create_visitor(&texpr_string_map(texpr_string()), resolver(), Customizers::new()).unwrap();
        assert_eq!(visitor.kind(), Kind::Vector);
        let mapper = visitor.mapper().unwrap();
        let entries = mapper.b_from_a(json!({"b": "1", "a": "2"}));
        assert_eq!(entries, json!([{"key": "b", "value": "1"}, {"key": "a", "value": "2"}]));
        assert_eq!(mapper.a_from_b(entries), json!({"b": "1", "a": "2"}));
    }

    #[test]
    fn test_caller_mapper_applies_once() {
        let int = texpr_primitive("Int32", vec![]);
        let customizers = Customizers::new().with_mapper(Mapper::new(int.clone(), int.clone(), |b| b, |a| a));
        let visitor = create_visitor(&expr("Add"), resolver(), customizers).unwrap();
        let Dispatcher::Struct(s) = visitor.dispatcher() else {
            panic!("expected struct");
        };
        let lhs = s.fields[0].visitor.clone();
        let Dispatcher::Union(u) = lhs.dispatcher() else {
            panic!("expected union");
        };
        let branch = u.branch("lit").unwrap().visitor().unwrap();
        assert_eq!(branch.kind(), Kind::Field);
        assert!(branch.mapper().is_some());
    }

    #[test]
    fn test_build_errors_fail_fast() {
        let err = create_visitor(&expr("Broken"), resolver(), Customizers::new()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(_)));
    }
}
