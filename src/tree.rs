//! Type-tree builder: normalize a type expression into a tree of structural nodes.
//!
//! - typedefs and newtypes are resolved transitively; no node is ever a typedef.
//! - `Nullable<T>` and `sys.types.Maybe<T>` both surface as [`NodeKind::Nullable`].
//! - struct fields are built eagerly; union branches are built on demand through
//!   [`BranchNode::node`], which is what lets recursive types terminate.
//! - sequence, string-map and nullable parameters are kept as type expressions and
//!   only built when a consumer asks for them.
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::adlast::{bind_type_params, primitive_arity, DeclType, ScopedName, TypeExpr, TypeRef};
use crate::error::{Error, Result};
use crate::resolver::{resolve_decl, DeclResolver};

/// A shared resolver handle, captured by lazily-built branches.
pub type Resolver = Rc<dyn DeclResolver>;

#[derive(Debug, Clone)]
pub struct Node {
    /// The fully resolved expression this node describes.
    pub texpr: TypeExpr,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Any primitive other than the ones with a dedicated kind below.
    Primitive(String),
    Void,
    Struct(StructNode),
    Union(UnionNode),
    Sequence(TypeExpr),
    StringMap(TypeExpr),
    Nullable(NullableNode),
}

#[derive(Debug, Clone)]
pub struct StructNode {
    pub name: ScopedName,
    pub fields: Vec<FieldNode>,
}

#[derive(Debug, Clone)]
pub struct FieldNode {
    pub name: String,
    pub serialized_name: String,
    pub index: usize,
    /// The declared type, with type parameters substituted but not resolved.
    pub texpr: TypeExpr,
    /// Serialized-form default, if declared.
    pub default: Option<Value>,
    pub node: Node,
}

#[derive(Debug, Clone)]
pub struct UnionNode {
    pub name: ScopedName,
    pub branches: Vec<BranchNode>,
}

#[derive(Clone)]
pub struct BranchNode {
    pub name: String,
    pub serialized_name: String,
    pub index: usize,
    pub texpr: TypeExpr,
    resolver: Resolver,
}

#[derive(Debug, Clone)]
pub struct NullableNode {
    pub param: TypeExpr,
    pub shape: NullableShape,
}

#[derive(Debug, Clone)]
pub enum NullableShape {
    /// `Nullable<T>`: `null | T`.
    Null,
    /// `sys.types.Maybe<T>`, kept alongside its union declaration.
    Maybe(UnionNode),
}

impl BranchNode {
    /// Build this branch's node. Not memoized: every call rebuilds an equivalent node.
    pub fn node(&self) -> Result<Node> {
        trace!(branch = %self.name, texpr = %self.texpr, "building union branch");
        build(&self.texpr, &self.resolver)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}

impl fmt::Debug for BranchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BranchNode")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("texpr", &self.texpr)
            .finish_non_exhaustive()
    }
}

impl UnionNode {
    pub fn branch(&self, name: &str) -> Option<&BranchNode> {
        self.branches.iter().find(|b| b.name == name)
    }
}

impl NodeKind {
    pub fn describe(&self) -> &'static str {
        match self {
            NodeKind::Primitive(_) => "primitive",
            NodeKind::Void => "void",
            NodeKind::Struct(_) => "struct",
            NodeKind::Union(_) => "union",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::StringMap(_) => "string-map",
            NodeKind::Nullable(_) => "nullable",
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BUILDER
// ————————————————————————————————————————————————————————————————————————————

pub fn build(texpr: &TypeExpr, resolver: &Resolver) -> Result<Node> {
    match &texpr.type_ref {
        TypeRef::Primitive(ptype) => build_primitive(texpr, ptype),
        TypeRef::TypeParam(name) => Err(Error::UnboundTypeParam(name.clone())),
        TypeRef::Reference(name) => build_reference(texpr, name, resolver),
    }
}

fn build_primitive(texpr: &TypeExpr, ptype: &str) -> Result<Node> {
    if let Some(expected) = primitive_arity(ptype) {
        if expected != texpr.parameters.len() {
            return Err(Error::PrimitiveArity {
                name: ptype.to_string(),
                expected,
                found: texpr.parameters.len(),
            });
        }
    }
    let param = || texpr.parameters[0].clone();
    let kind = match ptype {
        "Void" => NodeKind::Void,
        "Vector" => NodeKind::Sequence(param()),
        "StringMap" => NodeKind::StringMap(param()),
        "Nullable" => NodeKind::Nullable(NullableNode {
            param: param(),
            shape: NullableShape::Null,
        }),
        other => NodeKind::Primitive(other.to_string()),
    };
    Ok(Node {
        texpr: texpr.clone(),
        kind,
    })
}

fn build_reference(texpr: &TypeExpr, name: &ScopedName, resolver: &Resolver) -> Result<Node> {
    let scoped_decl = resolve_decl(resolver.as_ref(), name)?;
    match &scoped_decl.decl.type_ {
        DeclType::Struct(s) => {
            let bindings = bind_type_params(name, &s.type_params, &texpr.parameters)?;
            let fields = s
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    let ftexpr = field.type_expr.substitute(&bindings)?;
                    Ok(FieldNode {
                        name: field.name.clone(),
                        serialized_name: field.serialized_name.clone(),
                        index,
                        default: field.default.clone(),
                        node: build(&ftexpr, resolver)?,
                        texpr: ftexpr,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Node {
                texpr: texpr.clone(),
                kind: NodeKind::Struct(StructNode {
                    name: name.clone(),
                    fields,
                }),
            })
        }
        DeclType::Union(u) => {
            let bindings = bind_type_params(name, &u.type_params, &texpr.parameters)?;
            let branches = u
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    Ok(BranchNode {
                        name: field.name.clone(),
                        serialized_name: field.serialized_name.clone(),
                        index,
                        texpr: field.type_expr.substitute(&bindings)?,
                        resolver: resolver.clone(),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let union = UnionNode {
                name: name.clone(),
                branches,
            };
            let kind = if texpr.is_reference_to("sys.types", "Maybe") {
                NodeKind::Nullable(NullableNode {
                    param: texpr.parameters[0].clone(),
                    shape: NullableShape::Maybe(union),
                })
            } else {
                NodeKind::Union(union)
            };
            Ok(Node {
                texpr: texpr.clone(),
                kind,
            })
        }
        DeclType::Type(td) => {
            let bindings = bind_type_params(name, &td.type_params, &texpr.parameters)?;
            build(&td.type_expr.substitute(&bindings)?, resolver)
        }
        DeclType::Newtype(nt) => {
            let bindings = bind_type_params(name, &nt.type_params, &texpr.parameters)?;
            build(&nt.type_expr.substitute(&bindings)?, resolver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adlast::{
        texpr_maybe, texpr_nullable, texpr_primitive, texpr_reference, texpr_string, texpr_vector,
        Decl, Field, ScopedDecl, Struct, TypeDef, Union,
    };
    use crate::resolver::AstMap;

    fn tree_resolver() -> Resolver {
        let tree = texpr_reference(ScopedName::new("test", "Tree"), vec![]);
        let decls: AstMap = [
            ScopedDecl {
                module_name: "test".into(),
                decl: Decl {
                    name: "Tree".into(),
                    type_: DeclType::Union(Union {
                        type_params: vec![],
                        fields: vec![
                            Field::new("leaf", texpr_primitive("Int32", vec![])),
                            Field::new("node", texpr_vector(tree.clone())),
                            Field::new("pair", texpr_reference(ScopedName::new("test", "Pair"), vec![])),
                        ],
                    }),
                },
            },
            ScopedDecl {
                module_name: "test".into(),
                decl: Decl {
                    name: "Pair".into(),
                    type_: DeclType::Struct(Struct {
                        type_params: vec![],
                        fields: vec![Field::new("left", tree.clone()), Field::new("right", tree)],
                    }),
                },
            },
            ScopedDecl {
                module_name: "test".into(),
                decl: Decl {
                    name: "Label".into(),
                    type_: DeclType::Type(TypeDef {
                        type_params: vec![],
                        type_expr: texpr_string(),
                    }),
                },
            },
        ]
        .into_iter()
        .collect();
        Rc::new(decls)
    }

    #[test]
    fn test_recursive_union_terminates() {
        let resolver = tree_resolver();
        let node = build(&texpr_reference(ScopedName::new("test", "Tree"), vec![]), &resolver).unwrap();
        let NodeKind::Union(u) = &node.kind else {
            panic!("expected union, got {}", node.kind.describe());
        };
        assert_eq!(u.branches.len(), 3);
        let pair = u.branch("pair").unwrap().node().unwrap();
        let NodeKind::Struct(s) = &pair.kind else {
            panic!("expected struct");
        };
        assert!(matches!(s.fields[0].node.kind, NodeKind::Union(_)));
    }

    #[test]
    fn test_typedef_is_resolved() {
        let resolver = tree_resolver();
        let node = build(&texpr_reference(ScopedName::new("test", "Label"), vec![]), &resolver).unwrap();
        assert!(matches!(&node.kind, NodeKind::Primitive(p) if p == "String"));
        assert_eq!(node.texpr, texpr_string());
    }

    #[test]
    fn test_nullable_and_maybe_shapes() {
        let resolver = tree_resolver();
        let nullable = build(&texpr_nullable(texpr_string()), &resolver).unwrap();
        assert!(matches!(
            &nullable.kind,
            NodeKind::Nullable(NullableNode { shape: NullableShape::Null, .. })
        ));
        let maybe = build(&texpr_maybe(texpr_string()), &resolver).unwrap();
        let NodeKind::Nullable(n) = &maybe.kind else {
            panic!("expected nullable");
        };
        assert_eq!(n.param, texpr_string());
        assert!(matches!(&n.shape, NullableShape::Maybe(u) if u.branches.len() == 2));
    }

    #[test]
    fn test_unresolved_reference_fails_fast() {
        let resolver = tree_resolver();
        let err = build(&texpr_reference(ScopedName::new("test", "Missing"), vec![]), &resolver).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(_)));
        let err = build(&texpr_primitive("Vector", vec![]), &resolver).unwrap_err();
        assert!(matches!(err, Error::PrimitiveArity { .. }));
    }
}
