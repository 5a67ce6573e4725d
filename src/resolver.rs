//! Declaration lookup.
//!
//! The editor never mutates a resolver. `sys.types` declarations that the engine
//! synthesizes on its own (`Maybe`, `MapEntry`, ...) are always available through
//! [`resolve_decl`], whether or not the caller's resolver carries them.
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::adlast::{
    texpr_primitive, texpr_reference, texpr_type_param, texpr_vector, texpr_void, Decl, DeclType,
    Field, NewType, ScopedDecl, ScopedName, Struct, Union,
};
use crate::error::{Error, Result};

pub trait DeclResolver {
    /// Look up a declaration; unknown names fail with [`Error::UnresolvedType`].
    fn resolve(&self, name: &ScopedName) -> Result<&ScopedDecl>;
}

/// Declarations keyed by `"module.Name"`, in load order.
#[derive(Debug, Clone, Default)]
pub struct AstMap {
    decls: IndexMap<String, ScopedDecl>,
}

impl AstMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a compiler-emitted `_AST_MAP` object (`{"examples.Name": {...}, ...}`).
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        let decls: IndexMap<String, ScopedDecl> = serde_json::from_value(value)?;
        Ok(Self { decls })
    }

    pub fn insert(&mut self, decl: ScopedDecl) {
        let key = format!("{}.{}", decl.module_name, decl.decl.name);
        self.decls.insert(key, decl);
    }

    /// Later entries replace earlier ones with the same key.
    pub fn extend(&mut self, other: AstMap) {
        self.decls.extend(other.decls);
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }
}

impl FromIterator<ScopedDecl> for AstMap {
    fn from_iter<I: IntoIterator<Item = ScopedDecl>>(iter: I) -> Self {
        let mut map = AstMap::new();
        for decl in iter {
            map.insert(decl);
        }
        map
    }
}

impl DeclResolver for AstMap {
    fn resolve(&self, name: &ScopedName) -> Result<&ScopedDecl> {
        self.decls
            .get(&name.to_string())
            .ok_or_else(|| Error::UnresolvedType(name.clone()))
    }
}

/// Resolve through the caller's resolver, falling back to the built-in `sys.types`.
pub fn resolve_decl<'a>(resolver: &'a dyn DeclResolver, name: &ScopedName) -> Result<&'a ScopedDecl> {
    match resolver.resolve(name) {
        Ok(decl) => Ok(decl),
        Err(Error::UnresolvedType(_)) if name.module_name == "sys.types" => SYS_TYPES.resolve(name),
        Err(e) => Err(e),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// sys.types
// ————————————————————————————————————————————————————————————————————————————

pub static SYS_TYPES: Lazy<AstMap> = Lazy::new(|| {
    let t = || texpr_type_param("T");
    let k = || texpr_type_param("K");
    let v = || texpr_type_param("V");
    let a = || texpr_type_param("A");
    let b = || texpr_type_param("B");
    let params = |ps: &[&str]| ps.iter().map(|p| p.to_string()).collect::<Vec<_>>();
    let sys = |name: &str, type_: DeclType| ScopedDecl {
        module_name: "sys.types".to_string(),
        decl: Decl {
            name: name.to_string(),
            type_,
        },
    };
    [
        sys(
            "Maybe",
            DeclType::Union(Union {
                type_params: params(&["T"]),
                fields: vec![Field::new("nothing", texpr_void()), Field::new("just", t())],
            }),
        ),
        sys(
            "Either",
            DeclType::Union(Union {
                type_params: params(&["A", "B"]),
                fields: vec![Field::new("left", a()), Field::new("right", b())],
            }),
        ),
        sys(
            "Pair",
            DeclType::Struct(Struct {
                type_params: params(&["A", "B"]),
                fields: vec![Field::new("v1", a()), Field::new("v2", b())],
            }),
        ),
        sys(
            "MapEntry",
            DeclType::Struct(Struct {
                type_params: params(&["K", "V"]),
                fields: vec![Field::new("key", k()), Field::new("value", v())],
            }),
        ),
        sys(
            "Map",
            DeclType::Newtype(NewType {
                type_params: params(&["K", "V"]),
                type_expr: texpr_vector(texpr_reference(
                    ScopedName::new("sys.types", "Pair"),
                    vec![k(), v()],
                )),
                default: None,
            }),
        ),
        sys(
            "Set",
            DeclType::Newtype(NewType {
                type_params: params(&["T"]),
                type_expr: texpr_primitive("Vector", vec![t()]),
                default: None,
            }),
        ),
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sys_types_fallback() {
        let empty = AstMap::new();
        let maybe = ScopedName::new("sys.types", "Maybe");
        assert!(empty.resolve(&maybe).is_err());
        let decl = resolve_decl(&empty, &maybe).expect("built-in Maybe");
        assert!(matches!(decl.decl.type_, DeclType::Union(_)));
    }

    #[test]
    fn test_unknown_name_is_lookup_error() {
        let empty = AstMap::new();
        let err = resolve_decl(&empty, &ScopedName::new("examples", "Nope")).unwrap_err();
        assert!(matches!(err, Error::UnresolvedType(sn) if sn.name == "Nope"));
    }
}
