//! ADL schema AST, as emitted (in JSON form) by the schema compiler.
//!
//! Only the parts the editor needs are modelled; unknown keys such as
//! `annotations` and `version` are ignored on load.
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedName {
    pub module_name: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TypeRef {
    Primitive(String),
    Reference(ScopedName),
    TypeParam(String),
}

/// A (possibly parameterized) type expression. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeExpr {
    pub type_ref: TypeRef,
    #[serde(default)]
    pub parameters: Vec<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub serialized_name: String,
    pub type_expr: TypeExpr,
    /// Declared default, in the serialized JSON form.
    #[serde(default, with = "maybe")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Struct {
    #[serde(default)]
    pub type_params: Vec<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Union {
    #[serde(default)]
    pub type_params: Vec<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDef {
    #[serde(default)]
    pub type_params: Vec<String>,
    pub type_expr: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewType {
    #[serde(default)]
    pub type_params: Vec<String>,
    pub type_expr: TypeExpr,
    #[serde(default, with = "maybe")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum DeclType {
    #[serde(rename = "struct_")]
    Struct(Struct),
    #[serde(rename = "union_")]
    Union(Union),
    #[serde(rename = "type_")]
    Type(TypeDef),
    #[serde(rename = "newtype_")]
    Newtype(NewType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decl {
    pub name: String,
    #[serde(rename = "type_")]
    pub type_: DeclType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedDecl {
    pub module_name: String,
    pub decl: Decl,
}

/// Primitive names known to ADL, with the number of type parameters each takes.
pub const PRIMITIVES: &[(&str, usize)] = &[
    ("Void", 0),
    ("Bool", 0),
    ("Int8", 0),
    ("Int16", 0),
    ("Int32", 0),
    ("Int64", 0),
    ("Word8", 0),
    ("Word16", 0),
    ("Word32", 0),
    ("Word64", 0),
    ("Float", 0),
    ("Double", 0),
    ("Json", 0),
    ("ByteVector", 0),
    ("String", 0),
    ("Vector", 1),
    ("StringMap", 1),
    ("Nullable", 1),
    ("TypeToken", 1),
];

pub fn primitive_arity(name: &str) -> Option<usize> {
    PRIMITIVES.iter().find(|(p, _)| *p == name).map(|(_, n)| *n)
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl ScopedName {
    pub fn new(module_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            name: name.into(),
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, type_expr: TypeExpr) -> Self {
        let name = name.into();
        Self {
            serialized_name: name.clone(),
            name,
            type_expr,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

pub fn texpr_primitive(name: &str, parameters: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr {
        type_ref: TypeRef::Primitive(name.to_string()),
        parameters,
    }
}

pub fn texpr_reference(name: ScopedName, parameters: Vec<TypeExpr>) -> TypeExpr {
    TypeExpr {
        type_ref: TypeRef::Reference(name),
        parameters,
    }
}

pub fn texpr_type_param(name: &str) -> TypeExpr {
    TypeExpr {
        type_ref: TypeRef::TypeParam(name.to_string()),
        parameters: Vec::new(),
    }
}

pub fn texpr_void() -> TypeExpr {
    texpr_primitive("Void", Vec::new())
}

pub fn texpr_string() -> TypeExpr {
    texpr_primitive("String", Vec::new())
}

pub fn texpr_vector(item: TypeExpr) -> TypeExpr {
    texpr_primitive("Vector", vec![item])
}

pub fn texpr_string_map(value: TypeExpr) -> TypeExpr {
    texpr_primitive("StringMap", vec![value])
}

pub fn texpr_nullable(value: TypeExpr) -> TypeExpr {
    texpr_primitive("Nullable", vec![value])
}

pub fn texpr_maybe(value: TypeExpr) -> TypeExpr {
    texpr_reference(ScopedName::new("sys.types", "Maybe"), vec![value])
}

pub fn texpr_map_entry(key: TypeExpr, value: TypeExpr) -> TypeExpr {
    texpr_reference(ScopedName::new("sys.types", "MapEntry"), vec![key, value])
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeExpr {
    pub fn is_primitive(&self, name: &str) -> bool {
        matches!(&self.type_ref, TypeRef::Primitive(p) if p == name)
    }

    pub fn is_reference_to(&self, module_name: &str, name: &str) -> bool {
        matches!(&self.type_ref, TypeRef::Reference(sn) if sn.module_name == module_name && sn.name == name)
    }

    /// Replace type parameters by their bindings, recursively.
    pub fn substitute(&self, bindings: &HashMap<String, TypeExpr>) -> Result<TypeExpr> {
        if let TypeRef::TypeParam(name) = &self.type_ref {
            return bindings
                .get(name)
                .cloned()
                .ok_or_else(|| Error::UnboundTypeParam(name.clone()));
        }
        let parameters = self
            .parameters
            .iter()
            .map(|p| p.substitute(bindings))
            .collect::<Result<Vec<_>>>()?;
        Ok(TypeExpr {
            type_ref: self.type_ref.clone(),
            parameters,
        })
    }
}

/// Pair declared type parameters with the actual parameters of a reference.
pub fn bind_type_params(
    name: &ScopedName,
    type_params: &[String],
    actual: &[TypeExpr],
) -> Result<HashMap<String, TypeExpr>> {
    if type_params.len() != actual.len() {
        return Err(Error::TypeParamArity {
            name: name.clone(),
            expected: type_params.len(),
            found: actual.len(),
        });
    }
    Ok(type_params.iter().cloned().zip(actual.iter().cloned()).collect())
}

impl fmt::Display for ScopedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module_name, self.name)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_ref {
            TypeRef::Primitive(p) => write!(f, "{p}")?,
            TypeRef::Reference(sn) => write!(f, "{sn}")?,
            TypeRef::TypeParam(p) => write!(f, "{p}")?,
        }
        if !self.parameters.is_empty() {
            write!(f, "<")?;
            for (i, p) in self.parameters.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

/// Parses the `Display` form: `String`, `examples.Person`, `sys.types.Maybe<Word32>`.
impl FromStr for TypeExpr {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut parser = TexprParser { input, pos: 0 };
        let texpr = parser.texpr()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(texpr)
    }
}

struct TexprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl TexprParser<'_> {
    fn texpr(&mut self) -> Result<TypeExpr> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let path = &self.input[start..self.pos];
        if path.is_empty() {
            return Err(self.error("expected a type name"));
        }
        let mut parameters = Vec::new();
        self.skip_ws();
        if self.peek() == Some('<') {
            self.pos += 1;
            loop {
                parameters.push(self.texpr()?);
                self.skip_ws();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some('>') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected `,` or `>`")),
                }
            }
        }
        let type_ref = match path.rsplit_once('.') {
            Some((module_name, name)) if !module_name.is_empty() && !name.is_empty() => {
                TypeRef::Reference(ScopedName::new(module_name, name))
            }
            Some(_) => return Err(self.error("malformed scoped name")),
            None if primitive_arity(path).is_some() => TypeRef::Primitive(path.to_string()),
            None => return Err(self.error(&format!("unknown primitive `{path}`"))),
        };
        Ok(TypeExpr {
            type_ref,
            parameters,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::ParseTypeExpr {
            input: self.input.to_string(),
            message: format!("{message} at offset {}", self.pos),
        }
    }
}

/// `sys.types.Maybe<T>` as stored in the AST: `{"kind":"nothing"}` | `{"kind":"just","value":T}`.
mod maybe {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    #[derive(Serialize, Deserialize)]
    #[serde(tag = "kind", content = "value", rename_all = "lowercase")]
    enum Maybe {
        Nothing,
        Just(Value),
    }

    pub fn serialize<S: Serializer>(value: &Option<Value>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            None => Maybe::Nothing.serialize(serializer),
            Some(v) => Maybe::Just(v.clone()).serialize(serializer),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
        Ok(match Maybe::deserialize(deserializer)? {
            Maybe::Nothing => None,
            Maybe::Just(v) => Some(v),
        })
    }
}
