//! Configuration errors raised while building or driving an editor.
//!
//! Validation problems are *not* errors: they are returned as `Vec<String>` from the
//! validate operation. Everything in [`Error`] is a programmer/configuration bug
//! (bad customizers, malformed schema, operating on state the caller did not validate).

use std::path::PathBuf;

use crate::adlast::{ScopedName, TypeExpr};
use crate::customize::{Kind, Operation};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unresolved type reference: {0}")]
    UnresolvedType(ScopedName),

    #[error("type {name} expects {expected} type parameter(s), got {found}")]
    TypeParamArity {
        name: ScopedName,
        expected: usize,
        found: usize,
    },

    #[error("unbound type parameter `{0}`")]
    UnboundTypeParam(String),

    #[error("primitive {name} expects {expected} type parameter(s), got {found}")]
    PrimitiveArity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("more than one override registered for ({operation}, {kind})")]
    DuplicateOverride { operation: Operation, kind: Kind },

    #[error("override for ({operation}, {kind}) does not match the acceptor signature")]
    OverrideSignature { operation: Operation, kind: Kind },

    #[error("more than one type mapper registered for {0}")]
    DuplicateMapper(TypeExpr),

    #[error("union value for {0} must have a non-empty `kind` field")]
    MissingUnionKind(TypeExpr),

    #[error("union {texpr} has no branch `{branch}`")]
    UnknownBranch { texpr: TypeExpr, branch: String },

    #[error("valueFromState called on union {0} with no branch selected")]
    NoBranchSelected(TypeExpr),

    #[error("update delivered to union {0} with no branch selected")]
    UpdateWithoutSelection(TypeExpr),

    #[error("struct {texpr} has no field `{field}`")]
    UnknownField { texpr: TypeExpr, field: String },

    #[error("expected {expected} edit state for {texpr}")]
    StateMismatch {
        texpr: TypeExpr,
        expected: &'static str,
    },

    #[error("expected {expected} value for {texpr}, found {found}")]
    ValueMismatch {
        texpr: TypeExpr,
        expected: &'static str,
        found: serde_json::Value,
    },

    #[error("json for {texpr}: {message}")]
    Json { texpr: TypeExpr, message: String },

    #[error("invalid type expression `{input}`: {message}")]
    ParseTypeExpr { input: String, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema {}: {message}", path.display())]
    Schema { path: PathBuf, message: String },
}
