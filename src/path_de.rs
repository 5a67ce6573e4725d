//! Schema loading, with JSON-path context in error messages.
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::adlast::ScopedDecl;
use crate::error::{Error, Result};
use crate::resolver::AstMap;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at JSON path {path} → {}", err.into_inner()))
        }
    }
}

/// Load a compiler-emitted AST map (`{"module.Name": {moduleName, decl}, ...}`).
pub fn load_ast_map(path: &Path) -> Result<AstMap> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decls = from_str_with_path::<IndexMap<String, ScopedDecl>>(&source).map_err(|message| Error::Schema {
        path: path.to_path_buf(),
        message,
    })?;
    debug!(path = %path.display(), decls = decls.len(), "loaded schema");
    Ok(decls.into_values().collect())
}
