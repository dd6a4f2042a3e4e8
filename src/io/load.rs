//! Model loading functionality

use super::model::ModelState;
use super::save::model_path;
use crate::nets::NetworkKind;
use crate::{Error, Result};
use std::fs;
use std::path::Path;

/// Load a persisted model state.
///
/// The caller names the kind it expects; the stored file must have been
/// saved under the same kind. A missing file is a clear not-found error,
/// never silent fallback to stale data.
pub fn load_model(kind: NetworkKind, name: &str, dir: &Path) -> Result<ModelState> {
    let path = model_path(kind, name, dir);
    if !path.exists() {
        return Err(Error::ModelNotFound { path });
    }

    let content = fs::read_to_string(&path)?;
    let state: ModelState = serde_json::from_str(&content)
        .map_err(|e| Error::Serialization(format!("failed to parse {}: {e}", path.display())))?;

    if state.kind != kind.as_str() {
        return Err(Error::Serialization(format!(
            "model '{name}' was saved as kind '{}', requested '{}'",
            state.kind, kind
        )));
    }

    Ok(state)
}
