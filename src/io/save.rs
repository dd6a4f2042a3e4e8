//! Model saving functionality

use super::model::ModelState;
use crate::nets::NetworkKind;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve the storage path for a model: `<dir>/<kind>/<name>.json`.
pub fn model_path(kind: NetworkKind, name: &str, dir: &Path) -> PathBuf {
    dir.join(kind.as_str()).join(format!("{name}.json"))
}

/// Persist a model state under its kind-namespaced path.
///
/// The kind subdirectory is created on demand. Returns the written path.
pub fn save_model(state: &ModelState, dir: &Path) -> Result<PathBuf> {
    let kind: NetworkKind = state.kind.parse()?;
    let path = model_path(kind, &state.name, dir);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(state)
        .map_err(|e| Error::Serialization(format!("model encoding failed: {e}")))?;
    fs::write(&path, data)?;

    Ok(path)
}
