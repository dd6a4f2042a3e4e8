//! Serializable model state

use serde::{Deserialize, Serialize};

/// One flattened parameter tensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterState {
    /// Parameter name (e.g. "fhat.l1.weight")
    pub name: String,

    /// Element count, for validation on load
    pub len: usize,

    /// Flattened row-major values
    pub data: Vec<f32>,
}

/// Serializable state of a fitted policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    /// Network kind tag ("mlp", "affine", "stable", "flow")
    pub kind: String,

    /// Model name, also the file stem
    pub name: String,

    /// State-space dimensionality
    pub dim: usize,

    /// Goal position the field is anchored to
    pub goal: Vec<f32>,

    /// RFC 3339 save timestamp
    pub saved_at: String,

    /// Named parameter tensors
    pub params: Vec<ParameterState>,
}

impl ModelState {
    /// Parameter `(name, values)` pairs for loading into a network.
    pub fn parameter_pairs(&self) -> Vec<(String, Vec<f32>)> {
        self.params.iter().map(|p| (p.name.clone(), p.data.clone())).collect()
    }
}
