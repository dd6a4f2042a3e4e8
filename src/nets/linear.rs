//! Fully-connected layer over tape tensors

use crate::autograd::{add, matmul, Tensor};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::Rng;

/// A dense layer `y = Wx + b` with Xavier/Glorot initialization.
///
/// The weight matrix is stored row-major as a flat tensor of length
/// `out_dim * in_dim`.
pub struct Linear {
    weight: Tensor,
    bias: Tensor,
    in_dim: usize,
    out_dim: usize,
}

impl Linear {
    /// Create a layer with Xavier-uniform weights and zero bias.
    pub fn new_xavier(rng: &mut StdRng, in_dim: usize, out_dim: usize) -> Self {
        let limit = (6.0 / (in_dim + out_dim) as f32).sqrt();
        let weight: Vec<f32> =
            (0..in_dim * out_dim).map(|_| rng.gen_range(-limit..limit)).collect();

        Self {
            weight: Tensor::new(Array1::from(weight), true),
            bias: Tensor::zeros(out_dim, true),
            in_dim,
            out_dim,
        }
    }

    /// Apply the layer to a column vector on the tape.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        add(&matmul(&self.weight, x, self.out_dim, self.in_dim, 1), &self.bias)
    }

    /// Input width.
    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    /// Output width.
    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    /// Named parameter handles, prefixed (e.g. `"l1"` → `"l1.weight"`).
    pub fn named_params(&self, prefix: &str) -> Vec<(String, Tensor)> {
        vec![
            (format!("{prefix}.weight"), self.weight.clone()),
            (format!("{prefix}.bias"), self.bias.clone()),
        ]
    }
}
