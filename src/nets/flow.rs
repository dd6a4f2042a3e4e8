//! Flow-based dynamics
//!
//! Parameterizes the field through a residual coordinate map anchored at the
//! goal: demonstrations reshape the geometry of the flow while the goal
//! remains the unique anchor point. No potential is exposed.

use super::linear::Linear;
use crate::autograd::{add, mul, scale, softplus, sub, tanh, Tensor};
use ndarray::Array1;
use rand::rngs::StdRng;

/// Diffeomorphism-style velocity field.
///
/// A residual one-hidden-layer map ψ(z) = z + W₂ tanh(W₁z + b₁) + b₂ sends
/// state space into a learned coordinate frame, and the field contracts
/// toward the goal's image with learnable per-dimension positive gains:
///
/// v(x) = −softplus(γ) ⊙ (ψ(x) − ψ(g))
///
/// The field is exactly zero at the goal by construction. While the residual
/// block remains a contraction (bounded weights, maintained in practice by
/// initialization and gradient clipping) ψ is invertible and the goal is the
/// field's only equilibrium.
pub struct FlowNet {
    l1: Linear,
    l2: Linear,
    gain: Tensor,
    goal: Array1<f32>,
}

impl FlowNet {
    /// Create a freshly initialized flow field around `goal`.
    pub fn new(dim: usize, hidden: usize, goal: Array1<f32>, rng: &mut StdRng) -> Self {
        Self {
            l1: Linear::new_xavier(rng, dim, hidden),
            l2: Linear::new_xavier(rng, hidden, dim),
            // softplus(0) ≈ 0.69, a moderate initial contraction rate
            gain: Tensor::zeros(dim, true),
            goal,
        }
    }

    /// The anchored goal position.
    pub fn goal(&self) -> &Array1<f32> {
        &self.goal
    }

    /// The residual coordinate map ψ on the tape. `z` must be a leaf.
    fn psi(&self, z: &Tensor) -> Tensor {
        let hidden = tanh(&self.l1.forward(z));
        add(&self.l2.forward(&hidden), z)
    }

    /// Forward pass on the tape. `x` must be a leaf tensor.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let g = Tensor::new(self.goal.clone(), false);
        let latent = sub(&self.psi(x), &self.psi(&g));
        scale(&mul(&softplus(&self.gain), &latent), -1.0)
    }

    /// Named parameter handles.
    pub fn named_params(&self) -> Vec<(String, Tensor)> {
        let mut params = self.l1.named_params("psi.l1");
        params.extend(self.l2.named_params("psi.l2"));
        params.push(("gain".to_string(), self.gain.clone()));
        params
    }
}
