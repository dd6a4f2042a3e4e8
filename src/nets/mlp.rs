//! Free-form MLP velocity regressor

use super::linear::Linear;
use crate::autograd::{tanh, Tensor};
use rand::rngs::StdRng;

/// A tanh MLP `d → h → h → d` regressing velocity from position.
///
/// This is the behavioral-cloning baseline: nothing constrains the learned
/// field beyond the data, so convergence to the goal is empirical, not
/// certified. Also serves as the raw field inside [`super::StableNet`].
pub struct MlpNet {
    l1: Linear,
    l2: Linear,
    l3: Linear,
}

impl MlpNet {
    /// Create a freshly initialized MLP.
    pub fn new(dim: usize, hidden: usize, rng: &mut StdRng) -> Self {
        Self {
            l1: Linear::new_xavier(rng, dim, hidden),
            l2: Linear::new_xavier(rng, hidden, hidden),
            l3: Linear::new_xavier(rng, hidden, dim),
        }
    }

    /// Forward pass on the tape. `x` must be a leaf tensor.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let h1 = tanh(&self.l1.forward(x));
        let h2 = tanh(&self.l2.forward(&h1));
        self.l3.forward(&h2)
    }

    /// Named parameter handles under the given prefix.
    pub fn named_params(&self, prefix: &str) -> Vec<(String, Tensor)> {
        let mut params = self.l1.named_params(&format!("{prefix}.l1"));
        params.extend(self.l2.named_params(&format!("{prefix}.l2")));
        params.extend(self.l3.named_params(&format!("{prefix}.l3")));
        params
    }
}
