//! Affine-output baseline field

use super::linear::Linear;
use crate::autograd::Tensor;
use rand::rngs::StdRng;

/// A single affine map `v = Wx + b`.
///
/// The second unconstrained baseline: a globally linear field. Cheap to fit
/// and useful as a sanity reference, with no stability guarantee.
pub struct AffineNet {
    lin: Linear,
}

impl AffineNet {
    pub fn new(dim: usize, rng: &mut StdRng) -> Self {
        Self { lin: Linear::new_xavier(rng, dim, dim) }
    }

    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.lin.forward(x)
    }

    pub fn named_params(&self) -> Vec<(String, Tensor)> {
        self.lin.named_params("affine")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;
    use rand::SeedableRng;

    #[test]
    fn is_linear_in_its_input() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = AffineNet::new(2, &mut rng);

        let zero = net.forward(&Tensor::new(arr1(&[0.0, 0.0]), false)).data();
        let x = net.forward(&Tensor::new(arr1(&[1.0, 0.5]), false)).data();
        let x2 = net.forward(&Tensor::new(arr1(&[2.0, 1.0]), false)).data();

        // f(2x) - b = 2 (f(x) - b)
        for i in 0..2 {
            let lhs = x2[i] - zero[i];
            let rhs = 2.0 * (x[i] - zero[i]);
            assert!((lhs - rhs).abs() < 1e-5);
        }
    }
}
