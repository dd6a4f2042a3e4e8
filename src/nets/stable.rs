//! Lyapunov-certified dynamics
//!
//! Jointly parameterizes a free-form field and a positive-definite potential
//! anchored at the goal, and emits the free-form field projected so the
//! potential never increases along it. Convergence is a property of the
//! architecture, not of the loss.

use super::mlp::MlpNet;
use crate::autograd::{add, div, dot, matmul, relu, scale, shift, smul, square, sub, sum, Tensor};
use ndarray::Array1;
use rand::rngs::StdRng;

/// Guard added to ‖∇V‖² before dividing.
const PROJ_EPS: f32 = 1e-6;

/// Certified-stable velocity field.
///
/// The potential is the quadratic form
///
/// V(x) = ‖A(x − g)‖² + ε‖x − g‖²
///
/// with learnable `A`, so V > 0 away from the goal and V(g) = 0 exactly,
/// whatever training does to `A`. Its gradient is closed-form,
/// ∇V = 2AᵀA(x − g) + 2ε(x − g), and is built directly on the tape.
///
/// The raw MLP field f̂ is goal-anchored (f̂(x) − f̂(g)) and then corrected:
///
/// v(x) = f̃(x) − relu(⟨∇V, f̃⟩ + αV) ∇V / (‖∇V‖² + δ)
///
/// Wherever the raw field would climb the potential faster than −αV allows,
/// the component along ∇V is removed, which forces V̇ ≤ −αV away from the
/// goal. At the goal ∇V = 0 and the output is exactly zero.
pub struct StableNet {
    fhat: MlpNet,
    a: Tensor,
    goal: Array1<f32>,
    dim: usize,
    /// Minimum potential decay rate enforced by the projection.
    alpha: f32,
    /// Curvature floor of the quadratic potential.
    eps: f32,
}

impl StableNet {
    /// Create a freshly initialized certified field around `goal`.
    pub fn new(dim: usize, hidden: usize, goal: Array1<f32>, rng: &mut StdRng) -> Self {
        Self::with_margins(dim, hidden, goal, rng, 0.1, 0.2)
    }

    /// Create with explicit decay rate `alpha` and curvature floor `eps`.
    pub fn with_margins(
        dim: usize,
        hidden: usize,
        goal: Array1<f32>,
        rng: &mut StdRng,
        alpha: f32,
        eps: f32,
    ) -> Self {
        // A starts near identity so the initial potential is a round bowl.
        let mut a = vec![0.0f32; dim * dim];
        for i in 0..dim {
            a[i * dim + i] = 1.0;
        }

        Self {
            fhat: MlpNet::new(dim, hidden, rng),
            a: Tensor::new(Array1::from(a), true),
            goal,
            dim,
            alpha,
            eps,
        }
    }

    /// The anchored goal position.
    pub fn goal(&self) -> &Array1<f32> {
        &self.goal
    }

    /// Offset from the goal as a constant tape leaf.
    fn diff_leaf(&self, x: &Array1<f32>) -> Tensor {
        Tensor::new(x - &self.goal, false)
    }

    /// V(x) as a length-1 tape expression.
    fn potential_expr(&self, diff: &Tensor) -> Tensor {
        let ad = matmul(&self.a, diff, self.dim, self.dim, 1);
        let sq_dist: f32 = diff.data().iter().map(|d| d * d).sum();
        shift(&sum(&square(&ad)), self.eps * sq_dist)
    }

    /// ∇V(x) as a length-d tape expression.
    ///
    /// Uses the row-vector identity (A·diff)ᵀ A = Aᵀ(A·diff) to avoid an
    /// explicit transpose node.
    fn potential_grad_expr(&self, diff: &Tensor) -> Tensor {
        let ad = matmul(&self.a, diff, self.dim, self.dim, 1);
        let ata_diff = matmul(&ad, &self.a, 1, self.dim, self.dim);
        let linear = Tensor::new(diff.data() * (2.0 * self.eps), false);
        add(&scale(&ata_diff, 2.0), &linear)
    }

    /// Goal-anchored raw field f̂(x) − f̂(g).
    fn raw_expr(&self, x: &Tensor) -> Tensor {
        let g = Tensor::new(self.goal.clone(), false);
        sub(&self.fhat.forward(x), &self.fhat.forward(&g))
    }

    /// Forward pass on the tape. `x` must be a leaf tensor.
    ///
    /// Shared subexpressions (raw field, potential gradient) are rebuilt per
    /// consumer, per the tape's single-consumer rule.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let pos = x.data();
        let diff = self.diff_leaf(&pos);

        let v = self.potential_expr(&diff);
        let along = add(&dot(&self.potential_grad_expr(&diff), &self.raw_expr(x)), &scale(&v, self.alpha));
        let excess = relu(&along);

        let norm_sq = sum(&square(&self.potential_grad_expr(&diff)));
        let coef = div(&excess, &shift(&norm_sq, PROJ_EPS));

        sub(&self.raw_expr(x), &smul(&coef, &self.potential_grad_expr(&diff)))
    }

    /// Evaluate the potential at a position.
    pub fn potential(&self, x: &Array1<f32>) -> f32 {
        let diff = self.diff_leaf(x);
        self.potential_expr(&diff).data()[0]
    }

    /// Named parameter handles.
    pub fn named_params(&self) -> Vec<(String, Tensor)> {
        let mut params = self.fhat.named_params("fhat");
        params.push(("potential.a".to_string(), self.a.clone()));
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;
    use rand::SeedableRng;

    fn net(goal: &[f32]) -> StableNet {
        let mut rng = StdRng::seed_from_u64(17);
        StableNet::new(goal.len(), 16, arr1(goal), &mut rng)
    }

    #[test]
    fn potential_vanishes_at_goal_only() {
        let net = net(&[1.0, -2.0]);
        assert_abs_diff_eq!(net.potential(&arr1(&[1.0, -2.0])), 0.0, epsilon = 1e-9);
        assert!(net.potential(&arr1(&[1.5, -2.0])) > 0.0);
        assert!(net.potential(&arr1(&[0.0, 0.0])) > 0.0);
    }

    #[test]
    fn field_is_zero_at_goal() {
        let net = net(&[0.5, 0.5]);
        let v = net.forward(&Tensor::new(arr1(&[0.5, 0.5]), false)).data();
        for &c in v.iter() {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn potential_never_increases_along_field() {
        // V̇ = ⟨∇V, v⟩ must be ≤ 0 at sampled states, untrained included.
        let net = net(&[0.0, 0.0]);
        for &p in &[[1.0, 0.0], [0.3, -0.8], [-2.0, 1.5], [0.01, 0.01]] {
            let x = arr1(&p);
            let v = net.forward(&Tensor::new(x.clone(), false)).data();

            // Finite-difference directional derivative of V along v
            let h = 1e-3;
            let step = &x + &(&v * (h / v.iter().map(|c| c * c).sum::<f32>().sqrt().max(1e-9)));
            let dv = net.potential(&step) - net.potential(&x);
            assert!(
                dv <= 1e-4,
                "potential increased along the field at {p:?}: ΔV = {dv}"
            );
        }
    }

    #[test]
    fn gradients_reach_both_field_and_potential() {
        let net = net(&[0.0, 0.0]);
        let out = net.forward(&Tensor::new(arr1(&[1.0, 1.0]), false));
        let loss = sum(&square(&out));
        crate::autograd::backward(&loss, None);

        let named = net.named_params();
        let a_grad = named.iter().find(|(n, _)| n == "potential.a").map(|(_, t)| t.grad());
        assert!(a_grad.expect("a present").is_some(), "no gradient reached A");
        let w_grad = named.iter().find(|(n, _)| n == "fhat.l1.weight").map(|(_, t)| t.grad());
        assert!(w_grad.expect("w present").is_some(), "no gradient reached f̂");
    }
}
