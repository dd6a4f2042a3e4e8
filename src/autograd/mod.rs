//! Tape-based autograd engine
//!
//! Provides automatic differentiation using a computational graph with
//! gradient tape. Network forward passes build the tape; [`backward`] walks
//! it from the loss node and accumulates gradients into parameter tensors.
//!
//! The backward walk revisits a node once per consuming op, so forward code
//! must route every non-leaf intermediate into exactly one downstream op and
//! recompute any subexpression it needs twice. Leaves (parameters and
//! inputs) may fan out freely.

mod backward;
pub mod ops;
mod tensor;


pub use backward::BackwardOp;
pub use ops::*;
pub use tensor::Tensor;

/// Perform a backward pass from a tensor.
///
/// When `grad_output` is `None` the tensor is treated as a scalar loss and
/// seeded with ones.
pub fn backward(tensor: &Tensor, grad_output: Option<ndarray::Array1<f32>>) {
    if let Some(grad) = grad_output {
        tensor.set_grad(grad);
    } else {
        let ones = ndarray::Array1::ones(tensor.len());
        tensor.set_grad(ones);
    }

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}
