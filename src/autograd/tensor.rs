//! Shared-handle tensor with gradient tape hooks

use super::backward::BackwardOp;
use ndarray::Array1;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// A flat `f32` tensor with optional gradient tracking.
///
/// Cloning a `Tensor` is cheap and yields another handle to the same
/// storage, so the copies a network hands to an optimizer stay in sync with
/// the network's own parameters. Matrix-shaped parameters are stored
/// row-major and interpreted by the ops that consume them.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<RefCell<Array1<f32>>>,
    grad: Rc<RefCell<Option<Array1<f32>>>>,
    backward_op: Rc<RefCell<Option<Rc<dyn BackwardOp>>>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a tensor from an array.
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        Self {
            data: Rc::new(RefCell::new(data)),
            grad: Rc::new(RefCell::new(None)),
            backward_op: Rc::new(RefCell::new(None)),
            requires_grad,
        }
    }

    /// Create a tensor from a `Vec`.
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a zero-filled tensor.
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Snapshot of the current contents.
    pub fn data(&self) -> Array1<f32> {
        self.data.borrow().clone()
    }

    /// Mutable access to the underlying storage.
    pub fn data_mut(&self) -> RefMut<'_, Array1<f32>> {
        self.data.borrow_mut()
    }

    /// Overwrite the underlying storage in place.
    pub fn set_data(&self, data: Array1<f32>) {
        *self.data.borrow_mut() = data;
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether gradients are tracked for this tensor.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Snapshot of the accumulated gradient, if any.
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// The shared gradient cell, for backward ops that write into it.
    pub fn grad_cell(&self) -> Rc<RefCell<Option<Array1<f32>>>> {
        Rc::clone(&self.grad)
    }

    /// Replace the gradient.
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add into the gradient, initializing it on first accumulation.
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    /// Clear the gradient.
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// The op that produced this tensor, if it tracks gradients.
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.borrow().clone()
    }

    /// Attach the producing op.
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        *self.backward_op.borrow_mut() = Some(op);
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("len", &self.len())
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn clone_shares_storage() {
        let t = Tensor::from_vec(vec![1.0, 2.0], true);
        let alias = t.clone();
        alias.data_mut()[0] = 5.0;
        assert_eq!(t.data()[0], 5.0);
    }

    #[test]
    fn accumulate_grad_sums() {
        let t = Tensor::zeros(2, true);
        t.accumulate_grad(arr1(&[1.0, 2.0]));
        t.accumulate_grad(arr1(&[0.5, 0.5]));
        let g = t.grad().expect("grad accumulated");
        assert_eq!(g, arr1(&[1.5, 2.5]));
    }

    #[test]
    fn zero_grad_clears() {
        let t = Tensor::zeros(2, true);
        t.set_grad(arr1(&[1.0, 1.0]));
        t.zero_grad();
        assert!(t.grad().is_none());
    }
}
