//! The DS learner: supervised fitting of a policy network
//!
//! Owns one [`crate::nets::PolicyNet`] and drives minibatch MSE regression
//! with divergence recovery, best-checkpoint tracking, and stall-based
//! early stopping. Only the best snapshot survives a `fit` call.

mod batch;
mod core;
mod options;

pub use batch::{minibatches, Batch};
pub use core::DsLearner;
pub use options::{FitOptions, FitReport};
