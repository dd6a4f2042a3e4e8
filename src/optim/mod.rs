//! Optimizers for training the policy networks

mod adam;
mod clip;
mod optimizer;
mod scheduler;

pub use adam::Adam;
pub use clip::clip_grad_norm;
pub use optimizer::Optimizer;
pub use scheduler::{LRScheduler, LinearDecayLR};
