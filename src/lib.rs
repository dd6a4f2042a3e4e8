//! Waypoint-conditioned dynamical-system policies.
//!
//! `senda` learns an autonomous vector field `x ↦ ẋ` from a handful of
//! demonstrated waypoints and drives an end-effector toward the final
//! waypoint. Depending on the chosen network variant the field is either a
//! free-form regressor or carries a construction-level convergence
//! certificate through a learned potential function.
//!
//! The crate is organized leaf-first:
//!
//! - [`autograd`] — tape-based automatic differentiation over `ndarray`
//! - [`optim`] — Adam, gradient clipping, learning-rate schedules
//! - [`nets`] — the closed set of policy network variants
//! - [`pipeline`] — waypoint shaping: goal anchoring, normalize, clean, augment
//! - [`learner`] — supervised fitting with divergence recovery and
//!   best-checkpoint tracking
//! - [`io`] — model persistence, one JSON file per fitted model
//! - [`orchestrator`] — per-subgoal parallel training and playback handoff
//!
//! # Example
//!
//! ```no_run
//! use ndarray::array;
//! use senda::{DsLearner, FitOptions, NetworkKind};
//!
//! let positions = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
//! let velocities = array![[1.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
//!
//! let goal = positions.row(positions.nrows() - 1).to_owned();
//! let mut learner = DsLearner::new(NetworkKind::Mlp, goal, 42);
//! learner.fit(&positions, &velocities, &FitOptions::default().epochs(200)).unwrap();
//!
//! let v = learner.predict_one(&array![1.5, 0.0]);
//! assert_eq!(v.len(), 2);
//! ```

pub mod autograd;
pub mod config;
pub mod data;
pub mod io;
pub mod learner;
pub mod nets;
pub mod optim;
pub mod orchestrator;
pub mod pipeline;

pub use autograd::Tensor;
pub use config::RunConfig;
pub use learner::{DsLearner, FitOptions, FitReport};
pub use nets::NetworkKind;
pub use pipeline::WaypointSet;

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Unrecognized network kind tag at construction or load time.
    #[error("unsupported network type '{0}'")]
    UnsupportedNetworkType(String),

    /// Data shaping left too few samples to fit a field.
    #[error("insufficient data: {remaining} samples remain, need at least {required}")]
    InsufficientData { remaining: usize, required: usize },

    /// Divergence recovery failed repeatedly within one `fit` call.
    #[error("training diverged: {attempts} consecutive re-initializations without a stable update")]
    TrainingDiverged { attempts: usize },

    /// A subgoal worker did not report back within its time budget.
    #[error("subgoal {subgoal} worker timed out after {timeout_secs}s")]
    WorkerTimeout { subgoal: usize, timeout_secs: u64 },

    /// No persisted model at the resolved path.
    #[error("model not found: {}", path.display())]
    ModelNotFound { path: PathBuf },

    /// Malformed or mismatched persisted model state.
    #[error("serialization: {0}")]
    Serialization(String),

    /// Invalid run configuration.
    #[error("configuration: {0}")]
    Config(String),

    /// Filesystem failure during persistence, surfaced directly.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
