//! Subgoal orchestration
//!
//! Splits a segmented trajectory into per-subgoal training jobs, fans them
//! out over isolated workers, and assembles the ordered policy sequence the
//! playback collaborator consumes.

mod playback;
mod worker;

pub use playback::{playback_plan, PlaybackPlan, SubgoalDescriptor};
pub use worker::train_subgoal_policy;

use crate::config::RunConfig;
use crate::learner::DsLearner;
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// The four aligned arrays one subgoal contributes.
#[derive(Debug, Clone)]
pub struct SubgoalData {
    /// End-effector positions, one row per waypoint
    pub positions: Array2<f32>,
    /// Velocities, one row per waypoint
    pub velocities: Array2<f32>,
    /// Orientations, one row per waypoint
    pub orientations: Array2<f32>,
    /// Gripper actions, one per waypoint
    pub grippers: Array1<f32>,
}

/// Per-subgoal completion report from the training fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum SubgoalOutcome {
    /// The worker trained and persisted a model under this name.
    Trained { model_name: String },
    /// The worker missed its deadline and was abandoned; no model exists.
    TimedOut,
    /// The worker failed; no model exists.
    Failed { reason: String },
}

impl SubgoalOutcome {
    /// The persisted model name, when training succeeded.
    pub fn model_name(&self) -> Option<&str> {
        match self {
            SubgoalOutcome::Trained { model_name } => Some(model_name),
            _ => None,
        }
    }
}

/// Train one policy per subgoal in parallel workers.
///
/// Each worker gets its own copy of the data and config, a seed derived
/// from the base seed and its subgoal index, and fully isolated model
/// state; fitted models reach shared storage only through [`DsLearner::save`].
/// The join is bounded: a worker that misses `worker_timeout_secs` is
/// abandoned and reported as [`SubgoalOutcome::TimedOut`] without affecting
/// its siblings. Outcomes come back ordered by subgoal index regardless of
/// completion order.
pub fn train_subgoals(data: &[SubgoalData], config: &RunConfig) -> Result<Vec<SubgoalOutcome>> {
    config.validate()?;
    let base_seed = config.base_seed();
    let timeout = Duration::from_secs(config.worker_timeout_secs);

    let mut receivers = Vec::with_capacity(data.len());
    for (index, subgoal) in data.iter().enumerate() {
        let (tx, rx) = mpsc::channel();
        let job_data = subgoal.clone();
        let job_config = config.clone();
        let seed = base_seed.wrapping_add(index as u64);

        thread::spawn(move || {
            let result = train_subgoal_policy(&job_data, &job_config, index, seed);
            // The orchestrator may have given up on us; nothing to do then.
            let _ = tx.send(result);
        });
        receivers.push(rx);
    }

    let outcomes = receivers
        .into_iter()
        .enumerate()
        .map(|(index, rx)| match rx.recv_timeout(timeout) {
            Ok(Ok(model_name)) => SubgoalOutcome::Trained { model_name },
            Ok(Err(e)) => {
                eprintln!("subgoal {index} failed: {e}");
                SubgoalOutcome::Failed { reason: e.to_string() }
            }
            Err(_) => {
                eprintln!(
                    "subgoal {index} exceeded {}s, abandoning worker",
                    timeout.as_secs()
                );
                SubgoalOutcome::TimedOut
            }
        })
        .collect();

    Ok(outcomes)
}

/// Load an ordered list of persisted policies by name.
///
/// This is the skip-training mode: the caller supplies the exact names used
/// at save time, and a missing model surfaces as
/// [`Error::ModelNotFound`].
pub fn load_policies(
    config: &RunConfig,
    names: &[String],
    dir: &std::path::Path,
) -> Result<Vec<DsLearner>> {
    let kind = config.kind()?;
    names
        .iter()
        .map(|name| DsLearner::load(kind, name, dir))
        .collect()
}

/// Reload the policies persisted by a training fan-out, in subgoal order.
///
/// Subgoals whose workers timed out or failed come back as `None`.
pub fn collect_policies(
    config: &RunConfig,
    outcomes: &[SubgoalOutcome],
) -> Result<Vec<Option<DsLearner>>> {
    let kind = config.kind()?;
    outcomes
        .iter()
        .map(|outcome| match outcome.model_name() {
            Some(name) => DsLearner::load(kind, name, &config.save_dir).map(Some),
            None => Ok(None),
        })
        .collect()
}

/// Convenience check that a trajectory's subgoals share one dimensionality.
pub fn check_alignment(data: &[SubgoalData]) -> Result<()> {
    let Some(first) = data.first() else {
        return Err(Error::Config("trajectory has no subgoals".to_string()));
    };
    let dim = first.positions.ncols();
    for (i, subgoal) in data.iter().enumerate() {
        if subgoal.positions.ncols() != dim || subgoal.velocities.ncols() != dim {
            return Err(Error::Config(format!(
                "subgoal {i} dimensionality disagrees with subgoal 0"
            )));
        }
        if subgoal.positions.nrows() != subgoal.velocities.nrows()
            || subgoal.positions.nrows() != subgoal.orientations.nrows()
            || subgoal.positions.nrows() != subgoal.grippers.len()
        {
            return Err(Error::Config(format!(
                "subgoal {i} arrays are not aligned"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    pub(crate) fn straight_subgoal(offset: f32) -> SubgoalData {
        SubgoalData {
            positions: array![
                [offset, 0.0],
                [offset + 1.0, 0.0],
                [offset + 2.0, 0.0],
                [offset + 3.0, 0.0]
            ],
            velocities: array![[1.0, 0.0], [0.8, 0.0], [0.4, 0.0], [0.0, 0.0]],
            orientations: array![
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0],
                [0.0, 0.0, 1.0]
            ],
            grippers: array![0.0, 0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn outcome_exposes_model_name() {
        let trained = SubgoalOutcome::Trained { model_name: "m-0".to_string() };
        assert_eq!(trained.model_name(), Some("m-0"));
        assert_eq!(SubgoalOutcome::TimedOut.model_name(), None);
        assert_eq!(
            SubgoalOutcome::Failed { reason: "x".to_string() }.model_name(),
            None
        );
    }

    #[test]
    fn alignment_check_catches_ragged_arrays() {
        let mut bad = straight_subgoal(0.0);
        bad.grippers = array![0.0];
        assert!(check_alignment(&[straight_subgoal(0.0), bad]).is_err());
        assert!(check_alignment(&[]).is_err());
        assert!(check_alignment(&[straight_subgoal(0.0)]).is_ok());
    }
}
