//! Playback handoff
//!
//! The external simulation collaborator steps the robot, querying the
//! current subgoal's policy each control step and advancing once the
//! end-effector is within a distance threshold of the subgoal position.
//! This module produces the ordered material that contract rests on: one
//! descriptor and one policy per subgoal, aligned by index.

use super::SubgoalData;
use crate::learner::DsLearner;
use crate::{Error, Result};
use ndarray::Array1;

/// Terminal state of one subgoal: where to go and how to hold the gripper.
#[derive(Debug, Clone)]
pub struct SubgoalDescriptor {
    /// Subgoal position (last waypoint)
    pub position: Array1<f32>,
    /// Subgoal orientation (last waypoint)
    pub orientation: Array1<f32>,
    /// Gripper action at the subgoal
    pub gripper: f32,
}

impl SubgoalDescriptor {
    fn from_data(data: &SubgoalData) -> Self {
        let last = data.positions.nrows() - 1;
        Self {
            position: data.positions.row(last).to_owned(),
            orientation: data.orientations.row(last).to_owned(),
            gripper: data.grippers[last],
        }
    }
}

/// The ordered handoff to the playback collaborator.
///
/// `descriptors[i]` belongs to `policies[i]`: subgoal i's policy is the one
/// to query while pursuing subgoal i's position.
pub struct PlaybackPlan {
    pub descriptors: Vec<SubgoalDescriptor>,
    pub policies: Vec<DsLearner>,
}

impl PlaybackPlan {
    /// Number of subgoals in the plan.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the plan is empty.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Pair subgoal descriptors with their fitted policies, in index order.
pub fn playback_plan(data: &[SubgoalData], policies: Vec<DsLearner>) -> Result<PlaybackPlan> {
    if data.len() != policies.len() {
        return Err(Error::Config(format!(
            "{} subgoals but {} policies",
            data.len(),
            policies.len()
        )));
    }
    if data.is_empty() {
        return Err(Error::Config("playback plan needs at least one subgoal".to_string()));
    }

    let descriptors = data.iter().map(SubgoalDescriptor::from_data).collect();
    Ok(PlaybackPlan { descriptors, policies })
}
