//! Demo dataset access
//!
//! The dataset proper is an external collaborator; this module is the thin
//! boundary the core sees: per demo, per subgoal index, four aligned arrays
//! of positions, velocities, orientations, and gripper actions. A JSON
//! container ships with the crate as the reference backing; richer formats
//! plug in behind the same surface.

use crate::orchestrator::SubgoalData;
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One subgoal's raw records in the container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgoalRecord {
    /// Waypoint positions, N×d
    pub positions: Vec<Vec<f32>>,
    /// Waypoint velocities, N×d; derived by differencing when absent
    #[serde(default)]
    pub velocities: Option<Vec<Vec<f32>>>,
    /// Waypoint orientations, N×3 or N×4
    pub orientations: Vec<Vec<f32>>,
    /// Gripper actions, N
    pub grippers: Vec<f32>,
}

/// One demonstration: an ordered list of subgoal segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoRecord {
    pub subgoals: Vec<SubgoalRecord>,
}

/// A demo container keyed by demo identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoDataset {
    pub demos: BTreeMap<String, DemoRecord>,
}

impl DemoDataset {
    /// Load a dataset from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Serialization(format!("failed to parse {}: {e}", path.display())))
    }

    /// Number of subgoal segments in a demo.
    pub fn num_subgoals(&self, demo: &str) -> Result<usize> {
        Ok(self.demo(demo)?.subgoals.len())
    }

    /// The four aligned arrays for one subgoal of one demo.
    pub fn subgoal_data(&self, demo: &str, subgoal: usize) -> Result<SubgoalData> {
        let record = self
            .demo(demo)?
            .subgoals
            .get(subgoal)
            .ok_or_else(|| Error::Config(format!("demo '{demo}' has no subgoal {subgoal}")))?;
        record.to_arrays()
    }

    /// All subgoals of one demo, in order.
    pub fn all_subgoals(&self, demo: &str) -> Result<Vec<SubgoalData>> {
        (0..self.num_subgoals(demo)?)
            .map(|i| self.subgoal_data(demo, i))
            .collect()
    }

    fn demo(&self, demo: &str) -> Result<&DemoRecord> {
        self.demos
            .get(demo)
            .ok_or_else(|| Error::Config(format!("demo '{demo}' not in dataset")))
    }
}

impl SubgoalRecord {
    fn to_arrays(&self) -> Result<SubgoalData> {
        let positions = rows_to_array(&self.positions, "positions")?;
        let orientations = rows_to_array(&self.orientations, "orientations")?;
        let grippers = Array1::from(self.grippers.clone());

        let velocities = match &self.velocities {
            Some(rows) => rows_to_array(rows, "velocities")?,
            None => derive_velocities(&positions),
        };

        if positions.nrows() != velocities.nrows()
            || positions.nrows() != orientations.nrows()
            || positions.nrows() != grippers.len()
        {
            return Err(Error::Config(
                "subgoal record arrays are not aligned".to_string(),
            ));
        }

        Ok(SubgoalData { positions, velocities, orientations, grippers })
    }
}

fn rows_to_array(rows: &[Vec<f32>], what: &str) -> Result<Array2<f32>> {
    let n = rows.len();
    if n == 0 {
        return Err(Error::Config(format!("{what} is empty")));
    }
    let dim = rows[0].len();
    if rows.iter().any(|r| r.len() != dim) {
        return Err(Error::Config(format!("{what} rows are ragged")));
    }

    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n, dim), flat)
        .map_err(|e| Error::Config(format!("{what} has a bad shape: {e}")))
}

/// First-order velocities from position differences, zero at the goal.
fn derive_velocities(positions: &Array2<f32>) -> Array2<f32> {
    let n = positions.nrows();
    let mut velocities = Array2::zeros(positions.dim());
    for i in 0..n.saturating_sub(1) {
        let step = &positions.row(i + 1) - &positions.row(i);
        velocities.row_mut(i).assign(&step);
    }
    velocities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_json() -> &'static str {
        r#"{
            "demos": {
                "0": {
                    "subgoals": [
                        {
                            "positions": [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
                            "orientations": [[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
                            "grippers": [0.0, 0.0, 1.0]
                        }
                    ]
                }
            }
        }"#
    }

    #[test]
    fn parses_and_derives_velocities() {
        let dataset: DemoDataset = serde_json::from_str(dataset_json()).unwrap();
        assert_eq!(dataset.num_subgoals("0").unwrap(), 1);

        let data = dataset.subgoal_data("0", 0).unwrap();
        assert_eq!(data.velocities.row(0).to_vec(), vec![1.0, 0.0]);
        assert_eq!(data.velocities.row(2).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn missing_demo_and_subgoal_are_clear_errors() {
        let dataset: DemoDataset = serde_json::from_str(dataset_json()).unwrap();
        assert!(dataset.subgoal_data("7", 0).is_err());
        assert!(dataset.subgoal_data("0", 3).is_err());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let bad = r#"{
            "demos": {
                "0": {
                    "subgoals": [
                        {
                            "positions": [[0.0, 0.0], [1.0]],
                            "orientations": [[0.0], [0.0]],
                            "grippers": [0.0, 0.0]
                        }
                    ]
                }
            }
        }"#;
        let dataset: DemoDataset = serde_json::from_str(bad).unwrap();
        assert!(dataset.subgoal_data("0", 0).is_err());
    }
}
