//! Waypoint shaping pipeline
//!
//! Pure transforms that turn a handful of demonstrated waypoints into a
//! trainable supervised dataset: goal anchoring, velocity normalization,
//! degenerate-sample cleaning, and perturbation-based augmentation.

mod augment;
mod clean;
mod normalize;

pub use augment::{augment, Distribution};
pub use clean::{clean, MIN_WAYPOINTS};
pub use normalize::normalize;

use crate::{Error, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;

/// An ordered set of (position, velocity) samples along one trajectory
/// segment.
///
/// The final sample is the segment's goal; its velocity is forced to zero on
/// construction so the learned field has a stationary point there.
#[derive(Debug, Clone)]
pub struct WaypointSet {
    pub positions: Array2<f32>,
    pub velocities: Array2<f32>,
}

impl WaypointSet {
    /// Build a waypoint set, anchoring the goal.
    ///
    /// Fails when the arrays disagree in shape or hold no samples.
    pub fn new(positions: Array2<f32>, mut velocities: Array2<f32>) -> Result<Self> {
        if positions.dim() != velocities.dim() {
            return Err(Error::Config(format!(
                "positions {:?} and velocities {:?} disagree in shape",
                positions.dim(),
                velocities.dim()
            )));
        }
        let n = positions.nrows();
        if n == 0 {
            return Err(Error::InsufficientData { remaining: 0, required: 1 });
        }

        // Goal anchoring: the last sample is the fixed point of the field.
        velocities.row_mut(n - 1).fill(0.0);

        Ok(Self { positions, velocities })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    /// Whether the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// State-space dimensionality.
    pub fn dim(&self) -> usize {
        self.positions.ncols()
    }

    /// The goal position (last sample).
    pub fn goal(&self) -> Array1<f32> {
        self.positions.row(self.len() - 1).to_owned()
    }

    /// Rescale velocities so their mean norm matches `target_magnitude`.
    pub fn normalized(&self, target_magnitude: f32) -> Result<Self> {
        Ok(Self {
            positions: self.positions.clone(),
            velocities: normalize(&self.velocities, target_magnitude)?,
        })
    }

    /// Drop degenerate samples.
    pub fn cleaned(&self) -> Result<Self> {
        let (positions, velocities) = clean(&self.positions, &self.velocities)?;
        Ok(Self { positions, velocities })
    }

    /// Densify with perturbed copies of the interior samples.
    pub fn augmented(
        &self,
        alpha: f32,
        rate: usize,
        distribution: Distribution,
        rng: &mut StdRng,
    ) -> Self {
        let (positions, velocities) =
            augment(&self.positions, &self.velocities, alpha, rate, distribution, rng);
        Self { positions, velocities }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn construction_zeroes_goal_velocity() {
        let set = WaypointSet::new(
            array![[0.0, 0.0], [1.0, 0.0]],
            array![[1.0, 0.0], [0.7, 0.2]],
        )
        .unwrap();
        assert_eq!(set.velocities.row(1).to_vec(), vec![0.0, 0.0]);
        assert_eq!(set.goal().to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = WaypointSet::new(
            array![[0.0, 0.0], [1.0, 0.0]],
            array![[1.0, 0.0]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn empty_set_is_rejected() {
        let err = WaypointSet::new(
            Array2::zeros((0, 2)),
            Array2::zeros((0, 2)),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InsufficientData { .. }));
    }
}
