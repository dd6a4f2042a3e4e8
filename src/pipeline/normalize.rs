//! Velocity magnitude normalization

use crate::{Error, Result};
use ndarray::Array2;

/// Rescale every velocity so the set's mean norm equals `target_magnitude`.
///
/// A single global factor is applied, so per-sample directions and the
/// relative speed profile along the trajectory are preserved, and the zeroed
/// goal velocity stays zero. Demonstrations recorded at different speeds end
/// up on a common scale, which keeps the regression well-conditioned.
///
/// A set whose velocities are all (numerically) zero is returned unchanged.
pub fn normalize(velocities: &Array2<f32>, target_magnitude: f32) -> Result<Array2<f32>> {
    if !target_magnitude.is_finite() || target_magnitude <= 0.0 {
        return Err(Error::Config(format!(
            "normalize_magnitude must be positive, got {target_magnitude}"
        )));
    }

    let n = velocities.nrows();
    if n == 0 {
        return Ok(velocities.clone());
    }

    let mean_norm = velocities
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v * v).sum::<f32>().sqrt())
        .sum::<f32>()
        / n as f32;

    if mean_norm <= f32::EPSILON {
        return Ok(velocities.clone());
    }

    Ok(velocities * (target_magnitude / mean_norm))
}
