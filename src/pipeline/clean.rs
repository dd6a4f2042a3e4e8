//! Degenerate-sample removal

use crate::{Error, Result};
use ndarray::Array2;

/// Fewest samples a trajectory segment may hold after cleaning.
pub const MIN_WAYPOINTS: usize = 3;

/// Squared distance under which consecutive positions count as duplicates.
const DUP_EPS_SQ: f32 = 1e-10;

/// Velocity norm under which an interior sample counts as stationary.
const STALL_EPS: f32 = 1e-6;

/// Remove samples that would destabilize fitting.
///
/// A sample is dropped when it contains a non-finite value, when its
/// position nearly duplicates the previously kept one, or when an interior
/// velocity is (numerically) zero. The final sample is the goal and is
/// always kept. Applying `clean` to an already-clean set is the identity.
///
/// # Errors
///
/// [`Error::InsufficientData`] when fewer than [`MIN_WAYPOINTS`] samples
/// would remain.
pub fn clean(
    positions: &Array2<f32>,
    velocities: &Array2<f32>,
) -> Result<(Array2<f32>, Array2<f32>)> {
    let n = positions.nrows();
    let dim = positions.ncols();

    let mut kept: Vec<usize> = Vec::with_capacity(n);
    for i in 0..n {
        let pos = positions.row(i);
        let vel = velocities.row(i);
        let is_goal = i == n - 1;

        if is_goal {
            kept.push(i);
            continue;
        }

        if pos.iter().chain(vel.iter()).any(|v| !v.is_finite()) {
            continue;
        }

        if let Some(&prev) = kept.last() {
            let dist_sq: f32 = positions
                .row(prev)
                .iter()
                .zip(pos.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            if dist_sq < DUP_EPS_SQ {
                continue;
            }
        }

        let speed_sq: f32 = vel.iter().map(|v| v * v).sum();
        if speed_sq < STALL_EPS * STALL_EPS {
            continue;
        }

        kept.push(i);
    }

    if kept.len() < MIN_WAYPOINTS {
        return Err(Error::InsufficientData {
            remaining: kept.len(),
            required: MIN_WAYPOINTS,
        });
    }

    let mut out_pos = Array2::zeros((kept.len(), dim));
    let mut out_vel = Array2::zeros((kept.len(), dim));
    for (row, &i) in kept.iter().enumerate() {
        out_pos.row_mut(row).assign(&positions.row(i));
        out_vel.row_mut(row).assign(&velocities.row(i));
    }

    Ok((out_pos, out_vel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn clean_set_is_untouched() {
        let p = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
        let (cp, cv) = clean(&p, &v).unwrap();
        assert_eq!(cp, p);
        assert_eq!(cv, v);
    }

    #[test]
    fn drops_nan_rows() {
        let p = array![[0.0, 0.0], [f32::NAN, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [1.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
        let (cp, _) = clean(&p, &v).unwrap();
        assert_eq!(cp.nrows(), 3);
        assert!(cp.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn drops_duplicate_positions() {
        let p = array![[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [1.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
        let (cp, _) = clean(&p, &v).unwrap();
        assert_eq!(cp.nrows(), 3);
    }

    #[test]
    fn drops_stalled_interior_samples() {
        let p = array![[0.0, 0.0], [0.5, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [0.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
        let (cp, cv) = clean(&p, &v).unwrap();
        assert_eq!(cp.nrows(), 3);
        // Interior zero-velocity row is gone, goal zero row remains.
        assert_eq!(cv.row(2).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn goal_row_survives_even_when_degenerate() {
        let p = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [0.5, 0.0], [0.3, 0.0], [0.0, 0.0]];
        let (cp, _) = clean(&p, &v).unwrap();
        assert_eq!(cp.row(cp.nrows() - 1).to_vec(), vec![2.0, 0.0]);
        assert_eq!(cp.nrows(), 4);
    }

    #[test]
    fn idempotent() {
        let p = array![
            [0.0, 0.0],
            [0.0, 0.0],
            [1.0, 0.0],
            [1.5, f32::NAN],
            [2.0, 0.0],
            [3.0, 0.0]
        ];
        let v = array![
            [1.0, 0.0],
            [1.0, 0.0],
            [0.5, 0.0],
            [0.4, 0.0],
            [0.2, 0.0],
            [0.0, 0.0]
        ];
        let (p1, v1) = clean(&p, &v).unwrap();
        let (p2, v2) = clean(&p1, &v1).unwrap();
        assert_eq!(p1, p2);
        assert_eq!(v1, v2);
    }

    #[test]
    fn too_few_survivors_is_an_error() {
        let p = array![[0.0, 0.0], [0.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        let err = clean(&p, &v).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientData { remaining: 2, required: MIN_WAYPOINTS }
        ));
    }
}
