//! Perturbation-based data augmentation

use crate::{Error, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution as _, Normal};
use std::str::FromStr;

/// Perturbation distribution for augmentation noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    /// Zero-mean Gaussian with standard deviation `alpha`.
    Normal,
    /// Uniform on `[-alpha, alpha]`.
    Uniform,
}

impl FromStr for Distribution {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "normal" => Ok(Distribution::Normal),
            "uniform" => Ok(Distribution::Uniform),
            other => Err(Error::Config(format!(
                "unknown augmentation distribution '{other}'"
            ))),
        }
    }
}

impl Distribution {
    fn sample(&self, alpha: f32, rng: &mut StdRng) -> f32 {
        match self {
            Distribution::Normal => {
                let normal = Normal::new(0.0f32, alpha).expect("alpha validated as finite");
                normal.sample(rng)
            }
            Distribution::Uniform => rng.gen_range(-alpha..alpha),
        }
    }
}

/// Synthesize perturbed copies of the interior waypoints.
///
/// Each sample except the goal spawns `rate` copies whose positions are
/// jittered per-coordinate by `distribution` scaled with `alpha`. A copy
/// keeps its source's speed but is re-aimed at the next original waypoint,
/// so the local flow direction stays consistent to first order. The goal
/// sample is never perturbed and remains the final row.
///
/// `rate = 0` or `alpha = 0` returns the input unchanged.
pub fn augment(
    positions: &Array2<f32>,
    velocities: &Array2<f32>,
    alpha: f32,
    rate: usize,
    distribution: Distribution,
    rng: &mut StdRng,
) -> (Array2<f32>, Array2<f32>) {
    let n = positions.nrows();
    let dim = positions.ncols();

    if rate == 0 || alpha <= 0.0 || n < 2 {
        return (positions.clone(), velocities.clone());
    }

    let total = n + (n - 1) * rate;
    let mut out_pos = Array2::zeros((total, dim));
    let mut out_vel = Array2::zeros((total, dim));

    // Originals first, except the goal which closes the set.
    for i in 0..n - 1 {
        out_pos.row_mut(i).assign(&positions.row(i));
        out_vel.row_mut(i).assign(&velocities.row(i));
    }

    let mut row = n - 1;
    for i in 0..n - 1 {
        let speed: f32 = velocities.row(i).iter().map(|v| v * v).sum::<f32>().sqrt();
        let next = positions.row(i + 1);

        for _ in 0..rate {
            let jitter =
                Array1::from_iter((0..dim).map(|_| distribution.sample(alpha, rng)));
            let perturbed = &positions.row(i) + &jitter;

            let heading = &next - &perturbed;
            let heading_norm: f32 = heading.iter().map(|v| v * v).sum::<f32>().sqrt();
            let vel = if heading_norm > f32::EPSILON {
                heading * (speed / heading_norm)
            } else {
                velocities.row(i).to_owned()
            };

            out_pos.row_mut(row).assign(&perturbed);
            out_vel.row_mut(row).assign(&vel);
            row += 1;
        }
    }

    out_pos.row_mut(total - 1).assign(&positions.row(n - 1));
    out_vel.row_mut(total - 1).assign(&velocities.row(n - 1));

    (out_pos, out_vel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    #[test]
    fn rate_zero_is_identity() {
        let p = array![[0.0, 0.0], [1.0, 0.0]];
        let v = array![[1.0, 0.0], [0.0, 0.0]];
        let (ap, av) = augment(&p, &v, 0.1, 0, Distribution::Normal, &mut rng());
        assert_eq!(ap, p);
        assert_eq!(av, v);
    }

    #[test]
    fn alpha_zero_is_identity() {
        let p = array![[0.0, 0.0], [1.0, 0.0]];
        let v = array![[1.0, 0.0], [0.0, 0.0]];
        let (ap, av) = augment(&p, &v, 0.0, 5, Distribution::Normal, &mut rng());
        assert_eq!(ap, p);
        assert_eq!(av, v);
    }

    #[test]
    fn output_size_and_goal_position() {
        let p = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[1.0, 0.0], [0.5, 0.0], [0.0, 0.0]];
        let (ap, av) = augment(&p, &v, 0.05, 4, Distribution::Normal, &mut rng());

        assert_eq!(ap.nrows(), 3 + 2 * 4);
        // Goal stays the final row, with zero velocity.
        assert_eq!(ap.row(ap.nrows() - 1).to_vec(), vec![2.0, 0.0]);
        assert_eq!(av.row(av.nrows() - 1).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn synthetic_samples_keep_source_speed() {
        let p = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let v = array![[0.8, 0.0], [0.4, 0.0], [0.0, 0.0]];
        let (_, av) = augment(&p, &v, 0.05, 3, Distribution::Uniform, &mut rng());

        // Rows 2..5 come from sample 0 (speed 0.8), rows 5..8 from sample 1.
        for i in 2..5 {
            let s: f32 = av.row(i).iter().map(|x| x * x).sum::<f32>().sqrt();
            assert_abs_diff_eq!(s, 0.8, epsilon = 1e-4);
        }
        for i in 5..8 {
            let s: f32 = av.row(i).iter().map(|x| x * x).sum::<f32>().sqrt();
            assert_abs_diff_eq!(s, 0.4, epsilon = 1e-4);
        }
    }

    #[test]
    fn synthetic_samples_aim_at_next_waypoint() {
        let p = array![[0.0, 0.0], [1.0, 0.0]];
        let v = array![[1.0, 0.0], [0.0, 0.0]];
        let (ap, av) = augment(&p, &v, 0.01, 8, Distribution::Normal, &mut rng());

        for i in 1..ap.nrows() - 1 {
            let to_next = &p.row(1) - &ap.row(i);
            let dot: f32 = to_next.iter().zip(av.row(i).iter()).map(|(a, b)| a * b).sum();
            assert!(dot > 0.0, "synthetic velocity points away from next waypoint");
        }
    }

    #[test]
    fn uniform_jitter_is_bounded() {
        let p = array![[0.0, 0.0], [1.0, 0.0]];
        let v = array![[1.0, 0.0], [0.0, 0.0]];
        let alpha = 0.05;
        let (ap, _) = augment(&p, &v, alpha, 16, Distribution::Uniform, &mut rng());

        for i in 1..ap.nrows() - 1 {
            for (c, orig) in ap.row(i).iter().zip(p.row(0).iter()) {
                assert!((c - orig).abs() <= alpha);
            }
        }
    }

    #[test]
    fn unknown_distribution_name_is_rejected() {
        assert!("cauchy".parse::<Distribution>().is_err());
        assert_eq!("normal".parse::<Distribution>().unwrap(), Distribution::Normal);
        assert_eq!("uniform".parse::<Distribution>().unwrap(), Distribution::Uniform);
    }
}
