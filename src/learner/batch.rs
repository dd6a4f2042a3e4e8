//! Minibatch construction

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A training batch of positions and target velocities.
#[derive(Clone)]
pub struct Batch {
    /// Input positions, one row per sample
    pub inputs: Array2<f32>,
    /// Target velocities, one row per sample
    pub targets: Array2<f32>,
}

impl Batch {
    /// Number of samples in the batch.
    pub fn size(&self) -> usize {
        self.inputs.nrows()
    }
}

/// Split a dataset into shuffled minibatches.
///
/// The batch size is clamped to the dataset size, so tiny waypoint sets
/// train full-batch. Call once per epoch for a fresh shuffle.
pub fn minibatches(
    positions: &Array2<f32>,
    velocities: &Array2<f32>,
    batch_size: usize,
    rng: &mut StdRng,
) -> Vec<Batch> {
    let n = positions.nrows();
    let dim = positions.ncols();
    if n == 0 {
        return Vec::new();
    }
    let size = batch_size.clamp(1, n);

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    order
        .chunks(size)
        .map(|chunk| {
            let mut inputs = Array2::zeros((chunk.len(), dim));
            let mut targets = Array2::zeros((chunk.len(), dim));
            for (row, &i) in chunk.iter().enumerate() {
                inputs.row_mut(row).assign(&positions.row(i));
                targets.row_mut(row).assign(&velocities.row(i));
            }
            Batch { inputs, targets }
        })
        .collect()
}
