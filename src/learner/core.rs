//! The DS learner

use super::batch::{minibatches, Batch};
use super::options::{FitOptions, FitReport};
use crate::autograd::{self, add, scale, square, sub, sum, Tensor};
use crate::io::{self, ModelState, ParameterState};
use crate::nets::{NetworkKind, PolicyNet};
use crate::optim::{clip_grad_norm, Adam, LRScheduler, LinearDecayLR, Optimizer};
use crate::{Error, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// An epoch must beat the best loss by this much to become the new best.
const IMPROVEMENT_TOL: f32 = 1e-6;

/// Learns a velocity field from waypoint data.
///
/// One learner owns one policy network anchored at one goal. `fit` trains it
/// against demonstrated velocities; afterwards the active network is the
/// best checkpoint seen during training, and that is what `predict`,
/// `potential`, and `save` expose.
pub struct DsLearner {
    kind: NetworkKind,
    dim: usize,
    goal: Array1<f32>,
    net: PolicyNet,
    rng: StdRng,
}

impl std::fmt::Debug for DsLearner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsLearner")
            .field("kind", &self.kind)
            .field("dim", &self.dim)
            .field("goal", &self.goal)
            .finish_non_exhaustive()
    }
}

impl DsLearner {
    /// Create a learner for `kind`, anchored at `goal`, seeded with `seed`.
    pub fn new(kind: NetworkKind, goal: Array1<f32>, seed: u64) -> Self {
        let dim = goal.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let net = PolicyNet::init(kind, dim, &goal, &mut rng);
        Self { kind, dim, goal, net, rng }
    }

    /// Create from a kind tag string.
    pub fn from_tag(tag: &str, goal: Array1<f32>, seed: u64) -> Result<Self> {
        Ok(Self::new(tag.parse()?, goal, seed))
    }

    /// The network kind.
    pub fn kind(&self) -> NetworkKind {
        self.kind
    }

    /// State-space dimensionality.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The anchored goal.
    pub fn goal(&self) -> &Array1<f32> {
        &self.goal
    }

    /// Fit the network to demonstrated velocities.
    ///
    /// See [`Self::fit_monitored`] for the variant that also reports a
    /// held-out MSE in the progress lines.
    pub fn fit(
        &mut self,
        positions: &Array2<f32>,
        velocities: &Array2<f32>,
        opts: &FitOptions,
    ) -> Result<FitReport> {
        self.fit_monitored(positions, velocities, None, opts)
    }

    /// Fit, optionally monitoring a held-out set.
    ///
    /// Minibatch MSE regression with a linearly decaying learning rate. A
    /// non-finite or above-ceiling minibatch loss discards the network and
    /// optimizer and restarts both from a fresh initialization; training
    /// continues with the remaining batches. After the last epoch the
    /// best-checkpoint parameters replace the final-epoch ones.
    pub fn fit_monitored(
        &mut self,
        positions: &Array2<f32>,
        velocities: &Array2<f32>,
        holdout: Option<(&Array2<f32>, &Array2<f32>)>,
        opts: &FitOptions,
    ) -> Result<FitReport> {
        self.check_dataset(positions, velocities)?;

        let start = Instant::now();

        let mut optimizer = Adam::default_params(opts.lr_initial);
        let mut scheduler = LinearDecayLR::new(opts.lr_initial, opts.lr_end_factor, opts.epochs);
        let mut params = self.net.params();

        let mut best_loss = f32::INFINITY;
        let mut best_epoch = 0usize;
        let mut best_params: Option<Vec<Array1<f32>>> = None;

        let mut final_loss = 0.0f32;
        let mut epochs_run = 0usize;
        let mut recoveries = 0usize;
        let mut consecutive_recoveries = 0usize;
        let mut stopped_early = false;

        for epoch in 0..opts.epochs {
            scheduler.apply(&mut optimizer);
            epochs_run = epoch + 1;

            let batches = minibatches(positions, velocities, opts.batch_size, &mut self.rng);
            let mut epoch_losses = Vec::with_capacity(batches.len());

            for batch in &batches {
                optimizer.zero_grad(&mut params);

                let (loss, loss_val) = self.batch_loss(batch);
                epoch_losses.push(loss_val);

                if !loss_val.is_finite() || loss_val > opts.loss_ceiling {
                    // Corrupted weights are unrecoverable; restart clean and
                    // skip this update.
                    recoveries += 1;
                    consecutive_recoveries += 1;
                    if consecutive_recoveries > opts.max_recoveries {
                        return Err(Error::TrainingDiverged { attempts: consecutive_recoveries });
                    }
                    eprintln!(
                        "divergent minibatch loss {loss_val:.3e} at epoch {epoch}, reinitializing network"
                    );
                    self.reinitialize();
                    params = self.net.params();
                    optimizer = Adam::default_params(opts.lr_initial);
                    scheduler.apply(&mut optimizer);
                    continue;
                }
                consecutive_recoveries = 0;

                autograd::backward(&loss, None);
                if opts.clip_gradient {
                    clip_grad_norm(&mut params, opts.clip_value);
                }
                optimizer.step(&mut params);
            }

            scheduler.step();

            let train_loss =
                epoch_losses.iter().sum::<f32>() / epoch_losses.len().max(1) as f32;
            final_loss = train_loss;

            // A divergent batch poisons the epoch mean, so such an epoch can
            // never claim the best checkpoint.
            if best_loss - train_loss > IMPROVEMENT_TOL {
                best_loss = train_loss;
                best_epoch = epoch;
                best_params = Some(params.iter().map(Tensor::data).collect());
            }

            if opts.show_stats && epoch % opts.stat_every == 0 {
                let holdout_mse = holdout
                    .map(|(hp, hv)| self.evaluate(hp, hv))
                    .unwrap_or(0.0);
                eprintln!(
                    "epoch {epoch:>5} | train {train_loss:.6} | holdout {holdout_mse:.6} | best ({best_loss:.6}, {best_epoch}) | lr {:.6}",
                    optimizer.lr()
                );
            }

            if epoch - best_epoch >= opts.stall_epochs {
                eprintln!("no progress for {} epochs, stopping early", opts.stall_epochs);
                stopped_early = true;
                break;
            }
        }

        // The persisted and served model is the best snapshot, not the
        // final-epoch weights.
        if let Some(snapshot) = best_params {
            for (param, data) in params.iter().zip(snapshot) {
                param.set_data(data);
            }
        }

        Ok(FitReport {
            final_loss,
            best_loss,
            best_epoch,
            epochs_run,
            recoveries,
            stopped_early,
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Evaluate the field at a batch of positions.
    pub fn predict(&self, positions: &Array2<f32>) -> Array2<f32> {
        let mut out = Array2::zeros((positions.nrows(), self.dim));
        for (i, row) in positions.rows().into_iter().enumerate() {
            out.row_mut(i).assign(&self.net.predict(&row.to_owned()));
        }
        out
    }

    /// Evaluate the field at a single position.
    pub fn predict_one(&self, position: &Array1<f32>) -> Array1<f32> {
        self.net.predict(position)
    }

    /// Evaluate the potential at a batch of positions, if the variant has one.
    pub fn potential(&self, positions: &Array2<f32>) -> Option<Array1<f32>> {
        if !self.kind.has_potential() {
            return None;
        }
        let values: Vec<f32> = positions
            .rows()
            .into_iter()
            .map(|row| {
                self.net
                    .potential(&row.to_owned())
                    .expect("kind with potential returns Some")
            })
            .collect();
        Some(Array1::from(values))
    }

    /// Evaluate the potential at a single position, if the variant has one.
    pub fn potential_at(&self, position: &Array1<f32>) -> Option<f32> {
        self.net.potential(position)
    }

    /// Mean squared error of predictions against demonstrated velocities.
    pub fn evaluate(&self, positions: &Array2<f32>, velocities: &Array2<f32>) -> f32 {
        let n = positions.nrows();
        if n == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        for (pos, vel) in positions.rows().into_iter().zip(velocities.rows()) {
            let pred = self.net.predict(&pos.to_owned());
            let err: f32 = pred
                .iter()
                .zip(vel.iter())
                .map(|(p, t)| (p - t) * (p - t))
                .sum();
            total += err / self.dim as f32;
        }
        total / n as f32
    }

    /// Persist the active network under `<dir>/<kind>/<name>.json`.
    pub fn save(&self, name: &str, dir: &Path) -> Result<PathBuf> {
        let params = self
            .net
            .named_params()
            .into_iter()
            .map(|(pname, tensor)| {
                let data = tensor.data().to_vec();
                ParameterState { name: pname, len: data.len(), data }
            })
            .collect();

        let state = ModelState {
            kind: self.kind.as_str().to_string(),
            name: name.to_string(),
            dim: self.dim,
            goal: self.goal.to_vec(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            params,
        };

        io::save_model(&state, dir)
    }

    /// Restore a learner from a persisted model.
    ///
    /// `kind` must match the kind the model was saved under; the goal and
    /// parameters come from the file.
    pub fn load(kind: NetworkKind, name: &str, dir: &Path) -> Result<Self> {
        let state = io::load_model(kind, name, dir)?;

        if state.goal.len() != state.dim {
            return Err(Error::Serialization(format!(
                "model '{name}' has goal of length {} but dim {}",
                state.goal.len(),
                state.dim
            )));
        }

        let goal = Array1::from(state.goal.clone());
        let mut learner = Self::new(kind, goal, 0);
        learner.net.load_state(&state.parameter_pairs())?;
        Ok(learner)
    }

    /// Discard the network and optimizer-facing parameter handles.
    fn reinitialize(&mut self) {
        self.net = PolicyNet::init(self.kind, self.dim, &self.goal, &mut self.rng);
    }

    /// Mean-over-batch, mean-over-dimension squared error as a tape scalar.
    fn batch_loss(&self, batch: &Batch) -> (Tensor, f32) {
        let n = batch.size();
        let mut total: Option<Tensor> = None;

        for i in 0..n {
            let x = batch.inputs.row(i).to_owned();
            let target = Tensor::new(batch.targets.row(i).to_owned(), false);

            let pred = self.net.forward(&x);
            let err = sub(&pred, &target);
            let sample = scale(&sum(&square(&err)), 1.0 / self.dim as f32);

            total = Some(match total {
                Some(acc) => add(&acc, &sample),
                None => sample,
            });
        }

        let loss = scale(&total.expect("minibatches are never empty"), 1.0 / n as f32);
        let value = loss.data()[0];
        (loss, value)
    }

    fn check_dataset(&self, positions: &Array2<f32>, velocities: &Array2<f32>) -> Result<()> {
        if positions.dim() != velocities.dim() {
            return Err(Error::Config(format!(
                "positions {:?} and velocities {:?} disagree in shape",
                positions.dim(),
                velocities.dim()
            )));
        }
        if positions.ncols() != self.dim {
            return Err(Error::Config(format!(
                "dataset dimension {} does not match learner dimension {}",
                positions.ncols(),
                self.dim
            )));
        }
        if positions.nrows() < 2 {
            return Err(Error::InsufficientData {
                remaining: positions.nrows(),
                required: 2,
            });
        }
        Ok(())
    }
}
