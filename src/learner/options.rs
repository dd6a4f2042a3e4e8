//! Fit options and fit report

/// Knobs for one `fit` call.
///
/// Defaults mirror a configuration that behaves well on sparse waypoint
/// sets: full-batch-ish minibatches, gentle clipping, and a long stall
/// window relative to the epoch budget.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Epoch budget
    pub epochs: usize,
    /// Minibatch size, clamped to the dataset size
    pub batch_size: usize,
    /// Learning rate at epoch 0
    pub lr_initial: f32,
    /// Fraction of the initial rate reached at the final epoch
    pub lr_end_factor: f32,
    /// Whether to clip gradients by global norm
    pub clip_gradient: bool,
    /// Global-norm bound when clipping is on
    pub clip_value: f32,
    /// Minibatch loss above which the network is considered diverged
    pub loss_ceiling: f32,
    /// Epochs without improvement before stopping early
    pub stall_epochs: usize,
    /// Consecutive divergence recoveries tolerated before aborting
    pub max_recoveries: usize,
    /// Print a progress line every `stat_every` epochs
    pub show_stats: bool,
    /// Progress line interval in epochs
    pub stat_every: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 200,
            batch_size: 128,
            lr_initial: 1e-3,
            lr_end_factor: 0.01,
            clip_gradient: true,
            clip_value: 0.5,
            loss_ceiling: 1e3,
            stall_epochs: 3000,
            max_recoveries: 32,
            show_stats: false,
            stat_every: 2,
        }
    }
}

impl FitOptions {
    /// Set the epoch budget.
    #[must_use]
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the minibatch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the initial learning rate.
    #[must_use]
    pub fn lr_initial(mut self, lr: f32) -> Self {
        self.lr_initial = lr;
        self
    }

    /// Set the final learning-rate fraction.
    #[must_use]
    pub fn lr_end_factor(mut self, factor: f32) -> Self {
        self.lr_end_factor = factor;
        self
    }

    /// Disable gradient clipping.
    #[must_use]
    pub fn without_clipping(mut self) -> Self {
        self.clip_gradient = false;
        self
    }

    /// Set the divergence ceiling on minibatch loss.
    #[must_use]
    pub fn loss_ceiling(mut self, ceiling: f32) -> Self {
        self.loss_ceiling = ceiling;
        self
    }

    /// Set the early-stopping stall window.
    #[must_use]
    pub fn stall_epochs(mut self, epochs: usize) -> Self {
        self.stall_epochs = epochs;
        self
    }

    /// Set the consecutive-recovery cap.
    #[must_use]
    pub fn max_recoveries(mut self, cap: usize) -> Self {
        self.max_recoveries = cap;
        self
    }

    /// Enable progress lines on stderr.
    #[must_use]
    pub fn show_stats(mut self, on: bool) -> Self {
        self.show_stats = on;
        self
    }
}

/// Result of a `fit` call.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Mean training loss of the final epoch run
    pub final_loss: f32,
    /// Best mean epoch loss seen (infinite if no epoch produced one)
    pub best_loss: f32,
    /// Epoch index that produced the best loss
    pub best_epoch: usize,
    /// Epochs actually run
    pub epochs_run: usize,
    /// Divergence recoveries performed
    pub recoveries: usize,
    /// Whether the stall window ended training before the epoch budget
    pub stopped_early: bool,
    /// Wall-clock training time in seconds
    pub elapsed_secs: f64,
}

impl FitReport {
    /// Whether any epoch improved on the initial network.
    pub fn improved(&self) -> bool {
        self.best_loss.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chains() {
        let opts = FitOptions::default()
            .epochs(50)
            .batch_size(8)
            .lr_initial(0.01)
            .without_clipping()
            .stall_epochs(10);
        assert_eq!(opts.epochs, 50);
        assert_eq!(opts.batch_size, 8);
        assert!(!opts.clip_gradient);
        assert_eq!(opts.stall_epochs, 10);
    }

    #[test]
    fn report_improvement_flag() {
        let mut report = FitReport {
            final_loss: 0.5,
            best_loss: f32::INFINITY,
            best_epoch: 0,
            epochs_run: 3,
            recoveries: 3,
            stopped_early: false,
            elapsed_secs: 0.1,
        };
        assert!(!report.improved());
        report.best_loss = 0.4;
        assert!(report.improved());
    }
}
