//! Run configuration
//!
//! One JSON document drives a whole run: which network to fit, how to shape
//! the waypoints, where models live, and the playback pass-through the
//! simulation collaborator reads. Loaded by the CLI, or built
//! programmatically through the setters.

use crate::learner::FitOptions;
use crate::nets::NetworkKind;
use crate::pipeline::Distribution;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one training or playback run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Network kind tag: "mlp", "affine", "stable", or "flow"
    pub learner_type: String,
    /// Epoch budget per subgoal
    pub num_epochs: usize,
    /// Compute target identifier; recorded for provenance, compute is CPU
    pub device: String,
    /// Demo identifiers to draw from the dataset
    pub demos: Vec<String>,
    /// Path to the demo dataset file
    pub data_dir: Option<PathBuf>,
    /// Synthetic samples per original waypoint; paired with `augment_alpha`
    pub augment_rate: Option<usize>,
    /// Perturbation scale; paired with `augment_rate`
    pub augment_alpha: Option<f32>,
    /// Perturbation distribution: "normal" or "uniform"
    pub augment_distribution: String,
    /// Target mean velocity norm, when normalizing
    pub normalize_magnitude: Option<f32>,
    /// Whether to drop degenerate samples before fitting
    pub clean: bool,
    /// Base seed for all random draws; absent means nondeterministic
    pub seed: Option<u64>,
    /// Stem for persisted model names
    pub model_name: String,
    /// Skip training and load these models instead (with `model_dir`)
    pub model_names: Option<Vec<String>>,
    /// Directory to load pre-trained models from
    pub model_dir: Option<PathBuf>,
    /// Directory trained models are persisted under
    pub save_dir: PathBuf,
    /// Per-worker training deadline in seconds
    pub worker_timeout_secs: u64,
    /// Playback pass-through: run the simulation playback
    pub playback: bool,
    /// Playback pass-through: where to write the rollout video
    pub video_path: Option<PathBuf>,
    /// Playback pass-through: cameras to render
    pub camera_names: Vec<String>,
    /// Playback pass-through: frames skipped between video writes
    pub video_skip: usize,
    /// Playback pass-through: velocity multiplier while stepping
    pub multiplier: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            learner_type: "mlp".to_string(),
            num_epochs: 200,
            device: "cpu".to_string(),
            demos: Vec::new(),
            data_dir: None,
            augment_rate: None,
            augment_alpha: None,
            augment_distribution: "normal".to_string(),
            normalize_magnitude: None,
            clean: false,
            seed: None,
            model_name: "waypoint-policy".to_string(),
            model_names: None,
            model_dir: None,
            save_dir: PathBuf::from("res"),
            worker_timeout_secs: 120,
            playback: false,
            video_path: None,
            camera_names: Vec::new(),
            video_skip: 5,
            multiplier: 1.0,
        }
    }
}

impl RunConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        self.kind()?;
        self.distribution()?;

        if self.num_epochs == 0 {
            return Err(Error::Config("num_epochs must be positive".to_string()));
        }
        if self.augment_rate.is_some() != self.augment_alpha.is_some() {
            return Err(Error::Config(
                "augment_rate and augment_alpha must be set together".to_string(),
            ));
        }
        if let Some(alpha) = self.augment_alpha {
            if !alpha.is_finite() || alpha < 0.0 {
                return Err(Error::Config(format!(
                    "augment_alpha must be non-negative, got {alpha}"
                )));
            }
        }
        if self.model_names.is_some() != self.model_dir.is_some() {
            return Err(Error::Config(
                "model_names and model_dir must be set together".to_string(),
            ));
        }
        Ok(())
    }

    /// The parsed network kind.
    pub fn kind(&self) -> Result<NetworkKind> {
        self.learner_type.parse()
    }

    /// The parsed augmentation distribution.
    pub fn distribution(&self) -> Result<Distribution> {
        self.augment_distribution.parse()
    }

    /// Whether this run loads pre-trained models instead of training.
    pub fn load_mode(&self) -> bool {
        self.model_names.is_some() && self.model_dir.is_some()
    }

    /// Fit options derived from this configuration.
    pub fn fit_options(&self) -> FitOptions {
        FitOptions::default().epochs(self.num_epochs)
    }

    /// Base seed for this run's random draws.
    ///
    /// Worker i derives its own seed as `base_seed + i`, so parallel workers
    /// hold independent deterministic generators.
    pub fn base_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Persisted model name for one subgoal.
    pub fn subgoal_model_name(&self, subgoal: usize) -> String {
        format!(
            "{}-{}-subgoal{}-{}",
            self.model_name,
            self.learner_type,
            subgoal,
            chrono::Utc::now().format("%Y-%m-%d-%H-%M-%S")
        )
    }

    // ── Builder-style setters for programmatic construction ─────────────

    /// Set the network kind tag.
    #[must_use]
    pub fn learner_type(mut self, tag: &str) -> Self {
        self.learner_type = tag.to_string();
        self
    }

    /// Set the epoch budget.
    #[must_use]
    pub fn num_epochs(mut self, epochs: usize) -> Self {
        self.num_epochs = epochs;
        self
    }

    /// Set the save directory.
    #[must_use]
    pub fn save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Set the base seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable cleaning.
    #[must_use]
    pub fn clean(mut self, on: bool) -> Self {
        self.clean = on;
        self
    }

    /// Configure augmentation.
    #[must_use]
    pub fn augmentation(mut self, rate: usize, alpha: f32) -> Self {
        self.augment_rate = Some(rate);
        self.augment_alpha = Some(alpha);
        self
    }

    /// Configure velocity normalization.
    #[must_use]
    pub fn normalize_magnitude(mut self, magnitude: f32) -> Self {
        self.normalize_magnitude = Some(magnitude);
        self
    }

    /// Set the per-worker deadline.
    #[must_use]
    pub fn worker_timeout_secs(mut self, secs: u64) -> Self {
        self.worker_timeout_secs = secs;
        self
    }

    /// Switch to load mode with the given names and directory.
    #[must_use]
    pub fn pretrained(mut self, names: Vec<String>, dir: impl Into<PathBuf>) -> Self {
        self.model_names = Some(names);
        self.model_dir = Some(dir.into());
        self
    }
}
