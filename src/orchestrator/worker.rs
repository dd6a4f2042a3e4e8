//! Per-subgoal training worker

use super::SubgoalData;
use crate::config::RunConfig;
use crate::learner::DsLearner;
use crate::pipeline::WaypointSet;
use crate::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Train and persist one subgoal's policy; the body of one worker.
///
/// Runs the shaping pipeline (goal anchoring, then the configured
/// normalize/clean/augment stages), fits a fresh learner, and persists the
/// best checkpoint under a name derived from the subgoal index. Returns the
/// persisted model name.
pub fn train_subgoal_policy(
    data: &SubgoalData,
    config: &RunConfig,
    subgoal: usize,
    seed: u64,
) -> Result<String> {
    let mut set = WaypointSet::new(data.positions.clone(), data.velocities.clone())?;
    let mut rng = StdRng::seed_from_u64(seed);

    if let Some(magnitude) = config.normalize_magnitude {
        set = set.normalized(magnitude)?;
    }
    if config.clean {
        set = set.cleaned()?;
    }
    if let (Some(rate), Some(alpha)) = (config.augment_rate, config.augment_alpha) {
        set = set.augmented(alpha, rate, config.distribution()?, &mut rng);
    }

    let kind = config.kind()?;
    let mut learner = DsLearner::new(kind, set.goal(), seed);
    let report = learner.fit(&set.positions, &set.velocities, &config.fit_options())?;
    eprintln!(
        "subgoal {subgoal}: best loss {:.6} at epoch {} ({} epochs, {} recoveries)",
        report.best_loss, report.best_epoch, report.epochs_run, report.recoveries
    );

    let name = config.subgoal_model_name(subgoal);
    learner.save(&name, &config.save_dir)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn trains_and_persists_one_subgoal() {
        let dir = tempdir().unwrap();
        let config = RunConfig::default()
            .learner_type("affine")
            .num_epochs(20)
            .save_dir(dir.path())
            .seed(5);

        let data = SubgoalData {
            positions: array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]],
            velocities: array![[1.0, 0.0], [0.5, 0.0], [0.0, 0.0]],
            orientations: array![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            grippers: array![0.0, 0.0, 1.0],
        };

        let name = train_subgoal_policy(&data, &config, 0, 5).unwrap();
        assert!(name.contains("subgoal0"));
        assert!(dir.path().join("affine").join(format!("{name}.json")).exists());
    }

    #[test]
    fn pipeline_failures_propagate() {
        let dir = tempdir().unwrap();
        let config = RunConfig::default()
            .learner_type("affine")
            .num_epochs(5)
            .save_dir(dir.path())
            .clean(true);

        // Duplicated positions collapse below the minimum viable count.
        let data = SubgoalData {
            positions: array![[0.0, 0.0], [0.0, 0.0], [2.0, 0.0]],
            velocities: array![[1.0, 0.0], [1.0, 0.0], [0.0, 0.0]],
            orientations: array![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
            grippers: array![0.0, 0.0, 1.0],
        };

        assert!(train_subgoal_policy(&data, &config, 1, 5).is_err());
        assert!(!dir.path().join("affine").exists());
    }
}
