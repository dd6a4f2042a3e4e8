//! Subgoal orchestration scenarios

use ndarray::array;
use senda::orchestrator::{
    self, playback_plan, SubgoalData, SubgoalOutcome,
};
use senda::{DsLearner, NetworkKind, RunConfig};
use tempfile::tempdir;

fn subgoal(offset: f32) -> SubgoalData {
    SubgoalData {
        positions: array![
            [offset, 0.0],
            [offset + 1.0, 0.0],
            [offset + 2.0, 0.0],
            [offset + 3.0, 0.0]
        ],
        velocities: array![[1.0, 0.0], [0.7, 0.0], [0.3, 0.0], [0.0, 0.0]],
        orientations: array![
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0]
        ],
        grippers: array![0.0, 0.0, 0.0, 1.0],
    }
}

fn three_subgoals() -> Vec<SubgoalData> {
    vec![subgoal(0.0), subgoal(10.0), subgoal(20.0)]
}

#[test]
fn training_three_subgoals_persists_three_models() {
    let dir = tempdir().unwrap();
    let config = RunConfig::default()
        .learner_type("affine")
        .num_epochs(30)
        .save_dir(dir.path())
        .seed(100);

    let outcomes = orchestrator::train_subgoals(&three_subgoals(), &config).unwrap();

    assert_eq!(outcomes.len(), 3);
    for (i, outcome) in outcomes.iter().enumerate() {
        let name = outcome
            .model_name()
            .unwrap_or_else(|| panic!("subgoal {i} did not train: {outcome:?}"));
        assert!(name.contains(&format!("subgoal{i}")));
    }

    let files: Vec<_> = std::fs::read_dir(dir.path().join("affine"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(files.len(), 3, "expected exactly one model file per subgoal");
}

#[test]
fn trained_policies_reload_in_subgoal_order() {
    let dir = tempdir().unwrap();
    let config = RunConfig::default()
        .learner_type("flow")
        .num_epochs(25)
        .save_dir(dir.path())
        .seed(7);

    let data = three_subgoals();
    let outcomes = orchestrator::train_subgoals(&data, &config).unwrap();
    let policies = orchestrator::collect_policies(&config, &outcomes).unwrap();

    assert_eq!(policies.len(), 3);
    for (i, policy) in policies.iter().enumerate() {
        let policy = policy.as_ref().expect("policy reloaded");
        // Each reloaded policy is anchored at its own subgoal's goal.
        let expected_goal = data[i].positions.row(3).to_owned();
        assert_eq!(policy.goal(), &expected_goal);
    }
}

#[test]
fn playback_plan_orders_descriptors_with_their_policies() {
    let dir = tempdir().unwrap();
    let data = three_subgoals();

    // Persist three models by explicit name, then load them back by name.
    let names: Vec<String> = (0..3).map(|i| format!("replay-subgoal{i}")).collect();
    for (i, (d, name)) in data.iter().zip(&names).enumerate() {
        let goal = d.positions.row(3).to_owned();
        let learner = DsLearner::new(NetworkKind::Affine, goal, i as u64);
        learner.save(name, dir.path()).unwrap();
    }

    let config = RunConfig::default()
        .learner_type("affine")
        .pretrained(names.clone(), dir.path());
    let policies = orchestrator::load_policies(&config, &names, dir.path()).unwrap();
    let plan = playback_plan(&data, policies).unwrap();

    assert_eq!(plan.len(), 3);
    for (i, descriptor) in plan.descriptors.iter().enumerate() {
        let expected = data[i].positions.row(3).to_owned();
        assert_eq!(descriptor.position, expected);
        assert_eq!(plan.policies[i].goal(), &expected);
        assert_eq!(descriptor.gripper, 1.0);
        assert_eq!(descriptor.orientation.len(), 3);
    }
}

#[test]
fn a_failing_subgoal_does_not_abort_its_siblings() {
    let dir = tempdir().unwrap();
    let config = RunConfig::default()
        .learner_type("affine")
        .num_epochs(20)
        .save_dir(dir.path())
        .clean(true)
        .seed(3);

    // The middle subgoal collapses under cleaning.
    let mut data = three_subgoals();
    data[1].positions = array![[10.0, 0.0], [10.0, 0.0], [10.0, 0.0], [13.0, 0.0]];
    data[1].velocities = array![[1.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]];

    let outcomes = orchestrator::train_subgoals(&data, &config).unwrap();

    assert!(outcomes[0].model_name().is_some());
    assert!(matches!(outcomes[1], SubgoalOutcome::Failed { .. }));
    assert!(outcomes[2].model_name().is_some());

    // The failed subgoal left no file behind.
    let files: Vec<_> = std::fs::read_dir(dir.path().join("affine"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(files.len(), 2);

    // Downstream sees the gap explicitly rather than a shifted list.
    let policies = orchestrator::collect_policies(&config, &outcomes).unwrap();
    assert!(policies[0].is_some());
    assert!(policies[1].is_none());
    assert!(policies[2].is_some());
}

#[test]
fn slow_workers_are_reported_as_timeouts() {
    let dir = tempdir().unwrap();
    let config = RunConfig::default()
        .learner_type("mlp")
        .num_epochs(50_000)
        .save_dir(dir.path())
        .worker_timeout_secs(0)
        .seed(4);

    let outcomes = orchestrator::train_subgoals(&three_subgoals()[..1].to_vec(), &config).unwrap();
    assert_eq!(outcomes, vec![SubgoalOutcome::TimedOut]);
}

#[test]
fn loading_unknown_names_surfaces_not_found() {
    let dir = tempdir().unwrap();
    let config = RunConfig::default().learner_type("affine");
    let err = orchestrator::load_policies(
        &config,
        &["ghost-model".to_string()],
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, senda::Error::ModelNotFound { .. }));
}
