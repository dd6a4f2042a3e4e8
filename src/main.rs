//! Senda CLI
//!
//! Config-driven entry point for waypoint policy training and playback
//! preparation.
//!
//! # Usage
//!
//! ```bash
//! # Train one policy per subgoal
//! senda --config run.json
//!
//! # With model_names/model_dir set in the config, skip training and
//! # assemble the playback plan from persisted models
//! senda --config playback.json
//! ```

use clap::Parser;
use senda::data::DemoDataset;
use senda::orchestrator::{self, SubgoalOutcome};
use senda::{Error, Result, RunConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "senda", about = "Waypoint dynamical-system policy training")]
struct Cli {
    /// Path to the JSON run configuration
    #[arg(long)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = RunConfig::from_file(&cli.config)?;

    let data_path = config
        .data_dir
        .as_ref()
        .ok_or_else(|| Error::Config("data_dir is required".to_string()))?;
    let dataset = DemoDataset::from_file(data_path)?;

    let demo = config
        .demos
        .first()
        .ok_or_else(|| Error::Config("demos must name at least one demo".to_string()))?;
    let subgoals = dataset.all_subgoals(demo)?;
    orchestrator::check_alignment(&subgoals)?;
    println!("loaded demo '{demo}' with {} subgoals from {}", subgoals.len(), data_path.display());

    if config.load_mode() {
        let names = config.model_names.clone().unwrap_or_default();
        let dir = config.model_dir.clone().unwrap_or_default();
        if names.len() != subgoals.len() {
            return Err(Error::Config(format!(
                "{} model names for {} subgoals",
                names.len(),
                subgoals.len()
            )));
        }

        let policies = orchestrator::load_policies(&config, &names, &dir)?;
        let plan = orchestrator::playback_plan(&subgoals, policies)?;
        for (i, descriptor) in plan.descriptors.iter().enumerate() {
            println!(
                "subgoal {i}: position {:?}, gripper {}",
                descriptor.position.to_vec(),
                descriptor.gripper
            );
        }
        if config.playback {
            println!(
                "playback plan ready: {} subgoals, handing off to the simulation driver",
                plan.len()
            );
        }
        return Ok(());
    }

    let outcomes = orchestrator::train_subgoals(&subgoals, &config)?;
    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            SubgoalOutcome::Trained { model_name } => {
                println!("subgoal {i}: saved '{model_name}' under {}", config.save_dir.display());
            }
            SubgoalOutcome::TimedOut => {
                println!("subgoal {i}: timed out, no model persisted");
            }
            SubgoalOutcome::Failed { reason } => {
                println!("subgoal {i}: failed ({reason})");
            }
        }
    }

    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            SubgoalOutcome::Trained { .. } => {}
            SubgoalOutcome::TimedOut => {
                return Err(Error::WorkerTimeout {
                    subgoal: i,
                    timeout_secs: config.worker_timeout_secs,
                })
            }
            SubgoalOutcome::Failed { reason } => {
                return Err(Error::Config(format!("subgoal {i} failed: {reason}")))
            }
        }
    }
    Ok(())
}
