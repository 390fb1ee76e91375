//! Participant config CLI.
//!
//! Commands:
//! - generate: Write one config file per participant
//! - show: Print the design and planned assignments without writing
//! - verify: Re-read a config directory and check every file

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use participant_config::design::LatinSquare;
use participant_config::manifest::{BalanceSummary, StudyManifest};
use participant_config::reader::verify_dir;
use participant_config::writer::DEFAULT_CONFIG_DIR;
use participant_config::{generate_study, GeneratorConfig, StudyPlan, TaskSetting, TrafficRandomizer};

#[derive(Parser)]
#[command(name = "participant-config")]
#[command(version)]
#[command(about = "Counterbalanced participant configs for interruption studies")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate config files for every participant
    Generate {
        /// Output directory (created if missing)
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: PathBuf,

        /// Random seed for traffic orders
        #[arg(long)]
        seed: Option<u64>,

        /// Also write a JSON manifest of the study to this path
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Print the Latin square design and planned assignments
    Show {
        /// Random seed for traffic orders
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check every config file in a directory
    Verify {
        /// Directory holding ExperimentConfig_*.ini files
        #[arg(long, default_value = DEFAULT_CONFIG_DIR)]
        config_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Generate {
            config_dir,
            seed,
            manifest,
        } => {
            let config = GeneratorConfig { config_dir, seed };
            let plan = generate_study(&config)?;

            if let Some(path) = manifest {
                StudyManifest::from_plan(&plan, seed).save(&path)?;
                info!(path = %path.display(), "Saved study manifest");
            }

            println!(
                "Wrote {} participant configs to {}",
                plan.len(),
                config.config_dir.display()
            );
        }

        Commands::Show { seed } => {
            let square = LatinSquare::cyclic(TaskSetting::ALL.len());
            println!("{}", square);
            println!("Transposed:\n{}", square.transpose());

            let plan = StudyPlan::build(&mut TrafficRandomizer::new(seed))?;
            println!("{}", plan);
        }

        Commands::Verify { config_dir } => {
            let assignments = verify_dir(&config_dir)?;
            if assignments.is_empty() {
                bail!("No participant configs found in {}", config_dir.display());
            }

            let summary = BalanceSummary::compute(&assignments);
            println!("\n=== Verified {} participant configs ===", summary.participants);
            for (paradigm, count) in &summary.per_paradigm {
                println!("  {}: {}", paradigm, count);
            }
            if summary.is_position_balanced() {
                println!("Task positions balanced: yes");
            } else {
                warn!("Task settings do not occupy block positions equally often");
                println!("Task positions balanced: no");
            }
        }
    }

    Ok(())
}
