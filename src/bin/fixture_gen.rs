//! fixture-gen: writes the configured patients' sensor fixtures to disk

use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vitalsim_core::{ConfigLoader, FixtureWriter, PatientOrchestrator, PatientReport};

#[derive(Parser, Debug)]
#[command(name = "fixture-gen", version, about = "Generate misaligned multi-sensor patient fixtures")]
struct Cli {
    /// TOML configuration file; repeat to layer several, later files win
    #[arg(short, long = "config", value_name = "PATH")]
    configs: Vec<PathBuf>,

    /// Master seed, overrides the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Output directory, overrides the configuration
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Only generate these patients; repeatable
    #[arg(short, long = "patient", value_name = "ID")]
    patients: Vec<String>,

    /// Generate patients in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut loader = if cli.configs.is_empty() {
        ConfigLoader::new()
    } else {
        ConfigLoader::with_paths(cli.configs.clone())
    };
    let mut config = loader.load_fixture_config()?;

    if let Some(seed) = cli.seed {
        config.generation.seed = seed;
    }
    if let Some(output) = cli.output {
        config.generation.output_dir = output;
    }
    if cli.parallel {
        config.generation.parallel = true;
    }

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let writer = FixtureWriter::new(&config.generation.output_dir);
    let orchestrator = PatientOrchestrator::new(config)?;
    let started = Instant::now();

    let datasets = orchestrator.generate_selected(&cli.patients)?;
    let mut files = 0;
    for dataset in &datasets {
        let Some(profile) = orchestrator.config().patient(&dataset.patient_id) else {
            continue;
        };
        let report = PatientReport::from_profile(profile).with_dataset(dataset);
        report.log();

        let written = writer.write_dataset(dataset)?;
        files += written.len();

        println!("{}", "=".repeat(60));
        print!("{}", report);
        for file in &written {
            println!("  wrote {} ({} records)", file.path.display(), file.records);
        }
    }

    info!(
        patients = datasets.len(),
        files,
        output = %writer.output_dir().display(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "all patient data generated"
    );
    Ok(())
}
