//! Motus CLI
//!
//! Plays animation choreographies headlessly at a fixed frame rate and
//! reports sampled field values, markers and expectation results as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use motus_cli::{run, Choreography, RunConfig, SAMPLE_CHOREOGRAPHY};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "motus")]
#[command(about = "Tween and timeline choreographies, played headlessly")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a choreography and print the report
    Run {
        /// Choreography file
        #[arg(default_value = "choreography.toml")]
        path: PathBuf,

        /// Override frames per second
        #[arg(long)]
        fps: Option<u32>,

        /// Override playback length in seconds
        #[arg(long)]
        seconds: Option<f32>,

        /// Override the sampling interval in frames
        #[arg(long)]
        sample_every: Option<u32>,

        /// Write the report to this relative path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a choreography without playing it
    Check {
        #[arg(default_value = "choreography.toml")]
        path: PathBuf,
    },

    /// Write a sample choreography
    Init {
        #[arg(default_value = "choreography.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            path,
            fps,
            seconds,
            sample_every,
            output,
        } => {
            let choreo = Choreography::load(&path)?;
            let settings = RunConfig {
                fps: fps.unwrap_or(choreo.run.fps),
                seconds: seconds.unwrap_or(choreo.run.seconds),
                sample_every: sample_every.unwrap_or(choreo.run.sample_every),
            };
            let report = run(&choreo, settings)?;

            match output {
                Some(output) => {
                    report.write_to_path(&output)?;
                    info!("Report written to {}", output.display());
                }
                None => report.write_to_writer(&mut io::stdout().lock())?,
            }

            if report.is_failed() {
                bail!(
                    "{} of {} expectations failed",
                    report.failures().count(),
                    report.expectations.len()
                );
            }
        }
        Commands::Check { path } => check(&path)?,
        Commands::Init { path, force } => init(&path, force)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn check(path: &Path) -> Result<()> {
    let choreo = Choreography::load(path)?;
    // Zero seconds installs everything without advancing the clock
    let settings = RunConfig {
        seconds: 0.0,
        sample_every: 0,
        ..choreo.run
    };
    run(&choreo, settings).with_context(|| format!("{} is not playable", path.display()))?;
    info!(
        "{} is valid ({} animations)",
        path.display(),
        choreo.animation_count()
    );
    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, SAMPLE_CHOREOGRAPHY)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Created {}", path.display());
    Ok(())
}
