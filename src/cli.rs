//! Command-line entry points: run or validate a demand model, or work with the bundled demos.
use crate::input::load_model;
use crate::log;
use crate::output::{create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::simulation;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// Simulate annual and hourly end-use energy demand.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by `run` and `example run`
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files (defaults to one named after the model)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Replace the contents of the output directory if it is not empty
    #[arg(long)]
    pub overwrite: bool,
    /// Also write the hourly demand of every output key
    #[arg(long)]
    pub debug_model: bool,
}

impl RunOpts {
    /// Switch on the settings requested on the command line
    fn apply_to(&self, settings: &mut Settings) {
        settings.overwrite |= self.overwrite;
        settings.debug_model |= self.debug_model;
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate demand for every region and year of a model.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Validate a model's input files without simulating it.
    Validate {
        /// Path to the model directory.
        model_dir: PathBuf,
    },
    /// List, inspect, extract or run the bundled demo models.
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Manage the program settings file.
    Settings {
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

/// Parse CLI arguments and run the requested command, printing help if there is none
pub fn run_cli() -> Result<()> {
    let Some(command) = Cli::parse().command else {
        println!("{}", Cli::command().render_long_help());
        return Ok(());
    };

    match command {
        Commands::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
        Commands::Validate { model_dir } => handle_validate_command(&model_dir, None),
        Commands::Example { subcommand } => subcommand.execute(),
        Commands::Settings { subcommand } => subcommand.execute(),
    }
}

/// Use the given settings, or read them from the settings file
fn settings_or_load(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
///
/// Log files are written to the output directory, so the logger starts only once that exists.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let mut settings = settings_or_load(settings)?;
    opts.apply_to(&mut settings);

    let output_path = match &opts.output_dir {
        Some(dir) => dir.clone(),
        None => get_output_dir(model_path)?,
    };
    let overwritten = create_output_directory(&output_path, settings.overwrite)
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                output_path.display()
            )
        })?;

    log::init(Some(&settings.log_level), Some(&output_path))
        .context("Failed to initialise logging.")?;
    if overwritten {
        warn!("Overwriting output folder {}", output_path.display());
    }

    let model = load_model(model_path).context("Failed to load model.")?;
    info!(
        "Loaded model from {} ({} regions, {} end uses)",
        model_path.display(),
        model.regions.len(),
        model.enduses.len()
    );
    info!("Writing results to {}", output_path.display());

    simulation::run(&model, &output_path, settings.debug_model)?;
    info!("Simulation complete!");

    Ok(())
}

/// Handle the `validate` command, which logs to the console only.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = settings_or_load(settings)?;
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    let model = load_model(model_path).context("Failed to validate model.")?;
    info!(
        "Model is valid: {} regions, {} end uses, {} technologies",
        model.regions.len(),
        model.enduses.len(),
        model.technologies.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, false, false, false)]
    #[case(true, false, true, false)]
    #[case(false, true, false, true)]
    fn test_run_opts_apply_to(
        #[case] overwrite: bool,
        #[case] debug_model: bool,
        #[case] expected_overwrite: bool,
        #[case] expected_debug_model: bool,
    ) {
        let opts = RunOpts {
            output_dir: None,
            overwrite,
            debug_model,
        };
        let mut settings = Settings::default();
        opts.apply_to(&mut settings);
        assert_eq!(settings.overwrite, expected_overwrite);
        assert_eq!(settings.debug_model, expected_debug_model);
    }

    #[test]
    fn test_run_opts_keep_settings_file_choices() {
        let opts = RunOpts {
            output_dir: None,
            overwrite: false,
            debug_model: false,
        };
        let mut settings = Settings {
            overwrite: true,
            debug_model: true,
            ..Settings::default()
        };
        opts.apply_to(&mut settings);
        assert!(settings.overwrite && settings.debug_model);
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
