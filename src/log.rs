//! Logging for simulation runs, built on `fern`.
//!
//! Progress messages go to stdout and warnings and errors to stderr, coloured when the stream is a
//! terminal. When a run has an output directory, the same messages are also kept in two plain-text
//! files there: one for progress and one for problems.
//!
//! The level comes from the `ENDUSE_DEMAND_LOG_LEVEL` environment variable if set, otherwise from
//! `settings.toml`, otherwise [`DEFAULT_LOG_LEVEL`]. Valid levels are `off`, `error`, `warn`,
//! `info`, `debug` and `trace`, in any case.
use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{Level, LevelFilter, Metadata, Record};
use std::env;
use std::fmt::Arguments;
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::OnceLock;

/// Set once a logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The log level used when neither the environment nor the settings file gives one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable for overriding the log level
const LOG_LEVEL_ENV_VAR: &str = "ENDUSE_DEMAND_LOG_LEVEL";

/// Log file for progress messages
const LOG_INFO_FILE_NAME: &str = "enduse_demand_info.log";

/// Log file for warnings and errors
const LOG_ERROR_FILE_NAME: &str = "enduse_demand_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// # Arguments
///
/// * `log_level_from_settings` - The log level given in `settings.toml`, if any
/// * `log_dir` - Directory to write log files to, or `None` to log to the console only
pub fn init(log_level_from_settings: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let level = resolve_log_level(env::var(LOG_LEVEL_ENV_VAR).ok(), log_level_from_settings)?;

    let mut dispatch = Dispatch::new()
        .chain(
            output(Style::for_stream(io::stdout().is_terminal()), level)
                .filter(is_progress)
                .chain(io::stdout()),
        )
        .chain(
            output(
                Style::for_stream(io::stderr().is_terminal()),
                level.min(LevelFilter::Warn),
            )
            .chain(io::stderr()),
        );

    if let Some(dir) = log_dir {
        // Files always record progress, even when the console is quieter
        dispatch = dispatch
            .chain(
                output(Style::Plain, level.max(LevelFilter::Info))
                    .filter(is_progress)
                    .chain(create_log_file(dir, LOG_INFO_FILE_NAME)?),
            )
            .chain(
                output(Style::Plain, LevelFilter::Warn)
                    .chain(create_log_file(dir, LOG_ERROR_FILE_NAME)?),
            );
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// Pick the log level: the environment overrides the settings file, which overrides the default
fn resolve_log_level(from_env: Option<String>, from_settings: Option<&str>) -> Result<LevelFilter> {
    let level = from_env
        .as_deref()
        .or(from_settings)
        .unwrap_or(DEFAULT_LOG_LEVEL);
    level
        .parse()
        .ok()
        .with_context(|| format!("Unknown log level: {level}"))
}

/// Whether a message reports normal progress rather than a problem
fn is_progress(metadata: &Metadata) -> bool {
    metadata.level() > Level::Warn
}

/// How log lines are rendered on one output
#[derive(Clone, Copy)]
enum Style {
    Plain,
    Coloured(ColoredLevelConfig),
}

impl Style {
    /// Colour the level only if the stream is a terminal
    fn for_stream(is_terminal: bool) -> Self {
        if !is_terminal {
            return Self::Plain;
        }

        Self::Coloured(
            ColoredLevelConfig::new()
                .error(Color::Red)
                .warn(Color::Yellow)
                .info(Color::Green)
                .debug(Color::Blue)
                .trace(Color::Magenta),
        )
    }

    /// Write a message as `[time level target] message`
    fn write(self, out: FormatCallback, message: &Arguments, record: &Record) {
        let timestamp = Local::now().format("%H:%M:%S");
        let target = record.target();
        match self {
            Self::Plain => out.finish(format_args!(
                "[{timestamp} {} {target}] {message}",
                record.level()
            )),
            Self::Coloured(colours) => out.finish(format_args!(
                "[{timestamp} {} {target}] {message}",
                colours.color(record.level())
            )),
        }
    }
}

/// A dispatch for one output with the given style and maximum level
fn output(style: Style, level: LevelFilter) -> Dispatch {
    Dispatch::new()
        .format(move |out, message, record| style.write(out, message, record))
        .level(level)
}

/// Create a log file in `dir`, replacing one left by an earlier run
fn create_log_file(dir: &Path, file_name: &str) -> Result<File> {
    let path = dir.join(file_name);
    File::create(&path).with_context(|| format!("Could not create log file {}", path.display()))
}
