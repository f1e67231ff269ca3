//! The demo models bundled into the binary and the `example` subcommands that use them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Every demo model, one per subdirectory
static DEMOS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// Each demo's description
const README_FILE_NAME: &str = "README.txt";

/// The available subcommands for managing example models.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List the bundled demo models.
    List,
    /// Describe a demo model.
    Info {
        /// The name of the demo.
        name: String,
    },
    /// Copy a demo model's input files to a new directory.
    Extract {
        /// The name of the demo.
        name: String,
        /// Where to put the files (defaults to a directory named after the demo).
        new_path: Option<PathBuf>,
    },
    /// Simulate a demo model.
    Run {
        /// The name of the demo.
        name: String,
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => {
                for name in demo_names() {
                    println!("{name}");
                }
            }
            Self::Info { name } => println!("{}", Demo::find(&name)?.readme()?),
            Self::Extract { name, new_path } => {
                let dest = new_path.unwrap_or_else(|| PathBuf::from(&name));
                Demo::find(&name)?.extract_to(&dest)?;
            }
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// Names of the bundled demos
fn demo_names() -> impl Iterator<Item = String> {
    DEMOS_DIR
        .dirs()
        .map(|dir| dir.path().display().to_string())
}

/// One bundled demo model
struct Demo(&'static Dir<'static>);

impl Demo {
    /// Look up a demo by name
    fn find(name: &str) -> Result<Self> {
        DEMOS_DIR
            .get_dir(name)
            .map(Self)
            .with_context(|| format!("No demo model called {name}"))
    }

    /// The demo's description
    fn readme(&self) -> Result<&'static str> {
        let path = self.0.path().join(README_FILE_NAME);
        DEMOS_DIR
            .get_file(&path)
            .context("Demo model has no description")?
            .contents_utf8()
            .with_context(|| format!("{README_FILE_NAME} is not UTF-8 encoded"))
    }

    /// Write the demo's input files to a new directory
    fn extract_to(&self, dest: &Path) -> Result<()> {
        ensure!(
            !dest.exists(),
            "Destination directory {} already exists",
            dest.display()
        );

        fs::create_dir(dest)?;
        for entry in self.0.entries() {
            let DirEntry::File(file) = entry else {
                bail!("Demo models cannot contain subdirectories");
            };
            let file_name = file.path().file_name().context("Invalid file name")?;
            fs::write(dest.join(file_name), file.contents())?;
        }

        Ok(())
    }
}

/// Handle the `example run` command.
///
/// The demo is extracted to a temporary directory which is removed once the run finishes.
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let demo = Demo::find(name)?;
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let model_path = temp_dir.path().join(name);
    demo.extract_to(&model_path)?;
    handle_run_command(&model_path, opts, settings)
}
