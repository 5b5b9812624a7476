//! CLI argument parsing using clap derive macros

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::build::matrix::{print_summary, Orchestrator};
use crate::build::{today, BuildTarget, Environment, RunOptions};
use crate::config::{BuildConfig, DEFAULT_CONFIG_FILE};
use crate::exec::SystemRunner;

/// Target selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    /// Flutter web (WebAssembly) build
    Web,
    /// macOS desktop app
    Mac,
    /// web, then mac
    All,
}

impl TargetArg {
    pub fn expand(self) -> Vec<BuildTarget> {
        match self {
            TargetArg::Web => vec![BuildTarget::Web],
            TargetArg::Mac => vec![BuildTarget::Mac],
            TargetArg::All => BuildTarget::ALL.to_vec(),
        }
    }
}

impl std::fmt::Display for TargetArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetArg::Web => write!(f, "web"),
            TargetArg::Mac => write!(f, "mac"),
            TargetArg::All => write!(f, "all"),
        }
    }
}

/// Environment selection on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EnvironmentArg {
    /// Public release channel
    Public,
    /// Internal test channel (TEST_FEATURES enabled)
    Test,
    /// public, then test
    All,
}

impl EnvironmentArg {
    pub fn expand(self) -> Vec<Environment> {
        match self {
            EnvironmentArg::Public => vec![Environment::Public],
            EnvironmentArg::Test => vec![Environment::Test],
            EnvironmentArg::All => Environment::ALL.to_vec(),
        }
    }
}

impl std::fmt::Display for EnvironmentArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentArg::Public => write!(f, "public"),
            EnvironmentArg::Test => write!(f, "test"),
            EnvironmentArg::All => write!(f, "all"),
        }
    }
}

/// DataView release builder
///
/// Builds, packages and optionally deploys the DataView web and macOS apps
/// for each requested environment.
#[derive(Parser, Debug)]
#[command(name = "dataview-build")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build target
    #[arg(value_enum, default_value_t = TargetArg::All)]
    pub target: TargetArg,

    /// Build environment
    #[arg(value_enum, default_value_t = EnvironmentArg::All)]
    pub environment: EnvironmentArg,

    /// Deploy after building
    #[arg(long)]
    pub deploy: bool,

    /// Nightly build: adds a -nightly suffix and leaves the `latest` marker alone
    #[arg(long)]
    pub nightly: bool,

    /// Build configuration file, relative to the project directory
    #[arg(long, env = "DATAVIEW_BUILD_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Flutter project directory
    #[arg(short = 'C', long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Cli {
    /// Immutable run parameters for this invocation
    pub fn run_options(&self, date: String) -> RunOptions {
        RunOptions {
            targets: self.target.expand(),
            environments: self.environment.expand(),
            deploy: self.deploy,
            nightly: self.nightly,
            date,
            project_root: self.project_dir.clone(),
            verbose: self.verbose,
        }
    }

    /// Execute the release run
    pub fn execute(self) -> Result<()> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let project_root = self.project_dir.canonicalize().with_context(|| {
            format!("Project directory not found: {}", self.project_dir.display())
        })?;

        let config = BuildConfig::load(project_root.join(&self.config))?;

        let mut options = self.run_options(today());
        options.project_root = project_root;

        let runner = SystemRunner::new(self.verbose);
        let summary = Orchestrator::new(&options, &config, &runner).run()?;
        print_summary(&summary, options.verbose);

        Ok(())
    }
}
