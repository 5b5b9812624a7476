//! Release build orchestration
//!
//! ## Architecture
//!
//! ```text
//! cli → matrix::Orchestrator → platforms/<target>.rs → flutter / archive / deploy
//! ```
//!
//! ## Modules
//!
//! - `matrix` - expands targets × environments and runs one job per cell
//! - `platforms` - per-target build procedures (web, macos)
//! - `flutter` - `flutter build` command lines
//! - `archive` - ZIP packaging of build output

pub mod archive;
pub mod flutter;
pub mod matrix;
pub mod platforms;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::BuildConfig;
use crate::error::ReleaseError;
use crate::exec::CommandRunner;

/// Application name, first component of every version string
pub const APP_NAME: &str = "dataview";

/// Suffix appended to nightly version strings
pub const NIGHTLY_SUFFIX: &str = "-nightly";

/// Platform/output kind to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTarget {
    Web,
    Mac,
}

impl BuildTarget {
    /// Canonical order used when every target is requested
    pub const ALL: [BuildTarget; 2] = [BuildTarget::Web, BuildTarget::Mac];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildTarget::Web => "web",
            BuildTarget::Mac => "mac",
        }
    }
}

impl std::fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Public,
    Test,
}

impl Environment {
    /// Canonical order used when every environment is requested
    pub const ALL: [Environment; 2] = [Environment::Public, Environment::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Public => "public",
            Environment::Test => "test",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a whole run, fixed at startup
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Targets in build order
    pub targets: Vec<BuildTarget>,
    /// Environments in build order
    pub environments: Vec<Environment>,
    /// Publish archives and the web build after packing
    pub deploy: bool,
    /// Nightly build: suffixed versions, `latest` marker left alone
    pub nightly: bool,
    /// Run date, `YYYY.MM.DD`
    pub date: String,
    /// Project root (build tool working directory, `build/` parent)
    pub project_root: PathBuf,
    /// Verbose output
    pub verbose: bool,
}

impl RunOptions {
    /// Expand the matrix: targets outer, environments inner, caller order
    pub fn jobs(&self) -> Vec<BuildJob> {
        self.targets
            .iter()
            .flat_map(|&target| {
                self.environments
                    .iter()
                    .map(move |&env| BuildJob::new(target, env, self.date.clone(), self.nightly))
            })
            .collect()
    }
}

/// Today's date in the version-string format
pub fn today() -> String {
    chrono::Local::now().format("%Y.%m.%d").to_string()
}

/// One (target, environment) cell of the matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
    pub target: BuildTarget,
    pub environment: Environment,
    pub date: String,
    pub nightly: bool,
}

impl BuildJob {
    pub fn new(
        target: BuildTarget,
        environment: Environment,
        date: impl Into<String>,
        nightly: bool,
    ) -> Self {
        Self {
            target,
            environment,
            date: date.into(),
            nightly,
        }
    }

    /// `dataview-<target>-<environment>-<date>[-nightly]`
    pub fn version(&self) -> String {
        format!(
            "{}-{}-{}-{}{}",
            APP_NAME,
            self.target,
            self.environment,
            self.date,
            if self.nightly { NIGHTLY_SUFFIX } else { "" }
        )
    }

    /// Look up this job's configured defines and merge them
    pub fn resolve_defines(
        &self,
        config: &BuildConfig,
    ) -> Result<BTreeMap<String, String>, ReleaseError> {
        Ok(self.dart_defines(&config.defines(self.environment)?))
    }

    /// Build-time defines for this job
    ///
    /// `BUILD_DATE` and `VERSION_NAME` first, then the environment's
    /// configured defines (which may override them), then `TEST_FEATURES`
    /// forced on for the test environment.
    pub fn dart_defines(&self, configured: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let mut defines = BTreeMap::new();
        defines.insert("BUILD_DATE".to_string(), self.date.clone());
        defines.insert("VERSION_NAME".to_string(), self.version());
        defines.extend(configured.iter().map(|(k, v)| (k.clone(), v.clone())));
        if self.environment == Environment::Test {
            defines.insert("TEST_FEATURES".to_string(), "true".to_string());
        }
        defines
    }
}

/// Remote destinations of one job, present only when deploying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTarget {
    /// Archives and the `latest` marker go here
    pub public_dir: String,
    /// Web build mirror destination (web only)
    pub deploy_path: Option<String>,
}

/// Configuration of one job, resolved before any tool runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Merged build-time defines
    pub defines: BTreeMap<String, String>,
    /// Raw web base path (web only)
    pub base_href: Option<String>,
    pub deploy: Option<DeployTarget>,
}

impl JobSettings {
    /// Look up the remaining entries `job` will need, failing on the first
    /// absent one
    pub fn resolve(
        config: &BuildConfig,
        job: &BuildJob,
        defines: BTreeMap<String, String>,
        deploy: bool,
    ) -> Result<Self, ReleaseError> {
        let env = job.environment;
        let is_web = job.target == BuildTarget::Web;

        let base_href = if is_web {
            Some(config.base(env)?.to_string())
        } else {
            None
        };

        let deploy = if deploy {
            Some(DeployTarget {
                public_dir: config.public_dir(env)?.to_string(),
                deploy_path: if is_web {
                    Some(config.deploy_path(env)?.to_string())
                } else {
                    None
                },
            })
        } else {
            None
        };

        Ok(Self {
            defines,
            base_href,
            deploy,
        })
    }
}

/// Everything a platform builder needs for one job
pub struct JobContext<'a> {
    pub job: &'a BuildJob,
    pub settings: &'a JobSettings,
    pub runner: &'a dyn CommandRunner,
    pub project_root: &'a Path,
}

impl JobContext<'_> {
    /// `build/<version>.zip`
    pub fn archive_path(&self) -> PathBuf {
        crate::utils::paths::get_archive_path(self.project_root, &self.job.version())
    }
}

/// Trait for platform-specific build procedures
pub trait PlatformBuilder {
    /// Get the platform name
    fn platform_name(&self) -> &str;

    /// Whether artifacts for this platform can be produced on `host_os`
    /// (a `std::env::consts::OS` value)
    fn supports_host(&self, host_os: &str) -> bool;

    /// Build, archive and (when configured) deploy one job
    fn build(&self, ctx: &JobContext<'_>) -> Result<BuildResult>;
}

/// Result of a successful job
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub version: String,
    /// Path to the release archive
    pub archive: PathBuf,
    /// Whether anything was sent to a remote host
    pub deployed: bool,
    /// Whether the `latest` marker was rewritten
    pub latest_marker_written: bool,
    /// Build duration in seconds
    pub duration_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(targets: Vec<BuildTarget>, environments: Vec<Environment>) -> RunOptions {
        RunOptions {
            targets,
            environments,
            deploy: false,
            nightly: false,
            date: "2024.06.01".to_string(),
            project_root: PathBuf::from("."),
            verbose: false,
        }
    }

    #[test]
    fn test_matrix_order_targets_outer() {
        let jobs = options(BuildTarget::ALL.to_vec(), Environment::ALL.to_vec()).jobs();
        let cells: Vec<(BuildTarget, Environment)> =
            jobs.iter().map(|j| (j.target, j.environment)).collect();
        assert_eq!(
            cells,
            vec![
                (BuildTarget::Web, Environment::Public),
                (BuildTarget::Web, Environment::Test),
                (BuildTarget::Mac, Environment::Public),
                (BuildTarget::Mac, Environment::Test),
            ]
        );
    }

    #[test]
    fn test_matrix_keeps_caller_order() {
        let jobs = options(
            vec![BuildTarget::Mac, BuildTarget::Web],
            vec![Environment::Test],
        )
        .jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].target, BuildTarget::Mac);
        assert_eq!(jobs[1].target, BuildTarget::Web);
    }

    #[test]
    fn test_version_string() {
        let job = BuildJob::new(BuildTarget::Web, Environment::Public, "2024.06.01", false);
        assert_eq!(job.version(), "dataview-web-public-2024.06.01");

        let nightly = BuildJob::new(BuildTarget::Mac, Environment::Test, "2024.06.01", true);
        assert_eq!(nightly.version(), "dataview-mac-test-2024.06.01-nightly");
    }

    #[test]
    fn test_dart_defines_merge() {
        let mut configured = BTreeMap::new();
        configured.insert("API_URL".to_string(), "https://x".to_string());
        configured.insert("BUILD_DATE".to_string(), "override".to_string());
        configured.insert("TEST_FEATURES".to_string(), "false".to_string());

        let public = BuildJob::new(BuildTarget::Web, Environment::Public, "2024.06.01", false)
            .dart_defines(&configured);
        assert_eq!(public["BUILD_DATE"], "override");
        assert_eq!(public["VERSION_NAME"], "dataview-web-public-2024.06.01");
        assert_eq!(public["TEST_FEATURES"], "false");

        let test = BuildJob::new(BuildTarget::Web, Environment::Test, "2024.06.01", false)
            .dart_defines(&configured);
        assert_eq!(test["TEST_FEATURES"], "true");
        assert_eq!(test["API_URL"], "https://x");
    }

    #[test]
    fn test_resolve_settings_per_target() {
        let config = BuildConfig::parse(
            "dart_define:\n  public: {}\nbase:\n  public: app\npublic_dir:\n  public: h:/pub/\n",
        )
        .unwrap();

        let mac = BuildJob::new(BuildTarget::Mac, Environment::Public, "d", false);
        let defines = mac.resolve_defines(&config).unwrap();
        assert_eq!(defines["VERSION_NAME"], "dataview-mac-public-d");
        let settings = JobSettings::resolve(&config, &mac, defines, true).unwrap();
        assert_eq!(settings.base_href, None);
        assert_eq!(
            settings.deploy,
            Some(DeployTarget {
                public_dir: "h:/pub/".to_string(),
                deploy_path: None
            })
        );

        // web + deploy additionally needs deploy_path
        let web = BuildJob::new(BuildTarget::Web, Environment::Public, "d", false);
        assert!(matches!(
            JobSettings::resolve(&config, &web, BTreeMap::new(), true),
            Err(ReleaseError::MissingKey { ref purpose, .. }) if purpose == "deploy_path"
        ));
        let settings = JobSettings::resolve(&config, &web, BTreeMap::new(), false).unwrap();
        assert_eq!(settings.base_href.as_deref(), Some("app"));
        assert!(settings.deploy.is_none());
    }
}
