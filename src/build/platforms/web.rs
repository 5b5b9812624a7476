//! Web platform builder
//!
//! Builds the WebAssembly release with source maps under `build/web`,
//! archives it, and on deploy mirrors the tree to the web host before
//! publishing the archive.

use std::time::Instant;

use anyhow::{Context, Result};

use crate::build::archive::pack_directory;
use crate::build::flutter::{normalize_base_href, FlutterBuild, FlutterPlatform};
use crate::build::{BuildResult, JobContext, PlatformBuilder};
use crate::config::build_config::{PURPOSE_BASE, PURPOSE_DEPLOY_PATH};
use crate::deploy::{publish_release, RsyncTransport};
use crate::error::ReleaseError;
use crate::utils::paths::get_build_dir;
use crate::utils::terminal::print_highlight;

/// Output directory of `flutter build web`, relative to `build/`
pub const WEB_OUTPUT_DIR: &str = "web";

/// Web platform builder
pub struct WebBuilder;

impl WebBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformBuilder for WebBuilder {
    fn platform_name(&self) -> &str {
        "web"
    }

    fn supports_host(&self, _host_os: &str) -> bool {
        true
    }

    fn build(&self, ctx: &JobContext<'_>) -> Result<BuildResult> {
        let start = Instant::now();
        let version = ctx.job.version();
        let env = ctx.job.environment;

        let raw_base = ctx
            .settings
            .base_href
            .as_deref()
            .ok_or_else(|| ReleaseError::missing_key(PURPOSE_BASE, env.as_str()))?;
        let base_href = normalize_base_href(raw_base);

        let flutter = FlutterBuild::new(ctx.project_root.to_path_buf(), FlutterPlatform::Web)
            .release()
            .wasm()
            .source_maps()
            .defines(&ctx.settings.defines)
            .base_href(base_href);
        ctx.runner
            .run_checked(&flutter.invocation())
            .with_context(|| format!("Flutter web build failed for {}", version))?;

        let output_dir = get_build_dir(ctx.project_root).join(WEB_OUTPUT_DIR);
        let archive = ctx.archive_path();
        pack_directory(&output_dir, &archive)?;

        let mut latest_marker_written = false;
        if let Some(deploy) = &ctx.settings.deploy {
            let deploy_path = deploy
                .deploy_path
                .as_deref()
                .ok_or_else(|| ReleaseError::missing_key(PURPOSE_DEPLOY_PATH, env.as_str()))?;
            let transport = RsyncTransport::new(ctx.runner);

            print_highlight(&format!("deploying {}", version));
            transport.mirror_directory(&output_dir, deploy_path)?;

            latest_marker_written =
                publish_release(&transport, &archive, &deploy.public_dir, ctx.job)?;
        }

        Ok(BuildResult {
            version,
            archive,
            deployed: ctx.settings.deploy.is_some(),
            latest_marker_written,
            duration_secs: start.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{BuildJob, BuildTarget, DeployTarget, Environment, JobSettings};
    use crate::exec::fake::FakeRunner;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn settings(base: &str, deploy: Option<DeployTarget>) -> JobSettings {
        JobSettings {
            defines: BTreeMap::new(),
            base_href: Some(base.to_string()),
            deploy,
        }
    }

    #[test]
    fn test_build_without_deploy() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let job = BuildJob::new(BuildTarget::Web, Environment::Public, "2024.06.01", false);
        let settings = settings("app", None);
        let ctx = JobContext {
            job: &job,
            settings: &settings,
            runner: &runner,
            project_root: temp.path(),
        };

        let result = WebBuilder::new().build(&ctx).unwrap();

        assert_eq!(
            result.archive,
            temp.path().join("build/dataview-web-public-2024.06.01.zip")
        );
        assert!(result.archive.exists());
        assert!(!result.deployed);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let args = &calls[0].args;
        let base_pos = args.iter().position(|a| a == "--base-href").unwrap();
        assert_eq!(args[base_pos + 1], "/app/");
    }

    #[test]
    fn test_deploy_mirrors_then_publishes() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new();
        let job = BuildJob::new(BuildTarget::Web, Environment::Test, "2024.06.01", false);
        let settings = settings(
            "/",
            Some(DeployTarget {
                public_dir: "h:/pub/".to_string(),
                deploy_path: Some("h:/www/".to_string()),
            }),
        );
        let ctx = JobContext {
            job: &job,
            settings: &settings,
            runner: &runner,
            project_root: temp.path(),
        };

        let result = WebBuilder::new().build(&ctx).unwrap();
        assert!(result.deployed);
        assert!(result.latest_marker_written);

        let rsync = runner.calls_to("rsync");
        assert_eq!(rsync.len(), 3);
        assert!(rsync[0].args.contains(&"--delete".to_string()));
        assert_eq!(rsync[0].args.last().unwrap(), "h:/www/");
        assert!(rsync[1].args[1].ends_with("dataview-web-test-2024.06.01.zip"));
        assert!(rsync[2].args[1].ends_with("/latest"));
    }

    #[test]
    fn test_failed_flutter_build_stops_before_archive() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::failing("flutter", 1);
        let job = BuildJob::new(BuildTarget::Web, Environment::Public, "2024.06.01", false);
        let settings = settings("/", None);
        let ctx = JobContext {
            job: &job,
            settings: &settings,
            runner: &runner,
            project_root: temp.path(),
        };

        assert!(WebBuilder::new().build(&ctx).is_err());
        assert!(!ctx.archive_path().exists());
    }
}
