//! macOS platform builder
//!
//! Builds the release app bundle with Flutter and archives
//! `DataView.app` with its framework symlinks intact. Requires a macOS host.

use std::time::Instant;

use anyhow::{Context, Result};

use crate::build::archive::pack_directory;
use crate::build::flutter::{FlutterBuild, FlutterPlatform};
use crate::build::{BuildResult, JobContext, PlatformBuilder};
use crate::deploy::{publish_release, RsyncTransport};

/// App bundle produced by `flutter build macos --release`, relative to the project root
pub const APP_BUNDLE_PATH: &str = "build/macos/Build/Products/Release/DataView.app";

/// macOS platform builder
pub struct MacosBuilder;

impl MacosBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformBuilder for MacosBuilder {
    fn platform_name(&self) -> &str {
        "macos"
    }

    fn supports_host(&self, host_os: &str) -> bool {
        // Xcode is required
        host_os == "macos"
    }

    fn build(&self, ctx: &JobContext<'_>) -> Result<BuildResult> {
        let start = Instant::now();
        let version = ctx.job.version();

        let flutter = FlutterBuild::new(ctx.project_root.to_path_buf(), FlutterPlatform::Macos)
            .release()
            .defines(&ctx.settings.defines);
        ctx.runner
            .run_checked(&flutter.invocation())
            .with_context(|| format!("Flutter macOS build failed for {}", version))?;

        let archive = ctx.archive_path();
        pack_directory(&ctx.project_root.join(APP_BUNDLE_PATH), &archive)?;

        let mut latest_marker_written = false;
        if let Some(deploy) = &ctx.settings.deploy {
            let transport = RsyncTransport::new(ctx.runner);
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
