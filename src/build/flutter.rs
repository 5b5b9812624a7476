//! Flutter build invocation
//!
//! This module renders `flutter build` command lines for the release
//! targets. It does not inspect the Flutter SDK; the tool's own exit status
//! decides success.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::exec::Invocation;

/// `flutter build` subcommand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlutterPlatform {
    Web,
    Macos,
}

impl std::fmt::Display for FlutterPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlutterPlatform::Web => write!(f, "web"),
            FlutterPlatform::Macos => write!(f, "macos"),
        }
    }
}

/// Flutter build configuration builder
#[derive(Debug)]
pub struct FlutterBuild {
    /// Project directory (where pubspec.yaml is located)
    project_dir: PathBuf,
    platform: FlutterPlatform,
    release: bool,
    /// Compile to WebAssembly (web only)
    wasm: bool,
    /// Emit source maps (web only)
    source_maps: bool,
    /// `--dart-define` pairs
    defines: BTreeMap<String, String>,
    /// `--base-href` (web only)
    base_href: Option<String>,
}

impl FlutterBuild {
    /// Create a new build for a platform
    pub fn new(project_dir: PathBuf, platform: FlutterPlatform) -> Self {
        Self {
            project_dir,
            platform,
            release: false,
            wasm: false,
            source_maps: false,
            defines: BTreeMap::new(),
            base_href: None,
        }
    }

    pub fn release(mut self) -> Self {
        self.release = true;
        self
    }

    pub fn wasm(mut self) -> Self {
        self.wasm = true;
        self
    }

    pub fn source_maps(mut self) -> Self {
        self.source_maps = true;
        self
    }

    /// Add build-time defines
    pub fn defines(mut self, defines: &BTreeMap<String, String>) -> Self {
        self.defines
            .extend(defines.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn base_href(mut self, base: impl Into<String>) -> Self {
        self.base_href = Some(base.into());
        self
    }

    /// Render the command line
    pub fn invocation(&self) -> Invocation {
        let mut inv = Invocation::new("flutter")
            .arg("build")
            .arg(self.platform.to_string())
            .current_dir(self.project_dir.clone());

        if self.release {
            inv = inv.arg("--release");
        }
        if self.wasm {
            inv = inv.arg("--wasm");
        }
        if self.source_maps {
            inv = inv.arg("--source-maps");
        }
        inv = inv.args(format_dart_defines(&self.defines));
        if let Some(base) = &self.base_href {
            inv = inv.arg("--base-href").arg(base.clone());
        }

        inv
    }
}

/// Render `--dart-define=KEY=VALUE` arguments
pub fn format_dart_defines(defines: &BTreeMap<String, String>) -> Vec<String> {
    defines
        .iter()
        .map(|(k, v)| format!("--dart-define={}={}", k, v))
        .collect()
}

/// Normalize a web base path
///
/// `/` stays as is; anything else gets exactly one leading and one trailing
/// slash (`app` and `/app/` both become `/app/`).
pub fn normalize_base_href(base: &str) -> String {
    if base == "/" {
        return base.to_string();
    }
    format!("/{}/", base.trim_matches('/'))
}
