//! build_config.yaml parsing
//!
//! Every top-level section is keyed by environment:
//!
//! ```yaml
//! dart_define:
//!   public:
//!     API_URL: https://api.example.com
//!     ANALYTICS: true
//!   test:
//!     API_URL: https://staging.example.com
//! base:
//!   public: /
//!   test: preview
//! public_dir:
//!   public: deploy@host:/srv/releases/public/
//! deploy_path:
//!   public: deploy@host:/srv/www/dataview/
//! ```
//!
//! Nothing is validated up front: a missing file or section only fails once
//! a matrix cell actually needs the entry.

use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::build::Environment;
use crate::error::{hints, ReleaseError};
use crate::utils::terminal::print_warning;

pub const PURPOSE_DART_DEFINE: &str = "dart_define";
pub const PURPOSE_BASE: &str = "base";
pub const PURPOSE_PUBLIC_DIR: &str = "public_dir";
pub const PURPOSE_DEPLOY_PATH: &str = "deploy_path";

/// Default configuration file name, relative to the project directory
pub const DEFAULT_CONFIG_FILE: &str = "build_config.yaml";

/// Root of build_config.yaml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Build-time defines per environment
    #[serde(default)]
    pub dart_define: BTreeMap<String, BTreeMap<String, DefineValue>>,

    /// Web base path per environment
    #[serde(default)]
    pub base: BTreeMap<String, String>,

    /// Remote destination for archives and the `latest` marker
    #[serde(default)]
    pub public_dir: BTreeMap<String, String>,

    /// Remote destination for the mirrored web build
    #[serde(default)]
    pub deploy_path: BTreeMap<String, String>,
}

/// A scalar define value as written in YAML
///
/// Numbers stay [`serde_yaml_ng::Number`] so `1.0` renders as `1.0`, not `1`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DefineValue {
    Bool(bool),
    Number(serde_yaml_ng::Number),
    Text(String),
}

impl fmt::Display for DefineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefineValue::Bool(b) => write!(f, "{}", b),
            DefineValue::Number(n) => write!(f, "{}", n),
            DefineValue::Text(s) => f.write_str(s),
        }
    }
}

impl BuildConfig {
    /// Load configuration, degrading to an empty config when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                print_warning(&format!(
                    "No {} found at {}, unable to deploy",
                    DEFAULT_CONFIG_FILE,
                    path.display()
                ));
                Ok(Self::default())
            }
            Err(err) => Err(ReleaseError::config_error_with_hint(
                format!("Failed to read {}", path.display()),
                Some(err.into()),
                hints::invalid_build_config(),
            )
            .into()),
        }
    }

    /// Parse configuration from a YAML string
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml_ng::from_str(content).map_err(|err| {
            ReleaseError::config_error_with_hint(
                format!("Failed to parse {}: {}", DEFAULT_CONFIG_FILE, err),
                Some(err.into()),
                hints::invalid_build_config(),
            )
            .into()
        })
    }

    /// Build-time defines for an environment, rendered as strings
    pub fn defines(&self, env: Environment) -> Result<BTreeMap<String, String>, ReleaseError> {
        let defines = lookup(&self.dart_define, PURPOSE_DART_DEFINE, env)?;
        Ok(defines
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect())
    }

    /// Raw (un-normalized) web base path
    pub fn base(&self, env: Environment) -> Result<&str, ReleaseError> {
        lookup(&self.base, PURPOSE_BASE, env).map(String::as_str)
    }

    pub fn public_dir(&self, env: Environment) -> Result<&str, ReleaseError> {
        lookup(&self.public_dir, PURPOSE_PUBLIC_DIR, env).map(String::as_str)
    }

    pub fn deploy_path(&self, env: Environment) -> Result<&str, ReleaseError> {
        lookup(&self.deploy_path, PURPOSE_DEPLOY_PATH, env).map(String::as_str)
    }
}

fn lookup<'a, T>(
    section: &'a BTreeMap<String, T>,
    purpose: &str,
    env: Environment,
) -> Result<&'a T, ReleaseError> {
    section
        .get(env.as_str())
        .ok_or_else(|| ReleaseError::missing_key(purpose, env.as_str()))
}
