//! Error types and helpers for user-friendly error messages
//!
//! Every failure in a release run is fatal. These types exist so the final
//! report can say *what* went wrong (a tool, a config key, a missing output)
//! and how to fix it, and so the process can exit with the failing tool's
//! own status code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while orchestrating a release run
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// The configuration file exists but could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// A required per-environment setting is absent from the configuration
    #[error("Configuration error: missing '{purpose}' entry for environment '{environment}'")]
    MissingKey { purpose: String, environment: String },

    /// Tool/executable not found on PATH
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// An external command exited unsuccessfully
    #[error("Command failed ({}): {command}", describe_exit(*exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
    },

    /// A build tool reported success but its output tree is absent
    #[error("Expected build output not found: {}", path.display())]
    MissingOutput { path: PathBuf },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl ReleaseError {
    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create an error for an absent `<purpose>.<environment>` entry
    pub fn missing_key(purpose: impl Into<String>, environment: impl Into<String>) -> Self {
        Self::MissingKey {
            purpose: purpose.into(),
            environment: environment.into(),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    /// Create a command failure error
    pub fn command_failed(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
        }
    }

    /// Process exit code to report for this error
    ///
    /// A failed external command hands its own status through; everything
    /// else maps to 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReleaseError::CommandFailed {
                exit_code: Some(code),
                ..
            } if (1..=255).contains(code) => *code as u8,
            _ => 1,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        let hint = match self {
            ReleaseError::Config { hint, .. } => hint.clone(),
            ReleaseError::MissingKey { purpose, environment } => {
                Some(hints::missing_key(purpose, environment))
            }
            ReleaseError::MissingTool {
                hint, required_for, ..
            } => Some(format!("Required for: {}\n{}", required_for, hint)),
            ReleaseError::CommandFailed { .. } | ReleaseError::MissingOutput { .. } => None,
        };

        if let Some(h) = hint {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
        }

        eprintln!();
    }
}

/// Exit code for any error bubbling out of a run
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ReleaseError>())
        .map(ReleaseError::exit_code)
        .unwrap_or(1)
}

/// Common error hints
pub mod hints {
    /// Get hint for missing Flutter
    pub fn flutter() -> &'static str {
        "Install the Flutter SDK from https://docs.flutter.dev/get-started/install\n\
         and make sure `flutter` is on your PATH (run `flutter doctor` to verify)."
    }

    /// Get hint for missing rsync
    pub fn rsync() -> &'static str {
        "Install rsync with your package manager:\n\
         • macOS: brew install rsync\n\
         • Ubuntu: sudo apt install rsync"
    }

    /// Get hint for an invalid build_config.yaml
    pub fn invalid_build_config() -> &'static str {
        "build_config.yaml is invalid. Expected top-level mappings keyed by environment:\n\
         \n\
         dart_define:\n\
         \x20 public: { API_URL: https://example.com }\n\
         base:\n\
         \x20 public: /app/\n\
         public_dir:\n\
         \x20 public: host:/srv/releases/\n\
         deploy_path:\n\
         \x20 public: host:/srv/www/app/"
    }

    /// Get hint for a missing per-environment entry
    pub fn missing_key(purpose: &str, environment: &str) -> String {
        format!(
            "Add an entry to build_config.yaml:\n\
             \n\
             {}:\n\
             \x20 {}: ...",
            purpose, environment
        )
    }
}
