//! Release configuration

pub mod build_config;

pub use build_config::{BuildConfig, DEFAULT_CONFIG_FILE};
