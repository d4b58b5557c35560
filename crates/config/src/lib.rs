//! Configuration loading, validation, and env substitution.
//!
//! Config file: `confab.toml`, searched in `./` then `~/.config/confab/`.
//! Supports `${ENV_VAR}` substitution in all string values, plus a fixed
//! set of direct environment overrides for secrets.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        ConfabConfig, DashboardConfig, DownstreamConfig, MonitorConfig, ServerConfig, ViberConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
