use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::{debug, warn}};

use crate::{env_subst::substitute_env, schema::ConfabConfig};

/// Config file name, searched in `./` then `~/.config/confab/`.
const CONFIG_FILENAME: &str = "confab.toml";

/// Load config from the given path.
pub fn load_config(path: &Path) -> anyhow::Result<ConfabConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    Ok(toml::from_str(&raw)?)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./confab.toml` (project-local)
/// 2. `~/.config/confab/confab.toml` (user-global)
///
/// Returns `ConfabConfig::default()` if no config file is found.
pub fn discover_and_load() -> ConfabConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ConfabConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dir) = config_dir() {
        let global = dir.join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}

/// Returns the user-global config directory (`~/.config/confab/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "confab").map(|d| d.config_dir().to_path_buf())
}

/// Apply direct environment overrides on top of the loaded file.
///
/// Secrets usually arrive this way in deployment; the file only carries
/// the sandbox defaults.
pub fn apply_env_overrides(config: &mut ConfabConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut ConfabConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup("VIBER_AUTH_TOKEN") {
        config.viber.auth_token = Secret::new(token);
    }
    if let Some(key) = lookup("CUSTOMER_API_KEY") {
        config.downstream.customer_api_key = Secret::new(key);
    }
    if let Some(key) = lookup("BILLING_API_KEY") {
        config.downstream.billing_api_key = Secret::new(key);
    }
    if let Some(key) = lookup("CHATLOG_API_KEY") {
        config.downstream.chatlog_api_key = Secret::new(key);
    }
    if let Some(token) = lookup("DASHBOARD_TOKEN") {
        config.dashboard.token = Secret::new(token);
    }
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(port, "ignoring unparseable PORT override"),
        }
    }
}
