//! Locating `search.json`.
//!
//! Candidates are tried in order and the first existing file wins:
//! explicit path, `TRAILBLAZE_CONFIG`, `TRAILBLAZE_CONFIG_DIR/search.json`,
//! then the per-user config directory. With no file the built-in
//! defaults apply.

use crate::search::SearchConfig;
use crate::validate::{validate_search_config, ValidationResult};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "TRAILBLAZE_CONFIG";
pub const ENV_CONFIG_DIR: &str = "TRAILBLAZE_CONFIG_DIR";
pub const SEARCH_FILENAME: &str = "search.json";

const USER_DIR_NAME: &str = "trailblaze";

/// Which candidate supplied the configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path handed in by the embedding driver.
    Explicit,
    /// `TRAILBLAZE_CONFIG`.
    EnvFile,
    /// `TRAILBLAZE_CONFIG_DIR`.
    EnvDir,
    /// `<user config dir>/trailblaze/search.json`.
    UserDir,
    #[default]
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigSource::Explicit => "explicit path",
            ConfigSource::EnvFile => ENV_CONFIG_PATH,
            ConfigSource::EnvDir => ENV_CONFIG_DIR,
            ConfigSource::UserDir => "user config dir",
            ConfigSource::Defaults => "defaults",
        };
        f.write_str(label)
    }
}

/// Outcome of the path lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// `None` when the defaults apply.
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

fn candidates(explicit: Option<&Path>) -> Vec<(ConfigSource, PathBuf)> {
    let mut out = Vec::with_capacity(4);
    if let Some(path) = explicit {
        out.push((ConfigSource::Explicit, path.to_path_buf()));
    }
    if let Some(path) = std::env::var_os(ENV_CONFIG_PATH) {
        out.push((ConfigSource::EnvFile, PathBuf::from(path)));
    }
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        out.push((ConfigSource::EnvDir, PathBuf::from(dir).join(SEARCH_FILENAME)));
    }
    if let Some(dir) = user_config_dir() {
        out.push((ConfigSource::UserDir, dir.join(SEARCH_FILENAME)));
    }
    out
}

/// Find the search configuration file. Missing candidates are skipped.
pub fn resolve_config(explicit: Option<&Path>) -> ResolvedConfig {
    candidates(explicit)
        .into_iter()
        .find(|(_, path)| path.is_file())
        .map(|(source, path)| ResolvedConfig {
            path: Some(path),
            source,
        })
        .unwrap_or_default()
}

/// Resolve, parse and validate the search configuration.
pub fn load_search_config(
    explicit: Option<&Path>,
) -> ValidationResult<(SearchConfig, ConfigSource)> {
    let resolved = resolve_config(explicit);
    let config = match &resolved.path {
        Some(path) => SearchConfig::from_file(path)?,
        None => SearchConfig::default(),
    };
    validate_search_config(&config)?;
    Ok((config, resolved.source))
}

/// `<platform config dir>/trailblaze`, when the platform has one.
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(USER_DIR_NAME))
}
