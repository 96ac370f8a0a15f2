//! Configuration resolution + validation tests against real files.
//!
//! Covers:
//! - Lookup order (explicit path, then env file, then env dir)
//! - Loading and validating search.json files
//! - Preset round-trips through JSON

use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tb_config::preset::{get_preset, PresetName};
use tb_config::resolve::{ENV_CONFIG_DIR, ENV_CONFIG_PATH, SEARCH_FILENAME};
use tb_config::{load_search_config, resolve_config, ConfigSource, SearchConfig, ValidationError};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|key| env::var(key).ok()).collect();
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.keys.iter().zip(&self.saved) {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    let _env = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_CONFIG_DIR);
    f()
}

fn write_config(path: &Path, json: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent");
    }
    fs::write(path, json).expect("write config");
}

#[test]
fn explicit_path_wins_over_environment() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let cli = dir.path().join("cli.json");
        let envp = dir.path().join("env.json");
        write_config(&cli, r#"{"schema_version": "1.0.0", "seed": 1}"#);
        write_config(&envp, r#"{"schema_version": "1.0.0", "seed": 2}"#);
        env::set_var(ENV_CONFIG_PATH, &envp);

        let resolved = resolve_config(Some(&cli));
        assert_eq!(resolved.source, ConfigSource::Explicit);
        assert_eq!(resolved.path.as_deref(), Some(cli.as_path()));

        let (config, source) = load_search_config(Some(&cli)).unwrap();
        assert_eq!(config.seed, Some(1));
        assert_eq!(source, ConfigSource::Explicit);
    });
}

#[test]
fn env_path_then_env_dir() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join("conf");
        write_config(
            &config_dir.join(SEARCH_FILENAME),
            r#"{"schema_version": "1.0.0", "seed": 3}"#,
        );
        env::set_var(ENV_CONFIG_DIR, &config_dir);

        let (config, source) = load_search_config(None).unwrap();
        assert_eq!(config.seed, Some(3));
        assert_eq!(source, ConfigSource::EnvDir);

        let direct = dir.path().join("direct.json");
        write_config(&direct, r#"{"schema_version": "1.0.0", "seed": 4}"#);
        env::set_var(ENV_CONFIG_PATH, &direct);
        let (config, source) = load_search_config(None).unwrap();
        assert_eq!(config.seed, Some(4));
        assert_eq!(source, ConfigSource::EnvFile);
    });
}

#[test]
fn invalid_file_is_rejected() {
    with_env_lock(|| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        write_config(
            &path,
            r#"{"schema_version": "1.0.0", "genetic": {"p_crossover": 2.0}}"#,
        );
        let err = load_search_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { .. }));

        write_config(&path, "not json at all");
        let err = load_search_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    });
}

#[test]
fn presets_round_trip_through_json() {
    for name in PresetName::ALL {
        let config = get_preset(*name);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed = SearchConfig::parse_json(&json).unwrap();
        assert_eq!(parsed, config, "preset {}", name);
    }
}
