//! Logging configuration.
//!
//! A campaign logs at one base level, optionally raised or lowered per
//! search stage. Sources, lowest precedence first:
//! - defaults (info, human output)
//! - `TB_LOG` (`<level>` or `<level>,<stage>=<level>,...`) and `TB_LOG_FORMAT`
//! - explicit overrides from the embedding driver

use super::events::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing_subscriber::filter::LevelFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Console lines on stderr.
    #[default]
    Human,
    /// One JSON object per event, for post-run analysis of a campaign.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Verbosity of one stage or of the whole campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Delegate the spelling to tracing so `TB_LOG` accepts what `RUST_LOG` does.
        let filter: LevelFilter = s
            .trim()
            .parse()
            .map_err(|_| format!("unknown log level '{}'", s.trim()))?;
        Ok([
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ]
        .into_iter()
        .find(|level| level.as_filter() == filter)
        .unwrap_or(LogLevel::Off))
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter().to_string().to_ascii_lowercase())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// Per-stage levels that replace `level` for that stage's module.
    pub stages: BTreeMap<Stage, LogLevel>,
    /// Omit timestamps from human output (useful for golden logs).
    pub without_time: bool,
}

impl LogConfig {
    /// Config from `TB_LOG` / `TB_LOG_FORMAT`, then explicit overrides.
    ///
    /// Malformed environment values are ignored rather than aborting a run.
    pub fn from_env(level: Option<LogLevel>, format: Option<LogFormat>) -> Self {
        let mut config = LogConfig::default();
        if let Ok(spec) = std::env::var("TB_LOG") {
            if let Ok(parsed) = Self::parse_directives(&spec) {
                config = parsed;
            }
        }
        if let Some(parsed) = std::env::var("TB_LOG_FORMAT")
            .ok()
            .and_then(|val| val.parse().ok())
        {
            config.format = parsed;
        }
        if let Some(level) = level {
            config.level = level;
        }
        if let Some(format) = format {
            config.format = format;
        }
        config
    }

    /// Parse `<level>` and `<stage>=<level>` entries separated by commas.
    pub fn parse_directives(spec: &str) -> Result<Self, String> {
        let mut config = LogConfig::default();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((stage, level)) => {
                    let stage: Stage = stage.trim().parse()?;
                    config.stages.insert(stage, level.parse()?);
                }
                None => config.level = part.parse()?,
            }
        }
        Ok(config)
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_stage(mut self, stage: Stage, level: LogLevel) -> Self {
        self.stages.insert(stage, level);
        self
    }

    pub fn without_time(mut self) -> Self {
        self.without_time = true;
        self
    }

    /// `EnvFilter` directives: base level for the crate, then one per stage.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![format!("tb_core={}", self.level)];
        directives.extend(
            self.stages
                .iter()
                .map(|(stage, level)| format!("{}={}", stage.module(), level)),
        );
        directives.join(",")
    }
}
