//! Structured logging for search campaigns.
//!
//! Engines emit `tracing` events tagged with an `event` name and a `stage`
//! (see [`events`]). The driver installs a subscriber once with
//! [`init_logging`]:
//!
//! ```ignore
//! use tb_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let run_id = tb_core::logging::generate_run_id();
//! tracing::info!(%run_id, "campaign started");
//! ```
//!
//! All output goes to stderr.

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber.
///
/// `RUST_LOG`, when set and valid, replaces the configured directives.
/// Calling this twice is a no-op for the second call.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let output = match config.format {
        LogFormat::Human => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.without_time {
                layer.without_time().boxed()
            } else {
                layer.boxed()
            }
        }
        LogFormat::Jsonl => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(output.with_filter(filter))
        .try_init();
}

/// Short unique id attached to a campaign's log lines.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
