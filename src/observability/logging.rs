//! # Structured Logging
//!
//! Subscriber initialization for the gateway. Log level comes from
//! `RUST_LOG` when set, falling back to the configured level with a
//! crate-scoped default. JSON output is a config toggle for containerized
//! deployments.

use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level used when `RUST_LOG` is not set, e.g. `info` or `debug`.
    pub level: String,

    /// Emit JSON-structured lines instead of human-readable ones.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once: later calls are no-ops, which keeps test
/// binaries from panicking on double initialization.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chat_gateway={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);

    let initialized = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true).json())
            .try_init()
            .is_ok()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
            .is_ok()
    };

    if initialized {
        info!(level = %config.level, json = config.json, "logging initialized");
    }
}
