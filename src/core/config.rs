//! # Configuration Management
//!
//! Serde-backed configuration with per-section defaults. Every field is
//! optional in the YAML file; malformed files and out-of-range values fall
//! back to documented defaults with a logged warning — configuration
//! problems are never fatal.

use crate::admin::AdminConfig;
use crate::caching::CacheConfig;
use crate::core::error::{ChatError, ChatResult};
use crate::observability::LogConfig;
use crate::scheduling::TimerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging subsystem.
    pub logging: LogConfig,

    /// Response cache limits and strategy.
    pub cache: CacheConfig,

    /// Reminder timer behavior.
    pub scheduler: TimerConfig,

    /// Admin/status HTTP surface.
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Parse a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> ChatResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&raw)?;
        Ok(config.sanitized())
    }

    /// Load configuration, falling back to defaults on any problem.
    ///
    /// A missing path means "use defaults"; an unreadable or malformed file
    /// is logged and replaced by defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => match Self::from_yaml_file(path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "configuration invalid, using defaults"
                    );
                    Self::default().sanitized()
                }
            },
            None => Self::default().sanitized(),
        }
    }

    /// Replace out-of-range values across every section.
    pub fn sanitized(mut self) -> Self {
        self.cache = self.cache.sanitized();
        self.scheduler = self.scheduler.sanitized();
        self
    }
}
