// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus configuration
//!
//! Loadable from TOML:
//!
//! ```toml
//! max_concurrency = 4
//! continue_on_error = true
//! handler_timeout = "250ms"
//! publish_timeout = "2s"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BusConfig {
    /// Ceiling on concurrently running observer notifications per publish
    pub max_concurrency: usize,
    /// Keep dispatching after a handler fails and report failures together
    pub continue_on_error: bool,
    /// Default per-handler limit for publications that set none
    #[serde(with = "humantime_serde")]
    pub handler_timeout: Option<Duration>,
    /// Default whole-publication limit for publications that set none
    #[serde(with = "humantime_serde")]
    pub publish_timeout: Option<Duration>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            continue_on_error: false,
            handler_timeout: None,
            publish_timeout: None,
        }
    }
}

impl BusConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: BusConfig = toml::from_str(source)?;
        Ok(config.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Clamp values into their valid ranges
    pub fn normalized(mut self) -> Self {
        self.max_concurrency = self.max_concurrency.max(1);
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
