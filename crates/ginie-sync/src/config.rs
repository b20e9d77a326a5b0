//! Application configuration.
//!
//! Loaded from a TOML file with `GINIE_`-prefixed environment overrides,
//! e.g. `GINIE_CONNECTION__URL` or `GINIE_REST__AUTH_TOKEN`.

use crate::error::SyncResult;
use crate::rest::RestConfig;
use ginie_bus::ConnectionConfig;
use ginie_fallback::CoordinatorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level sync layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Push channel settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Fallback polling settings.
    #[serde(default)]
    pub fallback: CoordinatorConfig,
    /// REST endpoint settings for refresh functions.
    #[serde(default)]
    pub rest: RestConfig,
}

impl SyncConfig {
    /// Load configuration from a TOML file, with environment overrides.
    pub fn load(path: impl AsRef<Path>) -> SyncResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("GINIE").separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
