//! Bridge configuration.
//!
//! Sources are merged with priority (later wins):
//! 1. Default values (hardcoded)
//! 2. File named by the `CONFIG_PATH` environment variable
//! 3. Environment variables prefixed `BRIDGE__` (e.g. `BRIDGE__FETCH__RETRY=1`)

mod diagnostics;
mod fetch;
mod registry;
pub use diagnostics::*;
pub use fetch::*;
pub use registry::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_ENV_SEPARATOR;
use crate::constants::CONFIG_PATH_ENV;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BridgeConfig {
    /// Options handed to the pull cache together with the fetch function
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Subscription registry sizing
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Logging and diagnostic listeners
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl BridgeConfig {
    /// Defaults, then `CONFIG_PATH`, then `BRIDGE__*` environment variables.
    ///
    /// Does not validate; call [`BridgeConfig::validate`] once every override
    /// is applied.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Merge a TOML file over the current values.
    ///
    /// Environment variables are applied again on top so they keep the
    /// highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.fetch.validate()?;
        self.registry.validate()?;
        self.diagnostics.validate()?;
        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(CONFIG_ENV_PREFIX)
        .separator(CONFIG_ENV_SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
}
