use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};
use askme_core::EngineConfig;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Merge file settings under the environment: env vars win, then the
    /// file, then the built-in defaults.
    pub fn engine_config(&self) -> EngineConfig {
        self.merge_over(EngineConfig::from_env(), &Self::env_overrides())
    }

    fn merge_over(&self, mut engine: EngineConfig, env: &EnvOverrides) -> EngineConfig {
        if !env.api_key {
            if let Some(key) = &self.api_key {
                engine.api_key = key.clone();
            }
        }
        if !env.model {
            if let Some(model) = &self.model {
                engine.model = model.clone();
            }
        }
        if !env.endpoint {
            if let Some(endpoint) = &self.endpoint {
                engine.endpoint = endpoint.clone();
            }
        }
        if let Some(secs) = self.connect_timeout_secs {
            engine = engine.with_connect_timeout(Duration::from_secs(secs));
        }
        engine
    }

    fn env_overrides() -> EnvOverrides {
        EnvOverrides {
            api_key: std::env::var("OPENAI_API_KEY").is_ok(),
            model: std::env::var("ASKME_MODEL").is_ok(),
            endpoint: std::env::var("ASKME_ENDPOINT").is_ok(),
        }
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("askme").join("config.json"))
    }
}

/// Which settings were supplied by the environment
#[derive(Debug, Default)]
struct EnvOverrides {
    api_key: bool,
    model: bool,
    endpoint: bool,
}
