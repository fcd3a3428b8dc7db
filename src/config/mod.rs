// ABOUTME: Configuration types and parsing for slotswap.yml.
// ABOUTME: Handles YAML parsing, env var interpolation, and destination merging.

mod deserialize;
mod env_value;
mod healthcheck;
mod init;
mod stop;

pub use env_value::{EnvValue, resolve_env_map};
pub use healthcheck::HealthcheckConfig;
pub use init::init_config;
pub use stop::StopConfig;

use crate::error::{Error, Result};
use crate::platform::RuntimeConfig;
use crate::types::{ImageReference, ServiceName};
use deserialize::{deserialize_parsed, deserialize_parsed_option};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "slotswap.yml";
pub const CONFIG_FILENAME_ALT: &str = "slotswap.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".slotswap/config.yml";

pub const DEFAULT_NETWORK: &str = "slotswap";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_parsed")]
    pub service: ServiceName,

    #[serde(deserialize_with = "deserialize_parsed")]
    pub image: ImageReference,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub command: Option<Vec<String>>,

    #[serde(default)]
    pub healthcheck: HealthcheckConfig,

    #[serde(default)]
    pub rollout: RolloutConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default = "default_network")]
    pub network: String,

    #[serde(default)]
    pub stop: StopConfig,

    /// Wall-clock limit for the whole run; pending gates are cancelled when it passes.
    #[serde(default, with = "humantime_serde")]
    pub deadline: Option<Duration>,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default, deserialize_with = "deserialize_parsed_option")]
    pub image: Option<ImageReference>,

    #[serde(default)]
    pub env: HashMap<String, EnvValue>,

    #[serde(default)]
    pub labels: HashMap<String, String>,

    #[serde(default)]
    pub healthcheck: Option<HealthcheckConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RolloutConfig {
    #[serde(default = "default_rollout_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            timeout: default_rollout_timeout(),
        }
    }
}

fn default_rollout_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref image) = dest.image {
            merged.image = image.clone();
        }

        for (k, v) in &dest.env {
            merged.env.insert(k.clone(), v.clone());
        }

        for (k, v) in &dest.labels {
            merged.labels.insert(k.clone(), v.clone());
        }

        if let Some(ref healthcheck) = dest.healthcheck {
            merged.healthcheck = healthcheck.clone();
        }

        merged.validate()?;
        Ok(merged)
    }

    /// Replace the artifact for this run.
    pub fn with_image(mut self, image: ImageReference) -> Self {
        self.image = image;
        self
    }

    /// Keep the configured repository but deploy a different tag.
    pub fn with_tag(mut self, tag: &str) -> Result<Self> {
        if tag.trim().is_empty() {
            return Err(Error::InvalidConfig("image tag cannot be empty".into()));
        }
        self.image = self.image.with_tag(tag);
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.healthcheck.attempts == 0 {
            return Err(Error::InvalidConfig(
                "healthcheck.attempts must be at least 1".into(),
            ));
        }
        if self.rollout.timeout.is_zero() {
            return Err(Error::InvalidConfig(
                "rollout.timeout must be greater than zero".into(),
            ));
        }
        if self.network.trim().is_empty() {
            return Err(Error::InvalidConfig("network cannot be empty".into()));
        }
        for (name, dest) in &self.destinations {
            if dest.healthcheck.as_ref().is_some_and(|h| h.attempts == 0) {
                return Err(Error::InvalidConfig(format!(
                    "destinations.{}.healthcheck.attempts must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn template(service: ServiceName, image: ImageReference) -> Self {
        Config {
            service,
            image,
            env: HashMap::new(),
            labels: HashMap::new(),
            command: None,
            healthcheck: HealthcheckConfig::default(),
            rollout: RolloutConfig::default(),
            runtime: RuntimeConfig::default(),
            network: default_network(),
            stop: StopConfig::default(),
            deadline: None,
            destinations: HashMap::new(),
        }
    }
}
