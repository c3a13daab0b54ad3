//! Service configuration module
//!
//! Provides the configuration for reaching the managed Data & Realtime
//! Service: base URL, API key and the avatar storage bucket. Configuration
//! can be built programmatically or loaded from a TOML file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

fn default_avatar_bucket() -> String {
    "avatars".to_string()
}

/// Connection settings for the managed service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service (e.g. `https://project.example.co`)
    pub base_url: String,
    /// API key sent with every request, if the service requires one
    #[serde(default)]
    pub api_key: Option<String>,
    /// Storage bucket for avatar uploads
    #[serde(default = "default_avatar_bucket")]
    pub avatar_bucket: String,
}

impl ServiceConfig {
    /// Create a new ServiceConfigBuilder
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("guildchat").join("config.toml"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingValue("base_url"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Builder for ServiceConfig
#[derive(Debug, Default)]
pub struct ServiceConfigBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    avatar_bucket: Option<String>,
}

impl ServiceConfigBuilder {
    /// Set the service base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the avatar storage bucket
    pub fn avatar_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.avatar_bucket = Some(bucket.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServiceConfig, ConfigError> {
        let config = ServiceConfig {
            base_url: self.base_url.ok_or(ConfigError::MissingValue("base_url"))?,
            api_key: self.api_key,
            avatar_bucket: self.avatar_bucket.unwrap_or_else(default_avatar_bucket),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
