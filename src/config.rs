//! Viewer configuration.
//!
//! Values come from the process environment after `.env` has been loaded:
//!
//! - `CAPTION_ENDPOINT_URL` (default `http://localhost:8080/upload_image`)
//! - `VIEWER_BIND_ADDRESS` (default `0.0.0.0:3000`)
//! - `VIEWER_MAX_UPLOAD_BYTES` (default 10 MiB)

use std::net::SocketAddr;

pub const ENDPOINT_URL_VAR: &str = "CAPTION_ENDPOINT_URL";
pub const BIND_ADDRESS_VAR: &str = "VIEWER_BIND_ADDRESS";
pub const MAX_UPLOAD_BYTES_VAR: &str = "VIEWER_MAX_UPLOAD_BYTES";

pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:8080/upload_image";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid value for {var}: '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

/// Configuration injected into the viewer at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Full URL of the captioning endpoint, including the `/upload_image` path.
    pub endpoint_url: String,
    pub bind_address: String,
    pub max_upload_bytes: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ViewerConfig {
    /// Loads `.env` (if present) and reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|_| None)
    }

    /// Like [`ViewerConfig::from_env`], but values from `overrides` win over
    /// the environment and are in place before validation.
    pub fn from_env_with<O>(overrides: O) -> Result<Self, ConfigError>
    where
        O: Fn(&str) -> Option<String>,
    {
        let _ = dotenvy::dotenv();
        Self::from_layers(overrides, |key| std::env::var(key).ok())
    }

    /// Reads each key from `overrides` first, then from `base`.
    pub fn from_layers<O, B>(overrides: O, base: B) -> Result<Self, ConfigError>
    where
        O: Fn(&str) -> Option<String>,
        B: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| overrides(key).or_else(|| base(key)))
    }

    /// Reads the configuration through `lookup`, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENDPOINT_URL_VAR) {
            config.endpoint_url = url;
        }
        if let Some(addr) = lookup(BIND_ADDRESS_VAR) {
            config.bind_address = addr;
        }
        if let Some(raw) = lookup(MAX_UPLOAD_BYTES_VAR) {
            config.max_upload_bytes =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber {
                        var: MAX_UPLOAD_BYTES_VAR,
                        value: raw.clone(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the endpoint is an http(s) URL and the bind address parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.endpoint_url).map_err(|e| {
            ConfigError::InvalidEndpoint {
                url: self.endpoint_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                url: self.endpoint_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.bind_address.clone()))
    }
}
