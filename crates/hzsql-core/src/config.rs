//! Client configuration derived from a [`JdbcUrl`].
//!
//! A [`ConfigFactory`] turns an endpoint identity into the [`ClientConfig`]
//! a connection provider consumes. [`DefaultConfigFactory`] overlays the
//! url's authority, schema and well-known properties onto a base config,
//! which can be loaded from a TOML file:
//!
//! ```toml
//! cluster_name = "prod"
//! connection_timeout_ms = 10000
//! smart_routing = false
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::url::JdbcUrl;

/// Url property selecting the cluster name.
pub const CLUSTER_NAME: &str = "clusterName";
/// Url property selecting the connection timeout, in milliseconds.
pub const CONNECTION_TIMEOUT: &str = "connectionTimeout";
/// Url property toggling smart routing.
pub const SMART_ROUTING: &str = "smartRouting";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("port {0} is outside 0..=65535")]
    PortOutOfRange(u32),

    #[error("invalid value '{value}' for property '{key}': {message}")]
    InvalidProperty {
        key: String,
        value: String,
        message: String,
    },
}

/// Configuration handed to a connection provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Cluster name to join (default: "dev").
    pub cluster_name: String,
    /// Member addresses, `host` or `host:port`.
    pub cluster_members: Vec<String>,
    /// Default schema for statements.
    pub schema: Option<String>,
    /// Connection establishment timeout in milliseconds (default: 5000).
    pub connection_timeout_ms: u64,
    /// Route requests directly to the owning member (default: true).
    pub smart_routing: bool,
    /// All url properties, passed through untouched.
    pub properties: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cluster_name: "dev".to_string(),
            cluster_members: Vec::new(),
            schema: None,
            connection_timeout_ms: 5_000,
            smart_routing: true,
            properties: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

/// Builds the [`ClientConfig`] for an endpoint identity.
pub trait ConfigFactory: Send + Sync {
    fn client_config(&self, url: &JdbcUrl) -> Result<ClientConfig, ConfigError>;
}

/// Overlays url data onto a base [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct DefaultConfigFactory {
    base: ClientConfig,
}

impl DefaultConfigFactory {
    pub fn new(base: ClientConfig) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &ClientConfig {
        &self.base
    }
}

impl ConfigFactory for DefaultConfigFactory {
    fn client_config(&self, url: &JdbcUrl) -> Result<ClientConfig, ConfigError> {
        if let Some(port) = url.port().filter(|&p| p > u32::from(u16::MAX)) {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let mut config = self.base.clone();
        config.cluster_members = vec![url.authority()];
        config.schema = Some(url.schema().to_string());

        if let Some(name) = url.property(CLUSTER_NAME) {
            config.cluster_name = name.to_string();
        }
        if let Some(timeout) = url.property(CONNECTION_TIMEOUT) {
            config.connection_timeout_ms = parse_millis(CONNECTION_TIMEOUT, timeout)?;
        }
        if let Some(smart) = url.property(SMART_ROUTING) {
            config.smart_routing = parse_bool(SMART_ROUTING, smart)?;
        }

        config.properties.extend(
            url.properties()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Ok(config)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidProperty {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected a boolean".to_string(),
        }),
    }
}
