//! Configuration management for the search repository

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use secrecy::{Secret, ExposeSecret};

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named clusters; the name is what builders declare as their index
    pub clusters: HashMap<String, ClusterConfig>,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One logical cluster: an ordered list of hosts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub hosts: Vec<HostConfig>,
}

/// Connection details for a single search engine node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// `http` or `https`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password (secured)
    #[serde(default, serialize_with = "serialize_optional_secret", deserialize_with = "deserialize_optional_secret")]
    pub password: Option<Secret<String>>,
}

impl HostConfig {
    /// Base URL for this node, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Settings shared by every transport the registry builds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Idle connections kept per host
    #[serde(default = "default_pool_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            pool_max_idle_per_host: default_pool_idle(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_port() -> u16 { 9200 }
fn default_scheme() -> String { "http".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_pool_idle() -> usize { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        loader::load_config(path)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        loader::load_config_with_env(path)
    }

    /// Validate this configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validation::validate_config(self)
    }

    /// Look up a cluster by name
    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.get(name)
    }

    /// Create default configuration: one `default` cluster on localhost
    pub fn default_config() -> Self {
        let mut clusters = HashMap::new();
        clusters.insert(
            "default".to_string(),
            ClusterConfig {
                hosts: vec![HostConfig {
                    host: "localhost".to_string(),
                    port: default_port(),
                    scheme: default_scheme(),
                    username: std::env::var("ELASTIC_USER").ok(),
                    password: std::env::var("ELASTIC_PASSWORD").ok().map(Secret::new),
                }],
            },
        );

        Self {
            clusters,
            transport: TransportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Custom serializer for Option<Secret<String>>
fn serialize_optional_secret<S>(secret: &Option<Secret<String>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// Custom deserializer for Option<Secret<String>>
fn deserialize_optional_secret<'de, D>(deserializer: D) -> Result<Option<Secret<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.map(Secret::new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let host = HostConfig {
            host: "es.internal".to_string(),
            port: 9201,
            scheme: "https".to_string(),
            username: None,
            password: None,
        };

        assert_eq!(host.base_url(), "https://es.internal:9201");
    }

    #[test]
    fn test_host_defaults() {
        let cluster: ClusterConfig = from_json(r#"{"hosts": [{"host": "localhost"}]}"#);
        let host = &cluster.hosts[0];

        assert_eq!(host.port, 9200);
        assert_eq!(host.scheme, "http");
        assert!(host.password.is_none());
    }

    #[test]
    fn test_password_is_not_debug_printed() {
        let cluster: ClusterConfig = from_json(
            r#"{"hosts": [{"host": "localhost", "username": "elastic", "password": "changeme"}]}"#,
        );
        let printed = format!("{:?}", cluster);

        assert!(!printed.contains("changeme"));
        assert_eq!(
            cluster.hosts[0].password.as_ref().map(|p| p.expose_secret().as_str()),
            Some("changeme")
        );
    }

    fn from_json(json: &str) -> ClusterConfig {
        serde_json::from_str(json).unwrap()
    }
}
