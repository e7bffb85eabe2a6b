//! Configuration validation

use super::*;
use crate::error::{SearchError, Result};

const LOG_FORMATS: &[&str] = &["json", "compact", "pretty"];

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.clusters.is_empty() {
        return Err(SearchError::Config(
            "At least one cluster must be configured".to_string()
        ));
    }

    for (name, cluster) in &config.clusters {
        validate_cluster_config(name, cluster)?;
    }

    validate_transport_config(&config.transport)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validate one named cluster
fn validate_cluster_config(name: &str, cluster: &ClusterConfig) -> Result<()> {
    if cluster.hosts.is_empty() {
        return Err(SearchError::Config(format!(
            "Cluster '{}' has no hosts", name
        )));
    }

    for host in &cluster.hosts {
        if host.host.trim().is_empty() {
            return Err(SearchError::Config(format!(
                "Cluster '{}' has a host with an empty name", name
            )));
        }

        if host.port == 0 {
            return Err(SearchError::Config(format!(
                "Cluster '{}' host '{}' must have a non-zero port", name, host.host
            )));
        }

        if host.scheme != "http" && host.scheme != "https" {
            return Err(SearchError::Config(format!(
                "Cluster '{}' host '{}' scheme must be http or https, got '{}'",
                name, host.host, host.scheme
            )));
        }

        if host.password.is_some() && host.username.is_none() {
            return Err(SearchError::Config(format!(
                "Cluster '{}' host '{}' has a password but no username", name, host.host
            )));
        }
    }

    Ok(())
}

/// Validate transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<()> {
    if config.timeout_secs == 0 {
        return Err(SearchError::Config(
            "Transport timeout must be greater than 0".to_string()
        ));
    }

    if config.timeout_secs > 300 {
        return Err(SearchError::Config(
            "Transport timeout too large (max: 300 seconds)".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &LoggingConfig) -> Result<()> {
    if !LOG_FORMATS.contains(&config.format.as_str()) {
        return Err(SearchError::Config(format!(
            "Log format must be one of {:?}, got '{}'", LOG_FORMATS, config.format
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_no_clusters() {
        let mut config = Config::default_config();
        config.clusters.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_port() {
        let mut config = Config::default_config();
        if let Some(cluster) = config.clusters.get_mut("default") {
            cluster.hosts[0].port = 0;
        }
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_scheme() {
        let mut config = Config::default_config();
        if let Some(cluster) = config.clusters.get_mut("default") {
            cluster.hosts[0].scheme = "ftp".to_string();
        }
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_timeout() {
        let mut config = Config::default_config();
        config.transport.timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        config.transport.timeout_secs = 301;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_unknown_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "xml".to_string();
        assert!(validate_config(&config).is_err());
    }
}
