//! Cluster registry: one cached transport per named cluster

use crate::config::{ClusterConfig, Config, TransportConfig};
use crate::error::{Result, SearchError};
use crate::transport::{HttpTransport, Transport};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the transport for one cluster
pub trait TransportFactory: Send + Sync {
    fn build(&self, name: &str, cluster: &ClusterConfig, settings: &TransportConfig) -> Result<Arc<dyn Transport>>;
}

/// Factory producing [`HttpTransport`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransportFactory;

impl TransportFactory for HttpTransportFactory {
    fn build(&self, name: &str, cluster: &ClusterConfig, settings: &TransportConfig) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(name, cluster, settings)?))
    }
}

/// Maps a cluster name to a lazily built, process-lifetime transport.
///
/// Concurrent first lookups of the same name are coalesced: the factory
/// runs at most once per name.
pub struct ClusterRegistry {
    clusters: HashMap<String, ClusterConfig>,
    settings: TransportConfig,
    factory: Arc<dyn TransportFactory>,
    handles: Cache<String, Arc<dyn Transport>>,
}

impl ClusterRegistry {
    /// Registry building HTTP transports
    pub fn new(config: &Config) -> Self {
        Self::with_factory(config, Arc::new(HttpTransportFactory))
    }

    pub fn with_factory(config: &Config, factory: Arc<dyn TransportFactory>) -> Self {
        info!("Cluster registry initialized with {} cluster(s)", config.clusters.len());

        Self {
            clusters: config.clusters.clone(),
            settings: config.transport.clone(),
            factory,
            handles: Cache::builder().build(),
        }
    }

    /// Transport for `name`, built on first use.
    ///
    /// An unknown name is a configuration error.
    pub async fn get(&self, name: &str) -> Result<Arc<dyn Transport>> {
        let cluster = self.clusters.get(name).ok_or_else(|| {
            SearchError::Config(format!("No configuration for cluster '{}'", name))
        })?;

        let factory = &self.factory;
        let settings = &self.settings;
        self.handles
            .try_get_with(name.to_string(), async move {
                info!("Building transport for cluster '{}'", name);
                factory.build(name, cluster, settings)
            })
            .await
            .map_err(|e| SearchError::Config(format!("Cluster '{}': {}", name, e)))
    }

    /// True once a transport for `name` has been built
    pub fn is_cached(&self, name: &str) -> bool {
        let cached = self.handles.contains_key(name);
        debug!("Cluster '{}' cached: {}", name, cached);
        cached
    }

    pub fn cluster_names(&self) -> impl Iterator<Item = &str> {
        self.clusters.keys().map(String::as_str)
    }
}
