//! Repository: one builder plus one cluster transport, driving the
//! higher-level search and write operations

pub mod condition;
pub mod page;

pub use condition::{Condition, Conditions, DateWindow, SortSpec, DEFAULT_WINDOW_DAYS};
pub use page::Page;

use crate::builder::{script::PAINLESS, RequestBuilder, RequestParams, Script, TrackTotalHits};
use crate::error::Result;
use crate::registry::ClusterRegistry;
use crate::schema::SchemaProvider;
use crate::transport::response::{updated_count, SearchResponse};
use crate::transport::{BulkRequest, ReindexRequest, Transport};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page size for [`Repository::find_where`]
pub const DEFAULT_FIND_SIZE: u64 = 10;

/// Page size for [`Repository::paginate`]
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Exact-count ceiling for finds and pages
pub const DEFAULT_TRACK_TOTAL_HITS: u64 = 20_000;

/// Exact-count ceiling for [`Repository::count`]
pub const DEFAULT_COUNT_MAX: u64 = 1_000_000;

pub const DEFAULT_NUMBER_OF_SHARDS: u64 = 5;
pub const DEFAULT_NUMBER_OF_REPLICAS: u64 = 1;

/// Projection, ordering and pagination for a read
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub columns: Vec<String>,
    pub sorts: SortSpec,
    pub page: u64,
    pub size: u64,
    pub track_total_hits: Option<TrackTotalHits>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::page(1, DEFAULT_FIND_SIZE)
    }
}

impl QueryOptions {
    pub fn page(page: u64, size: u64) -> Self {
        Self {
            columns: Vec::new(),
            sorts: SortSpec::default(),
            page,
            size,
            track_total_hits: Some(TrackTotalHits::UpTo(DEFAULT_TRACK_TOTAL_HITS)),
        }
    }

    /// First page at [`DEFAULT_PAGE_SIZE`]
    pub fn paginated() -> Self {
        Self::page(1, DEFAULT_PAGE_SIZE)
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn sorted(mut self, sorts: SortSpec) -> Self {
        self.sorts = sorts;
        self
    }

    pub fn track_total_hits(mut self, track: Option<TrackTotalHits>) -> Self {
        self.track_total_hits = track;
        self
    }
}

pub struct Repository {
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    schema: Option<Arc<dyn SchemaProvider>>,
}

impl Repository {
    /// Bind `builder` to the transport of the cluster named after its index.
    ///
    /// Fails here, not on first query, when that cluster is not configured.
    pub async fn connect(builder: RequestBuilder, registry: &ClusterRegistry) -> Result<Self> {
        let transport = registry.get(builder.index()).await?;
        info!("Repository for index '{}' connected", builder.index());
        Ok(Self::with_transport(builder, transport))
    }

    pub fn with_transport(builder: RequestBuilder, transport: Arc<dyn Transport>) -> Self {
        Self {
            builder,
            transport,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Arc<dyn SchemaProvider>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// Direct access for clauses the orchestration methods don't cover
    pub fn builder_mut(&mut self) -> &mut RequestBuilder {
        &mut self.builder
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send the current request as-is. Builder state is kept.
    pub async fn search(&self) -> Result<Value> {
        let params = self.builder.params();
        debug!("Searching index '{}'", params.index);
        self.transport.search(&params).await
    }

    /// `_source` of every matching hit on the requested page
    pub async fn find_where(&mut self, conditions: &Conditions, options: &QueryOptions) -> Result<Vec<Value>> {
        let raw = self.run_read(conditions, options).await?;
        let sources = SearchResponse::from_value(&raw)?.into_sources();
        debug!("find_where returned {} document(s)", sources.len());
        Ok(sources)
    }

    /// One page of sources with total and page counters
    pub async fn paginate(&mut self, conditions: &Conditions, options: &QueryOptions) -> Result<Page<Value>> {
        let raw = self.run_read(conditions, options).await?;
        let response = SearchResponse::from_value(&raw)?;
        let total = response.total()?;
        Ok(Page::new(response.into_sources(), total, options.page.max(1), options.size))
    }

    /// Matching document count, exact up to `max` (default
    /// [`DEFAULT_COUNT_MAX`]; `Some(0)` leaves the engine default).
    ///
    /// Only the query is cleared afterwards.
    pub async fn count(&mut self, conditions: &Conditions, max: Option<u64>) -> Result<u64> {
        let max = max.unwrap_or(DEFAULT_COUNT_MAX);

        let outcome = match conditions.apply(&mut self.builder) {
            Ok(()) => {
                if max > 0 {
                    self.builder.track_total_hits(max);
                }
                self.builder.paginate(1, 0);
                self.transport.search(&self.builder.params()).await
            }
            Err(e) => Err(e),
        };
        self.builder.reset_query();

        let raw = outcome?;
        SearchResponse::from_value(&raw)?.total()
    }

    /// Index `document` under the builder's index, id and routing
    pub async fn create(&mut self, document: Value) -> Result<Value> {
        self.builder.document(document);
        let params = self.builder.params();
        debug!("Indexing document into '{}' (id: {:?})", params.index, params.id);

        let result = self.transport.index(&params).await;
        self.finish(result)
    }

    /// Fetch the document with the builder's id
    pub async fn get(&mut self) -> Result<Value> {
        let params = self.builder.params();
        let result = self.transport.get(&params).await;
        self.finish(result)
    }

    /// Index every document into the builder's index in one round trip.
    /// Builder state is untouched.
    pub async fn bulk<I>(&self, documents: I) -> Result<Value>
    where
        I: IntoIterator<Item = Value>,
    {
        let request = BulkRequest::index_all(self.builder.index(), documents);
        if request.is_empty() {
            debug!("Empty bulk request, nothing sent");
            return Ok(json!({ "errors": false, "items": [] }));
        }

        info!("Bulk indexing {} document(s) into '{}'", request.operations.len() / 2, self.builder.index());
        self.transport.bulk(&request).await
    }

    /// Update-by-query with the builder's current query and script; returns
    /// the updated count
    pub async fn update(&mut self) -> Result<u64> {
        let params = self.builder.params();
        let result = self.transport.update_by_query(&params).await;
        let raw = self.finish(result)?;
        updated_count(&raw)
    }

    /// Apply `script` to every document matching `conditions`, without
    /// waiting for the engine task to finish
    pub async fn update_by_query(&mut self, conditions: &Conditions, script: Script) -> Result<Value> {
        let result = match conditions.apply(&mut self.builder) {
            Ok(()) => {
                self.builder.set_update_script(script.with_lang(PAINLESS));
                let params = RequestParams {
                    conflicts: Some("proceed".to_string()),
                    wait_for_completion: Some(false),
                    ..self.builder.params()
                };
                info!("Update by query on '{}'", params.index);
                self.transport.update_by_query(&params).await
            }
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    /// Copy every document from `from` into `to`
    pub async fn reindex(&self, from: &str, to: &str) -> Result<Value> {
        info!("Reindexing '{}' into '{}'", from, to);
        self.transport.reindex(&ReindexRequest::new(from, to)).await
    }

    /// Create the index with the schema's mapping, or put the mapping on an
    /// existing index.
    ///
    /// `Ok(None)` when no schema properties are declared. An empty
    /// `index_name` means the builder's index. Caller `settings` override
    /// the shard and replica defaults.
    pub async fn create_mapping(&self, index_name: Option<&str>, settings: Map<String, Value>) -> Result<Option<Value>> {
        let properties = self
            .schema
            .as_ref()
            .map(|schema| schema.mapping_properties())
            .unwrap_or_default();
        if properties.is_empty() {
            debug!("No schema properties declared, skipping mapping");
            return Ok(None);
        }

        let index = index_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.builder.index());

        if self.transport.indices_exists(index).await? {
            info!("Putting mapping on existing index '{}'", index);
            let body = json!({ "properties": properties });
            return self.transport.indices_put_mapping(index, &body).await.map(Some);
        }

        let mut merged = Map::new();
        merged.insert("number_of_shards".to_string(), json!(DEFAULT_NUMBER_OF_SHARDS));
        merged.insert("number_of_replicas".to_string(), json!(DEFAULT_NUMBER_OF_REPLICAS));
        merged.extend(settings);

        info!("Creating index '{}'", index);
        let body = json!({
            "settings": merged,
            "mappings": { "properties": properties },
        });
        self.transport.indices_create(index, &body).await.map(Some)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.builder.reset();
        self
    }

    pub fn reset_query(&mut self) -> &mut Self {
        self.builder.reset_query();
        self
    }

    /// Shared read pipeline: clauses, projection, sort, paging, one search,
    /// full reset
    async fn run_read(&mut self, conditions: &Conditions, options: &QueryOptions) -> Result<Value> {
        let result = match conditions.apply(&mut self.builder) {
            Ok(()) => {
                if !options.columns.is_empty() {
                    self.builder.columns(options.columns.iter().map(String::as_str));
                }
                options.sorts.apply(&mut self.builder);
                if let Some(track) = options.track_total_hits {
                    self.builder.track_total_hits(track);
                }
                self.builder.paginate(options.page, options.size);

                let params = self.builder.params();
                debug!("Searching index '{}' (from: {:?}, size: {:?})", params.index, params.from, params.size);
                self.transport.search(&params).await
            }
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    /// Reset the builder whatever the outcome, then hand the outcome back
    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        self.builder.reset();
        if let Err(e) = &result {
            warn!("Request on '{}' failed: {}", self.builder.index(), e);
        }
        result
    }
}
