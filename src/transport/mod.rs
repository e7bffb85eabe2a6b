//! Transport clients for the search engine

pub mod http;
pub mod mock;
pub mod response;

pub use http::HttpTransport;
pub use response::{SearchResponse, TotalHits};

use crate::builder::RequestParams;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

/// One network call per method; responses are engine JSON, untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run a search request
    async fn search(&self, params: &RequestParams) -> Result<Value>;

    /// Index the staged document
    async fn index(&self, params: &RequestParams) -> Result<Value>;

    /// Fetch one document by id
    async fn get(&self, params: &RequestParams) -> Result<Value>;

    /// Send a batch of actions in one round trip
    async fn bulk(&self, request: &BulkRequest) -> Result<Value>;

    /// Copy documents from one index into another
    async fn reindex(&self, request: &ReindexRequest) -> Result<Value>;

    /// Apply the body script to every document matching the body query
    async fn update_by_query(&self, params: &RequestParams) -> Result<Value>;

    async fn indices_exists(&self, index: &str) -> Result<bool>;

    async fn indices_create(&self, index: &str, body: &Value) -> Result<Value>;

    async fn indices_put_mapping(&self, index: &str, body: &Value) -> Result<Value>;
}

/// Interleaved action headers and document sources
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkRequest {
    pub operations: Vec<Value>,
}

impl BulkRequest {
    /// One `index` action per document, all targeting `index`
    pub fn index_all<I>(index: &str, documents: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        let mut operations = Vec::new();
        for document in documents {
            operations.push(json!({ "index": { "_index": index } }));
            operations.push(document);
        }
        Self { operations }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Newline-delimited JSON, including the trailing newline the bulk API
    /// requires
    pub fn to_ndjson(&self) -> Result<String> {
        let mut body = String::new();
        for operation in &self.operations {
            body.push_str(
                &serde_json::to_string(operation)
                    .map_err(crate::error::TransportError::SerializationError)?,
            );
            body.push('\n');
        }
        Ok(body)
    }
}

/// Source index to destination index copy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReindexRequest {
    pub source: IndexRef,
    pub dest: IndexRef,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRef {
    pub index: String,
}

impl ReindexRequest {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            source: IndexRef { index: from.into() },
            dest: IndexRef { index: to.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_interleaves_headers() {
        let request = BulkRequest::index_all("goods", vec![json!({"id": 1}), json!({"id": 2})]);

        assert_eq!(request.operations.len(), 4);
        assert_eq!(request.operations[0], json!({"index": {"_index": "goods"}}));
        assert_eq!(request.operations[1], json!({"id": 1}));
        assert_eq!(request.operations[2], json!({"index": {"_index": "goods"}}));
        assert_eq!(request.operations[3], json!({"id": 2}));
    }

    #[test]
    fn test_ndjson_has_trailing_newline() {
        let request = BulkRequest::index_all("goods", vec![json!({"id": 1})]);
        let body = request.to_ndjson().unwrap();

        assert_eq!(body, "{\"index\":{\"_index\":\"goods\"}}\n{\"id\":1}\n");
    }

    #[test]
    fn test_reindex_body() {
        let request = ReindexRequest::new("goods_v1", "goods_v2");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"source": {"index": "goods_v1"}, "dest": {"index": "goods_v2"}})
        );
    }
}
