//! In-memory transport that records calls and replays canned responses.
//!
//! ```
//! use search_repository::transport::mock::{MockTransport, Operation};
//! use serde_json::json;
//!
//! let transport = MockTransport::new()
//!     .with_response(Operation::Search, json!({"hits": {"total": 3, "hits": []}}));
//! assert_eq!(transport.call_count(), 0);
//! ```

use super::{BulkRequest, ReindexRequest, Transport};
use crate::builder::RequestParams;
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Transport operations, used to key canned responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Search,
    Index,
    Get,
    Bulk,
    Reindex,
    UpdateByQuery,
    IndicesCreate,
    IndicesPutMapping,
}

/// A call as the transport received it
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Search(RequestParams),
    Index(RequestParams),
    Get(RequestParams),
    Bulk(BulkRequest),
    Reindex(ReindexRequest),
    UpdateByQuery(RequestParams),
    IndicesExists(String),
    IndicesCreate(String, Value),
    IndicesPutMapping(String, Value),
}

#[derive(Default)]
struct MockState {
    calls: Vec<RecordedCall>,
    responses: HashMap<Operation, VecDeque<Value>>,
    failures: HashMap<Operation, u16>,
    existing_indices: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response; queued responses are served first-in first-out
    pub fn with_response(self, operation: Operation, response: Value) -> Self {
        self.lock()
            .responses
            .entry(operation)
            .or_default()
            .push_back(response);
        self
    }

    /// Make every call of `operation` fail with an engine status
    pub fn with_failure(self, operation: Operation, status: u16) -> Self {
        self.lock().failures.insert(operation, status);
        self
    }

    pub fn with_existing_index(self, index: impl Into<String>) -> Self {
        self.lock().existing_indices.insert(index.into());
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// The last call received, if any
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.lock().calls.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, operation: Operation, call: RecordedCall) -> Result<Value> {
        let mut state = self.lock();
        state.calls.push(call);

        if let Some(status) = state.failures.get(&operation) {
            return Err(TransportError::Status {
                status: *status,
                body: format!("mock failure for {:?}", operation),
            }
            .into());
        }

        let queued = state.responses.get_mut(&operation).and_then(VecDeque::pop_front);
        Ok(queued.unwrap_or_else(|| default_response(operation)))
    }
}

fn default_response(operation: Operation) -> Value {
    match operation {
        Operation::Search => json!({
            "hits": { "total": { "value": 0, "relation": "eq" }, "hits": [] }
        }),
        Operation::UpdateByQuery => json!({ "updated": 0 }),
        Operation::Bulk => json!({ "errors": false, "items": [] }),
        _ => json!({ "acknowledged": true }),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn search(&self, params: &RequestParams) -> Result<Value> {
        self.respond(Operation::Search, RecordedCall::Search(params.clone()))
    }

    async fn index(&self, params: &RequestParams) -> Result<Value> {
        self.respond(Operation::Index, RecordedCall::Index(params.clone()))
    }

    async fn get(&self, params: &RequestParams) -> Result<Value> {
        self.respond(Operation::Get, RecordedCall::Get(params.clone()))
    }

    async fn bulk(&self, request: &BulkRequest) -> Result<Value> {
        self.respond(Operation::Bulk, RecordedCall::Bulk(request.clone()))
    }

    async fn reindex(&self, request: &ReindexRequest) -> Result<Value> {
        self.respond(Operation::Reindex, RecordedCall::Reindex(request.clone()))
    }

    async fn update_by_query(&self, params: &RequestParams) -> Result<Value> {
        self.respond(Operation::UpdateByQuery, RecordedCall::UpdateByQuery(params.clone()))
    }

    async fn indices_exists(&self, index: &str) -> Result<bool> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::IndicesExists(index.to_string()));
        Ok(state.existing_indices.contains(index))
    }

    async fn indices_create(&self, index: &str, body: &Value) -> Result<Value> {
        let response = self.respond(
            Operation::IndicesCreate,
            RecordedCall::IndicesCreate(index.to_string(), body.clone()),
        )?;
        self.lock().existing_indices.insert(index.to_string());
        Ok(response)
    }

    async fn indices_put_mapping(&self, index: &str, body: &Value) -> Result<Value> {
        self.respond(
            Operation::IndicesPutMapping,
            RecordedCall::IndicesPutMapping(index.to_string(), body.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RequestBuilder;

    #[tokio::test]
    async fn test_queued_responses_then_default() {
        let transport = MockTransport::new()
            .with_response(Operation::Search, json!({"hits": {"total": 1, "hits": []}}));
        let params = RequestBuilder::new("goods").params();

        let first = transport.search(&params).await.unwrap();
        let second = transport.search(&params).await.unwrap();

        assert_eq!(first["hits"]["total"], json!(1));
        assert_eq!(second["hits"]["total"]["value"], json!(0));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let transport = MockTransport::new().with_failure(Operation::Get, 404);
        let params = RequestBuilder::new("goods").params();

        assert!(transport.get(&params).await.is_err());
        assert_eq!(transport.last_call(), Some(RecordedCall::Get(params)));
    }
}
