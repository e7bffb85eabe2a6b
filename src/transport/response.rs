//! Decoding of engine responses into normalized shapes

use crate::error::{ResponseError, Result};
use serde::Deserialize;
use serde_json::Value;

/// `hits.total`: a bare integer on older engines, `{value, relation}` on
/// newer ones
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Object {
        value: u64,
        #[serde(default)]
        relation: Option<String>,
    },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(count) => *count,
            TotalHits::Object { value, .. } => *value,
        }
    }
}

/// The subset of a search response this crate reads
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub hits: Hits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub total: Option<Value>,

    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,

    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

impl SearchResponse {
    pub fn from_value(raw: &Value) -> Result<Self> {
        Self::deserialize(raw).map_err(|e| ResponseError::Malformed(e.to_string()).into())
    }

    /// Total hit count; a missing or unrecognized shape is an error
    pub fn total(&self) -> Result<u64> {
        let total = self.hits.total.as_ref().ok_or(ResponseError::MissingField("hits.total"))?;
        decode_total(total)
    }

    /// `_source` of every hit, in order. Hits without a source are skipped.
    pub fn into_sources(self) -> Vec<Value> {
        self.hits.hits.into_iter().filter_map(|hit| hit.source).collect()
    }
}

/// Decode either `42` or `{"value": 42}`
pub fn decode_total(total: &Value) -> Result<u64> {
    TotalHits::deserialize(total)
        .map(|t| t.value())
        .map_err(|_| ResponseError::UnrecognizedTotal(total.to_string()).into())
}

/// `updated` from an update-by-query response
pub fn updated_count(raw: &Value) -> Result<u64> {
    raw.get("updated")
        .ok_or(ResponseError::MissingField("updated"))?
        .as_u64()
        .ok_or_else(|| ResponseError::Malformed(format!("updated is not a count: {}", raw["updated"])).into())
}
