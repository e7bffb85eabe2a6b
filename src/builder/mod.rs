//! Request builder for search, index and update-by-query calls
//!
//! A [`RequestBuilder`] accumulates one request document across many
//! calls and hands out owned [`RequestParams`] snapshots on demand. It is
//! reused across operations: [`RequestBuilder::reset`] clears everything
//! except the index identity.
//!
//! ```rust
//! use search_repository::builder::{RequestBuilder, SortOrder};
//!
//! let mut builder = RequestBuilder::new("goods");
//! builder
//!     .term("status", "on_sale")
//!     .terms("shop_id", vec![3, 7])
//!     .sort("created_at", SortOrder::Desc)
//!     .paginate(2, 20);
//!
//! let params = builder.params();
//! assert_eq!(params.from, Some(20));
//! ```

pub mod aggregation;
pub mod clause;
pub mod dates;
pub mod script;

pub use clause::{Clause, RangeBounds};
pub use script::Script;

use crate::error::Result;
use chrono::FixedOffset;
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;

/// Field used by [`RequestBuilder::range`] when callers have no better name
pub const DEFAULT_RANGE_FIELD: &str = "date";

/// Field used by the legacy [`RequestBuilder::date_range`]
pub const DEFAULT_DATETIME_FIELD: &str = "datetime";

/// `min_score` applied by [`RequestBuilder::keywords`]
pub const DEFAULT_MIN_SCORE: f64 = 4.0;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = crate::error::BuilderError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(crate::error::BuilderError::InvalidSort(format!(
                "unknown order '{}'",
                other
            ))),
        }
    }
}

/// `track_total_hits`: either on/off or an exact-count ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackTotalHits {
    Enabled(bool),
    UpTo(u64),
}

impl From<u64> for TrackTotalHits {
    fn from(max: u64) -> Self {
        TrackTotalHits::UpTo(max)
    }
}

impl From<bool> for TrackTotalHits {
    fn from(enabled: bool) -> Self {
        TrackTotalHits::Enabled(enabled)
    }
}

impl fmt::Display for TrackTotalHits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackTotalHits::Enabled(enabled) => write!(f, "{}", enabled),
            TrackTotalHits::UpTo(max) => write!(f, "{}", max),
        }
    }
}

/// The four boolean buckets; each is created on first append
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<Clause>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub must: Option<Vec<Clause>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub must_not: Option<Vec<Clause>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub should: Option<Vec<Clause>>,
}

/// `body.query`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    #[serde(rename = "bool")]
    pub bool_query: BoolQuery,
}

/// `body` of the request document.
///
/// When a document is staged for indexing it *is* the body, and the
/// search-related keys are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestBody {
    pub query: Option<Query>,
    pub sort: Vec<Value>,
    pub aggs: Option<IndexMap<String, Value>>,
    pub collapse: Option<Value>,
    pub script: Option<Script>,
    pub min_score: Option<f64>,
    pub document: Option<Value>,
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        *self == RequestBody::default()
    }
}

impl Serialize for RequestBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if let Some(document) = &self.document {
            return document.serialize(serializer);
        }

        let mut map = serializer.serialize_map(None)?;
        if let Some(query) = &self.query {
            map.serialize_entry("query", query)?;
        }
        if !self.sort.is_empty() {
            map.serialize_entry("sort", &self.sort)?;
        }
        if let Some(aggs) = &self.aggs {
            map.serialize_entry("aggs", aggs)?;
        }
        if let Some(collapse) = &self.collapse {
            map.serialize_entry("collapse", collapse)?;
        }
        if let Some(script) = &self.script {
            map.serialize_entry("script", script)?;
        }
        if let Some(min_score) = &self.min_score {
            map.serialize_entry("min_score", min_score)?;
        }
        map.end()
    }
}

/// Owned snapshot of an assembled request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestParams {
    pub index: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_total_hits: Option<TrackTotalHits>,

    #[serde(rename = "_source", skip_serializing_if = "Option::is_none")]
    pub source: Option<Vec<String>>,

    #[serde(skip_serializing_if = "RequestBody::is_empty")]
    pub body: RequestBody,

    /// Version-conflict policy for update-by-query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_for_completion: Option<bool>,
}

impl RequestParams {
    fn new(index: String, doc_type: Option<String>) -> Self {
        Self {
            index,
            doc_type,
            id: None,
            routing: None,
            from: None,
            size: None,
            track_total_hits: None,
            source: None,
            body: RequestBody::default(),
            conflicts: None,
            wait_for_completion: None,
        }
    }

    /// Render the request document tree
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self)
            .map_err(|e| crate::error::TransportError::SerializationError(e).into())
    }
}

/// Mutable, reusable accumulator for one request document
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    params: RequestParams,
    time_zone: FixedOffset,
}

impl RequestBuilder {
    /// Builder for `index`. The index name also selects the cluster.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            params: RequestParams::new(index.into(), None),
            time_zone: dates::default_time_zone(),
        }
    }

    /// Set the mapping type kept across resets
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.params.doc_type = Some(doc_type.into());
        self
    }

    /// Civil offset attached to `date_range`/`date_range2` clauses
    pub fn with_time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Snapshot of the current request. Later builder calls never alter it.
    pub fn params(&self) -> RequestParams {
        self.params.clone()
    }

    pub fn index(&self) -> &str {
        &self.params.index
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.params.doc_type.as_deref()
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.params.id = Some(id.into());
        self
    }

    pub fn routing(&mut self, routing: impl Into<String>) -> &mut Self {
        self.params.routing = Some(routing.into());
        self
    }

    /// Stage the document sent by an index request
    pub fn document(&mut self, document: Value) -> &mut Self {
        self.params.body.document = Some(document);
        self
    }

    pub fn min_score(&mut self, score: f64) -> &mut Self {
        self.params.body.min_score = Some(score);
        self
    }

    pub fn track_total_hits(&mut self, track: impl Into<TrackTotalHits>) -> &mut Self {
        self.params.track_total_hits = Some(track.into());
        self
    }

    /// Restrict `_source` to these fields
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.source = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// 1-based page; page 0 is treated as page 1. An offset past `u64::MAX`
    /// is clamped.
    pub fn paginate(&mut self, page: u64, size: u64) -> &mut Self {
        self.params.from = Some(page.saturating_sub(1).saturating_mul(size));
        self.params.size = Some(size);
        self
    }

    /// Append a sort key; the first call is the primary key
    pub fn sort(&mut self, field: impl Into<String>, order: SortOrder) -> &mut Self {
        let field: String = field.into();
        self.params
            .body
            .sort
            .push(json!({ field: { "order": order.as_str() } }));
        self
    }

    /// Closed range filter from whichever bounds are present; no-op when
    /// both are absent
    pub fn range(&mut self, start: Option<Value>, end: Option<Value>, field: &str) -> &mut Self {
        match Clause::range(field, RangeBounds::closed(start, end)) {
            Some(clause) => self.add_filter(clause),
            None => self,
        }
    }

    /// Legacy date range: both bounds required and the end is exclusive
    /// (`lt`). Prefer [`RequestBuilder::date_range2`], whose end is inclusive.
    #[deprecated(note = "use date_range2, which treats the end bound as inclusive")]
    pub fn date_range(&mut self, start: &str, end: &str, field: &str) -> Result<&mut Self> {
        let start = dates::to_zulu_string(start)?;
        let end = dates::to_zulu_string(end)?;
        let bounds = RangeBounds::half_open(Value::String(start), Value::String(end))
            .with_time_zone(self.time_zone.to_string());

        Ok(match Clause::range(field, bounds) {
            Some(clause) => self.add_filter(clause),
            None => self,
        })
    }

    /// Closed date range with bounds normalized to UTC instants and the
    /// builder's civil offset attached; no-op when both are absent. Empty
    /// strings count as absent.
    pub fn date_range2(&mut self, start: Option<&str>, end: Option<&str>, field: &str) -> Result<&mut Self> {
        let start = start.filter(|s| !s.trim().is_empty());
        let end = end.filter(|s| !s.trim().is_empty());
        if start.is_none() && end.is_none() {
            return Ok(self);
        }

        let start = start.map(dates::to_zulu_string).transpose()?.map(Value::String);
        let end = end.map(dates::to_zulu_string).transpose()?.map(Value::String);
        let bounds = RangeBounds::closed(start, end).with_time_zone(self.time_zone.to_string());

        Ok(match Clause::range(field, bounds) {
            Some(clause) => self.add_filter(clause),
            None => self,
        })
    }

    pub fn term(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.add_filter(Clause::term(field, value))
    }

    pub fn terms<I, V>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_filter(Clause::terms(field, values))
    }

    /// Full-text AND match under `must`. Also sets the request-wide
    /// `min_score` to [`DEFAULT_MIN_SCORE`].
    pub fn keywords(&mut self, text: impl Into<String>, field: impl Into<String>) -> &mut Self {
        self.keywords_with_min_score(text, field, DEFAULT_MIN_SCORE)
    }

    pub fn keywords_with_min_score(
        &mut self,
        text: impl Into<String>,
        field: impl Into<String>,
        score: f64,
    ) -> &mut Self {
        self.min_score(score);
        self.add_must(Clause::match_all_terms(field, text))
    }

    pub fn add_filter(&mut self, clause: Clause) -> &mut Self {
        self.bool_query().filter.get_or_insert_with(Vec::new).push(clause);
        self
    }

    pub fn add_must(&mut self, clause: Clause) -> &mut Self {
        self.bool_query().must.get_or_insert_with(Vec::new).push(clause);
        self
    }

    pub fn add_must_not(&mut self, clause: Clause) -> &mut Self {
        self.bool_query().must_not.get_or_insert_with(Vec::new).push(clause);
        self
    }

    pub fn add_should(&mut self, clause: Clause) -> &mut Self {
        self.bool_query().should.get_or_insert_with(Vec::new).push(clause);
        self
    }

    fn bool_query(&mut self) -> &mut BoolQuery {
        &mut self.params.body.query.get_or_insert_with(Query::default).bool_query
    }

    /// Merge aggregations into `body.aggs`; a repeated name replaces the
    /// earlier definition
    pub fn add_aggregates<I, K, V>(&mut self, aggs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let target = self.params.body.aggs.get_or_insert_with(IndexMap::new);
        for (name, definition) in aggs {
            target.insert(name.into(), definition.into());
        }
        self
    }

    #[deprecated(note = "use add_aggregates")]
    pub fn set_aggs<I, K, V>(&mut self, aggs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.add_aggregates(aggs)
    }

    /// Field collapsing; replaces any earlier collapse
    pub fn collapse(&mut self, field: impl Into<String>) -> &mut Self {
        let field: String = field.into();
        self.params.body.collapse = Some(json!({ "field": field }));
        self
    }

    pub fn set_update_script(&mut self, script: Script) -> &mut Self {
        self.params.body.script = Some(script);
        self
    }

    /// Assign `value` to `column`, or remove `column` when `value` is `None`
    pub fn set_field_update_script(&mut self, column: impl Into<String>, value: Option<Value>) -> &mut Self {
        let script = match value {
            Some(value) => Script::assign_field(column, value),
            None => Script::remove_field(column),
        };
        self.set_update_script(script)
    }

    /// Clear everything except index and type
    pub fn reset(&mut self) -> &mut Self {
        let index = std::mem::take(&mut self.params.index);
        let doc_type = self.params.doc_type.take();
        self.params = RequestParams::new(index, doc_type);
        self
    }

    /// Clear only `body.query`; sort, aggregations, pagination and
    /// projection survive
    pub fn reset_query(&mut self) -> &mut Self {
        self.params.body.query = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> RequestBuilder {
        RequestBuilder::new("goods").with_type("_doc")
    }

    fn bucket<'a>(params: &'a RequestParams, pick: fn(&BoolQuery) -> &Option<Vec<Clause>>) -> &'a [Clause] {
        params
            .body
            .query
            .as_ref()
            .and_then(|q| pick(&q.bool_query).as_deref())
            .unwrap_or(&[])
    }

    #[test]
    fn test_paginate_offsets() {
        let mut b = builder();

        b.paginate(1, 20);
        assert_eq!((b.params().from, b.params().size), (Some(0), Some(20)));

        b.paginate(3, 10);
        assert_eq!((b.params().from, b.params().size), (Some(20), Some(10)));

        b.paginate(1, 0);
        assert_eq!((b.params().from, b.params().size), (Some(0), Some(0)));

        b.paginate(0, 10);
        assert_eq!(b.params().from, Some(0));
    }

    #[test]
    fn test_paginate_huge_page_clamps() {
        let mut b = builder();
        b.paginate(u64::MAX, 2);
        assert_eq!((b.params().from, b.params().size), (Some(u64::MAX), Some(2)));
    }

    #[test]
    fn test_buckets_keep_order_without_leakage() {
        let mut b = builder();
        b.add_filter(Clause::term("a", 1))
            .add_must(Clause::term("b", 2))
            .add_filter(Clause::term("c", 3))
            .add_should(Clause::term("d", 4))
            .add_must_not(Clause::term("e", 5))
            .add_should(Clause::term("f", 6));

        let params = b.params();
        assert_eq!(bucket(&params, |q| &q.filter), &[Clause::term("a", 1), Clause::term("c", 3)]);
        assert_eq!(bucket(&params, |q| &q.must), &[Clause::term("b", 2)]);
        assert_eq!(bucket(&params, |q| &q.must_not), &[Clause::term("e", 5)]);
        assert_eq!(bucket(&params, |q| &q.should), &[Clause::term("d", 4), Clause::term("f", 6)]);
    }

    #[test]
    fn test_buckets_created_lazily() {
        let mut b = builder();
        b.term("status", "active");

        let value = b.params().to_value().unwrap();
        assert_eq!(
            value["body"]["query"],
            json!({"bool": {"filter": [{"term": {"status": "active"}}]}})
        );
    }

    #[test]
    fn test_reset_keeps_only_identity() {
        let mut b = builder();
        b.id("42")
            .routing("shop-1")
            .term("status", "active")
            .keywords("red shoes", "title")
            .sort("price", SortOrder::Desc)
            .add_aggregates([("total", aggregation::sum("price"))])
            .collapse("sku")
            .columns(["id", "title"])
            .track_total_hits(20_000u64)
            .set_field_update_script("title", Some(json!("x")))
            .paginate(2, 10);

        b.reset();

        assert_eq!(
            b.params().to_value().unwrap(),
            json!({"index": "goods", "type": "_doc"})
        );
    }

    #[test]
    fn test_reset_query_keeps_everything_else() {
        let mut b = builder();
        b.term("status", "active")
            .sort("price", SortOrder::Asc)
            .add_aggregates([("total", aggregation::sum("price"))])
            .columns(["id"])
            .paginate(2, 10);

        b.reset_query();

        let params = b.params();
        assert!(params.body.query.is_none());
        assert_eq!(params.body.sort.len(), 1);
        assert!(params.body.aggs.is_some());
        assert_eq!(params.from, Some(10));
        assert_eq!(params.size, Some(10));
        assert_eq!(params.source, Some(vec!["id".to_string()]));
    }

    #[test]
    fn test_range_without_bounds_is_noop() {
        let mut b = builder();
        b.range(None, None, DEFAULT_RANGE_FIELD);
        b.date_range2(None, None, "date").unwrap();

        assert!(b.params().body.query.is_none());
    }

    #[test]
    fn test_range_closed_bounds() {
        let mut b = builder();
        b.range(Some(json!(10)), Some(json!(20)), "price");

        assert_eq!(
            bucket(&b.params(), |q| &q.filter)[0].as_value(),
            &json!({"range": {"price": {"gte": 10, "lte": 20}}})
        );
    }

    #[test]
    fn test_date_range2_normalizes_and_attaches_offset() {
        let mut b = builder();
        b.date_range2(Some("2024-01-01"), None, "created_at").unwrap();

        assert_eq!(
            bucket(&b.params(), |q| &q.filter)[0].as_value(),
            &json!({"range": {"created_at": {"gte": "2024-01-01T00:00:00Z", "time_zone": "+08:00"}}})
        );
    }

    #[test]
    fn test_date_range2_rejects_garbage() {
        let mut b = builder();
        assert!(b.date_range2(Some("not a date"), None, "created_at").is_err());
        assert!(b.params().body.query.is_none());
    }

    #[test]
    fn test_date_range2_empty_bounds_are_absent() {
        let mut b = builder();
        b.date_range2(Some(""), None, "created_at").unwrap();
        assert!(b.params().body.query.is_none());

        b.date_range2(Some(""), Some("2024-01-31"), "created_at").unwrap();
        assert_eq!(
            bucket(&b.params(), |q| &q.filter)[0].as_value(),
            &json!({"range": {"created_at": {"lte": "2024-01-31T00:00:00Z", "time_zone": "+08:00"}}})
        );
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_date_range_end_is_exclusive() {
        let mut b = builder();
        b.date_range("2024-01-01", "2024-01-02", DEFAULT_DATETIME_FIELD).unwrap();

        assert_eq!(
            bucket(&b.params(), |q| &q.filter)[0].as_value(),
            &json!({"range": {"datetime": {
                "gte": "2024-01-01T00:00:00Z",
                "lt": "2024-01-02T00:00:00Z",
                "time_zone": "+08:00"
            }}})
        );
    }

    #[test]
    fn test_time_zone_override() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let mut b = builder().with_time_zone(offset);
        b.date_range2(None, Some("2024-01-31"), "date").unwrap();

        let value = bucket(&b.params(), |q| &q.filter)[0].as_value().clone();
        assert_eq!(value["range"]["date"]["time_zone"], json!("-05:00"));
    }

    #[test]
    fn test_keywords_sets_min_score() {
        let mut b = builder();
        b.keywords("red shoes", "title");

        let params = b.params();
        assert_eq!(params.body.min_score, Some(DEFAULT_MIN_SCORE));
        assert_eq!(bucket(&params, |q| &q.must).len(), 1);
        assert!(bucket(&params, |q| &q.filter).is_empty());
    }

    #[test]
    fn test_sort_is_multi_key_in_call_order() {
        let mut b = builder();
        b.sort("created_at", SortOrder::Desc).sort("id", SortOrder::default());

        assert_eq!(
            b.params().body.sort,
            vec![
                json!({"created_at": {"order": "desc"}}),
                json!({"id": {"order": "asc"}}),
            ]
        );
    }

    #[test]
    fn test_aggregates_merge_last_wins() {
        let mut b = builder();
        b.add_aggregates([("total", aggregation::sum("price")), ("users", aggregation::cardinality("uid"))]);
        b.add_aggregates([("total", aggregation::avg("price")), ("top", aggregation::max("price"))]);

        let aggs = b.params().body.aggs.unwrap();
        assert_eq!(aggs.len(), 3);
        assert_eq!(aggs["total"], aggregation::avg("price"));
        assert_eq!(aggs.keys().collect::<Vec<_>>(), vec!["total", "users", "top"]);
    }

    #[test]
    fn test_collapse_last_wins() {
        let mut b = builder();
        b.collapse("sku").collapse("shop_id");

        assert_eq!(b.params().body.collapse, Some(json!({"field": "shop_id"})));
    }

    #[test]
    fn test_field_update_script_shapes() {
        let mut b = builder();

        b.set_field_update_script("name", None);
        assert!(b.params().body.script.unwrap().is_removal());

        b.set_field_update_script("name", Some(json!("x")));
        let script = b.params().body.script.unwrap();
        assert!(!script.is_removal());
        assert_eq!(script.params["value"], json!("x"));
        assert!(script.source.contains("params.value"));
        assert!(!script.source.contains("\"x\""));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut b = builder();
        b.term("a", 1);
        let snapshot = b.params();

        b.term("b", 2).paginate(5, 5);

        assert_eq!(bucket(&snapshot, |q| &q.filter).len(), 1);
        assert_eq!(snapshot.from, None);
    }

    #[test]
    fn test_document_becomes_body() {
        let mut b = builder();
        b.id("7").document(json!({"title": "hat"}));

        let value = b.params().to_value().unwrap();
        assert_eq!(value["body"], json!({"title": "hat"}));
        assert_eq!(value["id"], json!("7"));
    }

    #[test]
    fn test_track_total_hits_forms() {
        assert_eq!(TrackTotalHits::from(20_000u64).to_string(), "20000");
        assert_eq!(TrackTotalHits::from(true).to_string(), "true");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
