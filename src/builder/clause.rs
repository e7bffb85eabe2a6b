//! Clause constructors for boolean query buckets

use super::script::Script;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A structured query fragment appended to one of the boolean buckets.
///
/// Clauses are opaque once built: the builder appends them, it never
/// merges two clauses into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Clause(Value);

impl Clause {
    /// Exact match: `{"term": {field: value}}`
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field: String = field.into();
        let value: Value = value.into();
        Self(json!({ "term": { field: value } }))
    }

    /// Membership: `{"terms": {field: [values]}}`
    pub fn terms<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let field: String = field.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        Self(json!({ "terms": { field: values } }))
    }

    /// Range over a field. Returns `None` when no bound is set.
    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Option<Self> {
        if bounds.is_empty() {
            return None;
        }

        let field: String = field.into();
        Some(Self(json!({ "range": { field: bounds } })))
    }

    /// Full-text match requiring every term: `operator: and`
    pub fn match_all_terms(field: impl Into<String>, text: impl Into<String>) -> Self {
        let field: String = field.into();
        let text: String = text.into();
        Self(json!({
            "match": {
                field: {
                    "query": text,
                    "operator": "and",
                }
            }
        }))
    }

    /// Script filter clause
    pub fn script(script: &Script) -> Self {
        Self(json!({ "script": { "script": script } }))
    }

    /// Wrap an arbitrary query fragment
    pub fn raw(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Clause {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Bounds of a range clause
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lte: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl RangeBounds {
    /// Closed interval built from whichever bounds are present
    pub fn closed(start: Option<Value>, end: Option<Value>) -> Self {
        Self {
            gte: start,
            lte: end,
            ..Default::default()
        }
    }

    /// Half-open interval `[start, end)`
    pub fn half_open(start: Value, end: Value) -> Self {
        Self {
            gte: Some(start),
            lt: Some(end),
            ..Default::default()
        }
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// True when no bound is set; a time zone alone does not count
    pub fn is_empty(&self) -> bool {
        self.gte.is_none() && self.lte.is_none() && self.lt.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_shape() {
        let clause = Clause::term("status", "active");
        assert_eq!(clause.as_value(), &json!({"term": {"status": "active"}}));
    }

    #[test]
    fn test_terms_shape() {
        let clause = Clause::terms("shop_id", vec![1, 2, 3]);
        assert_eq!(clause.as_value(), &json!({"terms": {"shop_id": [1, 2, 3]}}));
    }

    #[test]
    fn test_range_skips_missing_bounds() {
        let clause = Clause::range("price", RangeBounds::closed(Some(json!(10)), None)).unwrap();
        assert_eq!(clause.as_value(), &json!({"range": {"price": {"gte": 10}}}));
    }

    #[test]
    fn test_empty_range_is_none() {
        let bounds = RangeBounds::default().with_time_zone("+08:00");
        assert!(Clause::range("date", bounds).is_none());
    }

    #[test]
    fn test_match_uses_and_operator() {
        let clause = Clause::match_all_terms("title", "red shoes");
        assert_eq!(
            clause.as_value(),
            &json!({"match": {"title": {"query": "red shoes", "operator": "and"}}})
        );
    }
}
