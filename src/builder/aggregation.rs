//! Aggregation definitions for `RequestBuilder::add_aggregates`

use serde_json::{json, Value};

pub fn sum(field: &str) -> Value {
    json!({ "sum": { "field": field } })
}

pub fn avg(field: &str) -> Value {
    json!({ "avg": { "field": field } })
}

pub fn max(field: &str) -> Value {
    json!({ "max": { "field": field } })
}

pub fn min(field: &str) -> Value {
    json!({ "min": { "field": field } })
}

pub fn cardinality(field: &str) -> Value {
    json!({ "cardinality": { "field": field } })
}

/// Terms bucket aggregation with an explicit size and order
pub fn terms(field: &str, size: u32, order: Value) -> Value {
    json!({
        "terms": {
            "field": field,
            "size": size,
            "order": order,
        }
    })
}

/// Terms aggregation with ten buckets sorted by key ascending
pub fn terms_by_key(field: &str) -> Value {
    terms(field, 10, json!({ "_key": "asc" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_shapes() {
        assert_eq!(sum("amount"), json!({"sum": {"field": "amount"}}));
        assert_eq!(cardinality("user_id"), json!({"cardinality": {"field": "user_id"}}));
    }

    #[test]
    fn test_terms_defaults() {
        assert_eq!(
            terms_by_key("shop_id"),
            json!({"terms": {"field": "shop_id", "size": 10, "order": {"_key": "asc"}}})
        );
    }
}
