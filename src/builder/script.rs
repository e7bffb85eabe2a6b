//! Update scripts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Script language tag the engine expects for update-by-query
pub const PAINLESS: &str = "painless";

const ASSIGN_FIELD_SOURCE: &str = "ctx._source[params.field] = params.value";
const REMOVE_FIELD_SOURCE: &str = "ctx._source.remove(params.field)";

/// A stored-source script with bound parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
}

impl Script {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            lang: None,
            params: Map::new(),
        }
    }

    /// Assign `value` to `column`. Both are bound parameters, never spliced
    /// into the source.
    pub fn assign_field(column: impl Into<String>, value: Value) -> Self {
        let column: String = column.into();
        Self::new(ASSIGN_FIELD_SOURCE)
            .with_param("field", column)
            .with_param("value", value)
    }

    /// Remove `column` from the document
    pub fn remove_field(column: impl Into<String>) -> Self {
        let column: String = column.into();
        Self::new(REMOVE_FIELD_SOURCE).with_param("field", column)
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// True when this script deletes a field rather than setting one
    pub fn is_removal(&self) -> bool {
        self.source == REMOVE_FIELD_SOURCE
    }
}
