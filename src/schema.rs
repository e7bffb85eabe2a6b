//! Field mappings used when creating indices

use serde_json::{json, Map, Value};

/// Supplies the field → descriptor mapping for an index.
///
/// An empty mapping means "no schema declared"; mapping creation is then a
/// no-op.
pub trait SchemaProvider: Send + Sync {
    fn mapping_properties(&self) -> Map<String, Value>;
}

/// Schema declared up front, in field order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticSchema {
    properties: Map<String, Value>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field with just a type, e.g. `keyword`
    pub fn field(self, name: impl Into<String>, field_type: &str) -> Self {
        self.property(name, json!({ "type": field_type }))
    }

    /// Add a field with a full descriptor
    pub fn property(mut self, name: impl Into<String>, descriptor: Value) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }
}

impl From<Map<String, Value>> for StaticSchema {
    fn from(properties: Map<String, Value>) -> Self {
        Self { properties }
    }
}

impl SchemaProvider for StaticSchema {
    fn mapping_properties(&self) -> Map<String, Value> {
        self.properties.clone()
    }
}
