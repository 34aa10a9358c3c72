//! Query Predicates

use serde_json::Value;

/// A `field == value` filter on a top-level document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub value: Value,
}

impl Predicate {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether `document` satisfies the predicate. A missing field never does.
    pub fn matches(&self, document: &serde_json::Map<String, Value>) -> bool {
        document.get(&self.field) == Some(&self.value)
    }
}
