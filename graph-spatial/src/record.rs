use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SpatialResult;
use crate::session::Row;

/// A node as projected by every gateway statement:
/// `{id: id(n), labels: labels(n), properties: properties(n)}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl NodeRecord {
    pub fn new(id: i64) -> Self {
        NodeRecord {
            id,
            labels: BTreeSet::new(),
            properties: Map::new(),
        }
    }

    /// Reads the node projected into `column`.
    pub fn from_row(row: &Row, column: &str) -> SpatialResult<NodeRecord> {
        row.get(column)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// A string property; `None` if absent or not a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}
