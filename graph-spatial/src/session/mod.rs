//! The query-execution seam between the gateway and the remote store.
//!
//! The gateway only ever talks to a [`CypherSession`]. Rows coming back are
//! plain column maps; typed access goes through [`Row::get`], which is where
//! the row schema is enforced.

mod http;

pub use http::HttpCypherSession;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{SpatialError, SpatialResult};

/// A named, parameterized Cypher statement.
///
/// The name identifies the statement kind (`add_wkt`, `bbox`, ...) in logs
/// and lets test doubles dispatch without parsing Cypher.
#[derive(Debug, Clone, PartialEq)]
pub struct CypherQuery {
    name: &'static str,
    text: String,
    params: Map<String, Value>,
}

impl CypherQuery {
    pub fn new(name: &'static str, text: impl Into<String>) -> Self {
        CypherQuery {
            name,
            text: text.into(),
            params: Map::new(),
        }
    }

    /// Adds a named parameter.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Reads a parameter through serde.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Decode`] if the parameter is missing or has
    /// the wrong shape.
    pub fn get_param<T: DeserializeOwned>(&self, key: &str) -> SpatialResult<T> {
        let value = self.params.get(key).ok_or_else(|| {
            SpatialError::Decode(format!("statement {} has no parameter '{}'", self.name, key))
        })?;
        serde_json::from_value(value.clone()).map_err(|e| {
            SpatialError::Decode(format!(
                "parameter '{}' of statement {}: {}",
                key, self.name, e
            ))
        })
    }
}

/// One result row: column name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Map<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Zips column names with a positional row.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Decode`] if the lengths differ.
    pub fn from_columns(columns: &[String], values: Vec<Value>) -> SpatialResult<Row> {
        if columns.len() != values.len() {
            return Err(SpatialError::Decode(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )));
        }
        Ok(Row {
            values: columns.iter().cloned().zip(values).collect(),
        })
    }

    /// Builder-style column setter.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.values.insert(column.to_string(), value.into());
        self
    }

    pub fn value(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Deserializes a required column.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Decode`] if the column is missing or does not
    /// match `T`.
    pub fn get<T: DeserializeOwned>(&self, column: &str) -> SpatialResult<T> {
        let value = self
            .values
            .get(column)
            .ok_or_else(|| SpatialError::Decode(format!("missing column '{}'", column)))?;
        serde_json::from_value(value.clone())
            .map_err(|e| SpatialError::Decode(format!("column '{}': {}", column, e)))
    }

    /// Deserializes an optional column; missing and null both give `None`.
    pub fn get_opt<T: DeserializeOwned>(&self, column: &str) -> SpatialResult<Option<T>> {
        match self.values.get(column) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(column).map(Some),
        }
    }
}

/// Executes Cypher statements against the remote store.
///
/// Each call is one blocking request/response exchange. Implementations own
/// connection handling, timeouts and transactions.
pub trait CypherSession: Send + Sync {
    fn run(&self, query: &CypherQuery) -> SpatialResult<Vec<Row>>;
}
