use std::fmt;

use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SpatialConfig;
use crate::errors::{SpatialError, SpatialResult};
use crate::session::{CypherQuery, CypherSession, Row};

/// [`CypherSession`] over the server's HTTP transactional endpoint.
///
/// Every statement is posted on its own to `/db/{database}/tx/commit`, so it
/// runs in a single auto-committed transaction.
pub struct HttpCypherSession {
    client: reqwest::blocking::Client,
    commit_url: String,
    credentials: Option<(String, String)>,
}

impl fmt::Debug for HttpCypherSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCypherSession")
            .field("commit_url", &self.commit_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish()
    }
}

impl HttpCypherSession {
    /// Creates a session from the configured endpoint, database, credentials
    /// and timeout.
    pub fn new(config: &SpatialConfig) -> SpatialResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SpatialError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpCypherSession {
            client,
            commit_url: config.commit_url(),
            credentials: config
                .credentials()
                .map(|(user, password)| (user.to_string(), password.to_string())),
        })
    }

    pub fn commit_url(&self) -> &str {
        &self.commit_url
    }
}

impl CypherSession for HttpCypherSession {
    fn run(&self, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        log::debug!("POST {} ({})", self.commit_url, query.name());
        let mut request = self
            .client
            .post(&self.commit_url)
            .header(ACCEPT, "application/json;charset=UTF-8")
            .json(&tx_request(query));
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, Some(password));
        }

        let response = request.send().map_err(|e| {
            SpatialError::Transport(format!("POST {} failed: {}", self.commit_url, e))
        })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| SpatialError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            // the server reports statement failures in the body even on error statuses
            if let Ok(TxResponse { errors, .. }) = serde_json::from_slice::<TxResponse>(&bytes) {
                if let Some(error) = errors.into_iter().next() {
                    return Err(error.into());
                }
            }
            return Err(SpatialError::Transport(format!(
                "HTTP {} from POST {}",
                status, self.commit_url
            )));
        }

        decode_response(&bytes)
    }
}

#[derive(Serialize)]
struct TxRequest<'a> {
    statements: Vec<TxStatement<'a>>,
}

#[derive(Serialize)]
struct TxStatement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Deserialize)]
struct TxResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<TxRow>,
}

#[derive(Deserialize)]
struct TxRow {
    row: Vec<Value>,
}

#[derive(Deserialize)]
struct TxError {
    code: String,
    message: String,
}

impl From<TxError> for SpatialError {
    fn from(error: TxError) -> Self {
        SpatialError::Database {
            code: error.code,
            message: error.message,
        }
    }
}

fn tx_request(query: &CypherQuery) -> TxRequest<'_> {
    TxRequest {
        statements: vec![TxStatement {
            statement: query.text(),
            parameters: query.params(),
        }],
    }
}

fn decode_response(body: &[u8]) -> SpatialResult<Vec<Row>> {
    let response: TxResponse = serde_json::from_slice(body)?;
    if let Some(error) = response.errors.into_iter().next() {
        return Err(error.into());
    }

    let mut rows = Vec::new();
    for result in response.results {
        for data in result.data {
            rows.push(Row::from_columns(&result.columns, data.row)?);
        }
    }
    Ok(rows)
}
