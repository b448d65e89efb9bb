//! Gateway configuration.

use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::GeometryType;

/// Node property holding a geometry's name.
pub const NAME_PROPERTY: &str = "geometry_name";
/// Node property holding a geometry's WKT.
pub const WKT_PROPERTY: &str = "wkt";
/// Label applied to every node managed by the gateway.
pub const SPATIAL_LABEL: &str = "graph_spatial";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:7474";
pub const DEFAULT_DATABASE: &str = "neo4j";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_ENDPOINT: &str = "GRAPH_SPATIAL_ENDPOINT";
pub const ENV_DATABASE: &str = "GRAPH_SPATIAL_DATABASE";
pub const ENV_USER: &str = "GRAPH_SPATIAL_USER";
pub const ENV_PASSWORD: &str = "GRAPH_SPATIAL_PASSWORD";
pub const ENV_TIMEOUT_SECS: &str = "GRAPH_SPATIAL_TIMEOUT_SECS";

/// Gateway configuration.
///
/// Cloneable and immutable once built; clones share the same settings.
/// Create it through [`SpatialConfig::builder`] or [`SpatialConfig::from_env`].
///
/// ```rust
/// use graph_spatial::SpatialConfig;
///
/// let config = SpatialConfig::builder()
///     .endpoint("http://db.internal:7474")
///     .credentials("neo4j", "secret")
///     .fail_on_existing_layer(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.commit_url(), "http://db.internal:7474/db/neo4j/tx/commit");
/// ```
#[derive(Clone)]
pub struct SpatialConfig {
    inner: Arc<SpatialConfigInner>,
}

#[derive(Clone)]
struct SpatialConfigInner {
    endpoint: String,
    database: String,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: u64,
    name_property: String,
    geometry_property: String,
    spatial_label: String,
    fail_on_existing_layer: bool,
}

impl Default for SpatialConfigInner {
    fn default() -> Self {
        SpatialConfigInner {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            name_property: NAME_PROPERTY.to_string(),
            geometry_property: WKT_PROPERTY.to_string(),
            spatial_label: SPATIAL_LABEL.to_string(),
            fail_on_existing_layer: false,
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        SpatialConfig {
            inner: Arc::new(SpatialConfigInner::default()),
        }
    }
}

impl fmt::Debug for SpatialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialConfig")
            .field("endpoint", &self.inner.endpoint)
            .field("database", &self.inner.database)
            .field("username", &self.inner.username)
            .field("has_password", &self.inner.password.is_some())
            .field("timeout_secs", &self.inner.timeout_secs)
            .field("name_property", &self.inner.name_property)
            .field("geometry_property", &self.inner.geometry_property)
            .field("spatial_label", &self.inner.spatial_label)
            .field("fail_on_existing_layer", &self.inner.fail_on_existing_layer)
            .finish()
    }
}

impl SpatialConfig {
    /// Starts a builder seeded with the defaults.
    pub fn builder() -> SpatialConfigBuilder {
        SpatialConfigBuilder {
            inner: SpatialConfigInner::default(),
        }
    }

    /// Builds a configuration from the `GRAPH_SPATIAL_*` environment
    /// variables, falling back to defaults for unset ones.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Config`] if a variable holds an invalid value.
    pub fn from_env() -> SpatialResult<SpatialConfig> {
        SpatialConfig::builder().with_env()?.build()
    }

    /// Server root, without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Database name used in the transactional endpoint path.
    pub fn database(&self) -> &str {
        &self.inner.database
    }

    /// Basic-auth credentials, if both parts are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.inner.username, &self.inner.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.inner.timeout_secs)
    }

    /// Node property holding the geometry name.
    pub fn name_property(&self) -> &str {
        &self.inner.name_property
    }

    /// Node property holding the WKT; also the layer's encoder config.
    pub fn geometry_property(&self) -> &str {
        &self.inner.geometry_property
    }

    /// Marker label applied to every geometry node.
    pub fn spatial_label(&self) -> &str {
        &self.inner.spatial_label
    }

    /// Whether `create_layer` fails for an existing layer.
    pub fn fail_on_existing_layer(&self) -> bool {
        self.inner.fail_on_existing_layer
    }

    /// The transactional commit URL for single-request statements.
    pub fn commit_url(&self) -> String {
        format!("{}/db/{}/tx/commit", self.inner.endpoint, self.inner.database)
    }
}

/// Consuming builder for [`SpatialConfig`].
pub struct SpatialConfigBuilder {
    inner: SpatialConfigInner,
}

impl SpatialConfigBuilder {
    #[inline]
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.inner.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    #[inline]
    pub fn database(mut self, database: &str) -> Self {
        self.inner.database = database.to_string();
        self
    }

    #[inline]
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.inner.username = Some(username.to_string());
        self.inner.password = Some(password.to_string());
        self
    }

    #[inline]
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.inner.timeout_secs = timeout_secs;
        self
    }

    #[inline]
    pub fn name_property(mut self, name_property: &str) -> Self {
        self.inner.name_property = name_property.to_string();
        self
    }

    #[inline]
    pub fn geometry_property(mut self, geometry_property: &str) -> Self {
        self.inner.geometry_property = geometry_property.to_string();
        self
    }

    #[inline]
    pub fn spatial_label(mut self, spatial_label: &str) -> Self {
        self.inner.spatial_label = spatial_label.to_string();
        self
    }

    #[inline]
    pub fn fail_on_existing_layer(mut self, fail: bool) -> Self {
        self.inner.fail_on_existing_layer = fail;
        self
    }

    /// Applies the `GRAPH_SPATIAL_*` environment variables that are set.
    pub fn with_env(self) -> SpatialResult<Self> {
        self.with_vars(|key| env::var(key).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> SpatialResult<Self> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self = self.endpoint(&endpoint);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self = self.database(&database);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.inner.username = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.inner.password = Some(password);
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                SpatialError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_TIMEOUT_SECS, timeout
                ))
            })?;
            self = self.timeout_secs(secs);
        }
        Ok(self)
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Config`] for a non-HTTP endpoint, an empty
    /// database, property or label name, or a zero timeout.
    pub fn build(self) -> SpatialResult<SpatialConfig> {
        let inner = self.inner;
        if !(inner.endpoint.starts_with("http://") || inner.endpoint.starts_with("https://")) {
            return Err(SpatialError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                inner.endpoint
            )));
        }
        for (what, value) in [
            ("database", &inner.database),
            ("name property", &inner.name_property),
            ("geometry property", &inner.geometry_property),
            ("spatial label", &inner.spatial_label),
        ] {
            if value.trim().is_empty() {
                return Err(SpatialError::Config(format!("{} must not be empty", what)));
            }
        }
        if GeometryType::from_label(&inner.spatial_label).is_some() {
            return Err(SpatialError::Config(format!(
                "spatial label '{}' clashes with a geometry type label",
                inner.spatial_label
            )));
        }
        if inner.timeout_secs == 0 {
            return Err(SpatialError::Config("timeout must be positive".to_string()));
        }
        Ok(SpatialConfig {
            inner: Arc::new(inner),
        })
    }
}
