use thiserror::Error;

/// Errors raised by the geometry gateway and its collaborators.
///
/// Validation errors (`InvalidWkt`, `InvalidBoundingBox`) are raised locally
/// before any statement is sent. Existence errors are raised only after the
/// remote store has answered the lookup.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("Invalid WKT: {0}")]
    InvalidWkt(String),

    #[error("Geometry '{geometry_name}' already exists in layer '{layer_name}'")]
    GeometryExists {
        geometry_name: String,
        layer_name: String,
    },

    #[error("Geometry '{0}' not found")]
    GeometryNotFound(String),

    #[error("Geometry '{geometry_name}' exists in {count} layers, a layer name is required")]
    AmbiguousGeometry { geometry_name: String, count: usize },

    #[error("Node {0} not found")]
    NodeNotFound(i64),

    #[error("Layer '{0}' already exists")]
    LayerExists(String),

    #[error("Layer '{0}' not found")]
    LayerNotFound(String),

    #[error("Invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("Invalid distance: {0}")]
    InvalidDistance(f64),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Database error [{code}]: {message}")]
    Database { code: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SpatialError {
    /// Returns true for the lookup-miss variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SpatialError::GeometryNotFound(_)
                | SpatialError::NodeNotFound(_)
                | SpatialError::LayerNotFound(_)
        )
    }

    /// Returns true for errors detected locally, before any remote call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SpatialError::InvalidWkt(_)
                | SpatialError::InvalidBoundingBox(_)
                | SpatialError::InvalidDistance(_)
                | SpatialError::Config(_)
        )
    }
}

impl From<serde_json::Error> for SpatialError {
    fn from(err: serde_json::Error) -> Self {
        SpatialError::Decode(err.to_string())
    }
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;
