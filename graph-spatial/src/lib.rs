//! # Graph Spatial - Geometry Gateway for a Remote Spatial Graph Store
//!
//! This crate manages named geometries stored in a graph database's spatial
//! plugin (Neo4j Spatial). Indexing, persistence and transactions all live
//! on the server; the crate validates WKT locally, builds parameterized
//! Cypher statements and decodes the returned nodes into typed results.
//!
//! ## Features
//!
//! - **Layers**: create, look up and delete WKT-encoded layers
//! - **Geometries**: create from WKT or latitude/longitude, attach existing
//!   nodes, update and delete
//! - **Search**: bounding-box intersection and distance queries
//! - **Local Validation**: malformed WKT, coordinates and boxes never reach
//!   the server
//! - **Pluggable Sessions**: the gateway talks to a [`CypherSession`]; an
//!   HTTP implementation over the transactional endpoint is included
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use graph_spatial::{SpatialConfig, SpatialGateway};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SpatialConfig::builder()
//!     .endpoint("http://localhost:7474")
//!     .credentials("neo4j", "password")
//!     .build()?;
//! let gateway = SpatialGateway::connect(config)?;
//!
//! gateway.create_layer("uk")?;
//! gateway.create_geometry(
//!     "cornwall",
//!     "POLYGON ((-5.7 50.0, -4.2 50.3, -4.5 50.9, -5.7 50.0))",
//!     "uk",
//! )?;
//!
//! for geometry in gateway.find_within_bounding_box("uk", -10.0, 40.0, 10.0, 80.0)? {
//!     println!("{} {}", geometry.geometry_name(), geometry.wkt());
//! }
//! # Ok(())
//! # }
//! ```

// Geometry primitives
pub mod bounding_box;
pub mod geometry;
pub mod shape;

// Remote access
pub mod config;
pub mod cypher;
pub mod errors;
pub mod record;
pub mod session;

// Gateway
pub mod gateway;
pub mod model;

pub use bounding_box::BoundingBox;
pub use errors::{SpatialError, SpatialResult};

// Re-export geometry types
pub use geometry::{parse_lat_long_to_point, Coordinate, GeoPoint, GeometryType};
pub use shape::{parse_wkt, Shape};

// Re-export configuration
pub use config::{SpatialConfig, SpatialConfigBuilder, NAME_PROPERTY, SPATIAL_LABEL, WKT_PROPERTY};

// Re-export session types
pub use record::NodeRecord;
pub use session::{CypherQuery, CypherSession, HttpCypherSession, Row};

pub use gateway::SpatialGateway;
pub use model::{Geometry, Layer, PointOfInterest, WKT_ENCODER};
