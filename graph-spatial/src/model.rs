//! Domain objects returned by the gateway.
//!
//! Each wraps the [`NodeRecord`] it was decoded from, so callers can still
//! reach the raw labels and properties.

use std::collections::BTreeSet;
use std::ops::Deref;

use serde_json::{Map, Value};

use crate::config::SpatialConfig;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::{GeoPoint, GeometryType};
use crate::record::NodeRecord;
use crate::shape::{parse_wkt, Shape};

/// Layer node property holding the layer name.
pub const LAYER_PROPERTY: &str = "layer";
/// Layer node property naming the geometry encoder class.
pub const ENCODER_PROPERTY: &str = "geomencoder";
/// Layer node property holding the encoder configuration.
pub const ENCODER_CONFIG_PROPERTY: &str = "geomencoder_config";
/// Encoder class of WKT layers.
pub const WKT_ENCODER: &str = "org.neo4j.gis.spatial.WKTGeometryEncoder";

/// A named partition of geometries in the remote spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    name: String,
    node: NodeRecord,
}

impl Layer {
    pub(crate) fn from_node(node: NodeRecord) -> SpatialResult<Layer> {
        let name = node
            .property_str(LAYER_PROPERTY)
            .ok_or_else(|| {
                SpatialError::Decode(format!(
                    "layer node {} has no '{}' property",
                    node.id, LAYER_PROPERTY
                ))
            })?
            .to_string();
        Ok(Layer { name, node })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_id(&self) -> i64 {
        self.node.id
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.node.properties
    }

    /// Fully-qualified class name of the layer's geometry encoder.
    pub fn geometry_encoder(&self) -> Option<&str> {
        self.node.property_str(ENCODER_PROPERTY)
    }

    /// The node property the encoder reads geometries from.
    pub fn encoder_config(&self) -> Option<&str> {
        self.node.property_str(ENCODER_CONFIG_PROPERTY)
    }

    pub fn is_wkt_encoded(&self) -> bool {
        self.geometry_encoder()
            .is_some_and(|encoder| encoder.ends_with("WKTGeometryEncoder"))
    }
}

/// A named shape attached to a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    geometry_name: String,
    wkt: String,
    geometry_type: GeometryType,
    layer_name: Option<String>,
    node: NodeRecord,
}

impl Geometry {
    /// Decodes a geometry node using the configured property names.
    ///
    /// The type comes from the stored WKT. Labels are not consulted, since
    /// a layer label may spell a type name.
    pub(crate) fn from_node(
        node: NodeRecord,
        config: &SpatialConfig,
        layer_name: Option<String>,
    ) -> SpatialResult<Geometry> {
        let geometry_name = required_str(&node, config.name_property())?.to_string();
        let wkt = required_str(&node, config.geometry_property())?.to_string();
        let geometry_type = parse_wkt(&wkt)
            .map_err(|e| {
                SpatialError::Decode(format!("node {} holds unreadable WKT: {}", node.id, e))
            })?
            .geometry_type();

        Ok(Geometry {
            geometry_name,
            wkt,
            geometry_type,
            layer_name,
            node,
        })
    }

    pub fn geometry_name(&self) -> &str {
        &self.geometry_name
    }

    /// The WKT as stored on the node.
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// The layer the geometry is indexed in, when the server reported it.
    pub fn layer_name(&self) -> Option<&str> {
        self.layer_name.as_deref()
    }

    pub fn node_id(&self) -> i64 {
        self.node.id
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.node.labels
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.node.properties
    }

    pub fn node(&self) -> &NodeRecord {
        &self.node
    }

    /// Parses the stored WKT.
    pub fn shape(&self) -> SpatialResult<Shape> {
        parse_wkt(&self.wkt)
    }
}

fn required_str<'a>(node: &'a NodeRecord, key: &str) -> SpatialResult<&'a str> {
    node.property_str(key).ok_or_else(|| {
        SpatialError::Decode(format!(
            "node {} has no string property '{}'",
            node.id, key
        ))
    })
}

/// A point geometry created from a latitude/longitude pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    geometry: Geometry,
    location: GeoPoint,
}

impl PointOfInterest {
    pub(crate) fn new(geometry: Geometry, location: GeoPoint) -> Self {
        PointOfInterest { geometry, location }
    }

    pub fn latitude(&self) -> f64 {
        self.location.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.location.longitude()
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn into_geometry(self) -> Geometry {
        self.geometry
    }
}

impl Deref for PointOfInterest {
    type Target = Geometry;

    fn deref(&self) -> &Geometry {
        &self.geometry
    }
}
