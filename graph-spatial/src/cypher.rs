//! Cypher statements issued by the gateway.
//!
//! Values always travel as parameters. Labels and property keys cannot be
//! parameterized in Cypher, so they are interpolated as backtick-escaped
//! identifiers. Nodes are always projected as
//! `{id: id(n), labels: labels(n), properties: properties(n)}` so that rows
//! decode into [`NodeRecord`](crate::record::NodeRecord).

use crate::bounding_box::BoundingBox;
use crate::config::SpatialConfig;
use crate::geometry::{GeoPoint, GeometryType};
use crate::session::CypherQuery;

/// Column holding a projected geometry or plain node.
pub const NODE_COLUMN: &str = "node";
/// Column holding a projected layer node.
pub const LAYER_COLUMN: &str = "layer";
/// Column holding the name of the layer indexing a geometry.
pub const LAYER_NAME_COLUMN: &str = "layer_name";
/// Column holding the server-computed distance in kilometres.
pub const DISTANCE_COLUMN: &str = "distance";
/// Column holding the id of a removed node.
pub const NODE_ID_COLUMN: &str = "node_id";

/// Quotes a label or property key for interpolation into Cypher text.
pub fn escape_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn project(var: &str) -> String {
    format!(
        "{{id: id({v}), labels: labels({v}), properties: properties({v})}}",
        v = var
    )
}

fn label_list<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
    labels
        .into_iter()
        .map(|l| format!(":{}", escape_identifier(l)))
        .collect()
}

/// Builds the gateway's statements from the configured property names and
/// marker label.
#[derive(Debug, Clone)]
pub struct Statements {
    config: SpatialConfig,
}

impl Statements {
    pub fn new(config: SpatialConfig) -> Self {
        Statements { config }
    }

    fn name_key(&self) -> String {
        escape_identifier(self.config.name_property())
    }

    fn geometry_key(&self) -> String {
        escape_identifier(self.config.geometry_property())
    }

    /// Marker, type and layer labels for a geometry node.
    fn geometry_labels(&self, geometry_type: GeometryType, layer_name: &str) -> String {
        label_list([self.config.spatial_label(), geometry_type.label(), layer_name])
    }

    pub fn find_layer(&self, layer_name: &str) -> CypherQuery {
        CypherQuery::new(
            "find_layer",
            format!(
                "MATCH (:ReferenceNode)-[:LAYER]->(layer {{layer: $layer}}) RETURN {} AS {}",
                project("layer"),
                LAYER_COLUMN
            ),
        )
        .param("layer", layer_name)
    }

    pub fn add_wkt_layer(&self, layer_name: &str) -> CypherQuery {
        CypherQuery::new(
            "add_wkt_layer",
            format!(
                "CALL spatial.addWKTLayer($layer, $geometry_property) YIELD node RETURN {} AS {}",
                project("node"),
                LAYER_COLUMN
            ),
        )
        .param("layer", layer_name)
        .param("geometry_property", self.config.geometry_property())
    }

    pub fn remove_layer(&self, layer_name: &str) -> CypherQuery {
        CypherQuery::new("remove_layer", "CALL spatial.removeLayer($layer)").param("layer", layer_name)
    }

    /// Geometry nodes by name with the name of the layer whose R-tree
    /// references them, optionally restricted to that layer.
    ///
    /// Scoping goes through the index rather than the layer label, since a
    /// layer may share its name with a geometry type label.
    pub fn find_geometry(&self, geometry_name: &str, layer_name: Option<&str>) -> CypherQuery {
        CypherQuery::new(
            "find_geometry",
            format!(
                "MATCH (n{labels}) WHERE n.{name} = $geometry_name \
                 OPTIONAL MATCH (n)<-[:RTREE_REFERENCE]-()<-[:RTREE_CHILD*0..]-()<-[:RTREE_ROOT]-(layer) \
                 WITH n, layer WHERE $layer IS NULL OR layer.layer = $layer \
                 RETURN {node} AS {node_col}, layer.layer AS {layer_col}",
                labels = label_list([self.config.spatial_label()]),
                name = self.name_key(),
                node = project("n"),
                node_col = NODE_COLUMN,
                layer_col = LAYER_NAME_COLUMN
            ),
        )
        .param("geometry_name", geometry_name)
        .param("layer", layer_name)
    }

    pub fn find_node(&self, node_id: i64) -> CypherQuery {
        CypherQuery::new(
            "find_node",
            format!(
                "MATCH (n) WHERE id(n) = $node_id RETURN {} AS {}",
                project("n"),
                NODE_COLUMN
            ),
        )
        .param("node_id", node_id)
    }

    /// Creates a geometry node through the layer's encoder, then names and
    /// labels it.
    pub fn add_wkt(
        &self,
        geometry_name: &str,
        wkt: &str,
        layer_name: &str,
        geometry_type: GeometryType,
    ) -> CypherQuery {
        CypherQuery::new(
            "add_wkt",
            format!(
                "CALL spatial.addWKT($layer, $wkt) YIELD node \
                 SET node.{name} = $geometry_name, node{labels} \
                 RETURN {node} AS {node_col}",
                name = self.name_key(),
                labels = self.geometry_labels(geometry_type, layer_name),
                node = project("node"),
                node_col = NODE_COLUMN
            ),
        )
        .param("layer", layer_name)
        .param("wkt", wkt)
        .param("geometry_name", geometry_name)
    }

    /// Turns an existing node into a geometry of the layer in place.
    pub fn add_node(
        &self,
        node_id: i64,
        geometry_name: &str,
        wkt: &str,
        layer_name: &str,
        geometry_type: GeometryType,
    ) -> CypherQuery {
        CypherQuery::new(
            "add_node",
            format!(
                "MATCH (n) WHERE id(n) = $node_id \
                 SET n.{geometry} = $wkt, n.{name} = $geometry_name, n{labels} \
                 WITH n CALL spatial.addNode($layer, n) YIELD node \
                 RETURN {node} AS {node_col}",
                geometry = self.geometry_key(),
                name = self.name_key(),
                labels = self.geometry_labels(geometry_type, layer_name),
                node = project("node"),
                node_col = NODE_COLUMN
            ),
        )
        .param("node_id", node_id)
        .param("layer", layer_name)
        .param("wkt", wkt)
        .param("geometry_name", geometry_name)
    }

    /// Re-encodes a geometry from new WKT and swaps its type label.
    ///
    /// A type label equal to the layer name is the layer label and stays.
    pub fn update_from_wkt(
        &self,
        node_id: i64,
        wkt: &str,
        layer_name: &str,
        geometry_type: GeometryType,
    ) -> CypherQuery {
        let stale_types = GeometryType::ALL
            .iter()
            .map(|t| t.label())
            .filter(|label| *label != layer_name && *label != geometry_type.label());
        CypherQuery::new(
            "update_from_wkt",
            format!(
                "CALL spatial.updateFromWKT($layer, $wkt, $node_id) YIELD node \
                 REMOVE node{stale_types} \
                 SET node{new_type} \
                 RETURN {node} AS {node_col}",
                stale_types = label_list(stale_types),
                new_type = label_list([geometry_type.label()]),
                node = project("node"),
                node_col = NODE_COLUMN
            ),
        )
        .param("layer", layer_name)
        .param("wkt", wkt)
        .param("node_id", node_id)
    }

    /// Drops a geometry from the layer index and deletes its node.
    pub fn remove_geometry(&self, node_id: i64, layer_name: &str) -> CypherQuery {
        CypherQuery::new(
            "remove_geometry",
            format!(
                "MATCH (n) WHERE id(n) = $node_id \
                 CALL spatial.removeNode($layer, n) YIELD nodeId \
                 WITH n, nodeId DETACH DELETE n \
                 RETURN nodeId AS {}",
                NODE_ID_COLUMN
            ),
        )
        .param("node_id", node_id)
        .param("layer", layer_name)
    }

    pub fn bbox(&self, layer_name: &str, bbox: &BoundingBox) -> CypherQuery {
        CypherQuery::new(
            "bbox",
            format!(
                "CALL spatial.bbox($layer, {{longitude: $min_x, latitude: $min_y}}, \
                 {{longitude: $max_x, latitude: $max_y}}) YIELD node \
                 RETURN {} AS {}",
                project("node"),
                NODE_COLUMN
            ),
        )
        .param("layer", layer_name)
        .param("min_x", bbox.min_x)
        .param("min_y", bbox.min_y)
        .param("max_x", bbox.max_x)
        .param("max_y", bbox.max_y)
    }

    pub fn within_distance(&self, layer_name: &str, center: &GeoPoint, distance_km: f64) -> CypherQuery {
        CypherQuery::new(
            "within_distance",
            format!(
                "CALL spatial.withinDistance($layer, {{longitude: $longitude, latitude: $latitude}}, $distance_km) \
                 YIELD node, distance \
                 RETURN {} AS {}, distance AS {} ORDER BY distance",
                project("node"),
                NODE_COLUMN,
                DISTANCE_COLUMN
            ),
        )
        .param("layer", layer_name)
        .param("longitude", center.longitude())
        .param("latitude", center.latitude())
        .param("distance_km", distance_km)
    }
}
