//! An in-process stand-in for a Neo4j server with the spatial plugin.
//!
//! [`MemoryGraph`] answers the gateway's statements by name instead of
//! parsing Cypher. It keeps nodes, layers and the layer index in memory and
//! reproduces the procedure behaviour the gateway relies on: WKT layers
//! store geometries in their configured property, `bbox` matches envelopes
//! that intersect the query box, and calls against a missing layer fail with
//! a database error.

use std::collections::BTreeMap;
use std::sync::Arc;

use graph_spatial::cypher::{
    DISTANCE_COLUMN, LAYER_COLUMN, LAYER_NAME_COLUMN, NODE_COLUMN, NODE_ID_COLUMN,
};
use graph_spatial::model::{ENCODER_CONFIG_PROPERTY, ENCODER_PROPERTY, LAYER_PROPERTY};
use graph_spatial::{
    parse_wkt, BoundingBox, CypherQuery, CypherSession, GeoPoint, GeometryType, NodeRecord, Row,
    Shape, SpatialConfig, SpatialError, SpatialResult, WKT_ENCODER,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};

const PROCEDURE_FAILED: &str = "Neo.ClientError.Procedure.ProcedureCallFailed";
const UNKNOWN_STATEMENT: &str = "Neo.ClientError.Statement.SyntaxError";

#[derive(Default)]
struct GraphState {
    next_id: i64,
    nodes: BTreeMap<i64, NodeRecord>,
    /// layer name -> layer node id
    layers: BTreeMap<String, i64>,
    /// geometry node id -> layer name
    index: BTreeMap<i64, String>,
    executed: Vec<CypherQuery>,
}

impl GraphState {
    fn create_node(&mut self) -> &mut NodeRecord {
        self.next_id += 1;
        let id = self.next_id;
        self.nodes.entry(id).or_insert_with(|| NodeRecord::new(id))
    }

    fn layer(&self, layer_name: &str) -> SpatialResult<&NodeRecord> {
        self.layers
            .get(layer_name)
            .and_then(|id| self.nodes.get(id))
            .ok_or_else(|| procedure_failed(format!("No such layer '{}'", layer_name)))
    }

    /// The property a layer's encoder reads WKT from.
    fn wkt_property(&self, layer_name: &str) -> SpatialResult<String> {
        Ok(self
            .layer(layer_name)?
            .property_str(ENCODER_CONFIG_PROPERTY)
            .unwrap_or("wkt")
            .to_string())
    }

    fn indexed_shapes(&self, layer_name: &str) -> SpatialResult<Vec<(&NodeRecord, Shape)>> {
        let property = self.wkt_property(layer_name)?;
        let mut shapes = Vec::new();
        for (id, _) in self.index.iter().filter(|(_, layer)| *layer == layer_name) {
            if let Some(node) = self.nodes.get(id) {
                let wkt = node.property_str(&property).unwrap_or_default();
                shapes.push((node, parse_wkt(wkt).map_err(decode_failed)?));
            }
        }
        Ok(shapes)
    }
}

/// Shared, cloneable in-memory graph.
#[derive(Clone)]
pub struct MemoryGraph {
    config: SpatialConfig,
    state: Arc<Mutex<GraphState>>,
}

impl MemoryGraph {
    /// Creates an empty graph that labels and names geometries the way
    /// `config` says.
    pub fn new(config: &SpatialConfig) -> Self {
        MemoryGraph {
            config: config.clone(),
            state: Arc::new(Mutex::new(GraphState::default())),
        }
    }

    pub fn node(&self, node_id: i64) -> Option<NodeRecord> {
        self.state.lock().nodes.get(&node_id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.state.lock().layers.keys().cloned().collect()
    }

    /// Names of the statements run so far, oldest first.
    pub fn executed(&self) -> Vec<&'static str> {
        self.state.lock().executed.iter().map(|q| q.name()).collect()
    }

    fn dispatch(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        match query.name() {
            "find_layer" => self.find_layer(state, query),
            "add_wkt_layer" => self.add_wkt_layer(state, query),
            "remove_layer" => self.remove_layer(state, query),
            "find_geometry" => self.find_geometry(state, query),
            "find_node" => self.find_node(state, query),
            "add_wkt" => self.add_wkt(state, query),
            "add_node" => self.add_node(state, query),
            "update_from_wkt" => self.update_from_wkt(state, query),
            "remove_geometry" => self.remove_geometry(state, query),
            "bbox" => self.bbox(state, query),
            "within_distance" => self.within_distance(state, query),
            "create_node" => self.create_plain_node(state, query),
            "delete_node" => self.delete_node(state, query),
            other => Err(SpatialError::Database {
                code: UNKNOWN_STATEMENT.to_string(),
                message: format!("MemoryGraph does not understand '{}'", other),
            }),
        }
    }

    fn find_layer(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        match state.layer(&layer_name) {
            Ok(layer) => Ok(vec![node_row(LAYER_COLUMN, layer)?]),
            Err(_) => Ok(vec![]),
        }
    }

    fn add_wkt_layer(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        let geometry_property: String = query.get_param("geometry_property")?;
        if state.layers.contains_key(&layer_name) {
            return Err(procedure_failed(format!("Layer already exists: '{}'", layer_name)));
        }

        let layer = state.create_node();
        layer.properties.insert(LAYER_PROPERTY.to_string(), layer_name.clone().into());
        layer.properties.insert(ENCODER_PROPERTY.to_string(), WKT_ENCODER.into());
        layer.properties.insert(ENCODER_CONFIG_PROPERTY.to_string(), geometry_property.into());
        let row = node_row(LAYER_COLUMN, layer)?;
        let id = layer.id;
        state.layers.insert(layer_name, id);
        Ok(vec![row])
    }

    fn remove_layer(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        let layer_id = state.layer(&layer_name)?.id;

        // the plugin deletes the geometries together with the index
        let indexed: Vec<i64> = state
            .index
            .iter()
            .filter(|(_, layer)| **layer == layer_name)
            .map(|(id, _)| *id)
            .collect();
        for id in indexed {
            state.index.remove(&id);
            state.nodes.remove(&id);
        }
        state.nodes.remove(&layer_id);
        state.layers.remove(&layer_name);
        Ok(vec![])
    }

    fn find_geometry(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let geometry_name: String = query.get_param("geometry_name")?;
        let scope: Option<String> = query.get_param("layer")?;

        let mut rows = Vec::new();
        for node in state.nodes.values() {
            let indexed_in = state.index.get(&node.id);
            let matches = node.has_label(self.config.spatial_label())
                && node.property_str(self.config.name_property()) == Some(geometry_name.as_str())
                && scope.as_ref().map_or(true, |layer| indexed_in == Some(layer));
            if matches {
                let layer_name = indexed_in.cloned().map_or(Value::Null, Value::from);
                rows.push(node_row(NODE_COLUMN, node)?.with(LAYER_NAME_COLUMN, layer_name));
            }
        }
        Ok(rows)
    }

    fn find_node(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let node_id: i64 = query.get_param("node_id")?;
        match state.nodes.get(&node_id) {
            Some(node) => Ok(vec![node_row(NODE_COLUMN, node)?]),
            None => Ok(vec![]),
        }
    }

    fn add_wkt(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        let wkt: String = query.get_param("wkt")?;
        let geometry_name: String = query.get_param("geometry_name")?;
        let wkt_property = state.wkt_property(&layer_name)?;
        let geometry_type = parse_wkt(&wkt).map_err(procedure_failed)?.geometry_type();

        let node = state.create_node();
        node.properties.insert(wkt_property, wkt.into());
        node.properties.insert(self.config.name_property().to_string(), geometry_name.into());
        self.label_geometry(node, geometry_type, &layer_name);
        let row = node_row(NODE_COLUMN, node)?;
        let id = node.id;
        state.index.insert(id, layer_name);
        Ok(vec![row])
    }

    fn add_node(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let node_id: i64 = query.get_param("node_id")?;
        let layer_name: String = query.get_param("layer")?;
        let wkt: String = query.get_param("wkt")?;
        let geometry_name: String = query.get_param("geometry_name")?;
        if !state.nodes.contains_key(&node_id) {
            return Ok(vec![]);
        }
        state.layer(&layer_name)?;
        let geometry_type = parse_wkt(&wkt).map_err(procedure_failed)?.geometry_type();

        let node = state
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| procedure_failed(format!("Node {} vanished", node_id)))?;
        node.properties.insert(self.config.geometry_property().to_string(), wkt.into());
        node.properties.insert(self.config.name_property().to_string(), geometry_name.into());
        self.label_geometry(node, geometry_type, &layer_name);
        let row = node_row(NODE_COLUMN, node)?;
        state.index.insert(node_id, layer_name);
        Ok(vec![row])
    }

    fn update_from_wkt(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let node_id: i64 = query.get_param("node_id")?;
        let layer_name: String = query.get_param("layer")?;
        let wkt: String = query.get_param("wkt")?;
        let wkt_property = state.wkt_property(&layer_name)?;
        if state.index.get(&node_id) != Some(&layer_name) {
            return Err(procedure_failed(format!(
                "Node {} is not in layer '{}'",
                node_id, layer_name
            )));
        }
        let geometry_type = parse_wkt(&wkt).map_err(procedure_failed)?.geometry_type();

        let node = state
            .nodes
            .get_mut(&node_id)
            .ok_or_else(|| procedure_failed(format!("Node {} vanished", node_id)))?;
        node.properties.insert(wkt_property, wkt.into());
        for t in GeometryType::ALL.iter().filter(|t| t.label() != layer_name) {
            node.labels.remove(t.label());
        }
        node.labels.insert(geometry_type.label().to_string());
        Ok(vec![node_row(NODE_COLUMN, node)?])
    }

    fn remove_geometry(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let node_id: i64 = query.get_param("node_id")?;
        let layer_name: String = query.get_param("layer")?;
        state.layer(&layer_name)?;
        if !state.nodes.contains_key(&node_id) {
            return Ok(vec![]);
        }
        if state.index.get(&node_id) != Some(&layer_name) {
            return Err(procedure_failed(format!(
                "Node {} is not in layer '{}'",
                node_id, layer_name
            )));
        }

        state.index.remove(&node_id);
        state.nodes.remove(&node_id);
        Ok(vec![Row::new().with(NODE_ID_COLUMN, node_id)])
    }

    fn bbox(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        let search = BoundingBox::new(
            query.get_param("min_x")?,
            query.get_param("min_y")?,
            query.get_param("max_x")?,
            query.get_param("max_y")?,
        );

        state
            .indexed_shapes(&layer_name)?
            .into_iter()
            .filter(|(_, shape)| shape.bounding_box().intersects(&search))
            .map(|(node, _)| node_row(NODE_COLUMN, node))
            .collect()
    }

    /// Distance to the nearest vertex of each geometry, closest first.
    fn within_distance(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let layer_name: String = query.get_param("layer")?;
        let center = GeoPoint::new(query.get_param("latitude")?, query.get_param("longitude")?)
            .map_err(procedure_failed)?;
        let max_km: f64 = query.get_param("distance_km")?;

        let mut hits = Vec::new();
        for (node, shape) in state.indexed_shapes(&layer_name)? {
            let nearest = shape
                .coordinates()
                .into_iter()
                .filter_map(|c| GeoPoint::new(c.y, c.x).ok())
                .map(|p| center.distance_km(&p))
                .fold(f64::INFINITY, f64::min);
            if nearest <= max_km {
                hits.push((node, nearest));
            }
        }
        hits.sort_by(|a, b| a.1.total_cmp(&b.1));

        hits.into_iter()
            .map(|(node, distance)| -> SpatialResult<Row> {
                Ok(node_row(NODE_COLUMN, node)?.with(DISTANCE_COLUMN, distance))
            })
            .collect()
    }

    fn create_plain_node(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let properties: Map<String, Value> = query.get_param("properties")?;
        let node = state.create_node();
        node.properties = properties;
        Ok(vec![node_row(NODE_COLUMN, node)?])
    }

    fn delete_node(&self, state: &mut GraphState, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let node_id: i64 = query.get_param("node_id")?;
        state.index.remove(&node_id);
        state.nodes.remove(&node_id);
        Ok(vec![])
    }

    fn label_geometry(&self, node: &mut NodeRecord, geometry_type: GeometryType, layer_name: &str) {
        node.labels.insert(self.config.spatial_label().to_string());
        node.labels.insert(geometry_type.label().to_string());
        node.labels.insert(layer_name.to_string());
    }
}

impl CypherSession for MemoryGraph {
    fn run(&self, query: &CypherQuery) -> SpatialResult<Vec<Row>> {
        let mut state = self.state.lock();
        state.executed.push(query.clone());
        log::debug!("MemoryGraph running {}", query.name());
        self.dispatch(&mut state, query)
    }
}

fn node_row(column: &str, node: &NodeRecord) -> SpatialResult<Row> {
    Ok(Row::new().with(column, serde_json::to_value(node)?))
}

fn procedure_failed(message: impl ToString) -> SpatialError {
    SpatialError::Database {
        code: PROCEDURE_FAILED.to_string(),
        message: message.to_string(),
    }
}

fn decode_failed(error: SpatialError) -> SpatialError {
    SpatialError::Decode(error.to_string())
}
