use std::fmt;
use std::sync::Arc;

use crate::bounding_box::BoundingBox;
use crate::config::SpatialConfig;
use crate::cypher::{
    Statements, DISTANCE_COLUMN, LAYER_COLUMN, LAYER_NAME_COLUMN, NODE_COLUMN, NODE_ID_COLUMN,
};
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::GeoPoint;
use crate::model::{Geometry, Layer, PointOfInterest};
use crate::record::NodeRecord;
use crate::session::{CypherQuery, CypherSession, HttpCypherSession, Row};
use crate::shape::parse_wkt;

/// Domain operations over the remote spatial index.
///
/// The gateway holds no geometry state. Every read goes back to the store,
/// and every mutation that needs an existence check runs the lookup and the
/// change as two separate statements. WKT, coordinates and bounding boxes
/// are validated before anything is sent.
///
/// ```rust,no_run
/// use graph_spatial::{SpatialConfig, SpatialGateway};
///
/// let gateway = SpatialGateway::connect(SpatialConfig::from_env()?)?;
/// gateway.create_layer("uk")?;
/// gateway.create_point_of_interest("stonehenge", "uk", 51.178882, -1.826215)?;
///
/// let found = gateway.find_within_bounding_box("uk", -10.0, 40.0, 10.0, 80.0)?;
/// assert_eq!(found[0].wkt(), "POINT (-1.826215 51.178882)");
/// # Ok::<(), graph_spatial::SpatialError>(())
/// ```
#[derive(Clone)]
pub struct SpatialGateway {
    session: Arc<dyn CypherSession>,
    config: SpatialConfig,
    statements: Statements,
}

impl fmt::Debug for SpatialGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialGateway")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SpatialGateway {
    pub fn new(session: Arc<dyn CypherSession>, config: SpatialConfig) -> Self {
        let statements = Statements::new(config.clone());
        SpatialGateway {
            session,
            config,
            statements,
        }
    }

    /// Creates a gateway over an [`HttpCypherSession`] for `config`.
    pub fn connect(config: SpatialConfig) -> SpatialResult<Self> {
        let session = HttpCypherSession::new(&config)?;
        log::info!("Spatial gateway connected to {}", session.commit_url());
        Ok(SpatialGateway::new(Arc::new(session), config))
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    /// Ensures a WKT-encoded layer named `layer_name` exists.
    ///
    /// An existing layer is returned as is, unless the configuration asks
    /// for [`SpatialError::LayerExists`] instead.
    pub fn create_layer(&self, layer_name: &str) -> SpatialResult<Layer> {
        if let Some(layer) = self.find_layer(layer_name)? {
            if self.config.fail_on_existing_layer() {
                return Err(SpatialError::LayerExists(layer_name.to_string()));
            }
            if !layer.is_wkt_encoded() {
                log::warn!(
                    "Layer '{}' exists with encoder {:?}, not a WKT encoder",
                    layer_name,
                    layer.geometry_encoder()
                );
            }
            log::debug!("Layer '{}' already exists", layer_name);
            return Ok(layer);
        }

        let rows = self.run(self.statements.add_wkt_layer(layer_name))?;
        let layer = Layer::from_node(single_node(&rows, LAYER_COLUMN, "add_wkt_layer")?)?;
        log::info!("Created layer '{}'", layer_name);
        Ok(layer)
    }

    pub fn get_layer(&self, layer_name: &str) -> SpatialResult<Layer> {
        self.find_layer(layer_name)?
            .ok_or_else(|| SpatialError::LayerNotFound(layer_name.to_string()))
    }

    /// Removes a layer together with its index.
    pub fn delete_layer(&self, layer_name: &str) -> SpatialResult<()> {
        self.get_layer(layer_name)?;
        self.run(self.statements.remove_layer(layer_name))?;
        log::info!("Deleted layer '{}'", layer_name);
        Ok(())
    }

    /// Creates a named geometry in a layer.
    ///
    /// The node is labelled with the marker label, the geometry type and
    /// the layer name.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidWkt`] if `wkt` does not parse, and
    /// [`SpatialError::GeometryExists`] if the layer already holds a
    /// geometry with that name.
    pub fn create_geometry(
        &self,
        geometry_name: &str,
        wkt: &str,
        layer_name: &str,
    ) -> SpatialResult<Geometry> {
        let shape = parse_wkt(wkt)?;
        self.ensure_unique(geometry_name, layer_name)?;

        let rows = self.run(self.statements.add_wkt(
            geometry_name,
            wkt,
            layer_name,
            shape.geometry_type(),
        ))?;
        let node = single_node(&rows, NODE_COLUMN, "add_wkt")?;
        let geometry = Geometry::from_node(node, &self.config, Some(layer_name.to_string()))?;
        log::info!(
            "Created {} '{}' in layer '{}'",
            geometry.geometry_type(),
            geometry_name,
            layer_name
        );
        Ok(geometry)
    }

    /// Creates a `POINT (longitude latitude)` geometry.
    ///
    /// Out-of-range coordinates are rejected as [`SpatialError::InvalidWkt`].
    pub fn create_point_of_interest(
        &self,
        poi_name: &str,
        layer_name: &str,
        latitude: f64,
        longitude: f64,
    ) -> SpatialResult<PointOfInterest> {
        let location = GeoPoint::new(latitude, longitude)?;
        let geometry = self.create_geometry(poi_name, &location.to_shape().to_wkt(), layer_name)?;
        Ok(PointOfInterest::new(geometry, location))
    }

    /// Makes an existing node spatial without creating a new one.
    ///
    /// The node keeps its properties and gains the name and WKT
    /// properties plus the geometry labels.
    pub fn add_node_to_layer_by_id(
        &self,
        node_id: i64,
        geometry_name: &str,
        wkt: &str,
        layer_name: &str,
    ) -> SpatialResult<Geometry> {
        let shape = parse_wkt(wkt)?;
        if self.run(self.statements.find_node(node_id))?.is_empty() {
            return Err(SpatialError::NodeNotFound(node_id));
        }
        self.ensure_unique(geometry_name, layer_name)?;

        let rows = self.run(self.statements.add_node(
            node_id,
            geometry_name,
            wkt,
            layer_name,
            shape.geometry_type(),
        ))?;
        let node = single_node(&rows, NODE_COLUMN, "add_node")?;
        let geometry = Geometry::from_node(node, &self.config, Some(layer_name.to_string()))?;
        log::info!(
            "Added node {} to layer '{}' as '{}'",
            node_id,
            layer_name,
            geometry_name
        );
        Ok(geometry)
    }

    /// Looks a geometry up by name, optionally within one layer.
    ///
    /// Without a layer, a name present in several layers is
    /// [`SpatialError::AmbiguousGeometry`].
    pub fn get_geometry(
        &self,
        geometry_name: &str,
        layer_name: Option<&str>,
    ) -> SpatialResult<Geometry> {
        self.find_unique(geometry_name, layer_name)
    }

    /// Replaces the shape of an existing geometry and returns it refreshed.
    pub fn update_geometry(
        &self,
        geometry_name: &str,
        wkt: &str,
        layer_name: Option<&str>,
    ) -> SpatialResult<Geometry> {
        let shape = parse_wkt(wkt)?;
        let existing = self.find_unique(geometry_name, layer_name)?;
        let layer = indexed_layer(&existing, layer_name)?;

        let rows = self.run(self.statements.update_from_wkt(
            existing.node_id(),
            wkt,
            &layer,
            shape.geometry_type(),
        ))?;
        let node = single_node(&rows, NODE_COLUMN, "update_from_wkt")?;
        let geometry = Geometry::from_node(node, &self.config, Some(layer.clone()))?;
        log::info!("Updated '{}' in layer '{}'", geometry_name, layer);
        Ok(geometry)
    }

    /// Removes a geometry from its layer's index and deletes its node.
    ///
    /// `wkt` must be valid but does not take part in the lookup; a stored
    /// shape that differs from it is only logged.
    pub fn delete_geometry(
        &self,
        geometry_name: &str,
        wkt: &str,
        layer_name: &str,
    ) -> SpatialResult<()> {
        let shape = parse_wkt(wkt)?;
        let existing = self.find_unique(geometry_name, Some(layer_name))?;
        if existing.shape().ok().as_ref() != Some(&shape) {
            log::warn!(
                "Deleting '{}' whose stored WKT {} differs from {}",
                geometry_name,
                existing.wkt(),
                wkt
            );
        }

        let rows = self.run(self.statements.remove_geometry(existing.node_id(), layer_name))?;
        let mut removed = rows
            .iter()
            .map(|row| row.get::<i64>(NODE_ID_COLUMN))
            .collect::<SpatialResult<Vec<i64>>>()?;
        removed.dedup();
        if removed != [existing.node_id()] {
            log::warn!(
                "Removing node {} from layer '{}' removed {:?}",
                existing.node_id(),
                layer_name,
                removed
            );
            return Err(SpatialError::GeometryNotFound(geometry_name.to_string()));
        }
        log::info!("Deleted '{}' from layer '{}'", geometry_name, layer_name);
        Ok(())
    }

    /// Geometries of the layer whose envelope intersects the box, in no
    /// particular order.
    pub fn find_within_bounding_box(
        &self,
        layer_name: &str,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> SpatialResult<Vec<Geometry>> {
        let bbox = BoundingBox::validated(min_x, min_y, max_x, max_y)?;
        let rows = self.run(self.statements.bbox(layer_name, &bbox))?;
        log::debug!("{} geometries intersect {} in '{}'", rows.len(), bbox, layer_name);

        rows.iter()
            .map(|row| {
                let node = NodeRecord::from_row(row, NODE_COLUMN)?;
                Geometry::from_node(node, &self.config, Some(layer_name.to_string()))
            })
            .collect()
    }

    /// Geometries within `distance_km` of a point, closest first, paired
    /// with the distance the server computed.
    pub fn find_within_distance(
        &self,
        layer_name: &str,
        latitude: f64,
        longitude: f64,
        distance_km: f64,
    ) -> SpatialResult<Vec<(Geometry, f64)>> {
        let center = GeoPoint::new(latitude, longitude)?;
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(SpatialError::InvalidDistance(distance_km));
        }

        let rows = self.run(self.statements.within_distance(layer_name, &center, distance_km))?;
        rows.iter()
            .map(|row| -> SpatialResult<(Geometry, f64)> {
                let node = NodeRecord::from_row(row, NODE_COLUMN)?;
                let geometry = Geometry::from_node(node, &self.config, Some(layer_name.to_string()))?;
                Ok((geometry, row.get::<f64>(DISTANCE_COLUMN)?))
            })
            .collect()
    }

    fn run(&self, query: CypherQuery) -> SpatialResult<Vec<Row>> {
        log::debug!("Running {}: {}", query.name(), query.text());
        self.session.run(&query)
    }

    fn find_layer(&self, layer_name: &str) -> SpatialResult<Option<Layer>> {
        let rows = self.run(self.statements.find_layer(layer_name))?;
        match rows.first() {
            Some(row) => Ok(Some(Layer::from_node(NodeRecord::from_row(row, LAYER_COLUMN)?)?)),
            None => Ok(None),
        }
    }

    fn find_geometries(
        &self,
        geometry_name: &str,
        layer_name: Option<&str>,
    ) -> SpatialResult<Vec<Geometry>> {
        let rows = self.run(self.statements.find_geometry(geometry_name, layer_name))?;
        rows.iter()
            .map(|row| {
                let node = NodeRecord::from_row(row, NODE_COLUMN)?;
                let indexed_in = row
                    .get_opt::<String>(LAYER_NAME_COLUMN)?
                    .or_else(|| layer_name.map(str::to_string));
                Geometry::from_node(node, &self.config, indexed_in)
            })
            .collect()
    }

    fn find_unique(&self, geometry_name: &str, layer_name: Option<&str>) -> SpatialResult<Geometry> {
        let mut found = self.find_geometries(geometry_name, layer_name)?;
        match found.len() {
            0 => Err(SpatialError::GeometryNotFound(geometry_name.to_string())),
            1 => Ok(found.remove(0)),
            count => Err(SpatialError::AmbiguousGeometry {
                geometry_name: geometry_name.to_string(),
                count,
            }),
        }
    }

    fn ensure_unique(&self, geometry_name: &str, layer_name: &str) -> SpatialResult<()> {
        if self.find_geometries(geometry_name, Some(layer_name))?.is_empty() {
            Ok(())
        } else {
            Err(SpatialError::GeometryExists {
                geometry_name: geometry_name.to_string(),
                layer_name: layer_name.to_string(),
            })
        }
    }
}

fn single_node(rows: &[Row], column: &str, statement: &str) -> SpatialResult<NodeRecord> {
    let row = rows
        .first()
        .ok_or_else(|| SpatialError::Decode(format!("{} returned no rows", statement)))?;
    NodeRecord::from_row(row, column)
}

/// The layer a found geometry is indexed in.
fn indexed_layer(geometry: &Geometry, requested: Option<&str>) -> SpatialResult<String> {
    geometry
        .layer_name()
        .or(requested)
        .map(str::to_string)
        .ok_or_else(|| {
            SpatialError::Decode(format!(
                "geometry '{}' (node {}) is not indexed in any layer",
                geometry.geometry_name(),
                geometry.node_id()
            ))
        })
}
