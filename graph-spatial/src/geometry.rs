//! Geometry primitives shared by the WKT layer and the gateway.
//!
//! - [`Coordinate`]: a 2D (x, y) pair, x being longitude on geographic layers
//! - [`GeometryType`]: the closed set of shape kinds and their node labels
//! - [`GeoPoint`]: a validated (latitude, longitude) pair

use std::fmt::{self, Display};

use crate::errors::{SpatialError, SpatialResult};
use crate::shape::Shape;

/// A 2D coordinate (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<geo_types::Coord<f64>> for Coordinate {
    fn from(coord: geo_types::Coord<f64>) -> Self {
        Coordinate::new(coord.x, coord.y)
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// The kind of a parsed shape.
///
/// Every geometry node carries exactly one of these labels, so the set of
/// labels the gateway can produce is known up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

impl GeometryType {
    /// All geometry types, in declaration order.
    pub const ALL: [GeometryType; 6] = [
        GeometryType::Point,
        GeometryType::LineString,
        GeometryType::Polygon,
        GeometryType::MultiPoint,
        GeometryType::MultiLineString,
        GeometryType::MultiPolygon,
    ];

    /// The node label for this type.
    pub fn label(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }

    /// The upper-case WKT keyword for this type.
    pub fn wkt_keyword(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
        }
    }

    /// Resolves a node label.
    pub fn from_label(label: &str) -> Option<GeometryType> {
        GeometryType::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A geographic point with validated latitude and longitude coordinates.
///
/// ## Coordinate Order
///
/// The constructor takes `(latitude, longitude)` which is the natural
/// order for geographic coordinates. WKT stores the same point as
/// `POINT (longitude latitude)`.
///
/// ## Example
///
/// ```rust
/// use graph_spatial::GeoPoint;
///
/// let stonehenge = GeoPoint::new(51.178882, -1.826215).unwrap();
/// assert_eq!(stonehenge.to_shape().to_string(), "POINT (-1.826215 51.178882)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a new GeoPoint with validated geographic coordinates.
    ///
    /// # Errors
    /// Returns [`SpatialError::InvalidWkt`] if latitude is outside
    /// [-90, 90] or longitude is outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> SpatialResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(SpatialError::InvalidWkt(format!(
                "Latitude must be between -90 and 90 degrees, got: {}",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(SpatialError::InvalidWkt(format!(
                "Longitude must be between -180 and 180 degrees, got: {}",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Gets the latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Gets the longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Converts to a Coordinate (x=longitude, y=latitude).
    pub fn to_coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }

    /// Converts to a `POINT` shape.
    pub fn to_shape(&self) -> Shape {
        Shape::point(self.to_coordinate())
    }

    /// Great-circle distance to another point in kilometres (Haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        ) / 1000.0
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoPoint(lat={:.6}, lon={:.6})",
            self.latitude, self.longitude
        )
    }
}

/// Builds the `POINT (lon lat)` shape for a latitude/longitude pair.
///
/// # Errors
/// Returns [`SpatialError::InvalidWkt`] for out-of-range coordinates.
pub fn parse_lat_long_to_point(latitude: f64, longitude: f64) -> SpatialResult<Shape> {
    Ok(GeoPoint::new(latitude, longitude)?.to_shape())
}

/// Earth's mean radius in meters (WGS84)
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_METERS * c
}
