//! WKT (Well-Known Text) validation and rendering.
//!
//! Text is parsed by the `wkt` crate into `geo-types` geometries. Shapes the
//! spatial index cannot store are then rejected locally, so malformed
//! payloads never reach the server:
//! - `EMPTY` geometries, including empty members of multi-geometries
//! - linestrings with fewer than 2 coordinates
//! - polygon rings that are unclosed or have fewer than 4 coordinates
//! - `GEOMETRYCOLLECTION`, which has no geometry type label
//!
//! Z/M ordinates are accepted and dropped.

use std::fmt::{self, Display, Write};
use std::str::FromStr;

use geo::{BoundingRect, CoordsIter};
use geo_types::{Geometry, LineString, Polygon};
use wkt::{ToWkt, Wkt};

use crate::bounding_box::BoundingBox;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::{Coordinate, GeometryType};

/// A parsed, validated WKT shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    geometry_type: GeometryType,
    geometry: Geometry<f64>,
}

impl Shape {
    /// A `POINT` shape at `coordinate`.
    pub fn point(coordinate: Coordinate) -> Shape {
        Shape {
            geometry_type: GeometryType::Point,
            geometry: Geometry::Point(geo_types::Point::new(coordinate.x, coordinate.y)),
        }
    }

    /// The geometry type of this shape.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// The underlying `geo-types` geometry.
    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// All coordinates of the shape, holes included.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.geometry.coords_iter().map(Coordinate::from).collect()
    }

    /// The envelope of the shape.
    pub fn bounding_box(&self) -> BoundingBox {
        // validation guarantees at least one coordinate
        self.geometry
            .bounding_rect()
            .map(|rect| BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
            .unwrap_or_default()
    }

    /// Renders the shape as normalized WKT, e.g. `POINT (-1.826215 51.178882)`.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.geometry_type.wkt_keyword();
        match &self.geometry {
            Geometry::Point(p) => write!(f, "{} ({} {})", keyword, p.x(), p.y()),
            Geometry::LineString(line) => {
                write!(f, "{} ", keyword)?;
                write_line(f, line)
            }
            Geometry::Polygon(polygon) => {
                write!(f, "{} ", keyword)?;
                write_polygon(f, polygon)
            }
            Geometry::MultiPoint(points) => {
                write!(f, "{} ", keyword)?;
                write_list(f, &points.0, |f, p| write!(f, "({} {})", p.x(), p.y()))
            }
            Geometry::MultiLineString(lines) => {
                write!(f, "{} ", keyword)?;
                write_list(f, &lines.0, write_line)
            }
            Geometry::MultiPolygon(polygons) => {
                write!(f, "{} ", keyword)?;
                write_list(f, &polygons.0, write_polygon)
            }
            other => f.write_str(&other.wkt_string()),
        }
    }
}

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut write_item: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    f.write_char('(')?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write_item(f, item)?;
    }
    f.write_char(')')
}

fn write_line(f: &mut fmt::Formatter<'_>, line: &LineString<f64>) -> fmt::Result {
    write_list(f, &line.0, |f, c| write!(f, "{} {}", c.x, c.y))
}

fn write_polygon(f: &mut fmt::Formatter<'_>, polygon: &Polygon<f64>) -> fmt::Result {
    f.write_char('(')?;
    write_line(f, polygon.exterior())?;
    for hole in polygon.interiors() {
        f.write_str(", ")?;
        write_line(f, hole)?;
    }
    f.write_char(')')
}

impl FromStr for Shape {
    type Err = SpatialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wkt(s)
    }
}

/// Parses a WKT string into a [`Shape`].
///
/// # Errors
///
/// Returns [`SpatialError::InvalidWkt`] for text the `wkt` crate rejects,
/// `EMPTY` geometries, linestrings with fewer than 2 coordinates, polygon
/// rings that are unclosed or have fewer than 4 coordinates, and geometry
/// collections.
///
/// # Example
///
/// ```rust
/// use graph_spatial::{parse_wkt, GeometryType};
///
/// let shape = parse_wkt("POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10))").unwrap();
/// assert_eq!(shape.geometry_type(), GeometryType::Polygon);
/// ```
pub fn parse_wkt(text: &str) -> SpatialResult<Shape> {
    let parsed = Wkt::<f64>::from_str(text).map_err(|e| invalid(format!("{} in {:?}", e, text)))?;
    check(&parsed)?;

    // geo-types closes rings on conversion, so closure is checked above
    let geometry: Geometry<f64> = parsed
        .try_into()
        .map_err(|e: wkt::conversion::Error| invalid(format!("{:?}", e)))?;
    let geometry_type = match &geometry {
        Geometry::Point(_) => GeometryType::Point,
        Geometry::LineString(_) => GeometryType::LineString,
        Geometry::Polygon(_) => GeometryType::Polygon,
        Geometry::MultiPoint(_) => GeometryType::MultiPoint,
        Geometry::MultiLineString(_) => GeometryType::MultiLineString,
        Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        other => {
            return Err(invalid(format!("unsupported geometry {}", other.wkt_string())));
        }
    };
    Ok(Shape {
        geometry_type,
        geometry,
    })
}

fn invalid(message: impl Into<String>) -> SpatialError {
    SpatialError::InvalidWkt(message.into())
}

fn empty() -> SpatialError {
    invalid("EMPTY geometries cannot be indexed")
}

fn check(parsed: &Wkt<f64>) -> SpatialResult<()> {
    match parsed {
        Wkt::Point(point) => check_point(point),
        Wkt::LineString(line) => check_line(line),
        Wkt::Polygon(polygon) => check_polygon(polygon),
        Wkt::MultiPoint(points) => check_members(&points.0, check_point),
        Wkt::MultiLineString(lines) => check_members(&lines.0, check_line),
        Wkt::MultiPolygon(polygons) => check_members(&polygons.0, check_polygon),
        Wkt::GeometryCollection(_) => Err(invalid("GEOMETRYCOLLECTION has no geometry type label")),
    }
}

fn check_members<T>(members: &[T], check: fn(&T) -> SpatialResult<()>) -> SpatialResult<()> {
    if members.is_empty() {
        return Err(empty());
    }
    members.iter().try_for_each(check)
}

fn check_point(point: &wkt::types::Point<f64>) -> SpatialResult<()> {
    match point.0 {
        Some(_) => Ok(()),
        None => Err(empty()),
    }
}

fn check_line(line: &wkt::types::LineString<f64>) -> SpatialResult<()> {
    match line.0.len() {
        0 => Err(empty()),
        1 => Err(invalid("a linestring needs at least 2 coordinates")),
        _ => Ok(()),
    }
}

fn check_polygon(polygon: &wkt::types::Polygon<f64>) -> SpatialResult<()> {
    if polygon.0.is_empty() {
        return Err(empty());
    }
    for ring in &polygon.0 {
        let coords = &ring.0;
        if coords.len() < 4 {
            return Err(invalid(format!(
                "a polygon ring needs at least 4 coordinates, got {}",
                coords.len()
            )));
        }
        let (first, last) = (&coords[0], &coords[coords.len() - 1]);
        if first.x != last.x || first.y != last.y {
            return Err(invalid(format!(
                "polygon ring is not closed: starts at ({} {}), ends at ({} {})",
                first.x, first.y, last.x, last.y
            )));
        }
    }
    Ok(())
}
