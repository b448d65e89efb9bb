use std::fmt;

use crate::errors::{SpatialError, SpatialResult};

/// A 2D bounding box represented by minimum and maximum coordinates.
///
/// `BoundingBox` is an ephemeral search parameter: it is never persisted, it
/// only describes the rectangle handed to the server's bounding-box search.
/// X is longitude and Y is latitude for geographic layers.
///
/// # Examples
///
/// ```rust
/// use graph_spatial::BoundingBox;
///
/// // very roughly, the uk
/// let bbox = BoundingBox::new(-10.0, 40.0, 10.0, 80.0);
/// assert!(bbox.contains_point(-5.0, 50.3));
/// ```
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BoundingBox({}, {}, {}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

impl BoundingBox {
    /// Creates a new bounding box with the specified coordinates.
    ///
    /// No validation happens here; use [`BoundingBox::validated`] for
    /// caller-supplied values.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> BoundingBox {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a bounding box, rejecting non-finite values and inverted axes.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::InvalidBoundingBox`] if any value is NaN or
    /// infinite, or if a minimum is greater than its maximum.
    pub fn validated(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> SpatialResult<Self> {
        let bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
        if ![min_x, min_y, max_x, max_y].iter().all(|v| v.is_finite()) {
            return Err(SpatialError::InvalidBoundingBox(format!(
                "{} has non-finite coordinates",
                bbox
            )));
        }
        if !bbox.is_valid() {
            return Err(SpatialError::InvalidBoundingBox(format!(
                "{} has a minimum greater than its maximum",
                bbox
            )));
        }
        Ok(bbox)
    }

    /// Returns the width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the center point of the bounding box.
    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Checks if this bounding box contains a point.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if this bounding box contains another bounding box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
    }

    /// Checks if this bounding box intersects another bounding box.
    ///
    /// Touching edges count as an intersection.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Returns the union of this bounding box with another.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Checks if this bounding box is a point (zero area).
    pub fn is_point(&self) -> bool {
        self.min_x == self.max_x && self.min_y == self.max_y
    }

    /// Checks if this bounding box is valid (min <= max).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }
}
