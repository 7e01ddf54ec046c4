//! Pixel points and axis-aligned boxes
//!
//! All coordinates are integer pixels. Detector output arrives as floats and
//! is truncated toward zero once, on the way in, so every centre and every
//! containment test downstream sees the same rounding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box in corner form `(x1, y1, x2, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BBox {
    /// Create a new bounding box from its corners
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from detector float corners, truncating toward zero
    pub fn from_xyxy(xyxy: [f32; 4]) -> Self {
        Self::new(
            xyxy[0] as i32,
            xyxy[1] as i32,
            xyxy[2] as i32,
            xyxy[3] as i32,
        )
    }

    pub fn width(&self) -> i64 {
        i64::from(self.x2) - i64::from(self.x1)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y2) - i64::from(self.y1)
    }

    /// Corners are ordered (`x1 <= x2` and `y1 <= y2`)
    pub fn is_well_formed(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Calculate center point
    ///
    /// Integer midpoint, truncated toward zero. Every caller goes through
    /// here so containment between two boxes stays symmetric. The sum is
    /// taken in `i64`; the halved result always fits back into `i32`.
    pub fn center(&self) -> Point {
        let mid = |a: i32, b: i32| ((i64::from(a) + i64::from(b)) / 2) as i32;
        Point::new(mid(self.x1, self.x2), mid(self.y1, self.y2))
    }

    /// Strict point-in-box test
    ///
    /// A point lying exactly on an edge is outside.
    pub fn contains(&self, point: Point) -> bool {
        self.x1 < point.x && point.x < self.x2 && self.y1 < point.y && point.y < self.y2
    }

    /// Whether the centre of `other` lies strictly inside this box
    pub fn contains_center_of(&self, other: &BBox) -> bool {
        self.contains(other.center())
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}
