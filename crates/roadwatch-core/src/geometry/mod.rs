//! Geometry kernel
//!
//! Pure, total functions over integer pixel coordinates. Nothing here holds
//! state or returns an error; malformed boxes are filtered out before they
//! get this far.

pub mod bbox;
pub mod segment;

pub use bbox::{BBox, Point};
pub use segment::{orientation, segments_intersect};

/// Midpoint of a box
pub fn center(bbox: &BBox) -> Point {
    bbox.center()
}

/// Euclidean distance between two points
pub fn distance(p: Point, q: Point) -> f64 {
    p.distance(q)
}

/// Strict containment of `point` in `bbox`
pub fn contains(point: Point, bbox: &BBox) -> bool {
    bbox.contains(point)
}
