use serde::{Deserialize, Serialize};

use crate::geometry::{Point, segments_intersect};

/// User-placed counting line
///
/// Owned by the caller and passed by value into each frame's evaluation, so
/// a move between frames never affects a frame already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct CountingLine {
    pub p1: Point,
    pub p2: Point,
}

impl CountingLine {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub const fn from_coords(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(Point::new(x1, y1), Point::new(x2, y2))
    }

    /// Move both endpoints by the same offset
    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self::from_coords(
            self.p1.x.saturating_add(dx),
            self.p1.y.saturating_add(dy),
            self.p2.x.saturating_add(dx),
            self.p2.y.saturating_add(dy),
        )
    }

    /// Clamp every coordinate into `[0, width] x [0, height]`
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        let h = i32::try_from(height).unwrap_or(i32::MAX);
        let cx = |v: i32| v.min(w).max(0);
        let cy = |v: i32| v.min(h).max(0);
        Self::from_coords(cx(self.p1.x), cy(self.p1.y), cx(self.p2.x), cy(self.p2.y))
    }

    /// Whether the path `from -> to` crosses this line
    pub fn is_crossed_by(&self, from: Point, to: Point) -> bool {
        segments_intersect(from, to, self.p1, self.p2)
    }
}

impl From<[i32; 4]> for CountingLine {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self::from_coords(x1, y1, x2, y2)
    }
}

impl From<CountingLine> for [i32; 4] {
    fn from(line: CountingLine) -> Self {
        [line.p1.x, line.p1.y, line.p2.x, line.p2.y]
    }
}
