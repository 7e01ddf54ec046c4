//! Segment intersection by orientation sign

use super::bbox::Point;

/// 2D cross product of `(b - a) x (c - a)`
///
/// Positive when `c` is counter-clockwise of the directed line `a -> b`,
/// negative when clockwise, zero when the three points are collinear.
/// Differences span up to 33 bits, so the products are taken in `i128`.
pub fn orientation(a: Point, b: Point, c: Point) -> i128 {
    let abx = i128::from(b.x) - i128::from(a.x);
    let aby = i128::from(b.y) - i128::from(a.y);
    let acx = i128::from(c.x) - i128::from(a.x);
    let acy = i128::from(c.y) - i128::from(a.y);
    abx * acy - aby * acx
}

fn strictly_opposite(u: i128, v: i128) -> bool {
    (u > 0 && v < 0) || (u < 0 && v > 0)
}

/// Whether segment `a1-a2` crosses segment `b1-b2`
///
/// Each segment's endpoints must lie strictly on opposite sides of the other
/// segment's supporting line. Any zero orientation (collinear overlap, an
/// endpoint resting on the other segment, touching at a corner) counts as
/// not intersecting. Callers rely on this: a centroid that stops exactly on
/// the counting line is not a crossing until it leaves the other side.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let a1_side = orientation(b1, b2, a1);
    let a2_side = orientation(b1, b2, a2);
    let b1_side = orientation(a1, a2, b1);
    let b2_side = orientation(a1, a2, b2);

    strictly_opposite(a1_side, a2_side) && strictly_opposite(b1_side, b2_side)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_crossing_diagonals() {
        assert!(segments_intersect(p(0, 0), p(10, 10), p(0, 10), p(10, 0)));
    }

    #[test]
    fn test_parallel_segments() {
        assert!(!segments_intersect(p(0, 0), p(10, 0), p(0, 5), p(10, 5)));
    }

    #[test]
    fn test_collinear_overlap_is_not_intersection() {
        assert!(!segments_intersect(p(0, 0), p(5, 0), p(3, 0), p(8, 0)));
    }

    #[test]
    fn test_endpoint_touching_is_not_intersection() {
        // T-junction: a2 sits exactly on b
        assert!(!segments_intersect(p(5, -5), p(5, 0), p(0, 0), p(10, 0)));
        // shared endpoint
        assert!(!segments_intersect(p(0, 0), p(5, 5), p(5, 5), p(10, 0)));
    }

    #[test]
    fn test_lines_cross_but_segments_do_not() {
        // supporting lines meet at (5, 5), beyond the end of the first segment
        assert!(!segments_intersect(p(0, 0), p(4, 4), p(0, 10), p(10, 0)));
    }

    #[test]
    fn test_order_of_endpoints_is_irrelevant() {
        let cases = [
            (p(90, 500), p(110, 500), p(100, 0), p(100, 1000)),
            (p(110, 500), p(90, 500), p(100, 1000), p(100, 0)),
        ];
        for (a1, a2, b1, b2) in cases {
            assert!(segments_intersect(a1, a2, b1, b2));
            assert!(segments_intersect(b1, b2, a1, a2));
        }
    }

    #[test]
    fn test_orientation_sign() {
        assert!(orientation(p(0, 0), p(10, 0), p(5, 5)) > 0);
        assert!(orientation(p(0, 0), p(10, 0), p(5, -5)) < 0);
        assert_eq!(orientation(p(0, 0), p(10, 0), p(20, 0)), 0);
    }

    #[test]
    fn test_large_coordinates_do_not_overflow() {
        let big = i32::MAX / 2;
        assert!(segments_intersect(
            p(-big, 0),
            p(big, 0),
            p(0, -big),
            p(0, big)
        ));
    }

    #[test]
    fn test_extreme_coordinates() {
        let min = p(i32::MIN, i32::MIN);
        let max = p(i32::MAX, i32::MAX);
        assert!(segments_intersect(min, max, p(0, 640), p(640, 0)));
        // (0, 0) and (640, 480) lie on opposite sides of the diagonal but it passes through (0, 0)
        assert!(!segments_intersect(min, max, p(0, 0), p(640, 480)));
        assert!(!segments_intersect(p(i32::MIN, 0), p(i32::MAX, 0), p(i32::MIN, 1), p(i32::MAX, 1)));
        assert!(orientation(min, max, p(i32::MIN, i32::MAX)) > 0);
    }
}
