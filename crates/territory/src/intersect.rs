//! Containment and segment intersection tests.
//!
//! Everything the game asks about "am I inside" or "did I cross" ends up here,
//! so every caller shares one convention.

use crate::geometry::Point;

// ============================================================================
// POINT IN POLYGON (Ray Casting Algorithm)
// ============================================================================
//
// ## Rust Lesson #8: References & Slices
//
// `&[Point]` is a "slice" - a borrowed view into a contiguous sequence.
// It works with Vec<Point>, arrays, or any contiguous memory.

/// Test if a point is inside a polygon using ray casting.
///
/// Casts a ray to the right and counts edge crossings.
/// Odd crossings = inside, even = outside.
///
/// The half-open rule `(yi > y) != (yj > y)` counts a vertex lying exactly on
/// the ray once. Together with the strict `x < x_cross` comparison this puts
/// points on a left or bottom (min-y) edge inside and points on a right or
/// top (max-y) edge outside. Fewer than 3 vertices is never inside.
#[inline]
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;

    for i in 0..n {
        let (xi, yi) = (polygon[i].x, polygon[i].y);
        let (xj, yj) = (polygon[j].x, polygon[j].y);

        if ((yi > p.y) != (yj > p.y)) && (p.x < (xj - xi) * (p.y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }

        j = i;
    }

    inside
}

// ============================================================================
// SEGMENT-SEGMENT INTERSECTION
// ============================================================================

/// Denominator below which two segments are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-10;

/// Find the intersection point of segments `p1-p2` and `p3-p4`.
///
/// Parallel or coincident segments report `None`, as do crossings of the
/// infinite lines that fall outside either segment.
#[inline]
pub fn segment_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let (ua, ub) = intersection_params(p1, p2, p3, p4, PARALLEL_EPSILON)?;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Point::new(p1.x + ua * (p2.x - p1.x), p1.y + ua * (p2.y - p1.y)))
    } else {
        None
    }
}

/// Boolean crossing test with a caller-chosen parallel guard.
///
/// The cardinal router uses a coarse guard (0.001) so near-parallel legs are
/// never reported as crossing the trail.
#[inline]
pub fn segments_cross(p1: Point, p2: Point, p3: Point, p4: Point, parallel_epsilon: f64) -> bool {
    match intersection_params(p1, p2, p3, p4, parallel_epsilon) {
        Some((ua, ub)) => (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub),
        None => false,
    }
}

/// Parametric positions of the line crossing along each segment.
fn intersection_params(p1: Point, p2: Point, p3: Point, p4: Point, epsilon: f64) -> Option<(f64, f64)> {
    let denom = (p4.y - p3.y) * (p2.x - p1.x) - (p4.x - p3.x) * (p2.y - p1.y);

    // Parallel or coincident lines
    if denom.abs() < epsilon {
        return None;
    }

    let ua = ((p4.x - p3.x) * (p1.y - p3.y) - (p4.y - p3.y) * (p1.x - p3.x)) / denom;
    let ub = ((p2.x - p1.x) * (p1.y - p3.y) - (p2.y - p1.y) * (p1.x - p3.x)) / denom;
    Some((ua, ub))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn point_in_square() {
        let sq = square();
        assert!(point_in_polygon(Point::new(5.0, 5.0), &sq));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &sq));
        assert!(!point_in_polygon(Point::new(-1.0, 5.0), &sq));
    }

    #[test]
    fn edge_convention_is_half_open() {
        let sq = square();
        // left and bottom edges are inside
        assert!(point_in_polygon(Point::new(0.0, 5.0), &sq));
        assert!(point_in_polygon(Point::new(5.0, 0.0), &sq));
        // right and top edges are outside
        assert!(!point_in_polygon(Point::new(10.0, 5.0), &sq));
        assert!(!point_in_polygon(Point::new(5.0, 10.0), &sq));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &line));
        assert!(!point_in_polygon(Point::new(0.0, 0.0), &[]));
    }

    #[test]
    fn containment_ignores_rotation_and_winding() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 20.0),
            Point::new(10.0, 8.0),
            Point::new(0.0, 20.0),
        ];
        let probes = [
            Point::new(5.0, 5.0),
            Point::new(10.0, 15.0),
            Point::new(10.0, 4.0),
            Point::new(18.0, 17.0),
            Point::new(25.0, 5.0),
            Point::new(3.0, 12.0),
        ];

        for shift in 0..poly.len() {
            let mut rotated = poly.clone();
            rotated.rotate_left(shift);
            let mut reversed = rotated.clone();
            reversed.reverse();
            for p in probes {
                let expected = point_in_polygon(p, &poly);
                assert_eq!(point_in_polygon(p, &rotated), expected, "rotation {shift} at {p:?}");
                assert_eq!(point_in_polygon(p, &reversed), expected, "reversal {shift} at {p:?}");
            }
        }
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        let p = hit.expect("diagonals cross");
        assert!((p.x - 5.0).abs() < 1e-10);
        assert!((p.y - 5.0).abs() < 1e-10);
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(segment_intersection(a, b, Point::new(0.0, 1.0), Point::new(10.0, 1.0)).is_none());
        // coincident too
        assert!(segment_intersection(a, b, a, b).is_none());
    }

    #[test]
    fn crossing_outside_segments_is_rejected() {
        let hit = segment_intersection(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn touching_endpoint_counts() {
        assert!(segments_cross(
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
            0.001,
        ));
    }
}
