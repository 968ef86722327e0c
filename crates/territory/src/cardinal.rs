//! Axis-aligned closure for the cardinal-movement levels.
//!
//! When the player can only move horizontally or vertically, a closed trail
//! often stops short of where it started. The router here walks the gap back
//! with horizontal/vertical legs that stay clear of the trail itself.

use crate::geometry::{Point, Segment};
use crate::intersect::segments_cross;
use crate::zone::ZoneSet;

/// Gaps shorter than this are left for the implicit closing edge.
pub const GAP_THRESHOLD: f64 = 5.0;

/// Offset of the fallback detour above or below the trail end.
pub const DETOUR_MARGIN: f64 = 40.0;

/// Step length when walking along a zone edge.
pub const EDGE_WALK_STEP: f64 = 10.0;

/// An edge counts as horizontal/vertical when its minor axis moves less than this.
const AXIS_TOLERANCE: f64 = 0.1;

/// Coarse parallel guard for trail-crossing tests.
const ROUTE_PARALLEL_EPSILON: f64 = 0.001;

/// An edge is diagonal when it moves more than this on both axes.
pub const DIAGONAL_MIN: f64 = 2.0;

/// Copy of `path` with an axis-aligned route from its last point back to its
/// first, when the two are more than [`GAP_THRESHOLD`] apart.
pub fn gap_fill(path: &[Point], zones: &ZoneSet) -> Vec<Point> {
    let mut polygon = path.to_vec();
    let (Some(&start), Some(&end)) = (path.first(), path.last()) else {
        return polygon;
    };

    if start.distance(end) > GAP_THRESHOLD {
        polygon.extend(route_to_start(end, start, path, zones));
    }
    polygon
}

/// Route from `from` to `to` without crossing `trail`.
///
/// Tries a direct L first, then a route via the nearest axis-aligned zone
/// edge, then a detour above or below. The last resort is a straight hop.
pub fn route_to_start(from: Point, to: Point, trail: &[Point], zones: &ZoneSet) -> Vec<Point> {
    if let Some(route) = direct_route(from, to, trail) {
        return route;
    }
    if let Some(route) = edge_route(from, to, trail, zones) {
        return route;
    }
    detour(from, to, trail)
}

/// Split every diagonal edge of a ring into a horizontal and a vertical leg.
///
/// The longer axis goes first.
pub fn remove_diagonals(polygon: &[Point]) -> Vec<Point> {
    let n = polygon.len();
    if n < 3 {
        return polygon.to_vec();
    }

    let mut result = Vec::with_capacity(n * 2);
    for i in 0..n {
        let current = polygon[i];
        let next = polygon[(i + 1) % n];
        result.push(current);

        let dx = (next.x - current.x).abs();
        let dy = (next.y - current.y).abs();
        if dx > DIAGONAL_MIN && dy > DIAGONAL_MIN {
            result.push(elbow(current, next));
        }
    }
    result
}

/// Corner joining `a` to `b` with two axis-aligned legs, longer axis first.
fn elbow(a: Point, b: Point) -> Point {
    if (b.x - a.x).abs() > (b.y - a.y).abs() {
        Point::new(b.x, a.y)
    } else {
        Point::new(a.x, b.y)
    }
}

fn direct_route(from: Point, to: Point, trail: &[Point]) -> Option<Vec<Point>> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;

    if dx.abs() > dy.abs() {
        let corner = Point::new(to.x, from.y);
        if !crosses_trail(from, corner, trail) {
            return Some(vec![corner, to]);
        }
    }

    let corner = Point::new(from.x, to.y);
    if !crosses_trail(from, corner, trail) {
        return Some(vec![corner, to]);
    }

    None
}

fn edge_route(from: Point, to: Point, trail: &[Point], zones: &ZoneSet) -> Option<Vec<Point>> {
    let mut best: Option<(Segment, f64)> = None;

    for zone in zones.iter() {
        let corners = zone.shape.corners();
        let n = corners.len();
        for i in 0..n {
            let edge = Segment::new(corners[i], corners[(i + 1) % n]);
            let ex = (edge.end.x - edge.start.x).abs();
            let ey = (edge.end.y - edge.start.y).abs();

            let distance = if ex > AXIS_TOLERANCE && ey < AXIS_TOLERANCE {
                (from.y - edge.start.y).abs()
            } else if ey > AXIS_TOLERANCE && ex < AXIS_TOLERANCE {
                (from.x - edge.start.x).abs()
            } else {
                continue;
            };

            if best.is_none_or(|(_, d)| distance < d) && !crosses_trail(from, edge.start, trail) {
                best = Some((edge, distance));
            }
        }
    }

    let (edge, _) = best?;
    let mut route = vec![edge.start];
    route.extend(walk_edge(edge, trail));

    let last = route.last().copied().unwrap_or(edge.start);
    if !crosses_trail(last, to, trail) {
        route.push(to);
    }
    Some(route)
}

/// Points stepping from an edge's start toward its end, stopping short of the
/// end or before the next step would cross the trail.
fn walk_edge(edge: Segment, trail: &[Point]) -> Vec<Point> {
    let length = edge.length();
    if length <= EDGE_WALK_STEP {
        return Vec::new();
    }

    let ux = (edge.end.x - edge.start.x) / length;
    let uy = (edge.end.y - edge.start.y) / length;
    let steps = (length / EDGE_WALK_STEP).ceil() as usize - 1;

    let mut walked = Vec::with_capacity(steps);
    let mut current = edge.start;
    for _ in 0..steps {
        let next = Point::new(current.x + ux * EDGE_WALK_STEP, current.y + uy * EDGE_WALK_STEP);
        if crosses_trail(current, next, trail) {
            break;
        }
        walked.push(next);
        current = next;
    }
    walked
}

fn detour(from: Point, to: Point, trail: &[Point]) -> Vec<Point> {
    for offset in [-DETOUR_MARGIN, DETOUR_MARGIN] {
        let out = Point::new(from.x, from.y + offset);
        let across = Point::new(to.x, from.y + offset);
        if !crosses_trail(from, out, trail)
            && !crosses_trail(out, across, trail)
            && !crosses_trail(across, to, trail)
        {
            return vec![out, across, to];
        }
    }
    vec![to]
}

/// Does segment `a-b` cross any trail segment?
///
/// Trail segments that share an endpoint with `a-b` are skipped, otherwise
/// every leg leaving the trail's end would count as crossing it.
fn crosses_trail(a: Point, b: Point, trail: &[Point]) -> bool {
    const SHARED: f64 = 1e-9;
    trail.windows(2).any(|seg| {
        let (s, e) = (seg[0], seg[1]);
        let touches = [s, e]
            .iter()
            .any(|p| p.approx_eq(a, SHARED) || p.approx_eq(b, SHARED));
        !touches && segments_cross(a, b, s, e, ROUTE_PARALLEL_EPSILON)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Rect;

    fn is_axis_aligned(points: &[Point]) -> bool {
        let n = points.len();
        (0..n).all(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            (a.x - b.x).abs() <= DIAGONAL_MIN || (a.y - b.y).abs() <= DIAGONAL_MIN
        })
    }

    #[test]
    fn closed_trail_is_untouched() {
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(2.0, 2.0),
        ];
        assert_eq!(gap_fill(&path, &ZoneSet::new()), path);
    }

    #[test]
    fn open_trail_gets_l_route() {
        // Hook down the left side and across; home runs down then left
        let path = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 60.0),
            Point::new(100.0, 60.0),
            Point::new(100.0, 20.0),
        ];
        let filled = gap_fill(&path, &ZoneSet::new());
        assert_eq!(filled.len(), 6);
        assert_eq!(filled[4], Point::new(100.0, 0.0));
        assert_eq!(filled[5], Point::new(0.0, 0.0));
    }

    #[test]
    fn blocked_route_still_fills_gap() {
        // The end sits inside a hook of the trail, so neither L works.
        let path = vec![
            Point::new(400.0, 300.0),
            Point::new(400.0, 200.0),
            Point::new(600.0, 200.0),
            Point::new(600.0, 400.0),
            Point::new(300.0, 400.0),
            Point::new(300.0, 250.0),
            Point::new(500.0, 250.0),
            Point::new(500.0, 350.0),
        ];
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        let filled = gap_fill(&path, &zones);
        assert!(filled.len() > path.len());
        assert_eq!(&filled[..path.len()], path.as_slice());
    }

    #[test]
    fn diagonals_become_elbows() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(0.0, 60.0)];
        let ortho = remove_diagonals(&tri);
        assert_eq!(ortho.len(), 4);
        // longer axis first: 100 across, then 60 down
        assert_eq!(ortho[2], Point::new(0.0, 0.0));
        assert!(is_axis_aligned(&ortho));
    }

    #[test]
    fn small_wobbles_are_not_diagonal() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 1.5),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
        ];
        assert_eq!(remove_diagonals(&square), square);
    }

    #[test]
    fn trail_touch_at_shared_endpoint_is_not_a_crossing() {
        let trail = [Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        assert!(!crosses_trail(Point::new(10.0, 0.0), Point::new(10.0, 10.0), &trail));
        assert!(crosses_trail(Point::new(5.0, -5.0), Point::new(5.0, 5.0), &trail));
    }
}
