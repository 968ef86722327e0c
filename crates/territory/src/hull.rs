//! Convex hull (Graham scan).
//!
//! Merged territory is simplified through here, so the scan has to survive
//! whatever a merge throws at it: duplicates, collinear runs, tiny inputs.

use crate::geometry::Point;

/// Points closer than this on both axes are treated as the same point.
pub const HULL_DEDUP_EPSILON: f64 = 0.1;

/// Cross product of `o->a` and `o->b`. Positive for a left turn.
#[inline]
pub fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Remove near-duplicate points, keeping the first occurrence.
pub fn dedup_points(points: &[Point], epsilon: f64) -> Vec<Point> {
    let mut unique: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if !unique.iter().any(|u| u.approx_eq(p, epsilon)) {
            unique.push(p);
        }
    }
    unique
}

/// Convex hull of a point set.
///
/// Points are deduplicated first; if fewer than three unique points remain
/// they are returned as-is. Otherwise the pivot is the lowest-y point (lowest
/// x on ties), the rest are sorted by polar angle around it (nearer first on
/// equal angles) and swept, popping while the turn is not strictly left.
/// Collinear boundary points are therefore dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let unique = dedup_points(points, HULL_DEDUP_EPSILON);
    if unique.len() < 3 {
        return unique;
    }

    let pivot_idx = unique
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let pivot = unique[pivot_idx];

    let mut rest: Vec<Point> = unique
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pivot_idx)
        .map(|(_, p)| *p)
        .collect();

    rest.sort_by(|a, b| {
        let angle_a = (a.y - pivot.y).atan2(a.x - pivot.x);
        let angle_b = (b.y - pivot.y).atan2(b.x - pivot.x);
        angle_a
            .total_cmp(&angle_b)
            .then(pivot.distance_squared(*a).total_cmp(&pivot.distance_squared(*b)))
    });

    let mut hull: Vec<Point> = Vec::with_capacity(rest.len() + 1);
    hull.push(pivot);

    for p in rest {
        while hull.len() > 1 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }

    hull
}
