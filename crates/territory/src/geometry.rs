//! Core geometry types for territory.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! In JS you'd write: `const point = { x: 1.0, y: 2.0 }`
//! In Rust, we define a `struct` with explicit types.
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = like console.log, lets you print with `{:?}`
//! - `Clone` / `Copy` = can duplicate the value (Copy does it implicitly)
//! - `PartialEq` = can compare with `==`
//! - `Serialize` / `Deserialize` = serde can turn it into JSON/YAML and back

use serde::{Deserialize, Serialize};

/// A 2D point on the board.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A line segment defined by two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

// ============================================================================
// IMPLEMENTATIONS (methods)
// ============================================================================
//
// ## Rust Lesson #5: impl blocks
//
// In JS you'd use class methods: `class Point { distance() {...} }`
// In Rust, we separate data (struct) from behavior (impl).

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    ///
    /// Point is `Copy`, so `other` is copied in rather than moved.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn distance_squared(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// True when both coordinates are within `epsilon` of `other`.
    #[inline]
    pub fn approx_eq(&self, other: Point, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Segment {
    #[inline]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Length of the segment.
    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Distance from `p` to the closest point of this segment.
    #[inline]
    pub fn distance_to(&self, p: Point) -> f64 {
        point_to_segment_distance(p, self.start, self.end)
    }
}

impl Bounds {
    /// Bounds of a rectangle given its origin and size.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            max_x: x + width,
            min_y: y,
            max_y: y + height,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Grow the box by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }

    /// True when the two boxes overlap (touching counts).
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !(self.max_x < other.min_x
            || other.max_x < self.min_x
            || self.max_y < other.min_y
            || other.max_y < self.min_y)
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Corners in clockwise screen order starting top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// All four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.max_x.is_finite() && self.min_y.is_finite() && self.max_y.is_finite()
    }
}

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

/// Calculate signed area of a point sequence using the shoelace formula.
///
/// Returns:
/// - Positive value for counter-clockwise winding (y up)
/// - Negative value for clockwise winding
/// - Zero for fewer than 3 points
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    area / 2.0
}

/// Unsigned polygon area. Degenerate input (collinear or <3 points) gives 0.
#[inline]
pub fn polygon_area(points: &[Point]) -> f64 {
    signed_area(points).abs()
}

/// Axis-aligned bounding box, or `None` for an empty slice.
///
/// ## Rust Lesson #6: Option<T>
///
/// Rust has no `null`. An empty polygon has no bounds, so we say so in the
/// type instead of returning infinities.
pub fn polygon_bounds(points: &[Point]) -> Option<Bounds> {
    if points.is_empty() {
        return None;
    }

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    Some(Bounds { min_x, max_x, min_y, max_y })
}

/// Distance from `p` to segment `a`-`b`, with the projection clamped to the
/// segment. A zero-length segment degrades to the distance to `a`.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let cx = b.x - a.x;
    let cy = b.y - a.y;
    let len_sq = cx * cx + cy * cy;

    if len_sq == 0.0 {
        return p.distance(a);
    }

    let t = (((p.x - a.x) * cx + (p.y - a.y) * cy) / len_sq).clamp(0.0, 1.0);
    p.distance(Point::new(a.x + t * cx, a.y + t * cy))
}

/// Vertex centroid (mean of the points). Origin for an empty slice.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::new(0.0, 0.0);
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.x).sum();
    let sum_y: f64 = points.iter().map(|p| p.y).sum();
    Point::new(sum_x / n, sum_y / n)
}

/// Move every point toward the vertex centroid by `factor` (0.02 = 2%).
pub fn scale_toward_centroid(points: &mut [Point], factor: f64) {
    let c = centroid(points);
    let keep = 1.0 - factor;
    for p in points.iter_mut() {
        p.x = c.x + (p.x - c.x) * keep;
        p.y = c.y + (p.y - c.y) * keep;
    }
}

/// Index and distance of the point in `candidates` closest to `target`.
pub fn nearest_point(target: Point, candidates: &[Point]) -> Option<(usize, f64)> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, p)| (i, target.distance(*p)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(size, 0.0),
            Point::new(size, size),
            Point::new(0.0, size),
        ]
    }

    #[test]
    fn point_distance() {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(3.0, 4.0);
        assert_eq!(p1.distance(p2), 5.0); // 3-4-5 triangle
    }

    #[test]
    fn segment_length() {
        let seg = Segment::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert_eq!(seg.length(), 5.0);
    }

    #[test]
    fn polygon_bbox() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        let b = polygon_bounds(&poly).unwrap();
        assert_eq!((b.min_x, b.max_x, b.min_y, b.max_y), (0.0, 10.0, 0.0, 5.0));
    }

    #[test]
    fn empty_polygon_bbox() {
        assert_eq!(polygon_bounds(&[]), None);
    }

    #[test]
    fn square_area_is_100() {
        assert!((polygon_area(&square(10.0)) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn signed_area_flips_with_winding() {
        let ccw = square(10.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!(signed_area(&ccw) > 0.0);
        assert!(signed_area(&cw) < 0.0);
        assert_eq!(polygon_area(&ccw), polygon_area(&cw));
    }

    #[test]
    fn degenerate_area_is_zero() {
        assert_eq!(polygon_area(&[Point::new(0.0, 0.0), Point::new(5.0, 5.0)]), 0.0);
        let collinear = [Point::new(0.0, 0.0), Point::new(5.0, 5.0), Point::new(10.0, 10.0)];
        assert!(polygon_area(&collinear).abs() < 1e-12);
    }

    #[test]
    fn area_scales_quadratically_and_ignores_translation() {
        let base = vec![
            Point::new(1.0, 2.0),
            Point::new(7.0, 3.0),
            Point::new(6.0, 9.0),
            Point::new(2.0, 6.0),
        ];
        let a = polygon_area(&base);
        let scaled: Vec<Point> = base.iter().map(|p| Point::new(p.x * 3.0, p.y * 3.0)).collect();
        let moved: Vec<Point> = base.iter().map(|p| Point::new(p.x + 40.0, p.y - 13.0)).collect();
        assert!((polygon_area(&scaled) - 9.0 * a).abs() < 1e-9);
        assert!((polygon_area(&moved) - a).abs() < 1e-9);
    }

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(point_to_segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(point_to_segment_distance(Point::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(point_to_segment_distance(Point::new(13.0, 4.0), a, b), 5.0);
    }

    #[test]
    fn zero_length_segment_distance() {
        let a = Point::new(2.0, 2.0);
        assert_eq!(point_to_segment_distance(Point::new(5.0, 6.0), a, a), 5.0);
    }

    #[test]
    fn shrink_moves_vertices_inward() {
        let mut pts = square(100.0);
        scale_toward_centroid(&mut pts, 0.02);
        assert!((pts[0].x - 1.0).abs() < 1e-9);
        assert!((pts[2].y - 99.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_overlap_with_margin() {
        let a = Bounds::from_rect(0.0, 0.0, 10.0, 10.0);
        let b = Bounds::from_rect(40.0, 0.0, 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.expand(50.0).overlaps(&b));
    }
}
