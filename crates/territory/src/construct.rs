//! Polygon construction: turning a closed trail into candidate territory.
//!
//! Each level picks one [`ConstructionStrategy`]. They all share a contract:
//! given a trail of at least 3 points and the position where the actor left
//! safe ground, produce an ordered ring (last point implicitly joins the
//! first). Without an exit position, or with a trail too short to enclose
//! anything, the trail comes back unchanged and [`close_path`] rejects it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cardinal;
use crate::geometry::{nearest_point, polygon_bounds, Point};
use crate::hull::convex_hull;
use crate::intersect::point_in_polygon;
use crate::zone::{Rect, SafeZone, ZoneSet, ZoneShape};

/// Zones with a vertex this close to any trail point join a multi-zone fill.
pub const INVOLVE_RANGE: f64 = 100.0;

/// Vertices of involved zones this close to the trail end are stitched in.
pub const CONNECT_RANGE: f64 = 50.0;

/// Grid spacing for the enclosed-area probe.
pub const ENCLOSURE_SAMPLE_STEP: f64 = 20.0;

/// Zigzag fills borrow from at most this many other zones.
const ZIGZAG_ZONE_LIMIT: usize = 3;

/// How a closed trail becomes a candidate polygon.
///
/// ## Rust Lesson #11: Enums as Strategies
///
/// Instead of `if (level === 8 || level === 10 || ...)` sprinkled through the
/// code, each level names its strategy once and a single `match` dispatches.
/// Adding a strategy makes the compiler point at every match that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStrategy {
    /// Padded axis-aligned rectangle around the trail.
    #[default]
    BoundingRectangle,
    /// Snap onto the nearest rectangle zone via its corners.
    NearestZoneConnect,
    /// Bridge every nearby zone, then wrap the exit zone.
    ComprehensiveMultiZoneFill,
    /// Every other vertex of a few zones, then the exit zone back to front.
    ZigzagMultiZone,
    /// Trail, then the whole nearest zone, then back to the exit.
    ExactShapePlusFullZone,
    /// As `ExactShapePlusFullZone`, hulled if it would enclose unsafe ground.
    EnclosureCheckWithHullFallback,
    /// Trail closed with axis-aligned legs.
    CardinalGapFill,
    /// `CardinalGapFill` with every diagonal edge split into an elbow.
    CardinalOrthogonal,
}

impl ConstructionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BoundingRectangle => "bounding_rectangle",
            Self::NearestZoneConnect => "nearest_zone_connect",
            Self::ComprehensiveMultiZoneFill => "comprehensive_multi_zone_fill",
            Self::ZigzagMultiZone => "zigzag_multi_zone",
            Self::ExactShapePlusFullZone => "exact_shape_plus_full_zone",
            Self::EnclosureCheckWithHullFallback => "enclosure_check_with_hull_fallback",
            Self::CardinalGapFill => "cardinal_gap_fill",
            Self::CardinalOrthogonal => "cardinal_orthogonal",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            Self::BoundingRectangle,
            Self::NearestZoneConnect,
            Self::ComprehensiveMultiZoneFill,
            Self::ZigzagMultiZone,
            Self::ExactShapePlusFullZone,
            Self::EnclosureCheckWithHullFallback,
            Self::CardinalGapFill,
            Self::CardinalOrthogonal,
        ]
    }

    /// Build the candidate ring for a trail.
    pub fn build(&self, input: &ConstructionInput<'_>) -> Vec<Point> {
        let path = input.path;
        let Some(exit) = input.exit_position else {
            return path.to_vec();
        };
        if path.len() < 3 {
            return path.to_vec();
        }

        match self {
            Self::BoundingRectangle => bounding_rectangle(path, input.padding)
                .map(|r| r.bounds().corners().to_vec())
                .unwrap_or_else(|| path.to_vec()),
            Self::NearestZoneConnect => nearest_zone_connect(path, input.zones),
            Self::ComprehensiveMultiZoneFill => comprehensive_fill(path, exit, input.zones),
            Self::ZigzagMultiZone => zigzag_fill(path, exit, input.zones),
            Self::ExactShapePlusFullZone => exact_shape_plus_zone(path, exit, input.zones),
            Self::EnclosureCheckWithHullFallback => enclosure_checked(path, exit, input.zones),
            Self::CardinalGapFill => cardinal::gap_fill(path, input.zones),
            Self::CardinalOrthogonal => cardinal::remove_diagonals(&cardinal::gap_fill(path, input.zones)),
        }
    }
}

/// Everything a strategy may look at.
#[derive(Debug, Clone, Copy)]
pub struct ConstructionInput<'a> {
    pub path: &'a [Point],
    pub exit_position: Option<Point>,
    pub zones: &'a ZoneSet,
    /// Margin for [`ConstructionStrategy::BoundingRectangle`].
    pub padding: f64,
}

/// Construct and validate a candidate zone shape.
///
/// `None` means "no capture": the trail was too short or the strategy
/// produced fewer than 3 points.
pub fn close_path(strategy: ConstructionStrategy, input: &ConstructionInput<'_>) -> Option<ZoneShape> {
    if input.path.len() < 3 {
        debug!(points = input.path.len(), "trail too short to close");
        return None;
    }

    let shape = match (strategy, input.exit_position) {
        (ConstructionStrategy::BoundingRectangle, Some(_)) => {
            bounding_rectangle(input.path, input.padding).map(ZoneShape::Rectangle)
        }
        _ => ZoneShape::polygon(strategy.build(input)),
    };

    if shape.is_none() {
        debug!(strategy = strategy.name(), "construction degenerated");
    }
    shape
}

// ============================================================================
// STRATEGIES
// ============================================================================

fn bounding_rectangle(path: &[Point], padding: f64) -> Option<Rect> {
    let b = polygon_bounds(path)?;
    Some(Rect::from_bounds(&b.expand(padding)))
}

/// Trail, then the corner of the nearest rectangle zone closest to the trail
/// end, then the top corner on that side and the left corner of that edge.
fn nearest_zone_connect(path: &[Point], zones: &ZoneSet) -> Vec<Point> {
    let mut polygon = path.to_vec();
    let (first, last) = (path[0], path[path.len() - 1]);

    let nearest = zones
        .iter()
        .filter_map(|z| match &z.shape {
            ZoneShape::Rectangle(r) => Some(*r),
            ZoneShape::Polygon { .. } => None,
        })
        .map(|r| (r, r.distance_to(first)))
        .fold(None, |best: Option<(Rect, f64)>, (r, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((r, d)),
        });

    let Some((rect, _)) = nearest else {
        return polygon;
    };

    let corners = rect.bounds().corners();
    let Some((idx, _)) = nearest_point(last, &corners) else {
        return polygon;
    };
    let corner = corners[idx];
    let (left, right) = (rect.x, rect.x + rect.width);
    let (top, bottom) = (rect.y, rect.y + rect.height);

    let mut push_unique = |p: Point| {
        if polygon.last() != Some(&p) {
            polygon.push(p);
        }
    };

    push_unique(corner);
    if corner.x == left {
        push_unique(Point::new(left, top));
    } else if corner.x == right {
        push_unique(Point::new(right, top));
    }
    if corner.y == top {
        push_unique(Point::new(left, top));
    } else if corner.y == bottom {
        push_unique(Point::new(left, bottom));
    }

    polygon
}

/// Zone the actor left from: the one containing the exit, else the nearest.
fn exit_zone(exit: Point, zones: &ZoneSet) -> Option<&SafeZone> {
    zones.zone_containing(exit).or_else(|| zones.nearest(exit))
}

fn comprehensive_fill(path: &[Point], exit: Point, zones: &ZoneSet) -> Vec<Point> {
    let mut polygon = path.to_vec();
    let last = path[path.len() - 1];

    for zone in zones.iter() {
        let corners = zone.shape.corners();
        let involved = corners
            .iter()
            .any(|c| path.iter().any(|p| c.distance(*p) < INVOLVE_RANGE));
        if involved {
            polygon.extend(corners.iter().filter(|c| c.distance(last) < CONNECT_RANGE));
        }
    }

    polygon.push(exit);

    if let Some(zone) = exit_zone(exit, zones) {
        match &zone.shape {
            ZoneShape::Polygon { points, .. } => polygon.extend(points.iter().step_by(2)),
            ZoneShape::Rectangle(r) => polygon.extend(r.bounds().corners()),
        }
    }

    polygon
}

fn zigzag_fill(path: &[Point], exit: Point, zones: &ZoneSet) -> Vec<Point> {
    let mut polygon = path.to_vec();
    let exit_id = exit_zone(exit, zones).map(|z| z.id);

    for zone in zones.iter().filter(|z| Some(z.id) != exit_id).take(ZIGZAG_ZONE_LIMIT) {
        polygon.extend(zone.shape.corners().iter().step_by(2));
    }

    polygon.push(exit);

    if let Some(zone) = exit_id.and_then(|id| zones.get(id)) {
        match &zone.shape {
            ZoneShape::Polygon { points, .. } => polygon.extend(points.iter().rev().step_by(2)),
            ZoneShape::Rectangle(r) => {
                let [tl, tr, br, bl] = r.bounds().corners();
                polygon.extend([tl, br, tr, bl]);
            }
        }
    }

    polygon
}

/// Trail, the nearest zone's full ring starting from its vertex closest to
/// the trail end, then the exit position.
fn exact_shape_plus_zone(path: &[Point], exit: Point, zones: &ZoneSet) -> Vec<Point> {
    let mut polygon = path.to_vec();
    let last = path[path.len() - 1];

    if let Some(zone) = zones.nearest(last) {
        let ring = zone.shape.corners();
        if let Some((start, _)) = nearest_point(last, &ring) {
            let n = ring.len();
            polygon.extend((0..n).map(|i| ring[(start + i) % n]));
        }
    }

    polygon.push(exit);
    polygon
}

fn enclosure_checked(path: &[Point], exit: Point, zones: &ZoneSet) -> Vec<Point> {
    let candidate = exact_shape_plus_zone(path, exit, zones);

    if !encloses_unsafe_ground(&candidate, zones) {
        return candidate;
    }

    debug!("candidate encloses unsafe ground, falling back to hull");
    let mut all = candidate;
    all.extend(zones.polygon_vertices());
    convex_hull(&all)
}

/// Probe a grid over the candidate's bounds for points it would enclose that
/// are not already safe.
///
/// This is a sampling approximation: pockets smaller than the grid step can
/// slip through.
pub fn encloses_unsafe_ground(candidate: &[Point], zones: &ZoneSet) -> bool {
    let Some(b) = polygon_bounds(candidate) else {
        return false;
    };

    let nx = (b.width() / ENCLOSURE_SAMPLE_STEP).floor() as usize;
    let ny = (b.height() / ENCLOSURE_SAMPLE_STEP).floor() as usize;

    (0..=nx).any(|i| {
        let x = b.min_x + i as f64 * ENCLOSURE_SAMPLE_STEP;
        (0..=ny).any(|j| {
            let p = Point::new(x, b.min_y + j as f64 * ENCLOSURE_SAMPLE_STEP);
            point_in_polygon(p, candidate) && !zones.is_safe(p)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon_area;

    fn square_path() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    fn input<'a>(path: &'a [Point], exit: Option<Point>, zones: &'a ZoneSet) -> ConstructionInput<'a> {
        ConstructionInput {
            path,
            exit_position: exit,
            zones,
            padding: 20.0,
        }
    }

    #[test]
    fn exact_shape_without_zones_closes_trail() {
        let zones = ZoneSet::new();
        let path = square_path();
        let ring = ConstructionStrategy::ExactShapePlusFullZone.build(&input(&path, Some(Point::new(0.0, 0.0)), &zones));
        assert_eq!(ring.len(), 5);
        assert!((polygon_area(&ring) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn missing_exit_returns_raw_trail() {
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        let path = square_path();
        for strategy in ConstructionStrategy::all() {
            assert_eq!(strategy.build(&input(&path, None, &zones)), path, "{}", strategy.name());
        }
    }

    #[test]
    fn short_trail_is_rejected() {
        let zones = ZoneSet::new();
        let path = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let inp = input(&path, Some(Point::new(0.0, 0.0)), &zones);
        for strategy in ConstructionStrategy::all() {
            assert_eq!(strategy.build(&inp), path);
            assert!(close_path(*strategy, &inp).is_none());
        }
    }

    #[test]
    fn bounding_rectangle_is_padded() {
        let zones = ZoneSet::new();
        let path = square_path();
        let shape = close_path(ConstructionStrategy::BoundingRectangle, &input(&path, Some(path[0]), &zones));
        assert_eq!(shape, Some(ZoneShape::Rectangle(Rect::new(-20.0, -20.0, 50.0, 50.0))));
    }

    #[test]
    fn exact_shape_wraps_initial_zone() {
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        // out the top, loop up and come back down onto the top edge
        let path = vec![
            Point::new(380.0, 248.0),
            Point::new(380.0, 150.0),
            Point::new(420.0, 150.0),
            Point::new(420.0, 252.0),
        ];
        let exit = Point::new(380.0, 248.0);
        let ring = ConstructionStrategy::ExactShapePlusFullZone.build(&input(&path, Some(exit), &zones));
        assert_eq!(ring.len(), 4 + 4 + 1);
        // starts the zone at the corner nearest the trail end (top-right)
        assert_eq!(ring[4], Point::new(450.0, 250.0));
        assert_eq!(*ring.last().unwrap(), exit);
        // the whole initial zone is inside the result
        assert!(point_in_polygon(Point::new(400.0, 300.0), &ring));
    }

    #[test]
    fn nearest_zone_connect_appends_corners() {
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        let path = vec![
            Point::new(455.0, 340.0),
            Point::new(500.0, 340.0),
            Point::new(500.0, 380.0),
            Point::new(460.0, 380.0),
        ];
        let ring = ConstructionStrategy::NearestZoneConnect.build(&input(&path, Some(path[0]), &zones));
        // bottom-right corner, top-right of that side, then bottom-left
        assert_eq!(
            &ring[4..],
            &[Point::new(450.0, 350.0), Point::new(450.0, 250.0), Point::new(350.0, 350.0)]
        );
    }

    #[test]
    fn nearest_zone_connect_ignores_polygons() {
        let mut zones = ZoneSet::new();
        zones.insert(
            ZoneShape::polygon(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(0.0, 50.0)]).unwrap(),
            None,
        );
        let path = square_path();
        let ring = ConstructionStrategy::NearestZoneConnect.build(&input(&path, Some(path[0]), &zones));
        assert_eq!(ring, path);
    }

    #[test]
    fn comprehensive_fill_wraps_exit_rectangle() {
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        let path = vec![
            Point::new(455.0, 300.0),
            Point::new(520.0, 300.0),
            Point::new(520.0, 360.0),
            Point::new(470.0, 360.0),
        ];
        let exit = path[0];
        let ring = ConstructionStrategy::ComprehensiveMultiZoneFill.build(&input(&path, Some(exit), &zones));
        // bottom-right corner is within reach of the trail end
        assert_eq!(ring[4], Point::new(450.0, 350.0));
        assert_eq!(ring[5], exit);
        assert_eq!(ring.len(), 4 + 1 + 1 + 4);
    }

    #[test]
    fn zigzag_uses_spiral_order_for_exit_rectangle() {
        let mut zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        zones.insert(ZoneShape::Rectangle(Rect::new(600.0, 100.0, 50.0, 50.0)), None);
        let path = vec![
            Point::new(455.0, 300.0),
            Point::new(520.0, 300.0),
            Point::new(520.0, 360.0),
            Point::new(470.0, 360.0),
        ];
        let exit = path[0];
        let ring = ConstructionStrategy::ZigzagMultiZone.build(&input(&path, Some(exit), &zones));
        // two corners from the other zone, the exit, then TL, BR, TR, BL
        assert_eq!(ring[4], Point::new(600.0, 100.0));
        assert_eq!(ring[5], Point::new(650.0, 150.0));
        assert_eq!(ring[6], exit);
        assert_eq!(
            &ring[7..],
            &[
                Point::new(350.0, 250.0),
                Point::new(450.0, 350.0),
                Point::new(450.0, 250.0),
                Point::new(350.0, 350.0),
            ]
        );
    }

    #[test]
    fn enclosure_check_hulls_when_probe_fires() {
        let zones = ZoneSet::with_initial(Rect::new(350.0, 250.0, 100.0, 100.0));
        let path = vec![
            Point::new(380.0, 248.0),
            Point::new(380.0, 150.0),
            Point::new(420.0, 150.0),
            Point::new(420.0, 252.0),
        ];
        let exit = path[0];
        let inp = input(&path, Some(exit), &zones);
        let exact = ConstructionStrategy::ExactShapePlusFullZone.build(&inp);
        let checked = ConstructionStrategy::EnclosureCheckWithHullFallback.build(&inp);
        // the new ground is unsafe today, so the probe fires and the hull
        // still covers the exact candidate
        assert!(encloses_unsafe_ground(&exact, &zones));
        assert!(polygon_area(&checked) >= polygon_area(&exact) - 1e-6);
    }

    #[test]
    fn enclosure_probe_ignores_already_safe_ground() {
        let zones = ZoneSet::with_initial(Rect::new(0.0, 0.0, 100.0, 100.0));
        let inner = vec![
            Point::new(10.0, 10.0),
            Point::new(90.0, 10.0),
            Point::new(90.0, 90.0),
            Point::new(10.0, 90.0),
        ];
        assert!(!encloses_unsafe_ground(&inner, &zones));
    }

    #[test]
    fn strategy_names_are_unique() {
        let mut names: Vec<_> = ConstructionStrategy::all().iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ConstructionStrategy::all().len());
    }
}
