//! Safe zones: the territory the player already owns.
//!
//! A point is safe when any zone contains it. Rectangles use an inclusive
//! bounds test, polygons go through [`point_in_polygon`], and every
//! containment question in the game goes through [`ZoneSet::is_safe`].

use serde::{Deserialize, Serialize};

use crate::geometry::{point_to_segment_distance, polygon_area, polygon_bounds, scale_toward_centroid, Bounds, Point};
use crate::intersect::point_in_polygon;

/// Stable identifier for a zone within one level.
pub type ZoneId = u32;

/// Axis-aligned rectangle given by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_bounds(b: &Bounds) -> Self {
        Self::new(b.min_x, b.min_y, b.width(), b.height())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.x, self.y, self.width, self.height)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(p)
    }

    /// Distance from `p` to the rectangle; zero inside.
    pub fn distance_to(&self, p: Point) -> f64 {
        let dx = (self.x - p.x).max(0.0).max(p.x - (self.x + self.width));
        let dy = (self.y - p.y).max(0.0).max(p.y - (self.y + self.height));
        (dx * dx + dy * dy).sqrt()
    }
}

/// Geometry of a safe zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ZoneShape {
    Rectangle(Rect),
    /// Implicitly closed ring with a cached bounding box.
    Polygon { points: Vec<Point>, bounds: Bounds },
}

impl ZoneShape {
    /// Build a polygon zone, or `None` when there are fewer than 3 points.
    pub fn polygon(points: Vec<Point>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let bounds = polygon_bounds(&points)?;
        Some(Self::Polygon { points, bounds })
    }

    /// Vertices in ring order. Rectangles yield their four corners clockwise
    /// (screen coordinates) from the top-left.
    pub fn corners(&self) -> Vec<Point> {
        match self {
            Self::Rectangle(r) => r.bounds().corners().to_vec(),
            Self::Polygon { points, .. } => points.clone(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Self::Rectangle(r) => r.bounds(),
            Self::Polygon { bounds, .. } => *bounds,
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Self::Rectangle(r) => r.area(),
            Self::Polygon { points, .. } => polygon_area(points),
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            Self::Rectangle(r) => r.contains(p),
            Self::Polygon { points, bounds } => bounds.contains(p) && point_in_polygon(p, points),
        }
    }

    /// Distance from `p` to the zone; zero when contained.
    pub fn distance_to(&self, p: Point) -> f64 {
        match self {
            Self::Rectangle(r) => r.distance_to(p),
            Self::Polygon { points, .. } => {
                if point_in_polygon(p, points) {
                    return 0.0;
                }
                let n = points.len();
                (0..n)
                    .map(|i| point_to_segment_distance(p, points[i], points[(i + 1) % n]))
                    .fold(f64::INFINITY, f64::min)
            }
        }
    }

    pub fn is_rectangle(&self) -> bool {
        matches!(self, Self::Rectangle(_))
    }

    /// Shrink toward the centre by `factor`.
    ///
    /// Polygons pull each vertex toward the vertex centroid; rectangles lose
    /// `factor` of each dimension, split evenly between opposite sides.
    pub fn shrink(&mut self, factor: f64) {
        match self {
            Self::Rectangle(r) => {
                let sx = r.width * factor / 2.0;
                let sy = r.height * factor / 2.0;
                r.x += sx;
                r.y += sy;
                r.width -= sx * 2.0;
                r.height -= sy * 2.0;
            }
            Self::Polygon { points, bounds } => {
                scale_toward_centroid(points, factor);
                if let Some(b) = polygon_bounds(points) {
                    *bounds = b;
                }
            }
        }
    }
}

/// Lifetime metadata for a temporary zone. Times are simulation milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decay {
    pub created_at: u64,
    pub lifespan: u64,
    /// Set once the zone's survival condition is met; it then never expires.
    pub survives: bool,
    /// Expiry of this zone ends the game.
    pub kill_on_expire: bool,
}

impl Decay {
    pub fn new(created_at: u64, lifespan: u64, kill_on_expire: bool) -> Self {
        Self {
            created_at,
            lifespan,
            survives: false,
            kill_on_expire,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        !self.survives && now.saturating_sub(self.created_at) >= self.lifespan
    }

    /// Milliseconds left, zero once expired or if it survives forever.
    pub fn remaining(&self, now: u64) -> u64 {
        if self.survives {
            return 0;
        }
        self.lifespan.saturating_sub(now.saturating_sub(self.created_at))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeZone {
    pub id: ZoneId,
    pub shape: ZoneShape,
    pub decay: Option<Decay>,
}

impl SafeZone {
    pub fn is_temporary(&self) -> bool {
        self.decay.is_some_and(|d| !d.survives)
    }
}

/// What an expiry pass removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpiryReport {
    pub removed: Vec<ZoneId>,
    /// A `kill_on_expire` zone ran out.
    pub fatal: bool,
}

/// All safe zones of the running level.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ZoneSet {
    zones: Vec<SafeZone>,
    #[serde(skip)]
    next_id: ZoneId,
}

impl ZoneSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding only the starting rectangle.
    pub fn with_initial(rect: Rect) -> Self {
        let mut set = Self::new();
        set.insert(ZoneShape::Rectangle(rect), None);
        set
    }

    pub fn insert(&mut self, shape: ZoneShape, decay: Option<Decay>) -> ZoneId {
        let id = self.next_id;
        self.next_id += 1;
        self.zones.push(SafeZone { id, shape, decay });
        id
    }

    /// Drop every zone and install `shape` as the only one.
    pub fn replace_all(&mut self, shape: ZoneShape, decay: Option<Decay>) -> ZoneId {
        self.zones.clear();
        self.insert(shape, decay)
    }

    pub fn remove(&mut self, id: ZoneId) -> Option<SafeZone> {
        let idx = self.zones.iter().position(|z| z.id == id)?;
        Some(self.zones.remove(idx))
    }

    pub fn get(&self, id: ZoneId) -> Option<&SafeZone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut SafeZone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SafeZone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Union containment over every zone.
    pub fn is_safe(&self, p: Point) -> bool {
        self.zones.iter().any(|z| z.shape.contains(p))
    }

    /// First zone containing `p`, in insertion order.
    pub fn zone_containing(&self, p: Point) -> Option<&SafeZone> {
        self.zones.iter().find(|z| z.shape.contains(p))
    }

    /// Zone closest to `p` (ties keep the earlier zone).
    pub fn nearest(&self, p: Point) -> Option<&SafeZone> {
        let mut best: Option<(&SafeZone, f64)> = None;
        for zone in &self.zones {
            let d = zone.shape.distance_to(p);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((zone, d));
            }
        }
        best.map(|(z, _)| z)
    }

    /// Vertices of every polygon zone, in zone order.
    pub fn polygon_vertices(&self) -> Vec<Point> {
        self.zones
            .iter()
            .filter_map(|z| match &z.shape {
                ZoneShape::Polygon { points, .. } => Some(points.as_slice()),
                ZoneShape::Rectangle(_) => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn has_polygon(&self) -> bool {
        self.zones.iter().any(|z| !z.shape.is_rectangle())
    }

    /// Remove temporary zones whose lifespan has run out.
    ///
    /// A zone expires once `now - created_at >= lifespan` unless its survival
    /// condition was met.
    pub fn expire(&mut self, now: u64) -> ExpiryReport {
        let mut report = ExpiryReport::default();
        self.zones.retain(|z| match z.decay {
            Some(d) if d.is_expired(now) => {
                report.removed.push(z.id);
                report.fatal |= d.kill_on_expire;
                false
            }
            _ => true,
        });
        report
    }

    /// Sum of zone areas as a percentage of `board_area`.
    ///
    /// Overlapping zones are counted twice. Level thresholds are tuned
    /// against this sum, not the true union area.
    pub fn coverage_percent(&self, board_area: f64) -> f64 {
        if board_area <= 0.0 {
            return 0.0;
        }
        let total: f64 = self.zones.iter().map(|z| z.shape.area()).sum();
        total / board_area * 100.0
    }

    pub fn shrink_all(&mut self, factor: f64) {
        for zone in &mut self.zones {
            zone.shape.shrink(factor);
        }
    }

    /// Mark a zone as having met its survival condition.
    pub fn mark_survivor(&mut self, id: ZoneId) {
        if let Some(d) = self.get_mut(id).and_then(|z| z.decay.as_mut()) {
            d.survives = true;
        }
    }
}
