//! Things that move or can be picked up.
//!
//! ## Rust Lesson #12: Arenas instead of shared references
//!
//! Enemies get captured, apples get eaten, runners get caught, all while
//! other code is looking at the same lists. Rather than hand out references
//! that could dangle, every entity lives in an [`Arena`] and is addressed by
//! an [`EntityId`] that stays valid (or cleanly misses) after removals.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::power_up::PowerUpKind;

/// Stable handle into an [`Arena`]. Ids are never reused within one arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Insertion-ordered storage keyed by [`EntityId`].
///
/// Iteration order is insertion order, which keeps ticks deterministic.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    items: Vec<(EntityId, T)>,
    next_id: u32,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 0,
        }
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: T) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.items.push((id, item));
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let idx = self.items.iter().position(|(i, _)| *i == id)?;
        Some(self.items.remove(idx).1)
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.iter().find(|(i, _)| *i == id).map(|(_, t)| t)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.iter_mut().find(|(i, _)| *i == id).map(|(_, t)| t)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.items.iter().map(|(i, t)| (*i, t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.items.iter_mut().map(|(i, t)| (*i, t))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|(_, t)| t)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.items.iter().map(|(i, _)| *i).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(EntityId, &T) -> bool) {
        self.items.retain(|(i, t)| keep(*i, t));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Anything with a position and a collision circle.
pub trait Body {
    fn pos(&self) -> Point;
    fn radius(&self) -> f64;

    /// Circles overlap (touching does not count).
    fn touches(&self, other: &impl Body) -> bool {
        self.pos().distance(other.pos()) < self.radius() + other.radius()
    }
}

/// Cardinal heading for grid-style movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Unit step in screen coordinates (y grows downward).
    pub fn delta(&self) -> (f64, f64) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Heading along the larger axis of `(dx, dy)`.
    pub fn toward(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 { Self::Right } else { Self::Left }
        } else if dy > 0.0 {
            Self::Down
        } else {
            Self::Up
        }
    }
}

/// A drawing agent: the player, or an AI runner on the hunt levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub pos: Point,
    pub radius: f64,
    pub speed: f64,
    pub in_safe_zone: bool,
    /// Trail drawn since leaving safe ground. Drawing iff non-empty.
    pub line: Vec<Point>,
    /// Where the current trail left safe ground.
    pub exit_position: Option<Point>,
    pub wander_angle: f64,
    /// Heading under continuous cardinal movement.
    pub direction: Option<Direction>,
}

impl Actor {
    pub fn new(pos: Point, radius: f64, speed: f64) -> Self {
        Self {
            pos,
            radius,
            speed,
            in_safe_zone: false,
            line: Vec::new(),
            exit_position: None,
            wander_angle: 0.0,
            direction: None,
        }
    }

    pub fn is_drawing(&self) -> bool {
        !self.line.is_empty()
    }

    /// Start a trail anchored at the current position, which is the exit.
    pub fn begin_path(&mut self) {
        self.exit_position = Some(self.pos);
        self.line = vec![self.pos];
    }

    /// Start a trail by hand. It has no exit anchor.
    pub fn begin_manual_path(&mut self) {
        self.exit_position = None;
        self.line = vec![self.pos];
    }

    pub fn abort_path(&mut self) {
        self.line.clear();
        self.exit_position = None;
    }

    /// Append the current position if it moved more than `min_step`.
    pub fn push_path_point(&mut self, min_step: f64) -> bool {
        let far_enough = self.line.last().is_none_or(|last| last.distance(self.pos) > min_step);
        if far_enough {
            self.line.push(self.pos);
        }
        far_enough
    }

    /// Hand over the trail and its anchor, leaving the actor idle.
    pub fn take_path(&mut self) -> (Vec<Point>, Option<Point>) {
        (std::mem::take(&mut self.line), self.exit_position.take())
    }
}

impl Body for Actor {
    fn pos(&self) -> Point {
        self.pos
    }
    fn radius(&self) -> f64 {
        self.radius
    }
}

/// How an enemy picks where to go.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnemyBehavior {
    /// Wanders, chases the player's trail and the player when it's out.
    #[default]
    Roamer,
    /// Only wanders, at half speed.
    Drifter,
    /// Runs from the player inside `flee_range`, wanders otherwise.
    Fleeing { flee_range: f64 },
    /// Moves in cardinal directions and steers toward the trail.
    Ghost {
        #[serde(default)]
        direction: Direction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub pos: Point,
    pub radius: f64,
    pub speed: f64,
    pub wander_angle: f64,
    pub behavior: EnemyBehavior,
    /// Remaining ms of a personal speed boost.
    pub boost_ms: u64,
    /// Consecutive ticks spent (nearly) in place.
    pub stalled_ticks: u32,
    pub last_pos: Point,
}

impl Enemy {
    pub fn new(pos: Point, radius: f64, speed: f64, wander_angle: f64, behavior: EnemyBehavior) -> Self {
        Self {
            pos,
            radius,
            speed,
            wander_angle,
            behavior,
            boost_ms: 0,
            stalled_ticks: 0,
            last_pos: pos,
        }
    }

    /// Copy sharing position, size and speed but heading elsewhere.
    pub fn split(&self, wander_angle: f64) -> Self {
        Self::new(self.pos, self.radius, self.speed, wander_angle, self.behavior)
    }

    pub fn is_boosted(&self) -> bool {
        self.boost_ms > 0
    }
}

impl Body for Enemy {
    fn pos(&self) -> Point {
        self.pos
    }
    fn radius(&self) -> f64 {
        self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectibleKind {
    Apple { value: u32 },
    PowerUp { power: PowerUpKind, remaining_ms: u64 },
}

/// Apple or power-up lying on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Collectible {
    pub pos: Point,
    pub radius: f64,
    pub kind: CollectibleKind,
}

impl Collectible {
    pub fn apple(pos: Point, radius: f64, value: u32) -> Self {
        Self {
            pos,
            radius,
            kind: CollectibleKind::Apple { value },
        }
    }

    pub fn power_up(pos: Point, radius: f64, power: PowerUpKind, lifespan_ms: u64) -> Self {
        Self {
            pos,
            radius,
            kind: CollectibleKind::PowerUp {
                power,
                remaining_ms: lifespan_ms,
            },
        }
    }

    pub fn is_apple(&self) -> bool {
        matches!(self.kind, CollectibleKind::Apple { .. })
    }
}

impl Body for Collectible {
    fn pos(&self) -> Point {
        self.pos
    }
    fn radius(&self) -> f64 {
        self.radius
    }
}
