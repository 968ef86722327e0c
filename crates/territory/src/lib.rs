//! # territory
//!
//! Geometry kernel and fixed-step simulation for a territory-capture
//! arcade game: leave safe ground, draw a trail, come back and the enclosed
//! area becomes yours. Enemies inside are captured; enemies touching the
//! trail end the run.
//!
//! ## Rust Lesson #7: Modules
//!
//! The crate is layered bottom-up, and each layer only `use`s the ones
//! below it:
//! - `geometry`, `intersect`, `hull`: points, polygons and predicates
//! - `zone`, `construct`, `cardinal`, `merge`: safe zones and how trails
//!   turn into them
//! - `entity`, `power_up`, `level`, `config`: what lives on the board and
//!   the per-level rules
//! - `game`: the tick loop that drives all of the above
//!
//! `pub use` lines below lift the everyday types to the crate root, so
//! callers write `territory::Game` instead of `territory::game::Game`.

pub mod cardinal;
pub mod config;
pub mod construct;
pub mod entity;
pub mod error;
pub mod game;
pub mod geometry;
pub mod hull;
pub mod intersect;
pub mod level;
pub mod merge;
pub mod power_up;
pub mod rng;
pub mod zone;

// Re-export common types at crate root for convenience.
pub use config::GameConfig;
pub use construct::{close_path, ConstructionInput, ConstructionStrategy};
pub use entity::{Actor, Arena, Body, Collectible, CollectibleKind, Direction, Enemy, EnemyBehavior, EntityId};
pub use error::{ConfigError, LevelError, MergeError};
pub use game::{DeathCause, Game, GameEvent, GameStatus, Input, Snapshot, TickOutcome};
pub use geometry::{Bounds, Point};
pub use intersect::point_in_polygon;
pub use level::{builtin_levels, CompletionPredicate, EnemyPlacement, LevelDescriptor, LevelTable, MovementMode};
pub use merge::{merge_candidate, MergePolicy};
pub use power_up::{PowerUpKind, PowerUpRules, StarEffect};
pub use rng::Rng;
pub use zone::{Rect, SafeZone, ZoneSet, ZoneShape};
