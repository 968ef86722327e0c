//! Owned, serializable view of a game for renderers and reports.

use serde::Serialize;

use super::{DeathCause, Game, GameStatus};
use crate::entity::{Actor, CollectibleKind, EnemyBehavior, EntityId};
use crate::geometry::Point;
use crate::power_up::EffectTimers;
use crate::zone::SafeZone;

use super::snake::{Cell, Wall};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorView {
    pub pos: Point,
    pub radius: f64,
    pub in_safe_zone: bool,
    pub line: Vec<Point>,
}

impl From<&Actor> for ActorView {
    fn from(actor: &Actor) -> Self {
        Self {
            pos: actor.pos,
            radius: actor.radius,
            in_safe_zone: actor.in_safe_zone,
            line: actor.line.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub pos: Point,
    pub radius: f64,
    pub behavior: EnemyBehavior,
    pub boosted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    pub pos: Point,
    pub radius: f64,
    pub kind: CollectibleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnakeView {
    pub cols: i32,
    pub rows: i32,
    pub body: Vec<Cell>,
    pub apple: Option<Cell>,
    pub walls: Vec<Wall>,
}

/// Everything visible at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub level: u32,
    pub title: String,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<DeathCause>,
    pub now_ms: u64,
    pub score: u64,
    /// Coverage as the level reports it.
    pub coverage: f64,
    pub board_width: f64,
    pub board_height: f64,
    pub zones: Vec<SafeZone>,
    pub player: ActorView,
    pub runners: Vec<ActorView>,
    pub enemies: Vec<EnemyView>,
    pub items: Vec<ItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectTimers>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snake: Option<SnakeView>,
}

impl Snapshot {
    pub(super) fn capture(game: &Game) -> Self {
        let config = game.config();
        Self {
            level: game.level().id,
            title: game.level().title.clone(),
            status: game.status(),
            cause: game.death_cause(),
            now_ms: game.now_ms(),
            score: game.score(),
            coverage: game.coverage(),
            board_width: config.board_width,
            board_height: config.board_height,
            zones: game.zones().iter().cloned().collect(),
            player: ActorView::from(game.player()),
            runners: game.runners().values().map(ActorView::from).collect(),
            enemies: game
                .enemies()
                .iter()
                .map(|(id, e)| EnemyView {
                    id,
                    pos: e.pos,
                    radius: e.radius,
                    behavior: e.behavior,
                    boosted: e.is_boosted(),
                })
                .collect(),
            items: game
                .items()
                .values()
                .map(|i| ItemView {
                    pos: i.pos,
                    radius: i.radius,
                    kind: i.kind,
                })
                .collect(),
            effects: game.power_ups().map(|p| p.timers()),
            snake: game.snake().map(|s| SnakeView {
                cols: s.rules().cols,
                rows: s.rules().rows,
                body: s.body().collect(),
                apple: s.apple(),
                walls: s.walls().to_vec(),
            }),
        }
    }

    pub fn is_over(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::level;
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn snapshot_matches_the_game() {
        let game = Game::new(level(3), GameConfig::default(), 2).unwrap();
        let snap = game.snapshot();
        assert_eq!(snap.level, 3);
        assert_eq!(snap.enemies.len(), 4);
        assert_eq!(snap.zones.len(), 1);
        assert!(!snap.is_over());
        assert!(snap.snake.is_none());
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let game = Game::new(level(20), GameConfig::default(), 2).unwrap();
        let json = serde_json::to_value(game.snapshot()).unwrap();
        assert_eq!(json["status"], "playing");
        assert_eq!(json["snake"]["body"].as_array().map(Vec::len), Some(3));
        assert!(json.get("cause").is_none());
    }
}
