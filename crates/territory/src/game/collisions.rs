//! Contact checks between the player, its trail, enemies, runners and items.

use tracing::debug;

use super::{DeathCause, Game, GameEvent};
use crate::entity::{Body, CollectibleKind, EntityId};
use crate::geometry::{point_to_segment_distance, Point};
use crate::power_up::EnemyPickup;

/// Score for eating a vulnerable enemy.
pub const EAT_ENEMY_SCORE: u64 = 200;

/// Trails shorter than this can't cross themselves.
const SELF_HIT_MIN_POINTS: usize = 6;

/// A circle at `center` with `radius` cuts the trail.
pub fn line_hit(line: &[Point], center: Point, radius: f64) -> bool {
    line.windows(2)
        .any(|w| point_to_segment_distance(center, w[0], w[1]) < radius)
}

/// The trail head at `head` runs into an older part of `line`.
///
/// The first two and last two segments are skipped: the head always sits
/// on those.
pub fn self_intersects(line: &[Point], head: Point, epsilon: f64) -> bool {
    if line.len() < SELF_HIT_MIN_POINTS {
        return false;
    }
    (2..line.len() - 2).any(|i| point_to_segment_distance(head, line[i], line[i + 1]) < epsilon)
}

impl Game {
    pub(super) fn resolve_collisions(&mut self) {
        self.catch_runners();
        if !self.is_playing() {
            return;
        }
        self.player_meets_enemies();
        if !self.is_playing() {
            return;
        }
        self.enemies_cut_line();
        if !self.is_playing() {
            return;
        }
        self.player_collects();
        self.enemies_collect();
    }

    fn player_meets_enemies(&mut self) {
        let vulnerable = self.power_ups.as_ref().is_some_and(|p| p.enemies_vulnerable());
        let invincible = self.is_invincible();

        for id in self.enemies.ids() {
            let Some(at) = self.enemies.get(id).filter(|e| self.player.touches(*e)).map(|e| e.pos) else {
                continue;
            };
            if vulnerable {
                self.enemies.remove(id);
                self.score += EAT_ENEMY_SCORE;
                self.events.push(GameEvent::EnemyEaten { at });
                debug!(x = at.x, y = at.y, "enemy eaten");
            } else if !invincible {
                self.game_over(DeathCause::EnemyContact);
                return;
            }
        }
    }

    fn enemies_cut_line(&mut self) {
        if !self.player.is_drawing() || self.is_invincible() {
            return;
        }
        let cut = self
            .enemies
            .values()
            .any(|e| line_hit(&self.player.line, e.pos, e.radius));
        if cut {
            self.game_over(DeathCause::LineCut);
        }
    }

    fn player_collects(&mut self) {
        let touched: Vec<EntityId> = self
            .items
            .iter()
            .filter(|(_, item)| self.player.touches(*item))
            .map(|(id, _)| id)
            .collect();

        for id in touched {
            let Some(item) = self.items.remove(id) else {
                continue;
            };
            match item.kind {
                CollectibleKind::Apple { value } => {
                    self.score += u64::from(value);
                    self.respawn_enemy_after_apple();
                }
                CollectibleKind::PowerUp { power, .. } => {
                    if let Some(system) = self.power_ups.as_mut() {
                        system.apply(power);
                    }
                    debug!(power = power.name(), "power-up collected");
                }
            }
            self.events.push(GameEvent::ItemCollected { item: item.kind });
        }
    }

    fn respawn_enemy_after_apple(&mut self) {
        let Some(below) = self.level.respawn_enemies_below else {
            return;
        };
        if self.enemies.len() < below {
            let pos = self.random_open_position(super::SPAWN_MARGIN);
            self.spawn_enemy(pos);
            debug!(enemies = self.enemies.len(), "enemy respawned");
        }
    }

    /// Enemies that reach a power-up use it against the player.
    fn enemies_collect(&mut self) {
        let Some(effect_ms) = self
            .power_ups
            .as_ref()
            .filter(|p| p.rules().enemies_collect)
            .map(|p| p.effect_ms())
        else {
            return;
        };

        for enemy_id in self.enemies.ids() {
            let Some(enemy) = self.enemies.get(enemy_id) else {
                continue;
            };
            let hit = self
                .items
                .iter()
                .find(|(_, item)| !item.is_apple() && enemy.touches(*item))
                .map(|(id, _)| id);
            let Some(item_id) = hit else {
                continue;
            };
            let Some(CollectibleKind::PowerUp { power, .. }) = self.items.remove(item_id).map(|i| i.kind) else {
                continue;
            };

            match EnemyPickup::from_kind(power) {
                EnemyPickup::Boost => {
                    if let Some(enemy) = self.enemies.get_mut(enemy_id) {
                        enemy.boost_ms = effect_ms;
                    }
                }
                EnemyPickup::Split => {
                    let angle = self.rng.next_angle();
                    let twin = self.enemies.get(enemy_id).map(|e| e.split(angle));
                    if let Some(twin) = twin {
                        self.enemies.insert(twin);
                    }
                }
                EnemyPickup::Wasted => {}
            }
            debug!(power = power.name(), "enemy took a power-up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::level;
    use super::super::{GameStatus, Input};
    use super::*;
    use crate::config::GameConfig;
    use crate::entity::{Collectible, Enemy, EnemyBehavior};
    use crate::level::LevelDescriptor;
    use crate::power_up::{PowerUpKind, PowerUpRules, StarEffect};

    fn straight(n: usize) -> Vec<Point> {
        (0..n).map(|i| Point::new(i as f64 * 10.0, 0.0)).collect()
    }

    #[test]
    fn line_hit_is_strict() {
        let line = straight(3);
        assert!(line_hit(&line, Point::new(10.0, 5.9), 6.0));
        assert!(!line_hit(&line, Point::new(10.0, 6.0), 6.0));
        assert!(!line_hit(&[Point::new(0.0, 0.0)], Point::new(0.0, 0.0), 6.0));
    }

    #[test]
    fn short_trails_never_self_intersect() {
        let line = straight(5);
        assert!(!self_intersects(&line, Point::new(25.0, 0.0), 2.0));
    }

    #[test]
    fn head_on_an_old_segment_intersects() {
        let line = straight(8);
        assert!(self_intersects(&line, Point::new(35.0, 1.0), 2.0));
        // the segments next to the head don't count
        assert!(!self_intersects(&line, Point::new(65.0, 1.0), 2.0));
        assert!(!self_intersects(&line, Point::new(35.0, 3.0), 2.0));
    }

    fn quiet_level() -> LevelDescriptor {
        LevelDescriptor {
            enemy_count: 0,
            ..LevelDescriptor::new(100, "quiet")
        }
    }

    #[test]
    fn touching_an_enemy_ends_the_game() {
        let mut game = Game::new(quiet_level(), GameConfig::default(), 0).unwrap();
        let at = game.player().pos;
        game.enemies
            .insert(Enemy::new(at, 6.0, 0.0, 0.0, EnemyBehavior::Drifter));
        game.tick(&Input::default());
        assert_eq!(game.status(), GameStatus::GameOver);
        assert_eq!(game.death_cause(), Some(DeathCause::EnemyContact));
    }

    #[test]
    fn invincible_player_shrugs_off_contact() {
        let level = LevelDescriptor {
            power_ups: Some(PowerUpRules::default()),
            ..quiet_level()
        };
        let mut game = Game::new(level, GameConfig::default(), 0).unwrap();
        game.items.clear();
        if let Some(system) = game.power_ups.as_mut() {
            system.apply(PowerUpKind::Star);
        }
        let at = game.player().pos;
        game.enemies
            .insert(Enemy::new(at, 6.0, 0.0, 0.0, EnemyBehavior::Drifter));
        game.tick(&Input::default());
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.enemies().len(), 1);
    }

    #[test]
    fn vulnerable_enemies_are_eaten() {
        let level = LevelDescriptor {
            power_ups: Some(PowerUpRules {
                star: StarEffect::VulnerableEnemies,
                enemies_collect: false,
            }),
            completion: crate::level::CompletionPredicate::Coverage { percent: 90.0 },
            ..quiet_level()
        };
        let mut game = Game::new(level, GameConfig::default(), 0).unwrap();
        game.items.clear();
        if let Some(system) = game.power_ups.as_mut() {
            system.apply(PowerUpKind::Star);
        }
        let at = game.player().pos;
        game.enemies
            .insert(Enemy::new(at, 6.0, 0.0, 0.0, EnemyBehavior::Drifter));
        let out = game.tick(&Input::default());
        assert_eq!(game.score(), EAT_ENEMY_SCORE);
        assert!(game.enemies().is_empty());
        assert!(out.events.contains(&GameEvent::EnemyEaten { at }));
    }

    #[test]
    fn apples_score_and_restock_enemies() {
        let level = LevelDescriptor {
            respawn_enemies_below: Some(2),
            completion: crate::level::CompletionPredicate::Coverage { percent: 90.0 },
            ..quiet_level()
        };
        let mut game = Game::new(level, GameConfig::default(), 0).unwrap();
        let at = game.player().pos;
        game.items.insert(Collectible::apple(at, 8.0, 50));
        game.tick(&Input::default());
        assert_eq!(game.score(), 50);
        assert_eq!(game.enemies().len(), 1);
        assert!(game.items().is_empty());
    }

    #[test]
    fn enemy_star_pickup_splits() {
        let mut game = Game::new(level(15), GameConfig::default(), 0).unwrap();
        game.items.clear();
        game.enemies.clear();
        let spot = Point::new(100.0, 100.0);
        game.enemies
            .insert(Enemy::new(spot, 6.0, 0.0, 0.0, EnemyBehavior::Drifter));
        game.items
            .insert(Collectible::power_up(spot, 8.0, PowerUpKind::Star, 8000));
        game.enemies_collect();
        assert_eq!(game.enemies().len(), 2);
        assert!(game.items().is_empty());
    }

    #[test]
    fn enemy_rabbit_pickup_boosts() {
        let mut game = Game::new(level(19), GameConfig::default(), 0).unwrap();
        game.items.clear();
        game.enemies.clear();
        let spot = Point::new(100.0, 100.0);
        let id = game
            .enemies
            .insert(Enemy::new(spot, 6.0, 0.0, 0.0, EnemyBehavior::Roamer));
        game.items
            .insert(Collectible::power_up(spot, 8.0, PowerUpKind::Rabbit, 8000));
        game.enemies_collect();
        assert!(game.enemies().get(id).is_some_and(Enemy::is_boosted));
    }
}
