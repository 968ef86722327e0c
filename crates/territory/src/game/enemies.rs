//! Enemy steering.
//!
//! Free-moving enemies pick a heading and a speed factor each tick; ghosts
//! move on the four cardinal headings. Either way an enemy never steps onto
//! safe ground or off the board: a blocked move re-rolls its heading and it
//! stays put for the tick.

use std::f64::consts::FRAC_PI_2;

use super::Game;
use crate::entity::{Direction, Enemy, EnemyBehavior};
use crate::geometry::{nearest_point, point_to_segment_distance, Point};

/// Ghosts steer for the trail when it passes this close.
const GHOST_STEER_RANGE: f64 = 50.0;

/// Ticks of (almost) no movement before an enemy counts as stuck.
const STALL_TICKS: u32 = 2;

/// Movement below this per tick counts as standing still.
const STALL_DISTANCE: f64 = 1.0;

impl Game {
    pub(super) fn update_enemies(&mut self) {
        let (slow, boost, vulnerable, seek) = match self.power_ups.as_ref() {
            Some(p) => (
                p.enemy_speed_multiplier(),
                p.enemy_boost_multiplier(),
                p.enemies_vulnerable(),
                p.rules().enemies_collect,
            ),
            None => (1.0, 1.0, false, false),
        };

        for id in self.enemies.ids() {
            let Some(mut enemy) = self.enemies.get(id).cloned() else {
                continue;
            };
            let mut speed = enemy.speed * slow;
            if enemy.is_boosted() {
                speed *= boost;
            }

            enemy.last_pos = enemy.pos;
            match enemy.behavior {
                EnemyBehavior::Ghost { .. } => self.move_ghost(&mut enemy, speed, vulnerable),
                _ => self.move_free(&mut enemy, speed, seek),
            }

            if !self.on_board(enemy.pos, enemy.radius) {
                enemy.pos = self.clamp_to_board(enemy.pos, enemy.radius);
                enemy.wander_angle = self.rng.next_angle();
            }

            if let Some(slot) = self.enemies.get_mut(id) {
                *slot = enemy;
            }
        }
    }

    /// A move target that is on the board and off safe ground.
    fn open_ground(&self, target: Point, radius: f64) -> bool {
        self.on_board(target, radius) && !self.zones.is_safe(target)
    }

    fn move_free(&mut self, enemy: &mut Enemy, speed: f64, seek: bool) {
        let (heading, factor) = self.free_heading(enemy, seek);
        let step = speed * factor;
        let target = Point::new(
            enemy.pos.x + heading.cos() * step,
            enemy.pos.y + heading.sin() * step,
        );

        if self.open_ground(target, enemy.radius) {
            enemy.pos = target;
        } else {
            enemy.wander_angle = self.rng.next_angle();
        }

        if self.level.enemy_stall_recovery {
            self.recover_stall(enemy, speed);
        }
    }

    /// Heading in radians and a speed factor for a free-moving enemy.
    fn free_heading(&mut self, enemy: &mut Enemy, seek: bool) -> (f64, f64) {
        let player = self.player.pos;
        let player_exposed = !self.player.in_safe_zone;

        match enemy.behavior {
            EnemyBehavior::Roamer => {
                if seek {
                    if let Some(target) = self.nearest_power_up(enemy.pos) {
                        return (angle_to(enemy.pos, target), 1.0);
                    }
                }
                if player_exposed {
                    if let Some(target) = self.line_target(enemy.pos) {
                        return (angle_to(enemy.pos, target), 1.0);
                    }
                    if enemy.pos.distance(player) <= self.config.chase_player_range {
                        return (angle_to(enemy.pos, player), 1.0);
                    }
                }
                self.wander(enemy);
                (enemy.wander_angle, 0.5)
            }
            EnemyBehavior::Drifter => {
                self.wander(enemy);
                (enemy.wander_angle, 0.5)
            }
            EnemyBehavior::Fleeing { flee_range } => {
                if enemy.pos.distance(player) < flee_range {
                    return (angle_to(player, enemy.pos), 1.0);
                }
                self.wander(enemy);
                (enemy.wander_angle, 1.0)
            }
            EnemyBehavior::Ghost { .. } => (enemy.wander_angle, 1.0),
        }
    }

    fn wander(&mut self, enemy: &mut Enemy) {
        if self.rng.chance(self.config.wander_turn_chance) {
            enemy.wander_angle += (self.rng.next_f64() - 0.5) * FRAC_PI_2;
        }
    }

    fn nearest_power_up(&self, from: Point) -> Option<Point> {
        self.items
            .values()
            .filter(|item| !item.is_apple())
            .map(|item| item.pos)
            .filter(|p| from.distance(*p) <= self.config.seek_power_up_range)
            .min_by(|a, b| from.distance(*a).total_cmp(&from.distance(*b)))
    }

    /// End of the trail segment nearest to `from`, if it's in chase range.
    fn line_target(&self, from: Point) -> Option<Point> {
        let line = &self.player.line;
        if line.len() < 2 {
            return None;
        }
        line.windows(2)
            .map(|w| (w[1], point_to_segment_distance(from, w[0], w[1])))
            .filter(|(_, d)| *d <= self.config.chase_line_range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(end, _)| end)
    }

    fn recover_stall(&mut self, enemy: &mut Enemy, speed: f64) {
        if enemy.pos.distance(enemy.last_pos) < STALL_DISTANCE {
            enemy.stalled_ticks += 1;
        } else {
            enemy.stalled_ticks = 0;
        }
        if enemy.stalled_ticks < STALL_TICKS {
            return;
        }

        let push = speed * 0.5;
        let target = Point::new(
            enemy.pos.x + enemy.wander_angle.cos() * push,
            enemy.pos.y + enemy.wander_angle.sin() * push,
        );
        if self.open_ground(target, enemy.radius) {
            enemy.pos = target;
        }
        enemy.wander_angle = self.rng.next_angle();
        enemy.stalled_ticks = 0;
    }

    fn move_ghost(&mut self, enemy: &mut Enemy, speed: f64, vulnerable: bool) {
        let EnemyBehavior::Ghost { mut direction } = enemy.behavior else {
            return;
        };

        if !vulnerable {
            match self.ghost_target(enemy.pos) {
                Some(target) => direction = Direction::toward(target.x - enemy.pos.x, target.y - enemy.pos.y),
                None => {
                    if self.rng.chance(self.config.wander_turn_chance) {
                        direction = self.random_direction();
                    }
                }
            }
        }

        let (dx, dy) = direction.delta();
        let target = Point::new(enemy.pos.x + dx * speed, enemy.pos.y + dy * speed);
        if self.open_ground(target, enemy.radius) {
            enemy.pos = target;
        } else {
            direction = self.random_direction();
        }
        enemy.behavior = EnemyBehavior::Ghost { direction };
    }

    /// Closest trail point, when both the trail and the player are near.
    fn ghost_target(&self, from: Point) -> Option<Point> {
        if from.distance(self.player.pos) > self.config.chase_line_range {
            return None;
        }
        let (idx, dist) = nearest_point(from, &self.player.line)?;
        (dist <= GHOST_STEER_RANGE).then(|| self.player.line[idx])
    }
}

fn angle_to(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}
