//! AI runners: rival drawers on the hunt levels.
//!
//! A runner behaves like a small player. It wanders, sometimes starts a
//! trail from safe ground and closes it as a padded bounding rectangle when
//! it comes back. It runs from the player, and the player catches it by
//! touching it.

use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use super::{DeathCause, Game, GameEvent};
use crate::construct::{close_path, ConstructionInput, ConstructionStrategy};
use crate::entity::{Actor, Body, EntityId};
use crate::geometry::Point;
use crate::level::RunnerRules;
use crate::zone::{Rect, ZoneShape};

/// Respawned runners keep this far from the edges.
const RESPAWN_MARGIN: f64 = 100.0;

/// Reward rectangles cover this fraction of the board, at random.
const REWARD_AREA_RANGE: (f64, f64) = (0.10, 0.20);

/// Reward rectangles keep this far from the edges.
const REWARD_MARGIN: f64 = 50.0;

impl Game {
    pub(super) fn spawn_runner(&mut self, at: Point) {
        let mut runner = Actor::new(at, self.config.player_radius, self.config.runner_speed);
        runner.wander_angle = self.rng.next_angle();
        runner.in_safe_zone = self.zones.is_safe(at);
        self.runners.insert(runner);
    }

    pub(super) fn update_runners(&mut self) {
        let Some(rules) = self.level.runners else {
            return;
        };

        for id in self.runners.ids() {
            let Some(mut runner) = self.runners.get(id).cloned() else {
                continue;
            };
            self.steer_runner(&mut runner, &rules);
            let closed = self.runner_transition(&mut runner);
            if let Some(slot) = self.runners.get_mut(id) {
                *slot = runner;
            }

            if let Some(shape) = closed {
                self.store_runner_zone(shape);
                if !self.is_playing() {
                    return;
                }
            }
        }
    }

    fn steer_runner(&mut self, runner: &mut Actor, rules: &RunnerRules) {
        let player = self.player.pos;
        if runner.pos.distance(player) < self.config.runner_flee_range {
            let away = (runner.pos.y - player.y).atan2(runner.pos.x - player.x);
            let target = Point::new(
                runner.pos.x + away.cos() * runner.speed,
                runner.pos.y + away.sin() * runner.speed,
            );
            if self.on_board(target, runner.radius) {
                runner.pos = target;
            }
        } else {
            if runner.in_safe_zone && !runner.is_drawing() && self.rng.chance(rules.draw_chance) {
                runner.begin_manual_path();
            }
            if self.rng.chance(self.config.wander_turn_chance) {
                runner.wander_angle += (self.rng.next_f64() - 0.5) * FRAC_PI_2;
            }
            let target = Point::new(
                runner.pos.x + runner.wander_angle.cos() * runner.speed,
                runner.pos.y + runner.wander_angle.sin() * runner.speed,
            );
            if self.on_board(target, runner.radius) {
                runner.pos = target;
            } else {
                runner.wander_angle = self.rng.next_angle();
            }
        }

        if runner.is_drawing() {
            runner.push_path_point(self.config.path_min_step);
        }
    }

    /// Same exit and entry rules as the player. Returns a closed shape.
    fn runner_transition(&self, runner: &mut Actor) -> Option<ZoneShape> {
        let was_safe = runner.in_safe_zone;
        let now_safe = self.zones.is_safe(runner.pos);
        runner.in_safe_zone = now_safe;

        if was_safe && !now_safe && !runner.is_drawing() {
            runner.begin_path();
            return None;
        }
        if was_safe || !now_safe || runner.line.len() <= 2 {
            return None;
        }

        let (path, exit) = runner.take_path();
        let input = ConstructionInput {
            path: &path,
            // runners always close rectangles, hand-started trails included
            exit_position: exit.or_else(|| path.first().copied()),
            zones: &self.zones,
            padding: self.config.rectangle_padding,
        };
        close_path(ConstructionStrategy::BoundingRectangle, &input)
    }

    fn store_runner_zone(&mut self, shape: ZoneShape) {
        let area = shape.area();
        let trapped = shape.contains(self.player.pos);
        let zone = self.zones.insert(shape, None);
        self.events.push(GameEvent::ZoneClosed {
            zone: Some(zone),
            area,
            points: 0,
        });
        debug!(zone, area, "runner closed a zone");

        if trapped {
            self.game_over(DeathCause::TrappedByRunner);
        }
    }

    /// Player touching a runner catches it.
    pub(super) fn catch_runners(&mut self) {
        let Some(rules) = self.level.runners else {
            return;
        };
        let caught: Vec<EntityId> = self
            .runners
            .iter()
            .filter(|(_, r)| self.player.touches(*r))
            .map(|(id, _)| id)
            .collect();

        for id in caught {
            let Some(runner) = self.runners.remove(id) else {
                continue;
            };
            self.runners_caught += 1;
            self.score += rules.catch_score;
            self.events.push(GameEvent::RunnerCaught { at: runner.pos });
            debug!(caught = self.runners_caught, "runner caught");

            if rules.reward_zone {
                let reward = self.reward_rect();
                self.zones.insert(ZoneShape::Rectangle(reward), None);
            }
            if rules.respawn {
                let at = self.runner_respawn_point();
                self.spawn_runner(at);
            }
        }
    }

    /// Random rectangle of 10-20% of the board.
    fn reward_rect(&mut self) -> Rect {
        let w = self.config.board_width;
        let h = self.config.board_height;
        let area = self.config.board_area() * self.rng.next_range(REWARD_AREA_RANGE.0, REWARD_AREA_RANGE.1);
        let aspect = self.rng.next_f64() * 2.0 + 0.5;

        let mut width = (area * aspect).sqrt();
        let mut height = area / width;
        width = width.min(w - 2.0 * REWARD_MARGIN);
        height = height.min(h - 2.0 * REWARD_MARGIN);

        let x = self.rng.next_f64() * (w - width - 2.0 * REWARD_MARGIN) + REWARD_MARGIN;
        let y = self.rng.next_f64() * (h - height - 2.0 * REWARD_MARGIN) + REWARD_MARGIN;
        Rect::new(x, y, width, height)
    }

    fn runner_respawn_point(&mut self) -> Point {
        self.random_open_position(RESPAWN_MARGIN)
    }
}
