//! Player movement, safe-ground transitions and trail closure.

use tracing::debug;

use super::collisions::self_intersects;
use super::{DeathCause, Game, GameEvent, Input};
use crate::construct::{close_path, ConstructionInput, ConstructionStrategy};
use crate::entity::Collectible;
use crate::geometry::{polygon_bounds, Point};
use crate::level::MovementMode;
use crate::merge::{captured_indices, merge_candidate};
use crate::zone::ZoneShape;

impl Game {
    pub(super) fn update_player(&mut self, input: &Input) {
        if input.toggle_draw && self.level.player_draws {
            self.toggle_manual_draw();
        }

        let (dx, dy) = self.player_delta(input);
        let boost = self.power_ups.as_ref().map_or(1.0, |p| p.player_speed_multiplier());
        let speed = self.player.speed * boost;
        let target = Point::new(self.player.pos.x + dx * speed, self.player.pos.y + dy * speed);
        self.player.pos = self.clamp_to_board(target, self.player.radius);

        // On the hunt levels the player only chases; there is no territory of its own.
        if !self.level.player_draws {
            self.player.in_safe_zone = false;
            return;
        }

        if self.player.is_drawing() {
            self.player.push_path_point(self.config.path_min_step);
        }

        let was_safe = self.player.in_safe_zone;
        let now_safe = self.zones.is_safe(self.player.pos);
        self.player.in_safe_zone = now_safe;

        if was_safe && !now_safe && !self.player.is_drawing() {
            self.player.begin_path();
            debug!(x = self.player.pos.x, y = self.player.pos.y, "left safe ground");
        } else if !was_safe && now_safe && self.player.line.len() > 2 {
            self.close_player_path();
            return;
        }

        if !self.is_invincible()
            && self_intersects(&self.player.line, self.player.pos, self.config.self_hit_epsilon)
        {
            self.game_over(DeathCause::SelfIntersection);
        }
    }

    /// Direction of travel this tick as a unit-ish vector.
    fn player_delta(&mut self, input: &Input) -> (f64, f64) {
        match self.level.movement {
            MovementMode::Free => input.free_delta(),
            MovementMode::Cardinal => {
                if let Some(direction) = input.direction() {
                    self.player.direction = Some(direction);
                }
                self.player.direction.map_or((0.0, 0.0), |d| d.delta())
            }
        }
    }

    /// Start a trail on safe ground, or throw away the one in progress.
    fn toggle_manual_draw(&mut self) {
        if self.player.is_drawing() {
            self.player.abort_path();
            debug!("trail abandoned");
        } else if self.player.in_safe_zone {
            self.player.begin_manual_path();
            debug!("manual trail started");
        }
    }

    pub(super) fn is_invincible(&self) -> bool {
        self.power_ups.as_ref().is_some_and(|p| p.is_invincible())
    }

    /// Turn the finished trail into territory, capture and score.
    fn close_player_path(&mut self) {
        let (path, exit_position) = self.player.take_path();
        let input = ConstructionInput {
            path: &path,
            exit_position,
            zones: &self.zones,
            padding: self.config.rectangle_padding,
        };
        let Some(candidate) = close_path(self.level.construction, &input) else {
            return;
        };

        let outcome = merge_candidate(
            &mut self.zones,
            candidate,
            self.level.merge,
            self.level.candidate_decay,
            self.now_ms,
        );
        let area = scored_area(
            self.level.construction,
            &path,
            exit_position,
            outcome.candidate_area,
        );
        let points = (area / self.level.score_divisor).floor() as u64;
        self.score += points;
        self.events.push(GameEvent::ZoneClosed {
            zone: outcome.zone,
            area,
            points,
        });
        debug!(
            strategy = self.level.construction.name(),
            area,
            points,
            "trail closed"
        );

        let captured = self.capture_enemies(&outcome.capture_shape);
        if captured == 0 {
            return;
        }

        let survives = self.level.candidate_decay.is_some_and(|d| d.survive_on_capture);
        if survives && outcome.standalone {
            if let Some(id) = outcome.zone {
                self.zones.mark_survivor(id);
            }
        }

        if self.enemies.is_empty() && self.completion().completes_on_last_capture() {
            self.complete();
        }
    }

    /// Remove every enemy inside `shape`, leaving an apple behind each.
    pub(super) fn capture_enemies(&mut self, shape: &ZoneShape) -> usize {
        let entries: Vec<_> = self.enemies.iter().map(|(id, e)| (id, e.pos)).collect();
        let positions: Vec<Point> = entries.iter().map(|(_, p)| *p).collect();
        let hits = captured_indices(shape, &positions);

        for &idx in &hits {
            let (id, at) = entries[idx];
            self.enemies.remove(id);
            self.items
                .insert(Collectible::apple(at, self.config.apple_radius, self.level.apple_value));
            self.events.push(GameEvent::EnemyCaptured { at });
        }
        if !hits.is_empty() {
            debug!(captured = hits.len(), remaining = self.enemies.len(), "enemies captured");
        }
        hits.len()
    }
}

/// Area a closed trail is paid for. A padded rectangle pays for the trail's
/// own bounds; the padding only widens what is claimed and captured.
fn scored_area(
    strategy: ConstructionStrategy,
    path: &[Point],
    exit: Option<Point>,
    candidate_area: f64,
) -> f64 {
    match (strategy, exit) {
        (ConstructionStrategy::BoundingRectangle, Some(_)) => {
            polygon_bounds(path).map_or(0.0, |b| b.width() * b.height())
        }
        _ => candidate_area,
    }
}
