//! Game tunables.
//!
//! Everything that isn't per-level lives here: board size, speeds, radii,
//! timer lengths and AI ranges. `Default` gives the classic 800x600 game.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::zone::Rect;

/// Global simulation settings shared by every level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub board_width: f64,
    pub board_height: f64,
    /// Simulated milliseconds per tick (10 ms = 100 Hz).
    pub tick_ms: u64,

    pub player_speed: f64,
    pub runner_speed: f64,
    pub enemy_speed_min: f64,
    pub enemy_speed_max: f64,

    pub player_radius: f64,
    pub enemy_radius: f64,
    pub apple_radius: f64,
    pub power_up_radius: f64,

    /// Starting safe rectangle.
    pub initial_zone: Rect,

    /// New trail points closer than this to the last one are dropped.
    pub path_min_step: f64,
    /// Distance to an older trail segment that counts as crossing it.
    pub self_hit_epsilon: f64,
    /// Padding around a trail for bounding-rectangle closures.
    pub rectangle_padding: f64,

    pub seek_power_up_range: f64,
    pub chase_line_range: f64,
    pub chase_player_range: f64,
    /// AI runners start fleeing when the player is this close.
    pub runner_flee_range: f64,
    /// Chance per tick that a wandering enemy turns by a quarter-pi.
    pub wander_turn_chance: f64,

    pub power_up_spawn_interval_ms: u64,
    pub power_up_lifespan_ms: u64,
    pub power_up_effect_ms: u64,
    pub speed_boost_multiplier: f64,
    pub enemy_slow_multiplier: f64,

    pub shrink_interval_ms: u64,
    pub shrink_factor: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_width: 800.0,
            board_height: 600.0,
            tick_ms: 10,
            player_speed: 3.0,
            runner_speed: 2.5,
            enemy_speed_min: 0.8,
            enemy_speed_max: 1.6,
            player_radius: 8.0,
            enemy_radius: 6.0,
            apple_radius: 8.0,
            power_up_radius: 8.0,
            initial_zone: Rect::new(350.0, 250.0, 100.0, 100.0),
            path_min_step: 3.0,
            self_hit_epsilon: 2.0,
            rectangle_padding: 20.0,
            seek_power_up_range: 200.0,
            chase_line_range: 100.0,
            chase_player_range: 150.0,
            runner_flee_range: 100.0,
            wander_turn_chance: 0.02,
            power_up_spawn_interval_ms: 3000,
            power_up_lifespan_ms: 8000,
            power_up_effect_ms: 5000,
            speed_boost_multiplier: 1.5,
            enemy_slow_multiplier: 0.3,
            shrink_interval_ms: 3000,
            shrink_factor: 0.02,
        }
    }
}

impl GameConfig {
    /// Total playable area, the denominator for coverage.
    pub fn board_area(&self) -> f64 {
        self.board_width * self.board_height
    }

    /// Reject settings the simulation can't run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let board_ok = |v: f64| v.is_finite() && v > 0.0;
        if !board_ok(self.board_width) || !board_ok(self.board_height) {
            return Err(ConfigError::InvalidBoard {
                width: self.board_width,
                height: self.board_height,
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        let intervals = [
            ("shrink_interval_ms", self.shrink_interval_ms),
            ("power_up_spawn_interval_ms", self.power_up_spawn_interval_ms),
        ];
        if let Some((name, _)) = intervals.into_iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroInterval { name });
        }

        let positive = [
            ("player_speed", self.player_speed),
            ("runner_speed", self.runner_speed),
            ("enemy_speed_min", self.enemy_speed_min),
            ("player_radius", self.player_radius),
            ("enemy_radius", self.enemy_radius),
            ("apple_radius", self.apple_radius),
            ("power_up_radius", self.power_up_radius),
            ("path_min_step", self.path_min_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }

        if self.enemy_speed_max < self.enemy_speed_min {
            return Err(ConfigError::OutOfRange {
                name: "enemy_speed_max",
                value: self.enemy_speed_max,
            });
        }
        if !(0.0..1.0).contains(&self.shrink_factor) {
            return Err(ConfigError::OutOfRange {
                name: "shrink_factor",
                value: self.shrink_factor,
            });
        }
        if !(0.0..=1.0).contains(&self.wander_turn_chance) {
            return Err(ConfigError::OutOfRange {
                name: "wander_turn_chance",
                value: self.wander_turn_chance,
            });
        }

        Ok(())
    }
}
