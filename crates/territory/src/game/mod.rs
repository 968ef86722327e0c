//! The per-tick simulation.
//!
//! [`Game::tick`] advances one fixed step. Within a step the order never
//! changes:
//!
//! 1. advance the clock
//! 2. expire temporary zones
//! 3. move the player (or the snake) and close trails
//! 4. move AI runners
//! 5. move enemies
//! 6. resolve collisions and pickups
//! 7. run the shrink and power-up timers
//! 8. check completion and the time limit
//!
//! The moment the game reaches a terminal status the step stops, and later
//! ticks return the frozen state without doing anything.

mod collisions;
mod enemies;
mod player;
mod runners;
mod snake;
mod snapshot;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::entity::{Actor, Arena, Collectible, CollectibleKind, Direction, EnemyBehavior, Enemy};
use crate::error::LevelError;
use crate::geometry::Point;
use crate::level::{CompletionPredicate, EnemyPlacement, LevelDescriptor, Progress, FIXED_ENEMY_POSITIONS, QUARTER_POSITIONS};
use crate::power_up::{age_power_ups, PowerUpKind, PowerUpSystem};
use crate::rng::Rng;
use crate::zone::{ZoneId, ZoneSet};

pub use collisions::{line_hit, self_intersects};
pub use snake::{Cell, SnakeState, SnakeStep, Wall};
pub use snapshot::{ActorView, EnemyView, ItemView, SnakeView, Snapshot};

/// Spawners keep this far from the board edge.
const SPAWN_MARGIN: f64 = 50.0;

/// Tries before a spawner settles for a spot on safe ground.
const SPAWN_ATTEMPTS: usize = 50;

/// Per-tick intent from whoever is playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    /// Edge event: start or abandon a trail by hand.
    pub toggle_draw: bool,
}

impl Input {
    pub fn toward(direction: Direction) -> Self {
        let mut input = Self::default();
        match direction {
            Direction::Up => input.up = true,
            Direction::Down => input.down = true,
            Direction::Left => input.left = true,
            Direction::Right => input.right = true,
        }
        input
    }

    /// Single requested direction. Up beats down beats left beats right.
    pub fn direction(&self) -> Option<Direction> {
        if self.up {
            Some(Direction::Up)
        } else if self.down {
            Some(Direction::Down)
        } else if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else {
            None
        }
    }

    /// Eight-way unit step; diagonals are scaled by 0.707.
    pub fn free_delta(&self) -> (f64, f64) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.up {
            dy -= 1.0;
        }
        if self.down {
            dy += 1.0;
        }
        if self.left {
            dx -= 1.0;
        }
        if self.right {
            dx += 1.0;
        }
        if dx != 0.0 && dy != 0.0 {
            dx *= 0.707;
            dy *= 0.707;
        }
        (dx, dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    LevelComplete,
    GameOver,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Why a game ended badly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    EnemyContact,
    /// An enemy touched the unfinished trail.
    LineCut,
    SelfIntersection,
    /// A zone that was holding the game together ran out.
    ZoneExpired,
    /// A runner closed territory around the player.
    TrappedByRunner,
    TimeUp,
    SnakeCrash,
}

impl DeathCause {
    pub fn name(&self) -> &'static str {
        match self {
            Self::EnemyContact => "enemy_contact",
            Self::LineCut => "line_cut",
            Self::SelfIntersection => "self_intersection",
            Self::ZoneExpired => "zone_expired",
            Self::TrappedByRunner => "trapped_by_runner",
            Self::TimeUp => "time_up",
            Self::SnakeCrash => "snake_crash",
        }
    }
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ZoneClosed {
        zone: Option<ZoneId>,
        area: f64,
        points: u64,
    },
    EnemyCaptured { at: Point },
    EnemyEaten { at: Point },
    ItemCollected { item: CollectibleKind },
    RunnerCaught { at: Point },
    ZonesExpired { count: usize },
    LevelCompleted { level: u32 },
    GameOver { level: u32, score: u64, cause: DeathCause },
}

/// Result of one [`Game::tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub status: GameStatus,
    pub events: Vec<GameEvent>,
}

/// One level being played.
#[derive(Debug, Clone)]
pub struct Game {
    level: LevelDescriptor,
    config: GameConfig,
    rng: Rng,
    now_ms: u64,
    status: GameStatus,
    cause: Option<DeathCause>,
    score: u64,
    zones: ZoneSet,
    player: Actor,
    runners: Arena<Actor>,
    runners_caught: u32,
    enemies: Arena<Enemy>,
    items: Arena<Collectible>,
    power_ups: Option<PowerUpSystem>,
    until_shrink_ms: u64,
    snake: Option<SnakeState>,
    events: Vec<GameEvent>,
}

impl Game {
    /// Set up `level` from scratch. Same seed, same inputs, same game.
    pub fn new(level: LevelDescriptor, config: GameConfig, seed: u64) -> Result<Self, LevelError> {
        config.validate()?;
        level.validate()?;

        let rng = Rng::new(seed);
        let start_zone = level.initial_zone.unwrap_or(config.initial_zone);
        let zones = if level.is_snake() {
            ZoneSet::new()
        } else {
            ZoneSet::with_initial(start_zone)
        };

        let mut player = Actor::new(start_zone.center(), config.player_radius, config.player_speed);
        player.in_safe_zone = level.player_draws && zones.is_safe(player.pos);

        let snake = level.snake.map(SnakeState::new);
        let power_ups = level.power_ups.map(|rules| PowerUpSystem::new(rules, &config));

        let mut game = Self {
            until_shrink_ms: config.shrink_interval_ms,
            level,
            config,
            rng,
            now_ms: 0,
            status: GameStatus::Playing,
            cause: None,
            score: 0,
            zones,
            player,
            runners: Arena::new(),
            runners_caught: 0,
            enemies: Arena::new(),
            items: Arena::new(),
            power_ups,
            snake,
            events: Vec::new(),
        };

        game.spawn_enemies();
        if let Some(rules) = game.level.runners {
            game.spawn_runner(rules.start);
        }
        if game.power_ups.is_some() {
            game.spawn_power_up();
        }

        info!(
            level = game.level.id,
            title = %game.level.title,
            enemies = game.enemies.len(),
            seed,
            "level started"
        );
        Ok(game)
    }

    /// Advance the simulation by one fixed step.
    pub fn tick(&mut self, input: &Input) -> TickOutcome {
        if self.status.is_terminal() {
            return TickOutcome {
                status: self.status,
                events: Vec::new(),
            };
        }

        let dt = self.config.tick_ms;
        self.now_ms += dt;

        self.expire_zones();
        if self.is_playing() {
            if self.snake.is_some() {
                self.update_snake(input, dt);
            } else {
                self.run_step(input, dt);
            }
        }
        if self.is_playing() {
            self.check_completion();
        }

        TickOutcome {
            status: self.status,
            events: std::mem::take(&mut self.events),
        }
    }

    fn run_step(&mut self, input: &Input, dt: u64) {
        self.update_player(input);
        if !self.is_playing() {
            return;
        }
        self.update_runners();
        if !self.is_playing() {
            return;
        }
        self.update_enemies();
        self.resolve_collisions();
        if !self.is_playing() {
            return;
        }
        self.run_timers(dt);
    }

    fn expire_zones(&mut self) {
        let report = self.zones.expire(self.now_ms);
        if report.removed.is_empty() {
            return;
        }
        debug!(removed = ?report.removed, fatal = report.fatal, "zones expired");
        self.events.push(GameEvent::ZonesExpired {
            count: report.removed.len(),
        });
        if report.fatal {
            self.game_over(DeathCause::ZoneExpired);
        }
    }

    fn run_timers(&mut self, dt: u64) {
        if self.level.shrinking {
            self.until_shrink_ms = self.until_shrink_ms.saturating_sub(dt);
            if self.until_shrink_ms == 0 {
                self.zones.shrink_all(self.config.shrink_factor);
                self.until_shrink_ms = self.config.shrink_interval_ms;
                debug!(factor = self.config.shrink_factor, "zones shrank");
            }
        }

        for (_, enemy) in self.enemies.iter_mut() {
            enemy.boost_ms = enemy.boost_ms.saturating_sub(dt);
        }

        let spawn_due = match self.power_ups.as_mut() {
            Some(system) => system.advance(dt),
            None => return,
        };
        age_power_ups(&mut self.items, dt);
        if spawn_due {
            self.spawn_power_up();
        }
    }

    fn check_completion(&mut self) {
        if self.level.completion.is_met(&self.progress()) {
            self.complete();
            return;
        }
        if let Some(limit) = self.level.time_limit_ms {
            if self.now_ms >= limit {
                self.game_over(DeathCause::TimeUp);
            }
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub(crate) fn game_over(&mut self, cause: DeathCause) {
        if !self.is_playing() {
            return;
        }
        self.status = GameStatus::GameOver;
        self.cause = Some(cause);
        info!(level = self.level.id, score = self.score, cause = cause.name(), "game over");
        self.events.push(GameEvent::GameOver {
            level: self.level.id,
            score: self.score,
            cause,
        });
    }

    pub(crate) fn complete(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.status = GameStatus::LevelComplete;
        info!(level = self.level.id, score = self.score, "level complete");
        self.events.push(GameEvent::LevelCompleted { level: self.level.id });
    }

    /// Everything the completion predicate looks at.
    pub fn progress(&self) -> Progress {
        Progress {
            coverage: self.zones.coverage_percent(self.config.board_area()),
            enemies: self.enemies.len(),
            apples: self.items.values().filter(|i| i.is_apple()).count(),
            score: self.score,
            runners: self.runners.len(),
            runners_caught: self.runners_caught,
            snake_length: self.snake.as_ref().map_or(0, SnakeState::len),
            snake_board_full: self.snake.as_ref().is_some_and(SnakeState::board_full),
        }
    }

    /// Coverage the way this level reports it.
    pub fn coverage(&self) -> f64 {
        let raw = self.zones.coverage_percent(self.config.board_area());
        self.level.completion.displayed_coverage(raw)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.cause
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn player(&self) -> &Actor {
        &self.player
    }

    pub fn enemies(&self) -> &Arena<Enemy> {
        &self.enemies
    }

    pub fn items(&self) -> &Arena<Collectible> {
        &self.items
    }

    pub fn runners(&self) -> &Arena<Actor> {
        &self.runners
    }

    pub fn snake(&self) -> Option<&SnakeState> {
        self.snake.as_ref()
    }

    pub fn power_ups(&self) -> Option<&PowerUpSystem> {
        self.power_ups.as_ref()
    }

    /// Circle of radius `r` at `p` lies fully on the board.
    pub(crate) fn on_board(&self, p: Point, r: f64) -> bool {
        p.x >= r && p.x <= self.config.board_width - r && p.y >= r && p.y <= self.config.board_height - r
    }

    pub(crate) fn clamp_to_board(&self, p: Point, r: f64) -> Point {
        Point::new(
            p.x.clamp(r, (self.config.board_width - r).max(r)),
            p.y.clamp(r, (self.config.board_height - r).max(r)),
        )
    }

    /// Random point at least `margin` from the edges, off safe ground if
    /// one turns up within a few tries.
    pub(crate) fn random_open_position(&mut self, margin: f64) -> Point {
        let mut p = Point::default();
        for _ in 0..SPAWN_ATTEMPTS {
            p = Point::new(
                self.rng.next_range(margin, self.config.board_width - margin),
                self.rng.next_range(margin, self.config.board_height - margin),
            );
            if !self.zones.is_safe(p) {
                break;
            }
        }
        p
    }

    fn spawn_enemies(&mut self) {
        let w = self.config.board_width;
        let h = self.config.board_height;
        for i in 0..self.level.enemy_count {
            let pos = match &self.level.enemy_placement {
                EnemyPlacement::Random => self.random_open_position(SPAWN_MARGIN),
                EnemyPlacement::Fixed => FIXED_ENEMY_POSITIONS[i % FIXED_ENEMY_POSITIONS.len()],
                EnemyPlacement::Quarters => {
                    let (fx, fy) = QUARTER_POSITIONS[i % QUARTER_POSITIONS.len()];
                    Point::new(w * fx, h * fy)
                }
                EnemyPlacement::At { points } => match points.get(i % points.len().max(1)) {
                    Some(p) => *p,
                    None => self.random_open_position(SPAWN_MARGIN),
                },
            };
            self.spawn_enemy(pos);
        }
    }

    pub(crate) fn spawn_enemy(&mut self, pos: Point) {
        let speed = self
            .rng
            .next_range(self.config.enemy_speed_min, self.config.enemy_speed_max);
        let angle = self.rng.next_angle();
        let behavior = match self.level.enemy_behavior {
            EnemyBehavior::Ghost { .. } => EnemyBehavior::Ghost {
                direction: self.random_direction(),
            },
            other => other,
        };
        self.enemies
            .insert(Enemy::new(pos, self.config.enemy_radius, speed, angle, behavior));
    }

    pub(crate) fn random_direction(&mut self) -> Direction {
        Direction::ALL[self.rng.next_index(Direction::ALL.len())]
    }

    fn spawn_power_up(&mut self) {
        let Some(lifespan) = self.power_ups.as_ref().map(PowerUpSystem::lifespan_ms) else {
            return;
        };
        let kind = PowerUpKind::random(&mut self.rng);
        let pos = self.random_open_position(SPAWN_MARGIN);
        self.items
            .insert(Collectible::power_up(pos, self.config.power_up_radius, kind, lifespan));
        debug!(kind = kind.name(), x = pos.x, y = pos.y, "power-up spawned");
    }

    /// Owned copy of everything a renderer needs.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    pub(crate) fn completion(&self) -> CompletionPredicate {
        self.level.completion
    }
}
