//! The level rule table.
//!
//! Every rule that varies between levels is data on a [`LevelDescriptor`]:
//! how trails close, how new territory merges, who the enemies are and what
//! ends the level. The game loop reads the descriptor and never looks at a
//! level number.

use serde::{Deserialize, Serialize};

use crate::construct::ConstructionStrategy;
use crate::entity::EnemyBehavior;
use crate::error::LevelError;
use crate::geometry::Point;
use crate::merge::{CandidateDecay, MergePolicy, PROXIMITY_THRESHOLD};
use crate::power_up::{PowerUpRules, StarEffect};
use crate::zone::Rect;

/// Coverage percentage that finishes most levels.
pub const BOARD_COMPLETION_THRESHOLD: f64 = 85.0;

/// Temporary zones last this long unless something saves them.
pub const TEMPORARY_ZONE_LIFESPAN_MS: u64 = 8000;

/// Spawn points for fixed placement, in order.
pub const FIXED_ENEMY_POSITIONS: [Point; 8] = [
    Point::new(150.0, 150.0),
    Point::new(650.0, 150.0),
    Point::new(150.0, 450.0),
    Point::new(650.0, 450.0),
    Point::new(400.0, 100.0),
    Point::new(400.0, 500.0),
    Point::new(100.0, 300.0),
    Point::new(700.0, 300.0),
];

/// Spawn points for quarter placement as fractions of the board, in order.
pub const QUARTER_POSITIONS: [(f64, f64); 8] = [
    (0.25, 0.25),
    (0.75, 0.25),
    (0.25, 0.75),
    (0.75, 0.75),
    (0.5, 0.25),
    (0.5, 0.75),
    (0.25, 0.5),
    (0.75, 0.5),
];

/// Where enemies appear at level start.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnemyPlacement {
    /// Random, away from the edges and outside safe ground.
    #[default]
    Random,
    /// The first `enemy_count` of [`FIXED_ENEMY_POSITIONS`].
    Fixed,
    /// The first `enemy_count` of [`QUARTER_POSITIONS`], scaled to the board.
    Quarters,
    /// Explicit positions, cycled if there are fewer than `enemy_count`.
    At { points: Vec<Point> },
}

/// How the player steers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Eight directions, diagonals normalised.
    #[default]
    Free,
    /// One axis at a time; the last direction keeps going with no input.
    Cardinal,
}

/// What finishes a level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompletionPredicate {
    /// Coverage reaches `percent`.
    Coverage { percent: f64 },
    /// Coverage measured against the largest reachable area, plus a grace.
    ScaledCoverage { max_achievable: f64, grace: f64 },
    /// Coverage reaches `percent`, or no enemies and no apples remain.
    CoverageOrCleared { percent: f64 },
    /// Coverage reaches `percent`, or no enemies remain.
    CoverageOrEnemiesCleared { percent: f64 },
    /// Coverage reaches `percent` and no enemies remain.
    CoverageAndEnemiesCleared { percent: f64 },
    /// Every enemy captured or eaten.
    EnemiesCleared,
    /// Score reaches `score`.
    ScoreTarget { score: u64 },
    /// The player caught a runner.
    CatchRunner,
    /// Coverage reaches `percent`, or every runner is caught.
    CoverageOrRunnersCaught { percent: f64 },
    /// The snake is at least `length` long.
    SnakeLength { length: usize },
    /// No free tile is left for an apple.
    SnakeFill,
}

impl Default for CompletionPredicate {
    fn default() -> Self {
        Self::CoverageOrCleared {
            percent: BOARD_COMPLETION_THRESHOLD,
        }
    }
}

/// What the completion check gets to look at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Progress {
    /// Raw coverage percentage of the board.
    pub coverage: f64,
    pub enemies: usize,
    pub apples: usize,
    pub score: u64,
    pub runners: usize,
    pub runners_caught: u32,
    pub snake_length: usize,
    /// No free tile remained when an apple was due.
    pub snake_board_full: bool,
}

impl CompletionPredicate {
    pub fn is_met(&self, p: &Progress) -> bool {
        match *self {
            Self::Coverage { percent } => p.coverage >= percent,
            Self::ScaledCoverage { .. } => self.displayed_coverage(p.coverage) >= 100.0,
            Self::CoverageOrCleared { percent } => p.coverage >= percent || (p.enemies == 0 && p.apples == 0),
            Self::CoverageOrEnemiesCleared { percent } => p.coverage >= percent || p.enemies == 0,
            Self::CoverageAndEnemiesCleared { percent } => p.coverage >= percent && p.enemies == 0,
            Self::EnemiesCleared => p.enemies == 0,
            Self::ScoreTarget { score } => p.score >= score,
            Self::CatchRunner => p.runners_caught > 0,
            Self::CoverageOrRunnersCaught { percent } => p.coverage >= percent || p.runners == 0,
            Self::SnakeLength { length } => p.snake_length >= length,
            Self::SnakeFill => p.snake_board_full,
        }
    }

    /// Coverage as the level reports it.
    ///
    /// Scaled coverage divides by the reachable fraction of the board and
    /// adds a small grace, capped at 100.
    pub fn displayed_coverage(&self, raw: f64) -> f64 {
        match *self {
            Self::ScaledCoverage { max_achievable, grace } => {
                if max_achievable <= 0.0 {
                    return raw;
                }
                (raw / max_achievable + grace).min(100.0)
            }
            _ => raw,
        }
    }

    /// The predicate is settled by enemy elimination, so a capture that
    /// empties the board ends the level on the spot.
    pub fn completes_on_last_capture(&self) -> bool {
        matches!(self, Self::EnemiesCleared | Self::CoverageOrEnemiesCleared { .. })
    }

    fn threshold(&self) -> Option<f64> {
        match *self {
            Self::Coverage { percent }
            | Self::CoverageOrCleared { percent }
            | Self::CoverageOrEnemiesCleared { percent }
            | Self::CoverageAndEnemiesCleared { percent }
            | Self::CoverageOrRunnersCaught { percent } => Some(percent),
            _ => None,
        }
    }
}

/// AI runners: rival drawers the player hunts down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerRules {
    pub start: Point,
    /// Score for catching one.
    pub catch_score: u64,
    /// Catching one grants a random rectangle of territory.
    pub reward_zone: bool,
    /// A caught runner is replaced by a new one.
    pub respawn: bool,
    /// Chance per tick that an idle runner in safe ground starts drawing.
    pub draw_chance: f64,
}

impl Default for RunnerRules {
    fn default() -> Self {
        Self {
            start: Point::new(600.0, 400.0),
            catch_score: 0,
            reward_zone: false,
            respawn: false,
            draw_chance: 0.01,
        }
    }
}

/// The grid Snake variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeRules {
    pub cols: i32,
    pub rows: i32,
    pub initial_length: usize,
    pub move_interval_ms: u64,
    /// How long the snake waits facing a lethal tile before it dies.
    pub grace_ms: u64,
    pub apple_score: u32,
    pub walls_per_apple: usize,
    pub wall_attempts: usize,
    /// Walls keep this Manhattan distance from the head.
    pub wall_min_distance: i32,
    /// Snake moves a wall survives.
    pub wall_lifespan: u32,
}

impl Default for SnakeRules {
    fn default() -> Self {
        Self {
            cols: 10,
            rows: 9,
            initial_length: 3,
            move_interval_ms: 135,
            grace_ms: 100,
            apple_score: 100,
            walls_per_apple: 2,
            wall_attempts: 15,
            wall_min_distance: 6,
            wall_lifespan: 35,
        }
    }
}

/// Everything that makes one level different from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDescriptor {
    pub id: u32,
    pub title: String,

    pub enemy_count: usize,
    pub enemy_placement: EnemyPlacement,
    pub enemy_behavior: EnemyBehavior,
    /// Enemies stuck in place for two ticks get shoved along.
    pub enemy_stall_recovery: bool,
    /// Eating an apple tops the enemies back up to this many.
    pub respawn_enemies_below: Option<usize>,

    pub construction: ConstructionStrategy,
    pub merge: MergePolicy,
    pub candidate_decay: Option<CandidateDecay>,
    pub completion: CompletionPredicate,

    pub movement: MovementMode,
    /// The player can claim territory. Off on the hunt levels.
    pub player_draws: bool,
    pub power_ups: Option<PowerUpRules>,
    /// Zones shrink on a timer.
    pub shrinking: bool,

    pub score_divisor: f64,
    pub apple_value: u32,
    pub time_limit_ms: Option<u64>,

    pub runners: Option<RunnerRules>,
    pub snake: Option<SnakeRules>,
    /// Overrides the configured starting zone.
    pub initial_zone: Option<Rect>,
}

impl Default for LevelDescriptor {
    fn default() -> Self {
        Self {
            id: 0,
            title: String::new(),
            enemy_count: 0,
            enemy_placement: EnemyPlacement::Random,
            enemy_behavior: EnemyBehavior::Roamer,
            enemy_stall_recovery: false,
            respawn_enemies_below: None,
            construction: ConstructionStrategy::BoundingRectangle,
            merge: MergePolicy::Append,
            candidate_decay: None,
            completion: CompletionPredicate::default(),
            movement: MovementMode::Free,
            player_draws: true,
            power_ups: None,
            shrinking: false,
            score_divisor: 100.0,
            apple_value: 50,
            time_limit_ms: None,
            runners: None,
            snake: None,
            initial_zone: None,
        }
    }
}

impl LevelDescriptor {
    pub fn new(id: u32, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_snake(&self) -> bool {
        self.snake.is_some()
    }

    /// Reject descriptors the game can't run.
    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |field: &'static str, reason: String| LevelError::InvalidDescriptor {
            level: self.id,
            field,
            reason,
        };

        if !(self.score_divisor.is_finite() && self.score_divisor > 0.0) {
            return Err(invalid("score_divisor", format!("must be positive, got {}", self.score_divisor)));
        }

        if let Some(p) = self.completion.threshold() {
            if !(p.is_finite() && p > 0.0) {
                return Err(invalid("completion", format!("threshold must be positive, got {p}")));
            }
        }

        match self.merge {
            MergePolicy::ProximityGroupMerge { threshold } if !(threshold.is_finite() && threshold >= 0.0) => {
                return Err(invalid("merge", format!("bad proximity threshold {threshold}")));
            }
            MergePolicy::TemporalTag { lifespan: 0, .. } => {
                return Err(invalid("merge", "temporal lifespan must be positive".into()));
            }
            _ => {}
        }

        if self.candidate_decay.is_some_and(|d| d.lifespan == 0) {
            return Err(invalid("candidate_decay", "lifespan must be positive".into()));
        }

        match &self.enemy_placement {
            EnemyPlacement::Fixed if self.enemy_count > FIXED_ENEMY_POSITIONS.len() => {
                return Err(invalid(
                    "enemy_count",
                    format!("fixed placement has only {} spots", FIXED_ENEMY_POSITIONS.len()),
                ));
            }
            EnemyPlacement::Quarters if self.enemy_count > QUARTER_POSITIONS.len() => {
                return Err(invalid(
                    "enemy_count",
                    format!("quarter placement has only {} spots", QUARTER_POSITIONS.len()),
                ));
            }
            EnemyPlacement::At { points } if points.is_empty() && self.enemy_count > 0 => {
                return Err(invalid("enemy_placement", "no spawn points given".into()));
            }
            _ => {}
        }

        let snake_goal = matches!(
            self.completion,
            CompletionPredicate::SnakeLength { .. } | CompletionPredicate::SnakeFill
        );
        if snake_goal != self.is_snake() {
            return Err(invalid("completion", "snake goals need snake rules and vice versa".into()));
        }
        if let Some(snake) = &self.snake {
            if snake.cols < 2 || snake.rows < 1 || snake.initial_length == 0 || snake.initial_length > snake.cols as usize {
                return Err(invalid("snake", format!("{}x{} grid can't hold the snake", snake.cols, snake.rows)));
            }
            if snake.move_interval_ms == 0 {
                return Err(invalid("snake", "move interval must be positive".into()));
            }
        }

        let runner_goal = matches!(
            self.completion,
            CompletionPredicate::CatchRunner | CompletionPredicate::CoverageOrRunnersCaught { .. }
        );
        if runner_goal && self.runners.is_none() {
            return Err(invalid("completion", "runner goals need runner rules".into()));
        }

        Ok(())
    }
}

/// An ordered set of levels with unique ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTable {
    levels: Vec<LevelDescriptor>,
}

impl LevelTable {
    /// Validate every descriptor and check ids are unique.
    pub fn new(levels: Vec<LevelDescriptor>) -> Result<Self, LevelError> {
        let mut seen = std::collections::HashSet::new();
        for level in &levels {
            if !seen.insert(level.id) {
                return Err(LevelError::DuplicateLevel(level.id));
            }
            level.validate()?;
        }
        Ok(Self { levels })
    }

    pub fn builtin() -> Self {
        Self {
            levels: builtin_levels(),
        }
    }

    pub fn find(&self, id: u32) -> Result<&LevelDescriptor, LevelError> {
        self.levels
            .iter()
            .find(|l| l.id == id)
            .ok_or(LevelError::UnknownLevel(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelDescriptor> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn into_levels(self) -> Vec<LevelDescriptor> {
        self.levels
    }
}

/// The twenty-one built-in levels.
pub fn builtin_levels() -> Vec<LevelDescriptor> {
    let temporary = |survive_on_capture| {
        Some(CandidateDecay {
            lifespan: TEMPORARY_ZONE_LIFESPAN_MS,
            survive_on_capture,
        })
    };
    let shield = Some(PowerUpRules::default());
    let proximity = MergePolicy::ProximityGroupMerge {
        threshold: PROXIMITY_THRESHOLD,
    };
    let coverage = CompletionPredicate::Coverage {
        percent: BOARD_COMPLETION_THRESHOLD,
    };

    vec![
        LevelDescriptor {
            enemy_count: 3,
            enemy_placement: EnemyPlacement::Fixed,
            ..LevelDescriptor::new(1, "Foundation")
        },
        LevelDescriptor {
            enemy_count: 4,
            enemy_placement: EnemyPlacement::Fixed,
            construction: ConstructionStrategy::NearestZoneConnect,
            ..LevelDescriptor::new(2, "Shapes Emerge")
        },
        LevelDescriptor {
            enemy_count: 4,
            enemy_placement: EnemyPlacement::Fixed,
            construction: ConstructionStrategy::ComprehensiveMultiZoneFill,
            ..LevelDescriptor::new(3, "Territory Mastery")
        },
        LevelDescriptor {
            enemy_count: 2,
            enemy_placement: EnemyPlacement::Fixed,
            respawn_enemies_below: Some(2),
            construction: ConstructionStrategy::ZigzagMultiZone,
            merge: proximity,
            ..LevelDescriptor::new(4, "Territory Fusion")
        },
        LevelDescriptor {
            enemy_count: 5,
            enemy_placement: EnemyPlacement::Fixed,
            enemy_behavior: EnemyBehavior::Drifter,
            construction: ConstructionStrategy::NearestZoneConnect,
            candidate_decay: temporary(true),
            ..LevelDescriptor::new(5, "Time Pressure")
        },
        LevelDescriptor {
            player_draws: false,
            completion: CompletionPredicate::CatchRunner,
            runners: Some(RunnerRules::default()),
            ..LevelDescriptor::new(6, "You Are the Enemy")
        },
        LevelDescriptor {
            player_draws: false,
            completion: CompletionPredicate::CoverageOrRunnersCaught {
                percent: BOARD_COMPLETION_THRESHOLD,
            },
            runners: Some(RunnerRules {
                catch_score: 100,
                reward_zone: true,
                respawn: true,
                ..Default::default()
            }),
            ..LevelDescriptor::new(7, "The Hunt")
        },
        LevelDescriptor {
            enemy_count: 7,
            construction: ConstructionStrategy::ExactShapePlusFullZone,
            merge: MergePolicy::HullMerge,
            ..LevelDescriptor::new(8, "Maybe Normal")
        },
        LevelDescriptor {
            enemy_count: 4,
            enemy_behavior: EnemyBehavior::Fleeing { flee_range: 100.0 },
            construction: ConstructionStrategy::ExactShapePlusFullZone,
            merge: MergePolicy::CaptureOnly,
            completion: CompletionPredicate::ScoreTarget { score: 5000 },
            score_divisor: 50.0,
            apple_value: 100,
            ..LevelDescriptor::new(9, "Score!")
        },
        LevelDescriptor {
            enemy_count: 4,
            construction: ConstructionStrategy::ExactShapePlusFullZone,
            merge: MergePolicy::HullMerge,
            completion: CompletionPredicate::ScaledCoverage {
                max_achievable: 0.954,
                grace: 0.1,
            },
            ..LevelDescriptor::new(10, "100%")
        },
        LevelDescriptor {
            enemy_count: 3,
            construction: ConstructionStrategy::EnclosureCheckWithHullFallback,
            merge: MergePolicy::DirectReplace,
            completion: CompletionPredicate::EnemiesCleared,
            power_ups: shield,
            ..LevelDescriptor::new(11, "Power Up")
        },
        LevelDescriptor {
            enemy_count: 4,
            construction: ConstructionStrategy::ExactShapePlusFullZone,
            merge: MergePolicy::TemporalTag {
                lifespan: TEMPORARY_ZONE_LIFESPAN_MS,
                kill_on_expire: true,
            },
            completion: CompletionPredicate::Coverage { percent: 75.0 },
            ..LevelDescriptor::new(12, "Time's Up")
        },
        LevelDescriptor {
            enemy_count: 3,
            construction: ConstructionStrategy::EnclosureCheckWithHullFallback,
            merge: MergePolicy::HullMerge,
            completion: CompletionPredicate::EnemiesCleared,
            power_ups: shield,
            shrinking: true,
            time_limit_ms: Some(300_000),
            ..LevelDescriptor::new(13, "Time Attack")
        },
        LevelDescriptor {
            enemy_count: 2,
            construction: ConstructionStrategy::ZigzagMultiZone,
            merge: proximity,
            candidate_decay: temporary(false),
            shrinking: true,
            ..LevelDescriptor::new(14, "Wombo Combo")
        },
        LevelDescriptor {
            enemy_count: 3,
            enemy_stall_recovery: true,
            construction: ConstructionStrategy::EnclosureCheckWithHullFallback,
            merge: MergePolicy::HullMerge,
            completion: CompletionPredicate::EnemiesCleared,
            power_ups: Some(PowerUpRules {
                star: StarEffect::Invincibility,
                enemies_collect: true,
            }),
            ..LevelDescriptor::new(15, "Advantage")
        },
        LevelDescriptor {
            enemy_count: 4,
            enemy_placement: EnemyPlacement::Quarters,
            enemy_behavior: EnemyBehavior::Ghost {
                direction: Default::default(),
            },
            construction: ConstructionStrategy::CardinalGapFill,
            merge: MergePolicy::HullMerge,
            completion: CompletionPredicate::CoverageAndEnemiesCleared {
                percent: BOARD_COMPLETION_THRESHOLD,
            },
            movement: MovementMode::Cardinal,
            power_ups: Some(PowerUpRules {
                star: StarEffect::VulnerableEnemies,
                enemies_collect: false,
            }),
            ..LevelDescriptor::new(16, "Cardinal")
        },
        LevelDescriptor {
            enemy_count: 3,
            enemy_placement: EnemyPlacement::Quarters,
            construction: ConstructionStrategy::CardinalOrthogonal,
            completion: coverage,
            movement: MovementMode::Cardinal,
            ..LevelDescriptor::new(17, "Limited")
        },
        LevelDescriptor {
            enemy_count: 8,
            enemy_placement: EnemyPlacement::Quarters,
            construction: ConstructionStrategy::CardinalGapFill,
            movement: MovementMode::Cardinal,
            power_ups: shield,
            ..LevelDescriptor::new(18, "Limited Power")
        },
        LevelDescriptor {
            enemy_count: 3,
            enemy_placement: EnemyPlacement::Quarters,
            construction: ConstructionStrategy::CardinalGapFill,
            completion: CompletionPredicate::CoverageOrEnemiesCleared {
                percent: BOARD_COMPLETION_THRESHOLD,
            },
            movement: MovementMode::Cardinal,
            power_ups: Some(PowerUpRules {
                star: StarEffect::Invincibility,
                enemies_collect: true,
            }),
            shrinking: true,
            ..LevelDescriptor::new(19, "Shrinking Power")
        },
        LevelDescriptor {
            completion: CompletionPredicate::SnakeLength { length: 28 },
            snake: Some(SnakeRules::default()),
            ..LevelDescriptor::new(20, "Snake")
        },
        LevelDescriptor {
            completion: CompletionPredicate::SnakeFill,
            snake: Some(SnakeRules::default()),
            ..LevelDescriptor::new(21, "Endless Snake")
        },
    ]
}
