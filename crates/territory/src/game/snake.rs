//! The grid Snake variant.
//!
//! The snake steps one cell per move interval. Facing a lethal cell it
//! holds still for a short grace period, then dies if the way is still
//! blocked. Every apple it eats grows it by one and drops a few temporary
//! walls away from the head.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::debug;

use super::{DeathCause, Game, GameEvent, Input};
use crate::entity::{CollectibleKind, Direction};
use crate::level::SnakeRules;
use crate::rng::Rng;

/// Random tries before apple placement falls back to a scan.
const APPLE_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn step(&self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.col + dx as i32, self.row + dy as i32)
    }

    pub fn manhattan(&self, other: Cell) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// A temporary obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Wall {
    pub cell: Cell,
    /// Snake moves until it disappears.
    pub moves_left: u32,
}

/// What one [`SnakeState::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakeStep {
    /// No input yet, or the move timer hasn't run out.
    Idle,
    Moved,
    /// Moved onto the apple.
    Ate,
    /// Facing a lethal cell, counting down the grace period.
    Blocked,
    Crashed,
}

#[derive(Debug, Clone)]
pub struct SnakeState {
    rules: SnakeRules,
    /// Head first.
    body: VecDeque<Cell>,
    /// Heading of the next move.
    heading: Direction,
    /// Heading of the last completed move; reversals are checked against it.
    moved: Direction,
    started: bool,
    apple: Option<Cell>,
    walls: Vec<Wall>,
    until_move_ms: u64,
    grace_ms: Option<u64>,
    board_full: bool,
}

impl SnakeState {
    pub fn new(rules: SnakeRules) -> Self {
        let row = rules.rows / 2;
        let length = rules.initial_length.max(1) as i32;
        let body = (0..length).rev().map(|col| Cell::new(col, row)).collect();
        Self {
            body,
            heading: Direction::Right,
            moved: Direction::Right,
            started: false,
            apple: Some(Cell::new(rules.cols - 4, row)),
            walls: Vec::new(),
            until_move_ms: 0,
            grace_ms: None,
            board_full: false,
            rules,
        }
    }

    pub fn rules(&self) -> &SnakeRules {
        &self.rules
    }

    pub fn head(&self) -> Cell {
        self.body.front().copied().unwrap_or(Cell::new(0, 0))
    }

    pub fn body(&self) -> impl Iterator<Item = Cell> + '_ {
        self.body.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn apple(&self) -> Option<Cell> {
        self.apple
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// No free cell was left for an apple.
    pub fn board_full(&self) -> bool {
        self.board_full
    }

    /// Request a heading. Turning straight back is ignored.
    pub fn steer(&mut self, direction: Direction) {
        if self.body.len() > 1 && direction == self.moved.opposite() {
            return;
        }
        self.heading = direction;
        self.started = true;
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.rules.cols).contains(&cell.col) && (0..self.rules.rows).contains(&cell.row)
    }

    fn is_wall(&self, cell: Cell) -> bool {
        self.walls.iter().any(|w| w.cell == cell)
    }

    fn is_lethal(&self, cell: Cell) -> bool {
        !self.in_bounds(cell) || self.body.contains(&cell) || self.is_wall(cell)
    }

    fn is_free(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.body.contains(&cell) && !self.is_wall(cell)
    }

    /// Run the move timer by `dt` and move if it's due.
    pub fn advance(&mut self, dt: u64, rng: &mut Rng) -> SnakeStep {
        if !self.started {
            return SnakeStep::Idle;
        }

        let next = self.head().step(self.heading);
        if let Some(left) = self.grace_ms {
            if !self.is_lethal(next) {
                self.grace_ms = None;
                self.until_move_ms = self.rules.move_interval_ms;
                return self.step_to(next, rng);
            }
            let left = left.saturating_sub(dt);
            if left == 0 {
                return SnakeStep::Crashed;
            }
            self.grace_ms = Some(left);
            return SnakeStep::Blocked;
        }

        self.until_move_ms = self.until_move_ms.saturating_sub(dt);
        if self.until_move_ms > 0 {
            return SnakeStep::Idle;
        }
        self.until_move_ms = self.rules.move_interval_ms;

        if self.is_lethal(next) {
            self.grace_ms = Some(self.rules.grace_ms);
            return SnakeStep::Blocked;
        }
        self.step_to(next, rng)
    }

    fn step_to(&mut self, next: Cell, rng: &mut Rng) -> SnakeStep {
        self.body.push_front(next);
        self.moved = self.heading;
        self.age_walls();

        if self.apple == Some(next) {
            self.spawn_apple(rng);
            self.spawn_walls(rng);
            return SnakeStep::Ate;
        }
        self.body.pop_back();
        SnakeStep::Moved
    }

    fn age_walls(&mut self) {
        for wall in &mut self.walls {
            wall.moves_left = wall.moves_left.saturating_sub(1);
        }
        self.walls.retain(|w| w.moves_left > 0);
    }

    fn random_cell(&self, rng: &mut Rng) -> Cell {
        Cell::new(
            rng.next_index(self.rules.cols as usize) as i32,
            rng.next_index(self.rules.rows as usize) as i32,
        )
    }

    fn spawn_apple(&mut self, rng: &mut Rng) {
        let mut found = None;
        for _ in 0..APPLE_ATTEMPTS {
            let cell = self.random_cell(rng);
            if self.is_free(cell) {
                found = Some(cell);
                break;
            }
        }
        if found.is_none() {
            found = (0..self.rules.rows)
                .flat_map(|row| (0..self.rules.cols).map(move |col| Cell::new(col, row)))
                .find(|c| self.is_free(*c));
        }

        self.apple = found;
        if found.is_none() {
            self.board_full = true;
            debug!(length = self.body.len(), "no room left for an apple");
        }
    }

    fn spawn_walls(&mut self, rng: &mut Rng) {
        let head = self.head();
        for _ in 0..self.rules.walls_per_apple {
            for _ in 0..self.rules.wall_attempts {
                let cell = self.random_cell(rng);
                let placeable = cell.manhattan(head) >= self.rules.wall_min_distance
                    && self.is_free(cell)
                    && self.apple != Some(cell);
                if placeable {
                    self.walls.push(Wall {
                        cell,
                        moves_left: self.rules.wall_lifespan,
                    });
                    break;
                }
            }
        }
    }
}

impl Game {
    pub(super) fn update_snake(&mut self, input: &Input, dt: u64) {
        let Some(snake) = self.snake.as_mut() else {
            return;
        };
        if let Some(direction) = input.direction() {
            snake.steer(direction);
        }

        let apple_score = snake.rules.apple_score;
        match snake.advance(dt, &mut self.rng) {
            SnakeStep::Ate => {
                self.score += u64::from(apple_score);
                self.events.push(GameEvent::ItemCollected {
                    item: CollectibleKind::Apple { value: apple_score },
                });
            }
            SnakeStep::Crashed => self.game_over(DeathCause::SnakeCrash),
            SnakeStep::Idle | SnakeStep::Moved | SnakeStep::Blocked => {}
        }
    }
}
