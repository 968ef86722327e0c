//! Scripted players for `run`, `render` and `bench`.
//!
//! A pilot sees one [`Snapshot`] per tick and answers with an [`Input`],
//! the same contract a human at the keyboard has. None of them are clever;
//! they exist so a level can be driven end to end without a terminal.

use territory::game::{Cell, SnakeView};
use territory::{Direction, Input, LevelDescriptor, Point, Snapshot};

/// Shortest outward leg of a claim loop, in ticks.
const MIN_LEG: u32 = 12;
/// Longest outward leg of a claim loop, in ticks.
const MAX_LEG: u32 = 60;
/// Ticks a loop may run before the pilot heads straight home.
const LOOP_TIMEOUT: u32 = 400;
/// Distance at which the hunter stops overshooting a runner.
const HUNT_DEADBAND: f64 = 1.5;

pub trait Pilot {
    fn id(&self) -> &'static str;
    fn next_input(&mut self, snap: &Snapshot) -> Input;
}

/// Pick the pilot that fits how a level is played.
pub fn pilot_for(level: &LevelDescriptor) -> Box<dyn Pilot> {
    if level.is_snake() {
        Box::new(SnakePilot::default())
    } else if !level.player_draws {
        Box::new(HuntPilot)
    } else {
        Box::new(LoopPilot::default())
    }
}

/// Clockwise quarter turn in screen coordinates.
fn clockwise(d: Direction) -> Direction {
    match d {
        Direction::Up => Direction::Right,
        Direction::Right => Direction::Down,
        Direction::Down => Direction::Left,
        Direction::Left => Direction::Up,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Leg {
    /// Walking out of safe ground.
    Leave,
    Out(u32),
    Across(u32),
    Back(u32),
    /// Overran the return leg; head for the nearest zone.
    Home,
}

/// Claims territory with rectangular loops that rotate and grow.
#[derive(Debug, Clone)]
pub struct LoopPilot {
    heading: Direction,
    leg_ticks: u32,
    leg: Leg,
    loop_ticks: u32,
}

impl Default for LoopPilot {
    fn default() -> Self {
        Self {
            heading: Direction::Up,
            leg_ticks: MIN_LEG,
            leg: Leg::Leave,
            loop_ticks: 0,
        }
    }
}

impl LoopPilot {
    /// Start the next loop, turning away from a nearby board edge.
    fn next_loop(&mut self, snap: &Snapshot) {
        self.heading = clockwise(self.heading);
        self.leg_ticks = (self.leg_ticks + 4).min(MAX_LEG);
        let reach = self.leg_ticks as f64 * 4.0;
        for _ in 0..4 {
            if has_room(snap, self.heading, reach) {
                break;
            }
            self.heading = clockwise(self.heading);
        }
        self.leg = Leg::Leave;
        self.loop_ticks = 0;
    }

    fn home_direction(snap: &Snapshot) -> Direction {
        let pos = snap.player.pos;
        let nearest = snap
            .zones
            .iter()
            .map(|z| {
                let b = z.shape.bounds();
                Point::new((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0)
            })
            .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)));
        match nearest {
            Some(target) => Direction::toward(target.x - pos.x, target.y - pos.y),
            None => Direction::Up,
        }
    }
}

fn has_room(snap: &Snapshot, d: Direction, reach: f64) -> bool {
    let (dx, dy) = d.delta();
    let x = snap.player.pos.x + dx * reach;
    let y = snap.player.pos.y + dy * reach;
    x > 0.0 && y > 0.0 && x < snap.board_width && y < snap.board_height
}

impl Pilot for LoopPilot {
    fn id(&self) -> &'static str {
        "loop"
    }

    fn next_input(&mut self, snap: &Snapshot) -> Input {
        let drawing = !snap.player.line.is_empty();
        if self.leg != Leg::Leave && !drawing && snap.player.in_safe_zone {
            self.next_loop(snap);
        }

        self.loop_ticks += 1;
        if self.loop_ticks > LOOP_TIMEOUT && drawing {
            self.leg = Leg::Home;
        }

        let across = clockwise(self.heading);
        let direction = match self.leg {
            Leg::Leave => {
                if drawing || !snap.player.in_safe_zone {
                    self.leg = Leg::Out(1);
                }
                self.heading
            }
            Leg::Out(n) => {
                self.leg = if n >= self.leg_ticks { Leg::Across(1) } else { Leg::Out(n + 1) };
                self.heading
            }
            Leg::Across(n) => {
                self.leg = if n >= self.leg_ticks / 2 { Leg::Back(1) } else { Leg::Across(n + 1) };
                across
            }
            Leg::Back(n) => {
                if n > self.leg_ticks + 20 {
                    self.leg = Leg::Home;
                } else {
                    self.leg = Leg::Back(n + 1);
                }
                self.heading.opposite()
            }
            Leg::Home => Self::home_direction(snap),
        };
        Input::toward(direction)
    }
}

/// Runs straight at the nearest runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuntPilot;

impl Pilot for HuntPilot {
    fn id(&self) -> &'static str {
        "hunt"
    }

    fn next_input(&mut self, snap: &Snapshot) -> Input {
        let pos = snap.player.pos;
        let Some(target) = snap
            .runners
            .iter()
            .map(|r| r.pos)
            .min_by(|a, b| a.distance(pos).total_cmp(&b.distance(pos)))
        else {
            return Input::default();
        };
        let (dx, dy) = (target.x - pos.x, target.y - pos.y);
        Input {
            up: dy < -HUNT_DEADBAND,
            down: dy > HUNT_DEADBAND,
            left: dx < -HUNT_DEADBAND,
            right: dx > HUNT_DEADBAND,
            toggle_draw: false,
        }
    }
}

/// Greedy snake: step toward the apple through the first cell that is
/// not immediately fatal.
#[derive(Debug, Clone, Default)]
pub struct SnakePilot {
    heading: Direction,
    last_head: Option<Cell>,
}

impl SnakePilot {
    fn is_open(snake: &SnakeView, cell: Cell) -> bool {
        cell.col >= 0
            && cell.row >= 0
            && cell.col < snake.cols
            && cell.row < snake.rows
            && !snake.body.contains(&cell)
            && !snake.walls.iter().any(|w| w.cell == cell)
    }

    fn choose(&self, snake: &SnakeView) -> Direction {
        let Some(&head) = snake.body.first() else {
            return self.heading;
        };
        let target = snake.apple.unwrap_or(head);
        let mut options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|d| *d != self.heading.opposite())
            .collect();
        options.sort_by_key(|d| head.step(*d).manhattan(target));
        options
            .iter()
            .copied()
            .find(|d| Self::is_open(snake, head.step(*d)))
            .unwrap_or(self.heading)
    }
}

impl Pilot for SnakePilot {
    fn id(&self) -> &'static str {
        "snake"
    }

    fn next_input(&mut self, snap: &Snapshot) -> Input {
        let Some(snake) = &snap.snake else {
            return Input::default();
        };
        let head = snake.body.first().copied();
        if head != self.last_head {
            self.heading = self.choose(snake);
            self.last_head = head;
        }
        Input::toward(self.heading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use territory::{Game, GameConfig, GameStatus, LevelTable};

    fn game(id: u32, seed: u64) -> Game {
        let level = LevelTable::builtin().find(id).unwrap().clone();
        Game::new(level, GameConfig::default(), seed).unwrap()
    }

    fn drive(game: &mut Game, pilot: &mut dyn Pilot, ticks: u32) {
        for _ in 0..ticks {
            if game.status().is_terminal() {
                break;
            }
            let input = pilot.next_input(&game.snapshot());
            game.tick(&input);
        }
    }

    #[test]
    fn pilot_matches_the_level() {
        let table = LevelTable::builtin();
        assert_eq!(pilot_for(table.find(1).unwrap()).id(), "loop");
        assert_eq!(pilot_for(table.find(6).unwrap()).id(), "hunt");
        assert_eq!(pilot_for(table.find(21).unwrap()).id(), "snake");
    }

    #[test]
    fn clockwise_cycles() {
        let mut d = Direction::Up;
        for _ in 0..4 {
            d = clockwise(d);
        }
        assert_eq!(d, Direction::Up);
        assert_eq!(clockwise(Direction::Up), Direction::Right);
    }

    #[test]
    fn loop_pilot_leaves_and_draws() {
        let mut g = game(1, 3);
        let mut pilot = LoopPilot::default();
        drive(&mut g, &mut pilot, 30);
        assert!(pilot.leg != Leg::Leave || g.status().is_terminal());
    }

    #[test]
    fn hunt_pilot_heads_for_the_runner() {
        let g = game(6, 1);
        let snap = g.snapshot();
        let runner = snap.runners[0].pos;
        let input = HuntPilot.next_input(&snap);
        assert_eq!(input.right, runner.x > snap.player.pos.x + HUNT_DEADBAND);
        assert_eq!(input.left, runner.x < snap.player.pos.x - HUNT_DEADBAND);
        assert!(!input.toggle_draw);
    }

    #[test]
    fn snake_pilot_goes_for_the_first_apple() {
        let g = game(20, 1);
        let mut pilot = SnakePilot::default();
        assert_eq!(pilot.next_input(&g.snapshot()).direction(), Some(Direction::Right));
    }

    #[test]
    fn snake_pilot_eats() {
        let mut g = game(20, 5);
        let mut pilot = SnakePilot::default();
        drive(&mut g, &mut pilot, 200);
        assert!(g.score() > 0 || g.status() == GameStatus::GameOver);
    }

    #[test]
    fn snake_pilot_avoids_walls_of_its_own_body() {
        let snake = SnakeView {
            cols: 5,
            rows: 5,
            body: vec![Cell::new(2, 2), Cell::new(1, 2), Cell::new(1, 1), Cell::new(2, 1)],
            apple: Some(Cell::new(3, 0)),
            walls: Vec::new(),
        };
        let pilot = SnakePilot {
            heading: Direction::Right,
            last_head: None,
        };
        // Up ties with Right on distance but runs into the body.
        assert_eq!(pilot.choose(&snake), Direction::Right);
    }
}
