//! Play command: the game in a terminal, drawn with ratatui's canvas.
//!
//! The simulation runs at its own fixed step. Each frame the front end
//! works out how many ticks of wall-clock time have passed and runs that
//! many, so speed does not depend on how fast the terminal redraws.

use std::io::{self, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Rectangle},
        Block, Borders, Paragraph,
    },
};
use tracing::info;

use territory::{CollectibleKind, Direction as Heading, Game, GameStatus, Input, LevelTable, Snapshot, ZoneShape};

use super::common::GameOptions;

/// Most ticks run in one frame after a stall.
const MAX_CATCH_UP: u64 = 25;
/// Frames a key press keeps steering for, to ride out key-repeat gaps.
const HOLD_FRAMES: u32 = 6;

struct App {
    opts: GameOptions,
    levels: LevelTable,
    seed: u64,
    game: Game,
    held: Option<(Heading, u32)>,
    toggle: bool,
    should_quit: bool,
    best: u64,
}

impl App {
    fn new(opts: GameOptions) -> Result<Self> {
        let levels = opts.levels()?;
        let seed = opts.seed();
        let game = opts.new_game(seed)?;
        Ok(Self {
            opts,
            levels,
            seed,
            game,
            held: None,
            toggle: false,
            should_quit: false,
            best: 0,
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.seed = self.seed.wrapping_add(1);
        self.game = self.opts.new_game(self.seed)?;
        self.held = None;
        info!(level = self.opts.level, seed = self.seed, "level started");
        Ok(())
    }

    /// Move to the next level id in the table, wrapping around.
    fn next_level(&mut self) -> Result<()> {
        let ids: Vec<u32> = self.levels.iter().map(|l| l.id).collect();
        let at = ids.iter().position(|id| *id == self.opts.level).unwrap_or(0);
        if let Some(next) = ids.get((at + 1) % ids.len().max(1)) {
            self.opts.level = *next;
        }
        self.restart()
    }

    fn input(&mut self) -> Input {
        let mut input = match self.held {
            Some((heading, _)) => Input::toward(heading),
            None => Input::default(),
        };
        input.toggle_draw = std::mem::take(&mut self.toggle);
        input
    }

    fn age_keys(&mut self) {
        self.held = match self.held {
            Some((heading, frames)) if frames > 1 => Some((heading, frames - 1)),
            _ => None,
        };
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<()> {
        let heading = match code {
            KeyCode::Up | KeyCode::Char('w') => Some(Heading::Up),
            KeyCode::Down | KeyCode::Char('s') => Some(Heading::Down),
            KeyCode::Left | KeyCode::Char('a') => Some(Heading::Left),
            KeyCode::Right | KeyCode::Char('d') => Some(Heading::Right),
            _ => None,
        };
        if let Some(heading) = heading {
            self.held = Some((heading, HOLD_FRAMES));
            return Ok(());
        }
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle = true,
            KeyCode::Char('r') => self.restart()?,
            KeyCode::Char('n') => self.next_level()?,
            _ => {}
        }
        Ok(())
    }
}

/// Execute the play command.
pub fn cmd_play(args: &[String]) -> Result<()> {
    let mut opts = GameOptions::default();
    let mut i = 0;
    while i < args.len() {
        if !opts.accept(args, &mut i)? {
            match args[i].as_str() {
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(anyhow::anyhow!("unexpected argument: {}", other)),
            }
        }
        i += 1;
    }

    let mut app = App::new(opts)?;

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let tick = Duration::from_millis(app.game.config().tick_ms.max(1));
    let mut last = Instant::now();
    let mut backlog = Duration::ZERO;

    loop {
        let now = Instant::now();
        backlog += now - last;
        last = now;

        let mut ran = 0;
        while backlog >= tick && ran < MAX_CATCH_UP {
            let input = app.input();
            let outcome = app.game.tick(&input);
            if outcome.status != GameStatus::Playing {
                app.best = app.best.max(app.game.score());
            }
            backlog -= tick;
            ran += 1;
        }
        if ran == MAX_CATCH_UP {
            backlog = Duration::ZERO;
        }
        app.age_keys();

        let snap = app.game.snapshot();
        terminal.draw(|frame| ui(frame, &snap, app.best))?;

        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code)?;
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, snap: &Snapshot, best: u64) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(frame.area());

    let border = match snap.status {
        GameStatus::Playing => Color::Green,
        GameStatus::LevelComplete => Color::Yellow,
        GameStatus::GameOver => Color::Red,
    };
    let (w, h) = (snap.board_width, snap.board_height);

    let board = Canvas::default()
        .block(
            Block::default()
                .title(format!(" Level {}: {} ", snap.level, snap.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .marker(Marker::Braille)
        .x_bounds([0.0, w])
        .y_bounds([0.0, h])
        .paint(|ctx| {
            // Canvas y grows upward; the board's grows downward.
            let flip = |y: f64| h - y;

            if let Some(snake) = &snap.snake {
                let cw = w / snake.cols as f64;
                let ch = h / snake.rows as f64;
                let cell = |col: i32, row: i32, color: Color| Rectangle {
                    x: col as f64 * cw + 1.0,
                    y: flip((row + 1) as f64 * ch) + 1.0,
                    width: cw - 2.0,
                    height: ch - 2.0,
                    color,
                };
                for wall in &snake.walls {
                    ctx.draw(&cell(wall.cell.col, wall.cell.row, Color::DarkGray));
                }
                if let Some(apple) = snake.apple {
                    ctx.draw(&cell(apple.col, apple.row, Color::Red));
                }
                for body in &snake.body {
                    ctx.draw(&cell(body.col, body.row, Color::Green));
                }
            }

            for zone in &snap.zones {
                let color = if zone.is_temporary() { Color::LightGreen } else { Color::Green };
                match &zone.shape {
                    ZoneShape::Rectangle(r) => ctx.draw(&Rectangle {
                        x: r.x,
                        y: flip(r.y + r.height),
                        width: r.width,
                        height: r.height,
                        color,
                    }),
                    ZoneShape::Polygon { points, .. } => {
                        for (i, a) in points.iter().enumerate() {
                            let b = points[(i + 1) % points.len()];
                            ctx.draw(&CanvasLine {
                                x1: a.x,
                                y1: flip(a.y),
                                x2: b.x,
                                y2: flip(b.y),
                                color,
                            });
                        }
                    }
                }
            }

            for (actor, color) in std::iter::once((&snap.player, Color::Yellow))
                .chain(snap.runners.iter().map(|r| (r, Color::LightRed)))
            {
                for pair in actor.line.windows(2) {
                    ctx.draw(&CanvasLine {
                        x1: pair[0].x,
                        y1: flip(pair[0].y),
                        x2: pair[1].x,
                        y2: flip(pair[1].y),
                        color,
                    });
                }
                if snap.snake.is_none() {
                    ctx.draw(&Circle {
                        x: actor.pos.x,
                        y: flip(actor.pos.y),
                        radius: actor.radius,
                        color,
                    });
                }
            }

            for item in &snap.items {
                let color = match item.kind {
                    CollectibleKind::Apple { .. } => Color::Red,
                    CollectibleKind::PowerUp { .. } => Color::Cyan,
                };
                ctx.draw(&Circle {
                    x: item.pos.x,
                    y: flip(item.pos.y),
                    radius: item.radius,
                    color,
                });
            }

            for enemy in &snap.enemies {
                ctx.draw(&Circle {
                    x: enemy.pos.x,
                    y: flip(enemy.pos.y),
                    radius: enemy.radius,
                    color: if enemy.boosted { Color::White } else { Color::Magenta },
                });
            }
        });
    frame.render_widget(board, layout[0]);

    let state = match (snap.status, snap.cause) {
        (GameStatus::Playing, _) => "playing".to_string(),
        (GameStatus::LevelComplete, _) => "LEVEL COMPLETE - n: next  r: again".to_string(),
        (GameStatus::GameOver, Some(cause)) => format!("GAME OVER ({}) - r: retry", cause.name()),
        (GameStatus::GameOver, None) => "GAME OVER - r: retry".to_string(),
    };
    let status = Paragraph::new(format!(
        "Score {}  Best {}  Coverage {:.1}%  Time {:.1}s  |  {}",
        snap.score,
        best,
        snap.coverage,
        snap.now_ms as f64 / 1000.0,
        state
    ))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)))
    .style(Style::default().fg(Color::White));
    frame.render_widget(status, layout[1]);
}

fn print_usage() {
    eprintln!("territory play - Play in the terminal");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    territory play [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -l, --level <id>     Starting level (default: 1)");
    eprintln!("    --seed <n>           RNG seed (default: random)");
    eprintln!("    --levels <file>      Level table in YAML or JSON");
    eprintln!("    --config <file>      Game settings in YAML or JSON");
    eprintln!();
    eprintln!("KEYS:");
    eprintln!("    arrows / WASD        Move");
    eprintln!("    space                Start or abandon a trail");
    eprintln!("    r                    Restart the level");
    eprintln!("    n                    Next level");
    eprintln!("    q / Esc              Quit");
}
