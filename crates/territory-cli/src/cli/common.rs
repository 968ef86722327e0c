//! Common utilities shared across CLI commands.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use territory::game::SnakeView;
use territory::{
    CollectibleKind, EnemyBehavior, Game, GameConfig, LevelDescriptor, LevelTable, Point, PowerUpKind,
    Snapshot, ZoneShape,
};

/// Ticks simulated when `--ticks` is not given: one minute of game time.
pub const DEFAULT_TICKS: u64 = 6000;

/// File format, picked from the extension.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DataFormat {
    Yaml,
    Json,
}

impl DataFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_name)
            .unwrap_or(Self::Yaml)
    }
}

/// Options every game-running command understands.
#[derive(Clone, Debug)]
pub struct GameOptions {
    pub level: u32,
    pub levels_file: Option<String>,
    pub config_file: Option<String>,
    pub seed: Option<u64>,
    pub ticks: u64,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            level: 1,
            levels_file: None,
            config_file: None,
            seed: None,
            ticks: DEFAULT_TICKS,
        }
    }
}

impl GameOptions {
    /// Consume the option at `args[*i]` if it is a shared one.
    ///
    /// Returns `Ok(false)` for anything the caller has to handle itself.
    pub fn accept(&mut self, args: &[String], i: &mut usize) -> Result<bool> {
        match args[*i].as_str() {
            "-l" | "--level" => self.level = parse_value(args, i)?,
            "--levels" => self.levels_file = Some(take_value(args, i)?.to_string()),
            "--config" => self.config_file = Some(take_value(args, i)?.to_string()),
            "--seed" => self.seed = Some(parse_value(args, i)?),
            "-t" | "--ticks" => self.ticks = parse_value(args, i)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// The given seed, or a fresh random one.
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn levels(&self) -> Result<LevelTable> {
        load_levels(self.levels_file.as_deref())
    }

    pub fn config(&self) -> Result<GameConfig> {
        load_config(self.config_file.as_deref())
    }

    /// Build a game on the selected level.
    pub fn new_game(&self, seed: u64) -> Result<Game> {
        let levels = self.levels()?;
        let level = levels.find(self.level)?.clone();
        let config = self.config()?;
        Ok(Game::new(level, config, seed)?)
    }
}

/// The value following a flag.
pub fn take_value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} needs a value", flag))
}

pub fn parse_value<T>(args: &[String], i: &mut usize) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let flag = args[*i].clone();
    let raw = take_value(args, i)?;
    raw.parse()
        .with_context(|| format!("invalid value for {}: {}", flag, raw))
}

fn read_data<T: DeserializeOwned>(path: &str) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;
    let value = match DataFormat::from_path(Path::new(path)) {
        DataFormat::Yaml => serde_yaml::from_str(&text).with_context(|| format!("failed to parse {}", path))?,
        DataFormat::Json => serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path))?,
    };
    Ok(value)
}

/// On-disk level table: `levels:` followed by a list of descriptors.
#[derive(Deserialize)]
struct LevelFile {
    levels: Vec<LevelDescriptor>,
}

/// Load a level table from YAML or JSON, or the built-in table.
pub fn load_levels(path: Option<&str>) -> Result<LevelTable> {
    let Some(path) = path else {
        return Ok(LevelTable::builtin());
    };
    let file: LevelFile = read_data(path)?;
    if file.levels.is_empty() {
        bail!("{} defines no levels", path);
    }
    let table = LevelTable::new(file.levels).with_context(|| format!("invalid level table in {}", path))?;
    debug!(path, levels = table.len(), "loaded level table");
    Ok(table)
}

/// Load game settings, falling back to defaults for anything missing.
pub fn load_config(path: Option<&str>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let config: GameConfig = read_data(path)?;
    config.validate().with_context(|| format!("invalid settings in {}", path))?;
    debug!(path, "loaded game settings");
    Ok(config)
}

fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn enemy_color(behavior: &EnemyBehavior) -> &'static str {
    match behavior {
        EnemyBehavior::Roamer => "#e53935",
        EnemyBehavior::Drifter => "#8e24aa",
        EnemyBehavior::Fleeing { .. } => "#fb8c00",
        EnemyBehavior::Ghost { .. } => "#3949ab",
    }
}

fn power_up_color(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::Rabbit => "#00acc1",
        PowerUpKind::Turtle => "#6d4c41",
        PowerUpKind::Star => "#fdd835",
    }
}

fn snake_to_svg(svg: &mut String, snake: &SnakeView, width: f64, height: f64) {
    let cw = width / snake.cols as f64;
    let ch = height / snake.rows as f64;
    let mut cell = |col: i32, row: i32, fill: &str| {
        let _ = writeln!(
            svg,
            "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            col as f64 * cw,
            row as f64 * ch,
            cw,
            ch,
            fill
        );
    };
    for wall in &snake.walls {
        cell(wall.cell.col, wall.cell.row, "#616161");
    }
    if let Some(apple) = snake.apple {
        cell(apple.col, apple.row, "#e53935");
    }
    for (i, body) in snake.body.iter().enumerate() {
        cell(body.col, body.row, if i == 0 { "#1b5e20" } else { "#43a047" });
    }
}

/// Draw a snapshot as a standalone SVG document in board coordinates.
pub fn snapshot_to_svg(snap: &Snapshot) -> String {
    let (w, h) = (snap.board_width, snap.board_height);
    let mut svg = String::new();
    let _ = write!(
        svg,
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w:.0} {h:.0}" width="{w:.0}" height="{h:.0}">
  <rect x="0" y="0" width="{w:.0}" height="{h:.0}" fill="#101418"/>
"##
    );

    if let Some(snake) = &snap.snake {
        snake_to_svg(&mut svg, snake, w, h);
    }

    svg.push_str("<g stroke=\"#2e7d32\" stroke-width=\"1\">\n");
    for zone in &snap.zones {
        let fill = if zone.is_temporary() { "#9ccc65" } else { "#388e3c" };
        match &zone.shape {
            ZoneShape::Rectangle(r) => {
                let _ = writeln!(
                    svg,
                    "  <rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
                    r.x, r.y, r.width, r.height, fill
                );
            }
            ZoneShape::Polygon { points, .. } => {
                let _ = writeln!(svg, "  <polygon points=\"{}\" fill=\"{}\"/>", polygon_points(points), fill);
            }
        }
    }
    svg.push_str("</g>\n");

    svg.push_str("<g fill=\"none\" stroke-width=\"2\" stroke-linecap=\"round\">\n");
    let trails = std::iter::once((&snap.player, "#fdd835")).chain(snap.runners.iter().map(|r| (r, "#ff7043")));
    for (actor, color) in trails {
        if actor.line.len() < 2 {
            continue;
        }
        let mut points = actor.line.clone();
        points.push(actor.pos);
        let _ = writeln!(svg, "  <polyline points=\"{}\" stroke=\"{}\"/>", polygon_points(&points), color);
    }
    svg.push_str("</g>\n");

    for item in &snap.items {
        let color = match item.kind {
            CollectibleKind::Apple { .. } => "#c62828",
            CollectibleKind::PowerUp { power, .. } => power_up_color(power),
        };
        let _ = writeln!(
            svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>",
            item.pos.x, item.pos.y, item.radius, color
        );
    }

    for enemy in &snap.enemies {
        let stroke = if enemy.boosted { " stroke=\"#ffffff\" stroke-width=\"2\"" } else { "" };
        let _ = writeln!(
            svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"{}/>",
            enemy.pos.x,
            enemy.pos.y,
            enemy.radius,
            enemy_color(&enemy.behavior),
            stroke
        );
    }

    for runner in &snap.runners {
        let _ = writeln!(
            svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"#ff7043\"/>",
            runner.pos.x, runner.pos.y, runner.radius
        );
    }

    if snap.snake.is_none() {
        let _ = writeln!(
            svg,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"#fdd835\" stroke=\"#000000\"/>",
            snap.player.pos.x, snap.player.pos.y, snap.player.radius
        );
    }

    let _ = writeln!(
        svg,
        "<text x=\"8\" y=\"20\" font-family=\"sans-serif\" font-size=\"14\" fill=\"#ffffff\">Level {} | score {} | {:.1}%</text>",
        snap.level, snap.score, snap.coverage
    );

    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn shared_options_are_consumed() {
        let args = args(&["-l", "4", "--seed", "9", "--ticks", "50", "-o", "out.json"]);
        let mut opts = GameOptions::default();
        let mut rest = Vec::new();
        let mut i = 0;
        while i < args.len() {
            if !opts.accept(&args, &mut i).unwrap() {
                rest.push(args[i].clone());
            }
            i += 1;
        }
        assert_eq!(opts.level, 4);
        assert_eq!(opts.seed, Some(9));
        assert_eq!(opts.ticks, 50);
        assert_eq!(rest, vec!["-o", "out.json"]);
    }

    #[test]
    fn missing_or_bad_values_are_errors() {
        let mut opts = GameOptions::default();
        assert!(opts.accept(&args(&["--seed"]), &mut 0).is_err());
        assert!(opts.accept(&args(&["--level", "x"]), &mut 0).is_err());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(DataFormat::from_path(Path::new("a.json")), DataFormat::Json);
        assert_eq!(DataFormat::from_path(Path::new("a.yml")), DataFormat::Yaml);
        assert_eq!(DataFormat::from_path(Path::new("levels")), DataFormat::Yaml);
    }

    #[test]
    fn builtin_table_without_a_file() {
        assert_eq!(load_levels(None).unwrap().len(), 21);
        assert_eq!(load_config(None).unwrap(), GameConfig::default());
    }

    #[test]
    fn svg_shows_zones_and_enemies() {
        let game = GameOptions { level: 3, ..Default::default() }.new_game(1).unwrap();
        let svg = snapshot_to_svg(&game.snapshot());
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("viewBox=\"0 0 800 600\""));
        assert_eq!(svg.matches("fill=\"#e53935\"").count(), 4);
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn svg_draws_snake_cells() {
        let game = GameOptions { level: 20, ..Default::default() }.new_game(1).unwrap();
        let svg = snapshot_to_svg(&game.snapshot());
        assert!(svg.contains("#1b5e20"));
        assert_eq!(svg.matches("fill=\"#43a047\"").count(), 2);
    }
}
