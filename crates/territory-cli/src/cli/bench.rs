//! Bench command: tick throughput per level under the autopilot.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};

use territory::{Game, GameStatus};

use super::autopilot::pilot_for;
use super::common::{load_config, load_levels, parse_value, take_value};

/// Timing for one level.
#[derive(Clone, Debug)]
pub struct BenchRow {
    pub level: u32,
    pub title: String,
    pub ticks: u64,
    pub games: u32,
    pub elapsed: Duration,
}

impl BenchRow {
    pub fn ticks_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.ticks as f64 / secs } else { f64::INFINITY }
    }
}

/// Run `ticks` ticks on a level, starting a fresh game whenever one ends.
pub fn bench_level(make_game: impl Fn(u64) -> Result<Game>, ticks: u64) -> Result<BenchRow> {
    let mut seed = 1;
    let mut game = make_game(seed)?;
    let mut pilot = pilot_for(game.level());
    let mut games = 1;

    let start = Instant::now();
    for _ in 0..ticks {
        if game.status() != GameStatus::Playing {
            seed += 1;
            game = make_game(seed)?;
            pilot = pilot_for(game.level());
            games += 1;
        }
        let input = pilot.next_input(&game.snapshot());
        game.tick(&input);
    }
    let elapsed = start.elapsed();

    Ok(BenchRow {
        level: game.level().id,
        title: game.level().title.clone(),
        ticks,
        games,
        elapsed,
    })
}

/// Execute the bench command.
pub fn cmd_bench(args: &[String]) -> Result<()> {
    let mut ticks: u64 = 20_000;
    let mut levels_file: Option<String> = None;
    let mut config_file: Option<String> = None;
    let mut only: Option<u32> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-t" | "--ticks" => ticks = parse_value(args, &mut i)?,
            "-l" | "--level" => only = Some(parse_value(args, &mut i)?),
            "--levels" => levels_file = Some(take_value(args, &mut i)?.to_string()),
            "--config" => config_file = Some(take_value(args, &mut i)?.to_string()),
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(anyhow!("unexpected argument: {}", other)),
        }
        i += 1;
    }
    if ticks == 0 {
        return Err(anyhow!("--ticks must be > 0"));
    }

    let table = load_levels(levels_file.as_deref())?;
    let config = load_config(config_file.as_deref())?;
    let levels: Vec<_> = match only {
        Some(id) => vec![table.find(id)?.clone()],
        None => table.iter().cloned().collect(),
    };

    println!("Benchmarking {} level(s), {} ticks each...", levels.len(), ticks);

    let mut rows = Vec::with_capacity(levels.len());
    for level in &levels {
        let row = bench_level(|seed| Ok(Game::new(level.clone(), config.clone(), seed)?), ticks)?;
        rows.push(row);
    }

    let total_ticks: u64 = rows.iter().map(|r| r.ticks).sum();
    let total_time: Duration = rows.iter().map(|r| r.elapsed).sum();

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  TICK BENCHMARK");
    println!("═══════════════════════════════════════════════════════════════");
    println!("  {:>3}  {:<22} {:>6} {:>12} {:>12}", "ID", "LEVEL", "GAMES", "TIME", "TICKS/SEC");
    for row in &rows {
        println!(
            "  {:>3}  {:<22} {:>6} {:>10.1}ms {:>12.0}",
            row.level,
            row.title,
            row.games,
            row.elapsed.as_secs_f64() * 1000.0,
            row.ticks_per_sec()
        );
    }
    println!("───────────────────────────────────────────────────────────────");
    println!(
        "  Total: {} ticks in {:.1}ms ({:.0} ticks/sec)",
        total_ticks,
        total_time.as_secs_f64() * 1000.0,
        total_ticks as f64 / total_time.as_secs_f64().max(f64::EPSILON)
    );
    println!("═══════════════════════════════════════════════════════════════");
    Ok(())
}

fn print_usage() {
    eprintln!("territory bench - Measure simulation speed");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    territory bench [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -t, --ticks <n>      Ticks per level (default: 20000)");
    eprintln!("    -l, --level <id>     Only this level");
    eprintln!("    --levels <file>      Level table in YAML or JSON");
    eprintln!("    --config <file>      Game settings in YAML or JSON");
}

#[cfg(test)]
mod tests {
    use super::*;
    use territory::{GameConfig, LevelTable};

    #[test]
    fn bench_runs_the_requested_ticks() {
        let level = LevelTable::builtin().find(2).unwrap().clone();
        let row = bench_level(|seed| Ok(Game::new(level.clone(), GameConfig::default(), seed)?), 500).unwrap();
        assert_eq!(row.level, 2);
        assert_eq!(row.ticks, 500);
        assert!(row.games >= 1);
        assert!(row.ticks_per_sec() > 0.0);
    }
}
