//! Run command: play one level with a scripted pilot and report how it went.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;

use territory::{DeathCause, Game, GameEvent, GameStatus};

use super::autopilot::pilot_for;
use super::common::{take_value, GameOptions};

/// Outcome of one scripted run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub generated_at: String,
    pub level: u32,
    pub title: String,
    pub pilot: String,
    pub seed: u64,
    pub max_ticks: u64,
    pub ticks: u64,
    pub sim_ms: u64,
    pub status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<DeathCause>,
    pub score: u64,
    pub coverage: f64,
    pub zones: usize,
    pub enemies_left: usize,
    /// How many of each event kind the run produced.
    pub events: BTreeMap<String, u64>,
}

fn event_name(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::ZoneClosed { .. } => "zone_closed",
        GameEvent::EnemyCaptured { .. } => "enemy_captured",
        GameEvent::EnemyEaten { .. } => "enemy_eaten",
        GameEvent::ItemCollected { .. } => "item_collected",
        GameEvent::RunnerCaught { .. } => "runner_caught",
        GameEvent::ZonesExpired { .. } => "zones_expired",
        GameEvent::LevelCompleted { .. } => "level_completed",
        GameEvent::GameOver { .. } => "game_over",
    }
}

/// Drive `game` with the pilot for its level until it ends or `max_ticks` pass.
pub fn run_game(game: &mut Game, seed: u64, max_ticks: u64) -> Result<RunReport> {
    if max_ticks == 0 {
        return Err(anyhow!("--ticks must be > 0"));
    }

    let mut pilot = pilot_for(game.level());
    let mut events = BTreeMap::new();
    let mut ticks = 0;
    while ticks < max_ticks && !game.status().is_terminal() {
        let input = pilot.next_input(&game.snapshot());
        let outcome = game.tick(&input);
        for event in &outcome.events {
            *events.entry(event_name(event).to_string()).or_insert(0) += 1;
        }
        ticks += 1;
    }

    Ok(RunReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        level: game.level().id,
        title: game.level().title.clone(),
        pilot: pilot.id().to_string(),
        seed,
        max_ticks,
        ticks,
        sim_ms: game.now_ms(),
        status: game.status(),
        cause: game.death_cause(),
        score: game.score(),
        coverage: game.coverage(),
        zones: game.zones().len(),
        enemies_left: game.enemies().len(),
        events,
    })
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json + "\n").with_context(|| format!("failed writing {}", path.display()))
}

/// Execute the run command.
pub fn cmd_run(args: &[String]) -> Result<()> {
    let mut opts = GameOptions::default();
    let mut output: Option<String> = None;
    let mut json = false;

    let mut i = 0;
    while i < args.len() {
        if opts.accept(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "-o" | "--output" => output = Some(take_value(args, &mut i)?.to_string()),
            "--json" => json = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(anyhow!("unexpected argument: {}", other)),
        }
        i += 1;
    }

    let seed = opts.seed();
    let mut game = opts.new_game(seed)?;
    info!(level = opts.level, seed, "starting scripted run");
    let report = run_game(&mut game, seed, opts.ticks)?;

    if let Some(path) = &output {
        write_report(Path::new(path), &report)?;
        eprintln!("Wrote: {}", path);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("═══════════════════════════════════════════════");
    println!("  LEVEL {}: {}", report.level, report.title.to_uppercase());
    println!("═══════════════════════════════════════════════");
    println!("  Pilot:      {}", report.pilot);
    println!("  Seed:       {}", report.seed);
    println!("  Ticks:      {} ({:.1}s simulated)", report.ticks, report.sim_ms as f64 / 1000.0);
    match report.cause {
        Some(cause) => println!("  Result:     game over ({})", cause.name()),
        None if report.status == GameStatus::LevelComplete => println!("  Result:     level complete"),
        None => println!("  Result:     still playing"),
    }
    println!("  Score:      {}", report.score);
    println!("  Coverage:   {:.1}%", report.coverage);
    println!("  Zones:      {}", report.zones);
    println!("  Enemies:    {}", report.enemies_left);
    for (name, count) in &report.events {
        println!("  {:<11} {}", format!("{}:", name), count);
    }
    println!("═══════════════════════════════════════════════");
    Ok(())
}

fn print_usage() {
    eprintln!("territory run - Play a level with the autopilot");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    territory run [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -l, --level <id>     Level to play (default: 1)");
    eprintln!("    --levels <file>      Level table in YAML or JSON");
    eprintln!("    --config <file>      Game settings in YAML or JSON");
    eprintln!("    --seed <n>           RNG seed (default: random)");
    eprintln!("    -t, --ticks <n>      Tick limit (default: 6000)");
    eprintln!("    -o, --output <file>  Write the report as JSON");
    eprintln!("    --json               Print the report as JSON instead of a table");
}
