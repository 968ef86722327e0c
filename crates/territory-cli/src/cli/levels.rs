//! Levels command: list the level table or dump it for editing.

use anyhow::{anyhow, Result};

use territory::{CompletionPredicate, LevelDescriptor, LevelTable};

use super::common::{load_levels, take_value, DataFormat};

/// Execute the levels command.
pub fn cmd_levels(args: &[String]) -> Result<()> {
    let mut levels_file: Option<String> = None;
    let mut dump: Option<DataFormat> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--levels" => levels_file = Some(take_value(args, &mut i)?.to_string()),
            "--dump" => {
                let name = take_value(args, &mut i)?;
                dump = Some(DataFormat::from_name(name).ok_or_else(|| anyhow!("unknown dump format: {}", name))?);
            }
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(anyhow!("unexpected argument: {}", other)),
        }
        i += 1;
    }

    let table = load_levels(levels_file.as_deref())?;
    match dump {
        Some(format) => print!("{}", dump_table(&table, format)?),
        None => print!("{}", level_listing(&table)),
    }
    Ok(())
}

/// Serialize the table so it can be edited and loaded back with `--levels`.
pub fn dump_table(table: &LevelTable, format: DataFormat) -> Result<String> {
    Ok(match format {
        DataFormat::Yaml => serde_yaml::to_string(table)?,
        DataFormat::Json => serde_json::to_string_pretty(table)? + "\n",
    })
}

fn goal(level: &LevelDescriptor) -> String {
    match level.completion {
        CompletionPredicate::Coverage { percent } => format!("{:.0}% coverage", percent),
        CompletionPredicate::ScaledCoverage { .. } => "100% (scaled)".to_string(),
        CompletionPredicate::CoverageOrCleared { percent } => format!("{:.0}% or empty board", percent),
        CompletionPredicate::CoverageOrEnemiesCleared { percent } => format!("{:.0}% or no enemies", percent),
        CompletionPredicate::CoverageAndEnemiesCleared { percent } => format!("{:.0}% and no enemies", percent),
        CompletionPredicate::EnemiesCleared => "capture every enemy".to_string(),
        CompletionPredicate::ScoreTarget { score } => format!("score {}", score),
        CompletionPredicate::CatchRunner => "catch the runner".to_string(),
        CompletionPredicate::CoverageOrRunnersCaught { percent } => format!("{:.0}% or catch runners", percent),
        CompletionPredicate::SnakeLength { length } => format!("length {}", length),
        CompletionPredicate::SnakeFill => "fill the board".to_string(),
    }
}

/// One line per level: id, title, enemies, goal.
pub fn level_listing(table: &LevelTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>3}  {:<22} {:>7}  {}\n", "ID", "TITLE", "ENEMIES", "GOAL"));
    for level in table.iter() {
        out.push_str(&format!(
            "{:>3}  {:<22} {:>7}  {}\n",
            level.id,
            level.title,
            level.enemy_count,
            goal(level)
        ));
    }
    out
}

fn print_usage() {
    eprintln!("territory levels - List the level table");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    territory levels [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    --levels <file>     Read levels from YAML or JSON instead of the built-in table");
    eprintln!("    --dump yaml|json    Print the full table instead of a summary");
}
