//! Integration tests for territory CLI commands.
//!
//! These tests run the actual binary and verify end-to-end behavior.

use std::fs;
use std::process::{Command, Output};

fn territory(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_territory"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

#[test]
fn levels_command_lists_every_level() {
    let output = territory(&["levels"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Foundation"), "Should list level 1");
    assert!(stdout.contains("Endless Snake"), "Should list level 21");
    assert_eq!(stdout.lines().count(), 22, "Header plus 21 levels");
}

#[test]
fn run_command_writes_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report.json");

    let output = territory(&[
        "run",
        "-l",
        "2",
        "--seed",
        "11",
        "--ticks",
        "500",
        "-o",
        report.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SHAPES EMERGE"));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["level"], 2);
    assert_eq!(json["seed"], 11);
    assert!(json["ticks"].as_u64().unwrap() <= 500);
}

#[test]
fn run_is_reproducible_with_a_seed() {
    let args = ["run", "-l", "8", "--seed", "5", "--ticks", "800", "--json"];
    let a: serde_json::Value = serde_json::from_slice(&territory(&args).stdout).unwrap();
    let b: serde_json::Value = serde_json::from_slice(&territory(&args).stdout).unwrap();
    for key in ["ticks", "score", "coverage", "status", "events"] {
        assert_eq!(a[key], b[key], "{} differs between runs", key);
    }
}

#[test]
fn render_command_writes_svg_and_png() {
    let dir = tempfile::tempdir().unwrap();
    let svg = dir.path().join("board.svg");
    let png = dir.path().join("board.png");

    let output = territory(&["render", "-l", "16", "--seed", "1", "--ticks", "50", "-o", svg.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(fs::read_to_string(&svg).unwrap().contains("</svg>"));

    let output = territory(&["render", "-l", "20", "-s", "0.5", "-o", png.to_str().unwrap()]);
    assert!(output.status.success());
    let bytes = fs::read(&png).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn custom_level_file_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let levels = dir.path().join("levels.yaml");
    fs::write(
        &levels,
        "levels:\n  - id: 42\n    title: Tiny Test\n    enemy_count: 1\n    enemy_placement:\n      kind: fixed\n",
    )
    .unwrap();

    let output = territory(&["levels", "--levels", levels.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Tiny Test"));

    let output = territory(&["run", "--levels", levels.to_str().unwrap(), "-l", "42", "--ticks", "100", "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["level"], 42);
}

#[test]
fn unknown_level_fails() {
    let output = territory(&["run", "-l", "99"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("99"));
}

#[test]
fn unknown_command_fails() {
    let output = territory(&["juggle"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown command"));
}
