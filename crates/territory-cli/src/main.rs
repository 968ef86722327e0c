//! territory - run, render and play the territory-capture game core
//!
//! Usage:
//!   territory levels [--levels <file>] [--dump yaml|json]
//!   territory run [-l <level>] [--seed <n>] [--ticks <n>] [-o <report.json>]
//!   territory render [-l <level>] [--ticks <n>] -o <out.svg|out.png>
//!   territory bench [--ticks <n>]
//!   territory play [-l <level>] [--seed <n>]

use std::env;

use tracing_subscriber::filter::EnvFilter;

mod cli;

fn main() {
    // Logs go to stderr so reports on stdout stay machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("territory");

    let Some(command) = args.get(1) else {
        print_usage(prog);
        std::process::exit(1);
    };

    let rest = &args[2..];
    let result = match command.as_str() {
        "levels" => cli::cmd_levels(rest),
        "run" => cli::cmd_run(rest),
        "render" => cli::cmd_render(rest),
        "bench" | "benchmark" => cli::cmd_bench(rest),
        "play" => cli::cmd_play(rest),
        "help" | "--help" | "-h" => {
            print_usage(prog);
            return;
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage(prog);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("territory - territory-capture arcade game core");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} levels [--levels <file>] [--dump yaml|json]", prog);
    eprintln!("  {} run [options] [-o <report.json>]", prog);
    eprintln!("  {} render [options] -o <out.svg|out.png>", prog);
    eprintln!("  {} bench [--ticks <n>]", prog);
    eprintln!("  {} play [-l <level>] [--seed <n>]", prog);
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  -l, --level <id>       Level to load (default: 1)");
    eprintln!("  --levels <file>        Level table in YAML or JSON (default: built-in)");
    eprintln!("  --config <file>        Game settings in YAML or JSON");
    eprintln!("  --seed <n>             RNG seed (default: random)");
    eprintln!("  --ticks <n>            Ticks to simulate (default: 6000 = 60 s)");
    eprintln!();
    eprintln!("Logging:");
    eprintln!("  RUST_LOG=territory=debug {} run -l 4", prog);
    eprintln!();
    eprintln!("Play controls:");
    eprintln!("  arrows / WASD   Move");
    eprintln!("  space           Start or abandon a trail");
    eprintln!("  n / r           Next level / restart");
    eprintln!("  q / Esc         Quit");
}
