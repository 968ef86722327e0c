//! Render command: advance a level with the autopilot and draw the result.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use resvg::usvg;
use tiny_skia::Pixmap;

use territory::Snapshot;

use super::autopilot::pilot_for;
use super::common::{parse_value, snapshot_to_svg, take_value, GameOptions};

/// Rasterize SVG text at `scale`, on white.
pub fn svg_to_image(svg: &str, scale: f64) -> Result<RgbaImage> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options).context("failed to parse generated SVG")?;

    let size = tree.size();
    let width = (size.width() as f64 * scale).ceil() as u32;
    let height = (size.height() as f64 * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| anyhow!("could not create {}x{} pixmap", width, height))?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let transform = tiny_skia::Transform::from_scale(scale as f32, scale as f32);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    RgbaImage::from_raw(width, height, pixmap.take()).ok_or_else(|| anyhow!("pixmap size mismatch"))
}

/// Write a snapshot as SVG or PNG, picked by the file extension.
pub fn write_snapshot(snap: &Snapshot, path: &Path, scale: f64) -> Result<()> {
    let svg = snapshot_to_svg(snap);
    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        let image = svg_to_image(&svg, scale)?;
        image
            .save(path)
            .with_context(|| format!("failed writing {}", path.display()))?;
    } else {
        fs::write(path, svg).with_context(|| format!("failed writing {}", path.display()))?;
    }
    Ok(())
}

/// Execute the render command.
pub fn cmd_render(args: &[String]) -> Result<()> {
    let mut opts = GameOptions {
        ticks: 0,
        ..Default::default()
    };
    let mut output: Option<String> = None;
    let mut scale = 1.0;

    let mut i = 0;
    while i < args.len() {
        if opts.accept(args, &mut i)? {
            i += 1;
            continue;
        }
        match args[i].as_str() {
            "-o" | "--output" => output = Some(take_value(args, &mut i)?.to_string()),
            "-s" | "--scale" => scale = parse_value(args, &mut i)?,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(anyhow!("unexpected argument: {}", other)),
        }
        i += 1;
    }

    let output = output.ok_or_else(|| anyhow!("output file required (-o <file.svg|file.png>)"))?;
    if !(scale > 0.0 && scale <= 8.0) {
        return Err(anyhow!("--scale must be in (0, 8]"));
    }

    let seed = opts.seed();
    let mut game = opts.new_game(seed)?;
    let mut pilot = pilot_for(game.level());
    for _ in 0..opts.ticks {
        if game.status().is_terminal() {
            break;
        }
        let input = pilot.next_input(&game.snapshot());
        game.tick(&input);
    }

    write_snapshot(&game.snapshot(), Path::new(&output), scale)?;
    eprintln!("Wrote: {} (level {}, t={}ms)", output, opts.level, game.now_ms());
    Ok(())
}

fn print_usage() {
    eprintln!("territory render - Draw a level to SVG or PNG");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    territory render [OPTIONS] -o <file.svg|file.png>");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -l, --level <id>     Level to draw (default: 1)");
    eprintln!("    -t, --ticks <n>      Let the autopilot play this many ticks first (default: 0)");
    eprintln!("    --seed <n>           RNG seed (default: random)");
    eprintln!("    -s, --scale <f>      PNG scale factor (default: 1.0)");
    eprintln!("    --levels <file>      Level table in YAML or JSON");
    eprintln!("    --config <file>      Game settings in YAML or JSON");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_has_board_size_times_scale() {
        let game = GameOptions::default().new_game(1).unwrap();
        let image = svg_to_image(&snapshot_to_svg(&game.snapshot()), 0.5).unwrap();
        assert_eq!(image.dimensions(), (400, 300));
    }

    #[test]
    fn writes_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let snap = GameOptions::default().new_game(1).unwrap().snapshot();

        let svg_path = dir.path().join("board.svg");
        write_snapshot(&snap, &svg_path, 1.0).unwrap();
        assert!(fs::read_to_string(&svg_path).unwrap().contains("<svg"));

        let png_path = dir.path().join("board.png");
        write_snapshot(&snap, &png_path, 0.25).unwrap();
        let bytes = fs::read(&png_path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
