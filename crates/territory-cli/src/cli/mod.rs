//! CLI command implementations.
//!
//! - `levels` - list or dump the level table
//! - `run` - play a level with the autopilot and report the result
//! - `render` - draw a game snapshot to SVG or PNG
//! - `bench` - measure tick throughput on every level
//! - `play` - interactive terminal front end

pub mod autopilot;
pub mod bench;
pub mod common;
pub mod levels;
pub mod play;
pub mod render;
pub mod run;

pub use bench::cmd_bench;
pub use levels::cmd_levels;
pub use play::cmd_play;
pub use render::cmd_render;
pub use run::cmd_run;
