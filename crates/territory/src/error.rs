//! Error types.
//!
//! Geometry never fails and fatal game events are status transitions, so the
//! only errors that leave the crate come from loading bad configuration.

use thiserror::Error;

/// Problems with a level descriptor or the level table.
#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    /// No level with that id in the table
    #[error("unknown level: {0}")]
    UnknownLevel(u32),

    /// Level ids must be unique within a table
    #[error("duplicate level id: {0}")]
    DuplicateLevel(u32),

    /// A field holds a value the simulation can't use
    #[error("level {level}: invalid {field}: {reason}")]
    InvalidDescriptor {
        level: u32,
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems with the game tunables.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Board dimensions must be positive and finite
    #[error("invalid board size: {width}x{height}")]
    InvalidBoard { width: f64, height: f64 },

    /// Tick length of zero would stall every countdown
    #[error("tick length must be positive")]
    ZeroTick,

    /// A repeating timer with no period would fire every tick
    #[error("{name} must be positive")]
    ZeroInterval { name: &'static str },

    /// A speed, radius or multiplier outside its usable range
    #[error("invalid {name}: {value}")]
    OutOfRange { name: &'static str, value: f64 },
}

/// Internal merge failures. Always recovered by appending the candidate.
#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    /// The merge group's combined bounds came out non-finite
    #[error("merged zone has invalid bounds")]
    InvalidBounds,

    /// Not enough distinct points survived to form a polygon
    #[error("not enough points for merged zone ({0})")]
    TooFewPoints(usize),
}
