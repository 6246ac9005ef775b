//! Error types for agenda-engine operations.

use chrono::NaiveTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The slot table violates an ordering or tiling rule. Never recoverable.
    #[error("Invalid slot table: {0}")]
    SlotTable(String),

    /// A wall-clock time fell outside every extended slot range.
    #[error("No slot covers {time}; extended slot ranges must tile the whole day")]
    UnmappableTime { time: NaiveTime },

    #[error("Unknown slot: {0}")]
    UnknownSlot(String),

    #[error("Event has no slot assignment: {0}")]
    NotSlotted(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
