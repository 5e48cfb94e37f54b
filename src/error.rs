//! Error types
//!
//! Configuration problems are rejected before any tick executes. The tick path
//! itself never returns errors.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid session or driver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("gap size must be positive and finite, got {0}")]
    InvalidGap(f32),
    #[error("score cap must be non-zero")]
    InvalidScoreCap,
    #[error("gap center range [{min}, {max}) is empty")]
    EmptyGapRange { min: i32, max: i32 },
    #[error("scroll velocity must be positive and finite, got {0}")]
    InvalidScrollVelocity(f32),
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f32 },
    #[error("ground tile width must be positive, got {0}")]
    InvalidTileWidth(f32),
    #[error("{0} silhouette has no occupied cells")]
    EmptySilhouette(&'static str),
    #[error("population must contain at least one decision function")]
    EmptyPopulation,
    #[error("generation count must be non-zero")]
    InvalidGenerations,
    #[error("ticks per second must be positive when pacing is enabled")]
    InvalidPacing,
    #[error("decision function {index} is malformed: {reason}")]
    MalformedDecisionFunction { index: usize, reason: DecisionError },
}

/// Failure inside a decision function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecisionError {
    #[error("evaluation failed: {0}")]
    Evaluation(String),
    #[error("non-finite output {0}")]
    NonFinite(f32),
    #[error("{0}")]
    Malformed(String),
}

/// Failure while writing or reading persisted winners.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid winner record: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported winner record version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("no readable winner record at {} or its backup", .0.display())]
    Missing(PathBuf),
}

/// Failure that aborts a multi-generation run.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
