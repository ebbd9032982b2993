use thiserror::Error;

/// Errors surfaced by the engine's public operations.
#[derive(Error, Debug)]
pub enum NeatError {
    /// A configuration key is missing, ill-typed or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feed-forward was given the wrong number of inputs.
    #[error("input shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// A snapshot is missing fields or references unknown nodes.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// Every species died out and resetting is disabled.
    #[error("population has no species left and reset_on_extinction is disabled")]
    EmptyPopulation,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NeatError>;
