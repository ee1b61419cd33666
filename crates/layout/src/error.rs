//! Layout error types

use thiserror::Error;

use memtile_fixed_point::FixedPointError;

/// Matrix axis named in divisibility errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Rows,
    Cols,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Rows => write!(f, "rows"),
            Axis::Cols => write!(f, "cols"),
        }
    }
}

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Dimension mismatch: {axis} ({size}) not divisible by {divisor}")]
    DimensionMismatch { axis: Axis, size: usize, divisor: usize },

    #[error("Empty input: no rows or lines")]
    EmptyInput,

    #[error("Cannot determine layout role for {name:?}; supply it explicitly")]
    RoleAmbiguous { name: String },

    #[error("Line count mismatch: expected {expected}, got {got}")]
    LineCountMismatch { expected: usize, got: usize },

    #[error("Token count mismatch on line {line}: expected {expected}, got {got}")]
    TokenCountMismatch { line: usize, expected: usize, got: usize },

    #[error("Line {line}: {source}")]
    Token {
        line: usize,
        #[source]
        source: FixedPointError,
    },

    #[error("Invalid layout spec: {0}")]
    InvalidSpec(String),

    #[error("Line count {lines} not divisible by group size {group_size}")]
    InvalidGroupSize { lines: usize, group_size: usize },

    #[error("Fixed-point error: {0}")]
    FixedPoint(#[from] FixedPointError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl LayoutError {
    pub(crate) fn rows_not_divisible(size: usize, divisor: usize) -> Self {
        LayoutError::DimensionMismatch {
            axis: Axis::Rows,
            size,
            divisor,
        }
    }

    pub(crate) fn cols_not_divisible(size: usize, divisor: usize) -> Self {
        LayoutError::DimensionMismatch {
            axis: Axis::Cols,
            size,
            divisor,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
