//! Fixed-point error types

use thiserror::Error;

use crate::text::TokenEncoding;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixedPointError {
    #[error(
        "Invalid fixed-point format: total_bits={total_bits}, fractional_bits={fractional_bits}, signed={signed}"
    )]
    InvalidFormat {
        total_bits: u32,
        fractional_bits: u32,
        signed: bool,
    },

    #[error("Invalid {encoding} token: {token:?}")]
    InvalidToken {
        token: String,
        encoding: TokenEncoding,
    },

    #[error("Token length mismatch: expected {expected} characters, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("Value {value} outside representable range [{min}, {max}]")]
    ValueOutOfRange { value: i128, min: i64, max: i64 },

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, FixedPointError>;
