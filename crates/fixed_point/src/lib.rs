//! memtile Fixed-Point Codec
//!
//! Converts between real values, raw two's-complement integers and the
//! fixed-width binary/hex tokens written into accelerator mem files.

mod error;
mod fixed;
mod format;
mod matrix;
mod text;

pub use error::{FixedPointError, Result};
pub use fixed::{decode, encode, quantize, Fixed, Quantized};
pub use format::{FixedPointFormat, DEFAULT_FRACTIONAL_BITS, DEFAULT_TOTAL_BITS, MAX_TOTAL_BITS};
pub use matrix::QuantizedMatrix;
pub use text::{decode_token, encode_token, from_bits, from_hex, to_bits, to_hex, TokenEncoding};
