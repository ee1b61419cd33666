//! Fixed-point number format (Q-format) description

use serde::{Deserialize, Serialize};

use crate::error::{FixedPointError, Result};

/// Widest supported word. Unsigned formats top out one bit lower because
/// raw values are carried as `i64`.
pub const MAX_TOTAL_BITS: u32 = 64;

/// Default word width used by the accelerator (Q8.8)
pub const DEFAULT_TOTAL_BITS: u32 = 16;

/// Default fractional bits used by the accelerator (Q8.8)
pub const DEFAULT_FRACTIONAL_BITS: u32 = 8;

/// A fixed-width two's-complement (or unsigned) fixed-point format.
///
/// A raw integer `v` represents the real value `v / 2^fractional_bits`.
/// Construct through [`FixedPointFormat::new`]; the fields are private so a
/// format that exists is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFormat", into = "RawFormat")]
pub struct FixedPointFormat {
    total_bits: u32,
    fractional_bits: u32,
    signed: bool,
}

impl FixedPointFormat {
    /// Create a format, checking `0 < fractional_bits <= total_bits <= 64`
    /// (`<= 63` when unsigned).
    pub fn new(total_bits: u32, fractional_bits: u32, signed: bool) -> Result<Self> {
        let max_bits = if signed {
            MAX_TOTAL_BITS
        } else {
            MAX_TOTAL_BITS - 1
        };
        if fractional_bits == 0 || fractional_bits > total_bits || total_bits > max_bits {
            return Err(FixedPointError::InvalidFormat {
                total_bits,
                fractional_bits,
                signed,
            });
        }
        Ok(Self {
            total_bits,
            fractional_bits,
            signed,
        })
    }

    /// Signed Q-format with `total_bits - fractional_bits` integer bits
    pub fn signed(total_bits: u32, fractional_bits: u32) -> Result<Self> {
        Self::new(total_bits, fractional_bits, true)
    }

    /// Unsigned Q-format
    pub fn unsigned(total_bits: u32, fractional_bits: u32) -> Result<Self> {
        Self::new(total_bits, fractional_bits, false)
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn fractional_bits(&self) -> u32 {
        self.fractional_bits
    }

    pub fn integer_bits(&self) -> u32 {
        self.total_bits - self.fractional_bits
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// `2^fractional_bits`
    pub fn scale_factor(&self) -> f64 {
        2f64.powi(self.fractional_bits as i32)
    }

    /// Quantization step, `2^-fractional_bits`
    pub fn step(&self) -> f64 {
        1.0 / self.scale_factor()
    }

    /// Smallest representable raw integer
    pub fn min_int(&self) -> i64 {
        if self.signed {
            (-(1i128 << (self.total_bits - 1))) as i64
        } else {
            0
        }
    }

    /// Largest representable raw integer
    pub fn max_int(&self) -> i64 {
        if self.signed {
            ((1i128 << (self.total_bits - 1)) - 1) as i64
        } else {
            ((1i128 << self.total_bits) - 1) as i64
        }
    }

    /// Check whether a raw integer lies in `[min_int, max_int]`
    pub fn contains(&self, value: i64) -> bool {
        (self.min_int()..=self.max_int()).contains(&value)
    }

    /// Width of a binary token in characters
    pub fn bit_width(&self) -> usize {
        self.total_bits as usize
    }

    /// Width of a hex token in characters, `ceil(total_bits / 4)`
    pub fn hex_width(&self) -> usize {
        self.total_bits.div_ceil(4) as usize
    }

    /// Bit mask covering one word
    pub(crate) fn word_mask(&self) -> u64 {
        if self.total_bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.total_bits) - 1
        }
    }
}

impl Default for FixedPointFormat {
    fn default() -> Self {
        Self {
            total_bits: DEFAULT_TOTAL_BITS,
            fractional_bits: DEFAULT_FRACTIONAL_BITS,
            signed: true,
        }
    }
}

impl std::fmt::Display for FixedPointFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = if self.signed { "Q" } else { "UQ" };
        write!(f, "{}{}.{}", prefix, self.integer_bits(), self.fractional_bits)
    }
}

/// Unchecked serde mirror of [`FixedPointFormat`]
#[derive(Serialize, Deserialize)]
struct RawFormat {
    total_bits: u32,
    fractional_bits: u32,
    #[serde(default = "default_signed")]
    signed: bool,
}

fn default_signed() -> bool {
    true
}

impl TryFrom<RawFormat> for FixedPointFormat {
    type Error = FixedPointError;

    fn try_from(raw: RawFormat) -> Result<Self> {
        Self::new(raw.total_bits, raw.fractional_bits, raw.signed)
    }
}

impl From<FixedPointFormat> for RawFormat {
    fn from(fmt: FixedPointFormat) -> Self {
        Self {
            total_bits: fmt.total_bits,
            fractional_bits: fmt.fractional_bits,
            signed: fmt.signed,
        }
    }
}
