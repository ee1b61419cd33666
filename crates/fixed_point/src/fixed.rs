//! Fixed-point scalar codec

use crate::error::Result;
use crate::format::FixedPointFormat;
use crate::text::{self, TokenEncoding};

/// Outcome of quantizing one real value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantized {
    /// Raw signed integer, inside the format's range
    pub raw: i64,
    /// True if the scaled value fell outside the range and was clamped
    pub saturated: bool,
}

/// Quantize a real value: scale by `2^fractional_bits`, round half away from
/// zero, then saturate to `[min_int, max_int]`. NaN maps to zero.
pub fn quantize(real: f64, fmt: &FixedPointFormat) -> Quantized {
    let scaled = (real * fmt.scale_factor()).round();
    if scaled.is_nan() {
        return Quantized {
            raw: 0,
            saturated: false,
        };
    }

    let (min, max) = (fmt.min_int(), fmt.max_int());
    if scaled < min as f64 {
        Quantized {
            raw: min,
            saturated: true,
        }
    } else if scaled > max as f64 {
        Quantized {
            raw: max,
            saturated: true,
        }
    } else {
        // `as` saturates, which covers 2^63 rounding up from i64::MAX
        Quantized {
            raw: (scaled as i64).clamp(min, max),
            saturated: false,
        }
    }
}

/// Real → raw integer. Out-of-range values are clamped silently, matching
/// hardware saturation.
pub fn encode(real: f64, fmt: &FixedPointFormat) -> i64 {
    quantize(real, fmt).raw
}

/// Raw integer → real. Exact for every value produced by [`encode`].
pub fn decode(value: i64, fmt: &FixedPointFormat) -> f64 {
    value as f64 / fmt.scale_factor()
}

/// A raw fixed-point value paired with its format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fixed {
    /// The raw integer value
    pub raw: i64,
    /// Format the raw value is expressed in
    pub format: FixedPointFormat,
}

impl Fixed {
    /// Wrap a raw integer, rejecting values outside the format's range
    pub fn from_raw(raw: i64, format: FixedPointFormat) -> Result<Self> {
        text::check_range(raw as i128, &format)?;
        Ok(Self { raw, format })
    }

    /// Quantize a real value (saturating)
    pub fn from_f64(value: f64, format: FixedPointFormat) -> Self {
        Self {
            raw: encode(value, &format),
            format,
        }
    }

    /// Convert back to floating-point
    pub fn to_f64(self) -> f64 {
        decode(self.raw, &self.format)
    }

    /// Zero in the given format
    pub fn zero(format: FixedPointFormat) -> Self {
        Self { raw: 0, format }
    }

    /// Parse a single text token
    pub fn from_token(token: &str, encoding: TokenEncoding, format: FixedPointFormat) -> Result<Self> {
        let raw = text::decode_token(token, encoding, &format)?;
        Ok(Self { raw, format })
    }

    /// Render as a single text token
    pub fn to_token(self, encoding: TokenEncoding) -> String {
        text::encode_token(self.raw, encoding, &self.format)
    }
}

impl std::fmt::Display for Fixed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.to_f64())
    }
}
