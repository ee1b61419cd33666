//! Text encoding of raw fixed-point words
//!
//! Tokens are fixed width and never carry a sign character: negative values
//! are written as their two's-complement word (`value + 2^total_bits`).
//!
//! | Encoding | Width                  | Alphabet          |
//! |----------|------------------------|-------------------|
//! | Binary   | `total_bits`           | `0`, `1`          |
//! | Hex      | `ceil(total_bits / 4)` | `0-9`, `A-F`      |
//!
//! Hex output is uppercase; hex input is accepted in either case.

use serde::{Deserialize, Serialize};

use crate::error::{FixedPointError, Result};
use crate::format::FixedPointFormat;

/// Alphabet used for the tokens of a mem file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEncoding {
    /// `'0'`/`'1'` characters, MSB first
    #[default]
    Binary,
    /// Uppercase hexadecimal digits, MSB first
    Hex,
}

impl TokenEncoding {
    /// Width in characters of one token under `fmt`
    pub fn token_width(self, fmt: &FixedPointFormat) -> usize {
        match self {
            TokenEncoding::Binary => fmt.bit_width(),
            TokenEncoding::Hex => fmt.hex_width(),
        }
    }

    fn radix(self) -> u32 {
        match self {
            TokenEncoding::Binary => 2,
            TokenEncoding::Hex => 16,
        }
    }

    fn accepts(self, c: char) -> bool {
        match self {
            TokenEncoding::Binary => c == '0' || c == '1',
            TokenEncoding::Hex => c.is_ascii_hexdigit(),
        }
    }
}

impl std::fmt::Display for TokenEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenEncoding::Binary => write!(f, "binary"),
            TokenEncoding::Hex => write!(f, "hex"),
        }
    }
}

impl std::str::FromStr for TokenEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" => Ok(TokenEncoding::Binary),
            "hex" => Ok(TokenEncoding::Hex),
            other => Err(format!("unknown token encoding: {}", other)),
        }
    }
}

/// Fail with `ValueOutOfRange` unless `value` fits `fmt`
pub(crate) fn check_range(value: i128, fmt: &FixedPointFormat) -> Result<()> {
    let (min, max) = (fmt.min_int(), fmt.max_int());
    if value < min as i128 || value > max as i128 {
        return Err(FixedPointError::ValueOutOfRange { value, min, max });
    }
    Ok(())
}

/// Raw value → unsigned word of `total_bits` bits (two's complement when negative)
fn to_word(value: i64, fmt: &FixedPointFormat) -> u64 {
    (value as u64) & fmt.word_mask()
}

/// Unsigned word → raw value, sign-extending when the format is signed
fn from_word(word: u64, fmt: &FixedPointFormat) -> i64 {
    let total = fmt.total_bits();
    if fmt.is_signed() && (word >> (total - 1)) & 1 == 1 {
        (word as i128 - (1i128 << total)) as i64
    } else {
        word as i64
    }
}

/// Raw value → zero-padded binary token of exactly `total_bits` characters.
///
/// Bits above `total_bits` are masked off, so only in-range values round-trip.
pub fn to_bits(value: i64, fmt: &FixedPointFormat) -> String {
    format!("{:0width$b}", to_word(value, fmt), width = fmt.bit_width())
}

/// Binary token → raw value
pub fn from_bits(bits: &str, fmt: &FixedPointFormat) -> Result<i64> {
    parse_word(bits, TokenEncoding::Binary, fmt).map(|word| from_word(word, fmt))
}

/// Raw value → zero-padded uppercase hex token of `ceil(total_bits / 4)` digits
pub fn to_hex(value: i64, fmt: &FixedPointFormat) -> String {
    format!("{:0width$X}", to_word(value, fmt), width = fmt.hex_width())
}

/// Hex token → raw value
pub fn from_hex(hex: &str, fmt: &FixedPointFormat) -> Result<i64> {
    parse_word(hex, TokenEncoding::Hex, fmt).map(|word| from_word(word, fmt))
}

/// Render one raw value in the given encoding
pub fn encode_token(value: i64, encoding: TokenEncoding, fmt: &FixedPointFormat) -> String {
    match encoding {
        TokenEncoding::Binary => to_bits(value, fmt),
        TokenEncoding::Hex => to_hex(value, fmt),
    }
}

/// Parse one token in the given encoding
pub fn decode_token(token: &str, encoding: TokenEncoding, fmt: &FixedPointFormat) -> Result<i64> {
    match encoding {
        TokenEncoding::Binary => from_bits(token, fmt),
        TokenEncoding::Hex => from_hex(token, fmt),
    }
}

fn parse_word(token: &str, encoding: TokenEncoding, fmt: &FixedPointFormat) -> Result<u64> {
    let expected = encoding.token_width(fmt);
    let got = token.chars().count();
    if got != expected {
        return Err(FixedPointError::LengthMismatch { expected, got });
    }

    let invalid = || FixedPointError::InvalidToken {
        token: token.to_string(),
        encoding,
    };
    if !token.chars().all(|c| encoding.accepts(c)) {
        return Err(invalid());
    }

    let word = u64::from_str_radix(token, encoding.radix()).map_err(|_| invalid())?;
    // A hex token can carry more bits than the word when total_bits % 4 != 0
    if word & !fmt.word_mask() != 0 {
        return Err(invalid());
    }
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q4_4() -> FixedPointFormat {
        FixedPointFormat::signed(8, 4).unwrap()
    }

    #[test]
    fn test_to_bits_negative() {
        assert_eq!(to_bits(-24, &q4_4()), "11101000");
        assert_eq!(to_bits(5, &q4_4()), "00000101");
        assert_eq!(to_bits(-128, &q4_4()), "10000000");
    }

    #[test]
    fn test_from_bits() {
        assert_eq!(from_bits("11101000", &q4_4()).unwrap(), -24);
        assert_eq!(from_bits("01111111", &q4_4()).unwrap(), 127);

        let unsigned = FixedPointFormat::unsigned(8, 4).unwrap();
        assert_eq!(from_bits("11101000", &unsigned).unwrap(), 232);
    }

    #[test]
    fn test_from_bits_rejects_bad_tokens() {
        assert!(matches!(
            from_bits("1110100", &q4_4()),
            Err(FixedPointError::LengthMismatch { expected: 8, got: 7 })
        ));
        assert!(matches!(
            from_bits("1110100x", &q4_4()),
            Err(FixedPointError::InvalidToken { encoding: TokenEncoding::Binary, .. })
        ));
        assert!(matches!(
            from_bits("+1101000", &q4_4()),
            Err(FixedPointError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_hex_sixteen_bit() {
        let fmt = FixedPointFormat::signed(16, 8).unwrap();
        assert_eq!(to_hex(-1, &fmt), "FFFF");
        assert_eq!(to_hex(0x180, &fmt), "0180");
        assert_eq!(to_hex(10, &fmt).len(), 4);
        assert_eq!(from_hex("FFFF", &fmt).unwrap(), -1);
        assert_eq!(from_hex("fe40", &fmt).unwrap(), -448);
    }

    #[test]
    fn test_from_hex_rejects_bad_tokens() {
        let fmt = FixedPointFormat::signed(16, 8).unwrap();
        assert!(matches!(
            from_hex("FFF", &fmt),
            Err(FixedPointError::LengthMismatch { expected: 4, got: 3 })
        ));
        assert!(matches!(
            from_hex("FFFG", &fmt),
            Err(FixedPointError::InvalidToken { encoding: TokenEncoding::Hex, .. })
        ));
    }

    #[test]
    fn test_hex_partial_nibble() {
        let fmt = FixedPointFormat::signed(10, 4).unwrap();
        assert_eq!(to_hex(-1, &fmt), "3FF");
        assert_eq!(from_hex("3FF", &fmt).unwrap(), -1);
        assert_eq!(from_hex("200", &fmt).unwrap(), -512);
        assert!(matches!(
            from_hex("7FF", &fmt),
            Err(FixedPointError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_sixty_four_bit_words() {
        let fmt = FixedPointFormat::signed(64, 16).unwrap();
        for &v in &[i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(from_bits(&to_bits(v, &fmt), &fmt).unwrap(), v);
            assert_eq!(from_hex(&to_hex(v, &fmt), &fmt).unwrap(), v);
        }
        assert_eq!(to_hex(i64::MIN, &fmt), "8000000000000000");
    }

    #[test]
    fn test_exhaustive_roundtrip_small_formats() {
        for &(bits, signed) in &[(8u32, true), (8, false), (12, true), (5, true)] {
            let fmt = FixedPointFormat::new(bits, 1, signed).unwrap();
            for v in fmt.min_int()..=fmt.max_int() {
                assert_eq!(from_bits(&to_bits(v, &fmt), &fmt).unwrap(), v);
                assert_eq!(from_hex(&to_hex(v, &fmt), &fmt).unwrap(), v);
            }
        }
    }

    #[test]
    fn test_encoding_parse() {
        assert_eq!("HEX".parse::<TokenEncoding>().unwrap(), TokenEncoding::Hex);
        assert_eq!("bin".parse::<TokenEncoding>().unwrap(), TokenEncoding::Binary);
        assert!("octal".parse::<TokenEncoding>().is_err());
    }
}
