//! Mem-file text: token rendering, parsing and atomic output
//!
//! One line per simultaneous read. Tokens are fixed width, either joined by a
//! single space or concatenated with no separator (hex/XPM style). The
//! parser accepts both shapes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use memtile_fixed_point::{
    decode_token, encode_token, FixedPointError, FixedPointFormat, QuantizedMatrix, TokenEncoding,
};

use crate::error::{LayoutError, Result};
use crate::layout_spec::MemLayout;

/// How tokens are joined on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Separator {
    /// Single space between tokens
    #[default]
    Space,
    /// Tokens concatenated
    None,
}

impl Separator {
    fn as_str(self) -> &'static str {
        match self {
            Separator::Space => " ",
            Separator::None => "",
        }
    }
}

impl std::fmt::Display for Separator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Separator::Space => write!(f, "space"),
            Separator::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for Separator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "space" => Ok(Separator::Space),
            "none" | "concat" => Ok(Separator::None),
            other => Err(format!("unknown separator: {}", other)),
        }
    }
}

/// Token alphabet plus line joining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenStyle {
    pub encoding: TokenEncoding,
    pub separator: Separator,
}

impl TokenStyle {
    pub fn new(encoding: TokenEncoding, separator: Separator) -> Self {
        Self { encoding, separator }
    }

    /// Concatenated uppercase hex
    pub fn xpm() -> Self {
        Self::new(TokenEncoding::Hex, Separator::None)
    }
}

/// Render one line of raw values
pub fn render_line(values: &[i64], format: &FixedPointFormat, style: TokenStyle) -> String {
    values
        .iter()
        .map(|&v| encode_token(v, style.encoding, format))
        .collect::<Vec<_>>()
        .join(style.separator.as_str())
}

/// Render every line; order is preserved
pub fn render_lines(lines: &[Vec<i64>], format: &FixedPointFormat, style: TokenStyle) -> Vec<String> {
    lines
        .par_iter()
        .map(|line| render_line(line, format, style))
        .collect()
}

/// Split a line into tokens of `width` characters.
///
/// Whitespace-separated fields are tokens; a field longer than `width` is cut
/// into `width`-sized chunks when it divides evenly. Otherwise the trailing
/// partial token is reported as a `LengthMismatch`.
pub fn split_tokens(
    line: &str,
    width: usize,
    encoding: TokenEncoding,
) -> std::result::Result<Vec<&str>, FixedPointError> {
    let mut tokens = Vec::new();
    for field in line.split_whitespace() {
        if !field.is_ascii() || width == 0 {
            return Err(FixedPointError::InvalidToken {
                token: field.to_string(),
                encoding,
            });
        }
        if field.len() % width != 0 {
            return Err(FixedPointError::LengthMismatch {
                expected: width,
                got: field.len() % width,
            });
        }
        tokens.extend((0..field.len()).step_by(width).map(|i| &field[i..i + width]));
    }
    Ok(tokens)
}

/// Parse one line into raw values; `line_no` is 1-based and used in errors
pub fn parse_line(
    line: &str,
    line_no: usize,
    format: &FixedPointFormat,
    encoding: TokenEncoding,
) -> Result<Vec<i64>> {
    let wrap = |source: FixedPointError| LayoutError::Token { line: line_no, source };
    split_tokens(line, encoding.token_width(format), encoding)
        .map_err(wrap)?
        .into_iter()
        .map(|token| decode_token(token, encoding, format).map_err(wrap))
        .collect()
}

/// Parse a whole file body. Blank lines are skipped; line numbers in errors
/// refer to the original text.
pub fn parse_lines(text: &str, format: &FixedPointFormat, encoding: TokenEncoding) -> Result<Vec<Vec<i64>>> {
    let lines: Vec<Vec<i64>> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| parse_line(line, i + 1, format, encoding))
        .collect::<Result<_>>()?;
    if lines.is_empty() {
        return Err(LayoutError::EmptyInput);
    }
    Ok(lines)
}

/// Encode a matrix to text lines under `layout`
pub fn encode_matrix(matrix: &QuantizedMatrix, layout: &MemLayout, style: TokenStyle) -> Result<Vec<String>> {
    let lines = layout.encode(matrix)?;
    Ok(render_lines(&lines, matrix.format(), style))
}

/// Encode a matrix and write it to `path`.
///
/// Nothing is written unless encoding succeeds.
pub fn export_matrix(
    matrix: &QuantizedMatrix,
    layout: &MemLayout,
    style: TokenStyle,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let lines = encode_matrix(matrix, layout, style)?;
    write_mem_file(path, &lines)?;
    tracing::info!(
        path = %path.display(),
        layout = %layout,
        lines = lines.len(),
        "wrote mem file"
    );
    Ok(())
}

/// Write newline-terminated lines via a sibling temp file and rename, so a
/// failed write never leaves a truncated file at `path`.
pub fn write_mem_file(path: impl AsRef<Path>, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    let tmp = temp_sibling(path);

    let result = (|| -> std::io::Result<()> {
        let mut w = std::io::BufWriter::new(fs::File::create(&tmp)?);
        for line in lines {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        fs::rename(&tmp, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}

/// Read a mem file's text
pub fn read_mem_file(path: impl AsRef<Path>) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use memtile_fixed_point::FixedPointFormat;

    fn q4_4() -> FixedPointFormat {
        FixedPointFormat::signed(8, 4).unwrap()
    }

    #[test]
    fn test_render_binary_spaced() {
        let line = render_line(&[-24, 1], &q4_4(), TokenStyle::default());
        assert_eq!(line, "11101000 00000001");
    }

    #[test]
    fn test_render_xpm() {
        let fmt = FixedPointFormat::signed(16, 8).unwrap();
        let line = render_line(&[-1, 0x180], &fmt, TokenStyle::xpm());
        assert_eq!(line, "FFFF0180");
    }

    #[test]
    fn test_parse_concatenated_and_spaced() {
        let fmt = FixedPointFormat::signed(16, 8).unwrap();
        let a = parse_line("FFFF0180", 1, &fmt, TokenEncoding::Hex).unwrap();
        let b = parse_line("FFFF 0180", 1, &fmt, TokenEncoding::Hex).unwrap();
        assert_eq!(a, vec![-1, 384]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_errors_carry_line_number() {
        let text = "11101000 00000001\n\n1110100x 00000001\n";
        let err = parse_lines(text, &q4_4(), TokenEncoding::Binary).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Token { line: 3, source: FixedPointError::InvalidToken { .. } }
        ));

        let err = parse_lines("1110100 00000001", &q4_4(), TokenEncoding::Binary).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Token { line: 1, source: FixedPointError::LengthMismatch { expected: 8, got: 7 } }
        ));
    }

    #[test]
    fn test_uneven_concatenated_field() {
        let fmt = FixedPointFormat::signed(16, 8).unwrap();
        let err = parse_line("FFFF01801", 1, &fmt, TokenEncoding::Hex).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Token { line: 1, source: FixedPointError::LengthMismatch { expected: 4, got: 1 } }
        ));

        let err = parse_line("0180 FFFF01", 2, &fmt, TokenEncoding::Hex).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Token { line: 2, source: FixedPointError::LengthMismatch { expected: 4, got: 2 } }
        ));
    }

    #[test]
    fn test_split_tokens_reports_caller_encoding() {
        assert!(matches!(
            split_tokens("FFé", 2, TokenEncoding::Hex),
            Err(FixedPointError::InvalidToken { encoding: TokenEncoding::Hex, .. })
        ));
        assert_eq!(
            split_tokens("0101 10", 2, TokenEncoding::Binary).unwrap(),
            vec!["01", "01", "10"]
        );
    }

    #[test]
    fn test_concatenated_binary_roundtrip() {
        let style = TokenStyle::new(TokenEncoding::Binary, Separator::None);
        let line = render_line(&[-24, 1, 127], &q4_4(), style);
        assert_eq!(line, "111010000000000101111111");
        assert_eq!(
            parse_line(&line, 1, &q4_4(), TokenEncoding::Binary).unwrap(),
            vec![-24, 1, 127]
        );
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(
            parse_lines("\n  \n", &q4_4(), TokenEncoding::Binary),
            Err(LayoutError::EmptyInput)
        ));
    }

    #[test]
    fn test_non_ascii_rejected() {
        let err = parse_line("1110100é", 4, &q4_4(), TokenEncoding::Hex).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Token {
                line: 4,
                source: FixedPointError::InvalidToken { encoding: TokenEncoding::Hex, .. }
            }
        ));
    }

    #[test]
    fn test_write_and_read_back() {
        let path = std::env::temp_dir().join(format!("memtile-memfile-{}.mem", std::process::id()));
        let lines = vec!["0001 0002".to_string(), "0003 0004".to_string()];
        write_mem_file(&path, &lines).unwrap();
        assert_eq!(read_mem_file(&path).unwrap(), "0001 0002\n0003 0004\n");
        fs::remove_file(&path).unwrap();
    }
}
