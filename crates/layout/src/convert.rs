//! Text-level transforms applied to finished mem files before loading them
//! into block RAM.

use memtile_fixed_point::{FixedPointFormat, TokenEncoding};

use crate::error::{LayoutError, Result};
use crate::memfile::{self, TokenStyle};

/// Re-encode every binary token as uppercase hex, one output line per
/// non-blank input line.
pub fn binary_to_hex(text: &str, format: &FixedPointFormat) -> Result<Vec<String>> {
    let lines = memfile::parse_lines(text, format, TokenEncoding::Binary)?;
    let style = TokenStyle::new(TokenEncoding::Hex, memfile::Separator::Space);
    Ok(memfile::render_lines(&lines, format, style))
}

/// Strip all whitespace inside each line; blank lines are dropped
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split_whitespace().collect::<String>())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Merge every `group_size` lines into one, last line of the group first.
///
/// A line of the form `<addr> <data>` contributes only `<data>`.
pub fn regroup_lines(text: &str, group_size: usize) -> Result<Vec<String>> {
    let words: Vec<&str> = text
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let first = fields.next()?;
            Some(fields.next().unwrap_or(first))
        })
        .collect();

    if words.is_empty() {
        return Err(LayoutError::EmptyInput);
    }
    if group_size == 0 || words.len() % group_size != 0 {
        return Err(LayoutError::InvalidGroupSize {
            lines: words.len(),
            group_size,
        });
    }

    tracing::debug!(lines = words.len(), group_size, "regrouping lines");
    Ok(words
        .chunks(group_size)
        .map(|group| group.iter().rev().copied().collect())
        .collect())
}
