//! Decoder / validator for existing mem files
//!
//! The caller declares the original shape, layout and token format; the
//! decoder checks the file against them and rebuilds the matrix. It never
//! guesses a layout.

use std::path::Path;

use memtile_fixed_point::{FixedPointFormat, QuantizedMatrix, TokenEncoding};

use crate::error::{LayoutError, Result};
use crate::layout_spec::MemLayout;
use crate::memfile;

/// Everything needed to interpret a mem file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeRequest {
    pub rows: usize,
    pub cols: usize,
    pub layout: MemLayout,
    pub format: FixedPointFormat,
    pub encoding: TokenEncoding,
}

impl DecodeRequest {
    pub fn new(
        rows: usize,
        cols: usize,
        layout: MemLayout,
        format: FixedPointFormat,
        encoding: TokenEncoding,
    ) -> Self {
        Self {
            rows,
            cols,
            layout,
            format,
            encoding,
        }
    }
}

/// Decode mem-file text into a matrix
pub fn decode_text(text: &str, request: &DecodeRequest) -> Result<QuantizedMatrix> {
    // Shape errors are reported before any token is parsed
    let (expected_lines, tokens_per_line) = request.layout.line_shape(request.rows, request.cols)?;

    let lines = memfile::parse_lines(text, &request.format, request.encoding)?;
    if lines.len() != expected_lines {
        return Err(LayoutError::LineCountMismatch {
            expected: expected_lines,
            got: lines.len(),
        });
    }
    tracing::debug!(
        layout = %request.layout,
        lines = lines.len(),
        tokens_per_line,
        "decoding mem text"
    );

    request
        .layout
        .decode(&lines, request.rows, request.cols, request.format)
}

/// Read and decode a mem file
pub fn decode_mem_file(path: impl AsRef<Path>, request: &DecodeRequest) -> Result<QuantizedMatrix> {
    let path = path.as_ref();
    let text = memfile::read_mem_file(path)?;
    let matrix = decode_text(&text, request)?;
    tracing::info!(
        path = %path.display(),
        layout = %request.layout,
        rows = matrix.rows(),
        cols = matrix.cols(),
        "decoded mem file"
    );
    Ok(matrix)
}
