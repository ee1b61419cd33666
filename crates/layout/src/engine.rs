//! Layout encode/decode over raw integer lines

use rayon::prelude::*;

use memtile_fixed_point::{FixedPointFormat, QuantizedMatrix};

use crate::error::{LayoutError, Result};
use crate::layout_spec::{CoreLayoutSpec, MemLayout};
use crate::order::LayoutPlan;
use crate::tiler::BlockTiler;

/// Reorder a matrix into core-mode lines of raw values.
///
/// Line `n` holds exactly what the participating cores read on cycle `n`.
pub fn encode_layout(matrix: &QuantizedMatrix, spec: &CoreLayoutSpec) -> Result<Vec<Vec<i64>>> {
    let plan = LayoutPlan::new(spec, matrix.rows(), matrix.cols())?;
    let tiler = BlockTiler::new(matrix, spec.block_size())?;
    let flatten = plan.flatten();

    tracing::debug!(
        layout = %spec,
        rows = matrix.rows(),
        cols = matrix.cols(),
        lines = plan.line_count(),
        tokens_per_line = plan.tokens_per_line(),
        "encoding core layout"
    );

    let lines = (0..plan.line_count())
        .into_par_iter()
        .map(|index| {
            let mut line = Vec::with_capacity(plan.tokens_per_line());
            for read in plan.line(index) {
                line.extend(tiler.tile_at(read.tile_row, read.tile_col).iter(flatten));
            }
            line
        })
        .collect();

    Ok(lines)
}

/// Inverse of [`encode_layout`]: scatter core-mode lines back into a
/// `rows x cols` matrix. Both core counts must come from the caller.
pub fn decode_layout(
    lines: &[Vec<i64>],
    rows: usize,
    cols: usize,
    spec: &CoreLayoutSpec,
    format: FixedPointFormat,
) -> Result<QuantizedMatrix> {
    if lines.is_empty() {
        return Err(LayoutError::EmptyInput);
    }
    let plan = LayoutPlan::new(spec, rows, cols)?;
    check_line_shape(lines, plan.line_count(), plan.tokens_per_line())?;

    let mut matrix = QuantizedMatrix::zeros(rows, cols, format)?;
    for (index, line) in lines.iter().enumerate() {
        for (&value, (row, col)) in line.iter().zip(plan.positions(index)) {
            matrix.set(row, col, value)?;
        }
    }
    Ok(matrix)
}

/// Plain row mode: one line per matrix row
pub fn encode_rows(matrix: &QuantizedMatrix) -> Result<Vec<Vec<i64>>> {
    if matrix.rows() == 0 || matrix.cols() == 0 {
        return Err(LayoutError::EmptyInput);
    }
    Ok(matrix.iter_rows().map(<[i64]>::to_vec).collect())
}

/// Inverse of [`encode_rows`]
pub fn decode_rows(
    lines: &[Vec<i64>],
    rows: usize,
    cols: usize,
    format: FixedPointFormat,
) -> Result<QuantizedMatrix> {
    if lines.is_empty() || rows == 0 || cols == 0 {
        return Err(LayoutError::EmptyInput);
    }
    check_line_shape(lines, rows, cols)?;
    let data = lines.concat();
    Ok(QuantizedMatrix::from_raw(data, rows, cols, format)?)
}

impl MemLayout {
    /// Arrange a matrix into lines of raw values
    pub fn encode(&self, matrix: &QuantizedMatrix) -> Result<Vec<Vec<i64>>> {
        match self {
            MemLayout::Row => encode_rows(matrix),
            MemLayout::Core(spec) => encode_layout(matrix, spec),
        }
    }

    /// Rebuild a matrix from lines of raw values
    pub fn decode(
        &self,
        lines: &[Vec<i64>],
        rows: usize,
        cols: usize,
        format: FixedPointFormat,
    ) -> Result<QuantizedMatrix> {
        match self {
            MemLayout::Row => decode_rows(lines, rows, cols, format),
            MemLayout::Core(spec) => decode_layout(lines, rows, cols, spec, format),
        }
    }

    /// Expected `(lines, tokens_per_line)` for a `rows x cols` matrix
    pub fn line_shape(&self, rows: usize, cols: usize) -> Result<(usize, usize)> {
        match self {
            MemLayout::Row => {
                if rows == 0 || cols == 0 {
                    return Err(LayoutError::EmptyInput);
                }
                Ok((rows, cols))
            }
            MemLayout::Core(spec) => {
                let plan = LayoutPlan::new(spec, rows, cols)?;
                Ok((plan.line_count(), plan.tokens_per_line()))
            }
        }
    }
}

fn check_line_shape(lines: &[Vec<i64>], expected_lines: usize, tokens_per_line: usize) -> Result<()> {
    if lines.len() != expected_lines {
        return Err(LayoutError::LineCountMismatch {
            expected: expected_lines,
            got: lines.len(),
        });
    }
    if let Some((index, line)) = lines
        .iter()
        .enumerate()
        .find(|(_, line)| line.len() != tokens_per_line)
    {
        return Err(LayoutError::TokenCountMismatch {
            line: index + 1,
            expected: tokens_per_line,
            got: line.len(),
        });
    }
    Ok(())
}
