//! Quantized matrix container

use rayon::prelude::*;

use crate::error::{FixedPointError, Result};
use crate::fixed::{self, quantize};
use crate::format::FixedPointFormat;
use crate::text;

/// A row-major matrix of raw fixed-point integers sharing one format.
///
/// Every element lies in `[format.min_int(), format.max_int()]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedMatrix {
    data: Vec<i64>,
    rows: usize,
    cols: usize,
    format: FixedPointFormat,
}

impl QuantizedMatrix {
    /// Create a zero matrix. Fails with `DimensionMismatch` if `rows * cols`
    /// overflows.
    pub fn zeros(rows: usize, cols: usize, format: FixedPointFormat) -> Result<Self> {
        let len = rows
            .checked_mul(cols)
            .ok_or(FixedPointError::DimensionMismatch {
                expected: usize::MAX,
                got: 0,
            })?;
        Ok(Self {
            data: vec![0; len],
            rows,
            cols,
            format,
        })
    }

    /// Create from row-major raw integers
    pub fn from_raw(data: Vec<i64>, rows: usize, cols: usize, format: FixedPointFormat) -> Result<Self> {
        check_len(rows, cols, data.len())?;
        if let Some(&bad) = data.iter().find(|&&v| !format.contains(v)) {
            return Err(FixedPointError::ValueOutOfRange {
                value: bad as i128,
                min: format.min_int(),
                max: format.max_int(),
            });
        }
        Ok(Self {
            data,
            rows,
            cols,
            format,
        })
    }

    /// Create from nested rows of raw integers; all rows must share a length
    pub fn from_rows(rows: &[Vec<i64>], format: FixedPointFormat) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(FixedPointError::DimensionMismatch {
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_raw(data, rows.len(), cols, format)
    }

    /// Quantize row-major real values. Out-of-range values saturate.
    pub fn from_f64(data: &[f64], rows: usize, cols: usize, format: FixedPointFormat) -> Result<Self> {
        check_len(rows, cols, data.len())?;

        let quantized: Vec<_> = data.par_iter().map(|&v| quantize(v, &format)).collect();
        let saturated = quantized.iter().filter(|q| q.saturated).count();
        if saturated > 0 {
            tracing::warn!(
                saturated,
                total = data.len(),
                format = %format,
                "values clamped to fixed-point range"
            );
        }

        Ok(Self {
            data: quantized.into_iter().map(|q| q.raw).collect(),
            rows,
            cols,
            format,
        })
    }

    /// Dequantize to row-major real values
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.data
            .par_iter()
            .map(|&v| fixed::decode(v, &self.format))
            .collect()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn format(&self) -> &FixedPointFormat {
        &self.format
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major backing buffer
    pub fn as_slice(&self) -> &[i64] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<i64> {
        self.data
    }

    /// Get element at (row, col)
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.data[row * self.cols + col]
    }

    /// Set element at (row, col), rejecting values outside the format's range
    pub fn set(&mut self, row: usize, col: usize, value: i64) -> Result<()> {
        text::check_range(value as i128, &self.format)?;
        self.data[row * self.cols + col] = value;
        Ok(())
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> &[i64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[i64]> {
        // chunks(0) panics, and a zero-column matrix has no row content anyway
        self.data.chunks(self.cols.max(1)).take(self.rows)
    }
}

/// Fail with `DimensionMismatch` unless a `rows x cols` shape holds exactly
/// `got` elements. `expected` saturates at `usize::MAX` on overflow.
fn check_len(rows: usize, cols: usize, got: usize) -> Result<()> {
    let expected = rows.checked_mul(cols).unwrap_or(usize::MAX);
    if expected != got {
        return Err(FixedPointError::DimensionMismatch { expected, got });
    }
    Ok(())
}
