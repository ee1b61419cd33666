//! Block tiling of a quantized matrix

use memtile_fixed_point::QuantizedMatrix;

use crate::error::{LayoutError, Result};

/// Order in which a tile's elements are flattened onto a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flatten {
    /// All of row 0 left to right, then row 1, ...
    RowMajor,
    /// All of column 0 top to bottom, then column 1, ...
    ColMajor,
}

impl Flatten {
    /// `(row, col)` offsets inside a `size x size` tile, in flattening order
    pub fn offsets(self, size: usize) -> impl Iterator<Item = (usize, usize)> {
        (0..size * size).map(move |i| match self {
            Flatten::RowMajor => (i / size, i % size),
            Flatten::ColMajor => (i % size, i / size),
        })
    }
}

/// Read-only view over `block_size x block_size` tiles of a matrix
#[derive(Debug, Clone, Copy)]
pub struct BlockTiler<'a> {
    matrix: &'a QuantizedMatrix,
    block_size: usize,
}

impl<'a> BlockTiler<'a> {
    /// Fails with `DimensionMismatch` unless both dimensions divide by `block_size`
    pub fn new(matrix: &'a QuantizedMatrix, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(LayoutError::InvalidSpec("block_size must be at least 1".into()));
        }
        if matrix.rows() % block_size != 0 {
            return Err(LayoutError::rows_not_divisible(matrix.rows(), block_size));
        }
        if matrix.cols() % block_size != 0 {
            return Err(LayoutError::cols_not_divisible(matrix.cols(), block_size));
        }
        Ok(Self { matrix, block_size })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// `(rows / block_size, cols / block_size)`
    pub fn grid_shape(&self) -> (usize, usize) {
        (
            self.matrix.rows() / self.block_size,
            self.matrix.cols() / self.block_size,
        )
    }

    /// Tile at grid coordinate `(tile_row, tile_col)`.
    ///
    /// # Panics
    /// If the coordinate lies outside [`grid_shape`](Self::grid_shape).
    pub fn tile_at(&self, tile_row: usize, tile_col: usize) -> Tile<'a> {
        let (grid_rows, grid_cols) = self.grid_shape();
        assert!(
            tile_row < grid_rows && tile_col < grid_cols,
            "tile ({}, {}) outside {}x{} grid",
            tile_row,
            tile_col,
            grid_rows,
            grid_cols
        );
        Tile {
            matrix: self.matrix,
            origin_row: tile_row * self.block_size,
            origin_col: tile_col * self.block_size,
            size: self.block_size,
        }
    }
}

/// One `size x size` sub-matrix, borrowed from its parent
#[derive(Debug, Clone, Copy)]
pub struct Tile<'a> {
    matrix: &'a QuantizedMatrix,
    origin_row: usize,
    origin_col: usize,
    size: usize,
}

impl<'a> Tile<'a> {
    /// Top-left element position in the parent matrix
    pub fn origin(&self) -> (usize, usize) {
        (self.origin_row, self.origin_col)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Element at tile-local `(row, col)`
    pub fn get(&self, row: usize, col: usize) -> i64 {
        self.matrix.get(self.origin_row + row, self.origin_col + col)
    }

    /// Elements in the given flattening order
    pub fn iter(&self, order: Flatten) -> impl Iterator<Item = i64> + 'a {
        let tile = *self;
        order.offsets(self.size).map(move |(r, c)| tile.get(r, c))
    }

    /// Copy the elements out in the given flattening order
    pub fn to_vec(&self, order: Flatten) -> Vec<i64> {
        self.iter(order).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Axis;
    use memtile_fixed_point::FixedPointFormat;

    fn matrix_4x4() -> QuantizedMatrix {
        let rows: Vec<Vec<i64>> = (0..4).map(|r| (0..4).map(|c| r * 4 + c).collect()).collect();
        QuantizedMatrix::from_rows(&rows, FixedPointFormat::default()).unwrap()
    }

    #[test]
    fn test_grid_shape() {
        let m = matrix_4x4();
        let tiler = BlockTiler::new(&m, 2).unwrap();
        assert_eq!(tiler.grid_shape(), (2, 2));
        assert_eq!(BlockTiler::new(&m, 4).unwrap().grid_shape(), (1, 1));
    }

    #[test]
    fn test_tile_flattening() {
        let m = matrix_4x4();
        let tiler = BlockTiler::new(&m, 2).unwrap();
        let tile = tiler.tile_at(1, 0);
        assert_eq!(tile.origin(), (2, 0));
        assert_eq!(tile.to_vec(Flatten::RowMajor), vec![8, 9, 12, 13]);
        assert_eq!(tile.to_vec(Flatten::ColMajor), vec![8, 12, 9, 13]);
    }

    #[test]
    fn test_not_divisible() {
        let m = matrix_4x4();
        assert!(matches!(
            BlockTiler::new(&m, 3),
            Err(LayoutError::DimensionMismatch { axis: Axis::Rows, size: 4, divisor: 3 })
        ));

        let wide = QuantizedMatrix::zeros(2, 3, FixedPointFormat::default()).unwrap();
        assert!(matches!(
            BlockTiler::new(&wide, 2),
            Err(LayoutError::DimensionMismatch { axis: Axis::Cols, size: 3, divisor: 2 })
        ));
    }

    #[test]
    #[should_panic(expected = "outside 2x2 grid")]
    fn test_tile_out_of_grid() {
        let m = matrix_4x4();
        BlockTiler::new(&m, 2).unwrap().tile_at(2, 0);
    }

    #[test]
    fn test_offsets_cover_tile() {
        let mut seen: Vec<_> = Flatten::ColMajor.offsets(3).collect();
        seen.sort();
        let expected: Vec<_> = Flatten::RowMajor.offsets(3).collect();
        assert_eq!(seen, expected);
    }
}
