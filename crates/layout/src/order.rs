//! Tile read order for the core-mode layouts
//!
//! A [`LayoutPlan`] maps each output line to the tiles the cores read on that
//! cycle. Encoding gathers elements along the plan and decoding scatters them
//! back along the same plan, so both directions share one ordering.
//!
//! ```text
//! A: for group in row bands of (cores_a * bs) rows
//!      for block_col
//!        line: core 0..cores_a            tile (group*cores_a + core, block_col)
//!
//! B: for group in col bands of (cores_b * bs) cols
//!      for block_row
//!        line: core 0..cores_b            tile (block_row, group*cores_b + core)
//!
//! C: for row_group, for col_group
//!        line: core_b 0..cores_b  (outer)
//!                core_a 0..cores_a (inner) tile (row_group*cores_a + core_a,
//!                                                col_group*cores_b + core_b)
//! ```
//!
//! Tiles are flattened row-major for A and C and column-major for B.

use crate::error::Result;
use crate::layout_spec::{CoreLayoutSpec, LayoutRole};
use crate::tiler::Flatten;

/// A tile read by one core on one line, in tile-grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRead {
    pub tile_row: usize,
    pub tile_col: usize,
}

/// Validated line-by-line read order for one matrix shape
#[derive(Debug, Clone, Copy)]
pub struct LayoutPlan {
    spec: CoreLayoutSpec,
    rows: usize,
    cols: usize,
}

impl LayoutPlan {
    /// Fails with `DimensionMismatch` / `EmptyInput` if the shape does not fit the role
    pub fn new(spec: &CoreLayoutSpec, rows: usize, cols: usize) -> Result<Self> {
        spec.check_shape(rows, cols)?;
        Ok(Self {
            spec: *spec,
            rows,
            cols,
        })
    }

    pub fn spec(&self) -> &CoreLayoutSpec {
        &self.spec
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn line_count(&self) -> usize {
        self.spec.line_count(self.rows, self.cols)
    }

    pub fn tokens_per_line(&self) -> usize {
        self.spec.tokens_per_line()
    }

    pub fn flatten(&self) -> Flatten {
        self.spec.role().flatten()
    }

    /// Tiles read on line `index`, in emission order
    pub fn line(&self, index: usize) -> Vec<TileRead> {
        let spec = &self.spec;
        let bs = spec.block_size();
        let (cores_a, cores_b) = (spec.num_cores_a(), spec.num_cores_b());

        match spec.role() {
            LayoutRole::A => {
                let blocks_per_row = self.cols / bs;
                let (group, block_col) = (index / blocks_per_row, index % blocks_per_row);
                (0..cores_a)
                    .map(|core| TileRead {
                        tile_row: group * cores_a + core,
                        tile_col: block_col,
                    })
                    .collect()
            }
            LayoutRole::B => {
                let blocks_per_col = self.rows / bs;
                let (group, block_row) = (index / blocks_per_col, index % blocks_per_col);
                (0..cores_b)
                    .map(|core| TileRead {
                        tile_row: block_row,
                        tile_col: group * cores_b + core,
                    })
                    .collect()
            }
            LayoutRole::C => {
                let col_groups = self.cols / (cores_b * bs);
                let (row_group, col_group) = (index / col_groups, index % col_groups);
                let mut reads = Vec::with_capacity(cores_a * cores_b);
                for core_b in 0..cores_b {
                    for core_a in 0..cores_a {
                        reads.push(TileRead {
                            tile_row: row_group * cores_a + core_a,
                            tile_col: col_group * cores_b + core_b,
                        });
                    }
                }
                reads
            }
        }
    }

    /// Matrix `(row, col)` of every token on line `index`, in emission order
    pub fn positions(&self, index: usize) -> Vec<(usize, usize)> {
        let bs = self.spec.block_size();
        let flatten = self.flatten();
        let mut positions = Vec::with_capacity(self.tokens_per_line());
        for read in self.line(index) {
            let (row0, col0) = (read.tile_row * bs, read.tile_col * bs);
            positions.extend(flatten.offsets(bs).map(|(r, c)| (row0 + r, col0 + c)));
        }
        positions
    }
}
