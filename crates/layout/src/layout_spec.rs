//! Layout roles and per-call core layout descriptions

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::tiler::Flatten;

/// Which matmul operand a core-mode file feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutRole {
    /// Operand A: row bands per core, streamed one block-column at a time
    #[serde(rename = "A", alias = "a")]
    A,
    /// Operand B: column bands per core, streamed one block-row at a time
    #[serde(rename = "B", alias = "b")]
    B,
    /// Result C: `cores_a x cores_b` tiles per line
    #[serde(rename = "C", alias = "c")]
    C,
}

impl LayoutRole {
    /// Intra-tile flattening order for this role
    pub fn flatten(self) -> Flatten {
        match self {
            LayoutRole::B => Flatten::ColMajor,
            LayoutRole::A | LayoutRole::C => Flatten::RowMajor,
        }
    }
}

impl std::fmt::Display for LayoutRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutRole::A => write!(f, "A"),
            LayoutRole::B => write!(f, "B"),
            LayoutRole::C => write!(f, "C"),
        }
    }
}

/// Layout selector as it appears in configuration: a core role or plain rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutKind {
    #[serde(rename = "row")]
    Row,
    #[serde(untagged)]
    Core(LayoutRole),
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutKind::Row => write!(f, "row"),
            LayoutKind::Core(role) => write!(f, "{}", role),
        }
    }
}

impl std::str::FromStr for LayoutKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a" => Ok(LayoutKind::Core(LayoutRole::A)),
            "b" => Ok(LayoutKind::Core(LayoutRole::B)),
            "c" => Ok(LayoutKind::Core(LayoutRole::C)),
            "row" => Ok(LayoutKind::Row),
            other => Err(format!("unknown layout {:?} (expected A, B, C or row)", other)),
        }
    }
}

/// Core-mode layout parameters for one encode/decode call.
///
/// `num_cores_b` is ignored for role A and `num_cores_a` for role B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoreLayoutSpec {
    role: LayoutRole,
    num_cores_a: usize,
    num_cores_b: usize,
    block_size: usize,
}

impl CoreLayoutSpec {
    /// Create a spec, requiring a non-zero block size and non-zero counts for
    /// every core dimension the role uses
    pub fn new(role: LayoutRole, num_cores_a: usize, num_cores_b: usize, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(LayoutError::InvalidSpec("block_size must be at least 1".into()));
        }
        if role != LayoutRole::B && num_cores_a == 0 {
            return Err(LayoutError::InvalidSpec(format!(
                "role {} needs num_cores_a >= 1",
                role
            )));
        }
        if role != LayoutRole::A && num_cores_b == 0 {
            return Err(LayoutError::InvalidSpec(format!(
                "role {} needs num_cores_b >= 1",
                role
            )));
        }
        let spec = Self {
            role,
            num_cores_a,
            num_cores_b,
            block_size,
        };
        if spec.checked_tokens_per_line().is_none() {
            return Err(LayoutError::InvalidSpec(format!(
                "{} overflows the addressable line size",
                spec
            )));
        }
        Ok(spec)
    }

    /// Tokens per line, or `None` if it or either divisor overflows
    fn checked_tokens_per_line(&self) -> Option<usize> {
        let bs = self.block_size;
        let (tiles, band) = match self.role {
            LayoutRole::A => (self.num_cores_a, self.num_cores_a),
            LayoutRole::B => (self.num_cores_b, self.num_cores_b),
            LayoutRole::C => {
                self.num_cores_a.checked_mul(bs)?;
                (self.num_cores_a.checked_mul(self.num_cores_b)?, self.num_cores_b)
            }
        };
        band.checked_mul(bs)?;
        tiles.checked_mul(bs)?.checked_mul(bs)
    }

    pub fn operand_a(num_cores_a: usize, block_size: usize) -> Result<Self> {
        Self::new(LayoutRole::A, num_cores_a, 1, block_size)
    }

    pub fn operand_b(num_cores_b: usize, block_size: usize) -> Result<Self> {
        Self::new(LayoutRole::B, 1, num_cores_b, block_size)
    }

    pub fn result_c(num_cores_a: usize, num_cores_b: usize, block_size: usize) -> Result<Self> {
        Self::new(LayoutRole::C, num_cores_a, num_cores_b, block_size)
    }

    pub fn role(&self) -> LayoutRole {
        self.role
    }

    pub fn num_cores_a(&self) -> usize {
        self.num_cores_a
    }

    pub fn num_cores_b(&self) -> usize {
        self.num_cores_b
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Rows must be a multiple of this
    pub fn row_divisor(&self) -> usize {
        match self.role {
            LayoutRole::A | LayoutRole::C => self.num_cores_a * self.block_size,
            LayoutRole::B => self.block_size,
        }
    }

    /// Cols must be a multiple of this
    pub fn col_divisor(&self) -> usize {
        match self.role {
            LayoutRole::A => self.block_size,
            LayoutRole::B | LayoutRole::C => self.num_cores_b * self.block_size,
        }
    }

    /// Number of tiles read on every line
    pub fn tiles_per_line(&self) -> usize {
        match self.role {
            LayoutRole::A => self.num_cores_a,
            LayoutRole::B => self.num_cores_b,
            LayoutRole::C => self.num_cores_a * self.num_cores_b,
        }
    }

    /// Number of tokens on every line
    pub fn tokens_per_line(&self) -> usize {
        self.tiles_per_line() * self.block_size * self.block_size
    }

    /// Check a matrix shape against the role's divisibility rules
    pub fn check_shape(&self, rows: usize, cols: usize) -> Result<()> {
        if rows == 0 || cols == 0 {
            return Err(LayoutError::EmptyInput);
        }
        let row_divisor = self.row_divisor();
        if rows % row_divisor != 0 {
            return Err(LayoutError::rows_not_divisible(rows, row_divisor));
        }
        let col_divisor = self.col_divisor();
        if cols % col_divisor != 0 {
            return Err(LayoutError::cols_not_divisible(cols, col_divisor));
        }
        Ok(())
    }

    /// Number of lines a `rows x cols` matrix serializes to.
    ///
    /// Every line consumes one band along each axis, so this is the same
    /// product for all three roles.
    pub fn line_count(&self, rows: usize, cols: usize) -> usize {
        (rows / self.row_divisor()) * (cols / self.col_divisor())
    }
}

impl std::fmt::Display for CoreLayoutSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            LayoutRole::A => write!(f, "A(cores={}, block={})", self.num_cores_a, self.block_size),
            LayoutRole::B => write!(f, "B(cores={}, block={})", self.num_cores_b, self.block_size),
            LayoutRole::C => write!(
                f,
                "C(cores={}x{}, block={})",
                self.num_cores_a, self.num_cores_b, self.block_size
            ),
        }
    }
}

/// Full serialization layout: plain rows or a core-mode arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemLayout {
    /// One line per matrix row, column order preserved
    Row,
    /// Multi-core simultaneous-read order
    Core(CoreLayoutSpec),
}

impl MemLayout {
    pub fn kind(&self) -> LayoutKind {
        match self {
            MemLayout::Row => LayoutKind::Row,
            MemLayout::Core(spec) => LayoutKind::Core(spec.role()),
        }
    }
}

impl std::fmt::Display for MemLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemLayout::Row => write!(f, "row"),
            MemLayout::Core(spec) => write!(f, "core {}", spec),
        }
    }
}
