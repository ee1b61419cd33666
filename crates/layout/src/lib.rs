//! memtile Layout
//!
//! Block-tiled multi-core layouts for accelerator mem files. Each line of a
//! core-mode file holds what the parallel cores read on one cycle:
//! operand A split by row bands, operand B by column bands, result C by both.

mod config;
pub mod convert;
mod decoder;
mod engine;
mod error;
mod layout_spec;
mod memfile;
mod naming;
mod order;
mod tiler;

pub use config::MemConfig;
pub use decoder::{decode_mem_file, decode_text, DecodeRequest};
pub use engine::{decode_layout, decode_rows, encode_layout, encode_rows};
pub use error::{Axis, LayoutError, Result};
pub use layout_spec::{CoreLayoutSpec, LayoutKind, LayoutRole, MemLayout};
pub use memfile::{
    encode_matrix, export_matrix, parse_line, parse_lines, read_mem_file, render_line, render_lines,
    split_tokens, write_mem_file, Separator, TokenStyle,
};
pub use naming::infer_layout_kind;
pub use order::{LayoutPlan, TileRead};
pub use tiler::{BlockTiler, Flatten, Tile};
