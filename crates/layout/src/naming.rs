//! File-name convention used by batch tooling to pick a layout.
//!
//! | Pattern                                   | Layout |
//! |-------------------------------------------|--------|
//! | contains `_row`                           | row    |
//! | `mem_out*`, `matrix_c*`                   | core C |
//! | `mem_input*`, `matrix_a*`                 | core A |
//! | `mem_q*`, `mem_k*`, `mem_v*`, `matrix_b*` | core B |
//!
//! Anything else, including a bare `_core` suffix, is ambiguous. The decoder
//! does not consult this table; callers opt in.

use std::path::Path;

use crate::error::{LayoutError, Result};
use crate::layout_spec::{LayoutKind, LayoutRole};

const PREFIXES: &[(&str, LayoutRole)] = &[
    // mem_out_q1 must win over the mem_q prefix family
    ("mem_out", LayoutRole::C),
    ("mem_input", LayoutRole::A),
    ("mem_q", LayoutRole::B),
    ("mem_k", LayoutRole::B),
    ("mem_v", LayoutRole::B),
    ("matrix_a", LayoutRole::A),
    ("matrix_b", LayoutRole::B),
    ("matrix_c", LayoutRole::C),
];

/// Pick a layout from a file name or path
pub fn infer_layout_kind(name: impl AsRef<Path>) -> Result<LayoutKind> {
    let path = name.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if stem.contains("_row") {
        return Ok(LayoutKind::Row);
    }
    PREFIXES
        .iter()
        .find(|(prefix, _)| stem.starts_with(prefix))
        .map(|&(_, role)| LayoutKind::Core(role))
        .ok_or_else(|| LayoutError::RoleAmbiguous {
            name: path.display().to_string(),
        })
}
