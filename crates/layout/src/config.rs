//! Mem-file generation configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use memtile_fixed_point::{FixedPointFormat, TokenEncoding, DEFAULT_FRACTIONAL_BITS, DEFAULT_TOTAL_BITS};

use crate::error::{LayoutError, Result};
use crate::layout_spec::{CoreLayoutSpec, LayoutKind, LayoutRole, MemLayout};
use crate::memfile::{Separator, TokenStyle};

/// Number format, tiling and token style shared by every file of a run.
///
/// Core counts live here only as defaults; each encode/decode call receives
/// its own [`CoreLayoutSpec`] built by [`MemConfig::core_spec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemConfig {
    /// Word width in bits
    #[serde(default = "default_total_bits")]
    pub total_bits: u32,

    /// Fractional bits
    #[serde(default = "default_fractional_bits")]
    pub fractional_bits: u32,

    /// Two's complement when true
    #[serde(default = "default_signed")]
    pub signed: bool,

    /// Tile edge length
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Cores splitting the rows (operand A and result C)
    #[serde(default = "default_num_cores")]
    pub num_cores_a: usize,

    /// Cores splitting the columns (operand B and result C)
    #[serde(default = "default_num_cores")]
    pub num_cores_b: usize,

    #[serde(default)]
    pub encoding: TokenEncoding,

    #[serde(default)]
    pub separator: Separator,
}

fn default_total_bits() -> u32 {
    DEFAULT_TOTAL_BITS
}

fn default_fractional_bits() -> u32 {
    DEFAULT_FRACTIONAL_BITS
}

fn default_signed() -> bool {
    true
}

fn default_block_size() -> usize {
    2
}

fn default_num_cores() -> usize {
    2
}

impl Default for MemConfig {
    fn default() -> Self {
        Self {
            total_bits: default_total_bits(),
            fractional_bits: default_fractional_bits(),
            signed: default_signed(),
            block_size: default_block_size(),
            num_cores_a: default_num_cores(),
            num_cores_b: default_num_cores(),
            encoding: TokenEncoding::default(),
            separator: Separator::default(),
        }
    }
}

impl MemConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Defaults overridden by `MEMTILE_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Apply `MEMTILE_*` overrides from `lookup`. Unparsable values are
    /// logged and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn set<T: std::str::FromStr>(
            lookup: &dyn Fn(&str) -> Option<String>,
            key: &str,
            slot: &mut T,
        ) {
            if let Some(raw) = lookup(key) {
                match raw.trim().parse() {
                    Ok(value) => *slot = value,
                    Err(_) => tracing::warn!(key, value = %raw, "ignoring unparsable override"),
                }
            }
        }

        set(&lookup, "MEMTILE_TOTAL_BITS", &mut self.total_bits);
        set(&lookup, "MEMTILE_FRAC_BITS", &mut self.fractional_bits);
        set(&lookup, "MEMTILE_SIGNED", &mut self.signed);
        set(&lookup, "MEMTILE_BLOCK_SIZE", &mut self.block_size);
        set(&lookup, "MEMTILE_CORES_A", &mut self.num_cores_a);
        set(&lookup, "MEMTILE_CORES_B", &mut self.num_cores_b);
        set(&lookup, "MEMTILE_ENCODING", &mut self.encoding);
        set(&lookup, "MEMTILE_SEPARATOR", &mut self.separator);
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.format()?;
        if self.block_size == 0 {
            return Err(LayoutError::Config("block_size must be at least 1".to_string()));
        }
        if self.num_cores_a == 0 || self.num_cores_b == 0 {
            return Err(LayoutError::Config(format!(
                "core counts must be at least 1 (num_cores_a = {}, num_cores_b = {})",
                self.num_cores_a, self.num_cores_b
            )));
        }
        // C uses both core counts, so it bounds every role's line size
        self.core_spec(LayoutRole::C)?;
        Ok(())
    }

    pub fn format(&self) -> Result<FixedPointFormat> {
        Ok(FixedPointFormat::new(
            self.total_bits,
            self.fractional_bits,
            self.signed,
        )?)
    }

    pub fn style(&self) -> TokenStyle {
        TokenStyle::new(self.encoding, self.separator)
    }

    /// Layout parameters for one core-mode call
    pub fn core_spec(&self, role: LayoutRole) -> Result<CoreLayoutSpec> {
        CoreLayoutSpec::new(role, self.num_cores_a, self.num_cores_b, self.block_size)
    }

    pub fn layout(&self, kind: LayoutKind) -> Result<MemLayout> {
        match kind {
            LayoutKind::Row => Ok(MemLayout::Row),
            LayoutKind::Core(role) => Ok(MemLayout::Core(self.core_spec(role)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = MemConfig::default();
        assert_eq!(config.total_bits, 16);
        assert_eq!(config.fractional_bits, 8);
        assert!(config.signed);
        assert_eq!(config.block_size, 2);
        assert_eq!((config.num_cores_a, config.num_cores_b), (2, 2));
        assert_eq!(config.style(), TokenStyle::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_json() {
        let config: MemConfig =
            serde_json::from_str(r#"{"total_bits": 8, "fractional_bits": 4, "encoding": "hex"}"#).unwrap();
        assert_eq!(config.format().unwrap(), FixedPointFormat::signed(8, 4).unwrap());
        assert_eq!(config.encoding, TokenEncoding::Hex);
        assert_eq!(config.block_size, 2);
    }

    #[test]
    fn test_json_file() {
        let path = std::env::temp_dir().join(format!("memtile-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"num_cores_a": 4, "separator": "none"}"#).unwrap();
        let config = MemConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.num_cores_a, 4);
        assert_eq!(config.separator, Separator::None);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MEMTILE_TOTAL_BITS", "8"),
            ("MEMTILE_FRAC_BITS", "4"),
            ("MEMTILE_CORES_B", "3"),
            ("MEMTILE_ENCODING", "hex"),
            ("MEMTILE_BLOCK_SIZE", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = MemConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.total_bits, 8);
        assert_eq!(config.fractional_bits, 4);
        assert_eq!(config.num_cores_b, 3);
        assert_eq!(config.encoding, TokenEncoding::Hex);
        assert_eq!(config.block_size, 2);
    }

    #[test]
    fn test_validate_rejects() {
        let config = MemConfig {
            fractional_bits: 20,
            ..MemConfig::default()
        };
        assert!(matches!(config.validate(), Err(LayoutError::FixedPoint(_))));

        let config = MemConfig {
            num_cores_b: 0,
            ..MemConfig::default()
        };
        assert!(matches!(config.validate(), Err(LayoutError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_overflowing_cores() {
        let config = MemConfig {
            num_cores_a: usize::MAX / 2 + 1,
            block_size: 2,
            ..MemConfig::default()
        };
        assert!(matches!(config.validate(), Err(LayoutError::InvalidSpec(_))));
        assert!(matches!(
            config.layout(LayoutKind::Core(LayoutRole::A)),
            Err(LayoutError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_layout_per_call() {
        let config = MemConfig {
            num_cores_a: 3,
            num_cores_b: 4,
            ..MemConfig::default()
        };
        let a = config.core_spec(LayoutRole::A).unwrap();
        let c = config.core_spec(LayoutRole::C).unwrap();
        assert_eq!(a.tiles_per_line(), 3);
        assert_eq!(c.tiles_per_line(), 12);
        assert_eq!(config.layout(LayoutKind::Row).unwrap(), MemLayout::Row);
    }
}
