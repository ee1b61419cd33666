//! memtile CLI
//!
//! Quantizes matrices into block-tiled multi-core mem files and decodes them
//! back.
//!
//! # Usage
//!
//! ```bash
//! # Operand A, layout taken from the file name
//! memtile encode -i a.txt -o mem_input.mem
//!
//! # Operand B over four cores in Q4.4 hex
//! memtile --total-bits 8 --frac-bits 4 --encoding hex encode -i b.txt -o weights.mem -l B --cores-b 4
//!
//! # Decode a result file and print real values
//! memtile decode mem_out_q1.mem --rows 8 --cols 8 --float
//!
//! # Block RAM preparation
//! memtile to-hex A.mem -o A_hex.mem
//! memtile clean A_hex.mem -o A_clean.mem
//! memtile regroup A_clean.mem -o A_rev.mem --group-size 2
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memtile_fixed_point::{QuantizedMatrix, TokenEncoding};
use memtile_layout::{
    convert, decode_mem_file, export_matrix, infer_layout_kind, read_mem_file, write_mem_file,
    DecodeRequest, LayoutKind, MemConfig, Separator,
};

#[derive(Parser)]
#[command(name = "memtile")]
#[command(version)]
#[command(about = "Generate and decode block-tiled multi-core mem files")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides applied on top of the config file or `MEMTILE_*` variables
#[derive(Args)]
struct Settings {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Word width in bits
    #[arg(long, global = true)]
    total_bits: Option<u32>,

    /// Fractional bits
    #[arg(long, global = true)]
    frac_bits: Option<u32>,

    /// Treat words as unsigned
    #[arg(long, global = true)]
    unsigned: bool,

    /// Tile edge length
    #[arg(long, global = true)]
    block_size: Option<usize>,

    /// Cores splitting the rows
    #[arg(long, global = true)]
    cores_a: Option<usize>,

    /// Cores splitting the columns
    #[arg(long, global = true)]
    cores_b: Option<usize>,

    /// binary or hex
    #[arg(long, global = true)]
    encoding: Option<TokenEncoding>,

    /// space or none
    #[arg(long, global = true)]
    separator: Option<Separator>,
}

impl Settings {
    fn resolve(&self) -> Result<MemConfig> {
        let mut config = match &self.config {
            Some(path) => MemConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => MemConfig::from_env(),
        };

        if let Some(bits) = self.total_bits {
            config.total_bits = bits;
        }
        if let Some(bits) = self.frac_bits {
            config.fractional_bits = bits;
        }
        if self.unsigned {
            config.signed = false;
        }
        if let Some(size) = self.block_size {
            config.block_size = size;
        }
        if let Some(cores) = self.cores_a {
            config.num_cores_a = cores;
        }
        if let Some(cores) = self.cores_b {
            config.num_cores_b = cores;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(separator) = self.separator {
            config.separator = separator;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Quantize a plain-text real matrix and write it as a mem file
    Encode {
        /// Real values, one matrix row per line, separated by spaces or commas
        #[arg(short, long)]
        input: PathBuf,

        /// Output mem file
        #[arg(short, long)]
        output: PathBuf,

        /// A, B, C or row; inferred from the output name when omitted
        #[arg(short, long)]
        layout: Option<LayoutKind>,
    },

    /// Decode a mem file and print the matrix
    Decode {
        /// Mem file to decode
        input: PathBuf,

        /// Rows of the original matrix
        #[arg(long)]
        rows: usize,

        /// Columns of the original matrix
        #[arg(long)]
        cols: usize,

        /// A, B, C or row; inferred from the input name when omitted
        #[arg(short, long)]
        layout: Option<LayoutKind>,

        /// Print real values instead of raw integers
        #[arg(long)]
        float: bool,
    },

    /// Re-encode binary tokens as hex
    ToHex {
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove whitespace inside every line
    Clean {
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Concatenate groups of lines, last line first
    Regroup {
        input: PathBuf,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Lines per output line
        #[arg(short, long, default_value_t = 2)]
        group_size: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memtile=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.settings.resolve()?;
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Encode { input, output, layout } => run_encode(&config, &input, &output, layout),
        Commands::Decode {
            input,
            rows,
            cols,
            layout,
            float,
        } => run_decode(&config, &input, rows, cols, layout, float),
        Commands::ToHex { input, output } => {
            let text = read_mem_file(&input)?;
            let lines = convert::binary_to_hex(&text, &config.format()?)?;
            emit(&lines, output.as_deref())
        }
        Commands::Clean { input, output } => {
            let text = read_mem_file(&input)?;
            emit(&convert::clean_lines(&text), output.as_deref())
        }
        Commands::Regroup {
            input,
            output,
            group_size,
        } => {
            let text = read_mem_file(&input)?;
            emit(&convert::regroup_lines(&text, group_size)?, output.as_deref())
        }
    }
}

fn run_encode(config: &MemConfig, input: &Path, output: &Path, layout: Option<LayoutKind>) -> Result<()> {
    let kind = resolve_kind(layout, output)?;
    let layout = config.layout(kind)?;
    let format = config.format()?;

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let (values, rows, cols) = parse_real_matrix(&text)?;
    let matrix = QuantizedMatrix::from_f64(&values, rows, cols, format)?;

    tracing::info!(input = %input.display(), rows, cols, %format, "loaded matrix");
    export_matrix(&matrix, &layout, config.style(), output)?;
    Ok(())
}

fn run_decode(
    config: &MemConfig,
    input: &Path,
    rows: usize,
    cols: usize,
    layout: Option<LayoutKind>,
    float: bool,
) -> Result<()> {
    let kind = resolve_kind(layout, input)?;
    let request = DecodeRequest::new(rows, cols, config.layout(kind)?, config.format()?, config.encoding);
    let matrix = decode_mem_file(input, &request)?;

    if float {
        let values = matrix.to_f64_vec();
        for row in values.chunks(cols) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.6}", v)).collect();
            println!("{}", cells.join(" "));
        }
    } else {
        for row in matrix.iter_rows() {
            let cells: Vec<String> = row.iter().map(i64::to_string).collect();
            println!("{}", cells.join(" "));
        }
    }
    Ok(())
}

/// Explicit layout wins; otherwise the file-name convention decides
fn resolve_kind(layout: Option<LayoutKind>, path: &Path) -> Result<LayoutKind> {
    match layout {
        Some(kind) => Ok(kind),
        None => Ok(infer_layout_kind(path)?),
    }
}

fn emit(lines: &[String], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_mem_file(path, lines)?;
            tracing::info!(path = %path.display(), lines = lines.len(), "wrote file");
        }
        None => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// Parse a real matrix written one row per line. Blank lines and `#`
/// comments are skipped.
fn parse_real_matrix(text: &str) -> Result<(Vec<f64>, usize, usize)> {
    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = None;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty())
            .map(|field| {
                field
                    .parse::<f64>()
                    .with_context(|| format!("line {}: invalid number {:?}", index + 1, field))
            })
            .collect::<Result<Vec<f64>>>()?;

        match cols {
            None => cols = Some(row.len()),
            Some(expected) if expected != row.len() => {
                bail!("line {}: expected {} values, found {}", index + 1, expected, row.len())
            }
            Some(_) => {}
        }
        values.extend(row);
        rows += 1;
    }

    match cols {
        Some(cols) if cols > 0 => Ok((values, rows, cols)),
        _ => bail!("input matrix is empty"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_real_matrix() {
        let text = "# operand A\n1.5, -2 0.25\n\n3 4 5\n";
        let (values, rows, cols) = parse_real_matrix(text).unwrap();
        assert_eq!((rows, cols), (2, 3));
        assert_eq!(values, vec![1.5, -2.0, 0.25, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_parse_real_matrix_errors() {
        assert!(parse_real_matrix("1 2\n3\n").is_err());
        assert!(parse_real_matrix("1 x\n").is_err());
        assert!(parse_real_matrix("\n# nothing\n").is_err());
    }

    #[test]
    fn test_resolve_kind() {
        assert_eq!(
            resolve_kind(None, Path::new("mem_k2.mem")).unwrap(),
            "B".parse::<LayoutKind>().unwrap()
        );
        assert_eq!(
            resolve_kind(Some(LayoutKind::Row), Path::new("anything.mem")).unwrap(),
            LayoutKind::Row
        );
        assert!(resolve_kind(None, Path::new("anything.mem")).is_err());
    }

    #[test]
    fn test_settings_override_config() {
        let cli = Cli::parse_from([
            "memtile",
            "--total-bits",
            "8",
            "--frac-bits",
            "4",
            "--cores-b",
            "4",
            "decode",
            "mem_q1.mem",
            "--rows",
            "4",
            "--cols",
            "8",
        ]);
        let config = cli.settings.resolve().unwrap();
        assert_eq!((config.total_bits, config.fractional_bits), (8, 4));
        assert_eq!(config.num_cores_b, 4);
    }
}
