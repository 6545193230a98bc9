use std::fs::File;
use std::io::{self as stdio, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use zmat_forge::io::{self, read_xyz, read_zmat};
use zmat_forge::ops::BondConfig;
use zmat_forge::{Molecule, ZMatrix};

pub mod bonds;
pub mod info;
pub mod xyz;
pub mod zmat;

/// Aggregated IO parameters shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct IoParameters {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Bond perception flags shared by the commands that need a bond graph.
#[derive(Debug, Clone, Args)]
pub struct BondArgs {
    /// Edge length of the cuboid cells used to partition large molecules (Å).
    #[arg(long = "max-edge", default_value_t = 25.0)]
    pub max_edge_length: f64,
    /// Halo margin added around each cell (Å).
    #[arg(long = "halo", default_value_t = 6.0)]
    pub halo_margin: f64,
    /// Limit every atom to its valency, dropping the weakest bonds.
    #[arg(long)]
    pub use_valency: bool,
    /// Treat the whole molecule as a single cell.
    #[arg(long)]
    pub no_partitioning: bool,
    /// Do not warn about atoms with more bonds than their valency.
    #[arg(long)]
    pub no_oversaturation_warning: bool,
}

impl BondArgs {
    pub fn config(&self) -> BondConfig {
        BondConfig {
            max_edge_length: self.max_edge_length,
            halo_margin: self.halo_margin,
            use_valency: self.use_valency,
            use_partitioning: !self.no_partitioning,
            warn_oversaturation: !self.no_oversaturation_warning,
            ..BondConfig::default()
        }
    }
}

/// Reads an XYZ molecule from the configured input source.
pub fn load_molecule(params: &IoParameters) -> Result<Molecule> {
    load_with(params, "XYZ", read_xyz)
}

/// Reads a Z-matrix from the configured input source.
pub fn load_zmatrix(params: &IoParameters) -> Result<ZMatrix> {
    load_with(params, "Z-matrix", read_zmat)
}

fn load_with<T>(
    params: &IoParameters,
    format: &str,
    read: impl FnOnce(Box<dyn BufRead>) -> Result<T, io::Error>,
) -> Result<T> {
    if let Some(path) = &params.input {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        read(Box::new(BufReader::new(file)))
            .map_err(|e| e.with_path(path))
            .with_context(|| format!("Failed to parse {} input from {}", format, path.display()))
    } else {
        let stdin = stdio::stdin();
        if stdin.is_terminal() {
            bail!(
                "No --input provided and stdin is a TTY. Provide -i/--input or pipe a file into zforge."
            );
        }
        read(Box::new(BufReader::new(stdin.lock())))
            .with_context(|| format!("Failed to parse {} input from stdin", format))
    }
}

/// Writes command output to the configured destination through `write`.
pub fn save_with(
    params: &IoParameters,
    format: &str,
    write: impl FnOnce(&mut dyn Write) -> Result<(), io::Error>,
) -> Result<()> {
    match &params.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)
                .map_err(|e| e.with_path(path))
                .with_context(|| format!("Failed to write {} output to {}", format, path.display()))?;
            writer.flush().context("Failed to flush output writer")?;
        }
        None => {
            let stdout = stdio::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            write(&mut writer)
                .with_context(|| format!("Failed to write {} output to stdout", format))?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}
