use anyhow::{Context, Result};
use clap::Args;

use zmat_forge::ops::{Transform, to_cartesian};
use zmat_forge::{Molecule, ZMatrix};

use crate::commands::run_with_spinner;

/// Rebuilds Cartesian coordinates from a Z-matrix.
#[derive(Debug, Args)]
pub struct XyzArgs {
    /// Move the topological center of the result to the origin.
    #[arg(long)]
    pub center: bool,
}

/// Places every Z-matrix row in space.
pub fn run(zmat: &ZMatrix, args: &XyzArgs) -> Result<Molecule> {
    run_with_spinner("Reconstructing coordinates", || {
        let mut molecule = to_cartesian(zmat).context("Failed to rebuild Cartesian coordinates")?;
        if args.center {
            Transform::center_geometry(&mut molecule, None);
        }
        Ok(molecule)
    })
}
