use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use zmat_forge::ops::bond_graph;
use zmat_forge::{BondGraph, Molecule};

use crate::commands::{BondArgs, run_with_spinner};

/// Perceives covalent bonds and lists them.
#[derive(Debug, Args)]
pub struct BondsArgs {
    #[command(flatten)]
    pub bonds: BondArgs,
}

/// Computes the bond graph of `molecule`.
pub fn run(molecule: &Molecule, args: &BondsArgs) -> Result<Arc<BondGraph>> {
    let config = args.bonds.config();
    run_with_spinner("Perceiving bonds", || {
        bond_graph(molecule, &config).context("Failed to perceive bonds")
    })
}
