use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;

use zmat_forge::ops::{
    DegeneratePolicy, Fragment, RecursionLevel, ZmatConfig, bond_graph, to_zmat,
};
use zmat_forge::{AtomKey, BuildEntry, Molecule, ZMatrix};

use crate::commands::{BondArgs, run_with_spinner};

/// Converts Cartesian coordinates into a Z-matrix.
#[derive(Debug, Args)]
pub struct ZmatArgs {
    #[command(flatten)]
    pub bonds: BondArgs,
    /// Build-order strategy: 0 keeps input order, 1 follows the nearest atom, 2 the nearest pair.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub level: u8,
    /// Longest step accepted at level 1 before restarting at the center (Å).
    #[arg(long, default_value_t = 5.0)]
    pub chain_threshold: f64,
    /// Longest step accepted at level 2 before restarting at the center (Å).
    #[arg(long, default_value_t = 7.0)]
    pub pair_threshold: f64,
    /// Atoms to place first, in order, each referencing the ones before it.
    #[arg(long, value_delimiter = ',', value_name = "KEYS")]
    pub start: Vec<AtomKey>,
    /// Fragment anchors as `atom:bond,angle,dihedral` entries joined by `;`. Repeatable.
    #[arg(long = "fragment", value_name = "ANCHORS")]
    pub fragments: Vec<AnchorList>,
    /// Record undefined dihedrals as 0° instead of failing.
    #[arg(long)]
    pub zero_degenerate: bool,
}

/// Anchor entries of one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorList(pub Vec<BuildEntry>);

impl FromStr for AnchorList {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(';')
            .filter(|part| !part.trim().is_empty())
            .map(parse_anchor)
            .collect::<Result<Vec<_>, _>>()
            .map(AnchorList)
    }
}

fn parse_anchor(text: &str) -> Result<BuildEntry, String> {
    let (atom, references) = text
        .split_once(':')
        .ok_or_else(|| format!("anchor '{text}' must look like atom:bond,angle,dihedral"))?;
    let parse = |token: &str| {
        token
            .trim()
            .parse::<AtomKey>()
            .map_err(|_| format!("invalid atom key '{}' in anchor '{text}'", token.trim()))
    };
    let atom = parse(atom)?;
    let references = references
        .split(',')
        .map(parse)
        .collect::<Result<Vec<_>, _>>()?;

    match references.as_slice() {
        [bond, angle, dihedral] => Ok(BuildEntry::new(atom, *bond, *angle, *dihedral)),
        _ => Err(format!("anchor '{text}' needs exactly three references")),
    }
}

/// Entries placing `start` in order, each referencing up to three predecessors.
fn prefix_entries(start: &[AtomKey]) -> Vec<BuildEntry> {
    start
        .iter()
        .enumerate()
        .filter_map(|(i, &atom)| {
            let references: Vec<AtomKey> = start[..i].iter().rev().take(3).copied().collect();
            BuildEntry::from_references(atom, &references)
        })
        .collect()
}

/// Builds the Z-matrix of `molecule` with the requested strategy.
pub fn run(molecule: &Molecule, args: &ZmatArgs) -> Result<ZMatrix> {
    let level = RecursionLevel::try_from(args.level)?;
    let bonds = args.bonds.config();

    let mut config = ZmatConfig::new()
        .with_level(level)
        .with_bond_config(bonds)
        .with_already_built(prefix_entries(&args.start));
    config.order.chain_threshold = args.chain_threshold;
    config.order.pair_threshold = args.pair_threshold;
    if args.zero_degenerate {
        config = config.with_degenerate_policy(DegeneratePolicy::Zero);
    }

    if !args.fragments.is_empty() {
        let graph = bond_graph(molecule, &bonds).context("Failed to perceive bonds")?;
        for anchors in &args.fragments {
            let fragment = Fragment::from_anchors(&graph, anchors.0.clone())
                .context("Failed to resolve fragment atoms")?;
            log::info!("fragment with {} atom(s)", fragment.len());
            config = config.with_fragment(fragment);
        }
    }

    run_with_spinner("Building z-matrix", || {
        to_zmat(molecule, &config).context("Failed to build z-matrix")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_list_parses_entries() {
        let list: AnchorList = "4:3,2,1; 5:4,3,2;".parse().unwrap();
        assert_eq!(
            list.0,
            vec![BuildEntry::new(4, 3, 2, 1), BuildEntry::new(5, 4, 3, 2)]
        );
    }

    #[test]
    fn anchor_list_rejects_incomplete_entries() {
        assert!("4:3,2".parse::<AnchorList>().is_err());
        assert!("4-3,2,1".parse::<AnchorList>().is_err());
        assert!("x:3,2,1".parse::<AnchorList>().is_err());
    }

    #[test]
    fn prefix_entries_reference_predecessors() {
        let entries = prefix_entries(&[7, 3, 5, 1, 0]);
        assert_eq!(entries[0], BuildEntry::first(7));
        assert_eq!(entries[2], BuildEntry::third(5, 3, 7));
        assert_eq!(entries[4], BuildEntry::new(0, 1, 5, 3));
    }
}
