//! Fragments: parts of a molecule built separately and attached through anchor entries.
//!
//! A fragment is placed after the rest of the molecule. Its first atoms are given by at
//! least three anchor [`BuildEntry`]s whose references point into the main molecule, so
//! the fragment keeps a fixed position and orientation relative to it; the remaining
//! fragment atoms are then referenced within the fragment only.

use super::connectivity::fragment_atoms;
use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::topology::BondGraph;
use crate::model::types::AtomKey;
use crate::model::zmatrix::{BuildEntry, ZMatrix};
use std::collections::{BTreeSet, HashMap};

/// Minimum number of anchor entries needed to fix a fragment in space.
pub const MIN_ANCHORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Every atom of the fragment, anchors included.
    pub atoms: BTreeSet<AtomKey>,
    /// Entries placing the first fragment atoms, in build order.
    pub anchors: Vec<BuildEntry>,
}

impl Fragment {
    pub fn new(atoms: impl IntoIterator<Item = AtomKey>, anchors: Vec<BuildEntry>) -> Self {
        Self {
            atoms: atoms.into_iter().collect(),
            anchors,
        }
    }

    /// Derives the fragment atoms from the bond graph.
    ///
    /// The fragment is everything reachable from the anchor atoms without crossing the
    /// bond references that lie outside the anchors (see [`fragment_atoms`]).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] when no anchor has a bond reference and
    /// [`Error::KeyNotFound`] for anchor atoms absent from `graph`.
    pub fn from_anchors(graph: &BondGraph, anchors: Vec<BuildEntry>) -> Result<Self, Error> {
        let anchored: BTreeSet<AtomKey> = anchors.iter().map(|entry| entry.atom).collect();
        let bonds: Vec<(AtomKey, AtomKey)> = anchors
            .iter()
            .filter_map(|entry| entry.bond.map(|main| (main, entry.atom)))
            .filter(|(main, _)| !anchored.contains(main))
            .collect();
        let atoms = fragment_atoms(graph, &bonds)?;
        Ok(Self { atoms, anchors })
    }

    /// Anchor atoms in build order.
    pub fn anchor_atoms(&self) -> Vec<AtomKey> {
        self.anchors.iter().map(|entry| entry.atom).collect()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Checks fragment definitions before any build-order work starts.
///
/// # Errors
///
/// * [`Error::KeyNotFound`] for fragment atoms or anchor references absent from
///   `molecule`.
/// * [`Error::FragmentOverlap`] when two fragments share an atom.
/// * [`Error::FragmentInconsistent`] when a fragment has fewer than three anchors, an
///   anchor lacks one of its three references, an anchor atom lies outside the fragment,
///   an anchor references anything other than main-molecule atoms or earlier anchors, or
///   an `already_built` entry touches a fragment atom.
pub fn validate_fragments(
    molecule: &Molecule,
    fragments: &[Fragment],
    already_built: &[BuildEntry],
) -> Result<(), Error> {
    let mut owner: HashMap<AtomKey, usize> = HashMap::new();
    for (index, fragment) in fragments.iter().enumerate() {
        if fragment.is_empty() {
            return Err(Error::fragment_inconsistent(index, "fragment has no atoms"));
        }
        for &key in &fragment.atoms {
            if !molecule.contains(key) {
                return Err(Error::key_not_found(key));
            }
            if let Some(&other) = owner.get(&key) {
                return Err(Error::FragmentOverlap {
                    fragment: index,
                    other,
                    key,
                });
            }
            owner.insert(key, index);
        }
    }

    for (index, fragment) in fragments.iter().enumerate() {
        validate_anchors(molecule, index, fragment, &owner)?;
    }

    for entry in already_built {
        let touched = std::iter::once(entry.atom)
            .chain(entry.references())
            .find_map(|key| owner.get(&key).map(|&index| (key, index)));
        if let Some((key, index)) = touched {
            return Err(Error::fragment_inconsistent(
                index,
                format!("already built entry for atom {} uses fragment atom {key}", entry.atom),
            ));
        }
    }

    Ok(())
}

fn validate_anchors(
    molecule: &Molecule,
    index: usize,
    fragment: &Fragment,
    owner: &HashMap<AtomKey, usize>,
) -> Result<(), Error> {
    if fragment.anchors.len() < MIN_ANCHORS {
        return Err(Error::fragment_inconsistent(
            index,
            format!(
                "{} anchor(s) given, at least {MIN_ANCHORS} are required",
                fragment.anchors.len()
            ),
        ));
    }

    let mut placed: BTreeSet<AtomKey> = BTreeSet::new();
    for anchor in &fragment.anchors {
        if !fragment.atoms.contains(&anchor.atom) {
            return Err(Error::fragment_inconsistent(
                index,
                format!("anchor atom {} is not part of the fragment", anchor.atom),
            ));
        }
        if anchor.reference_count() != 3 || !anchor.is_prefix_ordered() {
            return Err(Error::fragment_inconsistent(
                index,
                format!("anchor for atom {} needs bond, angle and dihedral references", anchor.atom),
            ));
        }
        if !anchor.has_distinct_references() {
            return Err(Error::fragment_inconsistent(
                index,
                format!("anchor for atom {} repeats a reference", anchor.atom),
            ));
        }
        for reference in anchor.references() {
            if !molecule.contains(reference) {
                return Err(Error::key_not_found(reference));
            }
            let is_main = !owner.contains_key(&reference);
            if !is_main && !placed.contains(&reference) {
                return Err(Error::fragment_inconsistent(
                    index,
                    format!(
                        "anchor for atom {} references {reference}, which is neither a main-molecule atom nor an earlier anchor",
                        anchor.atom
                    ),
                ));
            }
        }
        if !placed.insert(anchor.atom) {
            return Err(Error::fragment_inconsistent(
                index,
                format!("atom {} is anchored twice", anchor.atom),
            ));
        }
    }

    Ok(())
}

/// Appends the rows of a separately built fragment Z-matrix to the main Z-matrix.
///
/// Every reference of an appended row must resolve to a row of `main` or to an earlier
/// row of `fragment_zmat`.
///
/// # Errors
///
/// Returns [`Error::FragmentInconsistent`] (tagged with `fragment`) on key collisions
/// and dangling references.
pub fn merge_fragment(
    main: ZMatrix,
    fragment_zmat: &ZMatrix,
    fragment: usize,
) -> Result<ZMatrix, Error> {
    let mut merged = main;

    for row in fragment_zmat {
        if let Some(missing) = row
            .references()
            .into_iter()
            .find(|reference| !merged.contains(*reference))
        {
            return Err(Error::fragment_inconsistent(
                fragment,
                format!("row for atom {} references unknown atom {missing}", row.atom),
            ));
        }
        merged.push(*row).map_err(|rejected| {
            Error::fragment_inconsistent(
                fragment,
                format!("atom {} already has a row in the main z-matrix", rejected.atom),
            )
        })?;
    }

    Ok(merged)
}
