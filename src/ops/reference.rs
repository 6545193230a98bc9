//! Choice of the bond, angle, and dihedral reference atoms for every atom of a build order.

use super::error::Error;
use super::geometry::is_collinear;
use super::order::RecursionLevel;
use crate::model::molecule::Molecule;
use crate::model::topology::BondGraph;
use crate::model::types::{AtomKey, Point};
use crate::model::zmatrix::BuildEntry;
use std::collections::HashMap;

/// Sine of the reference angle below which a candidate counts as collinear.
const COLLINEAR_TOLERANCE: f64 = 1e-3;

/// Assigns references to every atom of `order`.
///
/// Entry `i` receives `min(i, 3)` distinct references taken from the atoms placed before
/// it. Entries listed in `defined` are used verbatim; their references must either precede
/// the atom in `order` or lie outside `order` altogether (fragment anchors pointing into
/// an already built molecule).
///
/// At [`RecursionLevel::Plain`] the references are the preceding atoms of the order. At
/// the other levels each reference is searched around an anchor (the atom itself for the
/// bond reference, the previous reference afterwards): bonded neighbors of the anchor come
/// first, nearest to the anchor first, then the placed atoms nearest to the atom itself.
/// Candidates that would make the angle or the dihedral undefined are skipped while an
/// alternative exists. Ties go to the lower key.
///
/// # Errors
///
/// * [`Error::KeyNotFound`] if an atom or defined reference is not part of `molecule`.
/// * [`Error::InvalidBuildEntry`] if `order` repeats an atom, or if a defined entry names
///   an atom outside `order`, has malformed references, references a later atom, or
///   carries fewer than `min(i, 3)` references at position `i`.
pub fn pick_references(
    molecule: &Molecule,
    graph: &BondGraph,
    order: &[AtomKey],
    defined: &[BuildEntry],
    level: RecursionLevel,
) -> Result<Vec<BuildEntry>, Error> {
    let mut rank: HashMap<AtomKey, usize> = HashMap::with_capacity(order.len());
    let mut positions: HashMap<AtomKey, Point> = HashMap::with_capacity(order.len());
    for (i, &key) in order.iter().enumerate() {
        let pos = molecule.position(key).ok_or_else(|| Error::key_not_found(key))?;
        if rank.insert(key, i).is_some() {
            return Err(Error::invalid_build_entry(
                key,
                "atom appears twice in the build order",
            ));
        }
        positions.insert(key, pos);
    }

    let mut fixed: HashMap<AtomKey, BuildEntry> = HashMap::with_capacity(defined.len());
    for entry in defined {
        validate_defined(molecule, entry, &rank)?;
        fixed.insert(entry.atom, *entry);
    }

    let picker = Picker {
        graph,
        positions: &positions,
        rank: &rank,
    };

    Ok(order
        .iter()
        .enumerate()
        .map(|(i, &atom)| match fixed.get(&atom) {
            Some(entry) => *entry,
            None => picker.entry(order, i, atom, level),
        })
        .collect())
}

fn validate_defined(
    molecule: &Molecule,
    entry: &BuildEntry,
    rank: &HashMap<AtomKey, usize>,
) -> Result<(), Error> {
    let Some(&position) = rank.get(&entry.atom) else {
        return Err(Error::invalid_build_entry(
            entry.atom,
            "defined entry for an atom outside the build order",
        ));
    };
    if !entry.is_prefix_ordered() {
        return Err(Error::invalid_build_entry(
            entry.atom,
            "angle or dihedral reference given without its predecessors",
        ));
    }
    if !entry.has_distinct_references() {
        return Err(Error::invalid_build_entry(
            entry.atom,
            "references must be distinct from each other and from the atom",
        ));
    }
    let required = position.min(3);
    if entry.reference_count() < required {
        return Err(Error::invalid_build_entry(
            entry.atom,
            format!(
                "entry at position {position} needs {required} reference(s), found {}",
                entry.reference_count()
            ),
        ));
    }
    for reference in entry.references() {
        if !molecule.contains(reference) {
            return Err(Error::key_not_found(reference));
        }
        if rank.get(&reference).is_some_and(|&r| r > position) {
            return Err(Error::invalid_build_entry(
                entry.atom,
                format!("reference {reference} is placed after the atom"),
            ));
        }
    }
    Ok(())
}

struct Picker<'a> {
    graph: &'a BondGraph,
    positions: &'a HashMap<AtomKey, Point>,
    rank: &'a HashMap<AtomKey, usize>,
}

impl Picker<'_> {
    fn entry(
        &self,
        order: &[AtomKey],
        i: usize,
        atom: AtomKey,
        level: RecursionLevel,
    ) -> BuildEntry {
        let wanted = i.min(3);

        let references: Vec<AtomKey> = if level == RecursionLevel::Plain {
            (1..=wanted).map(|back| order[i - back]).collect()
        } else {
            let mut chosen = Vec::with_capacity(wanted);
            for _ in 0..wanted {
                let anchor = chosen.last().copied().unwrap_or(atom);
                match self.next_reference(atom, anchor, i, &chosen) {
                    Some(reference) => chosen.push(reference),
                    None => break,
                }
            }
            chosen
        };

        BuildEntry {
            atom,
            bond: references.first().copied(),
            angle: references.get(1).copied(),
            dihedral: references.get(2).copied(),
        }
    }

    fn next_reference(
        &self,
        atom: AtomKey,
        anchor: AtomKey,
        placed_before: usize,
        chosen: &[AtomKey],
    ) -> Option<AtomKey> {
        let usable = |key: AtomKey| {
            key != atom
                && !chosen.contains(&key)
                && self.rank.get(&key).is_some_and(|&r| r < placed_before)
        };

        let mut bonded: Vec<AtomKey> = self
            .graph
            .neighbors(anchor)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&key| usable(key))
            .collect();
        bonded.sort_by(|&a, &b| {
            self.distance(anchor, a)
                .total_cmp(&self.distance(anchor, b))
                .then(a.cmp(&b))
        });

        if let Some(&key) = bonded
            .iter()
            .find(|&&key| self.is_well_defined(atom, chosen, key))
        {
            return Some(key);
        }

        let by_distance =
            |a: &(f64, AtomKey), b: &(f64, AtomKey)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        let mut nearest: Option<(f64, AtomKey)> = None;
        let mut nearest_defined: Option<(f64, AtomKey)> = None;
        for &key in self.rank.keys() {
            if !usable(key) || bonded.contains(&key) {
                continue;
            }
            let candidate = (self.distance(atom, key), key);
            if nearest.is_none_or(|best| by_distance(&candidate, &best).is_lt()) {
                nearest = Some(candidate);
            }
            if nearest_defined.is_none_or(|best| by_distance(&candidate, &best).is_lt())
                && self.is_well_defined(atom, chosen, key)
            {
                nearest_defined = Some(candidate);
            }
        }

        nearest_defined
            .map(|(_, key)| key)
            .or_else(|| bonded.first().copied())
            .or(nearest.map(|(_, key)| key))
    }

    /// Whether adding `candidate` keeps the angle and dihedral computable.
    fn is_well_defined(&self, atom: AtomKey, chosen: &[AtomKey], candidate: AtomKey) -> bool {
        let pos = |key: AtomKey| &self.positions[&key];
        match *chosen {
            [bond] => !is_collinear(pos(atom), pos(bond), pos(candidate), COLLINEAR_TOLERANCE),
            [bond, angle] => {
                !is_collinear(pos(bond), pos(angle), pos(candidate), COLLINEAR_TOLERANCE)
            }
            _ => true,
        }
    }

    fn distance(&self, a: AtomKey, b: AtomKey) -> f64 {
        nalgebra::distance(&self.positions[&a], &self.positions[&b])
    }
}
