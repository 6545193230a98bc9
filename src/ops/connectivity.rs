//! Reachability queries over a bond graph.
//!
//! These helpers answer "which atoms are covalently connected to X" questions used to
//! extract fragments and to grow geometric selections until no bond crosses their border.

use super::error::Error;
use crate::model::topology::BondGraph;
use crate::model::types::AtomKey;
use std::collections::BTreeSet;

/// Returns every atom reachable from `seed` along bonds, never entering `exclude`.
///
/// The traversal starts from `seed` and its direct neighbors (minus `exclude`) and keeps
/// adding unvisited neighbors of newly reached atoms until the set stops growing. An
/// excluded seed is itself dropped, but its neighbors still start the traversal.
///
/// # Errors
///
/// Returns [`Error::KeyNotFound`] if `seed` is not part of `graph`.
pub fn connected_to(
    graph: &BondGraph,
    seed: AtomKey,
    exclude: &BTreeSet<AtomKey>,
) -> Result<BTreeSet<AtomKey>, Error> {
    let neighbors = graph
        .neighbors(seed)
        .ok_or_else(|| Error::key_not_found(seed))?;

    let mut reached: BTreeSet<AtomKey> = std::iter::once(seed)
        .chain(neighbors.iter().copied())
        .filter(|key| !exclude.contains(key))
        .collect();
    let mut worklist: Vec<AtomKey> = reached.iter().copied().collect();

    while let Some(current) = worklist.pop() {
        let Some(next) = graph.neighbors(current) else {
            continue;
        };
        for &partner in next {
            if !exclude.contains(&partner) && reached.insert(partner) {
                worklist.push(partner);
            }
        }
    }

    Ok(reached)
}

/// Atoms of the fragment attached to the rest of the molecule through `anchor_bonds`.
///
/// Each anchor bond is `(main_atom, fragment_atom)`. The fragment is everything reachable
/// from the first anchor's fragment atom without passing through any anchor's main atom.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for an empty anchor list and
/// [`Error::KeyNotFound`] when an anchor atom is not part of `graph`.
pub fn fragment_atoms(
    graph: &BondGraph,
    anchor_bonds: &[(AtomKey, AtomKey)],
) -> Result<BTreeSet<AtomKey>, Error> {
    let (_, start) = *anchor_bonds
        .first()
        .ok_or_else(|| Error::invalid_parameter("anchor_bonds", "at least one anchor bond is required"))?;

    for &(main, fragment) in anchor_bonds {
        for key in [main, fragment] {
            if !graph.contains(key) {
                return Err(Error::key_not_found(key));
            }
        }
    }

    let exclude: BTreeSet<AtomKey> = anchor_bonds.iter().map(|&(main, _)| main).collect();
    connected_to(graph, start, &exclude)
}

/// Extends `subset` until no bond connects an included atom with an excluded one.
///
/// Every atom bonded to the subset but outside it pulls in its whole connected component,
/// so the result is the union of the components touched by `subset`.
///
/// # Errors
///
/// Returns [`Error::KeyNotFound`] when a subset atom is not part of `graph`.
pub fn preserve_bonds(
    graph: &BondGraph,
    subset: &BTreeSet<AtomKey>,
) -> Result<BTreeSet<AtomKey>, Error> {
    let mut included = subset.clone();
    let none = BTreeSet::new();

    for &key in subset {
        let neighbors = graph
            .neighbors(key)
            .ok_or_else(|| Error::key_not_found(key))?;
        for &partner in neighbors {
            if !included.contains(&partner) {
                included.extend(connected_to(graph, partner, &none)?);
            }
        }
    }

    Ok(included)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topology::Bond;

    /// Two components: a chain 0-1-2-3 with a branch 2-4, and a pair 5-6.
    fn graph() -> BondGraph {
        BondGraph::from_bonds(
            0..8,
            [
                Bond::new(0, 1),
                Bond::new(1, 2),
                Bond::new(2, 3),
                Bond::new(2, 4),
                Bond::new(5, 6),
            ],
        )
    }

    #[test]
    fn connected_to_returns_whole_component() {
        let reached = connected_to(&graph(), 0, &BTreeSet::new()).unwrap();
        assert_eq!(reached, BTreeSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn connected_to_is_invariant_within_component() {
        let graph = graph();
        let none = BTreeSet::new();
        let reference = connected_to(&graph, 0, &none).unwrap();

        for &key in &reference {
            assert_eq!(connected_to(&graph, key, &none).unwrap(), reference);
        }
    }

    #[test]
    fn connected_to_isolated_atom_is_singleton() {
        let reached = connected_to(&graph(), 7, &BTreeSet::new()).unwrap();
        assert_eq!(reached, BTreeSet::from([7]));
    }

    #[test]
    fn connected_to_stops_at_excluded_atoms() {
        let reached = connected_to(&graph(), 3, &BTreeSet::from([1])).unwrap();
        assert_eq!(reached, BTreeSet::from([2, 3, 4]));
    }

    #[test]
    fn connected_to_rejects_unknown_seed() {
        assert_eq!(
            connected_to(&graph(), 42, &BTreeSet::new()).unwrap_err(),
            Error::KeyNotFound { key: 42 }
        );
    }

    #[test]
    fn fragment_atoms_excludes_main_side() {
        let fragment = fragment_atoms(&graph(), &[(1, 2)]).unwrap();
        assert_eq!(fragment, BTreeSet::from([2, 3, 4]));
    }

    #[test]
    fn fragment_atoms_requires_anchor_bonds() {
        assert!(matches!(
            fragment_atoms(&graph(), &[]),
            Err(Error::InvalidParameter { name: "anchor_bonds", .. })
        ));
        assert_eq!(
            fragment_atoms(&graph(), &[(1, 2), (9, 3)]).unwrap_err(),
            Error::KeyNotFound { key: 9 }
        );
    }

    #[test]
    fn preserve_bonds_pulls_in_touched_components() {
        let extended = preserve_bonds(&graph(), &BTreeSet::from([3, 7])).unwrap();
        assert_eq!(extended, BTreeSet::from([0, 1, 2, 3, 4, 7]));
    }

    #[test]
    fn preserve_bonds_never_splits_components() {
        let graph = graph();
        for key in graph.atoms() {
            let extended = preserve_bonds(&graph, &BTreeSet::from([key])).unwrap();
            for bond in graph.bonds() {
                assert_eq!(
                    extended.contains(&bond.a1),
                    extended.contains(&bond.a2),
                    "bond {bond:?} crosses the selection border"
                );
            }
        }
    }

    #[test]
    fn preserve_bonds_rejects_unknown_keys() {
        assert_eq!(
            preserve_bonds(&graph(), &BTreeSet::from([0, 99])).unwrap_err(),
            Error::KeyNotFound { key: 99 }
        );
    }
}
