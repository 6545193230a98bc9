//! Graph-based description of covalent connectivity for a [`super::molecule::Molecule`].
//!
//! The bond graph is a symmetric adjacency map keyed by [`AtomKey`]. It is produced
//! wholesale by the bond perception pipeline and never patched afterwards, so symmetry
//! only has to be established once, inside [`BondGraph::from_bonds`].

use super::types::AtomKey;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Undirected bond between two atoms.
///
/// Bonds store canonical atom keys (ascending order) so equality, hashing, and sorting
/// remain stable regardless of the order in which the connection was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Bond {
    /// Key of the first atom (always the lesser key after canonicalization).
    pub a1: AtomKey,
    /// Key of the second atom.
    pub a2: AtomKey,
}

impl Bond {
    /// Creates a new bond while canonicalizing the endpoint ordering.
    pub fn new(key1: AtomKey, key2: AtomKey) -> Self {
        if key1 <= key2 {
            Self { a1: key1, a2: key2 }
        } else {
            Self { a1: key2, a2: key1 }
        }
    }

    /// Returns the partner of `key` in this bond, if `key` is one of its endpoints.
    pub fn partner(&self, key: AtomKey) -> Option<AtomKey> {
        if self.a1 == key {
            Some(self.a2)
        } else if self.a2 == key {
            Some(self.a1)
        } else {
            None
        }
    }
}

/// Symmetric adjacency map from every atom to the atoms it is bonded to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BondGraph {
    adjacency: BTreeMap<AtomKey, BTreeSet<AtomKey>>,
}

impl BondGraph {
    /// Builds a graph over `atoms` from a list of bonds.
    ///
    /// Every atom appears in the graph, isolated atoms with an empty neighbor set.
    /// Bonds are inserted on both endpoints; self-bonds are ignored and endpoints that
    /// are not listed in `atoms` are added as nodes.
    ///
    /// # Arguments
    ///
    /// * `atoms` - Keys of all atoms the graph covers.
    /// * `bonds` - Bonds to insert.
    pub fn from_bonds(
        atoms: impl IntoIterator<Item = AtomKey>,
        bonds: impl IntoIterator<Item = Bond>,
    ) -> Self {
        let mut adjacency: BTreeMap<AtomKey, BTreeSet<AtomKey>> =
            atoms.into_iter().map(|key| (key, BTreeSet::new())).collect();

        for bond in bonds {
            if bond.a1 == bond.a2 {
                continue;
            }
            adjacency.entry(bond.a1).or_default().insert(bond.a2);
            adjacency.entry(bond.a2).or_default().insert(bond.a1);
        }

        Self { adjacency }
    }

    /// Neighbors of `key`, or `None` if the atom is not part of the graph.
    pub fn neighbors(&self, key: AtomKey) -> Option<&BTreeSet<AtomKey>> {
        self.adjacency.get(&key)
    }

    pub fn contains(&self, key: AtomKey) -> bool {
        self.adjacency.contains_key(&key)
    }

    pub fn has_bond(&self, key1: AtomKey, key2: AtomKey) -> bool {
        self.adjacency
            .get(&key1)
            .is_some_and(|neighbors| neighbors.contains(&key2))
    }

    /// Number of bonds of `key`, or `None` if the atom is not part of the graph.
    pub fn degree(&self, key: AtomKey) -> Option<usize> {
        self.adjacency.get(&key).map(BTreeSet::len)
    }

    pub fn atom_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn bond_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// Iterates over atom keys in ascending order.
    pub fn atoms(&self) -> impl Iterator<Item = AtomKey> + '_ {
        self.adjacency.keys().copied()
    }

    /// Iterates over `(atom, neighbors)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (AtomKey, &BTreeSet<AtomKey>)> {
        self.adjacency.iter().map(|(key, neighbors)| (*key, neighbors))
    }

    /// Iterates over each bond exactly once, in canonical order.
    pub fn bonds(&self) -> impl Iterator<Item = Bond> + '_ {
        self.adjacency.iter().flat_map(|(&key, neighbors)| {
            neighbors
                .iter()
                .filter(move |&&other| other > key)
                .map(move |&other| Bond::new(key, other))
        })
    }

    /// Checks that `b ∈ graph[a] ⇔ a ∈ graph[b]` and that no atom is bonded to itself.
    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().all(|(&key, neighbors)| {
            neighbors
                .iter()
                .all(|&other| other != key && self.has_bond(other, key))
        })
    }
}

impl fmt::Display for BondGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BondGraph {{ atoms: {}, bonds: {} }}",
            self.atom_count(),
            self.bond_count()
        )
    }
}
