//! Keyed atom container that owns the cached bond graph of its geometry.
//!
//! Atoms are stored in a `BTreeMap` so iteration follows ascending key order, which is the
//! molecule's input order for every algorithm in [`crate::ops`]. Keys are handed out by a
//! monotonically increasing counter and are never reused after an atom is removed.

use super::atom::Atom;
use super::cache::BondCache;
use super::types::{AtomKey, Element, Point};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Default)]
pub struct Molecule {
    atoms: BTreeMap<AtomKey, Atom>,
    next_key: AtomKey,
    bond_cache: BondCache,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an atom under a freshly allocated key and returns that key.
    pub fn add_atom(&mut self, atom: Atom) -> AtomKey {
        let key = self.next_key;
        self.atoms.insert(key, atom);
        self.next_key = self.next_key.saturating_add(1);
        key
    }

    /// Inserts an atom under an explicit key, replacing any atom already stored there.
    ///
    /// The key counter is advanced past `key` so later [`Molecule::add_atom`] calls never
    /// collide with it.
    pub fn insert_atom(&mut self, key: AtomKey, atom: Atom) -> Option<Atom> {
        self.next_key = self.next_key.max(key.saturating_add(1));
        self.atoms.insert(key, atom)
    }

    /// Removes an atom. Its key is retired and will not be handed out again.
    pub fn remove_atom(&mut self, key: AtomKey) -> Option<Atom> {
        self.atoms.remove(&key)
    }

    pub fn atom(&self, key: AtomKey) -> Option<&Atom> {
        self.atoms.get(&key)
    }

    pub fn atom_mut(&mut self, key: AtomKey) -> Option<&mut Atom> {
        self.atoms.get_mut(&key)
    }

    pub fn position(&self, key: AtomKey) -> Option<Point> {
        self.atoms.get(&key).map(|atom| atom.pos)
    }

    pub fn contains(&self, key: AtomKey) -> bool {
        self.atoms.contains_key(&key)
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Key that the next [`Molecule::add_atom`] call will allocate.
    pub fn next_key(&self) -> AtomKey {
        self.next_key
    }

    pub fn keys(&self) -> impl Iterator<Item = AtomKey> + '_ {
        self.atoms.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomKey, &Atom)> {
        self.atoms.iter().map(|(key, atom)| (*key, atom))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AtomKey, &mut Atom)> {
        self.atoms.iter_mut().map(|(key, atom)| (*key, atom))
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.atoms.values()
    }

    pub fn iter_atoms_mut(&mut self) -> impl Iterator<Item = &mut Atom> {
        self.atoms.values_mut()
    }

    /// Returns a new molecule holding copies of the selected atoms.
    ///
    /// Keys are preserved and unknown keys are skipped. The key counter is inherited so
    /// atoms added to the selection never reuse a key of the parent molecule.
    pub fn select(&self, keys: impl IntoIterator<Item = AtomKey>) -> Molecule {
        let atoms = keys
            .into_iter()
            .filter_map(|key| self.atoms.get(&key).map(|atom| (key, atom.clone())))
            .collect();

        Molecule {
            atoms,
            next_key: self.next_key,
            bond_cache: BondCache::new(),
        }
    }

    /// Arithmetic mean of the selected atom positions, ignoring unknown keys.
    ///
    /// Returns `None` when no selected key is present.
    pub fn topologic_center_of(&self, keys: impl IntoIterator<Item = AtomKey>) -> Option<Point> {
        let mut sum = nalgebra::Vector3::zeros();
        let mut count = 0usize;

        for atom in keys.into_iter().filter_map(|key| self.atoms.get(&key)) {
            sum += atom.pos.coords;
            count += 1;
        }

        (count > 0).then(|| Point::from(sum / count as f64))
    }

    /// Arithmetic mean of all atom positions, or the origin for an empty molecule.
    pub fn topologic_center(&self) -> Point {
        self.topologic_center_of(self.keys())
            .unwrap_or_else(Point::origin)
    }

    pub fn center_of_mass(&self) -> Point {
        let mut total_mass = 0.0;
        let mut weighted_sum = nalgebra::Vector3::zeros();

        for atom in self.atoms.values() {
            let mass = atom.mass();
            weighted_sum += atom.pos.coords * mass;
            total_mass += mass;
        }

        if total_mass > 1e-9 {
            Point::from(weighted_sum / total_mass)
        } else {
            Point::origin()
        }
    }

    pub fn total_mass(&self) -> f64 {
        self.atoms.values().map(Atom::mass).sum()
    }

    /// Hill-ordered molecular formula (`C`, then `H`, then the rest alphabetically).
    ///
    /// Dummy atoms are not counted.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut has_carbon = false;

        for atom in self.atoms.values().filter(|atom| !atom.element.is_dummy()) {
            has_carbon |= atom.element == Element::C;
            *counts.entry(atom.element.symbol()).or_default() += 1;
        }

        let mut formula = String::new();
        let mut push = |symbol: &str, count: usize| {
            formula.push_str(symbol);
            if count > 1 {
                formula.push_str(&count.to_string());
            }
        };

        if has_carbon {
            for symbol in ["C", "H"] {
                if let Some(count) = counts.remove(symbol) {
                    push(symbol, count);
                }
            }
        }
        for (symbol, count) in counts {
            push(symbol, count);
        }

        formula
    }

    /// 64-bit digest of everything bond perception reads from the molecule.
    ///
    /// Covers keys, elements, the exact bit patterns of the coordinates, and overrides.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash_geometry(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn hash_geometry<H: Hasher>(&self, state: &mut H) {
        self.atoms.len().hash(state);
        for (key, atom) in &self.atoms {
            key.hash(state);
            atom.element.hash(state);
            for coord in atom.pos.coords.iter() {
                coord.to_bits().hash(state);
            }
            atom.overrides.mass.map(f64::to_bits).hash(state);
            atom.overrides.valency.hash(state);
            atom.overrides.bond_size.map(f64::to_bits).hash(state);
        }
    }

    pub(crate) fn bond_cache(&self) -> &BondCache {
        &self.bond_cache
    }
}

impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.next_key == other.next_key && self.atoms == other.atoms
    }
}

impl FromIterator<Atom> for Molecule {
    fn from_iter<T: IntoIterator<Item = Atom>>(iter: T) -> Self {
        let mut molecule = Molecule::new();
        for atom in iter {
            molecule.add_atom(atom);
        }
        molecule
    }
}

impl Extend<Atom> for Molecule {
    fn extend<T: IntoIterator<Item = Atom>>(&mut self, iter: T) {
        for atom in iter {
            self.add_atom(atom);
        }
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Molecule {{ atoms: {}, formula: {} }}",
            self.atom_count(),
            self.formula()
        )
    }
}
