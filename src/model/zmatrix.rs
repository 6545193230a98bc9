//! Internal-coordinate tables and the build entries they are assembled from.
//!
//! A [`BuildEntry`] names an atom together with up to three previously placed reference
//! atoms. A [`ZMatrix`] is the ordered table of [`ZmatRow`]s computed from those entries:
//! each row stores the bond length to its first reference, the angle spanned with the
//! second, and the dihedral defined with the third.

use super::types::{AtomKey, Element};
use std::collections::HashMap;
use std::fmt;

/// Atom to place and the references it is placed against.
///
/// References fill in prefix order: an angle reference implies a bond reference and a
/// dihedral reference implies both. The constructors enforce this shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuildEntry {
    pub atom: AtomKey,
    pub bond: Option<AtomKey>,
    pub angle: Option<AtomKey>,
    pub dihedral: Option<AtomKey>,
}

impl BuildEntry {
    /// Entry without references; only valid for the first atom of a table.
    pub fn first(atom: AtomKey) -> Self {
        Self {
            atom,
            bond: None,
            angle: None,
            dihedral: None,
        }
    }

    pub fn second(atom: AtomKey, bond: AtomKey) -> Self {
        Self {
            bond: Some(bond),
            ..Self::first(atom)
        }
    }

    pub fn third(atom: AtomKey, bond: AtomKey, angle: AtomKey) -> Self {
        Self {
            angle: Some(angle),
            ..Self::second(atom, bond)
        }
    }

    pub fn new(atom: AtomKey, bond: AtomKey, angle: AtomKey, dihedral: AtomKey) -> Self {
        Self {
            dihedral: Some(dihedral),
            ..Self::third(atom, bond, angle)
        }
    }

    /// Builds an entry from a reference slice of length 0 to 3.
    ///
    /// Returns `None` for longer slices.
    pub fn from_references(atom: AtomKey, references: &[AtomKey]) -> Option<Self> {
        match *references {
            [] => Some(Self::first(atom)),
            [bond] => Some(Self::second(atom, bond)),
            [bond, angle] => Some(Self::third(atom, bond, angle)),
            [bond, angle, dihedral] => Some(Self::new(atom, bond, angle, dihedral)),
            _ => None,
        }
    }

    /// References in bond, angle, dihedral order, stopping at the first missing one.
    pub fn references(&self) -> Vec<AtomKey> {
        [self.bond, self.angle, self.dihedral]
            .into_iter()
            .map_while(|reference| reference)
            .collect()
    }

    pub fn reference_count(&self) -> usize {
        self.references().len()
    }

    /// `true` when no reference is set without its predecessors.
    pub fn is_prefix_ordered(&self) -> bool {
        let set = [self.bond, self.angle, self.dihedral]
            .iter()
            .filter(|reference| reference.is_some())
            .count();
        set == self.reference_count()
    }

    /// `true` when the references are pairwise distinct and distinct from the atom.
    pub fn has_distinct_references(&self) -> bool {
        let references = self.references();
        references.iter().enumerate().all(|(i, reference)| {
            *reference != self.atom && !references[..i].contains(reference)
        })
    }
}

/// One row of a Z-matrix: the atom plus `(reference, value)` pairs.
///
/// Bond lengths are in ångströms, angles and dihedrals in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZmatRow {
    pub atom: AtomKey,
    pub element: Element,
    pub bond: Option<(AtomKey, f64)>,
    pub angle: Option<(AtomKey, f64)>,
    pub dihedral: Option<(AtomKey, f64)>,
}

impl ZmatRow {
    pub fn new(atom: AtomKey, element: Element) -> Self {
        Self {
            atom,
            element,
            bond: None,
            angle: None,
            dihedral: None,
        }
    }

    /// The build entry this row was computed from.
    pub fn entry(&self) -> BuildEntry {
        BuildEntry {
            atom: self.atom,
            bond: self.bond.map(|(key, _)| key),
            angle: self.angle.map(|(key, _)| key),
            dihedral: self.dihedral.map(|(key, _)| key),
        }
    }

    pub fn references(&self) -> Vec<AtomKey> {
        self.entry().references()
    }
}

/// Ordered Z-matrix table indexed by atom key.
///
/// Rows are written once; [`ZMatrix::push`] refuses a second row for the same atom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZMatrix {
    rows: Vec<ZmatRow>,
    index: HashMap<AtomKey, usize>,
}

impl ZMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Appends a row. Returns the rejected row when its atom is already present.
    pub fn push(&mut self, row: ZmatRow) -> Result<(), ZmatRow> {
        if self.index.contains_key(&row.atom) {
            return Err(row);
        }
        self.index.insert(row.atom, self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    pub fn row(&self, atom: AtomKey) -> Option<&ZmatRow> {
        self.index.get(&atom).map(|&idx| &self.rows[idx])
    }

    /// Position of the atom's row in build order.
    pub fn position(&self, atom: AtomKey) -> Option<usize> {
        self.index.get(&atom).copied()
    }

    pub fn rows(&self) -> &[ZmatRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ZmatRow> {
        self.rows.iter()
    }

    pub fn contains(&self, atom: AtomKey) -> bool {
        self.index.contains_key(&atom)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Atom keys in build order.
    pub fn keys(&self) -> impl Iterator<Item = AtomKey> + '_ {
        self.rows.iter().map(|row| row.atom)
    }

    /// Every row references only rows placed before it, with at most `min(i, 3)`
    /// distinct references for row `i`.
    pub fn is_consistent(&self) -> bool {
        self.rows.iter().enumerate().all(|(i, row)| {
            let entry = row.entry();
            entry.is_prefix_ordered()
                && entry.has_distinct_references()
                && entry.reference_count() <= i.min(3)
                && entry
                    .references()
                    .iter()
                    .all(|reference| self.position(*reference).is_some_and(|pos| pos < i))
        })
    }
}

impl<'a> IntoIterator for &'a ZMatrix {
    type Item = &'a ZmatRow;
    type IntoIter = std::slice::Iter<'a, ZmatRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for ZMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            write!(f, "{:<6} {:<3}", row.atom, row.element.symbol())?;
            for (reference, value) in [row.bond, row.angle, row.dihedral].into_iter().flatten() {
                write!(f, " {:>6} {:>12.6}", reference, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
