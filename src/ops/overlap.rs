//! Pairwise distance and bond-radius overlap matrices for a subset of atoms.

use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::types::AtomKey;
use nalgebra::DMatrix;

/// Overlap stored on the diagonal so an atom is never its own bond candidate.
pub const SELF_OVERLAP: f64 = -1.0;

/// Dense distance and overlap matrices over a list of atoms.
///
/// Row and column `i` correspond to `keys()[i]`. The overlap of two atoms is the sum of
/// their bond sizes minus their distance; a strictly positive overlap marks a bond
/// candidate.
#[derive(Debug, Clone)]
pub struct OverlapMatrix {
    keys: Vec<AtomKey>,
    distances: DMatrix<f64>,
    overlaps: DMatrix<f64>,
}

impl OverlapMatrix {
    /// Computes both matrices for `keys`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] for keys absent from `molecule` and
    /// [`Error::NonFinitePosition`] for atoms with NaN or infinite coordinates.
    pub fn compute(molecule: &Molecule, keys: &[AtomKey]) -> Result<Self, Error> {
        let atoms = keys
            .iter()
            .map(|&key| {
                let atom = molecule.atom(key).ok_or_else(|| Error::key_not_found(key))?;
                if atom.has_finite_position() {
                    Ok(atom)
                } else {
                    Err(Error::NonFinitePosition { key })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let n = atoms.len();
        let sizes: Vec<f64> = atoms.iter().map(|atom| atom.bond_size()).collect();
        let mut distances = DMatrix::zeros(n, n);
        let mut overlaps = DMatrix::from_element(n, n, SELF_OVERLAP);

        for i in 0..n {
            for j in (i + 1)..n {
                let distance = atoms[i].distance(atoms[j]);
                let overlap = sizes[i] + sizes[j] - distance;
                distances[(i, j)] = distance;
                distances[(j, i)] = distance;
                overlaps[(i, j)] = overlap;
                overlaps[(j, i)] = overlap;
            }
        }

        Ok(Self {
            keys: keys.to_vec(),
            distances,
            overlaps,
        })
    }

    pub fn keys(&self) -> &[AtomKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distances[(i, j)]
    }

    pub fn overlap(&self, i: usize, j: usize) -> f64 {
        self.overlaps[(i, j)]
    }

    pub fn is_candidate(&self, i: usize, j: usize) -> bool {
        self.overlaps[(i, j)] > 0.0
    }

    pub fn distances(&self) -> &DMatrix<f64> {
        &self.distances
    }

    pub fn overlaps(&self) -> &DMatrix<f64> {
        &self.overlaps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::types::{Element, Point};

    fn triangle() -> Molecule {
        [
            Atom::new(Element::C, Point::new(0.0, 0.0, 0.0)).with_bond_size(0.6),
            Atom::new(Element::C, Point::new(1.0, 0.0, 0.0)).with_bond_size(0.6),
            Atom::new(Element::C, Point::new(0.0, 3.0, 0.0)).with_bond_size(0.6),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn compute_builds_symmetric_distance_matrix() {
        let matrix = OverlapMatrix::compute(&triangle(), &[0, 1, 2]).unwrap();

        assert!((matrix.distance(0, 1) - 1.0).abs() < 1e-12);
        assert!((matrix.distance(0, 2) - 3.0).abs() < 1e-12);
        assert!((matrix.distance(1, 2) - 10f64.sqrt()).abs() < 1e-12);
        assert_eq!(matrix.distances(), &matrix.distances().transpose());
        assert_eq!(matrix.distance(1, 1), 0.0);
    }

    #[test]
    fn compute_sets_self_overlap_sentinel() {
        let matrix = OverlapMatrix::compute(&triangle(), &[0, 1, 2]).unwrap();

        for i in 0..3 {
            assert_eq!(matrix.overlap(i, i), SELF_OVERLAP);
            assert!(!matrix.is_candidate(i, i));
        }
    }

    #[test]
    fn compute_marks_overlapping_pairs_as_candidates() {
        let matrix = OverlapMatrix::compute(&triangle(), &[0, 1, 2]).unwrap();

        assert!((matrix.overlap(0, 1) - 0.2).abs() < 1e-12);
        assert!(matrix.is_candidate(0, 1));
        assert!(matrix.is_candidate(1, 0));
        assert!(!matrix.is_candidate(0, 2));
    }

    #[test]
    fn compute_follows_requested_key_order() {
        let matrix = OverlapMatrix::compute(&triangle(), &[2, 0]).unwrap();

        assert_eq!(matrix.keys(), &[2, 0]);
        assert_eq!(matrix.len(), 2);
        assert!((matrix.distance(0, 1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn compute_rejects_unknown_keys() {
        assert_eq!(
            OverlapMatrix::compute(&triangle(), &[0, 9]).unwrap_err(),
            Error::KeyNotFound { key: 9 }
        );
    }
}
