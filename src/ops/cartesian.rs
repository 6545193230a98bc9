//! Reconstruction of Cartesian coordinates from a Z-matrix.

use super::error::Error;
use super::geometry::{DEGENERATE_TOLERANCE, place_atom};
use crate::model::atom::Atom;
use crate::model::molecule::Molecule;
use crate::model::types::{AtomKey, Point};
use crate::model::zmatrix::{ZMatrix, ZmatRow};
use nalgebra::Vector3;
use std::collections::HashMap;

/// Places every row of `zmat` in Cartesian space, keeping the atom keys.
///
/// The first row sits at the origin, a row with only a bond reference lies on the +x
/// direction from that reference, and a row with bond and angle references lies in the
/// xy-plane (on the +y side of the bond-angle axis). Rows with all three references are
/// placed with the natural extension reference frame. The result is unique up to the
/// rigid motion fixed by these conventions.
///
/// # Errors
///
/// * [`Error::KeyNotFound`] when a row references an atom without an earlier row.
/// * [`Error::InvalidBuildEntry`] when a row carries more references than rows precede
///   it, or a later row lacks references.
/// * [`Error::DegenerateGeometry`] when the references of a row are coincident or
///   collinear.
pub fn to_cartesian(zmat: &ZMatrix) -> Result<Molecule, Error> {
    let mut placed: HashMap<AtomKey, Point> = HashMap::with_capacity(zmat.len());
    let mut molecule = Molecule::new();

    for (index, row) in zmat.iter().enumerate() {
        let expected = index.min(3);
        let given = row.references().len();
        if given != expected {
            return Err(Error::invalid_build_entry(
                row.atom,
                format!("row {index} needs {expected} reference(s), found {given}"),
            ));
        }

        let pos = place_row(row, &placed)?;
        placed.insert(row.atom, pos);
        molecule.insert_atom(row.atom, Atom::new(row.element, pos));
    }

    log::debug!("reconstructed {} atom(s) from z-matrix", molecule.atom_count());
    Ok(molecule)
}

fn place_row(row: &ZmatRow, placed: &HashMap<AtomKey, Point>) -> Result<Point, Error> {
    let lookup = |key: AtomKey| placed.get(&key).copied().ok_or_else(|| Error::key_not_found(key));

    match (row.bond, row.angle, row.dihedral) {
        (None, _, _) => Ok(Point::origin()),
        (Some((b, r)), None, _) => Ok(lookup(b)? + Vector3::x() * r),
        (Some((b, r)), Some((a, theta)), None) => {
            let (b_pos, a_pos) = (lookup(b)?, lookup(a)?);
            let axis = a_pos - b_pos;
            if axis.norm() < DEGENERATE_TOLERANCE {
                return Err(Error::degenerate(&[row.atom, b, a], "coincident references"));
            }
            let u = axis.normalize();
            let w = u.cross(&Vector3::z());
            if w.norm() < DEGENERATE_TOLERANCE {
                return Err(Error::degenerate(
                    &[row.atom, b, a],
                    "bond-angle axis is perpendicular to the xy-plane",
                ));
            }
            let w = w.normalize();
            let theta = theta.to_radians();
            Ok(b_pos + (u * theta.cos() + w * theta.sin()) * r)
        }
        (Some((b, r)), Some((a, theta)), Some((d, phi))) => {
            let (b_pos, a_pos, d_pos) = (lookup(b)?, lookup(a)?, lookup(d)?);
            place_atom(&b_pos, &a_pos, &d_pos, r, theta, phi).ok_or_else(|| {
                Error::degenerate(&[row.atom, b, a, d], "collinear references")
            })
        }
    }
}
