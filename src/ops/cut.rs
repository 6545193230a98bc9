//! Geometric selections with optional bond preservation.
//!
//! A cut keeps the atoms strictly inside (or outside) a sphere or an axis-aligned cuboid.
//! Passing a bond graph grows the selection with [`preserve_bonds`], so no covalent bond
//! crosses the border of the result.

use super::connectivity::preserve_bonds;
use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::topology::BondGraph;
use crate::model::types::{AtomKey, Point};
use std::collections::BTreeSet;

/// Center of a cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    Point(Point),
    /// Position of an atom of the molecule being cut.
    Atom(AtomKey),
}

impl Origin {
    fn resolve(&self, molecule: &Molecule) -> Result<Point, Error> {
        match *self {
            Origin::Point(point) => Ok(point),
            Origin::Atom(key) => molecule.position(key).ok_or_else(|| Error::key_not_found(key)),
        }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Origin::Point(Point::origin())
    }
}

impl From<Point> for Origin {
    fn from(point: Point) -> Self {
        Origin::Point(point)
    }
}

/// Which side of the shape to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Inside,
    Outside,
}

/// Keeps the atoms closer than `radius` to `origin` (or not closer, with
/// [`Region::Outside`]).
///
/// # Errors
///
/// * [`Error::InvalidParameter`] for a non-positive or non-finite radius.
/// * [`Error::KeyNotFound`] for an unknown origin atom, or when `preserve` misses a
///   selected atom.
pub fn cut_sphere(
    molecule: &Molecule,
    origin: Origin,
    radius: f64,
    region: Region,
    preserve: Option<&BondGraph>,
) -> Result<Molecule, Error> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(Error::invalid_parameter("radius", format!("must be positive, got {radius}")));
    }
    let center = origin.resolve(molecule)?;
    cut(molecule, region, preserve, |pos| nalgebra::distance(pos, &center) < radius)
}

/// Keeps the atoms inside the axis-aligned cuboid with the given full edge lengths,
/// centered on `origin` (or outside it, with [`Region::Outside`]).
///
/// # Errors
///
/// * [`Error::InvalidParameter`] for non-positive or non-finite edge lengths.
/// * [`Error::KeyNotFound`] for an unknown origin atom, or when `preserve` misses a
///   selected atom.
pub fn cut_cuboid(
    molecule: &Molecule,
    origin: Origin,
    edges: [f64; 3],
    region: Region,
    preserve: Option<&BondGraph>,
) -> Result<Molecule, Error> {
    if let Some(edge) = edges.iter().find(|edge| !(edge.is_finite() && **edge > 0.0)) {
        return Err(Error::invalid_parameter("edges", format!("must be positive, got {edge}")));
    }
    let center = origin.resolve(molecule)?;
    cut(molecule, region, preserve, |pos| {
        (0..3).all(|axis| (pos[axis] - center[axis]).abs() < edges[axis] / 2.0)
    })
}

fn cut(
    molecule: &Molecule,
    region: Region,
    preserve: Option<&BondGraph>,
    inside: impl Fn(&Point) -> bool,
) -> Result<Molecule, Error> {
    let selected: BTreeSet<AtomKey> = molecule
        .iter()
        .filter(|(_, atom)| inside(&atom.pos) == (region == Region::Inside))
        .map(|(key, _)| key)
        .collect();

    let selected = match preserve {
        Some(graph) => preserve_bonds(graph, &selected)?,
        None => selected,
    };

    Ok(molecule.select(selected))
}
