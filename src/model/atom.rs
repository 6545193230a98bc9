//! Fundamental atom representation comprising chemical element, Cartesian position, and
//! optional per-atom property overrides.
//!
//! Bond perception reads the bond size and valency of every atom. By default these come
//! from the embedded element table; [`Overrides`] lets callers change them for individual
//! atoms (for example a metal center with an unusual coordination number) without
//! touching global data.

use super::types::{Element, Point};
use std::fmt;

/// Per-atom replacements for tabulated element properties.
///
/// `None` fields fall back to the element default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    /// Mass in g/mol.
    pub mass: Option<f64>,
    /// Maximum number of bonds accepted during valency arbitration.
    pub valency: Option<usize>,
    /// Bond radius in ångströms.
    pub bond_size: Option<f64>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.mass.is_none() && self.valency.is_none() && self.bond_size.is_none()
    }
}

/// Atom with element identity, mutable position, and optional property overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Chemical element.
    pub element: Element,
    /// Cartesian coordinates measured in ångströms.
    pub pos: Point,
    /// Property overrides consulted before the element table.
    pub overrides: Overrides,
}

impl Atom {
    /// Creates a new atom without overrides.
    ///
    /// # Arguments
    ///
    /// * `element` - Chemical identity of the atom.
    /// * `pos` - Cartesian coordinates in ångströms.
    pub fn new(element: Element, pos: Point) -> Self {
        Self {
            element,
            pos,
            overrides: Overrides::default(),
        }
    }

    /// Returns the atom with its bond size replaced.
    pub fn with_bond_size(mut self, bond_size: f64) -> Self {
        self.overrides.bond_size = Some(bond_size);
        self
    }

    /// Returns the atom with its valency replaced.
    pub fn with_valency(mut self, valency: usize) -> Self {
        self.overrides.valency = Some(valency);
        self
    }

    /// Returns the atom with its mass replaced.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.overrides.mass = Some(mass);
        self
    }

    /// Effective bond radius: the override if present, otherwise the element default.
    pub fn bond_size(&self) -> f64 {
        self.overrides
            .bond_size
            .unwrap_or_else(|| self.element.bond_size())
    }

    /// Effective valency: the override if present, otherwise the element default.
    pub fn valency(&self) -> usize {
        self.overrides
            .valency
            .unwrap_or_else(|| self.element.valency())
    }

    /// Effective mass: the override if present, otherwise the standard atomic weight.
    pub fn mass(&self) -> f64 {
        self.overrides
            .mass
            .unwrap_or_else(|| self.element.atomic_mass())
    }

    pub fn has_finite_position(&self) -> bool {
        self.pos.coords.iter().all(|c| c.is_finite())
    }

    /// Computes the squared Euclidean distance to another atom.
    pub fn distance_squared(&self, other: &Atom) -> f64 {
        nalgebra::distance_squared(&self.pos, &other.pos)
    }

    /// Computes the Euclidean distance to another atom in ångströms.
    pub fn distance(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.pos, &other.pos)
    }

    /// Translates the atom by an arbitrary vector.
    pub fn translate_by(&mut self, vector: &nalgebra::Vector3<f64>) {
        self.pos += vector;
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ element: {}, pos: [{:.3}, {:.3}, {:.3}] }}",
            self.element, self.pos.x, self.pos.y, self.pos.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_new_has_no_overrides() {
        let atom = Atom::new(Element::C, Point::new(1.0, 2.0, 3.0));

        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.pos, Point::new(1.0, 2.0, 3.0));
        assert!(atom.overrides.is_empty());
    }

    #[test]
    fn atom_properties_default_to_element_table() {
        let atom = Atom::new(Element::O, Point::origin());

        assert_eq!(atom.valency(), Element::O.valency());
        assert_eq!(atom.bond_size(), Element::O.bond_size());
        assert_eq!(atom.mass(), Element::O.atomic_mass());
    }

    #[test]
    fn atom_overrides_take_precedence() {
        let atom = Atom::new(Element::FE, Point::origin())
            .with_bond_size(1.1)
            .with_valency(8)
            .with_mass(56.0);

        assert_eq!(atom.bond_size(), 1.1);
        assert_eq!(atom.valency(), 8);
        assert_eq!(atom.mass(), 56.0);
        assert!(!atom.overrides.is_empty());
    }

    #[test]
    fn atom_distance_calculates_correctly() {
        let a = Atom::new(Element::H, Point::new(0.0, 0.0, 0.0));
        let b = Atom::new(Element::H, Point::new(3.0, 4.0, 0.0));

        assert!((a.distance_squared(&b) - 25.0).abs() < 1e-10);
        assert!((a.distance(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn atom_translate_by_updates_position() {
        let mut atom = Atom::new(Element::N, Point::new(1.0, 2.0, 3.0));
        atom.translate_by(&nalgebra::Vector3::new(0.5, -1.0, 2.5));

        assert!((atom.pos.x - 1.5).abs() < 1e-10);
        assert!((atom.pos.y - 1.0).abs() < 1e-10);
        assert!((atom.pos.z - 5.5).abs() < 1e-10);
    }

    #[test]
    fn atom_has_finite_position_detects_nan() {
        let good = Atom::new(Element::C, Point::new(0.0, 1.0, 2.0));
        let bad = Atom::new(Element::C, Point::new(f64::NAN, 1.0, 2.0));
        let inf = Atom::new(Element::C, Point::new(0.0, f64::INFINITY, 2.0));

        assert!(good.has_finite_position());
        assert!(!bad.has_finite_position());
        assert!(!inf.has_finite_position());
    }

    #[test]
    fn atom_display_formats_correctly() {
        let atom = Atom::new(Element::C, Point::new(1.234, -5.678, 9.012));

        assert_eq!(
            format!("{}", atom),
            "Atom { element: C, pos: [1.234, -5.678, 9.012] }"
        );
    }
}
