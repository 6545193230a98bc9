//! Primitive value types shared by the model, the algorithms, and the I/O layer.
//!
//! [`Point`] fixes the coordinate representation to `nalgebra::Point3<f64>` and
//! [`Element`] identifies a chemical element by atomic number. Per-element data such as
//! masses, bond sizes, and valencies live in the embedded element table and are resolved
//! lazily through the [`crate::db`] module.

use crate::db;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type Point = Point3<f64>;

/// Stable identifier of an atom inside a [`super::molecule::Molecule`].
pub type AtomKey = usize;

/// Bond size used for elements missing from the embedded table.
pub const DEFAULT_BOND_SIZE: f64 = 1.8;

/// Valency used for elements missing from the embedded table.
pub const DEFAULT_VALENCY: usize = 6;

const SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P",
    "S", "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh",
    "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re",
    "Os", "Ir", "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db",
    "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Chemical element identified by its atomic number.
///
/// Atomic number `0` is reserved for dummy atoms (symbol `X`), which Z-matrix files use
/// to anchor otherwise linear fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const DUMMY: Element = Element(0);
    pub const H: Element = Element(1);
    pub const HE: Element = Element(2);
    pub const LI: Element = Element(3);
    pub const B: Element = Element(5);
    pub const C: Element = Element(6);
    pub const N: Element = Element(7);
    pub const O: Element = Element(8);
    pub const F: Element = Element(9);
    pub const NA: Element = Element(11);
    pub const SI: Element = Element(14);
    pub const P: Element = Element(15);
    pub const S: Element = Element(16);
    pub const CL: Element = Element(17);
    pub const FE: Element = Element(26);
    pub const BR: Element = Element(35);
    pub const I: Element = Element(53);
    pub const OG: Element = Element(118);

    /// Builds an element from its atomic number.
    ///
    /// Returns `None` for numbers above 118.
    pub fn from_atomic_number(number: u8) -> Option<Self> {
        (usize::from(number) < SYMBOLS.len()).then_some(Self(number))
    }

    pub fn atomic_number(&self) -> u8 {
        self.0
    }

    pub fn symbol(&self) -> &'static str {
        SYMBOLS[usize::from(self.0)]
    }

    pub fn is_dummy(&self) -> bool {
        self.0 == 0
    }

    pub fn is_heavy_atom(&self) -> bool {
        self.0 > 1
    }

    /// Standard atomic weight in g/mol, `0.0` for dummies and untabulated elements.
    pub fn atomic_mass(&self) -> f64 {
        db::element(self.0).map_or(0.0, |data| data.mass())
    }

    /// Bond radius in ångströms used for overlap-based bond perception.
    pub fn bond_size(&self) -> f64 {
        db::element(self.0).map_or(DEFAULT_BOND_SIZE, |data| data.bond_size())
    }

    /// Maximum number of bonds accepted during valency arbitration.
    pub fn valency(&self) -> usize {
        db::element(self.0).map_or(DEFAULT_VALENCY, |data| data.valency())
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::DUMMY
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized element '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    /// Parses an element symbol (case-insensitive) or an atomic number.
    ///
    /// `Du` is accepted as an alias of the dummy symbol `X`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Ok(number) = trimmed.parse::<u8>() {
            return Self::from_atomic_number(number)
                .ok_or_else(|| ParseElementError(s.to_string()));
        }

        if trimmed.eq_ignore_ascii_case("du") {
            return Ok(Self::DUMMY);
        }

        SYMBOLS
            .iter()
            .position(|symbol| symbol.eq_ignore_ascii_case(trimmed))
            .map(|idx| Self(idx as u8))
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}
