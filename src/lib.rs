//! # zmat-forge
//!
//! **zmat-forge** perceives covalent bonds in 3D molecular geometries and converts between Cartesian coordinates and Z-matrices (internal coordinates). Bond perception is overlap-based, spatially partitioned for large systems, optionally valency-limited, and cached against a fingerprint of the geometry.
//!
//! ## Features
//!
//! - **Keyed molecule model** – `Molecule` stores `Atom`s under stable `AtomKey`s with per-atom overrides for bond size, valency, and mass on top of an embedded element table.
//! - **Bond perception** – `ops::detect_bonds` and the cached `ops::bond_graph` produce a symmetric `BondGraph`; cells of a cuboid partition are processed in parallel.
//! - **Z-matrix construction** – `ops::to_zmat` chooses a build order, picks bonded references, and assembles a `ZMatrix`, with support for a fixed prefix and separately built `Fragment`s.
//! - **Cartesian reconstruction** – `ops::to_cartesian` places rows back in space with the natural extension reference frame.
//! - **Geometric selections** – sphere and cuboid cuts that optionally never split a bond.
//! - **Text I/O** – XYZ and Z-matrix readers and writers plus a bond-list writer under `io`.

mod db;
mod model;
mod utils;

pub mod io;
pub mod ops;

pub use model::atom::{Atom, Overrides};
pub use model::molecule::Molecule;
pub use model::topology::{Bond, BondGraph};
pub use model::types::{AtomKey, Element, ParseElementError, Point};
pub use model::zmatrix::{BuildEntry, ZMatrix, ZmatRow};
pub use ops::Fragment;
