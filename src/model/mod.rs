//! Core data structures modeling molecules and their internal coordinates.
//!
//! This module defines atoms, keyed molecules, bond graphs, and Z-matrix tables. These
//! types are produced by the I/O readers, consumed by the [`crate::ops`] algorithms, and
//! written back out by the I/O writers.

mod cache;

pub mod atom;
pub mod molecule;
pub mod topology;
pub mod types;
pub mod zmatrix;
