use crate::model::types::AtomKey;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("atom key {key} does not exist in the molecule")]
    KeyNotFound { key: AtomKey },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("atom {key} has a non-finite position")]
    NonFinitePosition { key: AtomKey },

    #[error("invalid recursion level {level}: expected 0, 1 or 2")]
    InvalidRecursionLevel { level: u8 },

    #[error("invalid build entry for atom {atom}: {details}")]
    InvalidBuildEntry { atom: AtomKey, details: String },

    #[error("fragment {fragment} is inconsistent: {details}")]
    FragmentInconsistent { fragment: usize, details: String },

    #[error("fragment {fragment} overlaps fragment {other} at atom {key}")]
    FragmentOverlap {
        fragment: usize,
        other: usize,
        key: AtomKey,
    },

    #[error("degenerate geometry for atoms {atoms:?}: {details}")]
    DegenerateGeometry {
        atoms: Vec<AtomKey>,
        details: String,
    },
}

impl Error {
    pub fn key_not_found(key: AtomKey) -> Self {
        Self::KeyNotFound { key }
    }

    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn invalid_build_entry(atom: AtomKey, details: impl Into<String>) -> Self {
        Self::InvalidBuildEntry {
            atom,
            details: details.into(),
        }
    }

    pub fn fragment_inconsistent(fragment: usize, details: impl Into<String>) -> Self {
        Self::FragmentInconsistent {
            fragment,
            details: details.into(),
        }
    }

    pub fn degenerate(atoms: &[AtomKey], details: impl Into<String>) -> Self {
        Self::DegenerateGeometry {
            atoms: atoms.to_vec(),
            details: details.into(),
        }
    }
}
