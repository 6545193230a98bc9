//! Selection of the order in which atoms are placed in a Z-matrix.
//!
//! A good build order keeps every new atom close to the atoms placed just before it, so
//! the references chosen for it are short and well conditioned. The order is produced by
//! a small state machine whose rigor is controlled by the [`RecursionLevel`].

use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::types::{AtomKey, Point};
use std::collections::{BTreeSet, HashMap};

/// How much geometric care goes into the build order and the reference choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecursionLevel {
    /// Keep the caller's order; reference the immediately preceding atoms.
    Plain = 0,
    /// Walk to the nearest atom of the previously placed one.
    Chain = 1,
    /// Walk to the atom nearest to the two previously placed ones.
    #[default]
    Pair = 2,
}

impl TryFrom<u8> for RecursionLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Plain),
            1 => Ok(Self::Chain),
            2 => Ok(Self::Pair),
            _ => Err(Error::InvalidRecursionLevel { level }),
        }
    }
}

impl From<RecursionLevel> for u8 {
    fn from(level: RecursionLevel) -> Self {
        level as u8
    }
}

/// Parameters of the build-order walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderConfig {
    pub level: RecursionLevel,
    /// Largest step accepted at [`RecursionLevel::Chain`] before restarting at the center.
    pub chain_threshold: f64,
    /// Largest step accepted at [`RecursionLevel::Pair`] before restarting at the center.
    pub pair_threshold: f64,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            level: RecursionLevel::default(),
            chain_threshold: 5.0,
            pair_threshold: 7.0,
        }
    }
}

/// Where the walk currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Nothing placed yet: start next to the topological center.
    Seed,
    /// One atom to follow.
    Chain { previous: AtomKey },
    /// Two atoms to follow.
    Pair { previous: AtomKey, before: AtomKey },
}

/// Returns the order in which `to_build` should be placed, starting with `already_built`.
///
/// The result is a permutation of `to_build`. At [`RecursionLevel::Plain`] the remaining
/// atoms follow the given order. At the other levels each step picks the unplaced atom
/// nearest to the previous one (or, at the pair level once two atoms are placed, the one
/// minimizing the summed distance to the previous two). A step longer than the level's
/// threshold is replaced by the unplaced atom nearest to the topological center of
/// `to_build`, which restarts the walk. Distance ties go to the lower key.
///
/// # Arguments
///
/// * `molecule` - Source of the atom positions.
/// * `to_build` - Atoms to order.
/// * `already_built` - Prefix fixed by the caller; must be a subset of `to_build`.
/// * `config` - Recursion level and step thresholds.
///
/// # Errors
///
/// * [`Error::KeyNotFound`] if an atom is not part of `molecule`.
/// * [`Error::NonFinitePosition`] if an atom to order has NaN or infinite coordinates.
/// * [`Error::InvalidBuildEntry`] for duplicates or prefix atoms outside `to_build`.
pub fn order_of_building(
    molecule: &Molecule,
    to_build: &[AtomKey],
    already_built: &[AtomKey],
    config: &OrderConfig,
) -> Result<Vec<AtomKey>, Error> {
    let mut positions: HashMap<AtomKey, Point> = HashMap::with_capacity(to_build.len());
    for &key in to_build {
        let atom = molecule.atom(key).ok_or_else(|| Error::key_not_found(key))?;
        if !atom.has_finite_position() {
            return Err(Error::NonFinitePosition { key });
        }
        if positions.insert(key, atom.pos).is_some() {
            return Err(Error::invalid_build_entry(key, "atom listed twice in the build set"));
        }
    }

    let mut remaining: BTreeSet<AtomKey> = to_build.iter().copied().collect();
    for &key in already_built {
        if !molecule.contains(key) {
            return Err(Error::key_not_found(key));
        }
        if !positions.contains_key(&key) {
            return Err(Error::invalid_build_entry(key, "prefix atom is not part of the build set"));
        }
        if !remaining.remove(&key) {
            return Err(Error::invalid_build_entry(key, "atom listed twice in the prefix"));
        }
    }

    let mut order = Vec::with_capacity(to_build.len());
    order.extend_from_slice(already_built);

    if config.level == RecursionLevel::Plain {
        order.extend(to_build.iter().copied().filter(|key| remaining.contains(key)));
        return Ok(order);
    }

    let distance = |a: AtomKey, b: AtomKey| nalgebra::distance(&positions[&a], &positions[&b]);
    let center = molecule
        .topologic_center_of(to_build.iter().copied())
        .unwrap_or_else(Point::origin);
    let nearest_to_center = |remaining: &BTreeSet<AtomKey>| {
        closest(remaining, |key| nalgebra::distance(&positions[&key], &center))
    };

    let mut cursor = match (config.level, already_built) {
        (_, []) => Cursor::Seed,
        (_, [previous]) => Cursor::Chain {
            previous: *previous,
        },
        (RecursionLevel::Pair, [.., before, previous]) => Cursor::Pair {
            previous: *previous,
            before: *before,
        },
        (_, [.., previous]) => Cursor::Chain {
            previous: *previous,
        },
    };

    while !remaining.is_empty() {
        let (picked, next) = match cursor {
            Cursor::Seed => {
                let Some(picked) = nearest_to_center(&remaining) else {
                    break;
                };
                (picked, Cursor::Chain { previous: picked })
            }
            Cursor::Chain { previous } => {
                let Some(candidate) = closest(&remaining, |key| distance(key, previous)) else {
                    break;
                };
                match config.level {
                    // The chain step of the pair walk is never checked against a threshold.
                    RecursionLevel::Pair => (
                        candidate,
                        Cursor::Pair {
                            previous: candidate,
                            before: previous,
                        },
                    ),
                    _ if distance(candidate, previous) > config.chain_threshold => {
                        let restart = nearest_to_center(&remaining).unwrap_or(candidate);
                        (restart, Cursor::Chain { previous: restart })
                    }
                    _ => (candidate, Cursor::Chain { previous: candidate }),
                }
            }
            Cursor::Pair { previous, before } => {
                let Some(candidate) = closest(&remaining, |key| {
                    distance(key, previous) + distance(key, before)
                }) else {
                    break;
                };
                if distance(candidate, previous) > config.pair_threshold {
                    let restart = nearest_to_center(&remaining).unwrap_or(candidate);
                    (restart, Cursor::Chain { previous: restart })
                } else {
                    (
                        candidate,
                        Cursor::Pair {
                            previous: candidate,
                            before: previous,
                        },
                    )
                }
            }
        };

        remaining.remove(&picked);
        order.push(picked);
        cursor = next;
    }

    Ok(order)
}

/// Key with the smallest score; the lower key wins ties.
fn closest(candidates: &BTreeSet<AtomKey>, score: impl Fn(AtomKey) -> f64) -> Option<AtomKey> {
    let mut best: Option<(AtomKey, f64)> = None;
    for &key in candidates {
        let value = score(key);
        if best.is_none_or(|(_, current)| value < current) {
            best = Some((key, value));
        }
    }
    best.map(|(key, _)| key)
}
