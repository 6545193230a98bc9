//! Overlap-based covalent bond perception.
//!
//! Two atoms are bonded when their bond radii overlap, i.e. when the sum of their bond
//! sizes exceeds their distance. Large molecules are split into halo-padded cuboids by
//! [`super::partition`] so the quadratic overlap computation stays local; each cuboid is
//! processed independently (in parallel with the `parallel` feature) and the per-cuboid
//! edges are unioned into one symmetric [`BondGraph`].
//!
//! Optional valency arbitration trims the weakest bonds of oversaturated atoms. It runs
//! inside each cuboid before the union, so an atom near a cuboid boundary is arbitrated
//! against the neighbors visible in that cuboid only.

use super::error::Error;
use super::overlap::OverlapMatrix;
use super::partition::partition;
use crate::model::molecule::Molecule;
use crate::model::topology::{Bond, BondGraph};
use crate::model::types::AtomKey;
use crate::utils::parallel::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Parameters controlling bond perception.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondConfig {
    /// Maximum edge length of a partitioning cuboid, in ångströms.
    pub max_edge_length: f64,
    /// Total widening of a cuboid's large set relative to its small set.
    pub halo_margin: f64,
    /// Cut the lowest-overlap bonds of atoms bonded beyond their valency.
    pub use_valency: bool,
    /// Serve the graph from the molecule's cache when the fingerprint matches.
    pub use_cached_graph: bool,
    /// Split the molecule into cuboids instead of one global overlap matrix.
    pub use_partitioning: bool,
    /// Log a warning naming oversaturated atoms.
    pub warn_oversaturation: bool,
}

impl Default for BondConfig {
    fn default() -> Self {
        Self {
            max_edge_length: 25.0,
            halo_margin: 6.0,
            use_valency: false,
            use_cached_graph: true,
            use_partitioning: true,
            warn_oversaturation: true,
        }
    }
}

impl BondConfig {
    /// Digest of the parameters that influence the resulting graph.
    fn hash_parameters<H: Hasher>(&self, state: &mut H) {
        self.max_edge_length.to_bits().hash(state);
        self.halo_margin.to_bits().hash(state);
        self.use_valency.hash(state);
        self.use_partitioning.hash(state);
    }
}

/// Bonds found in one cuboid together with the atoms that exceeded their valency there.
struct CellBonds {
    bonds: Vec<Bond>,
    oversaturated: Vec<AtomKey>,
}

/// Perceives the bond graph of `molecule` without consulting the cache.
///
/// # Arguments
///
/// * `molecule` - Molecule whose atoms are connected.
/// * `config` - Partitioning, valency, and diagnostics parameters.
///
/// # Returns
///
/// A symmetric graph containing every atom of the molecule.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for unusable partitioning parameters and
/// [`Error::NonFinitePosition`] when an atom has NaN or infinite coordinates.
pub fn detect_bonds(molecule: &Molecule, config: &BondConfig) -> Result<BondGraph, Error> {
    let groups: Vec<Vec<AtomKey>> = if config.use_partitioning {
        let cuboids = partition(molecule, config.max_edge_length, config.halo_margin)?;
        log::debug!(
            "bond perception over {} cuboid(s), grid {:?}",
            cuboids.len(),
            cuboids.steps()
        );
        cuboids
            .cells()
            .map(|(_, cuboid)| cuboid.large.iter().copied().collect())
            .collect()
    } else {
        vec![molecule.keys().collect()]
    };

    let results = groups
        .par_iter()
        .map(|keys| detect_in_cell(molecule, keys, config.use_valency))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut oversaturated = BTreeSet::new();
    let mut bonds = Vec::new();
    for cell in results {
        oversaturated.extend(cell.oversaturated);
        bonds.extend(cell.bonds);
    }

    if let Some(message) = oversaturation_warning(&oversaturated, config) {
        log::warn!("{message}");
    }

    Ok(BondGraph::from_bonds(molecule.keys(), bonds))
}

/// Returns the bond graph of `molecule`, reusing the cached graph when possible.
///
/// The cache is keyed by a fingerprint over the molecule's keys, elements, coordinates,
/// and overrides plus the graph-relevant fields of `config`, so any change to these
/// triggers recomputation. With `use_cached_graph` disabled the graph is always
/// recomputed and the cache refreshed.
///
/// # Errors
///
/// Propagates the errors of [`detect_bonds`].
pub fn bond_graph(molecule: &Molecule, config: &BondConfig) -> Result<Arc<BondGraph>, Error> {
    let fingerprint = fingerprint(molecule, config);
    let cache = molecule.bond_cache();

    if config.use_cached_graph {
        if let Some(graph) = cache.lookup(fingerprint) {
            log::debug!("bond graph cache hit ({fingerprint:#018x})");
            return Ok(graph);
        }
    }

    let graph = Arc::new(detect_bonds(molecule, config)?);
    cache.store(fingerprint, Arc::clone(&graph));
    Ok(graph)
}

fn fingerprint(molecule: &Molecule, config: &BondConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    molecule.hash_geometry(&mut hasher);
    config.hash_parameters(&mut hasher);
    hasher.finish()
}

/// Text of the oversaturation warning, or `None` when nothing should be logged.
fn oversaturation_warning(oversaturated: &BTreeSet<AtomKey>, config: &BondConfig) -> Option<String> {
    if !config.warn_oversaturation || oversaturated.is_empty() {
        return None;
    }
    let action = if config.use_valency {
        "their lowest-overlap bonds were cut to respect valency"
    } else {
        "bonds exceed valency and were kept"
    };
    Some(format!("oversaturated atoms {oversaturated:?}: {action}"))
}

fn detect_in_cell(
    molecule: &Molecule,
    keys: &[AtomKey],
    use_valency: bool,
) -> Result<CellBonds, Error> {
    let matrix = OverlapMatrix::compute(molecule, keys)?;
    let n = matrix.len();

    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    for i in 0..n {
        for j in (i + 1)..n {
            if matrix.is_candidate(i, j) {
                adjacency[i].insert(j);
                adjacency[j].insert(i);
            }
        }
    }

    let valencies: Vec<usize> = keys
        .iter()
        .map(|&key| molecule.atom(key).map_or(0, |atom| atom.valency()))
        .collect();

    let oversaturated: Vec<usize> = (0..n)
        .filter(|&i| adjacency[i].len() > valencies[i])
        .collect();

    if use_valency {
        for &i in &oversaturated {
            let mut partners: Vec<usize> = adjacency[i].iter().copied().collect();
            partners.sort_by(|&a, &b| {
                matrix
                    .overlap(i, b)
                    .partial_cmp(&matrix.overlap(i, a))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| keys[a].cmp(&keys[b]))
            });
            for &j in partners.iter().skip(valencies[i]) {
                adjacency[i].remove(&j);
                adjacency[j].remove(&i);
            }
        }
    }

    let bonds = adjacency
        .iter()
        .enumerate()
        .flat_map(|(i, partners)| {
            partners
                .iter()
                .filter(move |&&j| j > i)
                .map(move |&j| Bond::new(keys[i], keys[j]))
        })
        .collect();

    Ok(CellBonds {
        bonds,
        oversaturated: oversaturated.into_iter().map(|i| keys[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::types::{Element, Point};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn atom(x: f64, y: f64, z: f64) -> Atom {
        Atom::new(Element::C, Point::new(x, y, z)).with_bond_size(0.6)
    }

    fn bent_triatomic() -> Molecule {
        [atom(0.0, 0.0, 0.0), atom(1.0, 0.0, 0.0), atom(1.5, 0.87, 0.0)]
            .into_iter()
            .collect()
    }

    fn random_cluster(seed: u64, count: usize, span: f64) -> Molecule {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                atom(
                    rng.random_range(0.0..span),
                    rng.random_range(0.0..span),
                    rng.random_range(0.0..span),
                )
            })
            .collect()
    }

    fn edges(graph: &BondGraph) -> Vec<(AtomKey, AtomKey)> {
        graph.bonds().map(|bond| (bond.a1, bond.a2)).collect()
    }

    #[test]
    fn detect_bonds_finds_overlapping_pairs_only() {
        let graph = detect_bonds(&bent_triatomic(), &BondConfig::default()).unwrap();

        assert_eq!(edges(&graph), vec![(0, 1), (1, 2)]);
        assert!(!graph.has_bond(0, 2));
        assert!(graph.is_symmetric());
    }

    #[test]
    fn detect_bonds_keeps_isolated_atoms_in_graph() {
        let molecule: Molecule = [atom(0.0, 0.0, 0.0), atom(10.0, 0.0, 0.0)]
            .into_iter()
            .collect();
        let graph = detect_bonds(&molecule, &BondConfig::default()).unwrap();

        assert_eq!(graph.atom_count(), 2);
        assert_eq!(graph.bond_count(), 0);
    }

    #[test]
    fn detect_bonds_uses_element_bond_sizes_by_default() {
        // C-C at 1.54 Å with tabulated radii of 0.912 Å each.
        let molecule: Molecule = [
            Atom::new(Element::C, Point::new(0.0, 0.0, 0.0)),
            Atom::new(Element::C, Point::new(1.54, 0.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let graph = detect_bonds(&molecule, &BondConfig::default()).unwrap();

        assert!(graph.has_bond(0, 1));
    }

    #[test]
    fn detect_bonds_is_symmetric_for_random_clusters() {
        let molecule = random_cluster(3, 250, 60.0);
        let config = BondConfig {
            max_edge_length: 15.0,
            halo_margin: 4.0,
            ..BondConfig::default()
        };
        let graph = detect_bonds(&molecule, &config).unwrap();

        assert!(graph.is_symmetric());
        assert_eq!(graph.atom_count(), molecule.atom_count());
    }

    #[test]
    fn detect_bonds_partitioning_matches_global_search() {
        let molecule = random_cluster(5, 400, 50.0);
        let partitioned = BondConfig {
            max_edge_length: 12.0,
            halo_margin: 6.0,
            ..BondConfig::default()
        };
        let global = BondConfig {
            use_partitioning: false,
            ..BondConfig::default()
        };

        assert_eq!(
            detect_bonds(&molecule, &partitioned).unwrap(),
            detect_bonds(&molecule, &global).unwrap()
        );
    }

    #[test]
    fn detect_bonds_single_cell_partition_equals_unpartitioned() {
        let molecule = random_cluster(9, 60, 8.0);
        let with = BondConfig::default();
        let without = BondConfig {
            use_partitioning: false,
            use_valency: true,
            ..BondConfig::default()
        };

        assert_eq!(
            detect_bonds(&molecule, &BondConfig { use_valency: true, ..with }).unwrap(),
            detect_bonds(&molecule, &without).unwrap()
        );
    }

    #[test]
    fn detect_bonds_without_valency_keeps_oversaturated_bonds() {
        let mut molecule = Molecule::new();
        let center = molecule.add_atom(atom(0.0, 0.0, 0.0).with_valency(1));
        molecule.add_atom(atom(1.0, 0.0, 0.0));
        molecule.add_atom(atom(-1.1, 0.0, 0.0));

        let graph = detect_bonds(&molecule, &BondConfig::default()).unwrap();
        assert_eq!(graph.degree(center), Some(2));
    }

    #[test]
    fn detect_bonds_with_valency_removes_lowest_overlap_bonds() {
        let mut molecule = Molecule::new();
        let center = molecule.add_atom(atom(0.0, 0.0, 0.0).with_valency(2));
        let near = molecule.add_atom(atom(0.9, 0.0, 0.0));
        let mid = molecule.add_atom(atom(0.0, 1.0, 0.0));
        let far = molecule.add_atom(atom(0.0, 0.0, -1.1));

        let config = BondConfig {
            use_valency: true,
            ..BondConfig::default()
        };
        let graph = detect_bonds(&molecule, &config).unwrap();

        assert_eq!(graph.degree(center), Some(2));
        assert!(graph.has_bond(center, near));
        assert!(graph.has_bond(center, mid));
        assert!(!graph.has_bond(center, far));
        assert!(!graph.has_bond(far, center));
    }

    #[test]
    fn detect_bonds_with_valency_breaks_ties_on_lower_key() {
        let mut molecule = Molecule::new();
        let center = molecule.add_atom(atom(0.0, 0.0, 0.0).with_valency(1));
        let first = molecule.add_atom(atom(1.0, 0.0, 0.0));
        let second = molecule.add_atom(atom(-1.0, 0.0, 0.0));

        let config = BondConfig {
            use_valency: true,
            ..BondConfig::default()
        };
        let graph = detect_bonds(&molecule, &config).unwrap();

        assert!(graph.has_bond(center, first));
        assert!(!graph.has_bond(center, second));
    }

    #[test]
    fn detect_bonds_with_valency_never_exceeds_valency() {
        let mut molecule = random_cluster(21, 150, 9.0);
        let keys: Vec<_> = molecule.keys().collect();
        for key in keys {
            molecule.atom_mut(key).unwrap().overrides.valency = Some(key % 3 + 1);
        }
        let config = BondConfig {
            use_valency: true,
            use_partitioning: false,
            ..BondConfig::default()
        };
        let graph = detect_bonds(&molecule, &config).unwrap();

        for (key, atom) in molecule.iter() {
            assert!(graph.degree(key).unwrap() <= atom.valency());
        }
        assert!(graph.is_symmetric());
    }

    #[test]
    fn detect_in_cell_reports_oversaturated_keys() {
        let mut molecule = Molecule::new();
        molecule.add_atom(atom(10.0, 0.0, 0.0));
        let center = molecule.add_atom(atom(0.0, 0.0, 0.0).with_valency(1));
        molecule.add_atom(atom(1.0, 0.0, 0.0));
        molecule.add_atom(atom(-1.1, 0.0, 0.0));
        let keys: Vec<_> = molecule.keys().collect();

        for use_valency in [false, true] {
            let cell = detect_in_cell(&molecule, &keys, use_valency).unwrap();
            assert_eq!(cell.oversaturated, vec![center]);
        }
    }

    #[test]
    fn oversaturation_warning_names_keys_and_respects_switch() {
        let keys = BTreeSet::from([3, 17]);
        let config = BondConfig::default();

        let message = oversaturation_warning(&keys, &config).unwrap();
        assert!(message.contains("{3, 17}"), "unexpected warning: {message}");
        assert!(message.contains("kept"));

        let cut = oversaturation_warning(&keys, &BondConfig { use_valency: true, ..config }).unwrap();
        assert!(cut.contains("cut"));

        let silent = BondConfig {
            warn_oversaturation: false,
            ..config
        };
        assert_eq!(oversaturation_warning(&keys, &silent), None);
        assert_eq!(oversaturation_warning(&BTreeSet::new(), &config), None);
    }

    #[test]
    fn detect_bonds_rejects_non_finite_positions() {
        let mut molecule = bent_triatomic();
        molecule.atom_mut(2).unwrap().pos.z = f64::NAN;

        for use_partitioning in [true, false] {
            let config = BondConfig {
                use_partitioning,
                ..BondConfig::default()
            };
            assert_eq!(
                detect_bonds(&molecule, &config).unwrap_err(),
                Error::NonFinitePosition { key: 2 }
            );
        }
    }

    #[test]
    fn bond_graph_reuses_cached_graph() {
        let molecule = bent_triatomic();
        let config = BondConfig::default();

        let first = bond_graph(&molecule, &config).unwrap();
        let second = bond_graph(&molecule, &config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn bond_graph_recomputes_after_geometry_change() {
        let mut molecule = bent_triatomic();
        let config = BondConfig::default();

        let before = bond_graph(&molecule, &config).unwrap();
        molecule.atom_mut(2).unwrap().pos = Point::new(8.0, 0.0, 0.0);
        let after = bond_graph(&molecule, &config).unwrap();

        assert!(before.has_bond(1, 2));
        assert!(!after.has_bond(1, 2));
    }

    #[test]
    fn bond_graph_recomputes_after_override_or_config_change() {
        let mut molecule = bent_triatomic();
        let config = BondConfig::default();
        let base = bond_graph(&molecule, &config).unwrap();

        molecule.atom_mut(0).unwrap().overrides.bond_size = Some(1.5);
        let grown = bond_graph(&molecule, &config).unwrap();
        assert!(!base.has_bond(0, 2));
        assert!(grown.has_bond(0, 2));

        let other = BondConfig {
            use_partitioning: false,
            ..config
        };
        let recomputed = bond_graph(&molecule, &other).unwrap();
        assert!(!Arc::ptr_eq(&grown, &recomputed));
        assert_eq!(*grown, *recomputed);
    }

    #[test]
    fn bond_graph_bypasses_cache_when_disabled() {
        let molecule = bent_triatomic();
        let cached = BondConfig::default();
        let uncached = BondConfig {
            use_cached_graph: false,
            ..cached
        };

        let first = bond_graph(&molecule, &cached).unwrap();
        let second = bond_graph(&molecule, &uncached).unwrap();
        let third = bond_graph(&molecule, &cached).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
    }
}
