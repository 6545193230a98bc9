//! Conversion of Cartesian geometries into Z-matrices.
//!
//! [`to_zmat`] runs the whole pipeline: fragment validation, bond perception, build
//! order, reference choice, and row assembly for the main molecule, followed by each
//! fragment and its merge into the main table. [`assemble`] is the last step on its own,
//! for callers that already hold build entries.

use super::bonds::{BondConfig, bond_graph};
use super::error::Error;
use super::fragment::{Fragment, merge_fragment, validate_fragments};
use super::geometry;
use super::order::{OrderConfig, RecursionLevel, order_of_building};
use super::reference::pick_references;
use crate::model::molecule::Molecule;
use crate::model::types::{AtomKey, Point};
use crate::model::zmatrix::{BuildEntry, ZMatrix, ZmatRow};
use crate::utils::parallel::*;
use std::collections::BTreeSet;

/// What to do with a dihedral whose reference planes are undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DegeneratePolicy {
    /// Fail with [`Error::DegenerateGeometry`].
    #[default]
    Reject,
    /// Record a dihedral of zero degrees.
    Zero,
}

/// Parameters of a Cartesian to Z-matrix conversion.
#[derive(Debug, Clone, Default)]
pub struct ZmatConfig {
    pub order: OrderConfig,
    pub bonds: BondConfig,
    /// Entries placed first, verbatim, before the build-order walk starts.
    pub already_built: Vec<BuildEntry>,
    /// Fragments built after the main molecule, in order.
    pub fragments: Vec<Fragment>,
    pub degenerate: DegeneratePolicy,
}

impl ZmatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: RecursionLevel) -> Self {
        self.order.level = level;
        self
    }

    pub fn with_bond_config(mut self, bonds: BondConfig) -> Self {
        self.bonds = bonds;
        self
    }

    pub fn with_already_built(mut self, entries: Vec<BuildEntry>) -> Self {
        self.already_built = entries;
        self
    }

    pub fn with_fragment(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }

    pub fn with_degenerate_policy(mut self, policy: DegeneratePolicy) -> Self {
        self.degenerate = policy;
        self
    }
}

/// Builds the Z-matrix of `molecule`.
///
/// Fragment atoms are excluded from the main build and placed afterwards, each fragment
/// seeded by its anchors. The rows of the result follow the build order.
///
/// # Errors
///
/// Fragment problems are reported before any ordering work starts. Afterwards the
/// errors of bond perception, build-order selection, reference picking, and assembly are
/// propagated.
pub fn to_zmat(molecule: &Molecule, config: &ZmatConfig) -> Result<ZMatrix, Error> {
    validate_fragments(molecule, &config.fragments, &config.already_built)?;

    let graph = bond_graph(molecule, &config.bonds)?;
    let level = config.order.level;

    let fragment_atoms: BTreeSet<AtomKey> = config
        .fragments
        .iter()
        .flat_map(|fragment| fragment.atoms.iter().copied())
        .collect();
    let main_atoms: Vec<AtomKey> = molecule
        .keys()
        .filter(|key| !fragment_atoms.contains(key))
        .collect();
    let prefix: Vec<AtomKey> = config.already_built.iter().map(|entry| entry.atom).collect();

    log::debug!(
        "building z-matrix: {} main atom(s), {} fragment(s), level {:?}",
        main_atoms.len(),
        config.fragments.len(),
        level
    );

    let order = order_of_building(molecule, &main_atoms, &prefix, &config.order)?;
    let entries = pick_references(molecule, &graph, &order, &config.already_built, level)?;
    let mut zmat = assemble(molecule, &entries, config.degenerate)?;

    for (index, fragment) in config.fragments.iter().enumerate() {
        let atoms: Vec<AtomKey> = fragment.atoms.iter().copied().collect();
        let order = order_of_building(molecule, &atoms, &fragment.anchor_atoms(), &config.order)?;
        let entries = pick_references(molecule, &graph, &order, &fragment.anchors, level)?;
        let fragment_zmat = assemble(molecule, &entries, config.degenerate)?;
        zmat = merge_fragment(zmat, &fragment_zmat, index)?;
    }

    Ok(zmat)
}

/// Computes one Z-matrix row per build entry, in the given order.
///
/// Rows are computed in parallel with the `parallel` feature.
///
/// # Errors
///
/// * [`Error::KeyNotFound`] for atoms or references absent from `molecule`.
/// * [`Error::NonFinitePosition`] for atoms with NaN or infinite coordinates.
/// * [`Error::InvalidBuildEntry`] for malformed entries or an atom listed twice.
/// * [`Error::DegenerateGeometry`] for zero-length angle arms, and for undefined
///   dihedral planes under [`DegeneratePolicy::Reject`].
pub fn assemble(
    molecule: &Molecule,
    entries: &[BuildEntry],
    policy: DegeneratePolicy,
) -> Result<ZMatrix, Error> {
    let rows = entries
        .par_iter()
        .map(|entry| compute_row(molecule, entry, policy))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut zmat = ZMatrix::with_capacity(rows.len());
    for row in rows {
        zmat.push(row).map_err(|rejected| {
            Error::invalid_build_entry(rejected.atom, "atom listed twice in the build entries")
        })?;
    }
    Ok(zmat)
}

fn compute_row(
    molecule: &Molecule,
    entry: &BuildEntry,
    policy: DegeneratePolicy,
) -> Result<ZmatRow, Error> {
    if !entry.is_prefix_ordered() || !entry.has_distinct_references() {
        return Err(Error::invalid_build_entry(
            entry.atom,
            "references must be distinct and filled in bond, angle, dihedral order",
        ));
    }

    let locate = |key: AtomKey| -> Result<Point, Error> {
        let atom = molecule.atom(key).ok_or_else(|| Error::key_not_found(key))?;
        if atom.has_finite_position() {
            Ok(atom.pos)
        } else {
            Err(Error::NonFinitePosition { key })
        }
    };

    let element = molecule
        .atom(entry.atom)
        .map(|atom| atom.element)
        .ok_or_else(|| Error::key_not_found(entry.atom))?;
    let mut row = ZmatRow::new(entry.atom, element);
    let pos = locate(entry.atom)?;

    let Some(bond) = entry.bond else {
        return Ok(row);
    };
    let bond_pos = locate(bond)?;
    row.bond = Some((bond, geometry::bond_length(&pos, &bond_pos)));

    let Some(angle) = entry.angle else {
        return Ok(row);
    };
    let angle_pos = locate(angle)?;
    let value = geometry::bond_angle(&pos, &bond_pos, &angle_pos).ok_or_else(|| {
        Error::degenerate(&[entry.atom, bond, angle], "zero-length bond vector in angle")
    })?;
    row.angle = Some((angle, value));

    let Some(dihedral) = entry.dihedral else {
        return Ok(row);
    };
    let dihedral_pos = locate(dihedral)?;
    let value = match geometry::dihedral(&pos, &bond_pos, &angle_pos, &dihedral_pos) {
        Some(value) => value,
        None if policy == DegeneratePolicy::Zero => 0.0,
        None => {
            return Err(Error::degenerate(
                &[entry.atom, bond, angle, dihedral],
                "collinear atoms leave the dihedral undefined",
            ));
        }
    };
    row.dihedral = Some((dihedral, value));

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::atom::Atom;
    use crate::model::types::Element;
    use crate::ops::bonds::detect_bonds;

    fn bent_triatomic() -> Molecule {
        [(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (1.5, 0.87, 0.0)]
            .into_iter()
            .map(|(x, y, z)| Atom::new(Element::C, Point::new(x, y, z)).with_bond_size(0.6))
            .collect()
    }

    /// Zig-zag chain of six carbons drifting out of the xy-plane.
    fn chain() -> Molecule {
        [
            (0.0, 0.0, 0.0),
            (1.25, 0.85, 0.0),
            (2.5, 0.0, 0.2),
            (3.75, 0.85, 0.6),
            (5.0, 0.0, 1.1),
            (6.25, 0.85, 1.4),
        ]
        .into_iter()
        .map(|(x, y, z)| Atom::new(Element::C, Point::new(x, y, z)))
        .collect()
    }

    #[test]
    fn to_zmat_builds_bent_triatomic() {
        let molecule = bent_triatomic();
        let config = ZmatConfig::new().with_level(RecursionLevel::Plain);
        let zmat = to_zmat(&molecule, &config).unwrap();

        let graph = detect_bonds(&molecule, &BondConfig::default()).unwrap();
        assert_eq!(graph.bond_count(), 2);
        assert!(graph.has_bond(0, 1) && graph.has_bond(1, 2) && !graph.has_bond(0, 2));

        let rows = zmat.rows();
        assert_eq!(rows[0].references(), Vec::<AtomKey>::new());

        let (ref1, len1) = rows[1].bond.unwrap();
        assert_eq!(ref1, 0);
        assert!((len1 - 1.0).abs() < 1e-12);

        let (ref2, len2) = rows[2].bond.unwrap();
        let (angle_ref, angle) = rows[2].angle.unwrap();
        assert_eq!((ref2, angle_ref), (1, 0));
        assert!((len2 - 1.0).abs() < 0.01);
        assert!((angle - 120.0).abs() < 0.5);
    }

    #[test]
    fn to_zmat_rows_form_a_consistent_permutation() {
        let molecule = chain();
        for level in [RecursionLevel::Plain, RecursionLevel::Chain, RecursionLevel::Pair] {
            let zmat = to_zmat(&molecule, &ZmatConfig::new().with_level(level)).unwrap();

            let mut keys: Vec<_> = zmat.keys().collect();
            keys.sort_unstable();
            assert_eq!(keys, molecule.keys().collect::<Vec<_>>());
            assert!(zmat.is_consistent(), "inconsistent table at {level:?}");
        }
    }

    #[test]
    fn to_zmat_honors_already_built_prefix() {
        let molecule = chain();
        let prefix = vec![BuildEntry::first(5), BuildEntry::second(4, 5)];
        let zmat = to_zmat(&molecule, &ZmatConfig::new().with_already_built(prefix)).unwrap();

        assert_eq!(zmat.keys().take(2).collect::<Vec<_>>(), vec![5, 4]);
        assert_eq!(zmat.row(4).unwrap().bond.map(|(key, _)| key), Some(5));
    }

    #[test]
    fn to_zmat_rejects_prefix_that_cannot_be_rebuilt() {
        let molecule = chain();
        let prefix = vec![BuildEntry::first(0), BuildEntry::first(1)];
        assert!(matches!(
            to_zmat(&molecule, &ZmatConfig::new().with_already_built(prefix)),
            Err(Error::InvalidBuildEntry { atom: 1, .. })
        ));

        let prefix = vec![BuildEntry::first(0), BuildEntry::second(1, 0)];
        let zmat = to_zmat(&molecule, &ZmatConfig::new().with_already_built(prefix)).unwrap();
        assert!(crate::ops::to_cartesian(&zmat).is_ok());
    }

    #[test]
    fn to_zmat_places_fragments_after_main_molecule() {
        let molecule = chain();
        let fragment = Fragment::new(
            [3, 4, 5],
            vec![
                BuildEntry::new(3, 2, 1, 0),
                BuildEntry::new(4, 3, 2, 1),
                BuildEntry::new(5, 4, 3, 2),
            ],
        );
        let zmat = to_zmat(&molecule, &ZmatConfig::new().with_fragment(fragment)).unwrap();

        let keys: Vec<_> = zmat.keys().collect();
        assert_eq!(keys[3..], [3, 4, 5]);
        assert_eq!(zmat.row(3).unwrap().entry(), BuildEntry::new(3, 2, 1, 0));
        assert!(zmat.is_consistent());
    }

    #[test]
    fn to_zmat_reports_fragment_errors_before_ordering() {
        let mut molecule = chain();
        molecule.atom_mut(0).unwrap().pos.x = f64::NAN;
        let broken = Fragment::new([4, 5], vec![BuildEntry::new(4, 3, 2, 1)]);

        assert!(matches!(
            to_zmat(&molecule, &ZmatConfig::new().with_fragment(broken)),
            Err(Error::FragmentInconsistent { fragment: 0, .. })
        ));
    }

    #[test]
    fn assemble_computes_reference_values() {
        let molecule: Molecule = [
            (0.0, 0.0, 0.0),
            (1.5, 0.0, 0.0),
            (1.5, 1.5, 0.0),
            (1.5, 1.5, 1.5),
        ]
        .into_iter()
        .map(|(x, y, z)| Atom::new(Element::C, Point::new(x, y, z)))
        .collect();
        let entries = [
            BuildEntry::first(0),
            BuildEntry::second(1, 0),
            BuildEntry::third(2, 1, 0),
            BuildEntry::new(3, 2, 1, 0),
        ];
        let zmat = assemble(&molecule, &entries, DegeneratePolicy::Reject).unwrap();

        let last = zmat.row(3).unwrap();
        assert!((last.bond.unwrap().1 - 1.5).abs() < 1e-12);
        assert!((last.angle.unwrap().1 - 90.0).abs() < 1e-10);
        assert!((last.dihedral.unwrap().1 - 90.0).abs() < 1e-10);
        assert!((zmat.row(2).unwrap().angle.unwrap().1 - 90.0).abs() < 1e-10);
    }

    #[test]
    fn assemble_applies_degenerate_policy() {
        let molecule: Molecule = [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (3.0, 1.0, 0.0),
        ]
        .into_iter()
        .map(|(x, y, z)| Atom::new(Element::C, Point::new(x, y, z)))
        .collect();
        let entries = [
            BuildEntry::first(0),
            BuildEntry::second(1, 0),
            BuildEntry::third(2, 1, 0),
            BuildEntry::new(3, 2, 1, 0),
        ];

        assert!(matches!(
            assemble(&molecule, &entries, DegeneratePolicy::Reject),
            Err(Error::DegenerateGeometry { .. })
        ));
        let zmat = assemble(&molecule, &entries, DegeneratePolicy::Zero).unwrap();
        assert_eq!(zmat.row(3).unwrap().dihedral, Some((0, 0.0)));
    }

    #[test]
    fn assemble_rejects_zero_length_arm_and_duplicates() {
        let molecule: Molecule = [(0.0, 0.0, 0.0), (0.0, 0.0, 0.0), (1.0, 0.0, 0.0)]
            .into_iter()
            .map(|(x, y, z)| Atom::new(Element::C, Point::new(x, y, z)))
            .collect();

        let coincident = [BuildEntry::third(2, 1, 0)];
        assert!(matches!(
            assemble(&molecule, &coincident, DegeneratePolicy::Zero),
            Err(Error::DegenerateGeometry { .. })
        ));

        let repeated = [BuildEntry::first(0), BuildEntry::second(0, 2)];
        assert!(matches!(
            assemble(&molecule, &repeated, DegeneratePolicy::Reject),
            Err(Error::InvalidBuildEntry { .. })
        ));
    }

    #[test]
    fn zmat_config_builders_set_fields() {
        let config = ZmatConfig::new()
            .with_level(RecursionLevel::Chain)
            .with_degenerate_policy(DegeneratePolicy::Zero)
            .with_bond_config(BondConfig {
                use_valency: true,
                ..BondConfig::default()
            });

        assert_eq!(config.order.level, RecursionLevel::Chain);
        assert_eq!(config.degenerate, DegeneratePolicy::Zero);
        assert!(config.bonds.use_valency);
        assert!(config.fragments.is_empty());
    }
}
