//! Cuboid partitioning of a molecule for divide-and-conquer bond perception.
//!
//! The padded bounding box of the molecule is split into `steps = ceil(extent / edge)`
//! cuboids per axis. Each cuboid has a *small* set (atoms inside its half-open box; the
//! small sets are pairwise disjoint and cover the molecule) and a *large* set (atoms inside
//! the box widened by half the halo margin on every side). Bonds are searched within large
//! sets so pairs straddling a cuboid boundary are still seen by at least one cuboid.

use super::error::Error;
use crate::model::molecule::Molecule;
use crate::model::types::{AtomKey, Point};
use nalgebra::Vector3;
use std::collections::{BTreeMap, BTreeSet};

/// Padding added to every side of the bounding box.
const BOX_PADDING: f64 = 0.01;

/// Upper bound on the number of cuboids in the grid.
const MAX_CELLS: f64 = 1_048_576.0;

/// Upper bound on the number of large sets a single atom may join.
const MAX_HALO_CELLS: f64 = 4096.0;

/// Integer coordinates of a cuboid along x, y, and z.
pub type CellIndex = (usize, usize, usize);

/// Atom membership of one cuboid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cuboid {
    /// Atoms inside the cuboid proper.
    pub small: BTreeSet<AtomKey>,
    /// Atoms inside the cuboid widened by the halo; always a superset of `small`.
    pub large: BTreeSet<AtomKey>,
}

/// Result of partitioning a molecule into cuboids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    cells: BTreeMap<CellIndex, Cuboid>,
    steps: [usize; 3],
}

impl Partition {
    pub fn cell(&self, index: CellIndex) -> Option<&Cuboid> {
        self.cells.get(&index)
    }

    pub fn cells(&self) -> impl Iterator<Item = (CellIndex, &Cuboid)> {
        self.cells.iter().map(|(index, cuboid)| (*index, cuboid))
    }

    /// Number of non-empty cuboids.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of cuboids along each axis of the grid, counting empty ones.
    pub fn steps(&self) -> [usize; 3] {
        self.steps
    }

    pub fn is_single_cell(&self) -> bool {
        self.steps == [1, 1, 1]
    }
}

/// Splits a molecule into cuboids of at most `max_edge_length` per side.
///
/// # Arguments
///
/// * `molecule` - Molecule whose atoms are distributed.
/// * `max_edge_length` - Upper bound on the edge of a small cuboid, in ångströms.
/// * `halo_margin` - Total widening of a large cuboid relative to its small cuboid.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for a non-positive or non-finite edge length or a
/// negative or non-finite halo, or a grid so fine that it exceeds the cuboid budget in
/// total or per atom. Returns [`Error::NonFinitePosition`] for atoms with NaN or infinite
/// coordinates.
pub fn partition(
    molecule: &Molecule,
    max_edge_length: f64,
    halo_margin: f64,
) -> Result<Partition, Error> {
    if !(max_edge_length.is_finite() && max_edge_length > 0.0) {
        return Err(Error::invalid_parameter(
            "max_edge_length",
            format!("must be finite and positive, got {max_edge_length}"),
        ));
    }
    if !(halo_margin.is_finite() && halo_margin >= 0.0) {
        return Err(Error::invalid_parameter(
            "halo_margin",
            format!("must be finite and non-negative, got {halo_margin}"),
        ));
    }

    let positions: Vec<(AtomKey, Point)> = molecule
        .iter()
        .map(|(key, atom)| {
            if atom.has_finite_position() {
                Ok((key, atom.pos))
            } else {
                Err(Error::NonFinitePosition { key })
            }
        })
        .collect::<Result<_, _>>()?;

    if positions.is_empty() {
        return Ok(Partition::default());
    }

    let mut min = Point::new(f64::MAX, f64::MAX, f64::MAX);
    let mut max = Point::new(f64::MIN, f64::MIN, f64::MIN);
    for (_, pos) in &positions {
        min = min.inf(pos);
        max = max.sup(pos);
    }
    let padding = Vector3::repeat(BOX_PADDING);
    min -= padding;
    max += padding;

    let extent = max - min;
    let raw_steps = [0, 1, 2].map(|axis| (extent[axis] / max_edge_length).ceil().max(1.0));
    if raw_steps.iter().product::<f64>() > MAX_CELLS {
        return Err(Error::invalid_parameter(
            "max_edge_length",
            format!(
                "{max_edge_length} splits the molecule into {raw_steps:?} cuboids, more than {MAX_CELLS} in total"
            ),
        ));
    }
    let steps = raw_steps.map(|count| count as usize);

    if steps == [1, 1, 1] {
        let all: BTreeSet<AtomKey> = positions.iter().map(|(key, _)| *key).collect();
        let cells = BTreeMap::from([(
            (0, 0, 0),
            Cuboid {
                small: all.clone(),
                large: all,
            },
        )]);
        return Ok(Partition { cells, steps });
    }

    let edge = Vector3::new(
        extent.x / steps[0] as f64,
        extent.y / steps[1] as f64,
        extent.z / steps[2] as f64,
    );
    let half_halo = halo_margin / 2.0;

    let reach = [0, 1, 2].map(|axis| (halo_margin / edge[axis]).ceil().min(steps[axis] as f64) + 1.0);
    if reach.iter().product::<f64>() > MAX_HALO_CELLS {
        return Err(Error::invalid_parameter(
            "halo_margin",
            format!(
                "{halo_margin} spans up to {reach:?} cuboids per atom for edges {:.3?}",
                [edge.x, edge.y, edge.z]
            ),
        ));
    }

    let mut cells: BTreeMap<CellIndex, Cuboid> = BTreeMap::new();

    for (key, pos) in &positions {
        let offset = pos - min;

        let home = [0, 1, 2].map(|axis| {
            let idx = (offset[axis] / edge[axis]).floor().max(0.0) as usize;
            idx.min(steps[axis] - 1)
        });
        cells
            .entry((home[0], home[1], home[2]))
            .or_default()
            .small
            .insert(*key);

        // Half-open halo interval [i*edge - h, (i+1)*edge + h) solved for i.
        let span = [0, 1, 2].map(|axis| {
            let lo = ((offset[axis] - half_halo) / edge[axis] - 1.0).floor().max(0.0) as usize;
            let hi = ((offset[axis] + half_halo) / edge[axis]).floor().max(0.0) as usize;
            let candidates = lo.min(steps[axis] - 1)..=hi.min(steps[axis] - 1);
            candidates
                .filter(|&i| {
                    let start = i as f64 * edge[axis] - half_halo;
                    let end = (i + 1) as f64 * edge[axis] + half_halo;
                    i == home[axis] || (start <= offset[axis] && offset[axis] < end)
                })
                .collect::<Vec<usize>>()
        });

        for &i in &span[0] {
            for &j in &span[1] {
                for &k in &span[2] {
                    cells.entry((i, j, k)).or_default().large.insert(*key);
                }
            }
        }
    }

    Ok(Partition { cells, steps })
}
