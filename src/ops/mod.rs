//! Algorithms over molecules: bond perception, build orders, Z-matrix conversion in both
//! directions, fragments, cuts, and rigid transforms. All fallible operations share
//! [`Error`].

mod bonds;
mod cartesian;
mod connectivity;
mod cut;
mod error;
mod fragment;
mod order;
mod overlap;
mod partition;
mod reference;
mod transform;
mod zmat;

pub mod geometry;

pub use bonds::{BondConfig, bond_graph, detect_bonds};
pub use cartesian::to_cartesian;
pub use connectivity::{connected_to, fragment_atoms, preserve_bonds};
pub use cut::{Origin, Region, cut_cuboid, cut_sphere};
pub use error::Error;
pub use fragment::{Fragment, MIN_ANCHORS, merge_fragment, validate_fragments};
pub use order::{OrderConfig, RecursionLevel, order_of_building};
pub use overlap::{OverlapMatrix, SELF_OVERLAP};
pub use partition::{CellIndex, Cuboid, Partition, partition};
pub use reference::pick_references;
pub use transform::Transform;
pub use zmat::{DegeneratePolicy, ZmatConfig, assemble, to_zmat};
