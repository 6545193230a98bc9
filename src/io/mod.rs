//! Text formats: XYZ coordinates, Z-matrix tables, and bond lists.
//!
//! Readers take any `BufRead` and writers any `Write`; errors carry the format name and,
//! for parse failures, the offending line. Attach a file path with [`Error::with_path`].

mod bondlist;
mod error;
mod xyz;
mod zmat;

pub use xyz::reader::read as read_xyz;
pub use xyz::writer::write as write_xyz;

pub use zmat::reader::read as read_zmat;
pub use zmat::writer::write as write_zmat;

pub use bondlist::write as write_bond_list;

pub use error::Error;
