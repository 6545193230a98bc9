use crate::io::error::Error;
use crate::model::{molecule::Molecule, topology::BondGraph};
use std::io::Write;

const FORMAT: &str = "bond list";

/// Writes one line per bond: both keys, both element symbols, and the bond length.
///
/// Bonds are listed with the lower key first, in ascending order.
pub fn write<W: Write>(mut writer: W, molecule: &Molecule, graph: &BondGraph) -> Result<(), Error> {
    writeln!(writer, "# {} atom(s), {} bond(s)", graph.atom_count(), graph.bond_count())
        .map_err(|e| Error::from_io(e, None))?;

    for bond in graph.bonds() {
        let (Some(first), Some(second)) = (molecule.atom(bond.a1), molecule.atom(bond.a2)) else {
            return Err(Error::inconsistent_data(
                FORMAT,
                None,
                format!("bond {}-{} names an atom missing from the molecule", bond.a1, bond.a2),
            ));
        };
        writeln!(
            writer,
            "{:>6} {:>6} {:>3} {:>3} {:>10.4}",
            bond.a1,
            bond.a2,
            first.element.symbol(),
            second.element.symbol(),
            first.distance(second)
        )
        .map_err(|e| Error::from_io(e, None))?;
    }

    Ok(())
}
