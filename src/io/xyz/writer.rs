use crate::io::error::Error;
use crate::model::molecule::Molecule;
use std::io::Write;

/// Writes `molecule` as a single XYZ frame in ascending key order.
///
/// Line breaks inside `comment` are replaced by spaces so the header stays two lines.
pub fn write<W: Write>(mut writer: W, molecule: &Molecule, comment: &str) -> Result<(), Error> {
    let comment = comment.replace(['\r', '\n'], " ");

    writeln!(writer, "{}", molecule.atom_count()).map_err(|e| Error::from_io(e, None))?;
    writeln!(writer, "{comment}").map_err(|e| Error::from_io(e, None))?;

    for atom in molecule.iter_atoms() {
        writeln!(
            writer,
            "{:<3} {:>15.8} {:>15.8} {:>15.8}",
            atom.element.symbol(),
            atom.pos.x,
            atom.pos.y,
            atom.pos.z
        )
        .map_err(|e| Error::from_io(e, None))?;
    }

    Ok(())
}
