use crate::io::error::Error;
use crate::model::zmatrix::ZMatrix;
use std::io::Write;

/// Writes `zmat` in the column layout accepted by [`super::reader::read`], preceded by a
/// comment line with the atom count.
pub fn write<W: Write>(mut writer: W, zmat: &ZMatrix) -> Result<(), Error> {
    writeln!(writer, "# z-matrix with {} atom(s)", zmat.len())
        .map_err(|e| Error::from_io(e, None))?;
    write!(writer, "{zmat}").map_err(|e| Error::from_io(e, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::zmat::reader::read;
    use crate::model::types::Element;
    use crate::model::zmatrix::ZmatRow;
    use std::io::Cursor;

    #[test]
    fn write_output_reads_back() {
        let mut zmat = ZMatrix::new();
        let mut rows = [
            ZmatRow::new(0, Element::C),
            ZmatRow::new(1, Element::C),
            ZmatRow::new(2, Element::O),
            ZmatRow::new(3, Element::H),
        ];
        rows[1].bond = Some((0, 1.5));
        rows[2].bond = Some((1, 1.43));
        rows[2].angle = Some((0, 109.47));
        rows[3].bond = Some((2, 0.96));
        rows[3].angle = Some((1, 108.0));
        rows[3].dihedral = Some((0, 301.25));
        for row in rows {
            zmat.push(row).unwrap();
        }

        let mut buffer = Vec::new();
        write(&mut buffer, &zmat).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("# z-matrix with 4 atom(s)\n"));
        assert_eq!(read(Cursor::new(text.as_bytes())).unwrap(), zmat);
    }
}
