use super::FORMAT;
use crate::io::error::Error;
use crate::model::{
    types::{AtomKey, Element},
    zmatrix::{ZMatrix, ZmatRow},
};
use std::io::BufRead;
use std::str::FromStr;

/// Reads a Z-matrix table.
///
/// Each non-blank line is `key element [bond_ref bond [angle_ref angle [dihedral_ref
/// dihedral]]]`, with lengths in ångströms and angles in degrees. Lines starting with `#`
/// are comments. References must name atoms of earlier rows.
pub fn read<R: BufRead>(reader: R) -> Result<ZMatrix, Error> {
    let mut zmat = ZMatrix::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let row = parse_row(trimmed, line_number)?;
        if let Some(reference) = row.references().into_iter().find(|key| !zmat.contains(*key)) {
            return Err(Error::inconsistent_data(
                FORMAT,
                None,
                format!(
                    "atom {} references {reference}, which has no earlier row (line {line_number})",
                    row.atom
                ),
            ));
        }
        zmat.push(row).map_err(|rejected| {
            Error::inconsistent_data(
                FORMAT,
                None,
                format!("atom {} appears twice (line {line_number})", rejected.atom),
            )
        })?;
    }

    Ok(zmat)
}

fn parse_row(line: &str, line_number: usize) -> Result<ZmatRow, Error> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 || tokens.len() > 8 || tokens.len() % 2 != 0 {
        return Err(Error::parse(
            FORMAT,
            None,
            line_number,
            format!("expected 2, 4, 6 or 8 columns, found {}", tokens.len()),
        ));
    }

    let atom = parse_key(tokens[0], line_number)?;
    let element = Element::from_str(tokens[1])
        .map_err(|e| Error::parse(FORMAT, None, line_number, e.to_string()))?;
    let mut row = ZmatRow::new(atom, element);

    let mut pairs = tokens[2..].chunks_exact(2).map(|pair| -> Result<_, Error> {
        let reference = parse_key(pair[0], line_number)?;
        let value = pair[1]
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                Error::parse(FORMAT, None, line_number, format!("invalid value '{}'", pair[1]))
            })?;
        Ok((reference, value))
    });

    row.bond = pairs.next().transpose()?;
    row.angle = pairs.next().transpose()?;
    row.dihedral = pairs.next().transpose()?;

    if !row.entry().has_distinct_references() {
        return Err(Error::parse(
            FORMAT,
            None,
            line_number,
            "references must differ from each other and from the atom",
        ));
    }

    Ok(row)
}

fn parse_key(token: &str, line_number: usize) -> Result<AtomKey, Error> {
    token.parse::<AtomKey>().map_err(|_| {
        Error::parse(FORMAT, None, line_number, format!("invalid atom key '{token}'"))
    })
}
