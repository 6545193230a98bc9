use super::FORMAT;
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    molecule::Molecule,
    types::{Element, Point},
};
use std::io::BufRead;
use std::str::FromStr;

/// Reads a single-frame XYZ file.
///
/// The first line holds the atom count and the second a free comment. Each following
/// line is `element x y z`, where the element is a symbol or an atomic number; extra
/// columns are ignored. Atoms receive keys `0..n` in file order.
pub fn read<R: BufRead>(reader: R) -> Result<Molecule, Error> {
    let mut lines = reader.lines().enumerate();

    let Some((_, header)) = lines.next() else {
        return Err(Error::parse(FORMAT, None, 1, "empty input"));
    };
    let header = header.map_err(|e| Error::from_io(e, None))?;
    let expected = header
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or_else(|| Error::parse(FORMAT, None, 1, "first line must hold the atom count"))?;

    match lines.next() {
        Some((_, comment)) => {
            comment.map_err(|e| Error::from_io(e, None))?;
        }
        None if expected == 0 => return Ok(Molecule::new()),
        None => return Err(Error::parse(FORMAT, None, 2, "missing comment line")),
    }

    let mut molecule = Molecule::new();
    for (index, line) in lines {
        let line_number = index + 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;
        if line.trim().is_empty() {
            continue;
        }
        if molecule.atom_count() == expected {
            return Err(Error::inconsistent_data(
                FORMAT,
                None,
                format!("more atom lines than the declared count of {expected} (line {line_number})"),
            ));
        }
        molecule.add_atom(parse_atom_line(&line, line_number)?);
    }

    if molecule.atom_count() != expected {
        return Err(Error::inconsistent_data(
            FORMAT,
            None,
            format!(
                "declared {expected} atom(s) but found {}",
                molecule.atom_count()
            ),
        ));
    }

    Ok(molecule)
}

fn parse_atom_line(line: &str, line_number: usize) -> Result<Atom, Error> {
    let mut tokens = line.split_whitespace();

    let element = tokens
        .next()
        .ok_or_else(|| Error::parse(FORMAT, None, line_number, "missing element"))
        .and_then(|symbol| {
            Element::from_str(symbol)
                .map_err(|e| Error::parse(FORMAT, None, line_number, e.to_string()))
        })?;

    let mut coords = [0.0; 3];
    for (axis, coord) in ["x", "y", "z"].iter().zip(coords.iter_mut()) {
        *coord = tokens
            .next()
            .and_then(|token| token.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .ok_or_else(|| {
                Error::parse(FORMAT, None, line_number, format!("invalid {axis} coordinate"))
            })?;
    }

    Ok(Atom::new(element, Point::new(coords[0], coords[1], coords[2])))
}
