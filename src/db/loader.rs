use super::schema::ElementTableFile;
use super::store::DataStore;
use std::collections::HashMap;

const ELEMENT_TABLE: &str = include_str!("../../data/elements.toml");

pub fn load_element_table() -> DataStore {
    parse_element_table(ELEMENT_TABLE)
        .unwrap_or_else(|e| panic!("Failed to parse embedded element table: {}", e))
}

pub fn parse_element_table(content: &str) -> Result<DataStore, String> {
    let schema: ElementTableFile = toml::from_str(content).map_err(|e| e.to_string())?;
    let mut elements_by_number = HashMap::with_capacity(schema.element.len());

    for record in schema.element {
        if record.bond_size <= 0.0 || !record.bond_size.is_finite() {
            return Err(format!(
                "element '{}' has a non-positive bond size",
                record.symbol
            ));
        }

        let number = record.number;
        if let Some(previous) = elements_by_number.insert(number, record) {
            return Err(format!(
                "duplicate entry for atomic number {} ('{}')",
                number, previous.symbol
            ));
        }
    }

    Ok(DataStore { elements_by_number })
}
