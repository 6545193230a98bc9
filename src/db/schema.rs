use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ElementTableFile {
    #[serde(default)]
    pub element: Vec<ElementRecord>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElementRecord {
    pub symbol: String,
    pub number: u8,
    pub mass: f64,
    pub bond_size: f64,
    pub valency: usize,
}
