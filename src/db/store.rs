use super::loader;
use super::schema::ElementRecord;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct DataStore {
    pub elements_by_number: HashMap<u8, ElementRecord>,
}

static STORE: OnceLock<DataStore> = OnceLock::new();

pub fn get_store() -> &'static DataStore {
    STORE.get_or_init(loader::load_element_table)
}
