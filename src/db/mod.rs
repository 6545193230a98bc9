//! Internal database API exposing read-only views over the embedded element table.
//!
//! The table is compiled into the binary from `data/elements.toml` and parsed once on
//! first access. Callers obtain [`ElementView`] handles keyed by atomic number.

mod loader;
mod schema;
mod store;

/// Retrieves the tabulated data of an element.
///
/// # Arguments
///
/// * `number` - Atomic number of the element.
///
/// # Returns
///
/// `Some(ElementView)` when the element is tabulated, otherwise `None`.
pub fn element(number: u8) -> Option<ElementView<'static>> {
    store::get_store()
        .elements_by_number
        .get(&number)
        .map(ElementView::new)
}

/// Lightweight wrapper granting read-only access to a stored element record.
#[derive(Debug, Clone, Copy)]
pub struct ElementView<'a> {
    inner: &'a schema::ElementRecord,
}

impl<'a> ElementView<'a> {
    fn new(inner: &'a schema::ElementRecord) -> Self {
        Self { inner }
    }

    pub fn symbol(&self) -> &'a str {
        &self.inner.symbol
    }

    /// Standard atomic weight in g/mol.
    pub fn mass(&self) -> f64 {
        self.inner.mass
    }

    /// Bond radius in ångströms.
    pub fn bond_size(&self) -> f64 {
        self.inner.bond_size
    }

    pub fn valency(&self) -> usize {
        self.inner.valency
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Element;

    #[test]
    fn element_returns_none_for_untabulated_number() {
        assert!(element(0).is_none());
        assert!(element(118).is_none());
    }

    #[test]
    fn element_view_exposes_record_fields() {
        let oxygen = element(8).unwrap();
        assert_eq!(oxygen.symbol(), "O");
        assert_eq!(oxygen.mass(), 15.9994);
        assert_eq!(oxygen.valency(), 2);
        assert!((oxygen.bond_size() - 0.792).abs() < 1e-12);
    }

    #[test]
    fn table_symbols_match_element_symbols() {
        for number in 1..=96u8 {
            let view = element(number).unwrap();
            let parsed = Element::from_atomic_number(number).unwrap();
            assert_eq!(view.symbol(), parsed.symbol(), "mismatch at Z={}", number);
        }
    }
}
