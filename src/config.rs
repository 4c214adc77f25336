/// How record keys are compared.
///
/// # Examples
///
/// ```
/// use roster_tree::{KeyOrder, Record};
///
/// let nine = Record::new("Ivanov", "Ivan", "TM-100", 9);
/// let ten = Record::new("Ivanov", "Petr", "TM-100", 10);
///
/// // "Ivanov9" sorts after "Ivanov10" as text.
/// assert!(nine.key(KeyOrder::Concatenated) > ten.key(KeyOrder::Concatenated));
/// assert!(nine.key(KeyOrder::SurnameThenId) < ten.key(KeyOrder::SurnameThenId));
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum KeyOrder {
    /// Compare `surname ++ decimal(id)` as text. Ids are not ordered numerically.
    #[default]
    Concatenated,
    /// Compare surnames as text, then ids as numbers.
    SurnameThenId,
}

/// Construction settings for an [`OrderedIndex`](crate::OrderedIndex).
///
/// # Examples
///
/// ```
/// use roster_tree::{IndexConfig, KeyOrder, OrderedIndex};
///
/// let config = IndexConfig::default().key_order(KeyOrder::SurnameThenId).capacity(64);
/// let index = OrderedIndex::with_config(config);
/// assert_eq!(index.key_order(), KeyOrder::SurnameThenId);
/// assert!(index.capacity() >= 64);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IndexConfig {
    key_order: KeyOrder,
    capacity: usize,
}

impl IndexConfig {
    /// The default configuration: concatenated keys, no preallocation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            key_order: KeyOrder::Concatenated,
            capacity: 0,
        }
    }

    /// Sets the key ordering.
    #[must_use]
    pub const fn key_order(mut self, key_order: KeyOrder) -> Self {
        self.key_order = key_order;
        self
    }

    /// Sets the number of nodes to preallocate.
    #[must_use]
    pub const fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) const fn ordering(&self) -> KeyOrder {
        self.key_order
    }

    pub(crate) const fn initial_capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_concatenated_and_no_preallocation() {
        let config = IndexConfig::default();
        assert_eq!(config, IndexConfig::new());
        assert_eq!(config.ordering(), KeyOrder::Concatenated);
        assert_eq!(config.initial_capacity(), 0);
    }

    #[test]
    fn builder_overrides() {
        let config = IndexConfig::default().capacity(8).key_order(KeyOrder::SurnameThenId);
        assert_eq!(config.ordering(), KeyOrder::SurnameThenId);
        assert_eq!(config.initial_capacity(), 8);
    }
}
