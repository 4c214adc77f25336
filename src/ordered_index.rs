use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::iter::FusedIterator;

use tracing::{debug, trace};

use crate::raw::{self, RawTree};
use crate::{Describe, IndexConfig, IndexError, KeyOrder, Record, RecordKey, Result};

/// An ordered index of [`Record`]s backed by an unbalanced binary search tree.
///
/// Records are ordered by their [`RecordKey`] under the index's [`KeyOrder`]. With the
/// default [`KeyOrder::Concatenated`], the key is `surname ++ decimal(id)` compared as text,
/// so `("Ivanov", 9)` sorts after `("Ivanov", 10)`.
///
/// Duplicate keys are accepted. A key equal to a node's key is stored in that node's right
/// subtree, and removal by key takes out one matching record at a time.
///
/// The tree is never rebalanced: its height depends only on insertion order, and inserting
/// records in key order produces a chain. Every operation walks the tree with loops rather
/// than recursion, and dropping the index releases all nodes without walking it, so
/// deep trees are safe.
///
/// # Examples
///
/// ```
/// use roster_tree::{FirstYear, IndexError, OrderedIndex, Record};
///
/// let mut index = OrderedIndex::new();
/// index.insert(Record::new("Petrov", "Egor", "TR-322", 4321));
/// index.insert(Record::new("Ivanov", "Ivan", "TM-100", 1234).with_describer(FirstYear));
///
/// assert!(index.contains("Ivanov", 1234));
/// assert!(!index.contains("Ivanov", 1));
///
/// let surnames: Vec<&str> = index.iter().map(|record| record.surname()).collect();
/// assert_eq!(surnames, ["Ivanov", "Petrov"]);
///
/// let removed = index.remove("Petrov", 4321).unwrap();
/// assert_eq!(removed.given_name(), "Egor");
/// assert!(matches!(index.remove("Petrov", 4321), Err(IndexError::NotFound { .. })));
/// ```
pub struct OrderedIndex {
    tree: RawTree<RecordKey, Record>,
    config: IndexConfig,
}

impl OrderedIndex {
    /// Creates an empty index with the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tree: RawTree::new(),
            config: IndexConfig::new(),
        }
    }

    /// Creates an empty index with room for `capacity` records before reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(IndexConfig::new().capacity(capacity))
    }

    /// Creates an empty index with the given configuration.
    #[must_use]
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            tree: RawTree::with_capacity(config.initial_capacity()),
            config,
        }
    }

    /// The ordering this index compares keys with.
    #[must_use]
    pub const fn key_order(&self) -> KeyOrder {
        self.config.ordering()
    }

    /// Returns the number of records in the index.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of records the index can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tree.capacity()
    }

    /// Returns the number of nodes on the longest root-to-leaf path.
    ///
    /// ```
    /// use roster_tree::{OrderedIndex, Record};
    ///
    /// let mut index = OrderedIndex::new();
    /// for surname in ["A", "B", "C"] {
    ///     index.insert(Record::new(surname, "", "", 0));
    /// }
    /// // Sorted input degenerates into a chain.
    /// assert_eq!(index.height(), 3);
    /// ```
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.height()
    }

    fn query_key(&self, surname: &str, id: i64) -> RecordKey {
        RecordKey::new(surname, id, self.key_order())
    }

    /// Inserts `record`. Never fails and never replaces a record with an equal key.
    pub fn insert(&mut self, record: Record) {
        let key = record.key(self.key_order());
        trace!(key = %key, "inserting record");
        let depth = self.tree.insert(key, record);
        trace!(depth, len = self.len(), "record inserted");
    }

    /// Removes one record with the given key and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if no record has this key. The index is left
    /// unchanged.
    pub fn remove(&mut self, surname: &str, id: i64) -> Result<Record> {
        let key = self.query_key(surname, id);
        match self.tree.remove(&key) {
            Some((_, record)) => {
                trace!(key = %key, len = self.len(), "record removed");
                Ok(record)
            }
            None => {
                debug!(surname, id, "remove: no record with this key");
                Err(IndexError::NotFound {
                    surname: surname.into(),
                    id,
                })
            }
        }
    }

    /// Returns `true` if a record with the given key is stored.
    #[must_use]
    pub fn contains(&self, surname: &str, id: i64) -> bool {
        self.tree.contains_key(&self.query_key(surname, id))
    }

    /// Returns a record with the given key. With duplicate keys, the one nearest the root.
    #[must_use]
    pub fn get(&self, surname: &str, id: i64) -> Option<&Record> {
        self.tree.get(&self.query_key(surname, id))
    }

    /// Replaces the describer of a stored record. The key fields cannot change, so the
    /// record stays where it is.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if no record has this key.
    pub fn set_describer(&mut self, surname: &str, id: i64, describer: Option<Arc<dyn Describe>>) -> Result<()> {
        let key = self.query_key(surname, id);
        let record = self.tree.get_mut(&key).ok_or_else(|| IndexError::NotFound {
            surname: surname.into(),
            id,
        })?;
        record.set_describer(describer);
        Ok(())
    }

    /// Returns the record with the smallest key.
    #[must_use]
    pub fn first(&self) -> Option<&Record> {
        self.tree.first().map(|(_, record)| record)
    }

    /// Returns the record with the largest key.
    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.tree.last().map(|(_, record)| record)
    }

    /// Returns a snapshot of every record in ascending key order.
    ///
    /// The snapshot is independent of the index; clones share describers with the stored
    /// records.
    #[must_use]
    pub fn enumerate_in_order(&self) -> Vec<Record> {
        self.iter().cloned().collect()
    }

    /// Returns an iterator over the records in ascending key order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.tree.iter(),
        }
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        debug!(records = self.len(), "clearing index");
        self.tree.clear();
    }
}

impl Default for OrderedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OrderedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Extend<Record> for OrderedIndex {
    fn extend<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }
}

impl FromIterator<Record> for OrderedIndex {
    fn from_iter<I: IntoIterator<Item = Record>>(records: I) -> Self {
        let mut index = Self::new();
        index.extend(records);
        index
    }
}

impl<'a> IntoIterator for &'a OrderedIndex {
    type Item = &'a Record;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// An iterator over the records of an [`OrderedIndex`] in ascending key order.
///
/// This `struct` is created by [`OrderedIndex::iter`].
#[must_use = "iterators are lazy and do nothing unless consumed"]
#[derive(Clone)]
pub struct Iter<'a> {
    inner: raw::Iter<'a, RecordKey, Record>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Record;

    fn next(&mut self) -> Option<&'a Record> {
        self.inner.next().map(|(_, record)| record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl fmt::Debug for Iter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::SecondYear;
    use alloc::vec;
    use static_assertions::assert_impl_all;

    assert_impl_all!(OrderedIndex: Send, Sync, Default);

    fn keys(index: &OrderedIndex) -> Vec<alloc::string::String> {
        index.iter().map(Record::derive_key).collect()
    }

    #[test]
    fn ids_order_as_text_by_default() {
        let index: OrderedIndex = [9, 10, 100, 2]
            .into_iter()
            .map(|id| Record::new("Ivanov", "Ivan", "TM-100", id))
            .collect();
        assert_eq!(keys(&index), vec!["Ivanov10", "Ivanov100", "Ivanov2", "Ivanov9"]);
    }

    #[test]
    fn surname_then_id_orders_ids_numerically() {
        let mut index = OrderedIndex::with_config(IndexConfig::new().key_order(KeyOrder::SurnameThenId));
        index.extend([9, 10, 100, 2].map(|id| Record::new("Ivanov", "Ivan", "TM-100", id)));
        let ids: Vec<i64> = index.iter().map(Record::id).collect();
        assert_eq!(ids, vec![2, 9, 10, 100]);
        assert!(index.contains("Ivanov", 100));
        assert!(index.remove("Ivanov", 10).is_ok());
    }

    #[test]
    fn set_describer_reaches_the_stored_record() {
        let mut index = OrderedIndex::new();
        index.insert(Record::new("Sidorov", "Sidor", "TM-100", 9876));

        index.set_describer("Sidorov", 9876, Some(Arc::new(SecondYear))).unwrap();
        assert_eq!(
            index.get("Sidorov", 9876).map(Record::describe).as_deref(),
            Some("Sidor Sidorov - second-year-student TM-100")
        );

        assert_eq!(
            index.set_describer("Sidorov", 1, None),
            Err(IndexError::NotFound {
                surname: "Sidorov".into(),
                id: 1
            })
        );
    }

    #[test]
    fn first_last_and_clear() {
        let mut index: OrderedIndex = ["M", "A", "Z"].into_iter().map(|s| Record::new(s, "", "", 1)).collect();
        assert_eq!(index.first().map(Record::surname), Some("A"));
        assert_eq!(index.last().map(Record::surname), Some("Z"));

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.first().map(Record::surname), None);
        assert_eq!(index.height(), 0);
    }

    #[test]
    fn iter_is_exact_size() {
        let index: OrderedIndex = (0..7).map(|id| Record::new("X", "", "", id)).collect();
        let mut iter = index.iter();
        assert_eq!(iter.len(), 7);
        iter.next();
        assert_eq!(iter.len(), 6);
        assert_eq!((&index).into_iter().count(), 7);
    }
}
