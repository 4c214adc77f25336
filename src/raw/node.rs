use super::handle::Handle;

/// A binary search tree node: one entry plus links to the two subtrees it owns.
pub(crate) struct Node<K, V> {
    key: K,
    value: V,
    left: Option<Handle>,
    right: Option<Handle>,
}

/// Which child link of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl<K, V> Node<K, V> {
    /// Creates a childless node.
    pub(crate) const fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }

    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    pub(crate) const fn value(&self) -> &V {
        &self.value
    }

    pub(crate) fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub(crate) const fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    pub(crate) const fn left(&self) -> Option<Handle> {
        self.left
    }

    pub(crate) const fn right(&self) -> Option<Handle> {
        self.right
    }

    /// Swaps in a new entry, keeping the links. Returns the old entry.
    pub(crate) fn replace_entry(&mut self, key: K, value: V) -> (K, V) {
        let key = core::mem::replace(&mut self.key, key);
        let value = core::mem::replace(&mut self.value, value);
        (key, value)
    }

    pub(crate) fn into_entry(self) -> (K, V) {
        (self.key, self.value)
    }
}
