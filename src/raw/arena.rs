use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage for tree nodes.
///
/// Freed slots go on a free list and are handed out again by [`Arena::alloc`]. Dropping or
/// clearing the arena releases every live element by dropping the slot vector, so no
/// teardown ever walks the tree.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of live elements.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.to_index()] = Some(element);
            return handle;
        }

        assert!(
            self.slots.len() <= Handle::MAX,
            "`Arena::alloc()` - arena is at maximum capacity ({})",
            Handle::MAX + 1
        );
        self.slots.push(Some(element));
        Handle::from_index(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Removes the element and puts its slot on the free list.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
