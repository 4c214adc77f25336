use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Stable address of a node slot in the [`Arena`](super::arena::Arena).
///
/// Stored off by one so that `Option<Handle>` (an empty child link) costs no extra space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` is non-zero and fits after the assert above.
        #[allow(clippy::cast_possible_truncation)]
        match NonZero::new((index + 1) as RawHandle) {
            Some(raw) => Self(raw),
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}
