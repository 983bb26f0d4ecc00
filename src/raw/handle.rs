use core::num::NonZero;

/// Width of a stored handle.
///
/// Unit tests shrink it to 16 bits so that a test can fill every slot an
/// arena can address (`Handle::MAX`, 65 534 entries) and observe the
/// exhaustion panic. Builds use 32 bits, which caps a map at
/// `u32::MAX - 1` entries while keeping a child link at four bytes.
#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// Index of a slot in an [`Arena`](super::arena::Arena), stored off by one so
/// that `Option<Handle>` (an empty child slot) costs nothing extra.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub(crate) struct Handle(NonZero<RawHandle>);

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
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
