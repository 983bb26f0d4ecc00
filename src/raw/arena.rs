use alloc::vec::Vec;

use super::handle::Handle;

/// Slot storage addressed by [`Handle`]. Released slots go on a free list and
/// are handed out again before the slot vector grows.
#[derive(Clone)]
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

    /// Number of occupied slots.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        if let Some(handle) = self.free.pop() {
            self.slots[handle.to_index()] = Some(element);
            return handle;
        }

        assert!(
            self.slots.len() <= Handle::MAX,
            "`Arena::alloc()` - no handle left for a new slot ({} in use)",
            self.slots.len()
        );
        self.slots.push(Some(element));
        Handle::from_index(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is vacant!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is vacant!")
    }

    /// Moves the element out and puts its slot on the free list.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is vacant!");
        self.free.push(handle);
        element
    }
}
