use alloc::vec::Vec;

use super::handle::Handle;
use crate::error::{Error, Result};

/// Generational slot arena with an intrusive free list.
///
/// Freeing never allocates: a vacant slot stores the index of the next vacant
/// slot. Every free bumps the slot's generation so handles to the old element
/// are detected as stale. A slot freed at the last generation is retired and
/// never handed out again.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<usize>,
    len: usize,
}

#[derive(Clone)]
struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

#[derive(Clone)]
enum Entry<T> {
    Occupied(T),
    Vacant(Option<usize>),
}

impl<T> Slot<T> {
    #[inline]
    fn occupied(&self, handle: Handle) -> Option<&T> {
        match &self.entry {
            Entry::Occupied(element) if self.generation == handle.generation() => Some(element),
            _ => None,
        }
    }

    #[inline]
    fn occupied_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match &mut self.entry {
            Entry::Occupied(element) if self.generation == handle.generation() => Some(element),
            _ => None,
        }
    }
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `element` and returns its handle.
    ///
    /// Fails with [`Error::AllocationFailed`] when the arena has no vacant slot
    /// and can neither grow its storage nor mint another handle. On failure the
    /// arena is unchanged and `element` is dropped.
    pub(crate) fn try_alloc(&mut self, element: T) -> Result<Handle> {
        if let Some(index) = self.free_head {
            // Reuse a free slot.
            let slot = &mut self.slots[index];
            let Entry::Vacant(next) = slot.entry else {
                unreachable!("`Arena::try_alloc()` - free list points at an occupied slot!");
            };
            self.free_head = next;
            slot.entry = Entry::Occupied(element);
            self.len += 1;
            return Ok(Handle::new(index, slot.generation));
        }

        // Total slot count may not exceed `Handle::MAX + 1`.
        if self.slots.len() > Handle::MAX {
            log::warn!("arena is at maximum capacity ({} slots)", self.slots.len());
            return Err(Error::AllocationFailed);
        }
        if self.slots.try_reserve(1).is_err() {
            log::warn!("arena could not grow beyond {} slots", self.slots.len());
            return Err(Error::AllocationFailed);
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Entry::Occupied(element),
        });
        self.len += 1;
        Ok(Handle::new(self.slots.len() - 1, 0))
    }

    /// Returns true if `handle` names a live element.
    #[inline]
    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.try_get(handle).is_some()
    }

    #[inline]
    pub(crate) fn try_get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.to_index())?.occupied(handle)
    }

    #[inline]
    pub(crate) fn try_get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.to_index())?.occupied_mut(handle)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.try_get(handle).expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.try_get_mut(handle).expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Returns a mutable reference to an element by handle from a raw pointer.
    ///
    /// Only the addressed slot is borrowed; references previously handed out
    /// for other slots stay valid.
    ///
    /// # Safety
    /// - `ptr` must point to a valid, allocated `Arena<T>`.
    /// - The caller must have logical exclusive access to the element at `handle`.
    #[inline]
    pub(crate) unsafe fn get_mut_ptr<'a>(ptr: *mut Self, handle: Handle) -> &'a mut T {
        // SAFETY: Caller guarantees `ptr` is valid. `as_mut_ptr` borrows the `Vec` header only, and
        // the bounds check below keeps the offset inside the initialized buffer.
        unsafe {
            let slots = &mut (*ptr).slots;
            let index = handle.to_index();
            assert!(index < slots.len(), "`Arena::get_mut_ptr()` - `handle` is invalid!");
            let slot = &mut *slots.as_mut_ptr().add(index);
            slot.occupied_mut(handle).expect("`Arena::get_mut_ptr()` - `handle` is invalid!")
        }
    }

    /// Removes and returns the element at `handle`, retiring the handle.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let index = handle.to_index();
        let slot = &mut self.slots[index];
        assert!(
            slot.occupied(handle).is_some(),
            "`Arena::take()` - `handle` is invalid!"
        );
        let Entry::Occupied(element) = core::mem::replace(&mut slot.entry, Entry::Vacant(None)) else {
            unreachable!();
        };
        self.len -= 1;

        // A slot whose generations are used up stays vacant and off the free list.
        if let Some(generation) = slot.generation.checked_add(1) {
            slot.generation = generation;
            slot.entry = Entry::Vacant(self.free_head);
            self.free_head = Some(index);
        } else {
            log::debug!("arena slot {index} retired after its last generation");
        }
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }
}
