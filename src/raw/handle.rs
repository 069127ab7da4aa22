use core::fmt;
use core::num::NonZero;

#[cfg(test)]
type RawHandle = u16;
#[cfg(not(test))]
type RawHandle = u32;

/// An opaque, generation-checked reference to a node in a tree.
///
/// Handles stay valid across rotations and across unrelated inserts and erases.
/// Once the node they name is freed, every lookup through the handle fails with
/// [`Error::StaleHandle`](crate::Error::StaleHandle) instead of observing
/// whatever node later reuses the slot.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Handle {
    slot: NonZero<RawHandle>,
    generation: u32,
}

impl Handle {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        assert!(index <= Self::MAX, "`Handle::new()` - `index` > `Handle::MAX`!");
        // `index + 1` cannot be zero and cannot overflow.
        match NonZero::new((index + 1) as RawHandle) {
            Some(slot) => Self { slot, generation },
            None => unreachable!(),
        }
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.slot.get() - 1) as usize
    }

    #[inline]
    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.to_index(), self.generation)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    // Verify our assumptions about `Handle` and the niche optimization.
    assert_eq_size!(Handle, Option<Handle>);

    #[test]
    #[should_panic(expected = "`Handle::new()` - `index` > `Handle::MAX`!")]
    fn invalid_handle() {
        let _ = Handle::new(Handle::MAX + 1, 0);
    }

    #[test]
    fn generation_distinguishes_handles() {
        assert_ne!(Handle::new(3, 0), Handle::new(3, 1));
        assert_eq!(Handle::new(3, 7), Handle::new(3, 7));
    }

    proptest! {
        #[test]
        fn handle_round_trip(index in 0..=Handle::MAX, generation in any::<u32>()) {
            let handle = Handle::new(index, generation);
            prop_assert_eq!(handle.to_index(), index);
            prop_assert_eq!(handle.generation(), generation);
        }
    }
}
