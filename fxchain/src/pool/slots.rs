use core::marker::PhantomData;

/// Typed index into a [`SlotPool`].
///
/// Handles are plain slot numbers; they are only meaningful for the pool that
/// issued them and only while that slot stays allocated.
pub trait SlotHandle: Copy {
    /// Wrap a slot index.
    fn from_index(index: usize) -> Self;

    /// The slot index this handle refers to.
    fn index(self) -> usize;
}

/// Fixed-capacity object pool with a first-fit in-use mask.
///
/// Acquisition scans the mask for the first free slot. Releasing a slot resets
/// its contents to `T::default()` before marking it free, so nothing from a
/// previous graph leaks into the next acquisition.
pub struct SlotPool<T, H, const N: usize> {
    /// `in_use[n]` is true while slot `n` is allocated.
    in_use: [bool; N],
    /// Slot storage.
    slots: [T; N],
    _handle: PhantomData<H>,
}

impl<T: Default, H: SlotHandle, const N: usize> SlotPool<T, H, N> {
    /// Create a pool with every slot free and default-initialised.
    pub fn new() -> Self {
        SlotPool {
            in_use: [false; N],
            slots: core::array::from_fn(|_| T::default()),
            _handle: PhantomData,
        }
    }

    /// Store `value` in the first free slot. Returns `None` if the pool is full.
    pub fn acquire(&mut self, value: T) -> Option<H> {
        let index = self.in_use.iter().position(|used| !used)?;
        self.in_use[index] = true;
        self.slots[index] = value;
        Some(H::from_index(index))
    }

    /// Reset a slot to its empty value and mark it free.
    pub fn release(&mut self, handle: H) {
        let index = handle.index();
        debug_assert!(self.in_use[index], "release of free slot {}", index);
        self.slots[index] = T::default();
        self.in_use[index] = false;
    }

    /// Release every allocated slot.
    pub fn release_all(&mut self) {
        for index in 0..N {
            if self.in_use[index] {
                self.release(H::from_index(index));
            }
        }
    }

    /// Number of currently allocated slots.
    pub fn count_in_use(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }

    /// Total number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether `handle` currently refers to an allocated slot.
    pub fn is_allocated(&self, handle: H) -> bool {
        self.in_use.get(handle.index()).copied().unwrap_or(false)
    }

    /// Shared access to an allocated slot.
    pub fn get(&self, handle: H) -> &T {
        debug_assert!(self.is_allocated(handle));
        &self.slots[handle.index()]
    }

    /// Exclusive access to an allocated slot.
    pub fn get_mut(&mut self, handle: H) -> &mut T {
        debug_assert!(self.is_allocated(handle));
        &mut self.slots[handle.index()]
    }
}

impl<T: Default, H: SlotHandle, const N: usize> Default for SlotPool<T, H, N> {
    fn default() -> Self {
        Self::new()
    }
}
