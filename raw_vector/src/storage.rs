//! Raw slot buffers and the staging area used to rebuild them.
//!
//! - [`RawSlots`] is a bare `(pointer, capacity)` handle with no drop glue.
//! - [`Staging`] constructs a run of fresh elements and unwinds them (and,
//!   for a freshly allocated buffer, the buffer itself) if it is dropped
//!   before [`Staging::commit`].

use core::marker::PhantomData;
use core::mem::ManuallyDrop;
use core::ptr::NonNull;

use crate::VectorError;
use crate::allocator::SlotAllocator;

/// Capacity of the first buffer a container allocates.
pub const INITIAL_CAPACITY: usize = 4;

/// Multiplier applied to capacity whenever more room is needed.
pub const GROWTH_FACTOR: usize = 2;

/// Next capacity able to hold `required` slots.
///
/// Keeps `current` when it already suffices, otherwise doubles from
/// `max(current, INITIAL_CAPACITY)` until it does.
pub fn grown_capacity(current: usize, required: usize) -> Result<usize, VectorError> {
    if required <= current {
        return Ok(current);
    }
    let mut cap = current.max(INITIAL_CAPACITY);
    while cap < required {
        cap = cap
            .checked_mul(GROWTH_FACTOR)
            .ok_or(VectorError::CapacityOverflow)?;
    }
    Ok(cap)
}

/// An owned-by-convention buffer of `cap` uninitialized slots.
///
/// Nothing is released on drop; the owning container calls
/// [`RawSlots::release`] with the allocator the buffer came from.
#[derive(Debug)]
pub struct RawSlots<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for RawSlots<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSlots<T> {}

impl<T> RawSlots<T> {
    /// The empty buffer: no storage, capacity 0.
    pub const fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            _marker: PhantomData,
        }
    }

    pub fn allocate<A: SlotAllocator>(alloc: &A, cap: usize) -> Result<Self, VectorError> {
        if cap == 0 {
            return Ok(Self::dangling());
        }
        Ok(Self {
            ptr: alloc.allocate::<T>(cap)?,
            cap,
            _marker: PhantomData,
        })
    }

    /// Returns the storage to `alloc`. Live slots must already be destroyed
    /// or moved out.
    pub fn release<A: SlotAllocator>(self, alloc: &A) {
        if self.cap != 0 {
            let _ = unsafe { alloc.deallocate(self.ptr, self.cap) };
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn slot(&self, index: usize) -> NonNull<T> {
        debug_assert!(index < self.cap || self.cap == 0);
        unsafe { self.ptr.add(index) }
    }
}

/// Destroys `slots[range]` best-effort.
///
/// # Safety
///
/// Every slot in the range must hold a live value.
pub unsafe fn destroy_span<T, A: SlotAllocator>(
    alloc: &A,
    slots: &RawSlots<T>,
    start: usize,
    end: usize,
) {
    for i in start..end {
        let _ = unsafe { alloc.destroy(slots.slot(i)) };
    }
}

/// A run of elements under construction at `start..start + built`.
///
/// Dropping an uncommitted `Staging` destroys what was built in reverse
/// order and, when the buffer was allocated for it, releases the buffer.
/// This is what unwinds a failed (or panicking) element constructor.
pub struct Staging<'a, T, A: SlotAllocator> {
    alloc: &'a A,
    slots: RawSlots<T>,
    owns_buffer: bool,
    start: usize,
    built: usize,
}

impl<'a, T, A: SlotAllocator> Staging<'a, T, A> {
    /// Stage into a new buffer of `cap` slots, starting at `start`.
    pub fn fresh(alloc: &'a A, cap: usize, start: usize) -> Result<Self, VectorError> {
        Ok(Self {
            alloc,
            slots: RawSlots::allocate(alloc, cap)?,
            owns_buffer: true,
            start,
            built: 0,
        })
    }

    /// Stage into the spare capacity of an existing buffer.
    pub fn in_place(alloc: &'a A, slots: RawSlots<T>, start: usize) -> Self {
        Self {
            alloc,
            slots,
            owns_buffer: false,
            start,
            built: 0,
        }
    }

    /// Constructs the next element with `make`.
    pub fn push_with<E, F>(&mut self, make: F) -> Result<(), E>
    where
        E: From<VectorError>,
        F: FnOnce() -> Result<T, E>,
    {
        let index = self.start + self.built;
        if index >= self.slots.capacity() {
            return Err(VectorError::CapacityOverflow.into());
        }
        unsafe { self.alloc.try_construct(self.slots.slot(index), make)? };
        self.built += 1;
        Ok(())
    }

    #[inline]
    pub fn built(&self) -> usize {
        self.built
    }

    #[inline]
    pub fn slots(&self) -> RawSlots<T> {
        self.slots
    }

    /// Keeps everything built so far and hands back the buffer.
    pub fn commit(self) -> RawSlots<T> {
        let this = ManuallyDrop::new(self);
        this.slots
    }
}

impl<T, A: SlotAllocator> Drop for Staging<'_, T, A> {
    fn drop(&mut self) {
        // elements first, buffer last
        while self.built > 0 {
            self.built -= 1;
            let _ = unsafe { self.alloc.destroy(self.slots.slot(self.start + self.built)) };
        }
        if self.owns_buffer {
            self.slots.release(self.alloc);
        }
    }
}
