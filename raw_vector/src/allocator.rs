//! The allocator capability contract consumed by both storage engines.
//!
//! A [`SlotAllocator`] hands out raw, uninitialized storage counted in units
//! of some type `U`, places values into it and tears them down again. The
//! methods are generic over `U`, so an engine that stores something other
//! than its logical element (the bit-packed vector stores bytes) simply calls
//! them with a different unit type.
//!
//! Acquiring storage and constructing values may fail and the failure is
//! propagated. Releasing storage and destroying values happen during cleanup;
//! their results are reported as [`CleanupError`] and discarded by the
//! engines.

use core::alloc::Layout;
use core::mem;
use core::ptr::{self, NonNull};

use crate::{CleanupError, VectorError};

/// Whether copy, move and swap of a container carry its allocator along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Propagation {
    /// Copy-assignment adopts the source's allocator.
    pub on_copy: bool,
    /// Move-assignment adopts the source's allocator.
    pub on_move: bool,
    /// Swap exchanges allocators together with the buffers.
    pub on_swap: bool,
}

impl Propagation {
    /// The destination always keeps its own allocator.
    pub const NONE: Self = Self {
        on_copy: false,
        on_move: false,
        on_swap: false,
    };

    /// The allocator travels with the contents on every transfer.
    pub const ALL: Self = Self {
        on_copy: true,
        on_move: true,
        on_swap: true,
    };
}

/// Storage provider for [`Vector`](crate::Vector) and the bit-packed vector.
///
/// # Safety contract for implementors
///
/// `allocate::<U>(n)` must return storage valid for `n` values of `U`, or a
/// dangling, well-aligned pointer when `n * size_of::<U>() == 0`. Storage
/// obtained from one allocator may be passed to `deallocate` of any allocator
/// for which [`interchangeable`](SlotAllocator::interchangeable) returns
/// `true`.
pub trait SlotAllocator: Clone {
    /// Obtains raw storage for `count` units of `U`.
    fn allocate<U>(&self, count: usize) -> Result<NonNull<U>, VectorError>;

    /// Releases storage obtained from `allocate::<U>(count)`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate::<U>` with the same `count` on this or an
    /// interchangeable allocator, and must not be used afterwards.
    unsafe fn deallocate<U>(&self, ptr: NonNull<U>, count: usize) -> Result<(), CleanupError>;

    /// Runs `make` and places the produced value into `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for writes and hold no live value.
    unsafe fn try_construct<U, E, F>(&self, slot: NonNull<U>, make: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<U, E>,
    {
        let value = make()?;
        unsafe { slot.as_ptr().write(value) };
        Ok(())
    }

    /// Drops the value living in `slot`.
    ///
    /// # Safety
    ///
    /// `slot` must hold a live value, which is dead after the call.
    unsafe fn destroy<U>(&self, slot: NonNull<U>) -> Result<(), CleanupError> {
        unsafe { ptr::drop_in_place(slot.as_ptr()) };
        Ok(())
    }

    /// The allocator a copy-constructed container should use.
    fn select_for_copy(&self) -> Self {
        self.clone()
    }

    /// Propagation policy a container adopts when built with this allocator.
    fn propagation(&self) -> Propagation {
        Propagation::NONE
    }

    /// Whether storage from `other` may be released through `self`.
    ///
    /// Moving a container onto an interchangeable allocator adopts its buffer
    /// instead of relocating elements.
    fn interchangeable(&self, other: &Self) -> bool;
}

/// Layout for `count` units of `U`, or `CapacityOverflow`.
#[inline]
pub fn array_layout<U>(count: usize) -> Result<Layout, VectorError> {
    Layout::array::<U>(count).map_err(|_| VectorError::CapacityOverflow)
}

/// The process-wide heap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Global;

impl SlotAllocator for Global {
    fn allocate<U>(&self, count: usize) -> Result<NonNull<U>, VectorError> {
        let layout = array_layout::<U>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        let raw = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(raw.cast::<U>()).ok_or(VectorError::AllocFailed {
            count,
            elem_size: mem::size_of::<U>(),
        })
    }

    unsafe fn deallocate<U>(&self, ptr: NonNull<U>, count: usize) -> Result<(), CleanupError> {
        let layout = Layout::array::<U>(count).map_err(|_| CleanupError)?;
        if layout.size() != 0 {
            unsafe { alloc::alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout) };
        }
        Ok(())
    }

    fn propagation(&self) -> Propagation {
        Propagation::ALL
    }

    fn interchangeable(&self, _other: &Self) -> bool {
        true
    }
}
