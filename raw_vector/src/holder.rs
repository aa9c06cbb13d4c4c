//! Allocator embedding for the storage engines.

use core::mem;
use core::ops::Deref;

use crate::allocator::{Propagation, SlotAllocator};

/// Owns a container's allocator together with its propagation policy.
///
/// The policy is fixed when the holder is built (taken from
/// [`SlotAllocator::propagation`] unless given explicitly) and travels with
/// the allocator. Stateless allocators are zero-sized and add nothing to the
/// container's footprint; see [`AllocHolder::is_folded`].
///
/// Derefs to `A`, so engine code treats every holder as "an allocator
/// reference".
#[derive(Clone, Debug)]
pub struct AllocHolder<A> {
    alloc: A,
    policy: Propagation,
}

impl<A: SlotAllocator> AllocHolder<A> {
    pub fn new(alloc: A) -> Self {
        let policy = alloc.propagation();
        Self { alloc, policy }
    }

    pub fn with_propagation(alloc: A, policy: Propagation) -> Self {
        Self { alloc, policy }
    }

    /// A holder for the allocator a copy of this container should use,
    /// keeping the current policy.
    pub fn for_copy(&self) -> Self {
        Self {
            alloc: self.alloc.select_for_copy(),
            policy: self.policy,
        }
    }
}

impl<A> AllocHolder<A> {
    #[inline]
    pub fn get(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn propagation(&self) -> Propagation {
        self.policy
    }

    pub fn set_propagation(&mut self, policy: Propagation) {
        self.policy = policy;
    }

    pub fn into_inner(self) -> A {
        self.alloc
    }

    /// `true` when the allocator occupies no space inside the container.
    pub const fn is_folded() -> bool {
        mem::size_of::<A>() == 0
    }
}

impl<A> Deref for AllocHolder<A> {
    type Target = A;

    #[inline]
    fn deref(&self) -> &A {
        &self.alloc
    }
}

impl<A> AsRef<A> for AllocHolder<A> {
    fn as_ref(&self) -> &A {
        &self.alloc
    }
}
