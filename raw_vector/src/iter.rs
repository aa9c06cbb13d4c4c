use core::fmt;
use core::iter::FusedIterator;
use core::slice;

use crate::allocator::{Global, SlotAllocator};
use crate::holder::AllocHolder;
use crate::storage::{RawSlots, destroy_span};

/// Owning iterator returned by `Vector::into_iter`.
///
/// Elements not yielded are destroyed, and the buffer released, when the
/// iterator is dropped.
pub struct IntoIter<T, A: SlotAllocator = Global> {
    buf: RawSlots<T>,
    alloc: AllocHolder<A>,
    head: usize,
    tail: usize,
}

impl<T, A: SlotAllocator> IntoIter<T, A> {
    pub(crate) fn new(buf: RawSlots<T>, len: usize, alloc: AllocHolder<A>) -> Self {
        Self {
            buf,
            alloc,
            head: 0,
            tail: len,
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr().add(self.head), self.tail - self.head) }
    }

    pub fn allocator(&self) -> &A {
        self.alloc.get()
    }
}

impl<T, A: SlotAllocator> Iterator for IntoIter<T, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        let value = unsafe { self.buf.slot(self.head).as_ptr().read() };
        self.head += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.tail - self.head;
        (remaining, Some(remaining))
    }
}

impl<T, A: SlotAllocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(unsafe { self.buf.slot(self.tail).as_ptr().read() })
    }
}

impl<T, A: SlotAllocator> ExactSizeIterator for IntoIter<T, A> {}

impl<T, A: SlotAllocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: SlotAllocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        unsafe { destroy_span(self.alloc.get(), &self.buf, self.head, self.tail) };
        self.buf.release(self.alloc.get());
    }
}

impl<T: fmt::Debug, A: SlotAllocator> fmt::Debug for IntoIter<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}
