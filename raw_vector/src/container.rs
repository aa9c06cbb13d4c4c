use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem::{self, ManuallyDrop};
use core::ops::{Bound, Deref, DerefMut, Index, IndexMut, RangeBounds};
use core::ptr;
use core::slice;

use bytemuck::Pod;

use crate::VectorError;
use crate::allocator::{Global, Propagation, SlotAllocator};
use crate::holder::AllocHolder;
use crate::iter::IntoIter;
use crate::storage::{INITIAL_CAPACITY, RawSlots, Staging, destroy_span, grown_capacity};

/// A contiguous growable array whose storage comes from a [`SlotAllocator`].
///
/// `Vector<T, A>` keeps `len` live elements at the front of a buffer of
/// `capacity()` slots. Every operation that changes capacity or moves
/// elements around follows the same protocol:
///
/// 1. allocate the new buffer,
/// 2. construct the new elements into their final slots,
/// 3. relocate the surviving elements,
/// 4. publish the new buffer, length and capacity,
/// 5. destroy removed elements and release the old buffer.
///
/// Steps 1 and 2 are the only ones that can fail. A failure there (an
/// allocation error, an error from a fallible producer, or a panicking
/// `Clone`) destroys whatever was built, releases the new buffer and leaves
/// the vector exactly as it was before the call.
///
/// # Capacity
///
/// A new vector reports [`INITIAL_CAPACITY`] slots but does not allocate
/// until the first element arrives; that first buffer holds exactly
/// `INITIAL_CAPACITY` slots and capacity doubles whenever more room is
/// needed, so 4, 8, 16, … A moved-from vector reports 0. Only
/// [`reserve`](Vector::reserve), [`reserve_exact`](Vector::reserve_exact),
/// [`shrink_to_fit`](Vector::shrink_to_fit) and
/// [`shrink_to`](Vector::shrink_to) step off that sequence.
///
/// # Examples
///
/// ```
/// use raw_vector::Vector;
///
/// let mut v = Vector::new();
/// for i in 0..5 {
///     v.push(i).unwrap();
/// }
///
/// assert_eq!(v.len(), 5);
/// assert_eq!(v.capacity(), 8);
/// assert_eq!(v, [0, 1, 2, 3, 4]);
///
/// v.insert(2, 10).unwrap();
/// assert_eq!(v.erase(0).unwrap(), 0);
/// assert_eq!(v, [1, 10, 2, 3, 4]);
/// ```
///
/// Checked access reports the offending index:
///
/// ```
/// use raw_vector::{Vector, VectorError};
///
/// let v = raw_vector::vector![1, 2, 3, 4, 5];
/// assert_eq!(v.at(4), Ok(&5));
/// assert_eq!(v.at(5), Err(VectorError::OutOfRange { index: 5, len: 5 }));
/// ```
///
/// # Invalidation
///
/// References and slice iterators borrow the vector, so the compiler rejects
/// any use of them across a call that may reallocate.
pub struct Vector<T, A: SlotAllocator = Global> {
    buf: RawSlots<T>,
    len: usize,
    // capacity reported while `buf` holds no storage
    nominal: usize,
    alloc: AllocHolder<A>,
}

unsafe impl<T: Send, A: SlotAllocator + Send> Send for Vector<T, A> {}
unsafe impl<T: Sync, A: SlotAllocator + Sync> Sync for Vector<T, A> {}

impl<T> Vector<T, Global> {
    /// Creates an empty vector on the global heap. Does not allocate.
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// `n` clones of `value`.
    pub fn from_elem(n: usize, value: &T) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        Self::from_elem_in(n, value, Global)
    }

    /// `n` default-constructed elements.
    pub fn with_len(n: usize) -> Result<Self, VectorError>
    where
        T: Default,
    {
        Self::with_len_in(n, Global)
    }

    /// Clones every element of `items`.
    ///
    /// # Examples
    ///
    /// ```
    /// use raw_vector::Vector;
    ///
    /// let v = Vector::from_slice(&["a", "b"]).unwrap();
    /// assert_eq!(v.len(), 2);
    /// assert_eq!(v.capacity(), 4);
    /// ```
    pub fn from_slice(items: &[T]) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        Self::from_slice_in(items, Global)
    }
}

impl<T, A: SlotAllocator> Vector<T, A> {
    /// Creates an empty vector using `alloc`. Does not allocate.
    pub fn new_in(alloc: A) -> Self {
        Self::with_holder(AllocHolder::new(alloc))
    }

    /// Creates an empty vector with an explicit propagation policy.
    pub fn with_propagation(alloc: A, policy: Propagation) -> Self {
        Self::with_holder(AllocHolder::with_propagation(alloc, policy))
    }

    fn with_holder(alloc: AllocHolder<A>) -> Self {
        Self {
            buf: RawSlots::dangling(),
            len: 0,
            nominal: INITIAL_CAPACITY,
            alloc,
        }
    }

    fn vacated(alloc: AllocHolder<A>) -> Self {
        Self {
            buf: RawSlots::dangling(),
            len: 0,
            nominal: 0,
            alloc,
        }
    }

    pub fn from_elem_in(n: usize, value: &T, alloc: A) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        Self::try_from_fn_in(n, alloc, |_| Ok(value.clone()))
    }

    pub fn with_len_in(n: usize, alloc: A) -> Result<Self, VectorError>
    where
        T: Default,
    {
        Self::try_from_fn_in(n, alloc, |_| Ok(T::default()))
    }

    pub fn from_slice_in(items: &[T], alloc: A) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        Self::try_from_fn_in(items.len(), alloc, |i| Ok(items[i].clone()))
    }

    /// Builds `n` elements from a fallible factory called with each index.
    ///
    /// The first error stops construction; everything built so far is
    /// destroyed and the error is returned.
    pub fn try_from_fn_in<E, F>(n: usize, alloc: A, mut make: F) -> Result<Self, E>
    where
        E: From<VectorError>,
        F: FnMut(usize) -> Result<T, E>,
    {
        let mut out = Self::new_in(alloc);
        out.append_with::<E, _>(n, |staging| {
            for i in 0..n {
                staging.push_with(|| make(i))?;
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Collects `iter`, pre-sizing when the iterator knows its exact length.
    pub fn from_iter_in<I>(iter: I, alloc: A) -> Result<Self, VectorError>
    where
        I: IntoIterator<Item = T>,
    {
        let iter = iter.into_iter();
        let mut out = Self::new_in(alloc);
        let (lower, upper) = iter.size_hint();
        if upper == Some(lower) {
            out.reserve(lower)?;
        }
        for item in iter {
            out.push(item)?;
        }
        Ok(out)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots available before the next reallocation.
    ///
    /// [`INITIAL_CAPACITY`] for a vector that has not allocated yet, 0 once
    /// its contents were moved out or shrunk away.
    #[inline]
    pub fn capacity(&self) -> usize {
        match self.buf.capacity() {
            0 => self.nominal,
            cap => cap,
        }
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.alloc.get()
    }

    #[inline]
    pub fn propagation(&self) -> Propagation {
        self.alloc.propagation()
    }

    pub fn set_propagation(&mut self, policy: Propagation) {
        self.alloc.set_propagation(policy);
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
    }

    /// Pointer to the first slot. Dangling while no buffer is held.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.buf.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_ptr()
    }

    /// Returns a reference to the element at `index`.
    ///
    /// # Errors
    ///
    /// `VectorError::OutOfRange` carrying `index` and the current length if
    /// `index >= len()`.
    pub fn at(&self, index: usize) -> Result<&T, VectorError> {
        self.as_slice().get(index).ok_or(VectorError::OutOfRange {
            index,
            len: self.len,
        })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<&mut T, VectorError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(VectorError::OutOfRange { index, len })
    }

    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Makes room for at least `additional` more elements.
    ///
    /// Capacity follows the doubling sequence; on failure nothing changes.
    ///
    /// # Examples
    ///
    /// ```
    /// use raw_vector::Vector;
    ///
    /// let mut v = Vector::<u32>::new();
    /// v.reserve(5).unwrap();
    /// assert_eq!(v.capacity(), 8);
    /// v.reserve(3).unwrap();
    /// assert_eq!(v.capacity(), 8);
    /// ```
    pub fn reserve(&mut self, additional: usize) -> Result<(), VectorError> {
        let required = self.required(additional)?;
        if required <= self.capacity() {
            return Ok(());
        }
        let new_cap = grown_capacity(self.capacity(), required)?;
        self.relocate(new_cap)
    }

    /// Like [`reserve`](Vector::reserve) but allocates exactly `len() + additional`.
    pub fn reserve_exact(&mut self, additional: usize) -> Result<(), VectorError> {
        let required = self.required(additional)?;
        if required <= self.capacity() {
            return Ok(());
        }
        self.relocate(required)
    }

    /// Reallocates to exactly `len()` slots. An empty vector gives up its
    /// buffer entirely.
    pub fn shrink_to_fit(&mut self) -> Result<(), VectorError> {
        self.shrink_to(0)
    }

    /// Reallocates to `max(len(), min_capacity)` if that is smaller than the
    /// current capacity.
    pub fn shrink_to(&mut self, min_capacity: usize) -> Result<(), VectorError> {
        let target = self.len.max(min_capacity);
        if target >= self.capacity() {
            return Ok(());
        }
        if self.buf.capacity() == 0 {
            self.nominal = target;
            return Ok(());
        }
        self.relocate(target)
    }

    /// Appends `value`.
    ///
    /// # Errors
    ///
    /// Allocation failure while growing; the vector is left unchanged and
    /// `value` is dropped.
    pub fn push(&mut self, value: T) -> Result<(), VectorError> {
        self.try_push_with(|| Ok::<T, VectorError>(value))?;
        Ok(())
    }

    /// Constructs a new last element from `make` and returns it.
    ///
    /// `len()` only grows once construction succeeded.
    pub fn try_push_with<E, F>(&mut self, make: F) -> Result<&mut T, E>
    where
        E: From<VectorError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.append_with(1, |staging| staging.push_with(make))?;
        Ok(unsafe { &mut *self.buf.slot(self.len - 1).as_ptr() })
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(unsafe { self.buf.slot(self.len).as_ptr().read() })
    }

    /// Destroys every element past `len`. Capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = mem::replace(&mut self.len, len);
        unsafe { destroy_span(self.alloc.get(), &self.buf, len, old_len) };
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Inserts `value` before position `pos` and returns `pos`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` when `pos > len()`, or allocation failure.
    pub fn insert(&mut self, pos: usize, value: T) -> Result<usize, VectorError> {
        self.try_emplace(pos, || Ok::<T, VectorError>(value))
    }

    /// Constructs an element in place before `pos`.
    pub fn emplace<F>(&mut self, pos: usize, make: F) -> Result<usize, VectorError>
    where
        F: FnOnce() -> T,
    {
        self.try_emplace(pos, || Ok::<T, VectorError>(make()))
    }

    /// Constructs an element before `pos` from a fallible factory.
    pub fn try_emplace<E, F>(&mut self, pos: usize, make: F) -> Result<usize, E>
    where
        E: From<VectorError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.check_position(pos)?;
        let new_cap = grown_capacity(self.capacity(), self.required(1)?)?;
        let old = self.rebuild(new_cap, pos, pos, 1, |staging| staging.push_with(make))?;
        self.release(old);
        Ok(pos)
    }

    /// Inserts `count` clones of `value` before `pos`; returns the index of
    /// the first inserted element.
    pub fn insert_n(&mut self, pos: usize, count: usize, value: &T) -> Result<usize, VectorError>
    where
        T: Clone,
    {
        self.try_insert_with(pos, count, |_| Ok(value.clone()))
    }

    pub fn insert_slice(&mut self, pos: usize, items: &[T]) -> Result<usize, VectorError>
    where
        T: Clone,
    {
        self.try_insert_with(pos, items.len(), |i| Ok(items[i].clone()))
    }

    pub fn insert_iter<I>(&mut self, pos: usize, iter: I) -> Result<usize, VectorError>
    where
        I: IntoIterator<Item = T>,
    {
        self.check_position(pos)?;
        let staged = Self::from_iter_in(iter, self.alloc.get().clone())?;
        let mut items = staged.into_iter();
        let count = items.len();
        self.try_insert_with(pos, count, |_| {
            items.next().ok_or(VectorError::CapacityOverflow)
        })
    }

    /// Inserts `count` elements built by `make(i)` before `pos`.
    ///
    /// All-or-nothing: the first error from `make` unwinds the new elements
    /// and leaves the vector as it was.
    pub fn try_insert_with<E, F>(&mut self, pos: usize, count: usize, mut make: F) -> Result<usize, E>
    where
        E: From<VectorError>,
        F: FnMut(usize) -> Result<T, E>,
    {
        self.check_position(pos)?;
        if count == 0 {
            return Ok(pos);
        }
        let new_cap = grown_capacity(self.capacity(), self.required(count)?)?;
        let old = self.rebuild::<E, _>(new_cap, pos, pos, count, |staging| {
            for i in 0..count {
                staging.push_with(|| make(i))?;
            }
            Ok(())
        })?;
        self.release(old);
        Ok(pos)
    }

    /// Removes and returns the element at `pos`.
    ///
    /// The survivors are rebuilt into a buffer of the same capacity.
    pub fn erase(&mut self, pos: usize) -> Result<T, VectorError> {
        if pos >= self.len {
            return Err(VectorError::OutOfRange {
                index: pos,
                len: self.len,
            });
        }
        let old = self.rebuild(self.capacity(), pos, pos + 1, 0, |_| {
            Ok::<(), VectorError>(())
        })?;
        let value = unsafe { old.slot(pos).as_ptr().read() };
        self.release(old);
        Ok(value)
    }

    /// Removes the elements in `range`; returns the index that now holds the
    /// first element after the removed span.
    pub fn erase_range<R>(&mut self, range: R) -> Result<usize, VectorError>
    where
        R: RangeBounds<usize>,
    {
        let (start, end) = self.resolve(range)?;
        if start == end {
            return Ok(start);
        }
        let old = self.rebuild(self.capacity(), start, end, 0, |_| {
            Ok::<(), VectorError>(())
        })?;
        self.retire(old, start, end);
        Ok(start)
    }

    /// Removes every element matching `pred` and returns how many went.
    ///
    /// `pred` sees every element before anything is moved, so a panicking
    /// predicate leaves the vector untouched.
    pub fn erase_if<F>(&mut self, mut pred: F) -> Result<usize, VectorError>
    where
        F: FnMut(&T) -> bool,
    {
        if self.len == 0 {
            return Ok(0);
        }
        let len = self.len;
        let staging = Staging::<T, A>::fresh(self.alloc.get(), self.capacity(), 0)?;
        let fresh = staging.slots();
        let (mut kept, mut removed) = (0, 0);
        for i in 0..len {
            let src = self.buf.slot(i).as_ptr();
            // bitwise copies; the originals stay live until the split is published
            if pred(unsafe { &*src }) {
                removed += 1;
                unsafe { ptr::copy_nonoverlapping(src, fresh.as_ptr().add(len - removed), 1) };
            } else {
                unsafe { ptr::copy_nonoverlapping(src, fresh.as_ptr().add(kept), 1) };
                kept += 1;
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        let fresh = staging.commit();
        let old = mem::replace(&mut self.buf, fresh);
        self.len = kept;
        self.release(old);
        unsafe { destroy_span(self.alloc.get(), &self.buf, kept, len) };
        Ok(removed)
    }

    /// Removes every element equal to `value`.
    pub fn erase_value<U>(&mut self, value: &U) -> Result<usize, VectorError>
    where
        T: PartialEq<U>,
    {
        self.erase_if(|item| item == value)
    }

    /// Resizes to `new_len`, cloning `value` into new slots.
    pub fn resize(&mut self, new_len: usize, value: &T) -> Result<(), VectorError>
    where
        T: Clone,
    {
        self.try_resize_with(new_len, || Ok::<T, VectorError>(value.clone()))
    }

    pub fn resize_default(&mut self, new_len: usize) -> Result<(), VectorError>
    where
        T: Default,
    {
        self.try_resize_with(new_len, || Ok::<T, VectorError>(T::default()))
    }

    /// Resizes to `new_len`, building new elements with `make`.
    ///
    /// Shrinking destroys the tail. Growing is all-or-nothing: if `make`
    /// fails, length, capacity and contents are as before the call.
    pub fn try_resize_with<E, F>(&mut self, new_len: usize, mut make: F) -> Result<(), E>
    where
        E: From<VectorError>,
        F: FnMut() -> Result<T, E>,
    {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        let count = new_len - self.len;
        self.append_with(count, |staging| {
            for _ in 0..count {
                staging.push_with(&mut make)?;
            }
            Ok(())
        })
    }

    pub fn extend_from_slice(&mut self, items: &[T]) -> Result<(), VectorError>
    where
        T: Clone,
    {
        self.append_with(items.len(), |staging| {
            for item in items {
                staging.push_with(|| Ok::<T, VectorError>(item.clone()))?;
            }
            Ok(())
        })
    }

    /// Deep copy using the allocator's copy selection.
    pub fn try_clone(&self) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        self.clone_into_holder(self.alloc.for_copy(), |item| {
            Ok::<T, VectorError>(item.clone())
        })
    }

    /// Deep copy into storage from `alloc`.
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, VectorError>
    where
        T: Clone,
    {
        self.clone_into_holder(AllocHolder::new(alloc), |item| {
            Ok::<T, VectorError>(item.clone())
        })
    }

    /// Deep copy with a fallible element copier.
    pub fn try_clone_with<E, F>(&self, copy: F) -> Result<Self, E>
    where
        E: From<VectorError>,
        F: FnMut(&T) -> Result<T, E>,
    {
        self.clone_into_holder(self.alloc.for_copy(), copy)
    }

    fn clone_into_holder<E, F>(&self, holder: AllocHolder<A>, mut copy: F) -> Result<Self, E>
    where
        E: From<VectorError>,
        F: FnMut(&T) -> Result<T, E>,
    {
        let mut out = Self::with_holder(holder);
        out.append_with::<E, _>(self.len, |staging| {
            for item in self.as_slice() {
                staging.push_with(|| copy(item))?;
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Moves the contents out, leaving `self` empty with no buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use raw_vector::vector;
    ///
    /// let mut a = vector![1, 2, 3];
    /// let b = a.take();
    /// assert_eq!(b, [1, 2, 3]);
    /// assert_eq!((a.len(), a.capacity()), (0, 0));
    /// a.push(4).unwrap();
    /// ```
    pub fn take(&mut self) -> Self {
        let empty = Self::vacated(self.alloc.clone());
        mem::replace(self, empty)
    }

    /// Moves `source`'s contents into a vector backed by `alloc`.
    ///
    /// When `alloc` is interchangeable with `source`'s allocator the buffer is
    /// adopted as is; otherwise the elements are relocated into fresh storage
    /// from `alloc`. On success `source` is left empty; on failure it is
    /// untouched.
    pub fn move_in(source: &mut Self, alloc: A) -> Result<Self, VectorError> {
        let holder = AllocHolder::new(alloc);
        if holder.interchangeable(source.alloc.get()) {
            let buf = mem::replace(&mut source.buf, RawSlots::dangling());
            let len = mem::replace(&mut source.len, 0);
            let nominal = mem::replace(&mut source.nominal, 0);
            return Ok(Self {
                buf,
                len,
                nominal,
                alloc: holder,
            });
        }
        let fresh = RawSlots::allocate(holder.get(), grown_capacity(0, source.len)?)?;
        unsafe { ptr::copy_nonoverlapping(source.buf.as_ptr(), fresh.as_ptr(), source.len) };
        let len = mem::replace(&mut source.len, 0);
        let nominal = mem::replace(&mut source.nominal, 0);
        let old = mem::replace(&mut source.buf, RawSlots::dangling());
        source.release(old);
        Ok(Self {
            buf: fresh,
            len,
            nominal,
            alloc: holder,
        })
    }

    /// Copy-assignment.
    ///
    /// With `on_copy` propagation the allocator is taken from `source`,
    /// otherwise this vector keeps its own. The copy is built completely
    /// before the old contents are dropped.
    pub fn assign_clone(&mut self, source: &Self) -> Result<(), VectorError>
    where
        T: Clone,
    {
        let policy = self.alloc.propagation();
        let alloc = if policy.on_copy {
            source.allocator().clone()
        } else {
            self.allocator().clone()
        };
        let holder = AllocHolder::with_propagation(alloc, policy);
        *self = source.clone_into_holder(holder, |item| Ok::<T, VectorError>(item.clone()))?;
        Ok(())
    }

    /// Move-assignment. `source` is left empty.
    ///
    /// The buffer is adopted when `on_move` propagation is set or the two
    /// allocators are interchangeable; otherwise the elements are relocated
    /// into storage from this vector's allocator.
    pub fn assign_move(&mut self, source: &mut Self) -> Result<(), VectorError> {
        let policy = self.alloc.propagation();
        if policy.on_move {
            let vacated = Self::vacated(source.alloc.clone());
            *self = mem::replace(source, vacated);
            self.alloc.set_propagation(policy);
            return Ok(());
        }
        if self.alloc.interchangeable(source.alloc.get()) {
            let buf = mem::replace(&mut source.buf, RawSlots::dangling());
            let len = mem::replace(&mut source.len, 0);
            self.nominal = mem::replace(&mut source.nominal, 0);
            let old = mem::replace(&mut self.buf, buf);
            let old_len = mem::replace(&mut self.len, len);
            self.retire(old, 0, old_len);
            return Ok(());
        }
        let mut moved = Self::move_in(source, self.alloc.get().clone())?;
        moved.alloc.set_propagation(policy);
        *self = moved;
        Ok(())
    }

    /// Replaces the contents with `n` clones of `value`.
    pub fn assign_fill(&mut self, n: usize, value: &T) -> Result<(), VectorError>
    where
        T: Clone,
    {
        let mut fresh = Self::with_holder(self.alloc.clone());
        fresh.resize(n, value)?;
        *self = fresh;
        Ok(())
    }

    pub fn assign_slice(&mut self, items: &[T]) -> Result<(), VectorError>
    where
        T: Clone,
    {
        let mut fresh = Self::with_holder(self.alloc.clone());
        fresh.extend_from_slice(items)?;
        *self = fresh;
        Ok(())
    }

    pub fn assign_iter<I>(&mut self, iter: I) -> Result<(), VectorError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut fresh = Self::from_iter_in(iter, self.alloc.get().clone())?;
        fresh.alloc.set_propagation(self.alloc.propagation());
        *self = fresh;
        Ok(())
    }

    /// Exchanges contents with `other` in constant time.
    ///
    /// Allocators are exchanged too when `on_swap` propagation is set;
    /// otherwise both allocators must be interchangeable.
    pub fn swap_with(&mut self, other: &mut Self) {
        if self.alloc.propagation().on_swap {
            mem::swap(self, other);
            return;
        }
        debug_assert!(self.alloc.interchangeable(other.alloc.get()));
        mem::swap(&mut self.buf, &mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
        mem::swap(&mut self.nominal, &mut other.nominal);
    }

    /// The live elements as raw bytes.
    pub fn as_bytes(&self) -> &[u8]
    where
        T: Pod,
    {
        bytemuck::cast_slice(self.as_slice())
    }

    pub(crate) fn into_raw_parts(self) -> (RawSlots<T>, usize, AllocHolder<A>) {
        let this = ManuallyDrop::new(self);
        let alloc = unsafe { ptr::read(&this.alloc) };
        (this.buf, this.len, alloc)
    }

    #[inline]
    fn required(&self, additional: usize) -> Result<usize, VectorError> {
        self.len
            .checked_add(additional)
            .ok_or(VectorError::CapacityOverflow)
    }

    fn check_position(&self, pos: usize) -> Result<(), VectorError> {
        if pos > self.len {
            return Err(VectorError::OutOfRange {
                index: pos,
                len: self.len,
            });
        }
        Ok(())
    }

    fn resolve<R: RangeBounds<usize>>(&self, range: R) -> Result<(usize, usize), VectorError> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.checked_add(1).ok_or(VectorError::CapacityOverflow)?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.checked_add(1).ok_or(VectorError::CapacityOverflow)?,
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        if start > end || end > self.len {
            return Err(VectorError::InvalidRange {
                start,
                end,
                len: self.len,
            });
        }
        Ok((start, end))
    }

    /// Constructs `count` elements at the end, in place when they fit and
    /// through a rebuild otherwise.
    fn append_with<E, F>(&mut self, count: usize, fill: F) -> Result<(), E>
    where
        E: From<VectorError>,
        F: for<'s> FnOnce(&mut Staging<'s, T, A>) -> Result<(), E>,
    {
        let required = self.required(count)?;
        if required <= self.buf.capacity() {
            let mut staging = Staging::in_place(self.alloc.get(), self.buf, self.len);
            fill(&mut staging)?;
            debug_assert_eq!(staging.built(), count);
            staging.commit();
            self.len = required;
            return Ok(());
        }
        let new_cap = grown_capacity(self.capacity(), required)?;
        let old = self.rebuild(new_cap, self.len, self.len, count, fill)?;
        self.release(old);
        Ok(())
    }

    /// Rebuilds the contents as `self[..at] ++ <count new> ++ self[resume..]`
    /// in a fresh buffer of `new_cap` slots.
    ///
    /// Returns the old buffer, in which `at..resume` is still live; the caller
    /// retires it.
    fn rebuild<E, F>(
        &mut self,
        new_cap: usize,
        at: usize,
        resume: usize,
        count: usize,
        fill: F,
    ) -> Result<RawSlots<T>, E>
    where
        E: From<VectorError>,
        F: for<'s> FnOnce(&mut Staging<'s, T, A>) -> Result<(), E>,
    {
        debug_assert!(at <= resume && resume <= self.len);
        let tail = self.len - resume;
        debug_assert!(at + count + tail <= new_cap);

        let mut staging = Staging::fresh(self.alloc.get(), new_cap, at)?;
        fill(&mut staging)?;
        debug_assert_eq!(staging.built(), count);
        let fresh = staging.commit();

        unsafe {
            ptr::copy_nonoverlapping(self.buf.as_ptr(), fresh.as_ptr(), at);
            ptr::copy_nonoverlapping(
                self.buf.as_ptr().add(resume),
                fresh.as_ptr().add(at + count),
                tail,
            );
        }
        self.len = at + count + tail;
        Ok(mem::replace(&mut self.buf, fresh))
    }

    /// Moves the live elements into a buffer of exactly `new_cap` slots.
    fn relocate(&mut self, new_cap: usize) -> Result<(), VectorError> {
        debug_assert!(new_cap >= self.len);
        let fresh = RawSlots::allocate(self.alloc.get(), new_cap)?;
        unsafe { ptr::copy_nonoverlapping(self.buf.as_ptr(), fresh.as_ptr(), self.len) };
        let old = mem::replace(&mut self.buf, fresh);
        self.nominal = 0;
        self.release(old);
        Ok(())
    }

    fn release(&self, old: RawSlots<T>) {
        old.release(self.alloc.get());
    }

    fn retire(&self, old: RawSlots<T>, start: usize, end: usize) {
        unsafe { destroy_span(self.alloc.get(), &old, start, end) };
        self.release(old);
    }
}

impl<T, A: SlotAllocator> Drop for Vector<T, A> {
    fn drop(&mut self) {
        // elements before buffer
        unsafe { destroy_span(self.alloc.get(), &self.buf, 0, self.len) };
        self.buf.release(self.alloc.get());
    }
}

impl<T, A: SlotAllocator> Deref for Vector<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: SlotAllocator> DerefMut for Vector<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: SlotAllocator> Index<usize> for Vector<T, A> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.at(index).expect("index out of bounds")
    }
}

impl<T, A: SlotAllocator> IndexMut<usize> for Vector<T, A> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.at_mut(index).expect("index out of bounds")
    }
}

impl<T, A: SlotAllocator + Default> Default for Vector<T, A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<T: Clone, A: SlotAllocator> Clone for Vector<T, A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("vector clone failed: {}", err),
        }
    }
}

impl<T: fmt::Debug, A: SlotAllocator> fmt::Debug for Vector<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, U, A, B> PartialEq<Vector<U, B>> for Vector<T, A>
where
    T: PartialEq<U>,
    A: SlotAllocator,
    B: SlotAllocator,
{
    fn eq(&self, other: &Vector<U, B>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: PartialEq<U>, U, A: SlotAllocator> PartialEq<[U]> for Vector<T, A> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, A: SlotAllocator> PartialEq<&[U]> for Vector<T, A> {
    fn eq(&self, other: &&[U]) -> bool {
        self.as_slice() == *other
    }
}

impl<T: PartialEq<U>, U, A: SlotAllocator, const N: usize> PartialEq<[U; N]> for Vector<T, A> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq, A: SlotAllocator> Eq for Vector<T, A> {}

impl<T: PartialOrd, A: SlotAllocator> PartialOrd for Vector<T, A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

/// Lexicographic by element, then by length.
impl<T: Ord, A: SlotAllocator> Ord for Vector<T, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<T: Hash, A: SlotAllocator> Hash for Vector<T, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<T> FromIterator<T> for Vector<T, Global> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        match Self::from_iter_in(iter, Global) {
            Ok(v) => v,
            Err(err) => panic!("vector collect failed: {}", err),
        }
    }
}

impl<T, A: SlotAllocator> Extend<T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            if let Err(err) = self.push(item) {
                panic!("vector extend failed: {}", err);
            }
        }
    }
}

impl<'a, T: Clone + 'a, A: SlotAllocator> Extend<&'a T> for Vector<T, A> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.extend(iter.into_iter().cloned());
    }
}

impl<'a, T, A: SlotAllocator> IntoIterator for &'a Vector<T, A> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, A: SlotAllocator> IntoIterator for &'a mut Vector<T, A> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, A: SlotAllocator> IntoIterator for Vector<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> Self::IntoIter {
        let (buf, len, alloc) = self.into_raw_parts();
        IntoIter::new(buf, len, alloc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CleanupError;
    use crate::vector;
    use bytemuck_derive::{Pod, Zeroable};
    use core::ptr::NonNull;
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Packet {
        id: u32,
        value: f32,
    }

    #[derive(Default)]
    struct Ledger {
        allocations: Cell<usize>,
        live_buffers: Cell<isize>,
        fail_after: Cell<Option<usize>>,
        fail_cleanup: Cell<bool>,
        constructed: Cell<usize>,
    }

    /// Global heap plus bookkeeping, with an injectable failure.
    #[derive(Clone)]
    struct Probe {
        id: u32,
        policy: Propagation,
        ledger: Rc<Ledger>,
    }

    impl Probe {
        fn new(id: u32) -> Self {
            Self {
                id,
                policy: Propagation::NONE,
                ledger: Rc::new(Ledger::default()),
            }
        }

        fn fail_after(&self, allocations: usize) {
            self.ledger
                .fail_after
                .set(Some(self.ledger.allocations.get() + allocations));
        }
    }

    impl SlotAllocator for Probe {
        fn allocate<U>(&self, count: usize) -> Result<NonNull<U>, VectorError> {
            let made = self.ledger.allocations.get();
            if self.ledger.fail_after.get() == Some(made) {
                return Err(VectorError::AllocFailed {
                    count,
                    elem_size: mem::size_of::<U>(),
                });
            }
            let ptr = Global.allocate::<U>(count)?;
            self.ledger.allocations.set(made + 1);
            self.ledger.live_buffers.set(self.ledger.live_buffers.get() + 1);
            Ok(ptr)
        }

        unsafe fn deallocate<U>(&self, ptr: NonNull<U>, count: usize) -> Result<(), CleanupError> {
            unsafe { Global.deallocate(ptr, count)? };
            self.ledger.live_buffers.set(self.ledger.live_buffers.get() - 1);
            if self.ledger.fail_cleanup.get() {
                return Err(CleanupError);
            }
            Ok(())
        }

        unsafe fn try_construct<U, E, F>(&self, slot: NonNull<U>, make: F) -> Result<(), E>
        where
            F: FnOnce() -> Result<U, E>,
        {
            unsafe { slot.as_ptr().write(make()?) };
            self.ledger.constructed.set(self.ledger.constructed.get() + 1);
            Ok(())
        }

        fn propagation(&self) -> Propagation {
            self.policy
        }

        fn interchangeable(&self, other: &Self) -> bool {
            self.id == other.id
        }
    }

    thread_local! {
        static LIVE: Cell<isize> = const { Cell::new(0) };
        static CLONES_LEFT: Cell<Option<usize>> = const { Cell::new(None) };
    }

    /// Counts live instances; `clone` panics once the armed budget runs out.
    #[derive(Debug, PartialEq)]
    struct Fragile(u32);

    impl Fragile {
        fn new(v: u32) -> Self {
            LIVE.with(|l| l.set(l.get() + 1));
            Fragile(v)
        }

        fn arm(clones: usize) {
            CLONES_LEFT.with(|c| c.set(Some(clones)));
        }

        fn disarm() {
            CLONES_LEFT.with(|c| c.set(None));
        }

        fn live() -> isize {
            LIVE.with(|l| l.get())
        }
    }

    impl Clone for Fragile {
        fn clone(&self) -> Self {
            CLONES_LEFT.with(|c| match c.get() {
                Some(0) => panic!("clone budget exhausted"),
                Some(n) => c.set(Some(n - 1)),
                None => {}
            });
            Fragile::new(self.0)
        }
    }

    impl Drop for Fragile {
        fn drop(&mut self) {
            LIVE.with(|l| l.set(l.get() - 1));
        }
    }

    fn fragile_vector(n: u32) -> Vector<Fragile> {
        let mut v = Vector::new();
        for i in 0..n {
            v.push(Fragile::new(i)).unwrap();
        }
        v
    }

    fn values(v: &Vector<Fragile>) -> std::vec::Vec<u32> {
        v.iter().map(|f| f.0).collect()
    }

    #[test]
    fn push_grows_by_doubling() -> Result<(), VectorError> {
        let mut v = Vector::new();
        assert_eq!(v.capacity(), 4);

        let mut seen = std::vec::Vec::new();
        for i in 0..17u32 {
            v.push(i)?;
            seen.push(v.capacity());
        }

        assert_eq!(&seen[..5], &[4, 4, 4, 4, 8]);
        assert_eq!(v.capacity(), 32);
        for (i, x) in v.iter().enumerate() {
            assert_eq!(*x, i as u32);
        }
        Ok(())
    }

    #[test]
    fn initial_capacity_is_reported_before_allocating() -> Result<(), VectorError> {
        let probe = Probe::new(1);
        let mut v = Vector::new_in(probe.clone());
        assert_eq!(v.capacity(), 4);
        v.reserve(3)?;
        assert_eq!(probe.ledger.allocations.get(), 0);

        v.push(1u8)?;
        assert_eq!(probe.ledger.allocations.get(), 1);
        assert_eq!(v.capacity(), 4);

        let mut empty = Vector::<u8, _>::new_in(probe.clone());
        empty.shrink_to_fit()?;
        assert_eq!(empty.capacity(), 0);
        empty.push(2)?;
        assert_eq!(empty.capacity(), 4);

        v.clear();
        v.shrink_to_fit()?;
        assert_eq!(v.capacity(), 0);
        assert_eq!(probe.ledger.live_buffers.get(), 1);
        Ok(())
    }

    #[test]
    fn checked_access() {
        let mut v = vector![10, 20, 30, 40, 50];
        assert_eq!(v.at(4), Ok(&50));
        assert_eq!(v.at(5), Err(VectorError::OutOfRange { index: 5, len: 5 }));
        *v.at_mut(0).unwrap() = 11;
        assert_eq!(v[0], 11);
        assert_eq!(v.front(), Some(&11));
        assert_eq!(v.back(), Some(&50));
        assert!(v.at_mut(9).is_err());
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn index_past_end_panics() {
        let v = vector![1, 2];
        let _ = v[2];
    }

    #[test]
    fn insert_and_erase_rebuild_in_order() -> Result<(), VectorError> {
        let mut v = vector![1, 2, 3, 4];
        assert_eq!(v.capacity(), 4);

        assert_eq!(v.insert(0, 0)?, 0);
        assert_eq!(v.capacity(), 8);
        assert_eq!(v.insert(5, 5)?, 5);
        assert_eq!(v.insert(3, 99)?, 3);
        assert_eq!(v, [0, 1, 2, 99, 3, 4, 5]);

        assert_eq!(v.erase(3)?, 99);
        assert_eq!(v.erase_range(1..3)?, 1);
        assert_eq!(v, [0, 3, 4, 5]);
        assert_eq!(v.capacity(), 8);

        assert_eq!(
            v.insert(9, 1),
            Err(VectorError::OutOfRange { index: 9, len: 4 })
        );
        assert_eq!(
            v.erase(4),
            Err(VectorError::OutOfRange { index: 4, len: 4 })
        );
        assert_eq!(
            v.erase_range(3..9),
            Err(VectorError::InvalidRange {
                start: 3,
                end: 9,
                len: 4
            })
        );
        Ok(())
    }

    #[test]
    fn bulk_inserts() -> Result<(), VectorError> {
        let mut v = vector![1, 5];
        assert_eq!(v.insert_slice(1, &[2, 3])?, 1);
        assert_eq!(v.insert_n(3, 2, &4)?, 3);
        assert_eq!(v.insert_iter(6, [6, 7])?, 6);
        assert_eq!(v.emplace(0, || 0)?, 0);
        assert_eq!(v, [0, 1, 2, 3, 4, 4, 5, 6, 7]);
        assert_eq!(v.insert_n(2, 0, &9)?, 2);
        assert_eq!(v.len(), 9);
        Ok(())
    }

    #[test]
    fn resize_truncate_and_pop() -> Result<(), VectorError> {
        let mut v: Vector<String> = Vector::new();
        v.resize(3, &"x".to_string())?;
        assert_eq!(v.len(), 3);
        v.resize_default(5)?;
        assert_eq!(v[4], "");
        v.resize(2, &String::new())?;
        assert_eq!(v.len(), 2);
        assert_eq!(v.capacity(), 8);
        assert_eq!(v.pop().as_deref(), Some("x"));
        v.clear();
        assert!(v.is_empty());
        assert_eq!(v.pop(), None);
        Ok(())
    }

    #[test]
    fn reserve_and_shrink() -> Result<(), VectorError> {
        let mut v = Vector::<u8>::new();
        v.reserve(9)?;
        assert_eq!(v.capacity(), 16);
        v.reserve_exact(20)?;
        assert_eq!(v.capacity(), 20);
        v.extend_from_slice(&[1, 2, 3])?;
        v.shrink_to(10)?;
        assert_eq!(v.capacity(), 10);
        v.shrink_to_fit()?;
        assert_eq!(v.capacity(), 3);
        assert_eq!(v, [1, 2, 3]);
        v.clear();
        v.shrink_to_fit()?;
        assert_eq!(v.capacity(), 0);
        assert_eq!(v.reserve(usize::MAX), Err(VectorError::CapacityOverflow));
        Ok(())
    }

    #[test]
    fn clone_failure_during_insert_leaves_vector_unchanged() {
        let mut v = fragile_vector(4);
        let before = Fragile::live();
        let template = Fragile::new(7);

        Fragile::arm(2);
        let result = catch_unwind(AssertUnwindSafe(|| v.insert_n(1, 5, &template)));
        Fragile::disarm();

        assert!(result.is_err());
        assert_eq!(values(&v), [0, 1, 2, 3]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(Fragile::live(), before + 1);
    }

    #[test]
    fn clone_failure_during_resize_leaves_vector_unchanged() {
        for (budget, initial) in [(0usize, 3u32), (1, 3), (2, 4)] {
            let mut v = fragile_vector(initial);
            let cap = v.capacity();
            let before = Fragile::live();
            let template = Fragile::new(9);

            Fragile::arm(budget);
            let result = catch_unwind(AssertUnwindSafe(|| v.resize(initial as usize + 4, &template)));
            Fragile::disarm();

            assert!(result.is_err());
            assert_eq!(v.len(), initial as usize);
            assert_eq!(v.capacity(), cap);
            assert_eq!(values(&v), (0..initial).collect::<std::vec::Vec<_>>());
            drop(template);
            assert_eq!(Fragile::live(), before);
        }
    }

    #[test]
    fn clone_failure_during_copy_construction_leaks_nothing() {
        let v = fragile_vector(6);
        let before = Fragile::live();

        Fragile::arm(3);
        let result = catch_unwind(AssertUnwindSafe(|| v.try_clone()));
        Fragile::disarm();

        assert!(result.is_err());
        assert_eq!(Fragile::live(), before);
        assert_eq!(values(&v), [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn failing_producer_is_reported_and_rolled_back() {
        let probe = Probe::new(1);
        let mut v = Vector::from_slice_in(&[1u32, 2, 3], probe.clone()).unwrap();
        let cap = v.capacity();

        let mut calls = 0;
        let result = v.try_resize_with(10, || {
            calls += 1;
            if calls == 4 {
                Err(VectorErrorOr::from("factory gave up"))
            } else {
                Ok(0)
            }
        });
        assert!(matches!(result, Err(VectorErrorOr::Producer("factory gave up"))));
        assert_eq!(calls, 4);
        assert_eq!(v, [1, 2, 3]);
        assert_eq!(v.capacity(), cap);

        drop(v);
        assert_eq!(probe.ledger.live_buffers.get(), 0);
    }

    /// Error type for producers that can also see engine failures.
    #[derive(Debug)]
    enum VectorErrorOr {
        Engine(VectorError),
        Producer(&'static str),
    }

    impl From<VectorError> for VectorErrorOr {
        fn from(err: VectorError) -> Self {
            VectorErrorOr::Engine(err)
        }
    }

    impl From<&'static str> for VectorErrorOr {
        fn from(msg: &'static str) -> Self {
            VectorErrorOr::Producer(msg)
        }
    }

    #[test]
    fn fallible_builders_report_producer_errors() {
        let probe = Probe::new(1);
        let built = Vector::try_from_fn_in(4, probe.clone(), |i| {
            u8::try_from(i * 100).map_err(|_| VectorErrorOr::from("too big"))
        });
        assert!(matches!(built, Err(VectorErrorOr::Producer("too big"))));
        assert_eq!(probe.ledger.live_buffers.get(), 0);

        let mut v = Vector::try_from_fn_in(3, probe.clone(), |i| Ok::<u32, VectorErrorOr>(i as u32))
            .unwrap();
        let err = v
            .try_insert_with(1, 3, |i| {
                if i == 2 {
                    Err(VectorErrorOr::from("third"))
                } else {
                    Ok(9)
                }
            })
            .unwrap_err();
        assert!(matches!(err, VectorErrorOr::Producer("third")));
        assert_eq!(v, [0, 1, 2]);
        assert_eq!(v.try_insert_with(3, 2, |i| Ok::<u32, VectorErrorOr>(i as u32 + 3)).unwrap(), 3);
        assert_eq!(v, [0, 1, 2, 3, 4]);

        let copy = v.try_clone_with(|x| {
            if *x < 4 {
                Ok(*x * 2)
            } else {
                Err(VectorErrorOr::from("no copy"))
            }
        });
        assert!(matches!(copy, Err(VectorErrorOr::Producer("no copy"))));
        let doubled = v.try_clone_with(|x| Ok::<u32, VectorErrorOr>(*x * 2)).unwrap();
        assert_eq!(doubled, [0, 2, 4, 6, 8]);

        drop((v, doubled));
        assert_eq!(probe.ledger.live_buffers.get(), 0);
    }

    #[test]
    fn producer_error_passes_through_untouched() {
        let mut v = vector![1u32];
        let err = v
            .try_emplace(0, || Err::<u32, VectorErrorOr>("nope".into()))
            .unwrap_err();
        assert!(matches!(err, VectorErrorOr::Producer("nope")));
        assert_eq!(v, [1]);

        let err = v
            .try_emplace(5, || Ok::<u32, VectorErrorOr>(2))
            .unwrap_err();
        assert!(matches!(
            err,
            VectorErrorOr::Engine(VectorError::OutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn allocation_failure_leaves_vector_unchanged() {
        let probe = Probe::new(1);
        let mut v = Vector::new_in(probe.clone());
        for i in 0..4 {
            v.push(i).unwrap();
        }
        let ptr = v.as_ptr();

        probe.fail_after(0);
        assert!(matches!(
            v.reserve(1),
            Err(VectorError::AllocFailed { count: 8, .. })
        ));
        assert!(v.push(4).is_err());
        assert!(v.insert(0, 9).is_err());
        assert!(v.erase(0).is_err());
        assert_eq!(v, [0, 1, 2, 3]);
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.as_ptr(), ptr);
    }

    #[test]
    fn cleanup_failures_are_swallowed() {
        let probe = Probe::new(1);
        probe.ledger.fail_cleanup.set(true);
        let mut v = Vector::new_in(probe.clone());
        for i in 0..20 {
            v.push(i).unwrap();
        }
        v.erase_range(..5).unwrap();
        v.shrink_to_fit().unwrap();
        assert_eq!(v.len(), 15);
        drop(v);
        assert_eq!(probe.ledger.live_buffers.get(), 0);
    }

    #[test]
    fn every_construction_goes_through_the_allocator() {
        let probe = Probe::new(1);
        let mut v = Vector::from_elem_in(3, &1u8, probe.clone()).unwrap();
        v.insert(1, 2).unwrap();
        v.push(3).unwrap();
        assert_eq!(probe.ledger.constructed.get(), 5);
    }

    #[test]
    fn copies_are_independent() -> Result<(), VectorError> {
        let original = vector!["a".to_string(), "b".to_string()];
        let mut copy = original.try_clone()?;
        assert_eq!(copy, original);

        copy[0].push('!');
        copy.push("c".to_string())?;
        assert_eq!(original, ["a", "b"]);
        assert_eq!(copy, ["a!", "b", "c"]);

        let cloned = copy.clone();
        assert_eq!(cloned, copy);
        Ok(())
    }

    #[test]
    fn moved_from_vector_is_empty_and_reusable() -> Result<(), VectorError> {
        let mut a = vector![1, 2, 3];
        let b = a.take();
        assert_eq!(b, [1, 2, 3]);
        assert_eq!((a.len(), a.capacity()), (0, 0));
        a.push(7)?;
        assert_eq!(a, [7]);

        let mut c = vector![9];
        c.assign_move(&mut a)?;
        assert_eq!(c, [7]);
        assert!(a.is_empty());
        assert_eq!(a.capacity(), 0);
        Ok(())
    }

    #[test]
    fn move_in_adopts_or_relocates() -> Result<(), VectorError> {
        let home = Probe::new(1);
        let away = Probe::new(2);

        let mut source = Vector::from_slice_in(&[1, 2, 3], home.clone())?;
        let ptr = source.as_ptr();
        let adopted = Vector::move_in(&mut source, home.clone())?;
        assert_eq!(adopted.as_ptr(), ptr);
        assert!(source.is_empty());

        let mut source = adopted;
        let relocated = Vector::move_in(&mut source, away.clone())?;
        assert_ne!(relocated.as_ptr(), ptr);
        assert_eq!(relocated, [1, 2, 3]);
        assert_eq!(source.capacity(), 0);
        assert_eq!(away.ledger.live_buffers.get(), 1);
        assert_eq!(home.ledger.live_buffers.get(), 0);

        let mut source = relocated;
        away.fail_after(0);
        assert!(Vector::move_in(&mut source, home.clone()).is_ok());
        assert!(Vector::move_in(&mut Vector::from_slice_in(&[1], home.clone())?, away).is_err());
        Ok(())
    }

    #[test]
    fn assignment_honours_propagation() -> Result<(), VectorError> {
        let left = Probe::new(1);
        let right = Probe::new(2);

        let mut dst = Vector::from_slice_in(&[0u32], left.clone())?;
        let src = Vector::from_slice_in(&[1u32, 2], right.clone())?;
        dst.assign_clone(&src)?;
        assert_eq!(dst, [1, 2]);
        assert_eq!(dst.allocator().id, 1);

        dst.set_propagation(Propagation::ALL);
        dst.assign_clone(&src)?;
        assert_eq!(dst.allocator().id, 2);
        assert_eq!(dst.propagation(), Propagation::ALL);

        let mut dst = Vector::new_in(left.clone());
        let mut src = Vector::from_slice_in(&[5u32, 6], right.clone())?;
        dst.assign_move(&mut src)?;
        assert_eq!(dst, [5, 6]);
        assert_eq!(dst.allocator().id, 1);
        assert!(src.is_empty());
        Ok(())
    }

    #[test]
    fn swap_exchanges_buffers() -> Result<(), VectorError> {
        let mut a = vector![1, 2, 3];
        let mut b = vector![4];
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        a.swap_with(&mut b);
        assert_eq!((a.as_ptr(), b.as_ptr()), (pb, pa));
        assert_eq!(a, [4]);
        assert_eq!(b, [1, 2, 3]);

        let probe = Probe::new(3);
        let mut c = Vector::with_propagation(probe.clone(), Propagation::NONE);
        let mut d = Vector::new_in(probe);
        c.push(1)?;
        c.swap_with(&mut d);
        assert!(c.is_empty());
        assert_eq!(d, [1]);
        Ok(())
    }

    #[test]
    fn erase_if_and_erase_value() -> Result<(), VectorError> {
        let mut v: Vector<u32> = (0..10).collect();
        assert_eq!(v.erase_if(|x| x % 3 == 0)?, 4);
        assert_eq!(v, [1, 2, 4, 5, 7, 8]);
        assert_eq!(v.erase_value(&5)?, 1);
        assert_eq!(v.erase_value(&42)?, 0);
        assert_eq!(v, [1, 2, 4, 7, 8]);
        Ok(())
    }

    #[test]
    fn panicking_predicate_keeps_contents() {
        let mut v = fragile_vector(5);
        let before = Fragile::live();
        let result = catch_unwind(AssertUnwindSafe(|| {
            v.erase_if(|f| if f.0 == 3 { panic!("bad predicate") } else { f.0 == 1 })
        }));
        assert!(result.is_err());
        assert_eq!(values(&v), [0, 1, 2, 3, 4]);
        assert_eq!(Fragile::live(), before);
    }

    #[test]
    fn assign_family_replaces_contents() -> Result<(), VectorError> {
        let mut v = vector![1, 2, 3];
        v.assign_fill(2, &7)?;
        assert_eq!(v, [7, 7]);
        v.assign_slice(&[4, 5, 6, 7, 8])?;
        assert_eq!(v, [4, 5, 6, 7, 8]);
        v.assign_iter(0..3)?;
        assert_eq!(v, [0, 1, 2]);
        Ok(())
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = vector![1, 2, 3];
        let b = vector![1, 2];
        let c = vector![1, 3];
        assert!(b < a);
        assert!(a < c);
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
        assert_ne!(a, b);
    }

    #[test]
    fn into_iter_drops_what_it_does_not_yield() {
        let v = fragile_vector(5);
        let before = Fragile::live();
        let mut it = v.into_iter();
        assert_eq!(it.next().map(|f| f.0), Some(0));
        assert_eq!(it.next_back().map(|f| f.0), Some(4));
        assert_eq!(it.len(), 3);
        drop(it);
        assert_eq!(Fragile::live(), before - 5);
    }

    #[test]
    fn pod_elements_as_bytes() -> Result<(), VectorError> {
        let mut v = Vector::new();
        v.push(Packet { id: 1, value: 10.0 })?;
        v.push(Packet { id: 2, value: 20.0 })?;
        let bytes = v.as_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &1u32.to_ne_bytes());
        assert_eq!(&bytes[8..12], &2u32.to_ne_bytes());
        Ok(())
    }

    #[test]
    fn zero_sized_elements() -> Result<(), VectorError> {
        let mut v = Vector::new();
        for _ in 0..10 {
            v.push(())?;
        }
        v.insert(3, ())?;
        assert_eq!(v.len(), 11);
        assert_eq!(v.erase_value(&())?, 11);
        Ok(())
    }
}
