//! Growable vector of `bool` stored one bit per element.
//!
//! # Examples
//!
//! ```rust
//! use packed_bools::BoolVector;
//!
//! let mut v = BoolVector::new();
//! for i in 0..17 {
//!     v.push(i % 3 == 0).unwrap();
//! }
//!
//! assert_eq!(v.len(), 17);
//! assert_eq!(v.byte_capacity(), 4);
//! assert_eq!(v.capacity(), 32);
//! assert_eq!(v.count_ones(), 6);
//! assert_eq!(v.get(3), Some(true));
//! ```
//!
//! ## Raw bytes
//!
//! Bit `i` is bit `i % 8` of byte `i / 8`, least significant first. Bits
//! past `len()` in the last byte are always zero.
//!
//! ```rust
//! use packed_bools::bits;
//!
//! let v = bits![true, false, true, true, false, false, false, true, false, true];
//! assert_eq!(v.as_raw_bytes(), &[0b1000_1101, 0b0000_0010]);
//! ```

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use core::ops::{Bound, Index, RangeBounds};
use core::ptr::NonNull;

use raw_vector::storage::grown_capacity;
use raw_vector::{Global, Propagation, SlotAllocator, Vector, VectorError};

use crate::BitVectorError;
use crate::bit_ops::{self, BITS_PER_BYTE, bytes_for};
use crate::bit_ref::{BitCursor, BitRef};
use crate::iter::Bits;

type Result<T> = core::result::Result<T, BitVectorError>;

/// Bit-packed storage engine.
///
/// The bits live in a byte [`Vector`] from the same allocator contract, so
/// byte capacity follows the same `4, 8, 16, …` sequence and every
/// capacity-changing call keeps the strong guarantee: on error the vector is
/// unchanged. Positional inserts and erases assemble the result in a fresh
/// byte buffer and swap it in only once it is complete.
pub struct BoolVector<A: SlotAllocator = Global> {
    bytes: Vector<u8, A>,
    len: usize,
}

impl BoolVector<Global> {
    pub fn new() -> Self {
        Self::new_in(Global)
    }

    /// `n` copies of `bit`.
    pub fn from_elem(n: usize, bit: bool) -> Result<Self> {
        Self::from_elem_in(n, bit, Global)
    }

    /// `n` cleared bits.
    pub fn with_len(n: usize) -> Result<Self> {
        Self::from_elem_in(n, false, Global)
    }

    pub fn from_bools(bools: &[bool]) -> Result<Self> {
        Self::from_iter_in(bools.iter().copied(), Global)
    }
}

impl<A: SlotAllocator> BoolVector<A> {
    pub fn new_in(alloc: A) -> Self {
        Self {
            bytes: Vector::new_in(alloc),
            len: 0,
        }
    }

    pub fn with_propagation(alloc: A, policy: Propagation) -> Self {
        Self {
            bytes: Vector::with_propagation(alloc, policy),
            len: 0,
        }
    }

    pub fn from_elem_in(n: usize, bit: bool, alloc: A) -> Result<Self> {
        let mut out = Self::new_in(alloc);
        out.resize(n, bit)?;
        Ok(out)
    }

    pub fn from_iter_in<I>(iter: I, alloc: A) -> Result<Self>
    where
        I: IntoIterator<Item = bool>,
    {
        let iter = iter.into_iter();
        let mut out = Self::new_in(alloc);
        let (lower, upper) = iter.size_hint();
        if upper == Some(lower) {
            out.reserve(lower)?;
        }
        for bit in iter {
            out.push(bit)?;
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

    /// Capacity in bits.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity() * BITS_PER_BYTE
    }

    #[inline]
    pub fn byte_capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn allocator(&self) -> &A {
        self.bytes.allocator()
    }

    pub fn propagation(&self) -> Propagation {
        self.bytes.propagation()
    }

    /// The packed bytes, `bytes_for(len())` of them.
    pub fn as_raw_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| bit_ops::get_bit(&self.bytes, index))
    }

    /// Checked read.
    ///
    /// # Errors
    ///
    /// `BitOutOfRange` if `index >= len()`.
    pub fn at(&self, index: usize) -> Result<bool> {
        self.get(index).ok_or(BitVectorError::BitOutOfRange {
            index,
            len: self.len,
        })
    }

    pub fn set(&mut self, index: usize, bit: bool) -> Result<()> {
        self.check_index(index)?;
        bit_ops::set_bit(&mut self.bytes, index, bit);
        Ok(())
    }

    /// Inverts the bit at `index` and returns its new value.
    pub fn flip(&mut self, index: usize) -> Result<bool> {
        let mut r = self.at_mut(index)?;
        r.flip();
        Ok(r.get())
    }

    /// Proxy for the bit at `index`, or `None` past the end.
    pub fn bit_mut(&mut self, index: usize) -> Option<BitRef<'_>> {
        if index >= self.len {
            return None;
        }
        // derived from the whole buffer so `BitRef::offset` may leave this byte
        let base = NonNull::from(self.bytes.as_mut_slice()).cast::<u8>();
        let byte = unsafe { base.add(index / BITS_PER_BYTE) };
        Some(unsafe { BitRef::new(byte, (index % BITS_PER_BYTE) as u8) })
    }

    pub fn at_mut(&mut self, index: usize) -> Result<BitRef<'_>> {
        let len = self.len;
        self.bit_mut(index)
            .ok_or(BitVectorError::BitOutOfRange { index, len })
    }

    pub fn front(&self) -> Option<bool> {
        self.get(0)
    }

    pub fn back(&self) -> Option<bool> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> Bits<'_> {
        Bits::new(&self.bytes, self.len)
    }

    /// Cursor on the first bit.
    pub fn begin(&mut self) -> BitCursor<'_> {
        let len = self.len;
        let base = NonNull::from(self.bytes.as_mut_slice()).cast::<u8>();
        unsafe { BitCursor::new(base, 0, len) }
    }

    /// Cursor one past the last bit.
    pub fn end(&mut self) -> BitCursor<'_> {
        let len = self.len as isize;
        self.begin() + len
    }

    /// `(begin, end)` for the same borrow.
    pub fn span(&mut self) -> (BitCursor<'_>, BitCursor<'_>) {
        let len = self.len as isize;
        let first = self.begin();
        (first, first + len)
    }

    /// Appends `bit`, growing the byte buffer when the last byte is full.
    pub fn push(&mut self, bit: bool) -> Result<()> {
        if self.len % BITS_PER_BYTE == 0 {
            self.bytes.push(0)?;
        }
        bit_ops::set_bit(&mut self.bytes, self.len, bit);
        self.len += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Option<bool> {
        let last = self.back()?;
        self.truncate(self.len - 1);
        Some(last)
    }

    /// Destroys every bit past `len`. Byte capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let end = bytes_for(len) * BITS_PER_BYTE;
        bit_ops::fill_bits(&mut self.bytes, len, end.min(self.len), false);
        self.bytes.truncate(bytes_for(len));
        self.len = len;
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Resizes to `new_len`, filling new positions with `bit`.
    pub fn resize(&mut self, new_len: usize, bit: bool) -> Result<()> {
        if new_len <= self.len {
            self.truncate(new_len);
            return Ok(());
        }
        self.bytes.resize(bytes_for(new_len), &0)?;
        bit_ops::fill_bits(&mut self.bytes, self.len, new_len, bit);
        self.len = new_len;
        Ok(())
    }

    /// Room for at least `additional` more bits.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let extra = self.extra_bytes(additional)?;
        self.bytes.reserve(extra)?;
        Ok(())
    }

    pub fn reserve_exact(&mut self, additional: usize) -> Result<()> {
        let extra = self.extra_bytes(additional)?;
        self.bytes.reserve_exact(extra)?;
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> Result<()> {
        self.bytes.shrink_to_fit()?;
        Ok(())
    }

    /// Inserts `bit` before `pos` and returns `pos`.
    ///
    /// # Examples
    ///
    /// ```
    /// use packed_bools::bits;
    ///
    /// let mut v = bits![true, true];
    /// v.insert(1, false).unwrap();
    /// assert_eq!(v, bits![true, false, true]);
    /// assert!(v.insert(4, true).is_err());
    /// ```
    pub fn insert(&mut self, pos: usize, bit: bool) -> Result<usize> {
        self.insert_n(pos, 1, bit)
    }

    /// Inserts `count` copies of `bit` before `pos`.
    pub fn insert_n(&mut self, pos: usize, count: usize, bit: bool) -> Result<usize> {
        if pos > self.len {
            return Err(BitVectorError::BitOutOfRange {
                index: pos,
                len: self.len,
            });
        }
        if count == 0 {
            return Ok(pos);
        }
        let new_len = self
            .len
            .checked_add(count)
            .ok_or(VectorError::CapacityOverflow)?;
        let tail = self.len - pos;
        self.rebuild(new_len, |old, fresh| {
            bit_ops::copy_bits(old, 0, fresh, 0, pos);
            bit_ops::fill_bits(fresh, pos, pos + count, bit);
            bit_ops::copy_bits(old, pos, fresh, pos + count, tail);
        })?;
        Ok(pos)
    }

    /// Removes and returns the bit at `pos`.
    pub fn erase(&mut self, pos: usize) -> Result<bool> {
        let bit = self.at(pos)?;
        self.erase_range(pos..pos + 1)?;
        Ok(bit)
    }

    /// Removes the bits in `range` and returns the index now holding the
    /// first bit after it.
    pub fn erase_range<R>(&mut self, range: R) -> Result<usize>
    where
        R: RangeBounds<usize>,
    {
        let (start, end) = self.resolve(range)?;
        if start == end {
            return Ok(start);
        }
        let tail = self.len - end;
        self.rebuild(start + tail, |old, fresh| {
            bit_ops::copy_bits(old, 0, fresh, 0, start);
            bit_ops::copy_bits(old, end, fresh, start, tail);
        })?;
        Ok(start)
    }

    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            bytes: self.bytes.try_clone()?,
            len: self.len,
        })
    }

    /// Moves the contents out, leaving `self` empty with no buffer.
    pub fn take(&mut self) -> Self {
        Self {
            bytes: self.bytes.take(),
            len: mem::take(&mut self.len),
        }
    }

    /// Moves `source` into storage from `alloc`; `source` is left empty.
    pub fn move_in(source: &mut Self, alloc: A) -> Result<Self> {
        let bytes = Vector::move_in(&mut source.bytes, alloc)?;
        Ok(Self {
            bytes,
            len: mem::take(&mut source.len),
        })
    }

    pub fn assign_clone(&mut self, source: &Self) -> Result<()> {
        self.bytes.assign_clone(&source.bytes)?;
        self.len = source.len;
        Ok(())
    }

    pub fn assign_move(&mut self, source: &mut Self) -> Result<()> {
        self.bytes.assign_move(&mut source.bytes)?;
        self.len = mem::take(&mut source.len);
        Ok(())
    }

    pub fn swap_with(&mut self, other: &mut Self) {
        self.bytes.swap_with(&mut other.bytes);
        mem::swap(&mut self.len, &mut other.len);
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len {
            return Err(BitVectorError::BitOutOfRange {
                index,
                len: self.len,
            });
        }
        Ok(())
    }

    fn extra_bytes(&self, additional: usize) -> Result<usize> {
        let bits = self
            .len
            .checked_add(additional)
            .ok_or(VectorError::CapacityOverflow)?;
        Ok(bytes_for(bits) - self.bytes.len())
    }

    fn resolve<R: RangeBounds<usize>>(&self, range: R) -> Result<(usize, usize)> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.len,
        };
        if start > end || end > self.len {
            return Err(VectorError::InvalidRange {
                start,
                end,
                len: self.len,
            }
            .into());
        }
        Ok((start, end))
    }

    /// Assembles `new_len` bits in a fresh zeroed byte buffer and swaps it in.
    ///
    /// The buffer keeps the current byte capacity when that suffices and
    /// takes the next growth step otherwise. The old buffer is released only
    /// after the new one is complete.
    fn rebuild<F>(&mut self, new_len: usize, fill: F) -> Result<()>
    where
        F: FnOnce(&[u8], &mut [u8]),
    {
        let needed = bytes_for(new_len);
        let cap = grown_capacity(self.bytes.capacity(), needed)?;
        let mut fresh =
            Vector::with_propagation(self.bytes.allocator().clone(), self.bytes.propagation());
        // drop the nominal capacity so the buffer gets exactly `cap` bytes
        fresh.shrink_to_fit()?;
        fresh.reserve_exact(cap)?;
        fresh.resize(needed, &0)?;
        fill(self.bytes.as_slice(), fresh.as_mut_slice());
        self.bytes = fresh;
        self.len = new_len;
        Ok(())
    }
}

impl<A: SlotAllocator + Default> Default for BoolVector<A> {
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

static TRUE: bool = true;
static FALSE: bool = false;

impl<A: SlotAllocator> Index<usize> for BoolVector<A> {
    type Output = bool;

    fn index(&self, index: usize) -> &bool {
        if self.at(index).expect("index out of bounds") {
            &TRUE
        } else {
            &FALSE
        }
    }
}

impl<A: SlotAllocator> Clone for BoolVector<A> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(err) => panic!("bit vector clone failed: {}", err),
        }
    }
}

impl<A: SlotAllocator> fmt::Debug for BoolVector<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<A: SlotAllocator, B: SlotAllocator> PartialEq<BoolVector<B>> for BoolVector<A> {
    fn eq(&self, other: &BoolVector<B>) -> bool {
        self.len == other.len && self.as_raw_bytes() == other.as_raw_bytes()
    }
}

impl<A: SlotAllocator> PartialEq<[bool]> for BoolVector<A> {
    fn eq(&self, other: &[bool]) -> bool {
        self.iter().eq(other.iter().copied())
    }
}

impl<A: SlotAllocator, const N: usize> PartialEq<[bool; N]> for BoolVector<A> {
    fn eq(&self, other: &[bool; N]) -> bool {
        self.iter().eq(other.iter().copied())
    }
}

impl<A: SlotAllocator> Eq for BoolVector<A> {}

impl<A: SlotAllocator> PartialOrd for BoolVector<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Lexicographic by bit, `false < true`, then by length.
impl<A: SlotAllocator> Ord for BoolVector<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<A: SlotAllocator> Hash for BoolVector<A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.as_raw_bytes().hash(state);
    }
}

impl FromIterator<bool> for BoolVector<Global> {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        match Self::from_iter_in(iter, Global) {
            Ok(v) => v,
            Err(err) => panic!("bit vector collect failed: {}", err),
        }
    }
}

impl<A: SlotAllocator> Extend<bool> for BoolVector<A> {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for bit in iter {
            if let Err(err) = self.push(bit) {
                panic!("bit vector extend failed: {}", err);
            }
        }
    }
}

impl<'a, A: SlotAllocator> IntoIterator for &'a BoolVector<A> {
    type Item = bool;
    type IntoIter = Bits<'a>;

    fn into_iter(self) -> Bits<'a> {
        self.iter()
    }
}
