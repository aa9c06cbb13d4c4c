//! Addressable single bits.
//!
//! A bit has no address of its own, so [`BitRef`] stands in for `&mut bool`
//! as a `(byte pointer, bit offset)` pair, and [`BitCursor`] stands in for a
//! pointer that can be moved by any signed number of bits.
//!
//! Both borrow the owning [`BoolVector`](crate::BoolVector) mutably for
//! `'a`, so nothing can reallocate the buffer while one is alive. They write
//! through raw pointers and never form `&mut u8`, which lets several of them
//! address the same byte.

use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Sub, SubAssign};
use core::ptr::NonNull;

use crate::bit_ops::{self, mask};

/// Proxy for one bit inside a byte.
///
/// # Examples
///
/// ```
/// use packed_bools::bits;
///
/// let mut v = bits![false, false, false];
/// let mut b = v.bit_mut(1).unwrap();
/// b.set(true);
/// assert!(b.get());
/// assert!(b.replace(false));
/// b.flip();
/// assert_eq!(v.as_raw_bytes(), &[0b0000_0010]);
/// ```
pub struct BitRef<'a> {
    byte: NonNull<u8>,
    bit: u8,
    _marker: PhantomData<&'a mut u8>,
}

impl<'a> BitRef<'a> {
    /// # Safety
    ///
    /// `byte` must be valid for reads and writes for `'a` and `bit < 8`.
    pub(crate) unsafe fn new(byte: NonNull<u8>, bit: u8) -> Self {
        debug_assert!(bit < 8);
        Self {
            byte,
            bit,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        unsafe { self.byte.as_ptr().read() & mask(self.bit) != 0 }
    }

    /// Read-modify-write of the addressed bit only.
    #[inline]
    pub fn set(&mut self, value: bool) {
        let p = self.byte.as_ptr();
        unsafe {
            let old = p.read();
            p.write(if value {
                old | mask(self.bit)
            } else {
                old & !mask(self.bit)
            });
        }
    }

    #[inline]
    pub fn flip(&mut self) {
        let p = self.byte.as_ptr();
        unsafe { p.write(p.read() ^ mask(self.bit)) };
    }

    /// Stores `value` and returns the previous bit.
    pub fn replace(&mut self, value: bool) -> bool {
        let old = self.get();
        self.set(value);
        old
    }

    /// The proxy `delta` bits away.
    ///
    /// # Safety
    ///
    /// The target bit must lie inside the same buffer.
    pub unsafe fn offset(self, delta: isize) -> Self {
        let (bytes, bit) = bit_ops::step(self.bit, delta);
        unsafe { Self::new(self.byte.offset(bytes), bit) }
    }

    #[inline]
    pub fn byte_ptr(&self) -> *mut u8 {
        self.byte.as_ptr()
    }

    #[inline]
    pub fn bit(&self) -> u8 {
        self.bit
    }
}

impl fmt::Debug for BitRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitRef")
            .field("byte", &self.byte)
            .field("bit", &self.bit)
            .field("value", &self.get())
            .finish()
    }
}

impl From<BitRef<'_>> for bool {
    fn from(r: BitRef<'_>) -> bool {
        r.get()
    }
}

/// Random-access position over the bits of a buffer.
///
/// A cursor is a logical bit index relative to the buffer start; the byte
/// and bit it designates are derived with [`bit_ops::step`] on access.
/// Cursors may move anywhere, but [`read`](BitCursor::read),
/// [`write`](BitCursor::write) and [`bit_ref`](BitCursor::bit_ref) panic
/// unless they sit on one of the container's bits.
///
/// # Examples
///
/// ```
/// use packed_bools::bits;
///
/// let mut v = bits![true, false, true, true, false, false, false, true, false, true];
/// let first = v.begin();
/// let mut c = first;
/// for _ in 0..9 {
///     c.inc();
/// }
/// assert_eq!(c, first + 9);
/// assert_eq!((first + 9) - first, 9);
/// assert_eq!(c.bit(), 1);
/// assert!(c.read());
/// assert!(first.at(7));
/// ```
#[derive(Clone, Copy)]
pub struct BitCursor<'a> {
    base: NonNull<u8>,
    index: isize,
    len: usize,
    _marker: PhantomData<&'a mut u8>,
}

impl<'a> BitCursor<'a> {
    /// # Safety
    ///
    /// `base` must address at least `bytes_for(len)` bytes valid for reads
    /// and writes for `'a`.
    pub(crate) unsafe fn new(base: NonNull<u8>, index: isize, len: usize) -> Self {
        Self {
            base,
            index,
            len,
            _marker: PhantomData,
        }
    }

    /// Logical bit index from the start of the container.
    #[inline]
    pub fn index(&self) -> isize {
        self.index
    }

    #[inline]
    pub fn byte_ptr(&self) -> *mut u8 {
        let (bytes, _) = bit_ops::step(0, self.index);
        self.base.as_ptr().wrapping_offset(bytes)
    }

    #[inline]
    pub fn bit(&self) -> u8 {
        bit_ops::step(0, self.index).1
    }

    /// Whether the cursor designates a live bit.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.index >= 0 && (self.index as usize) < self.len
    }

    /// Proxy for the designated bit.
    ///
    /// # Panics
    ///
    /// If the cursor is outside the container.
    pub fn bit_ref(&self) -> BitRef<'a> {
        assert!(
            self.is_valid(),
            "cursor at bit {} is outside length {}",
            self.index,
            self.len
        );
        let (bytes, bit) = bit_ops::step(0, self.index);
        unsafe { BitRef::new(self.base.offset(bytes), bit) }
    }

    pub fn read(&self) -> bool {
        self.bit_ref().get()
    }

    pub fn write(&self, value: bool) {
        self.bit_ref().set(value);
    }

    /// Reads the bit `n` positions away.
    pub fn at(&self, n: isize) -> bool {
        (*self + n).read()
    }

    pub fn inc(&mut self) -> &mut Self {
        self.index += 1;
        self
    }

    pub fn dec(&mut self) -> &mut Self {
        self.index -= 1;
        self
    }

    fn key(&self) -> (usize, u8) {
        (self.byte_ptr() as usize, self.bit())
    }
}

impl Add<isize> for BitCursor<'_> {
    type Output = Self;

    fn add(mut self, n: isize) -> Self {
        self += n;
        self
    }
}

impl Sub<isize> for BitCursor<'_> {
    type Output = Self;

    fn sub(mut self, n: isize) -> Self {
        self -= n;
        self
    }
}

impl AddAssign<isize> for BitCursor<'_> {
    fn add_assign(&mut self, n: isize) {
        self.index += n;
    }
}

impl SubAssign<isize> for BitCursor<'_> {
    fn sub_assign(&mut self, n: isize) {
        self.index -= n;
    }
}

/// Signed distance in bits.
impl<'a> Sub<BitCursor<'a>> for BitCursor<'a> {
    type Output = isize;

    fn sub(self, other: BitCursor<'a>) -> isize {
        let (a_byte, a_bit) = self.key();
        let (b_byte, b_bit) = other.key();
        let bytes = a_byte.wrapping_sub(b_byte) as isize;
        bytes * bit_ops::BITS_PER_BYTE as isize + a_bit as isize - b_bit as isize
    }
}

impl PartialEq for BitCursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for BitCursor<'_> {}

impl PartialOrd for BitCursor<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BitCursor<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Debug for BitCursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitCursor")
            .field("byte", &self.byte_ptr())
            .field("bit", &self.bit())
            .finish()
    }
}
