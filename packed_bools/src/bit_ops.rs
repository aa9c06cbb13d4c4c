//! Bit addressing over byte slices. Bit `i` lives in byte `i / 8` at
//! position `i % 8`, least significant bit first.

/// Number of bits stored per byte of the backing buffer.
pub const BITS_PER_BYTE: usize = 8;

/// Bytes needed to hold `bits` bits.
#[inline]
pub const fn bytes_for(bits: usize) -> usize {
    bits.div_ceil(BITS_PER_BYTE)
}

#[inline]
pub const fn mask(bit: u8) -> u8 {
    1 << bit
}

/// Moves a `(byte, bit)` position by `delta` bits.
///
/// Returns the signed number of whole bytes to advance and the new bit
/// offset in `0..8`. Euclidean division keeps the carry exact in both
/// directions: stepping `-1` from bit 0 lands on bit 7 of the previous byte.
#[inline]
pub fn step(bit: u8, delta: isize) -> (isize, u8) {
    let total = bit as isize + delta;
    (
        total.div_euclid(BITS_PER_BYTE as isize),
        total.rem_euclid(BITS_PER_BYTE as isize) as u8,
    )
}

#[inline]
pub fn get_bit(slice: &[u8], pos: usize) -> bool {
    slice[pos / BITS_PER_BYTE] & mask((pos % BITS_PER_BYTE) as u8) != 0
}

#[inline]
pub fn set_bit(slice: &mut [u8], pos: usize, value: bool) {
    let byte = &mut slice[pos / BITS_PER_BYTE];
    let m = mask((pos % BITS_PER_BYTE) as u8);
    if value {
        *byte |= m;
    } else {
        *byte &= !m;
    }
}

/// Writes the low `bit_width` bits of `value` starting at `bit_offset`.
pub fn set_bits(slice: &mut [u8], bit_offset: usize, bit_width: usize, value: u64) {
    debug_assert!(bit_width <= 64);
    for i in 0..bit_width {
        set_bit(slice, bit_offset + i, (value >> i) & 1 == 1);
    }
}

/// Reads `bit_width` bits starting at `bit_offset`, first bit lowest.
pub fn get_bits(slice: &[u8], bit_offset: usize, bit_width: usize) -> u64 {
    debug_assert!(bit_width <= 64);
    let mut value = 0u64;
    for i in 0..bit_width {
        value |= (get_bit(slice, bit_offset + i) as u64) << i;
    }
    value
}

/// Copies `count` bits from `src[src_pos..]` to `dst[dst_pos..]`.
pub fn copy_bits(src: &[u8], src_pos: usize, dst: &mut [u8], dst_pos: usize, count: usize) {
    let mut done = 0;
    while done < count {
        let width = (count - done).min(64);
        let chunk = get_bits(src, src_pos + done, width);
        set_bits(dst, dst_pos + done, width, chunk);
        done += width;
    }
}

/// Sets or clears every bit in `start..end`.
pub fn fill_bits(slice: &mut [u8], start: usize, end: usize, value: bool) {
    for pos in start..end {
        set_bit(slice, pos, value);
    }
}
