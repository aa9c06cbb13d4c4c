use core::iter::FusedIterator;

use crate::bit_ops;

/// Iterator over the bits of a [`BoolVector`](crate::BoolVector).
#[derive(Clone, Debug)]
pub struct Bits<'a> {
    bytes: &'a [u8],
    head: usize,
    tail: usize,
}

impl<'a> Bits<'a> {
    pub(crate) fn new(bytes: &'a [u8], len: usize) -> Self {
        Self {
            bytes,
            head: 0,
            tail: len,
        }
    }
}

impl Iterator for Bits<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.head == self.tail {
            return None;
        }
        let bit = bit_ops::get_bit(self.bytes, self.head);
        self.head += 1;
        Some(bit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.tail - self.head;
        (n, Some(n))
    }

    fn nth(&mut self, n: usize) -> Option<bool> {
        self.head = self.head.saturating_add(n).min(self.tail);
        self.next()
    }
}

impl DoubleEndedIterator for Bits<'_> {
    fn next_back(&mut self) -> Option<bool> {
        if self.head == self.tail {
            return None;
        }
        self.tail -= 1;
        Some(bit_ops::get_bit(self.bytes, self.tail))
    }
}

impl ExactSizeIterator for Bits<'_> {}

impl FusedIterator for Bits<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_both_ends() {
        let bytes = [0b0000_0101u8, 0b1];
        let mut it = Bits::new(&bytes, 9);
        assert_eq!(it.len(), 9);
        assert_eq!(it.next(), Some(true));
        assert_eq!(it.next_back(), Some(true));
        assert_eq!(it.next(), Some(false));
        assert_eq!(it.nth(0), Some(true));
        assert_eq!(it.nth(10), None);
        assert_eq!(it.next_back(), None);
    }

    #[test]
    fn reversed() {
        let bytes = [0b0000_0110u8];
        let bits: std::vec::Vec<bool> = Bits::new(&bytes, 3).rev().collect();
        assert_eq!(bits, [true, true, false]);
    }
}
