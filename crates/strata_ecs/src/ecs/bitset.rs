//! # Signature Bitsets
//!
//! Fixed-width bit vectors used as entity and query signatures.
//!
//! One bit per declared component kind, followed by one bit per declared tag
//! kind. The width is fixed when the schema is resolved; the storage is an
//! inline array of `u64` words, so signatures are `Copy` and never allocate.
//!
//! ```text
//! bit:   0  1  2  3  4 | 5  6  7
//! kind: C0 C1 C2 C3 C4 |T0 T1 T2
//! S2 = {C0, C4, T0}  -> 1 0 0 0 1 1 0 0
//! ```

use std::fmt;

/// Number of `u64` words needed to hold `bits` bits.
#[inline]
#[must_use]
pub const fn words_for(bits: usize) -> usize {
    bits.div_ceil(64)
}

/// Operations the manager needs from a signature bit vector.
///
/// Implemented by [`Bitset`]; a schema picks the width through
/// `Schema::Bits`.
pub trait Bits: Copy + Default + Eq + fmt::Debug + Send + Sync + 'static {
    /// Sets a bit.
    fn set(&mut self, bit: usize);

    /// Clears a bit.
    fn clear(&mut self, bit: usize);

    /// Reads a bit.
    fn read(&self, bit: usize) -> bool;

    /// Clears every bit.
    fn reset(&mut self);

    /// Returns `true` if every bit set in `required` is also set in `self`,
    /// i.e. `(required & self) == required`.
    fn contains(&self, required: &Self) -> bool;

    /// Number of set bits.
    fn count_ones(&self) -> u32;

    /// Renders the first `width` bits, bit 0 first.
    fn to_bit_string(&self, width: usize) -> String {
        (0..width)
            .map(|bit| if self.read(bit) { '1' } else { '0' })
            .collect()
    }
}

/// Inline bit vector of `W` 64-bit words.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bitset<const W: usize> {
    words: [u64; W],
}

impl<const W: usize> Bitset<W> {
    /// Total number of addressable bits.
    pub const CAPACITY: usize = W * 64;

    /// Creates an empty bitset.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { words: [0; W] }
    }

    /// Returns the raw words.
    #[inline]
    #[must_use]
    pub const fn words(&self) -> &[u64; W] {
        &self.words
    }

    /// Iterates over the indices of set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(word_idx, &word)| {
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = remaining.trailing_zeros() as usize;
                remaining &= remaining - 1;
                Some(word_idx * 64 + bit)
            })
        })
    }
}

impl<const W: usize> Default for Bitset<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const W: usize> Bits for Bitset<W> {
    #[inline]
    fn set(&mut self, bit: usize) {
        debug_assert!(bit < Self::CAPACITY, "bit {bit} out of range");
        self.words[bit / 64] |= 1u64 << (bit % 64);
    }

    #[inline]
    fn clear(&mut self, bit: usize) {
        debug_assert!(bit < Self::CAPACITY, "bit {bit} out of range");
        self.words[bit / 64] &= !(1u64 << (bit % 64));
    }

    #[inline]
    fn read(&self, bit: usize) -> bool {
        self.words
            .get(bit / 64)
            .is_some_and(|word| (word >> (bit % 64)) & 1 == 1)
    }

    #[inline]
    fn reset(&mut self) {
        self.words = [0; W];
    }

    #[inline]
    fn contains(&self, required: &Self) -> bool {
        self.words
            .iter()
            .zip(required.words.iter())
            .all(|(have, need)| have & need == *need)
    }

    #[inline]
    fn count_ones(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }
}

impl<const W: usize> fmt::Debug for Bitset<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter_ones()).finish()
    }
}
