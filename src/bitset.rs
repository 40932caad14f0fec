//! Fixed-capacity set of `usize` indices with fast `next_set_bit`
//! iteration (spec.md §4.5). Used for the "updated stops" and "updated
//! routes" (journey patterns) sets carried between rounds.
//!
//! Implemented as a word array with a trailing all-zero sentinel word so
//! `next_set_bit` never needs a bounds check mid-scan — the scan simply
//! stops at the sentinel, matching the `rrrr` bitset's word-at-a-time
//! scanning style (`examples/original_source` `intset.h` family) while
//! exposing the `Iterator`-friendly surface this crate's call sites want.

const BITS: usize = usize::BITS as usize;

/// A fixed-capacity bitset over `0..capacity`.
#[derive(Debug, Clone)]
pub struct Bitset {
    words: Vec<usize>,
    capacity: usize,
}

impl Bitset {
    /// Creates a bitset able to hold indices `0..capacity`, all unset.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let n_words = capacity.div_ceil(BITS) + 1; // +1 trailing sentinel word
        Bitset {
            words: vec![0; n_words],
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grows the bitset to hold at least `capacity` indices, preserving
    /// any bits already set. A no-op if `capacity` does not exceed the
    /// current capacity. Used when the realtime overlay forks new
    /// journey patterns after a [`crate::router::Router`] has already
    /// allocated its scratch (see `router::mod::Router::route`).
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        let n_words = capacity.div_ceil(BITS) + 1;
        self.words.resize(n_words, 0);
        self.capacity = capacity;
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.capacity,
            "bitset index {index} out of range (capacity {})",
            self.capacity
        );
    }

    pub fn set(&mut self, index: usize) {
        self.check(index);
        self.words[index / BITS] |= 1 << (index % BITS);
    }

    pub fn unset(&mut self, index: usize) {
        self.check(index);
        self.words[index / BITS] &= !(1 << (index % BITS));
    }

    /// Clears every bit, leaving the bitset ready for reuse.
    pub fn clear(&mut self) {
        for w in &mut self.words {
            *w = 0;
        }
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.check(index);
        (self.words[index / BITS] >> (index % BITS)) & 1 != 0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns the first set bit at or after `from`, or `None` if no bit
    /// at or after `from` is set. `rrrr`'s `NONE` sentinel return becomes
    /// Rust's `Option::None`.
    #[must_use]
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        if from >= self.capacity {
            return None;
        }
        let mut word_idx = from / BITS;
        let mut mask = self.words[word_idx] & (!0usize << (from % BITS));
        loop {
            if mask != 0 {
                let bit = mask.trailing_zeros() as usize;
                let idx = word_idx * BITS + bit;
                return if idx < self.capacity { Some(idx) } else { None };
            }
            word_idx += 1;
            if word_idx >= self.words.len() - 1 {
                return None;
            }
            mask = self.words[word_idx];
        }
    }

    /// Iterates every set bit in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.next_set_bit(0), move |&i| self.next_set_bit(i + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_unset_is_identity() {
        let mut bs = Bitset::new(10);
        bs.set(3);
        bs.unset(3);
        assert!(bs.is_empty());
    }

    #[test]
    fn next_set_bit_crosses_word_boundary() {
        let mut bs = Bitset::new(200);
        bs.set(5);
        bs.set(130);
        assert_eq!(bs.next_set_bit(0), Some(5));
        assert_eq!(bs.next_set_bit(6), Some(130));
        assert_eq!(bs.next_set_bit(131), None);
    }

    #[test]
    fn ones_iterates_all_members() {
        let mut bs = Bitset::new(64);
        for i in [0, 1, 31, 32, 63] {
            bs.set(i);
        }
        let collected: Vec<_> = bs.ones().collect();
        assert_eq!(collected, vec![0, 1, 31, 32, 63]);
    }

    #[test]
    fn clear_empties_set() {
        let mut bs = Bitset::new(64);
        bs.set(10);
        bs.set(20);
        bs.clear();
        assert!(bs.is_empty());
        assert_eq!(bs.next_set_bit(0), None);
    }

    #[test]
    #[should_panic]
    fn out_of_range_panics() {
        let bs = Bitset::new(10);
        bs.contains(10);
    }
}
