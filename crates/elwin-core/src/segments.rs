//! Fixed 128-slot segment bitmask.
//!
//! What a set bit means depends on the owner: in a namespace's free pool it
//! marks a segment no experiment has claimed yet, in an experiment it marks a
//! segment that experiment owns.
//!
//! Wire form is 16 bytes (32 lowercase hex characters). Byte `i` holds slots
//! `8i..8i+7`, least significant bit first.

use rand::Rng;
use thiserror::Error;

/// Number of segments in every namespace.
pub const SEGMENT_COUNT: usize = 128;

/// Encoded width of a segment set in bytes.
pub const SEGMENT_BYTES: usize = SEGMENT_COUNT / 8;

const WORD_BITS: usize = 64;
const WORDS: usize = SEGMENT_COUNT / WORD_BITS;

/// Asked to sample more segments than are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("requested {requested} segments, only {available} available")]
pub struct SampleError {
    pub requested: usize,
    pub available: usize,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SegmentSet {
    words: [u64; WORDS],
}

impl SegmentSet {
    /// No slot set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Every slot set; the free pool of a fresh namespace.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            words: [u64::MAX; WORDS],
        }
    }

    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        if index >= SEGMENT_COUNT {
            return false;
        }
        (self.words[index / WORD_BITS] >> (index % WORD_BITS)) & 1 == 1
    }

    /// Set `index`. Returns false if it was already set or out of range.
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= SEGMENT_COUNT || self.contains(index) {
            return false;
        }
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
        true
    }

    /// Clear `index`. Returns false if it was not set.
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
        true
    }

    /// Number of set slots.
    #[must_use]
    pub const fn count(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < WORDS {
            total += self.words[i].count_ones() as usize;
            i += 1;
        }
        total
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.words
            .iter()
            .zip(other.words.iter())
            .all(|(a, b)| a & b == 0)
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        for (word, theirs) in out.words.iter_mut().zip(other.words.iter()) {
            *word |= theirs;
        }
        out
    }

    /// Set slot indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..SEGMENT_COUNT).filter(move |&i| self.contains(i))
    }

    /// Move `n` distinct set slots, chosen uniformly at random, out of `self`
    /// and into the returned set.
    ///
    /// Fails without touching `self` when fewer than `n` slots are set.
    pub fn sample<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Result<Self, SampleError> {
        let free: Vec<usize> = self.iter().collect();
        if n > free.len() {
            return Err(SampleError {
                requested: n,
                available: free.len(),
            });
        }
        let mut taken = Self::empty();
        let picks = rand::seq::index::sample(rng, free.len(), n);
        for pick in picks.iter() {
            let slot = free[pick];
            self.remove(slot);
            taken.insert(slot);
        }
        Ok(taken)
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; SEGMENT_BYTES] {
        let mut out = [0_u8; SEGMENT_BYTES];
        for (chunk, word) in out.chunks_exact_mut(8).zip(self.words.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; SEGMENT_BYTES]) -> Self {
        let mut words = [0_u64; WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut raw = [0_u8; 8];
            raw.copy_from_slice(chunk);
            *word = u64::from_le_bytes(raw);
        }
        Self { words }
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(SEGMENT_BYTES * 2);
        for byte in self.to_bytes() {
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
        out
    }

    /// Parse exactly 32 hex characters (either case).
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let raw = s.as_bytes();
        if raw.len() != SEGMENT_BYTES * 2 {
            return Err(format!(
                "expected {} hex characters, got {}",
                SEGMENT_BYTES * 2,
                raw.len()
            ));
        }
        let mut bytes = [0_u8; SEGMENT_BYTES];
        for (i, pair) in raw.chunks_exact(2).enumerate() {
            let hi = hex_nibble(pair[0]).ok_or_else(|| format!("invalid hex digit at {}", 2 * i))?;
            let lo =
                hex_nibble(pair[1]).ok_or_else(|| format!("invalid hex digit at {}", 2 * i + 1))?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self::from_bytes(bytes))
    }
}

const HEX: &[u8; 16] = b"0123456789abcdef";

fn hex_nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl std::fmt::Debug for SegmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SegmentSet({}; {} set)", self.to_hex(), self.count())
    }
}
