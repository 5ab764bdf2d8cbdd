//! Deterministic hash pipeline.
//!
//! A [`HashPipeline`] accumulates byte fragments in order (salt, namespace
//! name, unit keys and values, experiment name, param name) and turns them
//! into a [`Draw`]. Every fragment is length-prefixed before it reaches the
//! hasher so `("ab", "c")` and `("a", "bc")` never collide. The digest is
//! blake3 truncated to its first eight bytes, read little-endian, which makes
//! a draw identical on every host and every run.

/// One `(key, value)` pair of caller identity, in namespace declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Incremental hasher over an ordered sequence of fragments.
#[derive(Clone)]
pub struct HashPipeline {
    hasher: blake3::Hasher,
}

impl HashPipeline {
    /// Start a pipeline seeded with the global salt.
    #[must_use]
    pub fn new(salt: &str) -> Self {
        let mut pipeline = Self {
            hasher: blake3::Hasher::new(),
        };
        pipeline.push(salt.as_bytes());
        pipeline
    }

    /// Append one fragment.
    pub fn push(&mut self, fragment: &[u8]) -> &mut Self {
        self.hasher.update(&(fragment.len() as u64).to_le_bytes());
        self.hasher.update(fragment);
        self
    }

    /// Append every unit's key then value.
    pub fn push_units(&mut self, units: &[Unit<'_>]) -> &mut Self {
        for unit in units {
            self.push(unit.key.as_bytes());
            self.push(unit.value.as_bytes());
        }
        self
    }

    /// A copy of this pipeline with one more fragment appended.
    #[must_use]
    pub fn extended(&self, fragment: &[u8]) -> Self {
        let mut next = self.clone();
        next.push(fragment);
        next
    }

    /// Finalize the fragments seen so far. The pipeline stays usable.
    #[must_use]
    pub fn draw(&self) -> Draw {
        let digest = self.hasher.finalize();
        let mut word = [0_u8; 8];
        word.copy_from_slice(&digest.as_bytes()[..8]);
        Draw(u64::from_le_bytes(word))
    }
}

impl std::fmt::Debug for HashPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashPipeline").finish_non_exhaustive()
    }
}

/// The 64-bit result of a hash pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Draw(u64);

impl Draw {
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Map onto the integer range `[lo, hi)` as `lo + draw mod (hi - lo)`.
    ///
    /// An empty range yields `lo`.
    #[must_use]
    pub const fn uniform(self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        lo + self.0 % (hi - lo)
    }

    /// Map onto the real range `[lo, hi)` by scaling the top 53 bits.
    #[must_use]
    pub fn uniform_f64(self, lo: f64, hi: f64) -> f64 {
        let unit = (self.0 >> 11) as f64 * (1.0 / (1_u64 << 53) as f64);
        lo + (hi - lo) * unit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw_of(fragments: &[&str]) -> Draw {
        let mut pipeline = HashPipeline::new("salt");
        for fragment in fragments {
            pipeline.push(fragment.as_bytes());
        }
        pipeline.draw()
    }

    #[test]
    fn identical_fragments_identical_draw() {
        assert_eq!(draw_of(&["ns", "userid", "42"]), draw_of(&["ns", "userid", "42"]));
    }

    // Fixed values: changing framing, byte order or truncation reshuffles
    // every caller, so these must never change.
    #[test]
    fn known_answer_draws() {
        assert_eq!(HashPipeline::new("choices").draw().value(), 0x3abd_0386_30f0_ac40);
        let mut pipeline = HashPipeline::new("choices");
        pipeline.push(b"t1").push(b"userid").push(b"42");
        assert_eq!(pipeline.draw().value(), 0x0ba8_3399_2d16_0bea);
        assert_eq!(pipeline.draw().uniform(0, 128), 106);
        assert_eq!(
            pipeline.extended(b"uniform").extended(b"a").draw().value(),
            0xf8cf_cb71_3749_77b1
        );
    }

    #[test]
    fn fragment_boundaries_matter() {
        assert_ne!(draw_of(&["ab", "c"]), draw_of(&["a", "bc"]));
    }

    #[test]
    fn salt_changes_draw() {
        let a = HashPipeline::new("one").extended(b"x").draw();
        let b = HashPipeline::new("two").extended(b"x").draw();
        assert_ne!(a, b);
    }

    #[test]
    fn extended_does_not_mutate_prefix() {
        let prefix = HashPipeline::new("salt").extended(b"ns");
        let before = prefix.draw();
        let _child = prefix.extended(b"exp");
        assert_eq!(prefix.draw(), before);
    }

    #[test]
    fn push_units_matches_manual_pushes() {
        let units = [
            Unit {
                key: "userid",
                value: "7",
            },
            Unit {
                key: "device",
                value: "",
            },
        ];
        let mut a = HashPipeline::new("s");
        a.push_units(&units);
        let mut b = HashPipeline::new("s");
        b.push(b"userid").push(b"7").push(b"device").push(b"");
        assert_eq!(a.draw(), b.draw());
    }

    #[test]
    fn uniform_stays_in_range() {
        for raw in [0_u64, 1, 127, 128, 255, u64::MAX, 0xDEAD_BEEF] {
            let v = Draw::from_raw(raw).uniform(0, 128);
            assert!(v < 128);
            assert_eq!(v, raw % 128);
            let shifted = Draw::from_raw(raw).uniform(10, 13);
            assert!((10..13).contains(&shifted));
        }
    }

    #[test]
    fn uniform_empty_range_yields_lo() {
        assert_eq!(Draw::from_raw(99).uniform(5, 5), 5);
        assert_eq!(Draw::from_raw(99).uniform(6, 5), 6);
    }

    #[test]
    fn uniform_f64_bounds() {
        assert_eq!(Draw::from_raw(0).uniform_f64(0.0, 3.0), 0.0);
        let top = Draw::from_raw(u64::MAX).uniform_f64(0.0, 3.0);
        assert!(top < 3.0);
        assert!(top > 2.99);
    }
}
