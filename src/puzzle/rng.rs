//! Small PCG-32 generator backing the shuffle.
//!
//! The comparator-based random sort a naive port would use is not a uniform
//! shuffle; the grid uses Fisher–Yates over this generator instead. Seeding
//! comes from `getrandom` when the `rng` feature is on, otherwise from a
//! clock-derived fallback (not crypto secure, fine for a puzzle board).

pub struct Pcg32 {
    state: u64,
    inc: u64,
}

const PCG_MULT: u64 = 6364136223846793005;

impl Pcg32 {
    pub fn new(seed: u64) -> Self {
        let mut rng = Self {
            state: 0,
            inc: (seed << 1) | 1,
        };
        rng.next_u32();
        rng.state = rng.state.wrapping_add(seed);
        rng.next_u32();
        rng
    }

    /// Generator seeded from the environment.
    #[cfg(feature = "rng")]
    pub fn from_entropy() -> Self {
        let mut bytes = [0u8; 8];
        match getrandom::getrandom(&mut bytes) {
            Ok(()) => Self::new(u64::from_le_bytes(bytes)),
            Err(_) => Self::new(fallback_seed()),
        }
    }

    #[cfg(not(feature = "rng"))]
    pub fn from_entropy() -> Self {
        Self::new(fallback_seed())
    }

    pub fn next_u32(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(PCG_MULT).wrapping_add(self.inc);
        let xorshifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform draw in `0..bound` via rejection sampling (no modulo bias).
    pub fn below(&mut self, bound: u32) -> u32 {
        debug_assert!(bound > 0, "below(0) is meaningless");
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let r = self.next_u32();
            if r >= threshold {
                return r % bound;
            }
        }
    }
}

// Millisecond clock pushed through one LCG step, for builds without the
// `rng` feature (and as a last resort if getrandom fails).
fn fallback_seed() -> u64 {
    (crate::performance_now() as u64)
        .wrapping_mul(1664525)
        .wrapping_add(1013904223)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Pcg32::new(42);
        let mut b = Pcg32::new(42);
        for _ in 0..64 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn below_stays_in_range_and_hits_every_value() {
        let mut rng = Pcg32::new(1);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let v = rng.below(5) as usize;
            assert!(v < 5);
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s), "some residue never drawn: {seen:?}");
    }
}
