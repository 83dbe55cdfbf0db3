//! Deterministic PRNG for simulation use (tie-breaks between equal sides).
//!
//! Uses the SplitMix64 algorithm: fast, 8 bytes of state, excellent
//! statistical properties, and trivially serializable for snapshots.
//! [`SimRng`] implements [`rand::RngCore`], so it plugs into anything in
//! the `rand` ecosystem (shuffles in particular) while staying
//! reproducible from a single `u64` seed.

use rand::{RngCore, SeedableRng};

/// SplitMix64 pseudo-random number generator.
///
/// Deterministic across platforms: the same seed always yields the same
/// tie-break decisions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    /// Create a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Get the internal state (for hashing/serialization).
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        (SimRng::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        SimRng::next_u64(self)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = SimRng::next_u64(self).to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for SimRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    // The default expands the seed through PCG; keep `seed_from_u64(n)`
    // identical to `SimRng::new(n)` instead.
    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::seq::SliceRandom;

    #[test]
    fn deterministic() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        // Extremely unlikely to match.
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn seed_from_u64_matches_new() {
        let mut a = SimRng::seed_from_u64(7);
        let mut b = SimRng::new(7);
        assert_eq!(a.next_u64(), b.next_u64());
        assert_eq!(SimRng::from_seed(7u64.to_le_bytes()), SimRng::new(7));
    }

    #[test]
    fn fill_bytes_handles_partial_chunks() {
        let mut rng = SimRng::new(3);
        let mut expected = SimRng::new(3);
        let mut buf = [0u8; 11];
        rng.fill_bytes(&mut buf);
        let first = expected.next_u64().to_le_bytes();
        let second = expected.next_u64().to_le_bytes();
        assert_eq!(&buf[..8], &first);
        assert_eq!(&buf[8..], &second[..3]);
    }

    #[test]
    fn usable_as_rand_rng() {
        let mut rng = SimRng::new(99);
        for _ in 0..1000 {
            let v: u32 = rng.random_range(0..6);
            assert!(v < 6);
        }
    }

    #[test]
    fn shuffle_is_reproducible() {
        let mut a = vec![0, 1, 2, 3, 4, 5];
        let mut b = a.clone();
        a.shuffle(&mut SimRng::new(5));
        b.shuffle(&mut SimRng::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn serialization_round_trip() {
        let mut rng = SimRng::new(42);
        // Advance state.
        for _ in 0..50 {
            rng.next_u64();
        }

        let json = serde_json::to_string(&rng).unwrap();
        let restored: SimRng = serde_json::from_str(&json).unwrap();
        assert_eq!(rng, restored);

        // Continue sequence -- should match.
        let mut rng2 = restored;
        for _ in 0..10 {
            assert_eq!(rng.next_u64(), rng2.next_u64());
        }
    }
}
