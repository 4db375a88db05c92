use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

/// Randomness used for question sampling and selection.
///
/// `Thread` draws from the thread-local generator; `Seeded` replays a fixed
/// sequence so tests and `--seed` runs are reproducible.
#[derive(Debug, Clone, Default)]
pub enum RandomSource {
    #[default]
    Thread,
    Seeded(StdRng),
}

impl RandomSource {
    #[must_use]
    pub fn thread() -> Self {
        Self::Thread
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::Seeded(StdRng::seed_from_u64(seed))
    }

    /// Uniform index in `0..upper`, or `None` when `upper` is zero.
    pub fn pick_index(&mut self, upper: usize) -> Option<usize> {
        if upper == 0 {
            return None;
        }
        let picked = match self {
            Self::Thread => rand::rng().random_range(0..upper),
            Self::Seeded(rng) => rng.random_range(0..upper),
        };
        Some(picked)
    }

    /// `amount` distinct indices drawn uniformly from `0..len`, in no particular order.
    ///
    /// `amount` is clamped to `len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(len);
        match self {
            Self::Thread => index::sample(&mut rand::rng(), len, amount).into_vec(),
            Self::Seeded(rng) => index::sample(rng, len, amount).into_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn pick_index_stays_in_range() {
        let mut random = RandomSource::seeded(42);
        for _ in 0..200 {
            let picked = random.pick_index(7).unwrap();
            assert!(picked < 7);
        }
        assert_eq!(random.pick_index(0), None);
    }

    #[test]
    fn pick_index_reaches_every_slot() {
        let mut random = RandomSource::seeded(5);
        let seen: HashSet<_> = (0..500).filter_map(|_| random.pick_index(4)).collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn sample_indices_are_distinct_and_clamped() {
        let mut random = RandomSource::thread();
        let sample = random.sample_indices(45, 30);
        let unique: HashSet<_> = sample.iter().copied().collect();
        assert_eq!(unique.len(), 30);
        assert!(sample.iter().all(|i| *i < 45));

        assert_eq!(random.sample_indices(3, 30).len(), 3);
    }

    #[test]
    fn seeded_sources_replay() {
        let mut a = RandomSource::seeded(9);
        let mut b = RandomSource::seeded(9);
        let xs: Vec<_> = (0..20).filter_map(|_| a.pick_index(100)).collect();
        let ys: Vec<_> = (0..20).filter_map(|_| b.pick_index(100)).collect();
        assert_eq!(xs, ys);
    }
}
