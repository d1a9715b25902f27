use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_pcg::Pcg64;

/// SplitMix64 mix of `(master, run_id)`; distinct runs get decorrelated seeds.
pub fn run_seed(master: u64, run_id: usize) -> u64 {
    let mut x = master ^ (run_id as u64).wrapping_mul(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Per-run deterministic RNG
pub fn run_rng(master: u64, run_id: usize) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(run_seed(master, run_id))
}

/// Seeded `Pcg64`, or one seeded from OS entropy.
pub fn pcg_from(seed: Option<u64>) -> Pcg64 {
    match seed {
        Some(s) => Pcg64::seed_from_u64(s),
        None => Pcg64::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_runs_are_reproducible_and_distinct() {
        assert_eq!(run_rng(42, 3).next_u64(), run_rng(42, 3).next_u64());
        assert_ne!(run_seed(42, 0), run_seed(42, 1));
    }
}
