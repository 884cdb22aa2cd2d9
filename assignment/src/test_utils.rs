use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator with a fixed seed, so tests can reproduce a draw.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Random weight vector with `members` entries summing to 100.
pub fn random_weights(members: usize) -> Vec<u32> {
    let mut cuts: Vec<u32> = (0..members - 1)
        .map(|_| rand::thread_rng().gen_range(0..=100))
        .collect();
    cuts.sort_unstable();
    cuts.push(100);

    let mut weights = Vec::with_capacity(members);
    let mut previous = 0;
    for cut in cuts {
        weights.push(cut - previous);
        previous = cut;
    }
    weights
}
