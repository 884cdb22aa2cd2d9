use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    /// When set, every allocation request seeds a fresh generator from this
    /// value, making whole runs reproducible. Left unset, generators seed
    /// from OS entropy.
    #[envconfig(from = "ASSIGNMENT_RNG_SEED")]
    pub rng_seed: Option<u64>,
}
