// pbrt
use crate::core::pbrt::Float;
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;

// see random.h

/// Independent uniform random numbers, one PCG stream per seed.
#[derive(Debug, Default, Clone)]
pub struct RandomSampler {
    pub rng: Rng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        RandomSampler {
            rng: Rng::with_sequence(seed),
        }
    }
    pub fn reseed(&mut self, seed: u64) {
        self.rng.set_sequence(seed);
    }
}

impl Sampler for RandomSampler {
    fn get_1d(&mut self) -> Float {
        self.rng.uniform_float()
    }
}
