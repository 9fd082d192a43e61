//! A sampler whose stream can be rewound to any earlier position.
//!
//! The seed generator records the stream position before drawing each
//! candidate path; a Markov chain later seeks its own clone of the
//! sampler back to that position and regenerates the exact same path.

// pbrt
use crate::core::pbrt::Float;
use crate::core::rng::Rng;
use crate::core::sampler::Sampler;

#[derive(Debug, Clone)]
pub struct ReplayableSampler {
    initial: Rng,
    rng: Rng,
    sample_index: u64,
}

impl ReplayableSampler {
    pub fn new(seed: u64) -> Self {
        let rng: Rng = Rng::with_sequence(seed);
        ReplayableSampler {
            initial: rng,
            rng,
            sample_index: 0_u64,
        }
    }
    /// Number of values drawn since the stream start.
    pub fn sample_index(&self) -> u64 {
        self.sample_index
    }
    /// Reposition the stream so that the next draw is the one that was
    /// made at `index`.
    pub fn set_sample_index(&mut self, index: u64) {
        if index < self.sample_index {
            self.rng = self.initial;
            self.rng.advance(index);
        } else {
            self.rng.advance(index - self.sample_index);
        }
        self.sample_index = index;
    }
}

impl Sampler for ReplayableSampler {
    fn get_1d(&mut self) -> Float {
        self.sample_index += 1;
        self.rng.uniform_float()
    }
}
