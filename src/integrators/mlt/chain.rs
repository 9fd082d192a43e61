//! A single Markov chain: replay the seed path, then mutate it
//! `n_mutations` times and splat both the current and the proposed path
//! into a private image buffer, weighted by the acceptance probability.
//!
//! The chain samples the target density of its [`MutationEnsemble`];
//! every deposit is divided by the target of the deposited path.

// others
use log::warn;
// pbrt
use crate::core::film::ImageBuffer;
use crate::core::parallel::CancelToken;
use crate::core::pbrt::Float;
use crate::core::sampler::Sampler;
use crate::core::scene::Scene;
use crate::integrators::mlt::mutator::{MutationEnsemble, MutationStats};
use crate::integrators::mlt::path::Path;
use crate::integrators::mlt::pathsampler::PathSampler;
use crate::integrators::mlt::seeds::PathSeed;
use crate::samplers::random::RandomSampler;
use crate::samplers::replayable::ReplayableSampler;

/// Relative target difference above which a replayed seed is reported
/// as inconsistent.
const REPLAY_TOLERANCE: Float = 1.0e-3;

/// Metropolis-Hastings acceptance probability for moving from a path
/// with target `current` to one with target `candidate`, given
/// the proposal density ratio. A chain stuck on a black path accepts
/// anything.
pub fn acceptance_probability(current: Float, candidate: Float, ratio: Float) -> Float {
    if current <= 0.0 as Float {
        return 1.0 as Float;
    }
    let a: Float = candidate * ratio / current;
    if a.is_nan() || a <= 0.0 as Float {
        0.0 as Float
    } else {
        a.min(1.0 as Float)
    }
}

/// Everything a finished chain hands back for the merge.
#[derive(Debug, Clone)]
pub struct WorkResult {
    pub image: ImageBuffer,
    pub stats: MutationStats,
    pub mutations: u64,
}

pub struct MarkovChain<'a> {
    scene: &'a dyn Scene,
    ensemble: &'a MutationEnsemble,
    sampler: RandomSampler,
    current: Path,
    current_target: Float,
    image: ImageBuffer,
    stats: MutationStats,
    mutations: u64,
}

impl<'a> MarkovChain<'a> {
    /// Regenerate the seed path from its position in the replayable
    /// stream; mutations draw from the independent stream `stream`.
    pub fn new(
        scene: &'a dyn Scene,
        ensemble: &'a MutationEnsemble,
        path_sampler: &dyn PathSampler,
        replay: &ReplayableSampler,
        seed: &PathSeed,
        stream: u64,
    ) -> Self {
        let mut replay: ReplayableSampler = replay.clone();
        replay.set_sample_index(seed.sample_index);
        let current: Path = path_sampler.sample_bidirectional_path(&mut replay);
        let current_target: Float = ensemble.target(&current);
        let tolerance: Float = REPLAY_TOLERANCE * seed.target.abs().max(1.0 as Float);
        if (current_target - seed.target).abs() > tolerance {
            warn!(
                "Seed at {} replayed with target {} instead of {}",
                seed.sample_index, current_target, seed.target
            );
        }
        MarkovChain {
            scene,
            ensemble,
            sampler: RandomSampler::new(stream),
            current,
            current_target,
            image: ImageBuffer::new(scene.crop_size()),
            stats: MutationStats::default(),
            mutations: 0,
        }
    }
    /// Run up to `n_mutations` iterations; `false` if `token` was
    /// cancelled first.
    pub fn run(&mut self, n_mutations: u64, token: &CancelToken) -> bool {
        for _ in 0..n_mutations {
            if token.is_cancelled() {
                return false;
            }
            self.step();
        }
        true
    }
    /// One select, propose, accept/reject and splat iteration.
    pub fn step(&mut self) {
        self.mutations += 1;
        let (kind, p_forward) = match self.ensemble.select(&self.current, self.sampler.get_1d()) {
            Some(selection) => selection,
            None => {
                self.stats.failed += 1;
                splat(&mut self.image, &self.current, self.current_target, 1.0 as Float);
                return;
            }
        };
        let proposal =
            match self
                .ensemble
                .propose(kind, self.scene, &self.current, &mut self.sampler)
            {
                Some(proposal) => proposal,
                None => {
                    self.stats.failed += 1;
                    self.stats.record(kind, false);
                    splat(&mut self.image, &self.current, self.current_target, 1.0 as Float);
                    return;
                }
            };
        let p_reverse: Float = self
            .ensemble
            .selection_probability(kind, &proposal.candidate);
        let ratio: Float = proposal.ratio * p_reverse / p_forward;
        let candidate_target: Float = self.ensemble.target(&proposal.candidate);
        let a: Float = acceptance_probability(self.current_target, candidate_target, ratio);
        splat(
            &mut self.image,
            &self.current,
            self.current_target,
            1.0 as Float - a,
        );
        splat(&mut self.image, &proposal.candidate, candidate_target, a);
        let accepted: bool = self.sampler.get_1d() < a;
        if accepted {
            self.current = proposal.candidate;
            self.current_target = candidate_target;
        }
        self.stats.record(kind, accepted);
    }
    pub fn finish(self) -> WorkResult {
        WorkResult {
            image: self.image,
            stats: self.stats,
            mutations: self.mutations,
        }
    }
}

/// Deposit `weight` of a path, normalized by its target.
fn splat(image: &mut ImageBuffer, path: &Path, target: Float, weight: Float) {
    if weight > 0.0 as Float && target > 0.0 as Float {
        image.splat(&path.p_raster, &(path.contribution * (weight / target)));
    }
}
