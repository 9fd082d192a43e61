//! The MLT work distributor: one Markov chain per seed, run as a
//! [`ParallelProcess`], merged and normalized afterwards.

// std
use std::sync::Arc;
// others
use log::{debug, info};
// pbrt
use crate::core::error::Result;
use crate::core::film::ImageBuffer;
use crate::core::parallel::{CancelToken, ParallelProcess};
use crate::core::pbrt::Float;
use crate::core::scene::Scene;
use crate::integrators::mlt::chain::{MarkovChain, WorkResult};
use crate::integrators::mlt::config::MLTConfiguration;
use crate::integrators::mlt::mutator::{MutationEnsemble, MutationStats};
use crate::integrators::mlt::pathsampler::BidirectionalPathSampler;
use crate::integrators::mlt::seeds::PathSeed;
use crate::samplers::replayable::ReplayableSampler;

/// PCG stream used by chain `index` for its mutations.
pub fn chain_stream(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ (index as u64 + 1)
}

pub struct MLTProcess {
    config: Arc<MLTConfiguration>,
    scene: Arc<dyn Scene>,
    rpl_sampler: ReplayableSampler,
    seeds: Vec<PathSeed>,
    ensemble: MutationEnsemble,
}

impl MLTProcess {
    pub fn new(
        config: Arc<MLTConfiguration>,
        scene: Arc<dyn Scene>,
        rpl_sampler: ReplayableSampler,
        seeds: Vec<PathSeed>,
    ) -> Result<Self> {
        let ensemble = MutationEnsemble::new(&config, scene.crop_size())?;
        Ok(MLTProcess {
            config,
            scene,
            rpl_sampler,
            seeds,
            ensemble,
        })
    }
    pub fn config(&self) -> &MLTConfiguration {
        &self.config
    }
    /// Sum the chain images, scale them by the target normalization per
    /// mutation and pixel and add the direct component.
    pub fn develop(
        &self,
        results: Vec<(usize, WorkResult)>,
        direct: Option<&ImageBuffer>,
    ) -> ImageBuffer {
        let mut image = ImageBuffer::new(self.scene.crop_size());
        let mut stats = MutationStats::default();
        let mut total_mutations: u64 = 0;
        for (index, result) in results.iter() {
            debug!(
                "Work unit {}: {} mutations, {} without proposal",
                index, result.mutations, result.stats.failed
            );
            image.merge(&result.image);
            stats.merge(&result.stats);
            total_mutations += result.mutations;
        }
        if total_mutations > 0 {
            let scale: f64 = self.config.luminance as f64 * image.pixel_count() as f64
                / total_mutations as f64;
            image.scale(scale as Float);
        }
        info!(
            "Merged {} work units ({} mutations)",
            results.len(),
            total_mutations
        );
        stats.log(self.ensemble.enabled());
        if let Some(direct) = direct {
            image.merge(direct);
        }
        image
    }
}

impl ParallelProcess for MLTProcess {
    type WorkResult = WorkResult;
    fn work_unit_count(&self) -> usize {
        self.seeds.len()
    }
    fn process(&self, index: usize, token: &CancelToken) -> Option<WorkResult> {
        let path_sampler =
            BidirectionalPathSampler::new(self.scene.as_ref(), self.config.path_lengths());
        let mut chain = MarkovChain::new(
            self.scene.as_ref(),
            &self.ensemble,
            &path_sampler,
            &self.rpl_sampler,
            &self.seeds[index],
            chain_stream(self.config.seed, index),
        );
        if !chain.run(self.config.n_mutations, token) {
            return None;
        }
        Some(chain.finish())
    }
}
