//! Luminance estimation and seed selection.
//!
//! Seeding runs in two passes over one replayable stream. The first
//! pass only estimates the average luminance; the second pass estimates
//! it again and remembers, for every candidate path, where in the stream
//! the path started. Seeds are then picked with probability proportional
//! to their chain target (luminance, divided by the importance map when
//! there is one), which starts every Markov chain in its stationary
//! distribution.

// others
use log::{debug, warn};
// pbrt
use crate::core::pbrt::Float;
use crate::core::sampler::Sampler;
use crate::core::sampling::Distribution1D;
use crate::integrators::mlt::importance::{chain_target, sensor_importance, ImportanceMap};
use crate::integrators::mlt::pathsampler::PathSampler;
use crate::samplers::replayable::ReplayableSampler;

/// Start of a Markov chain: the stream position of a recorded path and
/// that path's chain target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathSeed {
    pub sample_index: u64,
    pub target: Float,
}

/// Draw `sample_count` paths and return the Monte Carlo estimate of
/// the normalization of the chain target (the average luminance when
/// `importance` is `None`). With `store_seeds` set, `seeds` receives
/// exactly `seed_count` seeds selected proportionally to the sampled
/// target (uniformly if every path was black).
pub fn generate_seeds(
    path_sampler: &dyn PathSampler,
    importance: Option<&ImportanceMap>,
    sampler: &mut ReplayableSampler,
    sample_count: usize,
    seed_count: usize,
    store_seeds: bool,
    seeds: &mut Vec<PathSeed>,
) -> Float {
    let mut candidates: Vec<PathSeed> = Vec::new();
    let mut weights: Vec<Float> = Vec::new();
    if store_seeds {
        candidates.reserve(sample_count);
        weights.reserve(sample_count);
    }
    let mut sum: f64 = 0.0;
    for _ in 0..sample_count {
        let sample_index: u64 = sampler.sample_index();
        let path = path_sampler.sample_bidirectional_path(sampler);
        let target: Float = chain_target(&path, importance);
        let weighted: Float = path.weighted_luminance() / sensor_importance(&path, importance);
        sum += weighted as f64;
        if store_seeds {
            candidates.push(PathSeed {
                sample_index,
                target,
            });
            weights.push(weighted);
        }
    }
    let luminance: Float = if sample_count > 0 {
        (sum / sample_count as f64) as Float
    } else {
        0.0 as Float
    };
    if !store_seeds {
        return luminance;
    }
    if sum <= 0.0 {
        warn!(
            "Could not find any light paths in {} samples, picking seeds uniformly",
            sample_count
        );
    }
    if candidates.is_empty() {
        return luminance;
    }
    let distribution = Distribution1D::new(weights);
    seeds.clear();
    seeds.reserve(seed_count);
    for _ in 0..seed_count {
        let index: usize = distribution.sample_discrete(sampler.get_1d());
        seeds.push(candidates[index]);
    }
    debug!(
        "Selected {} seeds from {} candidate paths (normalization {})",
        seed_count, sample_count, luminance
    );
    luminance
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::{Point2f, Vector2i};
    use crate::core::scene::{PathVertex, VertexKind};
    use crate::integrators::mlt::path::{Path, VertexList};
    use crate::core::pbrt::Spectrum;

    /// Cycles through fixed luminance values, one draw per path.
    struct Cycle {
        values: Vec<Float>,
    }

    impl PathSampler for Cycle {
        fn sample_bidirectional_path(&self, sampler: &mut dyn Sampler) -> Path {
            let u: Float = sampler.get_1d();
            let index: usize = ((u * self.values.len() as Float) as usize).min(self.values.len() - 1);
            let luminance: Float = self.values[index];
            let mut vertices = VertexList::new();
            vertices.push(PathVertex::new(VertexKind::Sensor, Point2f { x: u, y: 0.5 }));
            vertices.push(PathVertex::new(VertexKind::Emitter, Point2f { x: 0.5, y: 0.5 }));
            Path {
                vertices,
                contribution: Spectrum::new(luminance),
                luminance,
                p_raster: Point2f { x: u, y: 0.0 },
                weight: 1.0,
            }
        }
    }

    #[test]
    fn estimate_only_pass_stores_nothing() {
        let stub = Cycle {
            values: vec![1.0, 3.0],
        };
        let mut sampler = ReplayableSampler::new(0);
        let mut seeds = Vec::new();
        let luminance = generate_seeds(&stub, None, &mut sampler, 10_000, 4, false, &mut seeds);
        assert!(seeds.is_empty());
        assert!((luminance - 2.0).abs() < 0.1);
    }

    #[test]
    fn seeds_replay_to_their_target() {
        let stub = Cycle {
            values: vec![0.0, 1.0, 2.0, 2.0],
        };
        let mut sampler = ReplayableSampler::new(7);
        let mut seeds = Vec::new();
        generate_seeds(&stub, None, &mut sampler, 1000, 16, true, &mut seeds);
        assert_eq!(seeds.len(), 16);
        for seed in &seeds {
            assert!(seed.target > 0.0);
            let mut replay = sampler.clone();
            replay.set_sample_index(seed.sample_index);
            let path = stub.sample_bidirectional_path(&mut replay);
            assert_eq!(path.luminance, seed.target);
        }
    }

    #[test]
    fn black_scene_picks_uniformly() {
        let stub = Cycle { values: vec![0.0] };
        let mut sampler = ReplayableSampler::new(1);
        let mut seeds = Vec::new();
        let luminance = generate_seeds(&stub, None, &mut sampler, 100, 5, true, &mut seeds);
        assert_eq!(luminance, 0.0);
        assert_eq!(seeds.len(), 5);
        assert!(seeds.iter().all(|s| s.target == 0.0));
    }

    #[test]
    fn importance_map_lowers_bright_seed_weights() {
        // values 1 and 3 on the left and right halves of the sensor;
        // dividing by importance 1 and 3 makes both halves equally likely
        let stub = Cycle {
            values: vec![1.0, 3.0],
        };
        let map = ImportanceMap::new(Vector2i::new(2, 1), vec![1.0, 3.0]).unwrap();
        let mut sampler = ReplayableSampler::new(3);
        let mut seeds = Vec::new();
        let normalization =
            generate_seeds(&stub, Some(&map), &mut sampler, 20_000, 2_000, true, &mut seeds);
        assert!((normalization - 1.0).abs() < 0.05);
        assert!(seeds.iter().all(|s| (s.target - 1.0).abs() < 1.0e-6));
        let bright = seeds
            .iter()
            .filter(|seed| {
                let mut replay = sampler.clone();
                replay.set_sample_index(seed.sample_index);
                stub.sample_bidirectional_path(&mut replay).luminance > 2.0
            })
            .count() as Float
            / seeds.len() as Float;
        assert!((bright - 0.5).abs() < 0.06);
    }
}
