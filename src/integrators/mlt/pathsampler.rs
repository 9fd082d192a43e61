//! Unbiased path generation for seeding the Markov chains.

// pbrt
use crate::core::pbrt::{Float, Spectrum};
use crate::core::sampler::Sampler;
use crate::core::scene::{PathVertex, Scene, VertexKind};
use crate::integrators::mlt::path::{Path, PathLengths, VertexList};

/// Probability of continuing a path by one more surface vertex.
pub const CONTINUATION_PROBABILITY: Float = 0.75;

pub trait PathSampler: Sync {
    /// Draw a path with all randomness taken from `sampler`. The
    /// returned path's `weight` is the reciprocal probability of the
    /// length decisions, so `contribution * weight` is an unbiased
    /// estimate of the image integral.
    fn sample_bidirectional_path(&self, sampler: &mut dyn Sampler) -> Path;
}

/// Builds a camera subpath and a light subpath and joins them. The
/// number of surface vertices is geometric (Russian roulette),
/// truncated to the allowed range of path lengths.
pub struct BidirectionalPathSampler<'a> {
    scene: &'a dyn Scene,
    lengths: PathLengths,
    continuation: Float,
}

impl<'a> BidirectionalPathSampler<'a> {
    pub fn new(scene: &'a dyn Scene, lengths: PathLengths) -> Self {
        BidirectionalPathSampler {
            scene,
            lengths,
            continuation: CONTINUATION_PROBABILITY,
        }
    }
    pub fn lengths(&self) -> PathLengths {
        self.lengths
    }
    /// Choose the number of extra surface vertices beyond the minimum,
    /// returns it along with its probability.
    fn sample_extra_vertices(&self, u: Float) -> (usize, Float) {
        let q: Float = self.continuation;
        let span: Option<usize> = self
            .lengths
            .max_vertices
            .map(|max| max - self.lengths.min_vertices);
        let norm: Float = match span {
            Some(k) => (1.0 as Float - q.powi(k as i32 + 1)) / (1.0 as Float - q),
            None => 1.0 as Float / (1.0 as Float - q),
        };
        let target: Float = u * norm;
        let mut cumulative: Float = 0.0 as Float;
        let mut term: Float = 1.0 as Float;
        let mut k: usize = 0;
        loop {
            cumulative += term;
            let last: bool = span.map_or(false, |s| k >= s) || term < 1.0e-12 as Float;
            if target < cumulative || last {
                return (k, term / norm);
            }
            term *= q;
            k += 1;
        }
    }
}

impl<'a> PathSampler for BidirectionalPathSampler<'a> {
    fn sample_bidirectional_path(&self, sampler: &mut dyn Sampler) -> Path {
        if self.lengths.is_empty() {
            let vertices: VertexList = [VertexKind::Sensor, VertexKind::Emitter]
                .iter()
                .map(|kind| PathVertex::new(*kind, sampler.get_2d()))
                .collect();
            let mut path: Path = Path::evaluate(self.scene, vertices);
            path.contribution = Spectrum::default();
            path.luminance = 0.0 as Float;
            path.weight = 0.0 as Float;
            return path;
        }
        let (extra, pmf) = self.sample_extra_vertices(sampler.get_1d());
        let n_surfaces: usize = self.lengths.min_vertices - 2 + extra;
        // split the surface vertices between the two subpaths
        let n_camera: usize =
            ((sampler.get_1d() * (n_surfaces + 1) as Float) as usize).min(n_surfaces);
        let mut vertices: VertexList = VertexList::with_capacity(n_surfaces + 2);
        vertices.push(PathVertex::new(VertexKind::Sensor, sampler.get_2d()));
        for _ in 0..n_camera {
            vertices.push(PathVertex::new(VertexKind::Surface, sampler.get_2d()));
        }
        // the light subpath starts at the emitter and is stored reversed
        let emitter: PathVertex = PathVertex::new(VertexKind::Emitter, sampler.get_2d());
        let mut light_subpath: VertexList = VertexList::new();
        for _ in n_camera..n_surfaces {
            light_subpath.push(PathVertex::new(VertexKind::Surface, sampler.get_2d()));
        }
        vertices.extend(light_subpath.into_iter().rev());
        vertices.push(emitter);
        let mut path: Path = Path::evaluate(self.scene, vertices);
        path.weight = 1.0 as Float / pmf;
        path
    }
}
