//! The ensemble of mutation strategies.
//!
//! The ensemble also owns the density the chains sample: path luminance,
//! divided by the importance of the path's sensor position when a
//! two-stage importance map is present.
//!
//! Every strategy proposes a candidate path together with the ratio
//! `T(y -> x) / T(x -> y)` of its own transition densities. The ensemble
//! picks a strategy with a probability proportional to its weight among
//! the strategies applicable to the current path. Because the
//! applicable set may differ at the candidate, the selection
//! probabilities at both paths enter the acceptance ratio as well; a
//! candidate from which the reverse move is impossible is rejected.
//!
//! * **Bidirectional mutation** deletes a contiguous run of vertices
//!   and inserts freshly sampled ones, changing the path length.
//! * **Lens perturbation** moves the sensor coordinates of paths that
//!   see a non-specular surface (possibly through specular vertices).
//! * **Caustic perturbation** moves the emitter and the sensor end of
//!   `L S+ D E` paths.
//! * **Multi-chain perturbation** moves the sensor and every
//!   non-specular surface vertex but the last one.
//! * **Manifold perturbation** moves one non-specular vertex of a path
//!   with specular vertices and keeps the specular chain in place.

// std
use std::fmt;
use std::sync::Arc;
// others
use log::info;
use smallvec::{smallvec, SmallVec};
// pbrt
use crate::core::error::{RenderError, Result};
use crate::core::geometry::{Point2f, Vector2i};
use crate::core::pbrt::{wrap_unit, Float, PI};
use crate::core::sampler::Sampler;
use crate::core::scene::{PathVertex, Scene, VertexKind};
use crate::integrators::mlt::config::MLTConfiguration;
use crate::integrators::mlt::importance::{chain_target, ImportanceMap};
use crate::integrators::mlt::path::{Path, PathLengths, VertexList};

/// Outer perturbation radius (in primary coordinates) of lens and
/// multi-chain perturbations; the inner one is a tenth of a pixel.
pub const LENS_RADIUS_MAX: Float = 0.1;
pub const CAUSTIC_RADIUS: (Float, Float) = (1.0e-4, 0.1);
pub const MANIFOLD_RADIUS: (Float, Float) = (1.0e-4, 0.05);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Bidirectional,
    Lens,
    Caustic,
    MultiChain,
    Manifold,
}

pub const MUTATION_KINDS: [MutationKind; 5] = [
    MutationKind::Bidirectional,
    MutationKind::Lens,
    MutationKind::Caustic,
    MutationKind::MultiChain,
    MutationKind::Manifold,
];

impl MutationKind {
    pub fn index(self) -> usize {
        match self {
            MutationKind::Bidirectional => 0,
            MutationKind::Lens => 1,
            MutationKind::Caustic => 2,
            MutationKind::MultiChain => 3,
            MutationKind::Manifold => 4,
        }
    }
    pub fn name(self) -> &'static str {
        match self {
            MutationKind::Bidirectional => "Bidirectional mutation",
            MutationKind::Lens => "Lens perturbation",
            MutationKind::Caustic => "Caustic perturbation",
            MutationKind::MultiChain => "Multi-chain perturbation",
            MutationKind::Manifold => "Manifold perturbation",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A candidate path and the strategy's density ratio
/// `T(candidate -> current) / T(current -> candidate)`.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub candidate: Path,
    pub ratio: Float,
}

pub struct MutationEnsemble {
    enabled: SmallVec<[MutationKind; 5]>,
    weights: [Float; 5],
    lengths: PathLengths,
    lens_radius: (Float, Float),
    importance: Option<Arc<ImportanceMap>>,
}

impl MutationEnsemble {
    pub fn new(config: &MLTConfiguration, crop_size: Vector2i) -> Result<Self> {
        let flags: [bool; 5] = [
            config.bidirectional_mutation,
            config.lens_perturbation,
            config.caustic_perturbation,
            config.multi_chain_perturbation,
            config.manifold_perturbation,
        ];
        let enabled: SmallVec<[MutationKind; 5]> = MUTATION_KINDS
            .iter()
            .zip(flags.iter())
            .filter(|(_, on)| **on)
            .map(|(kind, _)| *kind)
            .collect();
        if enabled.is_empty() {
            return Err(RenderError::NoMutationStrategy);
        }
        let mut weights: [Float; 5] = [0.0 as Float; 5];
        for kind in &enabled {
            weights[kind.index()] = if *kind == MutationKind::Bidirectional {
                config.prob_factor
            } else {
                1.0 as Float
            };
        }
        let resolution: Float = crop_size.x.max(crop_size.y).max(1) as Float;
        Ok(MutationEnsemble {
            enabled,
            weights,
            lengths: config.path_lengths(),
            lens_radius: (
                (0.1 as Float / resolution).min(LENS_RADIUS_MAX),
                LENS_RADIUS_MAX,
            ),
            importance: config.importance_map.clone(),
        })
    }
    /// Unnormalized density the chains sample at `path`.
    pub fn target(&self, path: &Path) -> Float {
        chain_target(path, self.importance.as_deref())
    }
    pub fn enabled(&self) -> &[MutationKind] {
        &self.enabled
    }
    pub fn weight(&self, kind: MutationKind) -> Float {
        self.weights[kind.index()]
    }
    pub fn is_applicable(&self, kind: MutationKind, path: &Path) -> bool {
        match kind {
            MutationKind::Bidirectional => true,
            _ => perturbation_targets(kind, path).is_some(),
        }
    }
    fn total_weight(&self, path: &Path) -> Float {
        self.enabled
            .iter()
            .filter(|kind| self.is_applicable(**kind, path))
            .map(|kind| self.weight(*kind))
            .sum()
    }
    /// Probability of picking `kind` at `path`.
    pub fn selection_probability(&self, kind: MutationKind, path: &Path) -> Float {
        let w: Float = self.weight(kind);
        if w <= 0.0 as Float || !self.is_applicable(kind, path) {
            return 0.0 as Float;
        }
        w / self.total_weight(path)
    }
    /// Pick a strategy for `path`; `None` if no applicable strategy has
    /// a positive weight.
    pub fn select(&self, path: &Path, u: Float) -> Option<(MutationKind, Float)> {
        let total: Float = self.total_weight(path);
        if !(total > 0.0 as Float) {
            return None;
        }
        let target: Float = u * total;
        let mut cumulative: Float = 0.0 as Float;
        let mut last: Option<(MutationKind, Float)> = None;
        for kind in self.enabled.iter() {
            if !self.is_applicable(*kind, path) {
                continue;
            }
            let w: Float = self.weight(*kind);
            if w <= 0.0 as Float {
                continue;
            }
            cumulative += w;
            last = Some((*kind, w / total));
            if target < cumulative {
                break;
            }
        }
        last
    }
    /// Let strategy `kind` propose a candidate. `None` means the
    /// strategy could not produce a move from `current`.
    pub fn propose(
        &self,
        kind: MutationKind,
        scene: &dyn Scene,
        current: &Path,
        sampler: &mut dyn Sampler,
    ) -> Option<Proposal> {
        match kind {
            MutationKind::Bidirectional => self.propose_bidirectional(scene, current, sampler),
            MutationKind::Lens | MutationKind::MultiChain => {
                self.propose_perturbation(kind, self.lens_radius, scene, current, sampler)
            }
            MutationKind::Caustic => {
                self.propose_perturbation(kind, CAUSTIC_RADIUS, scene, current, sampler)
            }
            MutationKind::Manifold => {
                self.propose_perturbation(kind, MANIFOLD_RADIUS, scene, current, sampler)
            }
        }
    }
    fn propose_bidirectional(
        &self,
        scene: &dyn Scene,
        current: &Path,
        sampler: &mut dyn Sampler,
    ) -> Option<Proposal> {
        let n: usize = current.vertex_count();
        if n < 2 {
            return None;
        }
        // deleted subpath [s, s + kd)
        let kd: usize = sample_deletion(n, sampler.get_1d());
        let kept: usize = n - kd;
        let s: usize = ((sampler.get_1d() * (kept + 1) as Float) as usize).min(kept);
        let (ka_min, ka_max) = insertion_range(kept, &self.lengths)?;
        let ka: usize = sample_insertion(kd, ka_min, ka_max, sampler.get_1d());
        // insert ka fresh vertices
        let mut vertices: VertexList = VertexList::with_capacity(kept + ka);
        vertices.extend_from_slice(&current.vertices[..s]);
        for _ in 0..ka {
            vertices.push(PathVertex::new(VertexKind::Surface, sampler.get_2d()));
        }
        vertices.extend_from_slice(&current.vertices[s + kd..]);
        let candidate: Path = Path::evaluate(scene, vertices);
        let forward: Float = deletion_pmf(kd, n) / insertion_norm(kd, ka_min, ka_max);
        let reverse: Float =
            deletion_pmf(ka, candidate.vertex_count()) / insertion_norm(ka, ka_min, ka_max);
        Some(Proposal {
            candidate,
            ratio: reverse / forward,
        })
    }
    fn propose_perturbation(
        &self,
        kind: MutationKind,
        radius: (Float, Float),
        scene: &dyn Scene,
        current: &Path,
        sampler: &mut dyn Sampler,
    ) -> Option<Proposal> {
        let targets = perturbation_targets(kind, current)?;
        let chosen: SmallVec<[usize; 8]> = if kind == MutationKind::Manifold {
            let pick: usize =
                ((sampler.get_1d() * targets.len() as Float) as usize).min(targets.len() - 1);
            smallvec![targets[pick]]
        } else {
            targets.clone()
        };
        let mut vertices: VertexList = current.vertices.clone();
        for i in chosen.iter() {
            vertices[*i].u = perturb(&vertices[*i].u, radius, sampler);
        }
        let candidate: Path = Path::evaluate(scene, vertices);
        let ratio: Float = match perturbation_targets(kind, &candidate) {
            Some(reverse) if kind == MutationKind::Manifold => {
                if reverse.contains(&chosen[0]) {
                    targets.len() as Float / reverse.len() as Float
                } else {
                    0.0 as Float
                }
            }
            Some(reverse) if reverse == targets => 1.0 as Float,
            _ => 0.0 as Float,
        };
        Some(Proposal { candidate, ratio })
    }
}

/// Vertices a perturbation moves (for the manifold perturbation: the
/// vertices it may choose from). `None` if the strategy does not apply.
pub fn perturbation_targets(kind: MutationKind, path: &Path) -> Option<SmallVec<[usize; 8]>> {
    let n: usize = path.vertex_count();
    match kind {
        MutationKind::Bidirectional => None,
        MutationKind::Lens => path.first_diffuse_from_sensor().map(|_| smallvec![0]),
        MutationKind::Caustic => {
            if path.is_caustic() {
                Some(smallvec![0, n - 1])
            } else {
                None
            }
        }
        MutationKind::MultiChain => {
            let diffuse = path.diffuse_surfaces();
            if diffuse.len() < 2 {
                return None;
            }
            let mut targets: SmallVec<[usize; 8]> = smallvec![0];
            targets.extend_from_slice(&diffuse[..diffuse.len() - 1]);
            Some(targets)
        }
        MutationKind::Manifold => {
            if !path.has_specular() {
                return None;
            }
            Some(
                path.vertices
                    .iter()
                    .enumerate()
                    .skip(1)
                    .filter(|(_, v)| !v.is_specular_surface())
                    .map(|(i, _)| i)
                    .collect(),
            )
        }
    }
}

/// Veach's perturbation: exponentially distributed radius between
/// `radius.0` and `radius.1`, uniform direction, wrapped around the
/// unit torus so the move is symmetric.
pub fn perturb(u: &Point2f, radius: (Float, Float), sampler: &mut dyn Sampler) -> Point2f {
    let (r_min, r_max) = radius;
    let r: Float = r_max * (-(r_max / r_min).ln() * sampler.get_1d()).exp();
    let phi: Float = 2.0 as Float * PI * sampler.get_1d();
    Point2f {
        x: wrap_unit(u.x + r * phi.cos()),
        y: wrap_unit(u.y + r * phi.sin()),
    }
}

fn pow_half(k: usize) -> Float {
    (0.5 as Float).powi(k as i32)
}

/// Probability of deleting `kd` of `n` vertices, proportional to
/// `2^-kd`.
pub fn deletion_pmf(kd: usize, n: usize) -> Float {
    if kd == 0 || kd > n {
        return 0.0 as Float;
    }
    pow_half(kd) / (1.0 as Float - pow_half(n))
}

fn sample_deletion(n: usize, u: Float) -> usize {
    let mut cumulative: Float = 0.0 as Float;
    for kd in 1..=n {
        cumulative += deletion_pmf(kd, n);
        if u < cumulative {
            return kd;
        }
    }
    n
}

/// Numbers of vertices that may be inserted after deleting down to
/// `kept` vertices, or `None` if no length in `lengths` is reachable.
pub fn insertion_range(kept: usize, lengths: &PathLengths) -> Option<(usize, Option<usize>)> {
    let ka_min: usize = lengths.min_vertices.saturating_sub(kept).max(1);
    match lengths.max_vertices {
        Some(max) => {
            if max < kept + ka_min {
                None
            } else {
                Some((ka_min, Some(max - kept)))
            }
        }
        None => Some((ka_min, None)),
    }
}

/// Sum of `2^-|ka - kd|` over the insertion range.
pub fn insertion_norm(kd: usize, ka_min: usize, ka_max: Option<usize>) -> Float {
    let weight = |ka: usize| pow_half(if ka > kd { ka - kd } else { kd - ka });
    match ka_max {
        Some(max) => (ka_min..=max).map(weight).sum(),
        None => {
            let m: usize = ka_min.max(kd);
            let head: Float = (ka_min..m).map(weight).sum();
            // geometric tail from m on
            head + 2.0 as Float * pow_half(m - kd)
        }
    }
}

fn sample_insertion(kd: usize, ka_min: usize, ka_max: Option<usize>, u: Float) -> usize {
    let target: Float = u * insertion_norm(kd, ka_min, ka_max);
    let mut cumulative: Float = 0.0 as Float;
    let mut ka: usize = ka_min;
    loop {
        let term: Float = pow_half(if ka > kd { ka - kd } else { kd - ka });
        cumulative += term;
        if target < cumulative || ka_max.map_or(false, |max| ka >= max) {
            return ka;
        }
        if ka > kd && term < 1.0e-12 as Float {
            return ka;
        }
        ka += 1;
    }
}

/// Proposal and acceptance counters per strategy.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct MutationStats {
    pub proposed: [u64; 5],
    pub accepted: [u64; 5],
    /// Iterations without a usable proposal.
    pub failed: u64,
}

impl MutationStats {
    pub fn record(&mut self, kind: MutationKind, accepted: bool) {
        self.proposed[kind.index()] += 1;
        if accepted {
            self.accepted[kind.index()] += 1;
        }
    }
    pub fn merge(&mut self, other: &MutationStats) {
        for i in 0..5 {
            self.proposed[i] += other.proposed[i];
            self.accepted[i] += other.accepted[i];
        }
        self.failed += other.failed;
    }
    pub fn acceptance_rate(&self, kind: MutationKind) -> Float {
        let proposed: u64 = self.proposed[kind.index()];
        if proposed == 0 {
            0.0 as Float
        } else {
            self.accepted[kind.index()] as Float / proposed as Float
        }
    }
    pub fn log(&self, enabled: &[MutationKind]) {
        for kind in enabled {
            info!(
                "{}: {} proposed, {:.1}% accepted",
                kind,
                self.proposed[kind.index()],
                100.0 as Float * self.acceptance_rate(*kind)
            );
        }
        if self.failed > 0 {
            info!("Iterations without a proposal: {}", self.failed);
        }
    }
}
