//! Metropolis Light Transport
//!
//! The integrator estimates the image by running many independent
//! Markov chains in path space. A chain spends time in a region of path
//! space in proportion to the luminance carried by its paths, so every
//! iteration deposits a constant amount of energy, normalized by the
//! average image luminance, which is estimated up front.
//!
//! A cancellation requested while no render is running applies to the
//! next render.
//!
//! A render goes through these steps:
//!
//! 1. *Two-stage MLT* (optional): render a smaller version of the image
//!    first and turn it into an importance map. The chains of the second
//!    stage sample luminance divided by that map, which moves effort
//!    from bright to dark regions of the image.
//! 2. *Direct illumination* (optional): paths with one or two edges are
//!    rendered by a separate, cheaper estimator.
//! 3. *Seeding*: a warm-up pass and a recorded pass of the bidirectional
//!    path sampler estimate the normalization of the chain target and
//!    pick one seed path per work unit, proportionally to its target.
//! 4. *Sampling*: one chain per seed, in parallel, each with its own
//!    image buffer.
//! 5. *Merge*: the buffers are added up, normalized and combined with
//!    the direct illumination image.

pub mod chain;
pub mod config;
pub mod importance;
pub mod mutator;
pub mod path;
pub mod pathsampler;
pub mod process;
pub mod seeds;

// std
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
// others
use log::{error, info, warn};
// pbrt
use crate::core::error::{RenderError, Result};
use crate::core::film::ImageBuffer;
use crate::core::geometry::Vector2i;
use crate::core::integrator::Integrator;
use crate::core::parallel::{CancelToken, ProcessStatus, Scheduler};
use crate::core::paramset::ParamSet;
use crate::core::sampler::SamplerKind;
use crate::core::scene::Scene;
use crate::integrators::directlighting::DirectIlluminationRenderer;
use crate::integrators::mlt::config::MLTConfiguration;
use crate::integrators::mlt::importance::ImportanceMap;
use crate::integrators::mlt::pathsampler::BidirectionalPathSampler;
use crate::integrators::mlt::process::MLTProcess;
use crate::integrators::mlt::seeds::{generate_seeds, PathSeed};
use crate::samplers::replayable::ReplayableSampler;

/// Terminal state of a render that did not fail.
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Finished(ImageBuffer),
    Cancelled,
}

pub struct MLTIntegrator {
    config: MLTConfiguration,
    num_threads: usize,
    show_progress: bool,
    active: Mutex<Option<CancelToken>>,
    pending_cancel: AtomicBool,
    film: Mutex<Option<ImageBuffer>>,
}

impl MLTIntegrator {
    pub fn new(config: MLTConfiguration, num_threads: usize) -> Self {
        MLTIntegrator {
            config,
            num_threads,
            show_progress: false,
            active: Mutex::new(None),
            pending_cancel: AtomicBool::new(false),
            film: Mutex::new(None),
        }
    }
    pub fn create(params: &ParamSet, num_threads: usize) -> Result<Self> {
        let config = MLTConfiguration::from_params(params)?;
        Ok(MLTIntegrator::new(config, num_threads))
    }
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
    pub fn config(&self) -> &MLTConfiguration {
        &self.config
    }
    /// Render with a fresh cancellation token that honours the
    /// configured timeout and can be tripped by [`Integrator::cancel`].
    pub fn render_image(&self, scene: &Arc<dyn Scene>) -> Result<RenderOutcome> {
        let token = CancelToken::with_timeout(self.config.timeout);
        if let Ok(mut active) = self.active.lock() {
            if self.pending_cancel.swap(false, Ordering::SeqCst) {
                token.cancel();
            }
            *active = Some(token.clone());
        }
        let outcome = self.render_stage(scene, &self.config, &token);
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
        outcome
    }
    /// One complete MLT pass over `scene`. Calls itself once, with
    /// `first_stage` set, to produce the importance map of two-stage
    /// MLT.
    pub fn render_stage(
        &self,
        scene: &Arc<dyn Scene>,
        config: &MLTConfiguration,
        token: &CancelToken,
    ) -> Result<RenderOutcome> {
        config.validate()?;
        if token.is_cancelled() {
            return Ok(RenderOutcome::Cancelled);
        }
        let nested: bool = config.first_stage;
        let crop: Vector2i = scene.crop_size();
        let mut config: MLTConfiguration = config.clone();
        if config.two_stage && !nested {
            let reduction: i32 = config.first_stage_size_reduction;
            let size = Vector2i::new((crop.x / reduction).max(1), (crop.y / reduction).max(1));
            info!("Executing first MLT stage at {}x{}", size.x, size.y);
            let small: Arc<dyn Scene> = scene.with_crop_size(size).ok_or_else(|| {
                RenderError::FirstStage(format!("scene cannot be resized to {}x{}", size.x, size.y))
            })?;
            let first = MLTConfiguration {
                first_stage: true,
                importance_map: None,
                ..config.clone()
            };
            let start = Instant::now();
            let image: ImageBuffer = match self.render_stage(&small, &first, token) {
                Ok(RenderOutcome::Finished(image)) => image,
                Ok(RenderOutcome::Cancelled) => return Ok(RenderOutcome::Cancelled),
                Err(e) => return Err(RenderError::FirstStage(e.to_string())),
            };
            info!(
                "First MLT stage took {:.2} s",
                start.elapsed().as_secs_f64()
            );
            config.importance_map = Some(Arc::new(ImportanceMap::from_image(&image)));
        }
        let direct: Option<ImageBuffer> =
            if config.separate_direct && config.direct_samples > 0 && !nested {
                let renderer = DirectIlluminationRenderer::new(
                    config.max_depth,
                    config.direct_samples as u32,
                    self.num_threads,
                )
                .with_progress(self.show_progress);
                match renderer.render(scene.as_ref(), token)? {
                    Some(image) => Some(image),
                    None => return Ok(RenderOutcome::Cancelled),
                }
            } else {
                None
            };
        let (work_units, n_mutations) = config.work_distribution(crop, scene.sample_count());
        config.work_units = work_units as i64;
        config.n_mutations = n_mutations;
        let lengths = config.path_lengths();
        if lengths.is_empty() || crop.area() == 0 {
            info!("No path lengths left for the Markov chains");
            let mut image = ImageBuffer::new(crop);
            if let Some(ref direct) = direct {
                image.merge(direct);
            }
            return Ok(RenderOutcome::Finished(image));
        }
        if token.is_cancelled() {
            return Ok(RenderOutcome::Cancelled);
        }
        // warm-up pass, then the pass the seeds are recorded in
        let mut rpl_sampler = ReplayableSampler::new(config.seed);
        let mut seeds: Vec<PathSeed> = Vec::new();
        let luminance = {
            let path_sampler = BidirectionalPathSampler::new(scene.as_ref(), lengths);
            let n_samples: usize = config.luminance_samples as usize;
            generate_seeds(
                &path_sampler,
                config.importance_map.as_deref(),
                &mut rpl_sampler,
                n_samples,
                work_units as usize,
                false,
                &mut seeds,
            );
            generate_seeds(
                &path_sampler,
                config.importance_map.as_deref(),
                &mut rpl_sampler,
                n_samples,
                work_units as usize,
                true,
                &mut seeds,
            )
        };
        if luminance <= 0.0 {
            warn!("Luminance estimate is zero, the chains will produce a black image");
        }
        config.luminance = luminance;
        if !nested {
            config.dump();
        }
        if token.is_cancelled() {
            return Ok(RenderOutcome::Cancelled);
        }
        let process = Arc::new(MLTProcess::new(
            Arc::new(config),
            scene.clone(),
            rpl_sampler,
            seeds,
        )?);
        let scheduler = Scheduler::new(self.num_threads).with_progress(self.show_progress && !nested);
        info!(
            "Running {} Markov chains on {} thread(s) ...",
            work_units,
            scheduler.core_count()
        );
        let job = scheduler.schedule(process.clone(), token.clone());
        let outcome = scheduler.wait(job);
        match outcome.status {
            ProcessStatus::Success => Ok(RenderOutcome::Finished(
                process.develop(outcome.results, direct.as_ref()),
            )),
            ProcessStatus::Cancelled => Ok(RenderOutcome::Cancelled),
            ProcessStatus::Failure => Err(RenderError::ProcessFailed("MLT".to_string())),
        }
    }
}

impl Integrator for MLTIntegrator {
    fn preprocess(&self, scene: &dyn Scene) -> Result<()> {
        let subsurface: usize = scene.subsurface_integrator_count();
        if subsurface > 0 {
            return Err(RenderError::SubsurfaceIntegrators(subsurface));
        }
        let kind: SamplerKind = scene.sampler_kind();
        if kind != SamplerKind::Independent {
            return Err(RenderError::UnsupportedSampler(kind.name().to_string()));
        }
        self.config.validate()
    }
    fn render(&self, scene: &Arc<dyn Scene>) -> bool {
        let start = Instant::now();
        match self.render_image(scene) {
            Ok(RenderOutcome::Finished(image)) => {
                info!(
                    "MLT rendering finished in {:.2} s",
                    start.elapsed().as_secs_f64()
                );
                if let Ok(mut film) = self.film.lock() {
                    *film = Some(image);
                }
                true
            }
            Ok(RenderOutcome::Cancelled) => {
                info!("MLT rendering cancelled");
                false
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }
    fn cancel(&self) {
        if let Ok(active) = self.active.lock() {
            match *active {
                Some(ref token) => token.cancel(),
                None => self.pending_cancel.store(true, Ordering::SeqCst),
            }
        }
    }
    fn take_image(&self) -> Option<ImageBuffer> {
        self.film.lock().ok().and_then(|mut film| film.take())
    }
}
