//! Direct illumination: paths with one edge (emitters seen directly)
//! and two edges (light reflected once towards the sensor), estimated
//! independently per pixel with jittered sensor positions.

// std
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
// others
use log::{error, info};
// pbrt
use crate::blockqueue::BlockQueue;
use crate::core::error::{RenderError, Result};
use crate::core::film::ImageBuffer;
use crate::core::geometry::{Bounds2i, Point2f, Point2i, Vector2i};
use crate::core::integrator::Integrator;
use crate::core::parallel::CancelToken;
use crate::core::pbrt::{Float, Spectrum};
use crate::core::sampler::Sampler;
use crate::core::scene::{PathVertex, Scene, VertexKind};
use crate::integrators::mlt::path::{Path, VertexList};
use crate::samplers::random::RandomSampler;

/// Image tiles are `TILE_SIZE` x `TILE_SIZE` pixels.
pub const TILE_SIZE: i32 = 16;

/// Longest path (in edges) counted as direct illumination.
pub const DIRECT_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub struct DirectIlluminationRenderer {
    max_depth: i32,
    samples: u32,
    num_threads: usize,
    show_progress: bool,
}

impl DirectIlluminationRenderer {
    pub fn new(max_depth: i32, samples: u32, num_threads: usize) -> Self {
        DirectIlluminationRenderer {
            max_depth,
            samples,
            num_threads,
            show_progress: false,
        }
    }
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }
    /// Render the direct component of `scene`; `Ok(None)` if `token`
    /// was cancelled before all tiles were done.
    pub fn render(&self, scene: &dyn Scene, token: &CancelToken) -> Result<Option<ImageBuffer>> {
        let crop: Vector2i = scene.crop_size();
        if crop.x <= 0 || crop.y <= 0 {
            return Err(RenderError::DirectIllumination(format!(
                "empty crop window ({}x{})",
                crop.x, crop.y
            )));
        }
        let n_tiles: Point2i = Point2i {
            x: (crop.x + TILE_SIZE - 1) / TILE_SIZE,
            y: (crop.y + TILE_SIZE - 1) / TILE_SIZE,
        };
        let block_queue = BlockQueue::new(
            (crop.x as u32, crop.y as u32),
            (TILE_SIZE as u32, TILE_SIZE as u32),
        );
        let num_cores: usize = if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        };
        let num_cores: usize = num_cores.min(block_queue.len()).max(1);
        info!(
            "Rendering direct illumination ({} samples) with {} thread(s) ...",
            self.samples, num_cores
        );
        let mut image = ImageBuffer::new(crop);
        let mut tiles_done: usize = 0;
        {
            let bq = &block_queue;
            let image = &mut image;
            let tiles_done = &mut tiles_done;
            crossbeam::scope(|scope| {
                let (pixel_tx, pixel_rx) = crossbeam_channel::bounded(num_cores);
                // spawn worker threads
                for _ in 0..num_cores {
                    let pixel_tx = pixel_tx.clone();
                    scope.spawn(move |_| {
                        let mut tile_sampler = RandomSampler::default();
                        while let Some((x, y)) = bq.next() {
                            if token.is_cancelled() {
                                break;
                            }
                            let tile: Point2i = Point2i {
                                x: x as i32,
                                y: y as i32,
                            };
                            let seed: i32 = tile.y * n_tiles.x + tile.x;
                            tile_sampler.reseed(seed as u64);
                            let x0: i32 = tile.x * TILE_SIZE;
                            let x1: i32 = std::cmp::min(x0 + TILE_SIZE, crop.x);
                            let y0: i32 = tile.y * TILE_SIZE;
                            let y1: i32 = std::cmp::min(y0 + TILE_SIZE, crop.y);
                            let tile_bounds: Bounds2i =
                                Bounds2i::new(Point2i { x: x0, y: y0 }, Point2i { x: x1, y: y1 });
                            let mut film_tile: Vec<(Point2i, Spectrum)> =
                                Vec::with_capacity(tile_bounds.area().max(0) as usize);
                            for pixel in &tile_bounds {
                                if token.is_cancelled() {
                                    break;
                                }
                                let l: Spectrum = self.estimate(scene, &pixel, &mut tile_sampler);
                                film_tile.push((pixel, l));
                            }
                            // send the tile through the channel to main thread
                            if pixel_tx.send(film_tile).is_err() {
                                break;
                            }
                        }
                    });
                }
                drop(pixel_tx);
                let mut progress = if self.show_progress {
                    Some(pbr::ProgressBar::new(bq.len() as u64))
                } else {
                    None
                };
                // merge image tiles as they come in
                for film_tile in pixel_rx.iter() {
                    for (pixel, l) in film_tile.iter() {
                        image.put(pixel, l);
                    }
                    *tiles_done += 1;
                    if let Some(ref mut pb) = progress {
                        pb.inc();
                    }
                }
                if let Some(ref mut pb) = progress {
                    pb.finish();
                }
            })
            .map_err(|_| RenderError::DirectIllumination("worker thread panicked".to_string()))?;
        }
        if token.is_cancelled() || tiles_done < block_queue.len() {
            return Ok(None);
        }
        Ok(Some(image))
    }
    /// Average contribution of the direct paths through `pixel`.
    pub fn estimate(&self, scene: &dyn Scene, pixel: &Point2i, sampler: &mut dyn Sampler) -> Spectrum {
        let crop: Vector2i = scene.crop_size();
        let max_edges: usize = if self.max_depth < 0 {
            DIRECT_DEPTH
        } else {
            DIRECT_DEPTH.min(self.max_depth as usize)
        };
        if self.samples == 0 || max_edges == 0 {
            return Spectrum::default();
        }
        let mut l: Spectrum = Spectrum::default();
        for _ in 0..self.samples {
            let jitter: Point2f = sampler.get_2d();
            let u: Point2f = Point2f {
                x: (pixel.x as Float + jitter.x) / crop.x as Float,
                y: (pixel.y as Float + jitter.y) / crop.y as Float,
            };
            for edges in 1..=max_edges {
                let mut vertices: VertexList = VertexList::new();
                vertices.push(PathVertex::new(VertexKind::Sensor, u));
                for _ in 1..edges {
                    vertices.push(PathVertex::new(VertexKind::Surface, sampler.get_2d()));
                }
                vertices.push(PathVertex::new(VertexKind::Emitter, sampler.get_2d()));
                l += Path::evaluate(scene, vertices).contribution;
            }
        }
        l * (1.0 as Float / self.samples as Float)
    }
}

/// Renders only the direct component, mostly useful as a quick
/// preview next to MLT.
pub struct DirectLightingIntegrator {
    renderer: DirectIlluminationRenderer,
    active: Mutex<Option<CancelToken>>,
    /// Set by a cancellation that arrived between renders.
    pending_cancel: AtomicBool,
    film: Mutex<Option<ImageBuffer>>,
}

impl DirectLightingIntegrator {
    pub fn new(max_depth: i32, samples: u32, num_threads: usize) -> Self {
        DirectLightingIntegrator {
            renderer: DirectIlluminationRenderer::new(max_depth, samples, num_threads)
                .with_progress(true),
            active: Mutex::new(None),
            pending_cancel: AtomicBool::new(false),
            film: Mutex::new(None),
        }
    }
}

impl Integrator for DirectLightingIntegrator {
    fn preprocess(&self, scene: &dyn Scene) -> Result<()> {
        if scene.crop_size().area() == 0 {
            return Err(RenderError::DirectIllumination("empty crop window".to_string()));
        }
        Ok(())
    }
    fn render(&self, scene: &Arc<dyn Scene>) -> bool {
        let token = CancelToken::new();
        if let Ok(mut active) = self.active.lock() {
            if self.pending_cancel.swap(false, Ordering::SeqCst) {
                token.cancel();
            }
            *active = Some(token.clone());
        }
        let result = self.renderer.render(scene.as_ref(), &token);
        if let Ok(mut active) = self.active.lock() {
            *active = None;
        }
        match result {
            Ok(Some(image)) => {
                if let Ok(mut film) = self.film.lock() {
                    *film = Some(image);
                }
                true
            }
            Ok(None) => {
                info!("Direct illumination rendering cancelled");
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
