//! The **Scene** is the renderer's view of everything outside the
//! Metropolis core: geometry, materials, emitters and the sensor are
//! hidden behind a single evaluation routine for light paths.
//!
//! A light path is a chain of vertices from the sensor (first) to an
//! emitter (last). Every vertex is addressed by two primary coordinates
//! in [0, 1)²; the scene maps them to positions and directions, fills in
//! what kind of interaction each vertex turned out to be and returns the
//! path contribution. The raster position of a path is determined by
//! the coordinates of its sensor vertex.

// std
use std::sync::Arc;
// pbrt
use crate::core::geometry::{Bounds2i, Point2f, Vector2i};
use crate::core::pbrt::Spectrum;
use crate::core::sampler::SamplerKind;

// see scene.h

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum VertexKind {
    Sensor,
    Surface,
    Emitter,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathVertex {
    /// Primary sample coordinates the vertex was generated from.
    pub u: Point2f,
    pub kind: VertexKind,
    /// Set by [`Scene::trace`] for surface vertices with a delta BSDF.
    pub specular: bool,
}

impl PathVertex {
    pub fn new(kind: VertexKind, u: Point2f) -> Self {
        PathVertex {
            u,
            kind,
            specular: false,
        }
    }
    /// Non-specular surface interaction.
    pub fn is_diffuse_surface(&self) -> bool {
        self.kind == VertexKind::Surface && !self.specular
    }
    pub fn is_specular_surface(&self) -> bool {
        self.kind == VertexKind::Surface && self.specular
    }
}

pub trait Scene: Send + Sync {
    /// Resolution of the image region being rendered.
    fn crop_size(&self) -> Vector2i;
    fn sampler_kind(&self) -> SamplerKind;
    /// Samples per pixel requested for the sensor.
    fn sample_count(&self) -> u32;
    fn subsurface_integrator_count(&self) -> usize {
        0
    }
    /// The same scene with a different crop window, used by the first
    /// stage of two-stage MLT. `None` if the scene cannot be resized.
    fn with_crop_size(&self, size: Vector2i) -> Option<Arc<dyn Scene>>;
    /// Classify the vertices and evaluate the path contribution. The
    /// slice starts at the sensor and ends at an emitter; a zero
    /// spectrum means the path carries no light.
    fn trace(&self, vertices: &mut [PathVertex]) -> Spectrum;
    fn sample_bounds(&self) -> Bounds2i {
        Bounds2i::from_size(&self.crop_size())
    }
}
