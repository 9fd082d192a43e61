//! Light paths as seen by the Markov chains.

// others
use smallvec::SmallVec;
// pbrt
use crate::core::geometry::{Bounds2f, Point2f};
use crate::core::pbrt::{Float, Spectrum};
use crate::core::scene::{PathVertex, Scene, VertexKind};

pub type VertexList = SmallVec<[PathVertex; 8]>;

/// Range of vertex counts a set of paths is restricted to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PathLengths {
    pub min_vertices: usize,
    /// `None` for unbounded paths.
    pub max_vertices: Option<usize>,
}

impl PathLengths {
    pub fn new(min_vertices: usize, max_vertices: Option<usize>) -> Self {
        PathLengths {
            min_vertices: min_vertices.max(2),
            max_vertices,
        }
    }
    pub fn is_empty(&self) -> bool {
        match self.max_vertices {
            Some(max) => max < self.min_vertices,
            None => false,
        }
    }
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min_vertices && self.max_vertices.map_or(true, |max| n <= max)
    }
}

/// A fully evaluated path from the sensor (first vertex) to an emitter
/// (last vertex).
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub vertices: VertexList,
    /// Path-space contribution; zero when the scene returned NaN or
    /// infinite values.
    pub contribution: Spectrum,
    /// Luminance of `contribution`.
    pub luminance: Float,
    /// Raster position determined by the sensor vertex.
    pub p_raster: Point2f,
    /// Reciprocal probability of the sampling decisions that are not
    /// part of the path-space measure (the choice of the path length).
    pub weight: Float,
}

impl Path {
    /// Assign vertex kinds by position, let the scene classify and
    /// evaluate the path.
    pub fn evaluate(scene: &dyn Scene, mut vertices: VertexList) -> Path {
        let n: usize = vertices.len();
        for (i, v) in vertices.iter_mut().enumerate() {
            v.kind = if i == 0 {
                VertexKind::Sensor
            } else if i + 1 == n {
                VertexKind::Emitter
            } else {
                VertexKind::Surface
            };
            v.specular = false;
        }
        let mut contribution: Spectrum = if n >= 2 {
            scene.trace(&mut vertices)
        } else {
            Spectrum::default()
        };
        let mut luminance: Float = contribution.y();
        if !contribution.is_valid() || !luminance.is_finite() || luminance < 0.0 as Float {
            contribution = Spectrum::default();
            luminance = 0.0 as Float;
        }
        let bounds: Bounds2f = scene.sample_bounds().to_float();
        let p_raster: Point2f = match vertices.first() {
            Some(sensor) => bounds.lerp(&sensor.u),
            None => bounds.p_min,
        };
        Path {
            vertices,
            contribution,
            luminance,
            p_raster,
            weight: 1.0 as Float,
        }
    }
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
    /// Number of edges.
    pub fn depth(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }
    /// Luminance times the sampling weight; zero if not finite.
    pub fn weighted_luminance(&self) -> Float {
        let w: Float = self.luminance * self.weight;
        if w.is_finite() {
            w
        } else {
            0.0 as Float
        }
    }
    pub fn has_specular(&self) -> bool {
        self.vertices.iter().any(|v| v.is_specular_surface())
    }
    /// Indices of the non-specular surface vertices, sensor side first.
    pub fn diffuse_surfaces(&self) -> SmallVec<[usize; 8]> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_diffuse_surface())
            .map(|(i, _)| i)
            .collect()
    }
    /// First non-specular surface vertex seen from the sensor through
    /// a (possibly empty) chain of specular vertices.
    pub fn first_diffuse_from_sensor(&self) -> Option<usize> {
        for (i, v) in self.vertices.iter().enumerate().skip(1) {
            if v.is_diffuse_surface() {
                return Some(i);
            }
            if !v.is_specular_surface() {
                return None;
            }
        }
        None
    }
    /// `L S+ D E`: the vertex next to the sensor is diffuse and every
    /// other surface vertex is specular.
    pub fn is_caustic(&self) -> bool {
        let n: usize = self.vertices.len();
        if n < 4 || !self.vertices[1].is_diffuse_surface() {
            return false;
        }
        self.vertices[2..n - 1].iter().all(|v| v.is_specular_surface())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::Vector2i;
    use crate::core::sampler::SamplerKind;
    use std::sync::Arc;

    // surface vertices with u.x < 0.5 are specular
    struct Classifier;

    impl Scene for Classifier {
        fn crop_size(&self) -> Vector2i {
            Vector2i::new(10, 5)
        }
        fn sampler_kind(&self) -> SamplerKind {
            SamplerKind::Independent
        }
        fn sample_count(&self) -> u32 {
            1
        }
        fn with_crop_size(&self, _size: Vector2i) -> Option<Arc<dyn Scene>> {
            None
        }
        fn trace(&self, vertices: &mut [PathVertex]) -> Spectrum {
            for v in vertices.iter_mut() {
                v.specular = v.kind == VertexKind::Surface && v.u.x < 0.5;
            }
            Spectrum::new(vertices[0].u.y)
        }
    }

    fn path(xs: &[Float]) -> Path {
        let vertices: VertexList = xs
            .iter()
            .map(|x| PathVertex::new(VertexKind::Surface, Point2f { x: *x, y: 0.5 }))
            .collect();
        Path::evaluate(&Classifier, vertices)
    }

    #[test]
    fn evaluate_assigns_kinds_and_raster() {
        let p = path(&[0.25, 0.9, 0.1, 0.7]);
        assert_eq!(p.vertices[0].kind, VertexKind::Sensor);
        assert_eq!(p.vertices[3].kind, VertexKind::Emitter);
        assert!(p.vertices[2].is_specular_surface());
        assert!(p.vertices[1].is_diffuse_surface());
        assert_eq!(p.p_raster, Point2f { x: 2.5, y: 2.5 });
        assert_eq!(p.depth(), 3);
    }

    #[test]
    fn classification_helpers() {
        // sensor, specular, diffuse, emitter
        let p = path(&[0.5, 0.1, 0.9, 0.5]);
        assert_eq!(p.first_diffuse_from_sensor(), Some(2));
        assert!(!p.is_caustic());
        assert!(p.has_specular());
        // sensor, diffuse, specular, emitter
        let p = path(&[0.5, 0.9, 0.1, 0.5]);
        assert!(p.is_caustic());
        assert_eq!(p.diffuse_surfaces().as_slice(), &[1]);
        // sensor, emitter
        let p = path(&[0.5, 0.5]);
        assert_eq!(p.first_diffuse_from_sensor(), None);
    }

    #[test]
    fn length_ranges() {
        let lengths = PathLengths::new(4, Some(6));
        assert!(!lengths.contains(3));
        assert!(lengths.contains(6));
        assert!(!lengths.contains(7));
        assert!(PathLengths::new(4, Some(2)).is_empty());
        assert!(PathLengths::new(2, None).contains(1000));
    }

    #[test]
    fn invalid_contribution_is_zeroed() {
        struct Broken;
        impl Scene for Broken {
            fn crop_size(&self) -> Vector2i {
                Vector2i::new(1, 1)
            }
            fn sampler_kind(&self) -> SamplerKind {
                SamplerKind::Independent
            }
            fn sample_count(&self) -> u32 {
                1
            }
            fn with_crop_size(&self, _size: Vector2i) -> Option<Arc<dyn Scene>> {
                None
            }
            fn trace(&self, _vertices: &mut [PathVertex]) -> Spectrum {
                Spectrum::rgb(Float::NAN, 1.0, Float::INFINITY)
            }
        }
        let vertices: VertexList = (0..3)
            .map(|_| PathVertex::new(VertexKind::Surface, Point2f { x: 0.5, y: 0.5 }))
            .collect();
        let p = Path::evaluate(&Broken, vertices);
        assert_eq!(p.luminance, 0.0);
        assert!(p.contribution.is_black());
    }
}
