//! A scene with a closed-form solution.
//!
//! Every vertex contributes an independent factor: the sensor a
//! horizontal gradient `0.5 + x` (plus an optional bright spot), every
//! surface vertex either its diffuse or its specular albedo (chosen by
//! the first coordinate), and the emitter its emission times `2y`. The
//! image integral therefore reduces to a geometric series in the mean
//! albedo, which makes the scene useful as ground truth.

// std
use std::sync::Arc;
// pbrt
use crate::core::geometry::{Point2f, Point2i, Vector2i};
use crate::core::pbrt::{Float, Spectrum, PI};
use crate::core::sampler::SamplerKind;
use crate::core::scene::{PathVertex, Scene, VertexKind};

/// A disc on the sensor (wrapping around the image borders) that adds
/// `gain` to the sensor factor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spot {
    pub center: Point2f,
    pub radius: Float,
    pub gain: Float,
}

impl Spot {
    fn contains(&self, u: &Point2f) -> bool {
        let mut dx: Float = (u.x - self.center.x).abs();
        let mut dy: Float = (u.y - self.center.y).abs();
        dx = dx.min(1.0 as Float - dx);
        dy = dy.min(1.0 as Float - dy);
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Debug, Clone)]
pub struct AnalyticScene {
    crop: Vector2i,
    sample_count: u32,
    sampler_kind: SamplerKind,
    subsurface_integrators: usize,
    resizable: bool,
    emission: Spectrum,
    diffuse: Spectrum,
    specular: Spectrum,
    specular_fraction: Float,
    spot: Option<Spot>,
}

impl AnalyticScene {
    pub fn new(crop: Vector2i, sample_count: u32) -> Self {
        AnalyticScene {
            crop,
            sample_count,
            sampler_kind: SamplerKind::Independent,
            subsurface_integrators: 0,
            resizable: true,
            emission: Spectrum::new(1.0),
            diffuse: Spectrum::new(0.5),
            specular: Spectrum::new(0.8),
            specular_fraction: 0.25,
            spot: None,
        }
    }
    pub fn with_emission(mut self, emission: Spectrum) -> Self {
        self.emission = emission;
        self
    }
    /// Surface vertices with a first coordinate below
    /// `specular_fraction` are specular.
    pub fn with_albedo(mut self, diffuse: Spectrum, specular: Spectrum, specular_fraction: Float) -> Self {
        self.diffuse = diffuse;
        self.specular = specular;
        self.specular_fraction = specular_fraction;
        self
    }
    /// The radius must not exceed 0.5.
    pub fn with_spot(mut self, spot: Spot) -> Self {
        self.spot = Some(spot);
        self
    }
    pub fn with_sampler(mut self, kind: SamplerKind) -> Self {
        self.sampler_kind = kind;
        self
    }
    pub fn with_subsurface_integrators(mut self, count: usize) -> Self {
        self.subsurface_integrators = count;
        self
    }
    /// Refuse to produce resized copies (makes two-stage MLT fail).
    pub fn fixed_size(mut self) -> Self {
        self.resizable = false;
        self
    }
    fn sensor_factor(&self, u: &Point2f) -> Float {
        let mut s: Float = 0.5 as Float + u.x;
        if let Some(ref spot) = self.spot {
            if spot.contains(u) {
                s += spot.gain;
            }
        }
        s
    }
    fn mean_sensor_factor(&self) -> Float {
        match self.spot {
            Some(ref spot) => 1.0 as Float + spot.gain * PI * spot.radius * spot.radius,
            None => 1.0 as Float,
        }
    }
    fn mean_albedo(&self) -> Spectrum {
        self.specular * self.specular_fraction
            + self.diffuse * (1.0 as Float - self.specular_fraction)
    }
    /// Σ m^s over the surface vertex counts of paths with
    /// `min_edges..=max_edges` edges.
    fn series(&self, min_edges: usize, max_edges: Option<usize>) -> Spectrum {
        let m: Spectrum = self.mean_albedo();
        let s_min: usize = min_edges.max(1) - 1;
        let mut result = Spectrum::default();
        for c in 0..3 {
            let mc: Float = m.c[c];
            result.c[c] = match max_edges {
                Some(max_edges) => {
                    if max_edges < min_edges.max(1) {
                        0.0 as Float
                    } else {
                        (s_min..max_edges).map(|s| mc.powi(s as i32)).sum()
                    }
                }
                None => mc.powi(s_min as i32) / (1.0 as Float - mc),
            };
        }
        result
    }
    /// Average pixel value of paths with `min_edges..=max_edges` edges
    /// (`None`: unbounded, requires albedos below one).
    pub fn expected_mean(&self, min_edges: usize, max_edges: Option<usize>) -> Spectrum {
        self.emission * self.series(min_edges, max_edges) * self.mean_sensor_factor()
    }
    pub fn expected_luminance(&self, min_edges: usize, max_edges: Option<usize>) -> Float {
        self.expected_mean(min_edges, max_edges).y()
    }
    /// Value of pixel `p`; the sensor factor is integrated over the
    /// pixel with a 16x16 midpoint rule when a spot is present.
    pub fn expected_pixel(&self, p: &Point2i, min_edges: usize, max_edges: Option<usize>) -> Spectrum {
        let n: usize = 16;
        let mut sensor: Float = 0.0 as Float;
        for j in 0..n {
            for i in 0..n {
                let u = Point2f {
                    x: (p.x as Float + (i as Float + 0.5) / n as Float) / self.crop.x as Float,
                    y: (p.y as Float + (j as Float + 0.5) / n as Float) / self.crop.y as Float,
                };
                sensor += self.sensor_factor(&u);
            }
        }
        sensor /= (n * n) as Float;
        self.emission * self.series(min_edges, max_edges) * sensor
    }
}

impl Scene for AnalyticScene {
    fn crop_size(&self) -> Vector2i {
        self.crop
    }
    fn sampler_kind(&self) -> SamplerKind {
        self.sampler_kind
    }
    fn sample_count(&self) -> u32 {
        self.sample_count
    }
    fn subsurface_integrator_count(&self) -> usize {
        self.subsurface_integrators
    }
    fn with_crop_size(&self, size: Vector2i) -> Option<Arc<dyn Scene>> {
        if !self.resizable {
            return None;
        }
        let mut scene: AnalyticScene = self.clone();
        scene.crop = size;
        Some(Arc::new(scene))
    }
    fn trace(&self, vertices: &mut [PathVertex]) -> Spectrum {
        let mut f: Spectrum = Spectrum::new(1.0);
        for v in vertices.iter_mut() {
            match v.kind {
                VertexKind::Sensor => f = f * self.sensor_factor(&v.u),
                VertexKind::Surface => {
                    v.specular = v.u.x < self.specular_fraction;
                    f = f * if v.specular { self.specular } else { self.diffuse };
                }
                VertexKind::Emitter => f = f * self.emission * (2.0 as Float * v.u.y),
            }
        }
        f
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn series_matches_direct_sum() {
        let scene = AnalyticScene::new(Vector2i::new(4, 4), 1);
        // mean albedo 0.575
        let m: Float = 0.575;
        let expected: Float = 1.0 + m + m * m;
        assert!((scene.expected_luminance(1, Some(3)) - expected).abs() < 1.0e-5);
        let tail: Float = m * m / (1.0 - m);
        assert!((scene.expected_luminance(3, None) - tail).abs() < 1.0e-5);
        assert_eq!(scene.expected_luminance(4, Some(3)), 0.0);
    }

    #[test]
    fn trace_classifies_surfaces() {
        let scene = AnalyticScene::new(Vector2i::new(4, 4), 1);
        let mut vertices = [
            PathVertex::new(VertexKind::Sensor, Point2f { x: 0.5, y: 0.5 }),
            PathVertex::new(VertexKind::Surface, Point2f { x: 0.1, y: 0.5 }),
            PathVertex::new(VertexKind::Surface, Point2f { x: 0.9, y: 0.5 }),
            PathVertex::new(VertexKind::Emitter, Point2f { x: 0.5, y: 0.25 }),
        ];
        let f = scene.trace(&mut vertices);
        assert!(vertices[1].specular);
        assert!(!vertices[2].specular);
        // 1.0 * 0.8 * 0.5 * 0.5
        assert!((f.y() - 0.2).abs() < 1.0e-5);
    }

    #[test]
    fn pixel_expectations_average_to_mean() {
        let scene = AnalyticScene::new(Vector2i::new(8, 4), 1).with_spot(Spot {
            center: Point2f { x: 0.3, y: 0.6 },
            radius: 0.2,
            gain: 2.0,
        });
        let mut sum: Float = 0.0;
        for y in 0..4 {
            for x in 0..8 {
                sum += scene.expected_pixel(&Point2i { x, y }, 1, Some(2)).y();
            }
        }
        let mean = sum / 32.0;
        let expected = scene.expected_luminance(1, Some(2));
        assert!((mean - expected).abs() / expected < 0.01);
    }

    #[test]
    fn resized_copy_keeps_materials() {
        let scene = AnalyticScene::new(Vector2i::new(64, 32), 4);
        let small = scene.with_crop_size(Vector2i::new(4, 2)).unwrap();
        assert_eq!(small.crop_size(), Vector2i::new(4, 2));
        assert_eq!(small.sample_count(), 4);
        assert!(scene.fixed_size().with_crop_size(Vector2i::new(1, 1)).is_none());
    }
}
