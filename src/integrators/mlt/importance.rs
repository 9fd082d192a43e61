//! Importance maps for two-stage MLT.
//!
//! The first stage renders a small version of the image. Its per-pixel
//! luminance becomes a map over the unit square of sensor coordinates.
//! The second stage samples paths in proportion to their luminance
//! divided by the map value at their sensor position, so the chains
//! spend less time in bright regions and the noise is spread more
//! evenly over the image. Seed weights, the luminance estimate and the
//! splat weights all use the same density, which keeps the image
//! unbiased whatever the map looks like.

// pbrt
use crate::core::film::ImageBuffer;
use crate::core::geometry::{Point2f, Vector2i};
use crate::core::pbrt::Float;
use crate::integrators::mlt::path::Path;

/// Every pixel keeps at least this fraction of the mean importance so
/// that no region of the image becomes unreachable.
pub const MIN_RELATIVE_IMPORTANCE: Float = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportanceMap {
    size: Vector2i,
    values: Vec<Float>,
}

impl ImportanceMap {
    /// Wraps raw values; returns `None` unless there is one finite,
    /// non-negative value per pixel.
    pub fn new(size: Vector2i, values: Vec<Float>) -> Option<Self> {
        if size.x <= 0 || size.y <= 0 || values.len() != size.area() {
            return None;
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0 as Float) {
            return None;
        }
        Some(ImportanceMap { size, values })
    }
    /// Build the map from a first-stage image: luminance, floored at
    /// a fraction of the mean and normalized to a mean of one. A black
    /// image gives a uniform map.
    pub fn from_image(image: &ImageBuffer) -> Self {
        let size: Vector2i = image.size();
        let mut values: Vec<Float> = image
            .luminance()
            .into_iter()
            .map(|v| if v.is_finite() && v > 0.0 as Float { v } else { 0.0 as Float })
            .collect();
        let n: usize = values.len().max(1);
        let mean: Float = (values.iter().map(|v| *v as f64).sum::<f64>() / n as f64) as Float;
        if mean <= 0.0 as Float {
            for v in values.iter_mut() {
                *v = 1.0 as Float;
            }
        } else {
            let floor: Float = mean * MIN_RELATIVE_IMPORTANCE;
            for v in values.iter_mut() {
                *v = v.max(floor);
            }
            let norm: Float = (values.iter().map(|v| *v as f64).sum::<f64>() / n as f64) as Float;
            for v in values.iter_mut() {
                *v /= norm;
            }
        }
        ImportanceMap { size, values }
    }
    pub fn size(&self) -> Vector2i {
        self.size
    }
    pub fn values(&self) -> &[Float] {
        &self.values
    }
    /// Nearest-neighbour lookup for a point in [0, 1)².
    pub fn lookup(&self, u: &Point2f) -> Float {
        let x: i32 = ((u.x * self.size.x as Float) as i32).max(0).min(self.size.x - 1);
        let y: i32 = ((u.y * self.size.y as Float) as i32).max(0).min(self.size.y - 1);
        self.values[(y * self.size.x + x) as usize]
    }
}

/// Map value at the sensor vertex of `path` (one without a map).
pub fn sensor_importance(path: &Path, importance: Option<&ImportanceMap>) -> Float {
    match (importance, path.vertices.first()) {
        (Some(map), Some(sensor)) => map.lookup(&sensor.u),
        _ => 1.0 as Float,
    }
}

/// Density the Markov chains sample: `luminance / importance` at the
/// sensor vertex, or plain luminance without a map.
pub fn chain_target(path: &Path, importance: Option<&ImportanceMap>) -> Float {
    path.luminance / sensor_importance(path, importance)
}
