//! Image storage. Each Markov chain splats into its own
//! **ImageBuffer**; the buffers are merged additively once all chains
//! are done and the result is written out as an 8-bit PNG.

// std
use std::path::Path;
// others
use log::info;
use rayon::prelude::*;
// pbrt
use crate::core::error::Result;
use crate::core::geometry::{Point2f, Point2i, Vector2i};
use crate::core::pbrt::{clamp_t, gamma_correct, Float, Spectrum};

#[derive(Debug, Clone)]
pub struct ImageBuffer {
    size: Vector2i,
    pixels: Vec<Spectrum>,
}

impl ImageBuffer {
    pub fn new(size: Vector2i) -> Self {
        ImageBuffer {
            size,
            pixels: vec![Spectrum::default(); size.area()],
        }
    }
    pub fn size(&self) -> Vector2i {
        self.size
    }
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }
    pub fn pixels(&self) -> &[Spectrum] {
        &self.pixels
    }
    fn offset(&self, p: &Point2i) -> usize {
        (p.y * self.size.x + p.x) as usize
    }
    pub fn get(&self, p: &Point2i) -> Spectrum {
        self.pixels[self.offset(p)]
    }
    /// Add `v` to the pixel `p`.
    pub fn put(&mut self, p: &Point2i, v: &Spectrum) {
        let offset: usize = self.offset(p);
        self.pixels[offset] += *v;
    }
    /// Raster position to the pixel containing it; positions on the
    /// far edge are clamped into the image.
    pub fn pixel_of(&self, p_raster: &Point2f) -> Point2i {
        Point2i {
            x: clamp_t(p_raster.x.floor() as i32, 0, self.size.x - 1),
            y: clamp_t(p_raster.y.floor() as i32, 0, self.size.y - 1),
        }
    }
    /// Deposit a (Markov chain) sample at a continuous raster position.
    pub fn splat(&mut self, p_raster: &Point2f, v: &Spectrum) {
        if p_raster.has_nans() || !v.is_valid() {
            return;
        }
        let p: Point2i = self.pixel_of(p_raster);
        self.put(&p, v);
    }
    /// Element-wise addition of another buffer of the same size.
    pub fn merge(&mut self, other: &ImageBuffer) {
        assert_eq!(self.size, other.size, "merging image buffers of different size");
        self.pixels
            .par_iter_mut()
            .zip(other.pixels.par_iter())
            .for_each(|(a, b)| *a += *b);
    }
    pub fn scale(&mut self, s: Float) {
        self.pixels.par_iter_mut().for_each(|v| *v *= s);
    }
    pub fn average_luminance(&self) -> Float {
        if self.pixels.is_empty() {
            return 0.0 as Float;
        }
        let sum: f64 = self.pixels.iter().map(|v| v.y() as f64).sum();
        (sum / self.pixels.len() as f64) as Float
    }
    /// Per-pixel luminance in row-major order.
    pub fn luminance(&self) -> Vec<Float> {
        self.pixels.iter().map(|v| v.y()).collect()
    }
    /// Write gamma corrected 8-bit RGB.
    pub fn write_png(&self, filename: &Path) -> Result<()> {
        info!(
            "Writing image {:?} with size {}x{}",
            filename, self.size.x, self.size.y
        );
        let mut buffer: Vec<u8> = Vec::with_capacity(3 * self.pixels.len());
        for v in &self.pixels {
            for c in 0..3 {
                let value: Float = if v.c[c].is_finite() { v.c[c].max(0.0) } else { 0.0 };
                buffer.push(clamp_t(
                    255.0 as Float * gamma_correct(value) + 0.5,
                    0.0 as Float,
                    255.0 as Float,
                ) as u8);
            }
        }
        image::save_buffer(
            filename,
            &buffer,
            self.size.x as u32,
            self.size.y as u32,
            image::ColorType::Rgb8,
        )?;
        Ok(())
    }
}
