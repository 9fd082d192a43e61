//! The **Sampler** interface hands out the uniform random numbers
//! from which paths are built. Markov chains require the independent
//! kind; stratified or low-discrepancy sequences would correlate the
//! seed paths.

// std
use std::fmt;
// pbrt
use crate::core::geometry::Point2f;
use crate::core::pbrt::Float;

// see sampler.h

/// Kind of sampler a scene is configured with.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SamplerKind {
    Independent,
    Stratified,
    Halton,
    Sobol,
    ZeroTwoSequence,
}

impl SamplerKind {
    pub fn name(&self) -> &'static str {
        match self {
            SamplerKind::Independent => "independent",
            SamplerKind::Stratified => "stratified",
            SamplerKind::Halton => "halton",
            SamplerKind::Sobol => "sobol",
            SamplerKind::ZeroTwoSequence => "02sequence",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

pub trait Sampler {
    fn get_1d(&mut self) -> Float;
    fn get_2d(&mut self) -> Point2f {
        // C++: call x first
        let x: Float = self.get_1d();
        let y: Float = self.get_1d();
        Point2f { x, y }
    }
}
