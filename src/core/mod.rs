//! Basic types shared by the integrators: geometry, spectra, random
//! numbers, sampling distributions, the image buffer, the parameter
//! set, the scene and integrator interfaces and the parallel process
//! scheduler.

pub mod error;
pub mod film;
pub mod geometry;
pub mod integrator;
pub mod parallel;
pub mod paramset;
pub mod pbrt;
pub mod rng;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod spectrum;
