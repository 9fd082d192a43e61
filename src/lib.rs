//! # mlt
//!
//! [Rust][rust] crate implementing the core of Metropolis Light
//! Transport (MLT): an unbiased Markov chain Monte Carlo estimator of
//! the image formed by all light paths of a scene.
//!
//! The render loop of the Markov chains can be found [here], the one of
//! the separate direct illumination pass [there][render_direct].
//!
//! Scenes are seen through a small interface: a path is a list of
//! primary sample points, one per vertex, and the scene turns it into a
//! contribution. [AnalyticScene][analytic] implements that interface
//! with a closed-form solution.
//!
//! [rust]: https://www.rust-lang.org
//! [here]: integrators/mlt/struct.MLTIntegrator.html#method.render_stage
//! [render_direct]: integrators/directlighting/struct.DirectIlluminationRenderer.html#method.render
//! [analytic]: scenes/analytic/struct.AnalyticScene.html

#[macro_use]
extern crate impl_ops;

pub mod blockqueue;
pub mod core;
pub mod integrators;
pub mod samplers;
pub mod scenes;
