//! **Integrator** is the interface every renderer of a **Scene**
//! implements.
//!
//! - DirectLightingIntegrator
//! - MLTIntegrator
//!
//! ## Direct Lighting
//!
//! The **DirectLightingIntegrator** accounts only for paths with one
//! or two edges: emitters seen directly and light reflected once
//! towards the sensor. The same estimator renders the direct component
//! of MLT when it is handled separately.
//!
//! ## Metropolis Light Transport
//!
//! MLT explores path space with Markov chains, mutating a current path
//! and accepting the proposal with the Metropolis-Hastings rule, so
//! that paths are visited in proportion to their luminance. Five
//! mutation strategies are available: bidirectional, lens
//! perturbation, caustic perturbation, multi-chain perturbation and
//! manifold perturbation.

pub mod directlighting;
pub mod mlt;
