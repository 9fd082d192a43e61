//! Sampler implementations.
//!
//! - RandomSampler
//! - ReplayableSampler
//!
//! ## Random Sampler
//!
//! Independent uniform random numbers. This is the only sampler kind
//! Metropolis light transport accepts for a scene.
//!
//! ## Replayable Sampler
//!
//! An independent sampler that counts its draws and can seek back to
//! any recorded position, so that a path drawn during seed generation
//! can be rebuilt bit for bit by the Markov chain that starts from it.

pub mod random;
pub mod replayable;
