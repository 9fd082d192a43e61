//! Error types for the renderer.
//!
//! Numeric trouble inside a Markov chain (zero luminance, NaN or
//! infinite contributions) never shows up here; it is handled where it
//! happens. Cancellation is reported through
//! [`ProcessStatus`](crate::core::parallel::ProcessStatus) instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// The scene carries integrators the Markov chains cannot account for
    #[error("Subsurface integrators are not supported by MLT ({0} found)")]
    SubsurfaceIntegrators(usize),

    /// The scene's sampler is not the independent sampler
    #[error("Metropolis light transport requires the independent sampler (found {0:?})")]
    UnsupportedSampler(String),

    /// Every mutation strategy was switched off
    #[error("At least one mutation strategy must be enabled")]
    NoMutationStrategy,

    /// A parameter value is outside its valid range
    #[error("Invalid parameter {name:?}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The separate direct illumination pass produced no image
    #[error("Direct illumination pass failed: {0}")]
    DirectIllumination(String),

    /// The nested first stage of two-stage MLT produced no image
    #[error("First-stage MLT process failed: {0}")]
    FirstStage(String),

    /// A parallel process ended without producing results
    #[error("Parallel process failed: {0}")]
    ProcessFailed(String),

    /// A serialized configuration ended early
    #[error("Truncated configuration stream: {0}")]
    Truncated(#[source] std::io::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        RenderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RenderError>;
