//! Rendering an image of the scene is handled by an instance of a
//! type that implements the **Integrator** interface.

// std
use std::sync::Arc;
// pbrt
use crate::core::error::Result;
use crate::core::film::ImageBuffer;
use crate::core::scene::Scene;

// see integrator.h

pub trait Integrator: Send + Sync {
    /// Check the scene before any sampling happens.
    fn preprocess(&self, scene: &dyn Scene) -> Result<()>;
    /// Render the scene; `false` on failure or cancellation, with the
    /// reason logged. The image of a successful render is kept until
    /// [`take_image`](Integrator::take_image) is called.
    fn render(&self, scene: &Arc<dyn Scene>) -> bool;
    /// Ask a running render to stop. Safe to call from any thread.
    fn cancel(&self);
    fn take_image(&self) -> Option<ImageBuffer>;
}
