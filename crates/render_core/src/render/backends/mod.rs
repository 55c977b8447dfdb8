//! Backend implementations
//!
//! Two backends ship with the crate, and neither needs a GPU:
//!
//! - [`NullBackend`] accepts everything and only counts calls. Useful for
//!   measuring the cost of the device itself.
//! - [`HeadlessBackend`] simulates resource storage and pipeline state on
//!   the CPU. It validates what a real driver would reject, so tests can
//!   exercise error paths.
//!
//! Native API backends implement [`Backend`](crate::render::Backend) in
//! their own crates.

/// Backend that discards all work
pub mod null;

/// CPU-side simulation backend
pub mod headless;

pub use headless::{BackendCall, HeadlessBackend, HeadlessStats};
pub use null::NullBackend;

use crate::render::backend::Backend;
use crate::render::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Graphics APIs a device can be configured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphicsBackend {
    /// Direct3D 9
    Direct3D9,
    /// Direct3D 11
    Direct3D11,
    /// Direct3D 12
    Direct3D12,
    /// PlayStation GNM
    Gnm,
    /// Metal
    Metal,
    /// OpenGL ES
    OpenGlEs,
    /// Desktop OpenGL
    OpenGl,
    /// Vulkan
    Vulkan,
    /// Discards everything
    Null,
    /// CPU simulation
    Headless,
}

impl GraphicsBackend {
    /// Whether this crate can instantiate the backend by itself
    pub const fn is_builtin(self) -> bool {
        matches!(self, Self::Null | Self::Headless)
    }
}

impl fmt::Display for GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct3D9 => "Direct3D 9",
            Self::Direct3D11 => "Direct3D 11",
            Self::Direct3D12 => "Direct3D 12",
            Self::Gnm => "GNM",
            Self::Metal => "Metal",
            Self::OpenGlEs => "OpenGL ES",
            Self::OpenGl => "OpenGL",
            Self::Vulkan => "Vulkan",
            Self::Null => "Null",
            Self::Headless => "Headless",
        };
        f.write_str(name)
    }
}

/// Instantiate a built-in backend
///
/// Native APIs need a backend crate; asking for one here fails with
/// [`RenderError::InitializationFailed`].
pub fn create_backend(kind: GraphicsBackend) -> RenderResult<Box<dyn Backend>> {
    match kind {
        GraphicsBackend::Null => Ok(Box::new(NullBackend::new())),
        GraphicsBackend::Headless => Ok(Box::new(HeadlessBackend::new())),
        other => Err(RenderError::InitializationFailed(format!(
            "{other} backend is not built into render_core; construct it directly and use GraphicsDevice::new"
        ))),
    }
}
