//! # Render Core
//!
//! Backend-agnostic rendering layer: typed resource handles, content-keyed
//! resource caches, recorded command lists and a device that validates,
//! sorts and dispatches them to a pluggable backend.
//!
//! ## Features
//!
//! - **Generational Handles**: Destroyed resources are detected, never aliased
//! - **Command Lists**: Record once, submit in one call, optionally reordered
//!   to minimize state changes without breaking data dependencies
//! - **Resource Caches**: Identical textures, programs and materials are
//!   created once
//! - **Pluggable Backends**: Native APIs plug in through two traits; a
//!   headless CPU backend ships for tests and tools
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use render_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DeviceConfig::new("demo").with_backend(GraphicsBackend::Headless);
//!     let mut device = GraphicsDevice::from_config(Box::new(HeadlessSurface::new(800, 600)), config)?;
//!
//!     let mut list = CommandList::new();
//!     list.clear().set_color(0.1, 0.1, 0.1, 1.0).set_clear_color(true);
//!     device.submit_and_swap(list, true)?;
//!     Ok(())
//! }
//! ```

pub mod foundation;
pub mod config;
pub mod render;

/// Common imports for device users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, DeviceConfig},
        foundation::math::{Color, Rectangle, Vec2, Vec3, Vec4, Mat4},
        render::{
            resources::{
                AttachmentPoint, AttributeType, BufferUsage, IndexType, Material, MaterialParameters, ShaderSource,
                ShaderStage, TextureDescription, TextureFormat, TextureMetadata, VertexAttribute, VertexLayout,
            },
            Backend, CommandList, FrameBufferBuilder, GraphicsBackend, GraphicsDevice, HeadlessBackend,
            HeadlessSurface, MaterialBuilder, MaterialHandle, RenderError, RenderResult, RenderSurface,
            TextureBuilder, TextureHandle, VertexBufferHandle,
        },
    };
}
