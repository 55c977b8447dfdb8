//! # Rendering Layer
//!
//! Backend-agnostic resource management and command submission.
//!
//! ## Architecture
//!
//! - **GraphicsDevice**: Owns the backend, the surface and every resource;
//!   the only type client code needs to talk to
//! - **Commands**: Plain data recorded into a [`CommandList`] and submitted
//!   in one call
//! - **Backends**: Implement [`CommandDispatcher`] and [`Backend`]; the
//!   device never knows which API sits behind them
//! - **Caches**: Deduplicate textures, programs and materials by content key
//!
//! ## Example
//!
//! ```
//! use render_core::config::DeviceConfig;
//! use render_core::render::{CommandList, GraphicsDevice, HeadlessBackend, HeadlessSurface};
//!
//! let surface = Box::new(HeadlessSurface::new(320, 240));
//! let mut device = GraphicsDevice::new(surface, HeadlessBackend::new(), DeviceConfig::default()).unwrap();
//!
//! let mut list = CommandList::new();
//! list.clear().set_color(0.0, 0.0, 0.0, 1.0).set_clear_color(true);
//! device.submit_and_swap(list, true).unwrap();
//! assert_eq!(device.frame_index(), 1);
//! ```

pub mod handle;
pub mod resources;
pub mod cache;
pub mod command;
pub mod error;
pub mod surface;

/// Backend traits and command dispatch
pub mod backend;

/// Built-in backends
pub mod backends;

pub mod builders;
pub mod device;

#[cfg(test)]
mod tests;

pub use backend::{dispatch, Backend, BackendError, BackendResult, CommandDispatcher};
pub use backends::{create_backend, GraphicsBackend, HeadlessBackend, NullBackend};
pub use builders::{FrameBufferBuilder, MaterialBuilder, RenderTarget, TextureBuilder};
pub use cache::{CacheInsert, CollisionPolicy, MaterialCache, ProgramCache, ResourceKey, TextureCache};
pub use command::{
    ClearCommand, ClearFlags, Command, CommandKind, CommandList, DrawCommand, FrameBufferBinding, PrimitiveType,
};
pub use device::{DeviceStats, GraphicsDevice, SubmissionReport};
pub use error::{RenderError, RenderResult};
pub use handle::{
    FrameBufferHandle, IndexBufferHandle, MaterialHandle, ProgramHandle, ResourceId, ResourceKind, ShaderHandle,
    TextureHandle, VertexBufferHandle,
};
pub use surface::{HeadlessSurface, RenderSurface};
