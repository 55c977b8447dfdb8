//! Resource descriptions
//!
//! Plain values describing GPU resources before they exist. The device
//! consumes these in its `make_*` factory functions; nothing here talks to
//! a backend.

pub mod vertex_layout;
pub mod shader;
pub mod texture;
pub mod frame_buffer;
pub mod material;

pub use vertex_layout::{AttributeType, BufferUsage, IndexType, VertexAttribute, VertexLayout};
pub use shader::{ShaderSource, ShaderStage};
pub use texture::{TextureDescription, TextureFilter, TextureFormat, TextureMetadata, TextureTarget, TextureWrap};
pub use frame_buffer::{AttachmentPoint, FrameBufferAttachment, FrameBufferDescription};
pub use material::{Material, MaterialParameters, ParameterValue};
