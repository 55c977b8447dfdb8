//! Resource handles
//!
//! Every GPU resource owned by the [`GraphicsDevice`](super::GraphicsDevice)
//! is referenced by a small copyable key made of a slot index and a
//! generation. Destroying a resource bumps the generation of its slot, so a
//! handle kept past destruction no longer matches anything and is reported
//! as stale instead of silently aliasing whatever reuses the slot.
//!
//! The null key (`Handle::null()` / `Default`) is the distinguished invalid
//! value; it never compares equal to a live handle.

use slotmap::{new_key_type, Key};
use std::fmt;

new_key_type! {
    /// Handle to a vertex buffer
    pub struct VertexBufferHandle;
    /// Handle to an index buffer
    pub struct IndexBufferHandle;
    /// Handle to a compiled shader stage
    pub struct ShaderHandle;
    /// Handle to a linked shader program
    pub struct ProgramHandle;
    /// Handle to a texture
    pub struct TextureHandle;
    /// Handle to a material stored in the material cache
    pub struct MaterialHandle;
    /// Handle to an off-screen frame buffer
    pub struct FrameBufferHandle;
}

/// Kind of a device resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Vertex buffer
    VertexBuffer,
    /// Index buffer
    IndexBuffer,
    /// Shader stage
    Shader,
    /// Shader program
    Program,
    /// Texture
    Texture,
    /// Material
    Material,
    /// Frame buffer
    FrameBuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VertexBuffer => "vertex buffer",
            Self::IndexBuffer => "index buffer",
            Self::Shader => "shader",
            Self::Program => "program",
            Self::Texture => "texture",
            Self::Material => "material",
            Self::FrameBuffer => "frame buffer",
        };
        f.write_str(name)
    }
}

/// Any device resource handle, tagged with its kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceId {
    /// Vertex buffer handle
    VertexBuffer(VertexBufferHandle),
    /// Index buffer handle
    IndexBuffer(IndexBufferHandle),
    /// Shader handle
    Shader(ShaderHandle),
    /// Program handle
    Program(ProgramHandle),
    /// Texture handle
    Texture(TextureHandle),
    /// Material handle
    Material(MaterialHandle),
    /// Frame buffer handle
    FrameBuffer(FrameBufferHandle),
}

impl ResourceId {
    /// Kind of the referenced resource
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::VertexBuffer(_) => ResourceKind::VertexBuffer,
            Self::IndexBuffer(_) => ResourceKind::IndexBuffer,
            Self::Shader(_) => ResourceKind::Shader,
            Self::Program(_) => ResourceKind::Program,
            Self::Texture(_) => ResourceKind::Texture,
            Self::Material(_) => ResourceKind::Material,
            Self::FrameBuffer(_) => ResourceKind::FrameBuffer,
        }
    }

    /// True for the null handle of any kind
    pub fn is_null(&self) -> bool {
        match self {
            Self::VertexBuffer(h) => h.is_null(),
            Self::IndexBuffer(h) => h.is_null(),
            Self::Shader(h) => h.is_null(),
            Self::Program(h) => h.is_null(),
            Self::Texture(h) => h.is_null(),
            Self::Material(h) => h.is_null(),
            Self::FrameBuffer(h) => h.is_null(),
        }
    }

    /// Raw `(generation << 32) | index` value, for logging
    pub fn raw(&self) -> u64 {
        match self {
            Self::VertexBuffer(h) => h.data().as_ffi(),
            Self::IndexBuffer(h) => h.data().as_ffi(),
            Self::Shader(h) => h.data().as_ffi(),
            Self::Program(h) => h.data().as_ffi(),
            Self::Texture(h) => h.data().as_ffi(),
            Self::Material(h) => h.data().as_ffi(),
            Self::FrameBuffer(h) => h.data().as_ffi(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "null {}", self.kind())
        } else {
            write!(f, "{} #{:x}", self.kind(), self.raw())
        }
    }
}

macro_rules! impl_resource_id_from {
    ($($handle:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$handle> for ResourceId {
                fn from(handle: $handle) -> Self {
                    Self::$variant(handle)
                }
            }
        )*
    };
}

impl_resource_id_from! {
    VertexBufferHandle => VertexBuffer,
    IndexBufferHandle => IndexBuffer,
    ShaderHandle => Shader,
    ProgramHandle => Program,
    TextureHandle => Texture,
    MaterialHandle => Material,
    FrameBufferHandle => FrameBuffer,
}
