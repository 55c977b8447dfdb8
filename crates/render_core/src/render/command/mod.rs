//! # Render Commands
//!
//! Commands are backend-agnostic units of rendering work. Client code
//! records them into a [`CommandList`], the device validates and optionally
//! reorders the list, and each command is then handed to exactly one
//! method of the active backend's [`CommandDispatcher`](crate::render::CommandDispatcher).
//!
//! ## Command Set
//!
//! The set is closed: adding a variant means extending [`Command`],
//! [`CommandKind`], the dispatcher trait and every backend. The compiler's
//! exhaustiveness checking points at each place that needs updating.
//!
//! Setters on the command structs only fill in data; nothing here touches
//! a backend.

pub mod list;
pub mod sort;

pub use list::{CommandList, Recorder};
pub use sort::{sort_commands, SortContext, SortKey};

use crate::foundation::math::{Color, Rectangle};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, MaterialHandle, ResourceId, TextureHandle, VertexBufferHandle,
};
use crate::render::resources::{AttachmentPoint, MaterialParameters, ParameterValue};
use std::fmt;

bitflags::bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClearFlags: u8 {
        /// Clear color attachments
        const COLOR = 1;
        /// Clear the depth attachment
        const DEPTH = 1 << 1;
        /// Clear the stencil attachment
        const STENCIL = 1 << 2;
    }
}

/// Primitive topology of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Independent lines
    Lines,
    /// Line strip
    LineStrip,
    /// Points
    Points,
}

/// Which frame buffer slot a bind affects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameBufferBinding {
    /// Bind for reading only (blits, read-back)
    Read,
    /// Bind for drawing only
    Draw,
    /// Bind for both
    #[default]
    ReadDraw,
}

impl FrameBufferBinding {
    /// Whether subsequent draws go to the bound frame buffer
    pub const fn affects_draws(self) -> bool {
        matches!(self, Self::Draw | Self::ReadDraw)
    }
}

/// Clear the current render target
#[derive(Debug, Clone, PartialEq)]
pub struct ClearCommand {
    /// Clear color
    pub color: Color,
    /// Depth clear value
    pub depth: f32,
    /// Stencil clear value
    pub stencil: i32,
    /// Buffers to clear
    pub flags: ClearFlags,
}

impl Default for ClearCommand {
    fn default() -> Self {
        Self { color: Color::new(0.0, 0.0, 0.0, 1.0), depth: 1.0, stencil: 0, flags: ClearFlags::empty() }
    }
}

impl ClearCommand {
    /// Set the clear color
    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) -> &mut Self {
        self.color = Color::new(r, g, b, a);
        self
    }

    /// Enable or disable clearing the color buffer
    pub fn set_clear_color(&mut self, clear: bool) -> &mut Self {
        self.flags.set(ClearFlags::COLOR, clear);
        self
    }

    /// Enable or disable clearing the depth buffer
    pub fn set_clear_depth(&mut self, clear: bool) -> &mut Self {
        self.flags.set(ClearFlags::DEPTH, clear);
        self
    }

    /// Enable or disable clearing the stencil buffer
    pub fn set_clear_stencil(&mut self, clear: bool) -> &mut Self {
        self.flags.set(ClearFlags::STENCIL, clear);
        self
    }

    /// Set the depth clear value
    pub fn set_depth(&mut self, depth: f32) -> &mut Self {
        self.depth = depth;
        self
    }

    /// Set the stencil clear value
    pub fn set_stencil(&mut self, stencil: i32) -> &mut Self {
        self.stencil = stencil;
        self
    }
}

/// Draw primitives from a vertex buffer with a material
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DrawCommand {
    /// Vertex source
    pub vertex_buffer: VertexBufferHandle,
    /// Optional index source; `vertex_count` then counts indices
    pub index_buffer: Option<IndexBufferHandle>,
    /// Material (program + parameters)
    pub material: MaterialHandle,
    /// Number of vertices, or indices when indexed
    pub vertex_count: u32,
    /// Topology
    pub primitive: PrimitiveType,
    /// Client-supplied ordering hint, typically quantized depth
    pub sort_key: Option<u32>,
}

impl DrawCommand {
    /// Non-indexed triangle draw
    pub fn new(vertex_buffer: VertexBufferHandle, material: MaterialHandle, vertex_count: u32) -> Self {
        Self { vertex_buffer, material, vertex_count, ..Self::default() }
    }

    /// Set the vertex buffer
    pub fn set_vertex_buffer(&mut self, buffer: VertexBufferHandle) -> &mut Self {
        self.vertex_buffer = buffer;
        self
    }

    /// Set the index buffer
    pub fn set_index_buffer(&mut self, buffer: IndexBufferHandle) -> &mut Self {
        self.index_buffer = Some(buffer);
        self
    }

    /// Set the material
    pub fn set_material(&mut self, material: MaterialHandle) -> &mut Self {
        self.material = material;
        self
    }

    /// Set the vertex (or index) count
    pub fn set_vertex_count(&mut self, count: u32) -> &mut Self {
        self.vertex_count = count;
        self
    }

    /// Set the primitive topology
    pub fn set_primitive_type(&mut self, primitive: PrimitiveType) -> &mut Self {
        self.primitive = primitive;
        self
    }

    /// Set the ordering hint
    pub fn set_sort_key(&mut self, key: u32) -> &mut Self {
        self.sort_key = Some(key);
        self
    }
}

/// Set the viewport rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportCommand {
    /// Viewport in pixels
    pub rectangle: Rectangle,
}

impl ViewportCommand {
    /// Set the viewport rectangle
    pub fn set_rectangle(&mut self, x: i32, y: i32, width: u32, height: u32) -> &mut Self {
        self.rectangle = Rectangle::new(x, y, width, height);
        self
    }
}

/// Configure the scissor test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScissorCommand {
    /// Scissor rectangle in pixels
    pub rectangle: Rectangle,
    /// Whether the scissor test is enabled
    pub enabled: bool,
}

impl ScissorCommand {
    /// Set the scissor rectangle and enable the test
    pub fn set_rectangle(&mut self, x: i32, y: i32, width: u32, height: u32) -> &mut Self {
        self.rectangle = Rectangle::new(x, y, width, height);
        self.enabled = true;
        self
    }

    /// Enable or disable the scissor test
    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }
}

/// Upload bytes into a vertex buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FillVertexBufferCommand {
    /// Destination buffer
    pub buffer: VertexBufferHandle,
    /// Bytes to write
    pub data: Vec<u8>,
    /// Destination offset in bytes
    pub offset: usize,
}

impl FillVertexBufferCommand {
    /// Set the destination buffer
    pub fn set_buffer(&mut self, buffer: VertexBufferHandle) -> &mut Self {
        self.buffer = buffer;
        self
    }

    /// Set the bytes to upload
    pub fn set_data(&mut self, data: Vec<u8>) -> &mut Self {
        self.data = data;
        self
    }

    /// Set the upload from a slice of plain vertex structs
    pub fn set_vertices<T: bytemuck::Pod>(&mut self, vertices: &[T]) -> &mut Self {
        self.data = bytemuck::cast_slice(vertices).to_vec();
        self
    }

    /// Set the destination offset in bytes
    pub fn set_offset(&mut self, offset: usize) -> &mut Self {
        self.offset = offset;
        self
    }
}

/// Upload bytes into an index buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FillIndexBufferCommand {
    /// Destination buffer
    pub buffer: IndexBufferHandle,
    /// Bytes to write
    pub data: Vec<u8>,
    /// Destination offset in bytes
    pub offset: usize,
}

impl FillIndexBufferCommand {
    /// Set the destination buffer
    pub fn set_buffer(&mut self, buffer: IndexBufferHandle) -> &mut Self {
        self.buffer = buffer;
        self
    }

    /// Set the bytes to upload
    pub fn set_data(&mut self, data: Vec<u8>) -> &mut Self {
        self.data = data;
        self
    }

    /// Set the upload from a slice of indices (`u8`, `u16` or `u32`)
    pub fn set_indices<T: bytemuck::Pod>(&mut self, indices: &[T]) -> &mut Self {
        self.data = bytemuck::cast_slice(indices).to_vec();
        self
    }

    /// Set the destination offset in bytes
    pub fn set_offset(&mut self, offset: usize) -> &mut Self {
        self.offset = offset;
        self
    }
}

/// Bind a frame buffer, or the surface's default frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameBufferCommand {
    /// Frame buffer to bind; `None` binds the surface
    pub frame_buffer: Option<FrameBufferHandle>,
    /// Binding slot
    pub binding: FrameBufferBinding,
}

impl FrameBufferCommand {
    /// Bind an off-screen frame buffer
    pub fn set_frame_buffer(&mut self, frame_buffer: FrameBufferHandle) -> &mut Self {
        self.frame_buffer = Some(frame_buffer);
        self
    }

    /// Bind the surface's default frame buffer
    pub fn set_default(&mut self) -> &mut Self {
        self.frame_buffer = None;
        self
    }

    /// Set the binding slot
    pub fn set_binding(&mut self, binding: FrameBufferBinding) -> &mut Self {
        self.binding = binding;
        self
    }
}

/// Attach a texture to a frame buffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBufferTextureCommand {
    /// Frame buffer to modify
    pub frame_buffer: FrameBufferHandle,
    /// Texture to attach
    pub texture: TextureHandle,
    /// Attachment point
    pub point: AttachmentPoint,
    /// Mip level rendered to
    pub mip_level: u32,
}

impl Default for FrameBufferTextureCommand {
    fn default() -> Self {
        Self {
            frame_buffer: FrameBufferHandle::default(),
            texture: TextureHandle::default(),
            point: AttachmentPoint::Color(0),
            mip_level: 0,
        }
    }
}

impl FrameBufferTextureCommand {
    /// Set the frame buffer
    pub fn set_frame_buffer(&mut self, frame_buffer: FrameBufferHandle) -> &mut Self {
        self.frame_buffer = frame_buffer;
        self
    }

    /// Set the texture
    pub fn set_texture(&mut self, texture: TextureHandle) -> &mut Self {
        self.texture = texture;
        self
    }

    /// Set the attachment point
    pub fn set_attachment(&mut self, point: AttachmentPoint) -> &mut Self {
        self.point = point;
        self
    }

    /// Set the mip level
    pub fn set_mip_level(&mut self, level: u32) -> &mut Self {
        self.mip_level = level;
        self
    }
}

/// Regenerate a texture's mip chain from level 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerateMipmapsCommand {
    /// Texture to process
    pub texture: TextureHandle,
}

impl GenerateMipmapsCommand {
    /// Set the texture
    pub fn set_texture(&mut self, texture: TextureHandle) -> &mut Self {
        self.texture = texture;
        self
    }
}

/// Update parameters of a stored material
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SetMaterialParametersCommand {
    /// Material to update
    pub material: MaterialHandle,
    /// Parameters merged into the material
    pub parameters: MaterialParameters,
}

impl SetMaterialParametersCommand {
    /// Set the material
    pub fn set_material(&mut self, material: MaterialHandle) -> &mut Self {
        self.material = material;
        self
    }

    /// Set one parameter
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> &mut Self {
        self.parameters.set(name, value);
        self
    }
}

/// Discriminant of [`Command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    /// [`ClearCommand`]
    Clear,
    /// [`DrawCommand`]
    Draw,
    /// [`ViewportCommand`]
    Viewport,
    /// [`ScissorCommand`]
    Scissor,
    /// [`FillVertexBufferCommand`]
    FillVertexBuffer,
    /// [`FillIndexBufferCommand`]
    FillIndexBuffer,
    /// [`FrameBufferCommand`]
    FrameBuffer,
    /// [`FrameBufferTextureCommand`]
    FrameBufferTexture,
    /// [`GenerateMipmapsCommand`]
    GenerateMipmaps,
    /// [`SetMaterialParametersCommand`]
    SetMaterialParameters,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clear => "clear",
            Self::Draw => "draw",
            Self::Viewport => "viewport",
            Self::Scissor => "scissor",
            Self::FillVertexBuffer => "fill_vertex_buffer",
            Self::FillIndexBuffer => "fill_index_buffer",
            Self::FrameBuffer => "frame_buffer",
            Self::FrameBufferTexture => "frame_buffer_texture",
            Self::GenerateMipmaps => "generate_mipmaps",
            Self::SetMaterialParameters => "set_material_parameters",
        };
        f.write_str(name)
    }
}

/// One recorded unit of rendering work
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Clear the current target
    Clear(ClearCommand),
    /// Draw primitives
    Draw(DrawCommand),
    /// Set the viewport
    Viewport(ViewportCommand),
    /// Configure the scissor test
    Scissor(ScissorCommand),
    /// Upload vertex data
    FillVertexBuffer(FillVertexBufferCommand),
    /// Upload index data
    FillIndexBuffer(FillIndexBufferCommand),
    /// Bind a frame buffer
    FrameBuffer(FrameBufferCommand),
    /// Attach a texture to a frame buffer
    FrameBufferTexture(FrameBufferTextureCommand),
    /// Generate mipmaps
    GenerateMipmaps(GenerateMipmapsCommand),
    /// Update material parameters
    SetMaterialParameters(SetMaterialParametersCommand),
}

impl Command {
    /// Discriminant of this command
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Clear(_) => CommandKind::Clear,
            Self::Draw(_) => CommandKind::Draw,
            Self::Viewport(_) => CommandKind::Viewport,
            Self::Scissor(_) => CommandKind::Scissor,
            Self::FillVertexBuffer(_) => CommandKind::FillVertexBuffer,
            Self::FillIndexBuffer(_) => CommandKind::FillIndexBuffer,
            Self::FrameBuffer(_) => CommandKind::FrameBuffer,
            Self::FrameBufferTexture(_) => CommandKind::FrameBufferTexture,
            Self::GenerateMipmaps(_) => CommandKind::GenerateMipmaps,
            Self::SetMaterialParameters(_) => CommandKind::SetMaterialParameters,
        }
    }

    /// Every device resource this command references
    pub fn resources(&self) -> Vec<ResourceId> {
        match self {
            Self::Clear(_) | Self::Viewport(_) | Self::Scissor(_) => Vec::new(),
            Self::Draw(cmd) => {
                let mut resources = vec![cmd.vertex_buffer.into(), cmd.material.into()];
                resources.extend(cmd.index_buffer.map(ResourceId::from));
                resources
            }
            Self::FillVertexBuffer(cmd) => vec![cmd.buffer.into()],
            Self::FillIndexBuffer(cmd) => vec![cmd.buffer.into()],
            Self::FrameBuffer(cmd) => cmd.frame_buffer.map(ResourceId::from).into_iter().collect(),
            Self::FrameBufferTexture(cmd) => vec![cmd.frame_buffer.into(), cmd.texture.into()],
            Self::GenerateMipmaps(cmd) => vec![cmd.texture.into()],
            Self::SetMaterialParameters(cmd) => {
                let mut resources = vec![ResourceId::from(cmd.material)];
                resources.extend(cmd.parameters.textures().map(ResourceId::from));
                resources
            }
        }
    }
}

macro_rules! impl_command_from {
    ($($command:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$command> for Command {
                fn from(command: $command) -> Self {
                    Self::$variant(command)
                }
            }
        )*
    };
}

impl_command_from! {
    ClearCommand => Clear,
    DrawCommand => Draw,
    ViewportCommand => Viewport,
    ScissorCommand => Scissor,
    FillVertexBufferCommand => FillVertexBuffer,
    FillIndexBufferCommand => FillIndexBuffer,
    FrameBufferCommand => FrameBuffer,
    FrameBufferTextureCommand => FrameBufferTexture,
    GenerateMipmapsCommand => GenerateMipmaps,
    SetMaterialParametersCommand => SetMaterialParameters,
}
