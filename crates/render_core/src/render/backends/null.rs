use crate::render::backend::{Backend, BackendError, BackendResult, CommandDispatcher};
use crate::render::backends::GraphicsBackend;
use crate::render::command::{
    ClearCommand, DrawCommand, FillIndexBufferCommand, FillVertexBufferCommand, FrameBufferCommand,
    FrameBufferTextureCommand, GenerateMipmapsCommand, ScissorCommand, SetMaterialParametersCommand,
    ViewportCommand,
};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, ProgramHandle, ResourceId, ShaderHandle, TextureHandle, VertexBufferHandle,
};
use crate::render::resources::{
    BufferUsage, FrameBufferDescription, IndexType, Material, ShaderStage, TextureDescription, VertexLayout,
};
use crate::render::surface::RenderSurface;

/// Backend that accepts every call and does nothing
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NullBackend {
    /// Resources created
    pub created: u64,
    /// Resources destroyed
    pub destroyed: u64,
    /// Commands dispatched
    pub dispatched: u64,
    /// Frames presented
    pub presented: u64,
}

impl NullBackend {
    /// Create a null backend
    pub fn new() -> Self {
        Self::default()
    }

    fn count_dispatch(&mut self) -> BackendResult<()> {
        self.dispatched += 1;
        Ok(())
    }

    fn count_create(&mut self) -> BackendResult<()> {
        self.created += 1;
        Ok(())
    }
}

impl CommandDispatcher for NullBackend {
    fn clear(&mut self, _command: &ClearCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn draw(&mut self, _command: &DrawCommand, _material: &Material) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn viewport(&mut self, _command: &ViewportCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn scissor(&mut self, _command: &ScissorCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn fill_vertex_buffer(&mut self, _command: &FillVertexBufferCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn fill_index_buffer(&mut self, _command: &FillIndexBufferCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn frame_buffer(&mut self, _command: &FrameBufferCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn frame_buffer_texture(&mut self, _command: &FrameBufferTextureCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn generate_mipmaps(&mut self, _command: &GenerateMipmapsCommand) -> BackendResult<()> {
        self.count_dispatch()
    }

    fn set_material_parameters(
        &mut self,
        _command: &SetMaterialParametersCommand,
        _material: &Material,
    ) -> BackendResult<()> {
        self.count_dispatch()
    }
}

impl Backend for NullBackend {
    fn kind(&self) -> GraphicsBackend {
        GraphicsBackend::Null
    }

    fn name(&self) -> &str {
        "null"
    }

    fn attach_surface(&mut self, _surface: &dyn RenderSurface) -> BackendResult<()> {
        Ok(())
    }

    fn create_vertex_buffer(
        &mut self,
        _handle: VertexBufferHandle,
        _data: &[u8],
        _layout: &VertexLayout,
        _usage: BufferUsage,
    ) -> BackendResult<()> {
        self.count_create()
    }

    fn create_index_buffer(
        &mut self,
        _handle: IndexBufferHandle,
        _data: &[u8],
        _index_type: IndexType,
        _usage: BufferUsage,
    ) -> BackendResult<()> {
        self.count_create()
    }

    fn create_shader(&mut self, _handle: ShaderHandle, _stage: ShaderStage, _source: &str) -> BackendResult<()> {
        self.count_create()
    }

    fn create_program(
        &mut self,
        _handle: ProgramHandle,
        _vertex: ShaderHandle,
        _fragment: ShaderHandle,
    ) -> BackendResult<()> {
        self.count_create()
    }

    fn create_texture(&mut self, _handle: TextureHandle, _description: &TextureDescription) -> BackendResult<()> {
        self.count_create()
    }

    fn create_frame_buffer(
        &mut self,
        _handle: FrameBufferHandle,
        _description: &FrameBufferDescription,
    ) -> BackendResult<()> {
        self.count_create()
    }

    fn destroy(&mut self, _resource: ResourceId) -> BackendResult<()> {
        self.destroyed += 1;
        Ok(())
    }

    fn present(&mut self, surface: &mut dyn RenderSurface) -> BackendResult<()> {
        self.presented += 1;
        surface.swap_buffers().map_err(BackendError::Rejected)
    }
}
