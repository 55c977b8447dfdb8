//! Backend abstraction traits
//!
//! A backend is split in two:
//!
//! - [`CommandDispatcher`]: one method per command kind, invoked during
//!   submission. Adding a command kind means adding a method here, and the
//!   exhaustive match in [`dispatch`] makes every backend follow.
//! - [`Backend`]: resource creation and destruction, surface attachment
//!   and presentation, on top of dispatching.
//!
//! Backends refer to resources through the handles the device allocated.
//! They keep their own native objects keyed by those handles and never
//! allocate handles themselves.

use crate::render::backends::GraphicsBackend;
use crate::render::cache::MaterialCache;
use crate::render::command::{
    ClearCommand, Command, DrawCommand, FillIndexBufferCommand, FillVertexBufferCommand, FrameBufferCommand,
    FrameBufferTextureCommand, GenerateMipmapsCommand, ScissorCommand, SetMaterialParametersCommand,
    ViewportCommand,
};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, MaterialHandle, ProgramHandle, ResourceId, ShaderHandle, TextureHandle,
    VertexBufferHandle,
};
use crate::render::resources::{
    BufferUsage, FrameBufferDescription, IndexType, Material, ShaderStage, TextureDescription, VertexLayout,
};
use crate::render::surface::RenderSurface;
use thiserror::Error;

/// Errors reported by a backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Description or command rejected (bad shader, unsupported format)
    #[error("{0}")]
    Rejected(String),

    /// Native device is gone; nothing further will succeed
    #[error("device lost")]
    DeviceLost,

    /// Access outside a resource's storage
    #[error("{resource}: range {offset}..{end} exceeds size {size}")]
    OutOfBounds {
        /// Resource accessed
        resource: ResourceId,
        /// First byte or element accessed
        offset: usize,
        /// One past the last byte or element accessed
        end: usize,
        /// Size of the resource
        size: usize,
    },

    /// Handle the backend has no native object for
    #[error("unknown {0}")]
    UnknownResource(ResourceId),

    /// Feature not available on this backend
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Executes commands, one method per command kind
pub trait CommandDispatcher {
    /// Clear the current target
    fn clear(&mut self, command: &ClearCommand) -> BackendResult<()>;

    /// Draw with an already resolved material
    fn draw(&mut self, command: &DrawCommand, material: &Material) -> BackendResult<()>;

    /// Set the viewport
    fn viewport(&mut self, command: &ViewportCommand) -> BackendResult<()>;

    /// Configure the scissor test
    fn scissor(&mut self, command: &ScissorCommand) -> BackendResult<()>;

    /// Upload vertex data
    fn fill_vertex_buffer(&mut self, command: &FillVertexBufferCommand) -> BackendResult<()>;

    /// Upload index data
    fn fill_index_buffer(&mut self, command: &FillIndexBufferCommand) -> BackendResult<()>;

    /// Bind a frame buffer
    fn frame_buffer(&mut self, command: &FrameBufferCommand) -> BackendResult<()>;

    /// Attach a texture to a frame buffer
    fn frame_buffer_texture(&mut self, command: &FrameBufferTextureCommand) -> BackendResult<()>;

    /// Generate a texture's mip chain
    fn generate_mipmaps(&mut self, command: &GenerateMipmapsCommand) -> BackendResult<()>;

    /// Material parameters changed; `material` already has them applied
    fn set_material_parameters(
        &mut self,
        command: &SetMaterialParametersCommand,
        material: &Material,
    ) -> BackendResult<()>;
}

/// A graphics API implementation
pub trait Backend: CommandDispatcher {
    /// Which API this is
    fn kind(&self) -> GraphicsBackend;

    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Bind to the presentation surface; called once by the device
    fn attach_surface(&mut self, surface: &dyn RenderSurface) -> BackendResult<()>;

    /// Create a vertex buffer with initial contents
    fn create_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        data: &[u8],
        layout: &VertexLayout,
        usage: BufferUsage,
    ) -> BackendResult<()>;

    /// Create an index buffer with initial contents
    fn create_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        data: &[u8],
        index_type: IndexType,
        usage: BufferUsage,
    ) -> BackendResult<()>;

    /// Compile a shader stage from preprocessed source
    fn create_shader(&mut self, handle: ShaderHandle, stage: ShaderStage, source: &str) -> BackendResult<()>;

    /// Link a program from two compiled stages
    fn create_program(
        &mut self,
        handle: ProgramHandle,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> BackendResult<()>;

    /// Create a texture, optionally with level 0 contents
    fn create_texture(&mut self, handle: TextureHandle, description: &TextureDescription) -> BackendResult<()>;

    /// Create a frame buffer from existing textures
    fn create_frame_buffer(
        &mut self,
        handle: FrameBufferHandle,
        description: &FrameBufferDescription,
    ) -> BackendResult<()>;

    /// Release the native object behind `resource`
    fn destroy(&mut self, resource: ResourceId) -> BackendResult<()>;

    /// Present the current frame
    fn present(&mut self, surface: &mut dyn RenderSurface) -> BackendResult<()>;
}

/// Route one command to its dispatcher method
///
/// Exactly one dispatcher method runs per call. Draw and material updates
/// resolve their material from `materials` first. A material update sees a
/// copy with the new parameters merged in; `materials` itself is left for
/// the caller to update once the dispatch succeeded.
pub fn dispatch<D: CommandDispatcher + ?Sized>(
    command: &Command,
    dispatcher: &mut D,
    materials: &MaterialCache,
) -> BackendResult<()> {
    let material = move |handle: MaterialHandle| {
        materials.get(handle).ok_or(BackendError::UnknownResource(ResourceId::Material(handle)))
    };

    match command {
        Command::Clear(cmd) => dispatcher.clear(cmd),
        Command::Draw(cmd) => dispatcher.draw(cmd, material(cmd.material)?),
        Command::Viewport(cmd) => dispatcher.viewport(cmd),
        Command::Scissor(cmd) => dispatcher.scissor(cmd),
        Command::FillVertexBuffer(cmd) => dispatcher.fill_vertex_buffer(cmd),
        Command::FillIndexBuffer(cmd) => dispatcher.fill_index_buffer(cmd),
        Command::FrameBuffer(cmd) => dispatcher.frame_buffer(cmd),
        Command::FrameBufferTexture(cmd) => dispatcher.frame_buffer_texture(cmd),
        Command::GenerateMipmaps(cmd) => dispatcher.generate_mipmaps(cmd),
        Command::SetMaterialParameters(cmd) => {
            let mut merged = material(cmd.material)?.clone();
            merged.parameters.merge(&cmd.parameters);
            dispatcher.set_material_parameters(cmd, &merged)
        }
    }
}

impl<D: CommandDispatcher + ?Sized> CommandDispatcher for Box<D> {
    fn clear(&mut self, command: &ClearCommand) -> BackendResult<()> {
        (**self).clear(command)
    }

    fn draw(&mut self, command: &DrawCommand, material: &Material) -> BackendResult<()> {
        (**self).draw(command, material)
    }

    fn viewport(&mut self, command: &ViewportCommand) -> BackendResult<()> {
        (**self).viewport(command)
    }

    fn scissor(&mut self, command: &ScissorCommand) -> BackendResult<()> {
        (**self).scissor(command)
    }

    fn fill_vertex_buffer(&mut self, command: &FillVertexBufferCommand) -> BackendResult<()> {
        (**self).fill_vertex_buffer(command)
    }

    fn fill_index_buffer(&mut self, command: &FillIndexBufferCommand) -> BackendResult<()> {
        (**self).fill_index_buffer(command)
    }

    fn frame_buffer(&mut self, command: &FrameBufferCommand) -> BackendResult<()> {
        (**self).frame_buffer(command)
    }

    fn frame_buffer_texture(&mut self, command: &FrameBufferTextureCommand) -> BackendResult<()> {
        (**self).frame_buffer_texture(command)
    }

    fn generate_mipmaps(&mut self, command: &GenerateMipmapsCommand) -> BackendResult<()> {
        (**self).generate_mipmaps(command)
    }

    fn set_material_parameters(
        &mut self,
        command: &SetMaterialParametersCommand,
        material: &Material,
    ) -> BackendResult<()> {
        (**self).set_material_parameters(command, material)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn kind(&self) -> GraphicsBackend {
        (**self).kind()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn attach_surface(&mut self, surface: &dyn RenderSurface) -> BackendResult<()> {
        (**self).attach_surface(surface)
    }

    fn create_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        data: &[u8],
        layout: &VertexLayout,
        usage: BufferUsage,
    ) -> BackendResult<()> {
        (**self).create_vertex_buffer(handle, data, layout, usage)
    }

    fn create_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        data: &[u8],
        index_type: IndexType,
        usage: BufferUsage,
    ) -> BackendResult<()> {
        (**self).create_index_buffer(handle, data, index_type, usage)
    }

    fn create_shader(&mut self, handle: ShaderHandle, stage: ShaderStage, source: &str) -> BackendResult<()> {
        (**self).create_shader(handle, stage, source)
    }

    fn create_program(
        &mut self,
        handle: ProgramHandle,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> BackendResult<()> {
        (**self).create_program(handle, vertex, fragment)
    }

    fn create_texture(&mut self, handle: TextureHandle, description: &TextureDescription) -> BackendResult<()> {
        (**self).create_texture(handle, description)
    }

    fn create_frame_buffer(
        &mut self,
        handle: FrameBufferHandle,
        description: &FrameBufferDescription,
    ) -> BackendResult<()> {
        (**self).create_frame_buffer(handle, description)
    }

    fn destroy(&mut self, resource: ResourceId) -> BackendResult<()> {
        (**self).destroy(resource)
    }

    fn present(&mut self, surface: &mut dyn RenderSurface) -> BackendResult<()> {
        (**self).present(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::cache::CollisionPolicy;
    use crate::render::command::CommandKind;
    use slotmap::SlotMap;

    /// Records which dispatcher method ran
    #[derive(Default)]
    struct Recording {
        calls: Vec<CommandKind>,
    }

    impl CommandDispatcher for Recording {
        fn clear(&mut self, _: &ClearCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::Clear);
            Ok(())
        }

        fn draw(&mut self, _: &DrawCommand, _: &Material) -> BackendResult<()> {
            self.calls.push(CommandKind::Draw);
            Ok(())
        }

        fn viewport(&mut self, _: &ViewportCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::Viewport);
            Ok(())
        }

        fn scissor(&mut self, _: &ScissorCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::Scissor);
            Ok(())
        }

        fn fill_vertex_buffer(&mut self, _: &FillVertexBufferCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::FillVertexBuffer);
            Ok(())
        }

        fn fill_index_buffer(&mut self, _: &FillIndexBufferCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::FillIndexBuffer);
            Ok(())
        }

        fn frame_buffer(&mut self, _: &FrameBufferCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::FrameBuffer);
            Ok(())
        }

        fn frame_buffer_texture(&mut self, _: &FrameBufferTextureCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::FrameBufferTexture);
            Ok(())
        }

        fn generate_mipmaps(&mut self, _: &GenerateMipmapsCommand) -> BackendResult<()> {
            self.calls.push(CommandKind::GenerateMipmaps);
            Ok(())
        }

        fn set_material_parameters(&mut self, _: &SetMaterialParametersCommand, _: &Material) -> BackendResult<()> {
            self.calls.push(CommandKind::SetMaterialParameters);
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_calls_matching_method_once() {
        let mut programs: SlotMap<ProgramHandle, ()> = SlotMap::with_key();
        let mut materials = MaterialCache::with_capacity(4, CollisionPolicy::KeepFirst);
        let material = materials.add(Material::new(programs.insert(())));

        let commands: Vec<Command> = vec![
            ClearCommand::default().into(),
            DrawCommand::new(VertexBufferHandle::default(), material, 3).into(),
            GenerateMipmapsCommand::default().into(),
        ];

        let mut dispatcher = Recording::default();
        for command in &commands {
            dispatch(command, &mut dispatcher, &materials).unwrap();
        }

        assert_eq!(dispatcher.calls, vec![CommandKind::Clear, CommandKind::Draw, CommandKind::GenerateMipmaps]);
    }

    #[test]
    fn test_dispatch_unknown_material() {
        let materials = MaterialCache::with_capacity(0, CollisionPolicy::KeepFirst);
        let draw = Command::from(DrawCommand::default());

        let mut dispatcher = Recording::default();
        let result = dispatch(&draw, &mut dispatcher, &materials);

        assert!(matches!(result, Err(BackendError::UnknownResource(ResourceId::Material(_)))));
        assert!(dispatcher.calls.is_empty());
    }

    #[test]
    fn test_boxed_dispatcher_forwards() {
        let materials = MaterialCache::with_capacity(0, CollisionPolicy::KeepFirst);
        let mut boxed: Box<Recording> = Box::default();
        dispatch(&Command::from(ViewportCommand::default()), &mut boxed, &materials).unwrap();
        assert_eq!(boxed.calls, vec![CommandKind::Viewport]);
    }
}
