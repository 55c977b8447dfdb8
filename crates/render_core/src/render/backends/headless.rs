//! # Headless Backend
//!
//! Keeps every resource in system memory and tracks the pipeline state a
//! real driver would track: bound frame buffers, viewport, scissor and
//! clear colors. Commands are validated against that state the way a driver
//! validates them, so bounds violations, unknown handles and feedback loops
//! surface as [`BackendError`]s.
//!
//! Every call is appended to a call log, which tests use to check dispatch
//! order and resource creation counts. Failures can be injected per
//! command kind with [`HeadlessBackend::fail_on`].

use crate::foundation::math::{Color, Rectangle};
use crate::render::backend::{Backend, BackendError, BackendResult, CommandDispatcher};
use crate::render::backends::GraphicsBackend;
use crate::render::command::{
    ClearCommand, ClearFlags, CommandKind, DrawCommand, FillIndexBufferCommand, FillVertexBufferCommand,
    FrameBufferBinding, FrameBufferCommand, FrameBufferTextureCommand, GenerateMipmapsCommand, ScissorCommand,
    SetMaterialParametersCommand, ViewportCommand,
};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, ProgramHandle, ResourceId, ResourceKind, ShaderHandle, TextureHandle,
    VertexBufferHandle,
};
use crate::render::resources::{
    AttachmentPoint, BufferUsage, FrameBufferDescription, IndexType, Material, MaterialParameters, ShaderStage,
    TextureDescription, TextureMetadata, VertexLayout,
};
use crate::render::surface::RenderSurface;
use std::collections::{BTreeMap, HashMap};

/// Largest size a dynamic or stream buffer may grow to through uploads
pub const MAX_BUFFER_SIZE: usize = 1 << 30;

/// One entry of the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    /// A resource was created
    Create(ResourceId),
    /// A resource was destroyed
    Destroy(ResourceId),
    /// A command reached the dispatcher (whether or not it succeeded)
    Dispatch(CommandKind),
    /// A frame was presented
    Present,
}

/// Work counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    /// Successful draw calls
    pub draw_calls: u64,
    /// Vertices (or indices) consumed by draws
    pub vertices: u64,
    /// Bytes written by fill commands
    pub bytes_uploaded: u64,
    /// Clears executed
    pub clears: u64,
    /// Frames presented
    pub frames: u64,
}

#[derive(Debug)]
struct VertexBufferState {
    data: Vec<u8>,
    vertex_size: usize,
    usage: BufferUsage,
}

#[derive(Debug)]
struct IndexBufferState {
    data: Vec<u8>,
    index_type: IndexType,
    usage: BufferUsage,
}

impl IndexBufferState {
    fn count(&self) -> usize {
        self.data.len() / self.index_type.size() as usize
    }

    /// Largest index among the first `count` indices
    fn max_index(&self, count: usize) -> Option<u32> {
        let size = self.index_type.size() as usize;
        self.data.chunks_exact(size).take(count).map(|bytes| decode_index(self.index_type, bytes)).max()
    }
}

fn decode_index(index_type: IndexType, bytes: &[u8]) -> u32 {
    match index_type {
        IndexType::UInt8 => u32::from(bytes[0]),
        IndexType::UInt16 => u32::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
        IndexType::UInt32 => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

#[derive(Debug)]
struct TextureState {
    metadata: TextureMetadata,
    initialized: bool,
    generated_levels: u32,
}

#[derive(Debug, Default)]
struct FrameBufferState {
    attachments: BTreeMap<AttachmentPoint, (TextureHandle, u32)>,
}

/// CPU simulation of a graphics device
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    vertex_buffers: HashMap<VertexBufferHandle, VertexBufferState>,
    index_buffers: HashMap<IndexBufferHandle, IndexBufferState>,
    shaders: HashMap<ShaderHandle, ShaderStage>,
    programs: HashMap<ProgramHandle, (ShaderHandle, ShaderHandle)>,
    textures: HashMap<TextureHandle, TextureState>,
    frame_buffers: HashMap<FrameBufferHandle, FrameBufferState>,

    draw_target: Option<FrameBufferHandle>,
    read_target: Option<FrameBufferHandle>,
    viewport: Rectangle,
    scissor: Option<Rectangle>,
    clear_colors: HashMap<Option<FrameBufferHandle>, Color>,
    surface_size: Option<(u32, u32)>,

    failures: HashMap<CommandKind, BackendError>,
    device_lost: bool,
    calls: Vec<BackendCall>,
    stats: HeadlessStats,
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future command of `kind` fail with `error`
    pub fn fail_on(&mut self, kind: CommandKind, error: BackendError) {
        self.failures.insert(kind, error);
    }

    /// Remove all injected failures
    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    /// Simulate losing the device; every later call fails
    pub fn lose_device(&mut self) {
        log::warn!("headless backend: simulating device loss");
        self.device_lost = true;
    }

    /// Call log in order
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Kinds of dispatched commands in order
    pub fn dispatched(&self) -> Vec<CommandKind> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Dispatch(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Number of resources of `kind` created so far
    pub fn created_count(&self, kind: ResourceKind) -> usize {
        self.calls.iter().filter(|call| matches!(call, BackendCall::Create(id) if id.kind() == kind)).count()
    }

    /// Forget the call log
    pub fn reset_calls(&mut self) {
        self.calls.clear();
    }

    /// Work counters
    pub fn stats(&self) -> HeadlessStats {
        self.stats
    }

    /// Whether the backend holds a native object for `resource`
    pub fn contains(&self, resource: ResourceId) -> bool {
        match resource {
            ResourceId::VertexBuffer(h) => self.vertex_buffers.contains_key(&h),
            ResourceId::IndexBuffer(h) => self.index_buffers.contains_key(&h),
            ResourceId::Shader(h) => self.shaders.contains_key(&h),
            ResourceId::Program(h) => self.programs.contains_key(&h),
            ResourceId::Texture(h) => self.textures.contains_key(&h),
            ResourceId::FrameBuffer(h) => self.frame_buffers.contains_key(&h),
            ResourceId::Material(_) => false,
        }
    }

    /// Number of native objects alive
    pub fn live_resources(&self) -> usize {
        self.vertex_buffers.len()
            + self.index_buffers.len()
            + self.shaders.len()
            + self.programs.len()
            + self.textures.len()
            + self.frame_buffers.len()
    }

    /// Contents of a vertex buffer
    pub fn vertex_buffer_data(&self, handle: VertexBufferHandle) -> Option<&[u8]> {
        self.vertex_buffers.get(&handle).map(|buffer| buffer.data.as_slice())
    }

    /// Contents of an index buffer
    pub fn index_buffer_data(&self, handle: IndexBufferHandle) -> Option<&[u8]> {
        self.index_buffers.get(&handle).map(|buffer| buffer.data.as_slice())
    }

    /// Last clear color of a target; `None` is the surface
    pub fn clear_color(&self, target: Option<FrameBufferHandle>) -> Option<Color> {
        self.clear_colors.get(&target).copied()
    }

    /// Size of the attached surface
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface_size
    }

    /// Current viewport
    pub fn current_viewport(&self) -> Rectangle {
        self.viewport
    }

    /// Current scissor rectangle, `None` when the test is disabled
    pub fn current_scissor(&self) -> Option<Rectangle> {
        self.scissor
    }

    /// Frame buffer draws currently go to; `None` is the surface
    pub fn draw_target(&self) -> Option<FrameBufferHandle> {
        self.draw_target
    }

    /// Texture attached at `point`
    pub fn attachment(&self, frame_buffer: FrameBufferHandle, point: AttachmentPoint) -> Option<TextureHandle> {
        self.frame_buffers.get(&frame_buffer)?.attachments.get(&point).map(|(texture, _)| *texture)
    }

    /// Mip levels with valid contents, counting level 0
    pub fn texture_levels(&self, texture: TextureHandle) -> Option<u32> {
        self.textures.get(&texture).map(|state| state.generated_levels)
    }

    fn begin(&mut self, kind: CommandKind) -> BackendResult<()> {
        self.calls.push(BackendCall::Dispatch(kind));
        if self.device_lost {
            return Err(BackendError::DeviceLost);
        }
        match self.failures.get(&kind) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn check_alive(&self) -> BackendResult<()> {
        if self.device_lost {
            Err(BackendError::DeviceLost)
        } else {
            Ok(())
        }
    }

    fn created(&mut self, resource: impl Into<ResourceId>) -> BackendResult<()> {
        let resource = resource.into();
        log::trace!("headless backend: created {resource}");
        self.calls.push(BackendCall::Create(resource));
        Ok(())
    }

    fn require(&self, resource: impl Into<ResourceId>) -> BackendResult<()> {
        let resource = resource.into();
        if self.contains(resource) {
            Ok(())
        } else {
            Err(BackendError::UnknownResource(resource))
        }
    }

    fn require_target(&self, target: Option<FrameBufferHandle>) -> BackendResult<()> {
        target.map_or(Ok(()), |fb| self.require(fb))
    }

    fn check_parameters(&self, program: ProgramHandle, parameters: &MaterialParameters) -> BackendResult<()> {
        self.require(program)?;
        for texture in parameters.textures() {
            self.require(texture)?;
        }
        Ok(())
    }

    fn check_feedback(&self, parameters: &MaterialParameters) -> BackendResult<()> {
        let Some(target) = self.draw_target.and_then(|fb| self.frame_buffers.get(&fb)) else {
            return Ok(());
        };
        for texture in parameters.textures() {
            if target.attachments.values().any(|(attached, _)| *attached == texture) {
                return Err(BackendError::Rejected(format!(
                    "{} is sampled while attached to the bound frame buffer",
                    ResourceId::from(texture)
                )));
            }
        }
        Ok(())
    }
}

/// Reject shader source that could never compile
///
/// Requires a `main` entry point and balanced brackets outside line
/// comments.
pub fn validate_shader_source(stage: ShaderStage, source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err(format!("{stage} shader source is empty"));
    }

    let mut open = Vec::new();
    let mut has_main = false;
    for (line_number, line) in source.lines().enumerate() {
        let code = line.split("//").next().unwrap_or_default();
        has_main |= code.split(|c: char| !c.is_alphanumeric() && c != '_').any(|word| word == "main");

        for c in code.chars() {
            match c {
                '(' | '{' | '[' => open.push((c, line_number + 1)),
                ')' | '}' | ']' => {
                    let expected = match c {
                        ')' => '(',
                        '}' => '{',
                        _ => '[',
                    };
                    match open.pop() {
                        Some((opened, _)) if opened == expected => {}
                        Some((opened, opened_at)) => {
                            return Err(format!(
                                "{stage} shader line {}: '{c}' closes '{opened}' opened on line {opened_at}",
                                line_number + 1
                            ));
                        }
                        None => {
                            return Err(format!("{stage} shader line {}: unmatched '{c}'", line_number + 1));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Some((opened, line)) = open.pop() {
        return Err(format!("{stage} shader: '{opened}' opened on line {line} is never closed"));
    }
    if !has_main {
        return Err(format!("{stage} shader has no main function"));
    }
    Ok(())
}

fn write_bytes(
    data: &mut Vec<u8>,
    usage: BufferUsage,
    offset: usize,
    bytes: &[u8],
    resource: ResourceId,
) -> BackendResult<()> {
    let size = data.len();
    let end = offset.checked_add(bytes.len()).ok_or(BackendError::OutOfBounds {
        resource,
        offset,
        end: usize::MAX,
        size,
    })?;
    if end > size {
        if usage == BufferUsage::Static || end > MAX_BUFFER_SIZE {
            return Err(BackendError::OutOfBounds { resource, offset, end, size });
        }
        data.resize(end, 0);
    }
    data[offset..end].copy_from_slice(bytes);
    Ok(())
}

impl CommandDispatcher for HeadlessBackend {
    fn clear(&mut self, command: &ClearCommand) -> BackendResult<()> {
        self.begin(CommandKind::Clear)?;
        self.require_target(self.draw_target)?;

        if command.flags.contains(ClearFlags::COLOR) {
            self.clear_colors.insert(self.draw_target, command.color);
        }
        self.stats.clears += 1;
        Ok(())
    }

    fn draw(&mut self, command: &DrawCommand, material: &Material) -> BackendResult<()> {
        self.begin(CommandKind::Draw)?;
        self.require_target(self.draw_target)?;
        self.check_parameters(material.program, &material.parameters)?;
        self.check_feedback(&material.parameters)?;

        let vertex_buffer = self
            .vertex_buffers
            .get(&command.vertex_buffer)
            .ok_or(BackendError::UnknownResource(command.vertex_buffer.into()))?;
        let vertex_count = vertex_buffer.data.len() / vertex_buffer.vertex_size;
        let requested = command.vertex_count as usize;

        match command.index_buffer {
            Some(handle) => {
                let index_buffer =
                    self.index_buffers.get(&handle).ok_or(BackendError::UnknownResource(handle.into()))?;
                if requested > index_buffer.count() {
                    return Err(BackendError::OutOfBounds {
                        resource: handle.into(),
                        offset: 0,
                        end: requested,
                        size: index_buffer.count(),
                    });
                }
                if let Some(max) = index_buffer.max_index(requested) {
                    if max as usize >= vertex_count {
                        return Err(BackendError::OutOfBounds {
                            resource: command.vertex_buffer.into(),
                            offset: max as usize,
                            end: max as usize + 1,
                            size: vertex_count,
                        });
                    }
                }
            }
            None if requested > vertex_count => {
                return Err(BackendError::OutOfBounds {
                    resource: command.vertex_buffer.into(),
                    offset: 0,
                    end: requested,
                    size: vertex_count,
                });
            }
            None => {}
        }

        self.stats.draw_calls += 1;
        self.stats.vertices += u64::from(command.vertex_count);
        Ok(())
    }

    fn viewport(&mut self, command: &ViewportCommand) -> BackendResult<()> {
        self.begin(CommandKind::Viewport)?;
        self.viewport = command.rectangle;
        Ok(())
    }

    fn scissor(&mut self, command: &ScissorCommand) -> BackendResult<()> {
        self.begin(CommandKind::Scissor)?;
        self.scissor = command.enabled.then_some(command.rectangle);
        Ok(())
    }

    fn fill_vertex_buffer(&mut self, command: &FillVertexBufferCommand) -> BackendResult<()> {
        self.begin(CommandKind::FillVertexBuffer)?;
        let resource = ResourceId::from(command.buffer);
        let buffer = self.vertex_buffers.get_mut(&command.buffer).ok_or(BackendError::UnknownResource(resource))?;
        write_bytes(&mut buffer.data, buffer.usage, command.offset, &command.data, resource)?;
        self.stats.bytes_uploaded += command.data.len() as u64;
        Ok(())
    }

    fn fill_index_buffer(&mut self, command: &FillIndexBufferCommand) -> BackendResult<()> {
        self.begin(CommandKind::FillIndexBuffer)?;
        let resource = ResourceId::from(command.buffer);
        let buffer = self.index_buffers.get_mut(&command.buffer).ok_or(BackendError::UnknownResource(resource))?;
        let index_size = buffer.index_type.size() as usize;
        if command.offset % index_size != 0 || command.data.len() % index_size != 0 {
            return Err(BackendError::Rejected(format!(
                "index upload of {} bytes at offset {} is not aligned to {:?}",
                command.data.len(),
                command.offset,
                buffer.index_type
            )));
        }
        write_bytes(&mut buffer.data, buffer.usage, command.offset, &command.data, resource)?;
        self.stats.bytes_uploaded += command.data.len() as u64;
        Ok(())
    }

    fn frame_buffer(&mut self, command: &FrameBufferCommand) -> BackendResult<()> {
        self.begin(CommandKind::FrameBuffer)?;
        self.require_target(command.frame_buffer)?;

        match command.binding {
            FrameBufferBinding::Read => self.read_target = command.frame_buffer,
            FrameBufferBinding::Draw => self.draw_target = command.frame_buffer,
            FrameBufferBinding::ReadDraw => {
                self.read_target = command.frame_buffer;
                self.draw_target = command.frame_buffer;
            }
        }
        Ok(())
    }

    fn frame_buffer_texture(&mut self, command: &FrameBufferTextureCommand) -> BackendResult<()> {
        self.begin(CommandKind::FrameBufferTexture)?;
        self.require(command.frame_buffer)?;

        let texture = self
            .textures
            .get(&command.texture)
            .ok_or(BackendError::UnknownResource(command.texture.into()))?;
        if command.mip_level >= texture.metadata.mip_levels {
            return Err(BackendError::OutOfBounds {
                resource: command.texture.into(),
                offset: command.mip_level as usize,
                end: command.mip_level as usize + 1,
                size: texture.metadata.mip_levels as usize,
            });
        }
        check_attachment_format(command.point, &texture.metadata)?;

        if let Some(frame_buffer) = self.frame_buffers.get_mut(&command.frame_buffer) {
            frame_buffer.attachments.insert(command.point, (command.texture, command.mip_level));
        }
        Ok(())
    }

    fn generate_mipmaps(&mut self, command: &GenerateMipmapsCommand) -> BackendResult<()> {
        self.begin(CommandKind::GenerateMipmaps)?;
        let texture = self
            .textures
            .get_mut(&command.texture)
            .ok_or(BackendError::UnknownResource(command.texture.into()))?;

        if texture.metadata.format.is_depth() {
            return Err(BackendError::Unsupported(format!(
                "mipmap generation for {:?} textures",
                texture.metadata.format
            )));
        }
        if !texture.initialized {
            log::debug!("headless backend: generating mipmaps from an uninitialized level 0");
        }
        texture.generated_levels = texture.metadata.mip_levels;
        Ok(())
    }

    fn set_material_parameters(
        &mut self,
        command: &SetMaterialParametersCommand,
        material: &Material,
    ) -> BackendResult<()> {
        self.begin(CommandKind::SetMaterialParameters)?;
        self.check_parameters(material.program, &command.parameters)
    }
}

fn check_attachment_format(point: AttachmentPoint, metadata: &TextureMetadata) -> BackendResult<()> {
    let is_depth = metadata.format.is_depth();
    let wants_depth = !matches!(point, AttachmentPoint::Color(_));
    if is_depth == wants_depth {
        Ok(())
    } else {
        Err(BackendError::Rejected(format!("{:?} texture cannot be attached at {point:?}", metadata.format)))
    }
}

impl Backend for HeadlessBackend {
    fn kind(&self) -> GraphicsBackend {
        GraphicsBackend::Headless
    }

    fn name(&self) -> &str {
        "headless"
    }

    fn attach_surface(&mut self, surface: &dyn RenderSurface) -> BackendResult<()> {
        let (width, height) = surface.size();
        self.surface_size = Some((width, height));
        self.viewport = Rectangle::from_size(width, height);
        log::debug!("headless backend: attached {width}x{height} surface");
        Ok(())
    }

    fn create_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        data: &[u8],
        layout: &VertexLayout,
        usage: BufferUsage,
    ) -> BackendResult<()> {
        self.check_alive()?;
        layout.validate().map_err(BackendError::Rejected)?;

        let vertex_size = layout.vertex_size() as usize;
        if data.len() % vertex_size != 0 {
            return Err(BackendError::Rejected(format!(
                "{} bytes of vertex data is not a multiple of the {vertex_size}-byte vertex",
                data.len()
            )));
        }

        self.vertex_buffers.insert(handle, VertexBufferState { data: data.to_vec(), vertex_size, usage });
        self.created(handle)
    }

    fn create_index_buffer(
        &mut self,
        handle: IndexBufferHandle,
        data: &[u8],
        index_type: IndexType,
        usage: BufferUsage,
    ) -> BackendResult<()> {
        self.check_alive()?;
        if data.len() % index_type.size() as usize != 0 {
            return Err(BackendError::Rejected(format!(
                "{} bytes of index data is not a multiple of {index_type:?}",
                data.len()
            )));
        }

        self.index_buffers.insert(handle, IndexBufferState { data: data.to_vec(), index_type, usage });
        self.created(handle)
    }

    fn create_shader(&mut self, handle: ShaderHandle, stage: ShaderStage, source: &str) -> BackendResult<()> {
        self.check_alive()?;
        validate_shader_source(stage, source).map_err(BackendError::Rejected)?;

        self.shaders.insert(handle, stage);
        self.created(handle)
    }

    fn create_program(
        &mut self,
        handle: ProgramHandle,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> BackendResult<()> {
        self.check_alive()?;
        for (shader, expected) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
            let stage = self.shaders.get(&shader).ok_or(BackendError::UnknownResource(shader.into()))?;
            if *stage != expected {
                return Err(BackendError::Rejected(format!("expected a {expected} shader, got a {stage} shader")));
            }
        }

        self.programs.insert(handle, (vertex, fragment));
        self.created(handle)
    }

    fn create_texture(&mut self, handle: TextureHandle, description: &TextureDescription) -> BackendResult<()> {
        self.check_alive()?;
        let metadata = description.metadata;
        metadata.validate().map_err(BackendError::Rejected)?;

        if let Some(data) = &description.data {
            let expected = metadata.base_level_size().ok_or_else(|| {
                BackendError::Rejected(format!("{}x{} texture is too large", metadata.width, metadata.height))
            })?;
            if data.len() != expected {
                return Err(BackendError::Rejected(format!(
                    "{}x{} {:?} texture needs {expected} bytes, got {}",
                    metadata.width,
                    metadata.height,
                    metadata.format,
                    data.len()
                )));
            }
        }

        let initialized = description.data.is_some();
        self.textures.insert(handle, TextureState { metadata, initialized, generated_levels: 1 });
        self.created(handle)
    }

    fn create_frame_buffer(
        &mut self,
        handle: FrameBufferHandle,
        description: &FrameBufferDescription,
    ) -> BackendResult<()> {
        self.check_alive()?;
        description.validate().map_err(BackendError::Rejected)?;

        let mut state = FrameBufferState::default();
        for attachment in &description.attachments {
            let texture = self
                .textures
                .get(&attachment.texture)
                .ok_or(BackendError::UnknownResource(attachment.texture.into()))?;
            check_attachment_format(attachment.point, &texture.metadata)?;
            state.attachments.insert(attachment.point, (attachment.texture, 0));
        }

        self.frame_buffers.insert(handle, state);
        self.created(handle)
    }

    fn destroy(&mut self, resource: ResourceId) -> BackendResult<()> {
        self.check_alive()?;
        let removed = match resource {
            ResourceId::VertexBuffer(h) => self.vertex_buffers.remove(&h).is_some(),
            ResourceId::IndexBuffer(h) => self.index_buffers.remove(&h).is_some(),
            ResourceId::Shader(h) => self.shaders.remove(&h).is_some(),
            ResourceId::Program(h) => self.programs.remove(&h).is_some(),
            ResourceId::Texture(h) => self.textures.remove(&h).is_some(),
            ResourceId::FrameBuffer(h) => {
                if self.draw_target == Some(h) {
                    self.draw_target = None;
                }
                if self.read_target == Some(h) {
                    self.read_target = None;
                }
                self.clear_colors.remove(&Some(h));
                self.frame_buffers.remove(&h).is_some()
            }
            // Materials have no native object
            ResourceId::Material(_) => return Ok(()),
        };

        if !removed {
            return Err(BackendError::UnknownResource(resource));
        }
        self.calls.push(BackendCall::Destroy(resource));
        Ok(())
    }

    fn present(&mut self, surface: &mut dyn RenderSurface) -> BackendResult<()> {
        self.check_alive()?;
        surface.swap_buffers().map_err(BackendError::Rejected)?;
        self.stats.frames += 1;
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::resources::{AttributeType, FrameBufferAttachment, TextureFormat, VertexAttribute};
    use crate::render::surface::HeadlessSurface;
    use slotmap::SlotMap;

    const VERTEX_SHADER: &str = "#version 330 core\nlayout(location = 0) in vec3 position;\nvoid main() {\n    gl_Position = vec4(position, 1.0);\n}\n";

    fn position_layout() -> VertexLayout {
        VertexLayout::new(vec![VertexAttribute::new(0, AttributeType::Float32, 3, false, 12, 0)])
    }

    #[test]
    fn test_shader_validation() {
        assert!(validate_shader_source(ShaderStage::Vertex, VERTEX_SHADER).is_ok());
        assert!(validate_shader_source(ShaderStage::Vertex, "   ").is_err());
        assert!(validate_shader_source(ShaderStage::Fragment, "void main() {").is_err());
        assert!(validate_shader_source(ShaderStage::Fragment, "void main() { ) }").is_err());
        assert!(validate_shader_source(ShaderStage::Fragment, "void entry() {}").is_err());
        assert!(validate_shader_source(ShaderStage::Fragment, "void main() {} // trailing (").is_ok());
    }

    #[test]
    fn test_static_buffer_rejects_overflow() {
        let mut handles: SlotMap<VertexBufferHandle, ()> = SlotMap::with_key();
        let handle = handles.insert(());

        let mut backend = HeadlessBackend::new();
        backend.create_vertex_buffer(handle, &[0; 24], &position_layout(), BufferUsage::Static).unwrap();

        let mut fill = FillVertexBufferCommand::default();
        fill.set_buffer(handle).set_data(vec![1; 12]).set_offset(12);
        backend.fill_vertex_buffer(&fill).unwrap();
        assert_eq!(&backend.vertex_buffer_data(handle).unwrap()[12..], &[1; 12]);

        fill.set_offset(24);
        let result = backend.fill_vertex_buffer(&fill);
        assert!(matches!(result, Err(BackendError::OutOfBounds { offset: 24, end: 36, size: 24, .. })));
    }

    #[test]
    fn test_dynamic_buffer_grows() {
        let mut handles: SlotMap<VertexBufferHandle, ()> = SlotMap::with_key();
        let handle = handles.insert(());

        let mut backend = HeadlessBackend::new();
        backend.create_vertex_buffer(handle, &[], &position_layout(), BufferUsage::Dynamic).unwrap();

        let mut fill = FillVertexBufferCommand::default();
        fill.set_buffer(handle).set_vertices(&[0.0_f32; 9]);
        backend.fill_vertex_buffer(&fill).unwrap();

        assert_eq!(backend.vertex_buffer_data(handle).unwrap().len(), 36);
        assert_eq!(backend.stats().bytes_uploaded, 36);
    }

    #[test]
    fn test_offset_overflow_rejected() {
        let mut handles: SlotMap<VertexBufferHandle, ()> = SlotMap::with_key();
        let mut backend = HeadlessBackend::new();

        for usage in [BufferUsage::Static, BufferUsage::Dynamic, BufferUsage::Stream] {
            let handle = handles.insert(());
            backend.create_vertex_buffer(handle, &[0; 12], &position_layout(), usage).unwrap();

            let mut fill = FillVertexBufferCommand::default();
            fill.set_buffer(handle).set_data(vec![1; 12]).set_offset(usize::MAX - 4);
            let result = backend.fill_vertex_buffer(&fill);

            assert!(matches!(result, Err(BackendError::OutOfBounds { end: usize::MAX, size: 12, .. })));
            assert_eq!(backend.vertex_buffer_data(handle).unwrap(), &[0; 12]);
        }
        assert_eq!(backend.stats().bytes_uploaded, 0);
    }

    #[test]
    fn test_dynamic_growth_is_capped() {
        let mut handles: SlotMap<VertexBufferHandle, ()> = SlotMap::with_key();
        let handle = handles.insert(());

        let mut backend = HeadlessBackend::new();
        backend.create_vertex_buffer(handle, &[], &position_layout(), BufferUsage::Dynamic).unwrap();

        let mut fill = FillVertexBufferCommand::default();
        fill.set_buffer(handle).set_data(vec![1; 12]).set_offset(1 << 40);
        let result = backend.fill_vertex_buffer(&fill);

        assert!(matches!(result, Err(BackendError::OutOfBounds { offset, size: 0, .. }) if offset == 1 << 40));
        assert!(backend.vertex_buffer_data(handle).unwrap().is_empty());

        fill.set_offset(MAX_BUFFER_SIZE - 11);
        assert!(matches!(backend.fill_vertex_buffer(&fill), Err(BackendError::OutOfBounds { .. })));
    }

    #[test]
    fn test_index_offset_overflow_rejected() {
        let mut handles: SlotMap<IndexBufferHandle, ()> = SlotMap::with_key();
        let handle = handles.insert(());

        let mut backend = HeadlessBackend::new();
        backend.create_index_buffer(handle, &[0; 6], IndexType::UInt16, BufferUsage::Stream).unwrap();

        let mut fill = FillIndexBufferCommand::default();
        fill.set_buffer(handle).set_data(vec![1; 4]).set_offset(usize::MAX - 1);
        let result = backend.fill_index_buffer(&fill);

        assert!(matches!(result, Err(BackendError::OutOfBounds { .. })));
        assert_eq!(backend.index_buffer_data(handle).unwrap(), &[0; 6]);
    }

    #[test]
    fn test_oversized_texture_rejected() {
        let mut handles: SlotMap<TextureHandle, ()> = SlotMap::with_key();
        let metadata = TextureMetadata::new_2d(u32::MAX, u32::MAX, TextureFormat::Rgba32F);

        let mut backend = HeadlessBackend::new();
        let result = backend.create_texture(handles.insert(()), &TextureDescription::with_data(metadata, vec![0; 16]));

        assert!(matches!(result, Err(BackendError::Rejected(_))));
        assert_eq!(backend.created_count(ResourceKind::Texture), 0);
    }

    #[test]
    fn test_program_requires_matching_stages() {
        let mut shaders: SlotMap<ShaderHandle, ()> = SlotMap::with_key();
        let mut programs: SlotMap<ProgramHandle, ()> = SlotMap::with_key();
        let (vs, fs) = (shaders.insert(()), shaders.insert(()));

        let mut backend = HeadlessBackend::new();
        backend.create_shader(vs, ShaderStage::Vertex, VERTEX_SHADER).unwrap();
        backend.create_shader(fs, ShaderStage::Vertex, VERTEX_SHADER).unwrap();

        let result = backend.create_program(programs.insert(()), vs, fs);
        assert!(matches!(result, Err(BackendError::Rejected(_))));
        assert_eq!(backend.created_count(ResourceKind::Program), 0);
    }

    #[test]
    fn test_indexed_draw_bounds() {
        let mut vbufs: SlotMap<VertexBufferHandle, ()> = SlotMap::with_key();
        let mut ibufs: SlotMap<IndexBufferHandle, ()> = SlotMap::with_key();
        let mut shaders: SlotMap<ShaderHandle, ()> = SlotMap::with_key();
        let mut programs: SlotMap<ProgramHandle, ()> = SlotMap::with_key();
        let (vbuf, ibuf) = (vbufs.insert(()), ibufs.insert(()));
        let (vs, fs, program) = (shaders.insert(()), shaders.insert(()), programs.insert(()));

        let mut backend = HeadlessBackend::new();
        backend.create_vertex_buffer(vbuf, &[0; 36], &position_layout(), BufferUsage::Static).unwrap();
        let indices: [u16; 4] = [0, 1, 2, 3];
        backend
            .create_index_buffer(ibuf, bytemuck::cast_slice(&indices), IndexType::UInt16, BufferUsage::Static)
            .unwrap();
        backend.create_shader(vs, ShaderStage::Vertex, VERTEX_SHADER).unwrap();
        backend.create_shader(fs, ShaderStage::Fragment, "void main() {}").unwrap();
        backend.create_program(program, vs, fs).unwrap();

        let material = Material::new(program);
        let mut draw = DrawCommand::default();
        draw.set_vertex_buffer(vbuf).set_index_buffer(ibuf).set_vertex_count(3);
        backend.draw(&draw, &material).unwrap();

        draw.set_vertex_count(4);
        let result = backend.draw(&draw, &material);
        assert!(matches!(result, Err(BackendError::OutOfBounds { offset: 3, size: 3, .. })));
        assert_eq!(backend.stats().draw_calls, 1);
    }

    #[test]
    fn test_render_target_binding_and_clear() {
        let mut textures: SlotMap<TextureHandle, ()> = SlotMap::with_key();
        let mut fbs: SlotMap<FrameBufferHandle, ()> = SlotMap::with_key();
        let (color, depth) = (textures.insert(()), textures.insert(()));
        let fb = fbs.insert(());

        let mut backend = HeadlessBackend::new();
        backend.attach_surface(&HeadlessSurface::new(320, 240)).unwrap();
        assert_eq!(backend.current_viewport(), Rectangle::from_size(320, 240));

        let color_meta = TextureMetadata::new_2d(64, 64, TextureFormat::Rgba8);
        let depth_meta = TextureMetadata::new_2d(64, 64, TextureFormat::Depth24Stencil8);
        backend.create_texture(color, &TextureDescription::empty(color_meta)).unwrap();
        backend.create_texture(depth, &TextureDescription::empty(depth_meta)).unwrap();

        let bad = FrameBufferDescription::new(vec![FrameBufferAttachment {
            point: AttachmentPoint::Color(0),
            texture: depth,
        }]);
        assert!(backend.create_frame_buffer(fb, &bad).is_err());

        let good = FrameBufferDescription::new(vec![
            FrameBufferAttachment { point: AttachmentPoint::Color(0), texture: color },
            FrameBufferAttachment { point: AttachmentPoint::DepthStencil, texture: depth },
        ]);
        backend.create_frame_buffer(fb, &good).unwrap();

        let mut bind = FrameBufferCommand::default();
        bind.set_frame_buffer(fb);
        backend.frame_buffer(&bind).unwrap();

        let mut clear = ClearCommand::default();
        clear.set_color(0.0, 1.0, 0.0, 1.0).set_clear_color(true);
        backend.clear(&clear).unwrap();

        assert_eq!(backend.draw_target(), Some(fb));
        assert_eq!(backend.clear_color(Some(fb)), Some(Color::new(0.0, 1.0, 0.0, 1.0)));
        assert_eq!(backend.clear_color(None), None);
        assert_eq!(backend.attachment(fb, AttachmentPoint::DepthStencil), Some(depth));
    }

    #[test]
    fn test_injected_failure_is_logged() {
        let mut backend = HeadlessBackend::new();
        backend.fail_on(CommandKind::Viewport, BackendError::DeviceLost);

        assert!(backend.viewport(&ViewportCommand::default()).is_err());
        assert_eq!(backend.dispatched(), vec![CommandKind::Viewport]);

        backend.clear_failures();
        assert!(backend.viewport(&ViewportCommand::default()).is_ok());
    }

    #[test]
    fn test_destroy_unknown_resource() {
        let mut backend = HeadlessBackend::new();
        let id = ResourceId::from(TextureHandle::default());
        assert_eq!(backend.destroy(id), Err(BackendError::UnknownResource(id)));
    }
}
