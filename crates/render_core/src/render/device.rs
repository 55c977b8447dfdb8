//! # Graphics Device
//!
//! The device owns the backend, the presentation surface, a registry of
//! every resource it created and the texture, program and material caches.
//! Client code talks only to the device:
//!
//! 1. `make_*` factories turn descriptions into handles
//! 2. commands referencing those handles are recorded into a
//!    [`CommandList`]
//! 3. [`GraphicsDevice::submit`] validates, optionally sorts, and
//!    dispatches the list; [`GraphicsDevice::submit_and_swap`] also
//!    presents the frame
//!
//! ## Handle Validation
//!
//! The registry is a set of generational slot maps, one per resource kind.
//! A handle whose slot was freed no longer resolves, so every submission is
//! checked up front and a stale handle fails the whole submission before
//! anything reaches the backend.
//!
//! ## Failure Model
//!
//! Factory failures leave the device exactly as it was. A backend failure
//! during dispatch aborts the rest of the submission; commands dispatched
//! before it are not rolled back.

use crate::config::DeviceConfig;
use crate::render::backend::{dispatch, Backend, BackendError};
use crate::render::backends::create_backend;
use crate::render::cache::{CacheInsert, CollisionPolicy, MaterialCache, ProgramCache, ResourceKey, TextureCache};
use crate::render::command::{sort_commands, Command, CommandList, SortContext};
use crate::render::error::{RenderError, RenderResult};
use crate::render::handle::{
    FrameBufferHandle, IndexBufferHandle, MaterialHandle, ProgramHandle, ResourceId, ResourceKind, ShaderHandle,
    TextureHandle, VertexBufferHandle,
};
use crate::render::resources::{
    AttachmentPoint, BufferUsage, FrameBufferAttachment, FrameBufferDescription, IndexType, Material, ShaderSource, ShaderStage,
    TextureDescription, TextureMetadata, VertexLayout,
};
use crate::render::surface::RenderSurface;
use slotmap::SlotMap;

/// Outcome of a successful submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// Commands handed to the backend
    pub dispatched: usize,
    /// Draw commands among them
    pub draw_calls: usize,
    /// Whether the list was reordered before dispatch
    pub sorted: bool,
}

/// Lifetime counters of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    /// Frames presented
    pub frames: u64,
    /// Successful submissions
    pub submissions: u64,
    /// Commands dispatched to the backend
    pub commands_dispatched: u64,
    /// Draw calls dispatched
    pub draw_calls: u64,
    /// Resources created, materials included
    pub resources_created: u64,
    /// Resources destroyed, materials included
    pub resources_destroyed: u64,
}

#[derive(Debug)]
struct VertexBufferInfo {
    layout: VertexLayout,
    usage: BufferUsage,
}

#[derive(Debug)]
struct IndexBufferInfo {
    index_type: IndexType,
    usage: BufferUsage,
}

#[derive(Debug)]
struct ProgramInfo {
    vertex: ShaderHandle,
    fragment: ShaderHandle,
}

/// What the device knows about every live resource
#[derive(Debug, Default)]
struct Registry {
    vertex_buffers: SlotMap<VertexBufferHandle, VertexBufferInfo>,
    index_buffers: SlotMap<IndexBufferHandle, IndexBufferInfo>,
    shaders: SlotMap<ShaderHandle, ShaderStage>,
    programs: SlotMap<ProgramHandle, ProgramInfo>,
    textures: SlotMap<TextureHandle, TextureMetadata>,
    frame_buffers: SlotMap<FrameBufferHandle, FrameBufferDescription>,
}

impl Registry {
    fn contains(&self, resource: ResourceId) -> bool {
        match resource {
            ResourceId::VertexBuffer(h) => self.vertex_buffers.contains_key(h),
            ResourceId::IndexBuffer(h) => self.index_buffers.contains_key(h),
            ResourceId::Shader(h) => self.shaders.contains_key(h),
            ResourceId::Program(h) => self.programs.contains_key(h),
            ResourceId::Texture(h) => self.textures.contains_key(h),
            ResourceId::FrameBuffer(h) => self.frame_buffers.contains_key(h),
            ResourceId::Material(_) => false,
        }
    }

    fn remove(&mut self, resource: ResourceId) -> bool {
        match resource {
            ResourceId::VertexBuffer(h) => self.vertex_buffers.remove(h).is_some(),
            ResourceId::IndexBuffer(h) => self.index_buffers.remove(h).is_some(),
            ResourceId::Shader(h) => self.shaders.remove(h).is_some(),
            ResourceId::Program(h) => self.programs.remove(h).is_some(),
            ResourceId::Texture(h) => self.textures.remove(h).is_some(),
            ResourceId::FrameBuffer(h) => self.frame_buffers.remove(h).is_some(),
            ResourceId::Material(_) => false,
        }
    }

    fn len(&self) -> usize {
        self.vertex_buffers.len()
            + self.index_buffers.len()
            + self.shaders.len()
            + self.programs.len()
            + self.textures.len()
            + self.frame_buffers.len()
    }
}

fn creation_failed(kind: ResourceKind) -> impl FnOnce(BackendError) -> RenderError {
    move |error| {
        log::error!("Backend rejected {kind}: {error}");
        RenderError::resource(kind, error)
    }
}

/// Backend-independent rendering device
pub struct GraphicsDevice<B: Backend = Box<dyn Backend>> {
    backend: B,
    surface: Box<dyn RenderSurface>,
    config: DeviceConfig,
    registry: Registry,
    textures: TextureCache,
    programs: ProgramCache,
    materials: MaterialCache,
    /// Frame buffer draws go to after the last submission; `None` is the surface
    draw_target: Option<FrameBufferHandle>,
    frame_index: u64,
    stats: DeviceStats,
}

impl GraphicsDevice {
    /// Create a device with the built-in backend named by `config.backend`
    pub fn from_config(surface: Box<dyn RenderSurface>, config: DeviceConfig) -> RenderResult<Self> {
        let backend = create_backend(config.backend)?;
        Self::new(surface, backend, config)
    }
}

impl<B: Backend> GraphicsDevice<B> {
    /// Create a device rendering to `surface` through `backend`
    pub fn new(surface: Box<dyn RenderSurface>, mut backend: B, config: DeviceConfig) -> RenderResult<Self> {
        config.validate()?;

        backend.attach_surface(surface.as_ref()).map_err(|error| {
            RenderError::InitializationFailed(format!("{} backend failed to attach surface: {error}", backend.name()))
        })?;

        let (width, height) = surface.size();
        log::info!(
            "Graphics device for '{}' ready: {} backend, {width}x{height} surface",
            config.application_name,
            backend.name()
        );

        Ok(Self {
            textures: TextureCache::with_capacity("texture", config.texture_cache_capacity, config.collision_policy),
            programs: ProgramCache::with_capacity("program", config.program_cache_capacity, config.collision_policy),
            materials: MaterialCache::with_capacity(config.material_cache_capacity, config.collision_policy),
            backend,
            surface,
            config,
            registry: Registry::default(),
            draw_target: None,
            frame_index: 0,
            stats: DeviceStats::default(),
        })
    }

    // ---------------------------------------------------------------------
    // Resource creation
    // ---------------------------------------------------------------------

    /// Create a vertex buffer with initial contents
    pub fn make_vertex_buffer(
        &mut self,
        data: &[u8],
        layout: VertexLayout,
        usage: BufferUsage,
    ) -> RenderResult<VertexBufferHandle> {
        let backend = &mut self.backend;
        let handle = self
            .registry
            .vertex_buffers
            .try_insert_with_key(|handle| {
                backend.create_vertex_buffer(handle, data, &layout, usage).map(|()| VertexBufferInfo { layout, usage })
            })
            .map_err(creation_failed(ResourceKind::VertexBuffer))?;

        log::debug!("Created vertex buffer {handle:?} ({} bytes, {usage:?})", data.len());
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Create an index buffer with initial contents
    pub fn make_index_buffer(
        &mut self,
        data: &[u8],
        index_type: IndexType,
        usage: BufferUsage,
    ) -> RenderResult<IndexBufferHandle> {
        let backend = &mut self.backend;
        let handle = self
            .registry
            .index_buffers
            .try_insert_with_key(|handle| {
                backend.create_index_buffer(handle, data, index_type, usage).map(|()| IndexBufferInfo { index_type, usage })
            })
            .map_err(creation_failed(ResourceKind::IndexBuffer))?;

        log::debug!("Created index buffer {handle:?} ({} bytes, {index_type:?})", data.len());
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Compile a shader stage
    ///
    /// Preprocessor definitions are injected before the source reaches the
    /// backend.
    pub fn make_shader(&mut self, source: &ShaderSource) -> RenderResult<ShaderHandle> {
        let stage = source.stage;
        let text = source.preprocessed();
        let backend = &mut self.backend;
        let handle = self
            .registry
            .shaders
            .try_insert_with_key(|handle| backend.create_shader(handle, stage, &text).map(|()| stage))
            .map_err(creation_failed(ResourceKind::Shader))?;

        log::debug!("Compiled {stage} shader {handle:?}");
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Link a program from a vertex and a fragment shader
    ///
    /// The shaders may be destroyed once the program exists.
    pub fn make_program(&mut self, vertex: ShaderHandle, fragment: ShaderHandle) -> RenderResult<ProgramHandle> {
        for (shader, expected) in [(vertex, ShaderStage::Vertex), (fragment, ShaderStage::Fragment)] {
            let stage = self
                .registry
                .shaders
                .get(shader)
                .ok_or_else(|| RenderError::stale(ResourceKind::Shader, format!("{shader:?} passed to make_program")))?;
            if *stage != expected {
                return Err(RenderError::resource(
                    ResourceKind::Program,
                    format!("{shader:?} is a {stage} shader, expected {expected}"),
                ));
            }
        }

        let backend = &mut self.backend;
        let handle = self
            .registry
            .programs
            .try_insert_with_key(|handle| {
                backend.create_program(handle, vertex, fragment).map(|()| ProgramInfo { vertex, fragment })
            })
            .map_err(creation_failed(ResourceKind::Program))?;

        log::debug!("Linked program {handle:?}");
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Create a texture
    ///
    /// The description's pixel data is consumed and released once the
    /// backend has it.
    pub fn make_texture(&mut self, description: TextureDescription) -> RenderResult<TextureHandle> {
        let metadata = description.metadata;
        let backend = &mut self.backend;
        let handle = self
            .registry
            .textures
            .try_insert_with_key(|handle| backend.create_texture(handle, &description).map(|()| metadata))
            .map_err(creation_failed(ResourceKind::Texture))?;

        log::debug!(
            "Created {}x{} {:?} texture {handle:?} with {} mip levels",
            metadata.width,
            metadata.height,
            metadata.format,
            metadata.mip_levels
        );
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Create a frame buffer from existing textures
    pub fn make_frame_buffer(&mut self, description: FrameBufferDescription) -> RenderResult<FrameBufferHandle> {
        if let Some(texture) = description.textures().find(|&t| !self.registry.textures.contains_key(t)) {
            return Err(RenderError::stale(ResourceKind::Texture, format!("{texture:?} attached to new frame buffer")));
        }

        let backend = &mut self.backend;
        let handle = self
            .registry
            .frame_buffers
            .try_insert_with_key(|handle| backend.create_frame_buffer(handle, &description).map(|()| description))
            .map_err(creation_failed(ResourceKind::FrameBuffer))?;

        log::debug!("Created frame buffer {handle:?}");
        self.stats.resources_created += 1;
        Ok(handle)
    }

    /// Store a material in the material cache
    pub fn make_material(&mut self, material: Material) -> RenderResult<MaterialHandle> {
        self.check_material(&material)?;
        self.stats.resources_created += 1;
        Ok(self.materials.add(material))
    }

    /// Store a material under a key
    ///
    /// A key that is already taken follows the configured
    /// [`CollisionPolicy`]: `KeepFirst` returns the existing material and
    /// drops `material`, `Overwrite` stores `material` and points the key at
    /// it. The previous material stays alive under its own handle.
    pub fn make_keyed_material(&mut self, key: ResourceKey, material: Material) -> RenderResult<MaterialHandle> {
        if self.materials.policy() == CollisionPolicy::KeepFirst {
            if let Some(existing) = self.materials.find(&key) {
                return Ok(existing);
            }
        }
        self.check_material(&material)?;
        self.stats.resources_created += 1;
        Ok(self.materials.add_keyed(key, material))
    }

    fn check_material(&self, material: &Material) -> RenderResult<()> {
        let name = material.name.as_deref().unwrap_or("<unnamed>");
        if !self.registry.programs.contains_key(material.program) {
            return Err(RenderError::stale(
                ResourceKind::Program,
                format!("{:?} used by material '{name}'", material.program),
            ));
        }
        if let Some(texture) = material.parameters.textures().find(|&t| !self.registry.textures.contains_key(t)) {
            return Err(RenderError::stale(ResourceKind::Texture, format!("{texture:?} bound by material '{name}'")));
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Destruction
    // ---------------------------------------------------------------------

    /// Release a resource
    ///
    /// The handle, and every cache key pointing at it, stop resolving.
    /// Destroying a handle twice is reported as a stale handle.
    pub fn destroy(&mut self, resource: impl Into<ResourceId>) -> RenderResult<()> {
        let resource = resource.into();

        if let ResourceId::Material(handle) = resource {
            self.materials
                .remove(handle)
                .ok_or_else(|| RenderError::stale(ResourceKind::Material, format!("{resource} destroyed twice")))?;
        } else {
            if !self.registry.contains(resource) {
                return Err(RenderError::stale(resource.kind(), format!("{resource} destroyed twice")));
            }
            self.backend.destroy(resource).map_err(|error| RenderError::resource(resource.kind(), error))?;
            self.registry.remove(resource);
            if self.draw_target.map(ResourceId::from) == Some(resource) {
                self.draw_target = None;
            }

            let forgotten = match resource {
                ResourceId::Texture(handle) => self.textures.forget(handle),
                ResourceId::Program(handle) => self.programs.forget(handle),
                _ => Vec::new(),
            };
            if !forgotten.is_empty() {
                log::debug!("Dropped {} cache key(s) for destroyed {resource}", forgotten.len());
            }
        }

        log::debug!("Destroyed {resource}");
        self.stats.resources_destroyed += 1;
        Ok(())
    }

    /// Whether `resource` refers to a live resource
    pub fn is_alive(&self, resource: impl Into<ResourceId>) -> bool {
        match resource.into() {
            ResourceId::Material(handle) => self.materials.contains(handle),
            other => self.registry.contains(other),
        }
    }

    /// Number of live resources, materials included
    pub fn live_resources(&self) -> usize {
        self.registry.len() + self.materials.len()
    }

    // ---------------------------------------------------------------------
    // Caches
    // ---------------------------------------------------------------------

    /// Texture cached under `key`
    ///
    /// A miss is a [`RenderError::StaleHandle`]; check
    /// [`TextureCache::exists`] first when a miss is expected.
    pub fn cached_texture(&self, key: &ResourceKey) -> RenderResult<TextureHandle> {
        self.textures
            .get(key)
            .ok_or_else(|| RenderError::stale(ResourceKind::Texture, format!("no texture cached under '{key}'")))
    }

    /// Program cached under `key`
    pub fn cached_program(&self, key: &ResourceKey) -> RenderResult<ProgramHandle> {
        self.programs
            .get(key)
            .ok_or_else(|| RenderError::stale(ResourceKind::Program, format!("no program cached under '{key}'")))
    }

    /// Material stored under `key`
    pub fn cached_material(&self, key: &ResourceKey) -> RenderResult<MaterialHandle> {
        self.materials
            .find(key)
            .ok_or_else(|| RenderError::stale(ResourceKind::Material, format!("no material stored under '{key}'")))
    }

    /// Cache a live texture under `key`
    pub fn cache_texture(&mut self, key: ResourceKey, texture: TextureHandle) -> RenderResult<CacheInsert<TextureHandle>> {
        if !self.registry.textures.contains_key(texture) {
            return Err(RenderError::stale(ResourceKind::Texture, format!("{texture:?} cached under '{key}'")));
        }
        Ok(self.textures.insert(texture, key))
    }

    /// Cache a live program under `key`
    pub fn cache_program(&mut self, key: ResourceKey, program: ProgramHandle) -> RenderResult<CacheInsert<ProgramHandle>> {
        if !self.registry.programs.contains_key(program) {
            return Err(RenderError::stale(ResourceKind::Program, format!("{program:?} cached under '{key}'")));
        }
        Ok(self.programs.insert(program, key))
    }

    /// Texture cache
    pub fn texture_cache(&self) -> &TextureCache {
        &self.textures
    }

    /// Program cache
    pub fn program_cache(&self) -> &ProgramCache {
        &self.programs
    }

    /// Material cache
    pub fn material_cache(&self) -> &MaterialCache {
        &self.materials
    }

    /// Material behind a handle
    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Mutable material behind a handle
    ///
    /// Changing the program to a dead handle makes later draws with this
    /// material fail validation.
    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    /// Metadata of a live texture
    pub fn texture_metadata(&self, texture: TextureHandle) -> Option<&TextureMetadata> {
        self.registry.textures.get(texture)
    }

    /// Layout of a live vertex buffer
    pub fn vertex_layout(&self, buffer: VertexBufferHandle) -> Option<&VertexLayout> {
        self.registry.vertex_buffers.get(buffer).map(|info| &info.layout)
    }

    /// Index type of a live index buffer
    pub fn index_type(&self, buffer: IndexBufferHandle) -> Option<IndexType> {
        self.registry.index_buffers.get(buffer).map(|info| info.index_type)
    }

    /// Usage hint a live buffer was created with
    pub fn buffer_usage(&self, buffer: impl Into<ResourceId>) -> Option<BufferUsage> {
        match buffer.into() {
            ResourceId::VertexBuffer(h) => self.registry.vertex_buffers.get(h).map(|info| info.usage),
            ResourceId::IndexBuffer(h) => self.registry.index_buffers.get(h).map(|info| info.usage),
            _ => None,
        }
    }

    /// Shaders a live program was linked from
    pub fn program_shaders(&self, program: ProgramHandle) -> Option<(ShaderHandle, ShaderHandle)> {
        self.registry.programs.get(program).map(|info| (info.vertex, info.fragment))
    }

    /// Attachments of a live frame buffer, including ones added by commands
    pub fn frame_buffer_description(&self, frame_buffer: FrameBufferHandle) -> Option<&FrameBufferDescription> {
        self.registry.frame_buffers.get(frame_buffer)
    }

    // ---------------------------------------------------------------------
    // Submission
    // ---------------------------------------------------------------------

    /// Execute a command list
    ///
    /// Every referenced handle is validated before anything is dispatched.
    /// With `sort`, independent commands are reordered to reduce state
    /// changes; dependent commands keep their recorded order.
    pub fn submit(&mut self, list: CommandList, sort: bool) -> RenderResult<SubmissionReport> {
        if list.is_empty() {
            log::trace!("Frame {}: empty submission", self.frame_index);
            return Ok(SubmissionReport { sorted: sort, ..SubmissionReport::default() });
        }

        self.validate(list.commands())?;

        let commands = list.into_commands();
        let commands = if sort { sort_commands(commands, &*self) } else { commands };

        let mut report = SubmissionReport { sorted: sort, ..SubmissionReport::default() };
        for (position, command) in commands.iter().enumerate() {
            log::trace!("Frame {}: dispatching {} command at position {position}", self.frame_index, command.kind());
            dispatch(command, &mut self.backend, &self.materials).map_err(|error| {
                log::error!(
                    "Frame {}: {} command at position {position} failed: {error}; abandoning {} remaining command(s)",
                    self.frame_index,
                    command.kind(),
                    commands.len() - position - 1
                );
                RenderError::BackendDispatch { command_kind: command.kind(), position, reason: error.to_string() }
            })?;

            match command {
                Command::SetMaterialParameters(update) => {
                    self.materials.apply_parameters(update.material, &update.parameters);
                }
                Command::FrameBuffer(bind) if bind.binding.affects_draws() => self.draw_target = bind.frame_buffer,
                Command::FrameBufferTexture(attach) => self.record_attachment(attach.frame_buffer, FrameBufferAttachment {
                    point: attach.point,
                    texture: attach.texture,
                }),
                _ => {}
            }

            report.dispatched += 1;
            if matches!(command, Command::Draw(_)) {
                report.draw_calls += 1;
            }
        }

        self.stats.submissions += 1;
        self.stats.commands_dispatched += report.dispatched as u64;
        self.stats.draw_calls += report.draw_calls as u64;
        log::trace!(
            "Frame {}: dispatched {} command(s), {} draw call(s)",
            self.frame_index,
            report.dispatched,
            report.draw_calls
        );
        Ok(report)
    }

    /// Execute a command list, then present the frame
    pub fn submit_and_swap(&mut self, list: CommandList, sort: bool) -> RenderResult<SubmissionReport> {
        let report = self.submit(list, sort)?;
        self.present()?;
        Ok(report)
    }

    /// Present the current frame and advance the frame index
    pub fn present(&mut self) -> RenderResult<()> {
        self.backend.present(self.surface.as_mut()).map_err(|error| {
            log::error!("Frame {}: present failed: {error}", self.frame_index);
            RenderError::PresentFailed(error.to_string())
        })?;
        self.frame_index += 1;
        self.stats.frames += 1;
        Ok(())
    }

    fn validate(&self, commands: &[Command]) -> RenderResult<()> {
        let mut target = self.draw_target;
        let mut reattached = Vec::new();

        for (position, command) in commands.iter().enumerate() {
            for resource in command.resources() {
                if !self.is_alive(resource) {
                    return Err(RenderError::stale(
                        resource.kind(),
                        format!("{resource} used by {} command at position {position}", command.kind()),
                    ));
                }
            }

            match command {
                Command::FrameBuffer(bind) => {
                    if let Some(frame_buffer) = bind.frame_buffer {
                        self.check_attachments(frame_buffer, &reattached, command, position)?;
                    }
                    if bind.binding.affects_draws() {
                        target = bind.frame_buffer;
                    }
                }
                Command::FrameBufferTexture(attach) => reattached.push((attach.frame_buffer, attach.point)),
                Command::Clear(_) | Command::Draw(_) => {
                    if let Some(frame_buffer) = target {
                        self.check_attachments(frame_buffer, &reattached, command, position)?;
                    }
                }
                _ => {}
            }

            if let Command::Draw(draw) = command {
                if let Some(material) = self.materials.get(draw.material) {
                    self.check_material(material).map_err(|error| match error {
                        RenderError::StaleHandle { kind, detail } => RenderError::StaleHandle {
                            kind,
                            detail: format!("{detail}, drawn at position {position}"),
                        },
                        other => other,
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Every texture attached to `frame_buffer` must still be alive, unless
    /// an earlier command in the list replaced that attachment
    fn check_attachments(
        &self,
        frame_buffer: FrameBufferHandle,
        reattached: &[(FrameBufferHandle, AttachmentPoint)],
        command: &Command,
        position: usize,
    ) -> RenderResult<()> {
        let Some(description) = self.registry.frame_buffers.get(frame_buffer) else {
            return Ok(());
        };
        let dead = description.attachments.iter().find(|attachment| {
            !self.registry.textures.contains_key(attachment.texture)
                && !reattached.contains(&(frame_buffer, attachment.point))
        });
        match dead {
            Some(attachment) => Err(RenderError::stale(
                ResourceKind::Texture,
                format!(
                    "{:?} attached to {frame_buffer:?} at {:?}, used by {} command at position {position}",
                    attachment.texture,
                    attachment.point,
                    command.kind()
                ),
            )),
            None => Ok(()),
        }
    }

    fn record_attachment(&mut self, frame_buffer: FrameBufferHandle, attachment: FrameBufferAttachment) {
        if let Some(description) = self.registry.frame_buffers.get_mut(frame_buffer) {
            description.attachments.retain(|existing| existing.point != attachment.point);
            description.attachments.push(attachment);
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// Active backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the active backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Presentation surface
    pub fn surface(&self) -> &dyn RenderSurface {
        self.surface.as_ref()
    }

    /// Configuration the device was created with
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Number of frames presented so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Lifetime counters
    pub fn stats(&self) -> DeviceStats {
        self.stats
    }
}

impl<B: Backend> SortContext for GraphicsDevice<B> {
    fn material_program(&self, material: MaterialHandle) -> Option<ProgramHandle> {
        self.materials.get(material).map(|m| m.program)
    }

    fn material_textures(&self, material: MaterialHandle) -> Vec<TextureHandle> {
        self.materials.get(material).map(|m| m.parameters.textures().collect()).unwrap_or_default()
    }

    fn frame_buffer_textures(&self, frame_buffer: FrameBufferHandle) -> Vec<TextureHandle> {
        self.registry.frame_buffers.get(frame_buffer).map(|d| d.textures().collect()).unwrap_or_default()
    }
}

impl<B: Backend> std::fmt::Debug for GraphicsDevice<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("surface_size", &self.surface.size())
            .field("frame_index", &self.frame_index)
            .field("live_resources", &self.live_resources())
            .field("stats", &self.stats)
            .finish()
    }
}
