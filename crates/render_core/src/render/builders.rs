//! Resource builders
//!
//! Fluent helpers that assemble descriptions and hand them to a
//! [`GraphicsDevice`] in one terminal `build` call. They go through the
//! device's caches, so building the same material or texture twice creates
//! the backend resources once.

use crate::render::backend::Backend;
use crate::render::cache::{CollisionPolicy, ResourceKey};
use crate::render::device::GraphicsDevice;
use crate::render::error::{RenderError, RenderResult};
use crate::render::handle::{FrameBufferHandle, MaterialHandle, ProgramHandle, ResourceKind, TextureHandle};
use crate::render::resources::{
    AttachmentPoint, FrameBufferAttachment, FrameBufferDescription, Material, MaterialParameters, ParameterValue,
    ShaderSource, ShaderStage, TextureDescription, TextureFilter, TextureFormat, TextureMetadata, TextureTarget,
    TextureWrap,
};

/// Builds a material and, when needed, its program
///
/// ```no_run
/// # use render_core::render::*;
/// # fn demo(device: &mut GraphicsDevice) -> RenderResult<MaterialHandle> {
/// MaterialBuilder::new("flat")
///     .vertex_shader("#version 330 core\nvoid main() { gl_Position = vec4(0.0); }")
///     .fragment_shader("#version 330 core\nout vec4 color;\nvoid main() { color = vec4(1.0); }")
///     .define("USE_FOG", "1")
///     .parameter("tint", render_core::foundation::math::Vec4::new(1.0, 0.5, 0.5, 1.0))
///     .build(device)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    name: String,
    vertex: Option<String>,
    fragment: Option<String>,
    definitions: Vec<(String, String)>,
    parameters: MaterialParameters,
    key: Option<ResourceKey>,
}

impl MaterialBuilder {
    /// Start a material with a debug name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertex: None,
            fragment: None,
            definitions: Vec::new(),
            parameters: MaterialParameters::new(),
            key: None,
        }
    }

    /// Vertex shader source
    pub fn vertex_shader(mut self, source: impl Into<String>) -> Self {
        self.vertex = Some(source.into());
        self
    }

    /// Fragment shader source
    pub fn fragment_shader(mut self, source: impl Into<String>) -> Self {
        self.fragment = Some(source.into());
        self
    }

    /// Preprocessor definition applied to both stages
    pub fn define(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.push((name.into(), value.into()));
        self
    }

    /// Initial parameter value
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.set(name, value);
        self
    }

    /// Store the material under `key`
    ///
    /// With the default [`CollisionPolicy::KeepFirst`], building again with
    /// the same key returns the stored material without compiling anything.
    /// Under [`CollisionPolicy::Overwrite`] every build stores a new material
    /// and the key moves to it.
    pub fn key(mut self, key: impl Into<ResourceKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    fn source(&self, stage: ShaderStage, text: Option<&str>) -> RenderResult<ShaderSource> {
        let text = text.ok_or_else(|| {
            RenderError::resource(ResourceKind::Program, format!("material '{}' has no {stage} shader", self.name))
        })?;
        Ok(self
            .definitions
            .iter()
            .fold(ShaderSource::new(stage, text), |source, (name, value)| {
                source.with_definition(name.clone(), value.clone())
            }))
    }

    /// Create the material
    pub fn build<B: Backend>(self, device: &mut GraphicsDevice<B>) -> RenderResult<MaterialHandle> {
        if let Some(key) = &self.key {
            let cache = device.material_cache();
            if cache.policy() == CollisionPolicy::KeepFirst && cache.exists(key) {
                log::debug!("Material '{}' found under '{key}'", self.name);
                return device.cached_material(key);
            }
        }

        let vertex = self.source(ShaderStage::Vertex, self.vertex.as_deref())?;
        let fragment = self.source(ShaderStage::Fragment, self.fragment.as_deref())?;
        let program = program_for(device, &vertex, &fragment)?;

        let mut material = Material::new(program).with_name(self.name);
        material.parameters = self.parameters;

        match self.key {
            Some(key) => device.make_keyed_material(key, material),
            None => device.make_material(material),
        }
    }
}

/// Look up the program for a source pair, linking it on a miss
fn program_for<B: Backend>(
    device: &mut GraphicsDevice<B>,
    vertex: &ShaderSource,
    fragment: &ShaderSource,
) -> RenderResult<ProgramHandle> {
    let key = ResourceKey::for_program(vertex, fragment);
    if device.program_cache().exists(&key) {
        return device.cached_program(&key);
    }

    let vs = device.make_shader(vertex)?;
    let fs = match device.make_shader(fragment) {
        Ok(fs) => fs,
        Err(error) => {
            device.destroy(vs)?;
            return Err(error);
        }
    };
    let linked = device.make_program(vs, fs);

    // Linked programs keep their own copy of the stages
    device.destroy(vs)?;
    device.destroy(fs)?;

    let program = linked?;
    device.cache_program(key, program)?;
    Ok(program)
}

/// Builds a texture, reusing a cached one with the same id or content
#[derive(Debug, Clone, Default)]
pub struct TextureBuilder {
    id: Option<ResourceKey>,
    metadata: TextureMetadata,
    data: Option<Vec<u8>>,
}

impl TextureBuilder {
    /// 1x1 RGBA8 texture with one mip level
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache id, usually the source path
    pub fn id(mut self, id: impl Into<ResourceKey>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Dimensions of mip 0
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.metadata.width = width;
        self.metadata.height = height;
        self
    }

    /// Pixel format
    pub fn format(mut self, format: TextureFormat) -> Self {
        self.metadata.format = format;
        self
    }

    /// Number of mip levels
    pub fn mip_levels(mut self, levels: u32) -> Self {
        self.metadata.mip_levels = levels;
        self
    }

    /// Full mip chain for the current size
    pub fn full_mip_chain(mut self) -> Self {
        self.metadata.mip_levels = self.metadata.max_mip_levels();
        self
    }

    /// Coordinate wrapping
    pub fn wrap(mut self, wrap: TextureWrap) -> Self {
        self.metadata.wrap = wrap;
        self
    }

    /// Sampling filter
    pub fn filter(mut self, filter: TextureFilter) -> Self {
        self.metadata.filter = filter;
        self
    }

    /// Make this a cube map; data then holds six faces
    pub fn cube_map(mut self) -> Self {
        self.metadata.target = TextureTarget::CubeMap;
        self
    }

    /// Mip 0 pixels
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Create the texture, or return the cached one
    ///
    /// Textures with neither an id nor pixel data are always created fresh.
    pub fn build<B: Backend>(self, device: &mut GraphicsDevice<B>) -> RenderResult<TextureHandle> {
        let key = self.id.or_else(|| self.data.as_deref().map(|data| ResourceKey::for_texture(&self.metadata, Some(data))));

        let Some(key) = key else {
            return device.make_texture(TextureDescription { metadata: self.metadata, data: self.data });
        };

        if device.texture_cache().exists(&key) {
            log::debug!("Texture cache hit for '{key}'");
            return device.cached_texture(&key);
        }

        let texture = device.make_texture(TextureDescription { metadata: self.metadata, data: self.data })?;
        device.cache_texture(key, texture)?;
        Ok(texture)
    }
}

/// Frame buffer plus the render textures created for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Frame buffer
    pub frame_buffer: FrameBufferHandle,
    /// Color textures by attachment index
    pub color: Vec<TextureHandle>,
    /// Depth texture, if requested
    pub depth: Option<TextureHandle>,
}

/// Builds an off-screen frame buffer with freshly created render textures
#[derive(Debug, Clone)]
pub struct FrameBufferBuilder {
    width: u32,
    height: u32,
    color: Vec<TextureFormat>,
    depth: Option<TextureFormat>,
    filter: TextureFilter,
}

impl FrameBufferBuilder {
    /// Start a frame buffer of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, color: Vec::new(), depth: None, filter: TextureFilter::Linear }
    }

    /// Add a color attachment
    pub fn color(mut self, format: TextureFormat) -> Self {
        self.color.push(format);
        self
    }

    /// Add a depth (or depth-stencil) attachment
    pub fn depth(mut self, format: TextureFormat) -> Self {
        self.depth = Some(format);
        self
    }

    /// Sampling filter of the render textures
    pub fn filter(mut self, filter: TextureFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Create the textures and the frame buffer
    ///
    /// On failure every texture created so far is destroyed again.
    pub fn build<B: Backend>(self, device: &mut GraphicsDevice<B>) -> RenderResult<RenderTarget> {
        let mut attachments = Vec::with_capacity(self.color.len() + 1);
        let result = self.create_attachments(device, &mut attachments).and_then(|()| {
            let description = FrameBufferDescription::new(attachments.clone());
            device.make_frame_buffer(description)
        });

        match result {
            Ok(frame_buffer) => {
                let (mut color, mut depth) = (Vec::new(), None);
                for attachment in &attachments {
                    match attachment.point {
                        AttachmentPoint::Color(_) => color.push(attachment.texture),
                        _ => depth = Some(attachment.texture),
                    }
                }
                Ok(RenderTarget { frame_buffer, color, depth })
            }
            Err(error) => {
                for attachment in attachments {
                    device.destroy(attachment.texture)?;
                }
                Err(error)
            }
        }
    }

    fn create_attachments<B: Backend>(
        &self,
        device: &mut GraphicsDevice<B>,
        attachments: &mut Vec<FrameBufferAttachment>,
    ) -> RenderResult<()> {
        let depth_point = |format: TextureFormat| match format {
            TextureFormat::Depth24Stencil8 => AttachmentPoint::DepthStencil,
            _ => AttachmentPoint::Depth,
        };
        let points = (0..)
            .map(AttachmentPoint::Color)
            .zip(self.color.iter().copied())
            .chain(self.depth.map(|format| (depth_point(format), format)));

        for (point, format) in points {
            let metadata = TextureMetadata {
                wrap: TextureWrap::ClampToEdge,
                filter: self.filter,
                ..TextureMetadata::new_2d(self.width, self.height, format)
            };
            let texture = device.make_texture(TextureDescription::empty(metadata))?;
            attachments.push(FrameBufferAttachment { point, texture });
        }
        Ok(())
    }
}
