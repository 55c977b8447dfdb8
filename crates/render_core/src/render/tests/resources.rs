use super::{device, flat_material, position_layout, triangle, FRAGMENT_SHADER, VERTEX_SHADER};
use crate::config::DeviceConfig;
use crate::render::backend::Backend;
use crate::render::backends::{BackendCall, GraphicsBackend, HeadlessBackend, NullBackend};
use crate::render::builders::{MaterialBuilder, TextureBuilder};
use crate::render::cache::{CacheInsert, CollisionPolicy, ResourceKey};
use crate::render::device::GraphicsDevice;
use crate::render::error::RenderError;
use crate::render::handle::{ResourceId, ResourceKind};
use crate::render::resources::{
    BufferUsage, IndexType, Material, ShaderSource, ShaderStage, TextureDescription, TextureFormat, TextureMetadata,
};
use crate::render::surface::HeadlessSurface;

#[test]
fn test_cached_texture_lookup_is_idempotent() {
    let mut device = device();
    let texture = device.make_texture(TextureDescription::empty(TextureMetadata::default())).unwrap();
    let key = ResourceKey::new("textures/white.png");

    assert_eq!(device.cache_texture(key.clone(), texture).unwrap(), CacheInsert::Inserted);

    assert!(device.texture_cache().exists(&key));
    for _ in 0..3 {
        assert_eq!(device.cached_texture(&key).unwrap(), texture);
    }
}

#[test]
fn test_identical_textures_created_once() {
    let mut device = device();
    let pixels = vec![200; 4 * 4 * 4];

    let handles: Vec<_> = (0..4)
        .map(|_| TextureBuilder::new().size(4, 4).data(pixels.clone()).build(&mut device).unwrap())
        .collect();

    assert!(handles.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(device.backend().created_count(ResourceKind::Texture), 1);
    assert_eq!(device.texture_cache().len(), 1);
}

#[test]
fn test_identical_programs_linked_once() {
    let mut device = device();
    for name in ["a", "b", "c"] {
        flat_material(&mut device, name);
    }

    assert_eq!(device.backend().created_count(ResourceKind::Program), 1);
    assert_eq!(device.program_cache().len(), 1);
    assert_eq!(device.material_cache().len(), 3);
}

#[test]
fn test_invalid_shader_leaves_device_unchanged() {
    let mut device = device();
    flat_material(&mut device, "flat");
    let live = device.live_resources();
    let calls = device.backend().calls().len();
    let stats = device.stats();

    let broken = ShaderSource::new(ShaderStage::Fragment, "void main() { color = vec4(1.0);");
    let result = device.make_shader(&broken);

    assert!(matches!(result, Err(RenderError::BackendResource { kind: ResourceKind::Shader, .. })));
    assert_eq!(device.live_resources(), live);
    assert_eq!(device.backend().calls().len(), calls);
    assert_eq!(device.backend().live_resources(), live - 1);
    assert_eq!(device.stats(), stats);
    assert_eq!(device.program_cache().len(), 1);
}

#[test]
fn test_material_builder_releases_vertex_shader_on_failure() {
    let mut device = device();
    let result = MaterialBuilder::new("broken")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader("out vec4 color;")
        .build(&mut device);

    assert!(matches!(result, Err(RenderError::BackendResource { kind: ResourceKind::Shader, .. })));
    assert_eq!(device.live_resources(), 0);
    assert_eq!(device.backend().live_resources(), 0);
    assert!(device.program_cache().is_empty());
}

#[test]
fn test_program_rejects_swapped_stages() {
    let mut device = device();
    let vs = device.make_shader(&ShaderSource::new(ShaderStage::Vertex, VERTEX_SHADER)).unwrap();
    let fs = device.make_shader(&ShaderSource::new(ShaderStage::Fragment, FRAGMENT_SHADER)).unwrap();

    let result = device.make_program(fs, vs);
    assert!(matches!(result, Err(RenderError::BackendResource { kind: ResourceKind::Program, .. })));

    let program = device.make_program(vs, fs).unwrap();
    assert_eq!(device.program_shaders(program), Some((vs, fs)));
}

#[test]
fn test_program_from_destroyed_shader_is_stale() {
    let mut device = device();
    let vs = device.make_shader(&ShaderSource::new(ShaderStage::Vertex, VERTEX_SHADER)).unwrap();
    let fs = device.make_shader(&ShaderSource::new(ShaderStage::Fragment, FRAGMENT_SHADER)).unwrap();
    device.destroy(fs).unwrap();

    let result = device.make_program(vs, fs);
    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::Shader, .. })));
}

#[test]
fn test_destroy_twice_is_stale() {
    let mut device = device();
    let vb = triangle(&mut device);

    device.destroy(vb).unwrap();
    assert!(!device.is_alive(vb));
    assert!(matches!(device.destroy(vb), Err(RenderError::StaleHandle { kind: ResourceKind::VertexBuffer, .. })));
    assert_eq!(device.stats().resources_destroyed, 1);
}

#[test]
fn test_destroy_forgets_cache_keys() {
    let mut device = device();
    let texture = TextureBuilder::new().id("textures/stone.png").size(2, 2).data(vec![1; 16]).build(&mut device);
    let texture = texture.unwrap();
    let key = ResourceKey::from("textures/stone.png");

    device.destroy(texture).unwrap();

    assert!(!device.texture_cache().exists(&key));
    assert!(matches!(device.cached_texture(&key), Err(RenderError::StaleHandle { kind: ResourceKind::Texture, .. })));
    assert_eq!(device.backend().calls().last(), Some(&BackendCall::Destroy(ResourceId::from(texture))));

    // Building again creates a fresh texture under the same key
    let rebuilt = TextureBuilder::new().id("textures/stone.png").size(2, 2).data(vec![1; 16]).build(&mut device);
    assert_ne!(rebuilt.unwrap(), texture);
}

#[test]
fn test_destroyed_material_is_stale() {
    let mut device = device();
    let material = flat_material(&mut device, "flat");

    device.destroy(material).unwrap();

    assert!(device.material(material).is_none());
    assert!(matches!(device.destroy(material), Err(RenderError::StaleHandle { kind: ResourceKind::Material, .. })));
}

#[test]
fn test_material_requires_live_program() {
    let mut device = device();
    let material = flat_material(&mut device, "flat");
    let program = device.material(material).unwrap().program;
    device.destroy(program).unwrap();

    let result = device.make_material(Material::new(program).with_name("orphan"));
    assert!(matches!(result, Err(RenderError::StaleHandle { kind: ResourceKind::Program, .. })));
}

#[test]
fn test_collision_policy_from_config() {
    let config = DeviceConfig::new("tests").with_collision_policy(CollisionPolicy::Overwrite);
    let mut device =
        GraphicsDevice::new(Box::new(HeadlessSurface::new(64, 64)), HeadlessBackend::new(), config).unwrap();

    let first = device.make_texture(TextureDescription::empty(TextureMetadata::default())).unwrap();
    let second = device.make_texture(TextureDescription::empty(TextureMetadata::default())).unwrap();
    let key = ResourceKey::new("shared");

    device.cache_texture(key.clone(), first).unwrap();
    let outcome = device.cache_texture(key.clone(), second).unwrap();

    assert_eq!(outcome, CacheInsert::Collision { previous: first, policy: CollisionPolicy::Overwrite });
    assert_eq!(device.cached_texture(&key).unwrap(), second);
}

#[test]
fn test_keyed_material_overwrite_from_config() {
    let config = DeviceConfig::new("tests").with_collision_policy(CollisionPolicy::Overwrite);
    let mut device =
        GraphicsDevice::new(Box::new(HeadlessSurface::new(64, 64)), HeadlessBackend::new(), config).unwrap();
    let base = flat_material(&mut device, "base");
    let program = device.material(base).unwrap().program;
    let key = ResourceKey::new("hull");

    let a = device.make_keyed_material(key.clone(), Material::new(program).with_name("a")).unwrap();
    let b = device.make_keyed_material(key.clone(), Material::new(program).with_name("b")).unwrap();

    assert_ne!(a, b);
    assert_eq!(device.cached_material(&key).unwrap(), b);
    assert_eq!(device.material(b).unwrap().name.as_deref(), Some("b"));
    assert!(device.is_alive(a));

    // The builder follows the same policy
    let built = MaterialBuilder::new("c")
        .key("hull")
        .vertex_shader(VERTEX_SHADER)
        .fragment_shader(FRAGMENT_SHADER)
        .build(&mut device)
        .unwrap();
    assert_ne!(built, b);
    assert_eq!(device.cached_material(&key).unwrap(), built);
    assert_eq!(device.program_cache().len(), 1);
}

#[test]
fn test_keyed_material_keep_first() {
    let mut device = device();
    let base = flat_material(&mut device, "base");
    let program = device.material(base).unwrap().program;
    let key = ResourceKey::new("hull");

    let a = device.make_keyed_material(key.clone(), Material::new(program).with_name("a")).unwrap();
    let created = device.stats().resources_created;
    let b = device.make_keyed_material(key.clone(), Material::new(program).with_name("b")).unwrap();

    assert_eq!(a, b);
    assert_eq!(device.material(a).unwrap().name.as_deref(), Some("a"));
    assert_eq!(device.stats().resources_created, created);
}

#[test]
fn test_keep_first_collision_is_default() {
    let mut device = device();
    let first = device.make_texture(TextureDescription::empty(TextureMetadata::default())).unwrap();
    let second = device.make_texture(TextureDescription::empty(TextureMetadata::default())).unwrap();
    let key = ResourceKey::new("shared");

    device.cache_texture(key.clone(), first).unwrap();
    device.cache_texture(key.clone(), second).unwrap();

    assert_eq!(device.cached_texture(&key).unwrap(), first);
}

#[test]
fn test_buffer_metadata_recorded() {
    let mut device = device();
    let vb = triangle(&mut device);
    let ib = device.make_index_buffer(bytemuck::cast_slice(&[0u16, 1, 2]), IndexType::UInt16, BufferUsage::Static);
    let ib = ib.unwrap();

    assert_eq!(device.vertex_layout(vb), Some(&position_layout()));
    assert_eq!(device.buffer_usage(vb), Some(BufferUsage::Dynamic));
    assert_eq!(device.index_type(ib), Some(IndexType::UInt16));
    assert_eq!(device.buffer_usage(ib), Some(BufferUsage::Static));
}

#[test]
fn test_rejected_texture_description() {
    let mut device = device();
    let metadata = TextureMetadata::new_2d(4, 4, TextureFormat::Rgba8);

    let result = device.make_texture(TextureDescription::with_data(metadata, vec![0; 7]));

    assert!(matches!(result, Err(RenderError::BackendResource { kind: ResourceKind::Texture, .. })));
    assert_eq!(device.live_resources(), 0);
}

#[test]
fn test_boxed_backend_from_config() {
    let config = DeviceConfig::new("tests").with_backend(GraphicsBackend::Null);
    let mut device = GraphicsDevice::from_config(Box::new(HeadlessSurface::default()), config).unwrap();

    // The null backend accepts anything, including a shader the headless one rejects
    let shader = device.make_shader(&ShaderSource::new(ShaderStage::Vertex, "{"));
    assert!(shader.is_ok());
    device.present().unwrap();
    assert_eq!(device.backend().name(), "null");
    assert_eq!(device.frame_index(), 1);
}

#[test]
fn test_generic_device_over_null_backend() {
    let mut device =
        GraphicsDevice::new(Box::new(HeadlessSurface::default()), NullBackend::new(), DeviceConfig::default()).unwrap();
    let vb = device.make_vertex_buffer(&[0; 12], position_layout(), BufferUsage::Static).unwrap();
    device.destroy(vb).unwrap();

    assert_eq!(device.backend().created, 1);
    assert_eq!(device.backend().destroyed, 1);
}
