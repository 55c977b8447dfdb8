//! Device-level tests against the headless backend

mod resources;
mod submission;

use crate::config::DeviceConfig;
use crate::render::backends::HeadlessBackend;
use crate::render::builders::MaterialBuilder;
use crate::render::device::GraphicsDevice;
use crate::render::handle::{MaterialHandle, VertexBufferHandle};
use crate::render::resources::{AttributeType, BufferUsage, VertexAttribute, VertexLayout};
use crate::render::surface::HeadlessSurface;

const VERTEX_SHADER: &str = r"#version 330 core
layout(location = 0) in vec3 position;
void main() {
    gl_Position = vec4(position, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 330 core
uniform vec4 tint;
out vec4 color;
void main() {
    color = tint;
}
";

const TRIANGLE: [f32; 9] = [-0.5, -0.5, 0.0, 0.5, -0.5, 0.0, 0.0, 0.5, 0.0];

fn device() -> GraphicsDevice<HeadlessBackend> {
    GraphicsDevice::new(Box::new(HeadlessSurface::new(320, 240)), HeadlessBackend::new(), DeviceConfig::new("tests"))
        .unwrap()
}

fn position_layout() -> VertexLayout {
    VertexLayout::new(vec![VertexAttribute::new(0, AttributeType::Float32, 3, false, 12, 0)])
}

fn triangle(device: &mut GraphicsDevice<HeadlessBackend>) -> VertexBufferHandle {
    device.make_vertex_buffer(bytemuck::cast_slice(&TRIANGLE), position_layout(), BufferUsage::Dynamic).unwrap()
}

fn flat_material(device: &mut GraphicsDevice<HeadlessBackend>, name: &str) -> MaterialHandle {
    MaterialBuilder::new(name).vertex_shader(VERTEX_SHADER).fragment_shader(FRAGMENT_SHADER).build(device).unwrap()
}
