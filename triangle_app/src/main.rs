//! Hello triangle
//!
//! Brings up a device on a headless surface, uploads one triangle and
//! renders a few frames with a pulsing clear color.
//!
//! Usage: `hello_triangle [config.toml|config.ron]`

use bytemuck::{Pod, Zeroable};
use render_core::config::{Config, ConfigError, DeviceConfig};
use render_core::foundation::logging;
use render_core::foundation::math::Vec4;
use render_core::render::resources::{AttributeType, BufferUsage, VertexAttribute, VertexLayout};
use render_core::render::{
    CommandList, DrawCommand, GraphicsDevice, HeadlessSurface, MaterialBuilder, MaterialHandle, RenderError,
    VertexBufferHandle,
};
use thiserror::Error;

const FRAMES: u32 = 5;

const VERTEX_SHADER: &str = r"#version 330 core
layout(location = 0) in vec2 position;
layout(location = 1) in vec3 color;
out vec3 v_color;
void main() {
    v_color = color;
    gl_Position = vec4(position, 0.0, 1.0);
}
";

const FRAGMENT_SHADER: &str = r"#version 330 core
in vec3 v_color;
uniform vec4 tint;
out vec4 frag_color;
void main() {
    frag_color = vec4(v_color, 1.0) * tint;
}
";

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 2],
    color: [f32; 3],
}

const TRIANGLE: [Vertex; 3] = [
    Vertex { position: [-0.5, -0.5], color: [1.0, 0.0, 0.0] },
    Vertex { position: [0.5, -0.5], color: [0.0, 1.0, 0.0] },
    Vertex { position: [0.0, 0.5], color: [0.0, 0.0, 1.0] },
];

impl Vertex {
    fn layout() -> VertexLayout {
        let stride = std::mem::size_of::<Self>() as u32;
        VertexLayout::new(vec![
            VertexAttribute::new(0, AttributeType::Float32, 2, false, stride, 0),
            VertexAttribute::new(1, AttributeType::Float32, 3, false, stride, 8),
        ])
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

struct TriangleApp {
    device: GraphicsDevice,
    vertices: VertexBufferHandle,
    material: MaterialHandle,
}

impl TriangleApp {
    fn new(config: DeviceConfig) -> Result<Self, AppError> {
        log::info!("Creating {} device for '{}'", config.backend, config.application_name);
        let mut device = GraphicsDevice::from_config(Box::new(HeadlessSurface::new(800, 600)), config)?;

        let vertices =
            device.make_vertex_buffer(bytemuck::cast_slice(&TRIANGLE), Vertex::layout(), BufferUsage::Static)?;
        let material = MaterialBuilder::new("vertex_color")
            .vertex_shader(VERTEX_SHADER)
            .fragment_shader(FRAGMENT_SHADER)
            .parameter("tint", Vec4::new(1.0, 1.0, 1.0, 1.0))
            .build(&mut device)?;

        Ok(Self { device, vertices, material })
    }

    fn render_frame(&mut self, frame: u32) -> Result<(), AppError> {
        let pulse = (frame as f32 / FRAMES as f32).mul_add(0.5, 0.1);

        let mut list = CommandList::with_capacity(4);
        list.viewport().set_rectangle(0, 0, 800, 600);
        list.clear().set_color(pulse, 0.1, 0.15, 1.0).set_clear_color(true).set_clear_depth(true);
        list.set_material_parameters().set_material(self.material).set_parameter("tint", Vec4::new(1.0, pulse, 1.0, 1.0));
        list.push(DrawCommand::new(self.vertices, self.material, TRIANGLE.len() as u32));

        let report = self.device.submit_and_swap(list, true)?;
        log::info!("Frame {frame}: {} commands, {} draw call(s)", report.dispatched, report.draw_calls);
        Ok(())
    }

    fn run(&mut self) -> Result<(), AppError> {
        for frame in 0..FRAMES {
            self.render_frame(frame)?;
        }

        let stats = self.device.stats();
        log::info!(
            "Rendered {} frames, {} draw calls, {} live resources",
            stats.frames,
            stats.draw_calls,
            self.device.live_resources()
        );
        Ok(())
    }

    fn cleanup(mut self) -> Result<(), AppError> {
        self.device.destroy(self.material)?;
        self.device.destroy(self.vertices)?;
        Ok(())
    }
}

fn load_config() -> Result<DeviceConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => DeviceConfig::load_from_file(&path),
        None => Ok(DeviceConfig::new("Hello Triangle")),
    }
}

fn main() -> Result<(), AppError> {
    let config = load_config()?;
    logging::init_with_filter(&config.log_level);

    let mut app = TriangleApp::new(config)?;
    app.run()?;
    app.cleanup()
}
