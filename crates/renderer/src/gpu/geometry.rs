use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::error::SessionError;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    position: [f32; 2],
}

/// Two triangles covering the clip-space square, counter-clockwise.
const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0] },
];

/// The shared full-screen quad: one static vertex buffer, created once per
/// session and reused unchanged across every shader swap (the vertex stage
/// never varies, only the fragment stage does).
pub(crate) struct QuadGeometry {
    vertex_buffer: wgpu::Buffer,
}

impl QuadGeometry {
    pub(crate) fn new(device: &wgpu::Device) -> Result<Self, SessionError> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(SessionError::GeometryCreationFailed(error.to_string()));
        }
        Ok(Self { vertex_buffer })
    }

    /// Single vec2 position attribute at shader location 0.
    pub(crate) fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }

    /// Binds the quad and issues its six vertices as a triangle list.
    pub(crate) fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}
