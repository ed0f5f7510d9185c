//! Vertex data and its GPU upload.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Position-only vertex, already in NDC.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { position: [x, y, z] }
    }

    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    /// Slot 0 reads three tightly packed, non-normalized `f32`s per vertex.
    pub const LAYOUT: VertexLayout = VertexLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        attributes: &Self::ATTRS,
    };
}

/// The triangle drawn every frame: bottom right, bottom left, top.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new(0.5, -0.5, 0.0),
    Vertex::new(-0.5, -0.5, 0.0),
    Vertex::new(0.0, 0.5, 0.0),
];

/// Describes how one vertex buffer feeds vertex shader inputs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexLayout {
    pub array_stride: u64,
    pub attributes: &'static [wgpu::VertexAttribute],
}

impl VertexLayout {
    /// Format fed to `location`, if the layout provides it.
    pub fn format_at(&self, location: u32) -> Option<wgpu::VertexFormat> {
        self.attributes
            .iter()
            .find(|a| a.shader_location == location)
            .map(|a| a.format)
    }

    pub fn to_wgpu(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: self.attributes,
        }
    }
}

/// Immutable vertex buffer of [`Vertex`]es.
///
/// Contents are written once at creation; the buffer has no `COPY_DST` usage.
pub struct VertexGeometry {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

impl VertexGeometry {
    /// Uploads `vertices` in a single transfer.
    pub fn upload(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!(
            "uploaded {} vertices ({} bytes) to \"{label}\"",
            vertices.len(),
            std::mem::size_of_val(vertices)
        );

        Self {
            buffer,
            vertex_count: vertices.len() as u32,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Binds the buffer to vertex slot 0 of `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.buffer.slice(..));
    }
}
