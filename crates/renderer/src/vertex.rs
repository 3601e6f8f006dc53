//! Vertex types and layouts for rendering.

use bytemuck::{Pod, Zeroable};

/// Sphere vertex: homogeneous point, gradient colour and outward normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub point: [f32; 4],
    pub colour: [f32; 4],
    pub normal: [f32; 3],
}

impl SphereVertex {
    /// Locations must match the `vs_point`, `vs_colour` and `vs_normal` inputs of the sphere shader.
    pub const POINT_LOCATION: u32 = 0;
    pub const COLOUR_LOCATION: u32 = 1;
    pub const NORMAL_LOCATION: u32 = 2;

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Point
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: Self::POINT_LOCATION,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Colour
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: Self::COLOUR_LOCATION,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: Self::NORMAL_LOCATION,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
