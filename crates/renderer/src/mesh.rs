//! Sphere mesh data (CPU side) and its GPU upload.

use crate::geometry::SphereGeometry;
use crate::vertex::SphereVertex;
use glam::Vec4;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Two-colour gradient along the sphere's Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    /// Colour at the -Z pole.
    pub start: Vec4,
    /// Colour at the +Z pole.
    pub stop: Vec4,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            start: Vec4::new(0.0, 0.5, 0.7, 1.0),
            stop: Vec4::new(0.4, 0.8, 0.9, 1.0),
        }
    }
}

impl Gradient {
    pub fn new(start: Vec4, stop: Vec4) -> Self {
        Self { start, stop }
    }

    /// Colour for a unit-sphere point: remap z from [-1, 1] to [0, 1] and blend. Alpha is opaque.
    pub fn colour_at(&self, point: Vec4) -> Vec4 {
        let t = (point.z + 1.0) * 0.5;
        let rgb = self.start.truncate().lerp(self.stop.truncate(), t);
        rgb.extend(1.0)
    }
}

/// A sphere's vertex streams: shared geometry plus per-object colours.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    geometry: Arc<SphereGeometry>,
    colours: Vec<Vec4>,
}

impl SphereMesh {
    pub fn new(geometry: Arc<SphereGeometry>, gradient: Gradient) -> Self {
        let colours = geometry.positions.iter().map(|&p| gradient.colour_at(p)).collect();
        Self { geometry, colours }
    }

    pub fn geometry(&self) -> &SphereGeometry {
        &self.geometry
    }

    pub fn colours(&self) -> &[Vec4] {
        &self.colours
    }

    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    /// Interleaved vertices; normals are the unit positions.
    pub fn vertices(&self) -> Vec<SphereVertex> {
        self.geometry
            .positions
            .iter()
            .zip(&self.colours)
            .map(|(p, c)| SphereVertex {
                point: p.to_array(),
                colour: c.to_array(),
                normal: p.truncate().to_array(),
            })
            .collect()
    }

    pub fn upload(&self, device: &wgpu::Device) -> Mesh {
        Mesh::new(device, &self.vertices(), self.indices())
    }
}

/// A GPU mesh with vertex and index buffers.
pub struct Mesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
}

impl Mesh {
    /// Create a mesh from vertex and index data.
    pub fn new(device: &wgpu::Device, vertices: &[SphereVertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_indices: indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_runs_pole_to_pole_along_z() {
        let g = Gradient::new(Vec4::new(1.0, 0.0, 0.0, 0.5), Vec4::new(0.0, 0.0, 1.0, 0.5));
        assert_eq!(g.colour_at(Vec4::new(0.0, 0.0, -1.0, 1.0)), Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(g.colour_at(Vec4::new(0.0, 0.0, 1.0, 1.0)), Vec4::new(0.0, 0.0, 1.0, 1.0));
        // The equator sits halfway regardless of x/y.
        let mid = g.colour_at(Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert!((mid - Vec4::new(0.5, 0.0, 0.5, 1.0)).length() < 1e-6);
    }

    #[test]
    fn mesh_streams_line_up() {
        let geometry = Arc::new(SphereGeometry::generate(2));
        let mesh = SphereMesh::new(geometry.clone(), Gradient::default());
        let vertices = mesh.vertices();
        assert_eq!(vertices.len(), geometry.positions.len());
        assert_eq!(mesh.colours().len(), geometry.positions.len());
        for (v, p) in vertices.iter().zip(&geometry.positions) {
            assert_eq!(v.normal, p.truncate().to_array());
            assert_eq!(v.point, p.to_array());
            assert_eq!(v.colour[3], 1.0);
        }
    }
}
