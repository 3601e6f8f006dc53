//! Unit sphere tessellation by recursive edge subdivision of a regular tetrahedron.

use glam::{Vec3, Vec4};
use std::collections::HashMap;

/// Default subdivision order for game spheres.
pub const DEFAULT_ORDER: u32 = 5;

/// Point on the unit sphere from spherical angles.
///
/// `theta` is the angle in the x/z plane, `phi` the angle off the +Y pole.
pub fn sphere_vector(theta: f32, phi: f32) -> Vec4 {
    Vec4::new(theta.cos() * phi.sin(), phi.cos(), theta.sin() * phi.sin(), 1.0)
}

/// Positions and triangle indices of a unit sphere centred at the origin.
///
/// Positions are homogeneous points (w = 1). Every index is a valid offset into
/// `positions` and the index count is always a multiple of 3.
#[derive(Debug, Clone, Default)]
pub struct SphereGeometry {
    pub positions: Vec<Vec4>,
    pub indices: Vec<u32>,
}

impl SphereGeometry {
    /// The regular tetrahedron the subdivision starts from. Faces wind
    /// counter-clockwise when seen from outside.
    pub fn tetrahedron() -> Self {
        let lower = (-1.0f32 / 3.0).acos();
        let tau_third = 2.0 * std::f32::consts::PI / 3.0;
        Self {
            positions: vec![
                sphere_vector(0.0, 0.0),
                sphere_vector(0.0, lower),
                sphere_vector(tau_third, lower),
                sphere_vector(2.0 * tau_third, lower),
            ],
            #[rustfmt::skip]
            indices: vec![
                0, 2, 1,
                0, 1, 3,
                0, 3, 2,
                1, 2, 3,
            ],
        }
    }

    /// Build a sphere by subdividing the tetrahedron `order` times.
    ///
    /// Order 0 is the bare tetrahedron. Vertex count is `4 + 6·(4^order − 1)/3`,
    /// index count `12·4^order`.
    pub fn generate(order: u32) -> Self {
        let mut geometry = Self::tetrahedron();
        for _ in 0..order {
            geometry.subdivide();
        }
        geometry
    }

    /// Expected vertex count for a given order.
    pub fn vertex_count_for(order: u32) -> usize {
        4 + 6 * (4usize.pow(order) - 1) / 3
    }

    /// Expected index count for a given order.
    pub fn index_count_for(order: u32) -> usize {
        12 * 4usize.pow(order)
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Split every triangle into four, sharing one midpoint vertex per edge.
    fn subdivide(&mut self) {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut indices = Vec::with_capacity(self.indices.len() * 4);

        for tri in 0..self.triangle_count() {
            let a = self.indices[tri * 3];
            let b = self.indices[tri * 3 + 1];
            let c = self.indices[tri * 3 + 2];

            let ab = self.midpoint(&mut midpoints, a, b);
            let bc = self.midpoint(&mut midpoints, b, c);
            let ca = self.midpoint(&mut midpoints, c, a);

            #[rustfmt::skip]
            indices.extend_from_slice(&[
                a, ab, ca,
                b, bc, ab,
                c, ca, bc,
                ab, bc, ca,
            ]);
        }

        self.indices = indices;
    }

    /// Index of the normalised midpoint of edge (a, b), appended on first use.
    fn midpoint(&mut self, cache: &mut HashMap<(u32, u32), u32>, a: u32, b: u32) -> u32 {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = cache.get(&key) {
            return index;
        }

        let pa = self.positions[a as usize].truncate();
        let pb = self.positions[b as usize].truncate();
        let mid = pa.lerp(pb, 0.5).normalize();

        let index = self.positions.len() as u32;
        self.positions.push(mid.extend(1.0));
        cache.insert(key, index);
        index
    }

    /// Outward unit normals; equal to the positions since the sphere is centred at the origin.
    pub fn normals(&self) -> Vec<Vec3> {
        self.positions.iter().map(|p| p.truncate()).collect()
    }
}
