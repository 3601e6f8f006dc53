//! Drawable spheres: mesh, transform, lighting coefficients and a pick id.

use crate::geometry::{SphereGeometry, DEFAULT_ORDER};
use crate::mesh::{Gradient, SphereMesh};
use crate::picking::PickId;
use crate::renderer::DrawContext;
use bytemuck::{Pod, Zeroable};
use engine_core::Transform;
use glam::{Mat4, Vec3};
use std::sync::Arc;

/// Phong coefficients for one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: 0.3,
            diffuse: 0.5,
            specular: 0.5,
        }
    }
}

/// Construction parameters for a [`SphereObject`].
#[derive(Debug, Clone, Copy)]
pub struct SphereDesc {
    pub order: u32,
    pub centre: Vec3,
    pub radius: f32,
    pub gradient: Gradient,
    pub lighting: Lighting,
    pub pick_id: PickId,
}

impl Default for SphereDesc {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            centre: Vec3::ZERO,
            radius: 1.0,
            gradient: Gradient::default(),
            lighting: Lighting::default(),
            pick_id: PickId::BACKGROUND,
        }
    }
}

/// Object uniform (must match `ObjectUniform` in the sphere shaders).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model_matrix: [[f32; 4]; 4],
    pub single_colour: [f32; 4],
    pub light_ambient: f32,
    pub light_diffuse: f32,
    pub light_specular: f32,
    pub _pad: f32,
}

/// A gradient-coloured sphere placed in the world.
#[derive(Debug, Clone)]
pub struct SphereObject {
    mesh: SphereMesh,
    transform: Transform,
    model: Mat4,
    lighting: Lighting,
    pick_id: PickId,
}

impl SphereObject {
    /// Build a sphere with its own freshly subdivided geometry.
    pub fn new(desc: SphereDesc) -> Self {
        Self::with_geometry(Arc::new(SphereGeometry::generate(desc.order)), desc)
    }

    /// Build a sphere on shared geometry; `desc.order` is ignored.
    pub fn with_geometry(geometry: Arc<SphereGeometry>, desc: SphereDesc) -> Self {
        let transform = Transform::from_radius(desc.centre, desc.radius);
        Self {
            mesh: SphereMesh::new(geometry, desc.gradient),
            model: transform.to_matrix(),
            transform,
            lighting: desc.lighting,
            pick_id: desc.pick_id,
        }
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.mesh
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable transform. Call [`SphereObject::recompute_model`] once done editing.
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn lighting(&self) -> Lighting {
        self.lighting
    }

    pub fn pick_id(&self) -> PickId {
        self.pick_id
    }

    /// Rebuild the model matrix from the current transform.
    pub fn recompute_model(&mut self) {
        self.model = self.transform.to_matrix();
    }

    /// Sit on the surface of a sphere of radius `surface_radius` at the origin,
    /// pole pointing outward along `direction`.
    pub fn place_on_surface(&mut self, direction: Vec3, surface_radius: f32) {
        let direction = direction.try_normalize().unwrap_or(engine_core::transform::POLE);
        self.transform.translation = direction * surface_radius;
        self.transform.orient_pole_to(direction);
        self.recompute_model();
    }

    pub fn uniform(&self) -> ObjectUniform {
        ObjectUniform {
            model_matrix: self.model.to_cols_array_2d(),
            single_colour: self.pick_id.colour(),
            light_ambient: self.lighting.ambient,
            light_diffuse: self.lighting.diffuse,
            light_specular: self.lighting.specular,
            _pad: 0.0,
        }
    }

    /// Record this sphere's draw into the active pass.
    pub fn draw(&self, ctx: &mut DrawContext<'_, '_>) {
        ctx.draw_sphere(self);
    }
}
