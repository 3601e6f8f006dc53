//! Per-frame render input and the frame-wide uniform block.

use crate::camera::Camera;
use crate::object::SphereObject;
use crate::overlay::Overlay;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Point light shared by every sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub point: Vec3,
    pub colour: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            point: Vec3::new(2.0, 2.0, 2.0),
            colour: Vec3::ONE,
        }
    }
}

/// How sphere fragments are coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Gradient colour with ambient/diffuse/specular lighting.
    Shaded,
    /// Flat per-object id colour, used by the picking pass.
    PickId,
}

/// Everything needed to draw one frame, in draw order.
///
/// `objects` is drawn front to back of the list; the overlay (if any) goes first, behind everything.
pub struct Frame<'a> {
    pub camera: &'a Camera,
    pub light: Light,
    pub objects: Vec<&'a SphereObject>,
    pub overlay: Option<&'a Overlay>,
}

/// Frame uniform (must match `FrameUniform` in the sphere shaders).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_matrix: [[f32; 4]; 4],
    pub projection_matrix: [[f32; 4]; 4],
    pub light_point: [f32; 4],
    pub light_colour: [f32; 4],
    /// 1.0 = flat id colour, 0.0 = shaded.
    pub one_colour: f32,
    pub _pad: [f32; 3],
}

impl FrameUniform {
    pub fn new(camera: &Camera, light: &Light, mode: RenderMode) -> Self {
        Self {
            view_matrix: camera.view.to_cols_array_2d(),
            projection_matrix: camera.projection_matrix().to_cols_array_2d(),
            light_point: light.point.extend(1.0).to_array(),
            light_colour: light.colour.extend(1.0).to_array(),
            one_colour: match mode {
                RenderMode::Shaded => 0.0,
                RenderMode::PickId => 1.0,
            },
            _pad: [0.0; 3],
        }
    }
}
