//! Built-in WGSL programs and the names the renderer resolves in them.

use crate::environment::{EnvironmentError, RenderEnvironment, UniformHandle};
use crate::frame::FrameUniform;
use crate::object::ObjectUniform;
use crate::vertex::SphereVertex;
use std::mem::offset_of;
use std::path::Path;

pub const SPHERE_VS: &str = include_str!("shaders/sphere_vs.wgsl");
pub const SPHERE_FS: &str = include_str!("shaders/sphere_fs.wgsl");
pub const OVERLAY_VS: &str = include_str!("shaders/overlay_vs.wgsl");
pub const OVERLAY_FS: &str = include_str!("shaders/overlay_fs.wgsl");

pub const SPHERE_UNIFORMS: &[&str] = &[
    "view_matrix",
    "projection_matrix",
    "light_point",
    "light_colour",
    "one_colour",
    "model_matrix",
    "single_colour",
    "light_ambient",
    "light_diffuse",
    "light_specular",
];
pub const SPHERE_ATTRIBUTES: &[&str] = &["point", "colour", "normal"];

pub const OVERLAY_UNIFORMS: &[&str] = &["fs_font_atlas", "fs_font_sampler"];
pub const OVERLAY_ATTRIBUTES: &[&str] = &["position", "tex_coords", "color"];

const FRAME_GROUP: u32 = 0;
const OBJECT_GROUP: u32 = 1;

fn frame_uniform(offset: usize) -> UniformHandle {
    UniformHandle { group: FRAME_GROUP, binding: 0, offset: offset as u32 }
}

fn object_uniform(offset: usize) -> UniformHandle {
    UniformHandle { group: OBJECT_GROUP, binding: 0, offset: offset as u32 }
}

/// Where the renderer writes each sphere uniform, from the `#[repr(C)]` structs.
fn sphere_uniform_layout() -> [(&'static str, UniformHandle); 10] {
    [
        ("view_matrix", frame_uniform(offset_of!(FrameUniform, view_matrix))),
        ("projection_matrix", frame_uniform(offset_of!(FrameUniform, projection_matrix))),
        ("light_point", frame_uniform(offset_of!(FrameUniform, light_point))),
        ("light_colour", frame_uniform(offset_of!(FrameUniform, light_colour))),
        ("one_colour", frame_uniform(offset_of!(FrameUniform, one_colour))),
        ("model_matrix", object_uniform(offset_of!(ObjectUniform, model_matrix))),
        ("single_colour", object_uniform(offset_of!(ObjectUniform, single_colour))),
        ("light_ambient", object_uniform(offset_of!(ObjectUniform, light_ambient))),
        ("light_diffuse", object_uniform(offset_of!(ObjectUniform, light_diffuse))),
        ("light_specular", object_uniform(offset_of!(ObjectUniform, light_specular))),
    ]
}

const SPHERE_ATTRIBUTE_LAYOUT: [(&str, u32); 3] = [
    ("point", SphereVertex::POINT_LOCATION),
    ("colour", SphereVertex::COLOUR_LOCATION),
    ("normal", SphereVertex::NORMAL_LOCATION),
];

const OVERLAY_UNIFORM_LAYOUT: [(&str, UniformHandle); 2] = [
    ("fs_font_atlas", UniformHandle { group: 0, binding: 0, offset: 0 }),
    ("fs_font_sampler", UniformHandle { group: 0, binding: 1, offset: 0 }),
];

/// Matches `OverlayVertex::layout`.
const OVERLAY_ATTRIBUTE_LAYOUT: [(&str, u32); 3] = [("position", 0), ("tex_coords", 1), ("color", 2)];

fn check_layout(
    env: RenderEnvironment,
    uniforms: &[(&str, UniformHandle)],
    attributes: &[(&str, u32)],
) -> Result<RenderEnvironment, EnvironmentError> {
    for &(name, handle) in uniforms {
        env.require_uniform(name, handle)?;
    }
    for &(name, location) in attributes {
        env.require_attribute(name, location)?;
    }
    Ok(env)
}

/// The four shader sources the renderer builds its pipelines from.
#[derive(Debug, Clone)]
pub struct ShaderSet {
    pub sphere_vs: String,
    pub sphere_fs: String,
    pub overlay_vs: String,
    pub overlay_fs: String,
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self {
            sphere_vs: SPHERE_VS.to_string(),
            sphere_fs: SPHERE_FS.to_string(),
            overlay_vs: OVERLAY_VS.to_string(),
            overlay_fs: OVERLAY_FS.to_string(),
        }
    }
}

impl ShaderSet {
    /// Built-in sources, with any of `sphere_vs.wgsl`, `sphere_fs.wgsl`,
    /// `overlay_vs.wgsl` or `overlay_fs.wgsl` found in `dir` taking their place.
    pub fn with_overrides(dir: &Path) -> Self {
        let mut set = Self::default();
        for (file, slot) in [
            ("sphere_vs.wgsl", &mut set.sphere_vs),
            ("sphere_fs.wgsl", &mut set.sphere_fs),
            ("overlay_vs.wgsl", &mut set.overlay_vs),
            ("overlay_fs.wgsl", &mut set.overlay_fs),
        ] {
            let path = dir.join(file);
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(source) => {
                    log::info!("Using shader override {}", path.display());
                    *slot = source;
                }
                Err(e) => log::warn!("Could not read {}: {e}; using built-in shader", path.display()),
            }
        }
        set
    }

    /// Compile and link the sphere program, and check it reads its inputs where the renderer writes them.
    pub fn sphere_environment(&self) -> Result<RenderEnvironment, EnvironmentError> {
        let env = RenderEnvironment::new(&self.sphere_vs, &self.sphere_fs, SPHERE_UNIFORMS, SPHERE_ATTRIBUTES)?;
        check_layout(env, &sphere_uniform_layout(), &SPHERE_ATTRIBUTE_LAYOUT)
    }

    pub fn overlay_environment(&self) -> Result<RenderEnvironment, EnvironmentError> {
        let env = RenderEnvironment::new(&self.overlay_vs, &self.overlay_fs, OVERLAY_UNIFORMS, OVERLAY_ATTRIBUTES)?;
        check_layout(env, &OVERLAY_UNIFORM_LAYOUT, &OVERLAY_ATTRIBUTE_LAYOUT)
    }
}
