//! Shader program environment: compiles a vertex/fragment WGSL pair with naga,
//! checks the two stages fit together, and resolves uniform and attribute
//! names to their bind points.

use naga::valid::{Capabilities, ValidationFlags, Validator};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("{stage} shader failed to compile:\n{diagnostic}")]
    Compile { stage: ShaderStage, diagnostic: String },
    #[error("shader program failed to link: {diagnostic}")]
    Link { diagnostic: String },
    #[error("`{name}` does not name a uniform or attribute in the program")]
    Unresolved { name: String },
}

/// Where a uniform lives: a bind group slot plus a byte offset inside its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformHandle {
    pub group: u32,
    pub binding: u32,
    pub offset: u32,
}

/// Vertex input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHandle {
    pub location: u32,
}

/// A compiled, linked and introspected shader program.
#[derive(Debug)]
pub struct RenderEnvironment {
    vertex_source: String,
    fragment_source: String,
    vertex_entry: String,
    fragment_entry: String,
    uniforms: HashMap<String, UniformHandle>,
    attributes: HashMap<String, AttributeHandle>,
}

/// Names without a stage prefix belong to the vertex stage.
fn qualified(name: &str) -> String {
    if name.starts_with("vs_") || name.starts_with("fs_") {
        name.to_string()
    } else {
        format!("vs_{name}")
    }
}

fn compile(stage: ShaderStage, source: &str) -> Result<naga::Module, EnvironmentError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| EnvironmentError::Compile {
        stage,
        diagnostic: e.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| EnvironmentError::Compile {
            stage,
            diagnostic: e.emit_to_string(source),
        })?;
    Ok(module)
}

fn entry_point(module: &naga::Module, stage: naga::ShaderStage) -> Option<&naga::EntryPoint> {
    module.entry_points.iter().find(|ep| ep.stage == stage)
}

/// `(name, location)` for a binding that is either direct or spread over struct members.
fn locations(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
) -> Vec<(Option<String>, u32)> {
    match binding {
        Some(naga::Binding::Location { location, .. }) => vec![(name.map(str::to_string), *location)],
        Some(naga::Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .flat_map(|m| locations(module, m.name.as_deref(), m.ty, m.binding.as_ref()))
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn inputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<(Option<String>, u32)> {
    ep.function
        .arguments
        .iter()
        .flat_map(|arg| locations(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref()))
        .collect()
}

fn outputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<u32> {
    ep.function
        .result
        .as_ref()
        .map(|r| locations(module, None, r.ty, r.binding.as_ref()))
        .unwrap_or_default()
        .into_iter()
        .map(|(_, location)| location)
        .collect()
}

fn find_uniform(module: &naga::Module, name: &str) -> Option<UniformHandle> {
    for (_, var) in module.global_variables.iter() {
        let Some(binding) = &var.binding else { continue };
        if !matches!(var.space, naga::AddressSpace::Uniform | naga::AddressSpace::Handle) {
            continue;
        }
        if var.name.as_deref() == Some(name) {
            return Some(UniformHandle { group: binding.group, binding: binding.binding, offset: 0 });
        }
        if let naga::TypeInner::Struct { members, .. } = &module.types[var.ty].inner {
            if let Some(member) = members.iter().find(|m| m.name.as_deref() == Some(name)) {
                return Some(UniformHandle {
                    group: binding.group,
                    binding: binding.binding,
                    offset: member.offset,
                });
            }
        }
    }
    None
}

impl RenderEnvironment {
    /// Compile both stages, link them and resolve every requested name.
    pub fn new(
        vertex_source: &str,
        fragment_source: &str,
        uniform_names: &[&str],
        attribute_names: &[&str],
    ) -> Result<Self, EnvironmentError> {
        let vertex = compile(ShaderStage::Vertex, vertex_source)?;
        let fragment = compile(ShaderStage::Fragment, fragment_source)?;

        let vs_entry = entry_point(&vertex, naga::ShaderStage::Vertex).ok_or_else(|| EnvironmentError::Link {
            diagnostic: "vertex shader has no @vertex entry point".to_string(),
        })?;
        let fs_entry = entry_point(&fragment, naga::ShaderStage::Fragment).ok_or_else(|| EnvironmentError::Link {
            diagnostic: "fragment shader has no @fragment entry point".to_string(),
        })?;

        let produced = outputs(&vertex, vs_entry);
        if let Some((name, location)) = inputs(&fragment, fs_entry)
            .into_iter()
            .find(|(_, location)| !produced.contains(location))
        {
            return Err(EnvironmentError::Link {
                diagnostic: format!(
                    "fragment input `{}` at @location({location}) is not written by the vertex stage",
                    name.unwrap_or_default()
                ),
            });
        }

        let mut uniforms = HashMap::new();
        for &name in uniform_names {
            let full = qualified(name);
            let handle = find_uniform(&vertex, &full)
                .or_else(|| find_uniform(&fragment, &full))
                .ok_or_else(|| EnvironmentError::Unresolved { name: name.to_string() })?;
            uniforms.insert(name.to_string(), handle);
        }

        let vertex_inputs = inputs(&vertex, vs_entry);
        let mut attributes = HashMap::new();
        for &name in attribute_names {
            let full = qualified(name);
            let location = vertex_inputs
                .iter()
                .find(|(n, _)| n.as_deref() == Some(full.as_str()))
                .map(|&(_, location)| location)
                .ok_or_else(|| EnvironmentError::Unresolved { name: name.to_string() })?;
            attributes.insert(name.to_string(), AttributeHandle { location });
        }

        log::debug!(
            "shader program linked: {} uniforms, {} attributes",
            uniforms.len(),
            attributes.len()
        );

        Ok(Self {
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            vertex_entry: vs_entry.name.clone(),
            fragment_entry: fs_entry.name.clone(),
            uniforms,
            attributes,
        })
    }

    /// Handle for a name passed to [`RenderEnvironment::new`].
    pub fn uniform(&self, name: &str) -> Option<UniformHandle> {
        self.uniforms.get(name).copied()
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeHandle> {
        self.attributes.get(name).copied()
    }

    /// Link error unless `name` resolved to exactly `expected`.
    pub fn require_uniform(&self, name: &str, expected: UniformHandle) -> Result<(), EnvironmentError> {
        let found = self.uniform(name).ok_or_else(|| EnvironmentError::Unresolved { name: name.to_string() })?;
        if found != expected {
            return Err(EnvironmentError::Link {
                diagnostic: format!(
                    "uniform `{name}` is at group {} binding {} offset {}, the renderer writes it at group {} binding {} offset {}",
                    found.group, found.binding, found.offset, expected.group, expected.binding, expected.offset
                ),
            });
        }
        Ok(())
    }

    /// Link error unless attribute `name` is read from `location`.
    pub fn require_attribute(&self, name: &str, location: u32) -> Result<(), EnvironmentError> {
        let found = self.attribute(name).ok_or_else(|| EnvironmentError::Unresolved { name: name.to_string() })?;
        if found.location != location {
            return Err(EnvironmentError::Link {
                diagnostic: format!(
                    "attribute `{name}` is at @location({}), the vertex buffer feeds @location({location})",
                    found.location
                ),
            });
        }
        Ok(())
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// Build the two wgpu shader modules from the validated sources.
    pub fn create_modules(&self, device: &wgpu::Device, label: &str) -> (wgpu::ShaderModule, wgpu::ShaderModule) {
        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} Vertex Shader")),
            source: wgpu::ShaderSource::Wgsl(self.vertex_source.as_str().into()),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} Fragment Shader")),
            source: wgpu::ShaderSource::Wgsl(self.fragment_source.as_str().into()),
        });
        (vs, fs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameUniform;
    use crate::object::ObjectUniform;
    use crate::shaders;
    use crate::vertex::SphereVertex;
    use std::mem::offset_of;

    fn sphere() -> RenderEnvironment {
        RenderEnvironment::new(
            shaders::SPHERE_VS,
            shaders::SPHERE_FS,
            shaders::SPHERE_UNIFORMS,
            shaders::SPHERE_ATTRIBUTES,
        )
        .expect("sphere program should link")
    }

    #[test]
    fn sphere_uniform_offsets_match_rust_layout() {
        let env = sphere();
        let frame = |name| env.uniform(name).unwrap();
        assert_eq!(frame("view_matrix"), UniformHandle { group: 0, binding: 0, offset: 0 });
        assert_eq!(frame("projection_matrix").offset as usize, offset_of!(FrameUniform, projection_matrix));
        assert_eq!(frame("light_point").offset as usize, offset_of!(FrameUniform, light_point));
        assert_eq!(frame("light_colour").offset as usize, offset_of!(FrameUniform, light_colour));
        assert_eq!(frame("one_colour").offset as usize, offset_of!(FrameUniform, one_colour));

        let object = |name| env.uniform(name).unwrap();
        assert_eq!(object("model_matrix"), UniformHandle { group: 1, binding: 0, offset: 0 });
        assert_eq!(object("single_colour").offset as usize, offset_of!(ObjectUniform, single_colour));
        assert_eq!(object("light_ambient").offset as usize, offset_of!(ObjectUniform, light_ambient));
        assert_eq!(object("light_diffuse").offset as usize, offset_of!(ObjectUniform, light_diffuse));
        assert_eq!(object("light_specular").offset as usize, offset_of!(ObjectUniform, light_specular));
    }

    #[test]
    fn sphere_attributes_match_vertex_layout() {
        let env = sphere();
        assert_eq!(env.attribute("point").unwrap().location, SphereVertex::POINT_LOCATION);
        assert_eq!(env.attribute("colour").unwrap().location, SphereVertex::COLOUR_LOCATION);
        assert_eq!(env.attribute("normal").unwrap().location, SphereVertex::NORMAL_LOCATION);
        let layout = SphereVertex::layout();
        assert_eq!(layout.attributes.len(), 3);
        assert_eq!(env.vertex_entry(), "vs_main");
        assert_eq!(env.fragment_entry(), "fs_main");
    }

    #[test]
    fn overlay_program_resolves_prefixed_handles() {
        let env = RenderEnvironment::new(
            shaders::OVERLAY_VS,
            shaders::OVERLAY_FS,
            shaders::OVERLAY_UNIFORMS,
            shaders::OVERLAY_ATTRIBUTES,
        )
        .unwrap();
        assert_eq!(env.uniform("fs_font_atlas"), Some(UniformHandle { group: 0, binding: 0, offset: 0 }));
        assert_eq!(env.uniform("fs_font_sampler"), Some(UniformHandle { group: 0, binding: 1, offset: 0 }));
        assert_eq!(env.attribute("tex_coords"), Some(AttributeHandle { location: 1 }));
    }

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = RenderEnvironment::new("fn vs_main( -> {", shaders::SPHERE_FS, &[], &[]).unwrap_err();
        match err {
            EnvironmentError::Compile { stage, diagnostic } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let broken = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = RenderEnvironment::new(shaders::SPHERE_VS, broken, &[], &[]).unwrap_err();
        assert!(matches!(err, EnvironmentError::Compile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let fs = "@fragment fn fs_main(@location(7) tint: vec4<f32>) -> @location(0) vec4<f32> { return tint; }";
        let err = RenderEnvironment::new(shaders::SPHERE_VS, fs, &[], &[]).unwrap_err();
        assert!(matches!(err, EnvironmentError::Link { .. }));
    }

    #[test]
    fn missing_entry_point_fails_to_link() {
        let err = RenderEnvironment::new(shaders::SPHERE_FS, shaders::SPHERE_FS, &[], &[]).unwrap_err();
        assert!(matches!(err, EnvironmentError::Link { .. }));
    }

    #[test]
    fn unknown_name_is_unresolved() {
        let err = RenderEnvironment::new(shaders::SPHERE_VS, shaders::SPHERE_FS, &["use_texture"], &[]).unwrap_err();
        match err {
            EnvironmentError::Unresolved { name } => assert_eq!(name, "use_texture"),
            other => panic!("expected unresolved name, got {other:?}"),
        }
        let err = RenderEnvironment::new(shaders::SPHERE_VS, shaders::SPHERE_FS, &[], &["tex_coord"]).unwrap_err();
        assert!(matches!(err, EnvironmentError::Unresolved { .. }));
    }

    #[test]
    fn require_checks_resolved_handles() {
        let env = sphere();
        assert!(env.require_attribute("normal", SphereVertex::NORMAL_LOCATION).is_ok());
        assert!(matches!(env.require_attribute("normal", 0), Err(EnvironmentError::Link { .. })));

        let light = UniformHandle { group: 1, binding: 0, offset: offset_of!(ObjectUniform, light_specular) as u32 };
        assert!(env.require_uniform("light_specular", light).is_ok());
        let shifted = UniformHandle { offset: light.offset + 4, ..light };
        assert!(matches!(env.require_uniform("light_specular", shifted), Err(EnvironmentError::Link { .. })));
        assert!(matches!(env.require_uniform("bogus", light), Err(EnvironmentError::Unresolved { .. })));
    }
}
