//! Sphere rendering for Petri: tessellation, shader environments, the wgpu
//! renderer and colour-coded picking.

pub mod camera;
pub mod environment;
pub mod frame;
pub mod geometry;
pub mod mesh;
pub mod object;
pub mod overlay;
pub mod picking;
pub mod pipeline;
pub mod renderer;
pub mod shaders;
pub mod texture;
pub mod vertex;

pub use camera::*;
pub use environment::*;
pub use frame::*;
pub use geometry::*;
pub use mesh::*;
pub use object::*;
pub use overlay::*;
pub use picking::*;
pub use renderer::*;
pub use shaders::ShaderSet;
pub use texture::*;
pub use vertex::*;
