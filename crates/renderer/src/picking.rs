//! Colour-coded picking: object ids travel through the framebuffer as RGB bytes.

use crate::frame::Frame;
use glam::{Vec2, Vec3};
use thiserror::Error;

/// Ids must fit in the 24 bits of an RGB8 pixel.
pub const PICK_ID_LIMIT: u32 = 1 << 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickError {
    #[error("pick id {0} does not fit in 24 bits")]
    OutOfRange(u32),
}

/// Encode the low 24 bits of `id` as an opaque RGBA colour (R holds the low byte).
///
/// Ids of 2^24 and above are not representable and come out as opaque black,
/// which decodes to the background id.
pub fn encode_id(id: u32) -> [f32; 4] {
    if id >= PICK_ID_LIMIT {
        return [0.0, 0.0, 0.0, 1.0];
    }
    let [r, g, b, _] = id.to_le_bytes();
    [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0]
}

/// Decode a read-back RGBA8 pixel into an id. Alpha is ignored.
pub fn decode_colour(rgba: [u8; 4]) -> u32 {
    u32::from_le_bytes([rgba[0], rgba[1], rgba[2], 0])
}

/// A validated picking id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickId(u32);

impl PickId {
    /// Cleared framebuffer: nothing under the cursor.
    pub const BACKGROUND: PickId = PickId(0);
    /// The primary globe.
    pub const GLOBE: PickId = PickId(1);

    pub fn new(id: u32) -> Result<Self, PickError> {
        if id >= PICK_ID_LIMIT {
            return Err(PickError::OutOfRange(id));
        }
        Ok(Self(id))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Flat colour this id renders as in the picking pass.
    pub fn colour(self) -> [f32; 4] {
        encode_id(self.0)
    }

    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        Self(decode_colour(rgba))
    }
}

impl TryFrom<u32> for PickId {
    type Error = PickError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl std::fmt::Display for PickId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Resolves the object under a window pixel for the given frame.
pub trait Picker {
    /// `x`, `y` are window pixels with the origin at the top-left.
    fn pick(&mut self, frame: &Frame<'_>, x: u32, y: u32) -> anyhow::Result<PickId>;
}

/// CPU picker: casts a ray through the pixel centre against each object's bounding sphere.
#[derive(Debug, Clone, Copy)]
pub struct RayPicker {
    pub width: u32,
    pub height: u32,
}

impl RayPicker {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Distance along a unit-direction ray to the first intersection with a sphere.
fn ray_sphere(origin: Vec3, dir: Vec3, centre: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - centre;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt = disc.sqrt();
    let near = -b - sqrt;
    let far = -b + sqrt;
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(far)
    } else {
        None
    }
}

impl Picker for RayPicker {
    fn pick(&mut self, frame: &Frame<'_>, x: u32, y: u32) -> anyhow::Result<PickId> {
        if x >= self.width || y >= self.height {
            return Ok(PickId::BACKGROUND);
        }
        let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let (origin, dir) = frame.camera.screen_ray(pixel, self.width, self.height);

        let hit = frame
            .objects
            .iter()
            .filter_map(|object| {
                let t = object.transform();
                ray_sphere(origin, dir, t.translation, t.scale.max_element())
                    .map(|distance| (distance, object.pick_id()))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0));

        Ok(hit.map_or(PickId::BACKGROUND, |(_, id)| id))
    }
}
