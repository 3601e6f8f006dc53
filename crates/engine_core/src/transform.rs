//! Transform component and utilities for spatial positioning.

use glam::{Mat4, Quat, Vec3};

/// Local "up" of every sphere: the pole the colour gradient runs along.
pub const POLE: Vec3 = Vec3::Z;

/// A 3D transform made of translation, scale and an orthonormal rotation matrix.
///
/// The composed model matrix is `translate × scale × rotation`. It is never
/// mutated in place; call [`Transform::to_matrix`] again after changing a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub scale: Vec3,
    pub rotation: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            scale: Vec3::ONE,
            rotation: Mat4::IDENTITY,
        }
    }
}

impl Transform {
    /// Create a transform centred at `centre` with a uniform scale of `radius`.
    pub fn from_radius(centre: Vec3, radius: f32) -> Self {
        Self {
            translation: centre,
            scale: Vec3::splat(radius),
            ..Default::default()
        }
    }

    /// Compose the model matrix.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_scale(self.scale) * self.rotation
    }

    /// Grow the scale uniformly by `amount` on every axis.
    pub fn grow(&mut self, amount: f32) {
        self.scale += Vec3::splat(amount);
    }

    /// Rotate so that [`POLE`] points along `direction` (which must be unit length).
    ///
    /// Identity when `direction` is the pole itself; the antipode gets a half turn.
    pub fn orient_pole_to(&mut self, direction: Vec3) {
        self.rotation = Mat4::from_quat(Quat::from_rotation_arc(POLE, direction));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_matrix_composes_translate_scale_rotate() {
        let mut t = Transform::from_radius(Vec3::new(1.0, 2.0, 3.0), 2.0);
        t.rotation = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        let m = t.to_matrix();

        // Local +X rotates to -Z, is scaled by 2, then translated.
        let p = m.transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 2.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn to_matrix_is_idempotent() {
        let t = Transform::from_radius(Vec3::new(0.3, -0.2, 0.9), 0.05);
        assert_eq!(t.to_matrix(), t.to_matrix());
    }

    #[test]
    fn orient_pole_to_pole_is_identity() {
        let mut t = Transform::default();
        t.orient_pole_to(POLE);
        assert!(t.rotation.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn orient_pole_to_maps_pole_onto_direction() {
        for dir in [Vec3::X, -Vec3::Z, Vec3::new(1.0, -2.0, 0.5).normalize()] {
            let mut t = Transform::default();
            t.orient_pole_to(dir);
            let up = t.rotation.transform_vector3(POLE);
            assert!((up - dir).length() < 1e-5, "pole should land on {dir:?}, got {up:?}");
        }
    }
}
