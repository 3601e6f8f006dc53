//! Look-at camera with an externally driven view matrix.

use glam::{Mat4, Vec2, Vec3};

/// Perspective camera. The view matrix is stored directly so controllers
/// (the arc-ball) can replace it wholesale.
#[derive(Debug, Clone)]
pub struct Camera {
    /// World-to-view transform.
    pub view: Mat4,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
    }
}

impl Camera {
    /// Camera at `eye` looking at `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            view: Mat4::look_at_rh(eye, target, up),
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
        }
    }

    /// Update aspect ratio (call on window resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }

    /// Project a world point to window pixels (origin top-left).
    pub fn project_to_screen(&self, point: Vec3, width: u32, height: u32) -> Vec2 {
        let ndc = self.view_projection_matrix().project_point3(point);
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * width as f32,
            (1.0 - ndc.y) * 0.5 * height as f32,
        )
    }

    /// World-space ray (origin, unit direction) through window pixel `pixel`.
    pub fn screen_ray(&self, pixel: Vec2, width: u32, height: u32) -> (Vec3, Vec3) {
        let ndc_x = pixel.x / width.max(1) as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - pixel.y / height.max(1) as f32 * 2.0;
        let inverse = self.view_projection_matrix().inverse();
        // wgpu clip depth runs 0 (near) to 1 (far).
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        (near, (far - near).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_sits_on_z_axis() {
        let camera = Camera::default();
        assert!((camera.position() - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let mut camera = Camera::default();
        camera.set_aspect(800, 600);
        let p = camera.project_to_screen(Vec3::ZERO, 800, 600);
        assert!((p - Vec2::new(400.0, 300.0)).length() < 1e-3);
    }

    #[test]
    fn centre_ray_points_at_origin() {
        let mut camera = Camera::default();
        camera.set_aspect(800, 600);
        let (origin, dir) = camera.screen_ray(Vec2::new(400.0, 300.0), 800, 600);
        assert!((dir - Vec3::NEG_Z).length() < 1e-4);
        assert!(origin.x.abs() < 1e-4 && origin.y.abs() < 1e-4);
    }

    #[test]
    fn screen_projection_is_y_down() {
        let mut camera = Camera::default();
        camera.set_aspect(800, 600);
        let above = camera.project_to_screen(Vec3::new(0.0, 0.5, 0.0), 800, 600);
        assert!(above.y < 300.0);
    }
}
