//! Virtual trackball: turns a pointer drag into a rotation of the view about
//! the look-at pivot.

use glam::{Mat4, Vec2, Vec3};

/// Distance from the eye to the rotation pivot (the globe's centre).
pub const PIVOT_DISTANCE: f32 = 3.0;

/// Gap in pixels between the trackball rim and the shorter viewport edge.
const RIM_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: Vec3,
    end: Vec3,
    stash: Mat4,
}

#[derive(Debug, Clone)]
pub struct ArcBall {
    centre: Vec2,
    radius: f32,
    height: f32,
    pivot_distance: f32,
    drag: Option<Drag>,
}

impl ArcBall {
    pub fn new(width: u32, height: u32) -> Self {
        let mut ball = Self {
            centre: Vec2::ZERO,
            radius: 0.0,
            height: 0.0,
            pivot_distance: PIVOT_DISTANCE,
            drag: None,
        };
        ball.resize(width, height);
        ball
    }

    /// Recompute centre and radius for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (w, h) = (width as f32, height as f32);
        self.centre = Vec2::new(w / 2.0, h / 2.0);
        self.radius = ((w.min(h) - RIM_MARGIN) / 2.0).max(1.0);
        self.height = h;
    }

    pub fn centre(&self) -> Vec2 {
        self.centre
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Map a window pixel (origin top-left) onto the unit trackball.
    ///
    /// Points outside the ball land on its equator (z = 0).
    pub fn project(&self, pointer: Vec2) -> Vec3 {
        let x = pointer.x - self.centre.x;
        let y = (self.height - pointer.y) - self.centre.y;
        let d2 = x * x + y * y;
        let r2 = self.radius * self.radius;
        let z = if d2 < r2 { (r2 - d2).sqrt() } else { 0.0 };
        Vec3::new(x, y, z).try_normalize().unwrap_or(Vec3::Z)
    }

    /// Start a drag at `pointer`, remembering the current view matrix.
    pub fn begin(&mut self, pointer: Vec2, view: Mat4) {
        let start = self.project(pointer);
        self.drag = Some(Drag { start, end: start, stash: view });
    }

    /// The view matrix for a drag that has reached `pointer`, or `None` when idle.
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<Mat4> {
        let end = self.project(pointer);
        let drag = self.drag.as_mut()?;
        drag.end = end;

        let start = drag.start;
        if start.abs_diff_eq(end, 1e-6) {
            return Some(drag.stash);
        }
        let Some(axis) = start.cross(end).try_normalize() else {
            return Some(drag.stash);
        };
        let angle = start.dot(end).clamp(-1.0, 1.0).acos();

        let d = self.pivot_distance;
        let rotation = Mat4::from_translation(Vec3::new(0.0, 0.0, -d))
            * Mat4::from_axis_angle(axis, angle)
            * Mat4::from_translation(Vec3::new(0.0, 0.0, d));
        Some(rotation * drag.stash)
    }

    /// Finish the drag, keeping whatever view the last `drag_to` produced.
    pub fn end(&mut self) {
        self.drag = None;
    }

    /// Drop the drag after losing pointer capture.
    pub fn cancel(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("Arc-ball drag cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn radius_leaves_a_margin() {
        let ball = ArcBall::new(800, 600);
        assert_eq!(ball.radius(), 295.0);
        assert_eq!(ball.centre(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn centre_projects_to_ball_front() {
        let ball = ArcBall::new(800, 600);
        let p = ball.project(Vec2::new(400.0, 300.0));
        assert!((p - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn projection_flips_y() {
        let ball = ArcBall::new(800, 600);
        assert!(ball.project(Vec2::new(400.0, 100.0)).y > 0.0);
        assert!(ball.project(Vec2::new(400.0, 500.0)).y < 0.0);
    }

    #[test]
    fn outside_points_land_on_equator() {
        let ball = ArcBall::new(800, 600);
        let p = ball.project(Vec2::new(799.0, 300.0));
        assert_eq!(p.z, 0.0);
        assert!((p.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_length_drag_returns_stash_exactly() {
        let mut ball = ArcBall::new(800, 600);
        let stash = view() * Mat4::from_rotation_x(0.3);
        ball.begin(Vec2::new(420.0, 280.0), stash);
        assert_eq!(ball.drag_to(Vec2::new(420.0, 280.0)), Some(stash));
    }

    #[test]
    fn antipodal_drag_falls_back_to_stash() {
        let mut ball = ArcBall::new(800, 600);
        let stash = view();
        // Both points outside the ball on opposite sides of the equator.
        ball.begin(Vec2::new(0.0, 300.0), stash);
        assert_eq!(ball.drag_to(Vec2::new(800.0, 300.0)), Some(stash));
    }

    #[test]
    fn drag_keeps_pivot_fixed() {
        let mut ball = ArcBall::new(800, 600);
        ball.begin(Vec2::new(400.0, 300.0), view());
        for pointer in [Vec2::new(500.0, 250.0), Vec2::new(150.0, 550.0), Vec2::new(10.0, 10.0)] {
            let rotated = ball.drag_to(pointer).unwrap();
            let pivot = rotated.transform_point3(Vec3::ZERO);
            assert!((pivot - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-4, "{pivot:?}");
        }
    }

    #[test]
    fn horizontal_drag_turns_about_y() {
        let mut ball = ArcBall::new(800, 600);
        ball.begin(Vec2::new(400.0, 300.0), view());
        let rotated = ball.drag_to(Vec2::new(500.0, 300.0)).unwrap();
        // Dragging right swings the globe's front toward +x in view space.
        let front = rotated.transform_point3(Vec3::Z);
        assert!(front.x > 0.0);
        assert!(front.y.abs() < 1e-5);
    }

    #[test]
    fn idle_drag_is_none_and_end_stops() {
        let mut ball = ArcBall::new(800, 600);
        assert_eq!(ball.drag_to(Vec2::new(1.0, 1.0)), None);
        ball.begin(Vec2::new(400.0, 300.0), view());
        assert!(ball.is_dragging());
        ball.end();
        assert!(!ball.is_dragging());
        ball.begin(Vec2::new(400.0, 300.0), view());
        ball.cancel();
        assert_eq!(ball.drag_to(Vec2::new(1.0, 1.0)), None);
    }
}
