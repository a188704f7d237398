use glam::Vec2;

/// Player view-point in world space.
///
/// * Only **yaw** is simulated on the XY plane; looking up/down is
///   y-shearing (`pitch`, in screen rows), not a true rotation.
/// * `eye` is the absolute eye elevation in world-Z units.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub eye: f32,
    pub yaw: f32,   // radians (0 = east, counter-clockwise)
    pub pitch: f32, // screen rows of vertical shear
    pub fov: f32,   // horizontal FoV (radians, typical 60–90°)
}

impl Camera {
    pub fn new(pos: Vec2, eye: f32, yaw: f32, fov: f32) -> Self {
        Self {
            pos,
            eye,
            yaw,
            pitch: 0.0,
            fov,
        }
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        let (s, c) = self.yaw.sin_cos();
        Vec2::new(c, s) // 0 rad = +X (east), CCW positive
    }

    /// Unit vector pointing to the camera's right on the X-Y plane.
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        self.forward().perp()
    }

    /*───────────────── projection / frustum helpers ─────────────────*/

    /// Focal length in pixels for a viewport `w` pixels wide.
    ///
    /// ```text
    /// focal = w / (2 * tan(fov/2))
    /// ```
    #[inline]
    pub fn focal(self, w: usize) -> f32 {
        (w as f32) * 0.5 / (self.fov * 0.5).tan()
    }

    /// World-space angle of the ray through screen column `col`.
    ///
    /// Columns fan out by arctangent so straight walls stay straight
    /// after the per-column fish-eye correction.
    #[inline]
    pub fn column_angle(self, col: usize, w: usize) -> f32 {
        ((col as f32 + 0.5 - w as f32 * 0.5) / self.focal(w)).atan() + self.yaw
    }

    /// Rotate around the Z-axis (positive = turn left).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec2::ZERO, 5.0, 0.3, 1.57);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((f.dot(r)).abs() < 1e-5);
    }

    #[test]
    fn focal_at_90_deg() {
        let cam = Camera::new(Vec2::ZERO, 5.0, 0.0, FRAC_PI_2);
        assert!((cam.focal(640) - 320.0).abs() < 1e-3);
    }

    #[test]
    fn column_angles_span_the_fov() {
        let cam = Camera::new(Vec2::new(2.0, 2.0), 5.0, 0.0, FRAC_PI_2);
        let left = cam.column_angle(0, 640);
        let right = cam.column_angle(639, 640);
        assert!(left < 0.0 && right > 0.0);
        assert!((right - left) < cam.fov);
        assert!((right - left) > cam.fov * 0.95);
    }
}
