use crate::{Mat4, Vec3};

/// Perspective camera aimed at a model centered on the origin
/// (right-handed, depth mapped to [0, 1]).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    pub const FOV_Y_DEG: f32 = 45.0;

    /// Eye on +Z, far enough back that a sphere of `radius` around the
    /// origin exactly fills the vertical field of view.
    pub fn framing(radius: f32) -> Self {
        let radius = radius.abs().max(1e-3);
        let fov_y_rad = Self::FOV_Y_DEG.to_radians();
        let distance = radius / (fov_y_rad * 0.5).sin();
        Self {
            eye: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_rad,
            // Room for layers scaled well past the framed size.
            z_near: distance / 40.0,
            z_far: distance * 25.0,
            aspect: 16.0 / 9.0,
        }
    }

    /// Aspect from a viewport in pixels; a zero height counts as one row.
    pub fn for_viewport(mut self, width: u32, height: u32) -> Self {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    #[inline]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }

    /// `projection * view`, ready to be multiplied by a world matrix.
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

impl Default for Camera {
    /// Frames the bounding sphere of a model normalized to a 2-unit box.
    fn default() -> Self {
        Self::framing(3f32.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec4;

    fn ndc(cam: &Camera, p: Vec3) -> Vec3 {
        let clip = cam.view_projection() * p.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn framed_sphere_touches_top_and_bottom() {
        let cam = Camera::framing(1.0).for_viewport(800, 800);
        // The tangent point sits where the view ray grazes the sphere.
        let half = cam.fov_y_rad * 0.5;
        let tangent = Vec3::new(0.0, half.cos(), half.sin());
        let top = ndc(&cam, tangent);
        assert!((top.y - 1.0).abs() < 1e-4, "top at {top:?}");
        let bottom = ndc(&cam, tangent * Vec3::new(1.0, -1.0, 1.0));
        assert!((bottom.y + 1.0).abs() < 1e-4, "bottom at {bottom:?}");
    }

    #[test]
    fn framed_model_lies_between_clip_planes() {
        let cam = Camera::default();
        for corner in [Vec3::ONE, -Vec3::ONE, Vec3::new(1.0, -1.0, 1.0) * 2.0] {
            let z = ndc(&cam, corner).z;
            assert!((0.0..=1.0).contains(&z), "{corner:?} -> {z}");
        }
    }

    #[test]
    fn zero_height_viewport_keeps_a_finite_projection() {
        let cam = Camera::default().for_viewport(640, 0);
        assert_eq!(cam.aspect, 640.0);
        let m = cam.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(m.to_array().iter().all(|f| f.is_finite()));
    }
}
