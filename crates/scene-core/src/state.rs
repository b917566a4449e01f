//! Visual-side state types shared with the web frontend.
//!
//! These types intentionally avoid referencing platform-specific APIs
//! so the frame math stays testable on the host.

use crate::constants::{CAMERA_EYE, CAMERA_FOVY_DEG, CAMERA_TARGET};
use glam::{Mat4, Vec3};

/// Simple right-handed camera description with perspective projection.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Default scene camera, looking down at the tree from the front.
    pub fn scene_default(aspect: f32) -> Self {
        Self {
            eye: Vec3::from(CAMERA_EYE),
            target: Vec3::from(CAMERA_TARGET),
            up: Vec3::Y,
            aspect,
            fovy_radians: CAMERA_FOVY_DEG.to_radians(),
            znear: 0.1,
            zfar: 200.0,
        }
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_matrix_places_eye_at_origin() {
        let cam = Camera::scene_default(16.0 / 9.0);
        let v = cam.view_matrix();
        let eye_in_view = v.transform_point3(cam.eye);
        assert!(eye_in_view.length() < 1e-5);
    }
}
