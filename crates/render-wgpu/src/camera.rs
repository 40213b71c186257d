use glam::Mat4;
use orbitwalk_common::CameraPose;

/// Perspective lens the rig camera looks through.
///
/// Placement comes from the [`CameraPose`] the integrator writes; the lens
/// only holds projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov: 75.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Lens {
    /// Track the surface size. Zero-sized surfaces (minimized windows) keep
    /// the previous aspect.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self, pose: &CameraPose) -> Mat4 {
        self.projection_matrix() * pose.view_matrix()
    }
}
