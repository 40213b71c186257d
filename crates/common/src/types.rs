use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Local transform of a scene node: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Camera position and the point it is oriented toward.
///
/// The rig always looks at the world origin; `target` is kept explicit so a
/// renderer can build the view without knowing that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::ZERO,
        }
    }
}

impl CameraPose {
    /// Orient the camera toward `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Unit vector from the eye toward the target (zero if they coincide).
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Camera-to-world transform; children attached to the camera are placed with it.
    pub fn world_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }
}

/// Ground plane position. Its rotation (horizontal) is fixed at setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPose {
    pub position: Vec3,
}

impl GroundPose {
    pub fn at_height(y: f32) -> Self {
        Self {
            position: Vec3::new(0.0, y, 0.0),
        }
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn camera_looks_toward_target() {
        let mut cam = CameraPose {
            position: Vec3::new(0.0, 0.0, 10.0),
            target: Vec3::X,
        };
        cam.look_at(Vec3::ZERO);
        assert_eq!(cam.target, Vec3::ZERO);
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn camera_world_matrix_places_eye() {
        let cam = CameraPose {
            position: Vec3::new(3.0, 4.0, 5.0),
            target: Vec3::ZERO,
        };
        let eye = cam.world_matrix().transform_point3(Vec3::ZERO);
        assert!((eye - cam.position).length() < 1e-4);
    }

    #[test]
    fn ground_at_height() {
        let g = GroundPose::at_height(-30.0);
        assert_eq!(g.position, Vec3::new(0.0, -30.0, 0.0));
        assert_eq!(
            g.model_matrix().transform_point3(Vec3::ZERO),
            Vec3::new(0.0, -30.0, 0.0)
        );
    }
}
