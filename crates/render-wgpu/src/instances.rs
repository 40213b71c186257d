use glam::{Mat4, Vec3};
use orbitwalk_common::CameraPose;
use orbitwalk_kernel::Scene;
use orbitwalk_kernel::integrator::LOOK_AT;
use orbitwalk_render::Renderer;

/// What a drawn cube stands for. Picks its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    /// Marker at the point the camera orbits.
    Origin,
    /// Pillar fixed to the ground; shows the ground moving under the player.
    Landmark,
    /// Something attached to the camera.
    Attachment,
}

impl InstanceKind {
    pub fn color(self) -> [f32; 4] {
        match self {
            InstanceKind::Origin => [1.0, 0.8, 0.0, 1.0],
            InstanceKind::Landmark => [0.2, 0.6, 1.0, 1.0],
            InstanceKind::Attachment => [0.7, 0.7, 0.7, 1.0],
        }
    }
}

/// One unit cube placed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instance {
    pub model: Mat4,
    pub kind: InstanceKind,
}

impl Instance {
    pub fn world_position(&self) -> Vec3 {
        self.model.transform_point3(Vec3::ZERO)
    }
}

/// Lays out the cubes for a frame: the origin marker, ground landmarks and
/// camera attachments.
#[derive(Debug, Clone)]
pub struct SceneInstances {
    landmarks: Vec<Mat4>,
    attachment_shape: Mat4,
}

impl Default for SceneInstances {
    fn default() -> Self {
        Self::new(4, 20.0)
    }
}

impl SceneInstances {
    /// Landmarks on a `(2n+1)^2` lattice with `spacing` between pillars, in
    /// ground-local space. The lattice center is left empty.
    pub fn new(half_extent: i32, spacing: f32) -> Self {
        let mut landmarks = Vec::new();
        for i in -half_extent..=half_extent {
            for j in -half_extent..=half_extent {
                if i == 0 && j == 0 {
                    continue;
                }
                let base = Vec3::new(i as f32 * spacing, 2.0, j as f32 * spacing);
                landmarks.push(Mat4::from_scale_rotation_translation(
                    Vec3::new(1.0, 4.0, 1.0),
                    glam::Quat::IDENTITY,
                    base,
                ));
            }
        }
        Self {
            landmarks,
            // Long thin box, barrel along -Z.
            attachment_shape: Mat4::from_scale(Vec3::new(0.15, 0.2, 0.8)),
        }
    }

    pub fn landmark_count(&self) -> usize {
        self.landmarks.len()
    }
}

impl Renderer for SceneInstances {
    type Output = Vec<Instance>;

    fn render(&self, scene: &Scene, camera: &CameraPose) -> Vec<Instance> {
        let mut out = Vec::with_capacity(1 + self.landmarks.len() + scene.camera.children().len());
        out.push(Instance {
            model: Mat4::from_translation(LOOK_AT) * Mat4::from_scale(Vec3::splat(0.5)),
            kind: InstanceKind::Origin,
        });

        let ground = scene.ground.model_matrix();
        out.extend(self.landmarks.iter().map(|local| Instance {
            model: ground * *local,
            kind: InstanceKind::Landmark,
        }));

        let eye = camera.world_matrix();
        out.extend(scene.camera.children().values().map(|local| Instance {
            model: eye * local.matrix() * self.attachment_shape,
            kind: InstanceKind::Attachment,
        }));
        out
    }
}
