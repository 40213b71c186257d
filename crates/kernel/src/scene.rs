use glam::Vec3;
use orbitwalk_common::{CameraPose, GroundPose, RigConfig, Transform};
use std::collections::BTreeMap;

/// Name the weapon mount is attached under.
pub const WEAPON_NODE: &str = "weapon";

/// Errors raised while assembling the scene anchors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene anchor `{0}` was never initialized")]
    Missing(&'static str),
}

/// Camera node: its pose plus children that move with it.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraNode {
    pub pose: CameraPose,
    children: BTreeMap<String, Transform>,
}

impl CameraNode {
    pub fn new(pose: CameraPose) -> Self {
        Self {
            pose,
            children: BTreeMap::new(),
        }
    }

    /// Attach a child with a camera-local transform. A name is attached once;
    /// later attaches under the same name are ignored.
    pub fn attach(&mut self, name: impl Into<String>, local: Transform) -> bool {
        let name = name.into();
        if self.children.contains_key(&name) {
            return false;
        }
        tracing::debug!(node = %name, "attached to camera");
        self.children.insert(name, local);
        true
    }

    /// Camera-local transform of an attached child.
    pub fn child(&self, name: &str) -> Option<&Transform> {
        self.children.get(name)
    }

    pub fn children(&self) -> &BTreeMap<String, Transform> {
        &self.children
    }
}

/// The shared scene anchors: camera and ground.
///
/// Written by the integrator each frame, read by the renderer afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub camera: CameraNode,
    pub ground: GroundPose,
}

impl Scene {
    /// Standard rig scene: camera on the orbit looking at the origin, ground at
    /// its resting height, weapon attached to the camera.
    pub fn from_config(config: &RigConfig) -> Result<Self, SceneError> {
        Self::builder()
            .camera(CameraPose {
                position: Vec3::new(0.0, 0.0, config.orbit.radius),
                target: Vec3::ZERO,
            })
            .ground(GroundPose::at_height(config.ground.starting_y))
            .attach(WEAPON_NODE, config.weapon.transform())
            .build()
    }

    pub fn builder() -> SceneBuilder {
        SceneBuilder::default()
    }
}

/// Set-once assembly of the scene anchors.
///
/// Each setter ignores a second call, and [`SceneBuilder::build`] fails fast
/// if an anchor was never provided.
#[derive(Debug, Default)]
pub struct SceneBuilder {
    camera: Option<CameraPose>,
    ground: Option<GroundPose>,
    attachments: Vec<(String, Transform)>,
}

impl SceneBuilder {
    pub fn camera(mut self, pose: CameraPose) -> Self {
        if self.camera.is_none() {
            self.camera = Some(pose);
        }
        self
    }

    pub fn ground(mut self, pose: GroundPose) -> Self {
        if self.ground.is_none() {
            self.ground = Some(pose);
        }
        self
    }

    pub fn attach(mut self, name: impl Into<String>, local: Transform) -> Self {
        self.attachments.push((name.into(), local));
        self
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        let pose = self.camera.ok_or(SceneError::Missing("camera"))?;
        let ground = self.ground.ok_or(SceneError::Missing("ground"))?;
        let mut camera = CameraNode::new(pose);
        for (name, local) in self.attachments {
            camera.attach(name, local);
        }
        Ok(Scene { camera, ground })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_places_anchors() {
        let config = RigConfig::default();
        let scene = Scene::from_config(&config).unwrap();
        assert_eq!(scene.ground.position.y, -30.0);
        assert_eq!(scene.camera.pose.target, Vec3::ZERO);
        let weapon = scene.camera.child(WEAPON_NODE).unwrap();
        assert_eq!(weapon.position, Vec3::new(1.0, -1.2, -2.4));
    }

    #[test]
    fn build_fails_fast_without_camera() {
        let err = Scene::builder()
            .ground(GroundPose::at_height(-30.0))
            .build()
            .unwrap_err();
        assert_eq!(err, SceneError::Missing("camera"));
    }

    #[test]
    fn build_fails_fast_without_ground() {
        let err = Scene::builder()
            .camera(CameraPose::default())
            .build()
            .unwrap_err();
        assert_eq!(err, SceneError::Missing("ground"));
    }

    #[test]
    fn setters_keep_first_value() {
        let scene = Scene::builder()
            .ground(GroundPose::at_height(-30.0))
            .ground(GroundPose::at_height(5.0))
            .camera(CameraPose::default())
            .build()
            .unwrap();
        assert_eq!(scene.ground.position.y, -30.0);
    }

    #[test]
    fn attach_is_set_once() {
        let mut node = CameraNode::new(CameraPose::default());
        assert!(node.attach("weapon", Transform::default()));
        let moved = Transform {
            position: Vec3::ONE,
            ..Transform::default()
        };
        assert!(!node.attach("weapon", moved));
        assert_eq!(node.child("weapon").unwrap().position, Vec3::ZERO);
        assert_eq!(node.children().len(), 1);
    }
}
