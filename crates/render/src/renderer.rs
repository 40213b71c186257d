use orbitwalk_common::CameraPose;
use orbitwalk_kernel::Scene;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and the camera to draw it through, then
/// produces output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `camera`.
    fn render(&self, scene: &Scene, camera: &CameraPose) -> Self::Output;
}

/// Text renderer: a human-readable dump of the scene anchors.
///
/// Used by the CLI trace output and by tests of the render hook.
#[derive(Debug)]
pub struct DebugTextRenderer {
    precision: usize,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugTextRenderer {
    /// Two decimal places.
    pub fn new() -> Self {
        Self { precision: 2 }
    }

    /// Custom number of decimal places.

    pub fn with_precision(precision: usize) -> Self {
        Self { precision }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &Scene, camera: &CameraPose) -> String {
        let p = self.precision;
        let e = camera.position;
        let t = camera.target;
        let g = scene.ground.position;
        let mut out = format!(
            "camera eye=({:.p$}, {:.p$}, {:.p$}) target=({:.p$}, {:.p$}, {:.p$})\n",
            e.x, e.y, e.z, t.x, t.y, t.z
        );
        out.push_str(&format!(
            "ground pos=({:.p$}, {:.p$}, {:.p$})\n",
            g.x, g.y, g.z
        ));
        for (name, local) in scene.camera.children() {
            let world = camera.world_matrix() * local.matrix();
            let w = world.transform_point3(glam::Vec3::ZERO);
            out.push_str(&format!(
                "  [{name}] attached at ({:.p$}, {:.p$}, {:.p$})\n",
                w.x, w.y, w.z
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitwalk_common::RigConfig;

    #[test]
    fn renders_camera_and_ground() {
        let scene = Scene::from_config(&RigConfig::default()).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &scene.camera.pose);
        assert!(output.contains("camera eye=(0.00, 0.00, 10.00)"));
        assert!(output.contains("target=(0.00, 0.00, 0.00)"));
        assert!(output.contains("ground pos=(0.00, -30.00, 0.00)"));
    }

    #[test]
    fn lists_camera_attachments() {
        let scene = Scene::from_config(&RigConfig::default()).unwrap();
        let output = DebugTextRenderer::new().render(&scene, &scene.camera.pose);
        assert!(output.contains("[weapon] attached at"));
    }

    #[test]
    fn default_matches_new() {
        let scene = Scene::from_config(&RigConfig::default()).unwrap();
        let pose = &scene.camera.pose;
        assert_eq!(
            DebugTextRenderer::default().render(&scene, pose),
            DebugTextRenderer::new().render(&scene, pose)
        );
    }

    #[test]
    fn precision_is_configurable() {
        let scene = Scene::from_config(&RigConfig::default()).unwrap();
        let output = DebugTextRenderer::with_precision(0).render(&scene, &scene.camera.pose);
        assert!(output.contains("ground pos=(0, -30, 0)"));
    }
}
