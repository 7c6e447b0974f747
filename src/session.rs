use std::sync::mpsc::Sender;

use log::info;
use thiserror::Error;
use winit::event::{DeviceEvent, WindowEvent};

use crate::camera::Camera;
use crate::config::Config;
use crate::handle_user_input::{InputEvent, Key, UserInputState};
use crate::parameters::ParameterStore;
use crate::render_system::accumulate::{
    AccumulateError, CancelToken, ProgressiveAccumulator, RenderOutcome,
};
use crate::render_system::bridge::{BridgeError, Progress, RendererBridge};
use crate::render_system::scene::upload_scene;
use crate::world::Scene;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("high-quality render failed: {0}")]
    Accumulate(#[from] AccumulateError),
}

/// Owns everything the interactive loop touches. Nothing else holds on to
/// the camera or the settings between frames.
pub struct Session<B: RendererBridge> {
    config: Config,
    bridge: B,
    scene: Scene,
    camera: Camera,
    parameters: ParameterStore,
    input: UserInputState,
    events_since_last_step: Vec<InputEvent>,
}

impl<B: RendererBridge> Session<B> {
    /// Uploads the scene once; it stays on the renderer for the session.
    pub fn new(config: Config, scene: Scene, mut bridge: B) -> Result<Session<B>, BridgeError> {
        upload_scene(&scene, &mut bridge)?;

        let mut camera = Camera::new(config.extent, config.fov_y_degrees);
        camera.move_speed = config.move_speed;
        camera.rotation_speed = config.rotation_speed;

        Ok(Session {
            parameters: ParameterStore::new(config.parameters),
            config,
            bridge,
            scene,
            camera,
            input: UserInputState::new(),
            events_since_last_step: vec![],
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.parameters
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn push_input(&mut self, event: InputEvent) {
        self.events_since_last_step.push(event);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        if let Some(event) = InputEvent::from_window_event(event) {
            self.push_input(event);
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let Some(event) = InputEvent::from_device_event(event) {
            self.push_input(event);
        }
    }

    /// One interactive frame. Returns the outcome of a still render if one
    /// was triggered this frame.
    pub fn step(&mut self, dt: f32) -> Result<Option<RenderOutcome>, SessionError> {
        self.input.handle_input(&self.events_since_last_step);
        self.events_since_last_step.clear();

        if self.input.pressed(Key::P) {
            self.parameters.toggle_visibility();
        }

        let pose = self.parameters.update(&self.input, self.camera.pose());
        self.camera.set_pose(pose);

        let mut still = None;
        if !self.parameters.is_visible() {
            self.camera.handle_input(&self.input, dt);
            if self.input.pressed(Key::H) {
                still = Some(self.render_high_quality(None, None)?);
            }
        }

        let extent = self.config.extent;
        self.camera.update(extent);
        self.camera.publish(&mut self.bridge);
        self.parameters.publish(&mut self.bridge);
        self.bridge.draw_frame(extent)?;

        Ok(still)
    }

    /// Blocks until the still render finishes or `cancel` is set.
    pub fn render_high_quality(
        &mut self,
        cancel: Option<CancelToken>,
        progress: Option<Sender<Progress>>,
    ) -> Result<RenderOutcome, AccumulateError> {
        let hq = &self.config.high_quality;
        let mut accumulator = ProgressiveAccumulator::new(self.config.extent, hq.composite);
        if let Some(token) = cancel {
            accumulator = accumulator.with_cancel_token(token);
        }
        if let Some(sender) = progress {
            accumulator = accumulator.with_progress(sender);
        }

        let outcome = accumulator.render_high_quality(
            &mut self.bridge,
            &self.parameters.params(),
            hq.total_samples,
            hq.samples_per_pass,
            &hq.output,
        )?;
        info!("high-quality render finished: {:?}", outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use nalgebra::Vector2;

    use super::*;
    use crate::config::HighQualityConfig;
    use crate::render_system::bridge::{RecordingBridge, Uniform, UniformValue};

    fn session(output: PathBuf) -> Session<RecordingBridge> {
        let config = Config {
            extent: [16, 9],
            high_quality: HighQualityConfig {
                total_samples: 30,
                samples_per_pass: 10,
                output,
                ..Default::default()
            },
            ..Default::default()
        };
        Session::new(config, Scene::default(), RecordingBridge::new()).unwrap()
    }

    fn key(key: Key, pressed: bool) -> InputEvent {
        InputEvent::Key { key, pressed }
    }

    #[test]
    fn new_session_uploads_scene() {
        let s = session(PathBuf::from("unused.png"));
        assert_eq!(
            s.bridge().uniform(Uniform::SpheresAmount),
            Some(&UniformValue::Int(0))
        );
        assert!(s.bridge().uniform(Uniform::MaterialType).is_some());
    }

    #[test]
    fn step_publishes_frame_uniforms() {
        let mut s = session(PathBuf::from("unused.png"));
        assert_eq!(s.step(1.0 / 60.0).unwrap(), None);
        let bridge = s.bridge();
        assert_eq!(bridge.frames_drawn, 1);
        for uniform in [
            Uniform::Pixel00,
            Uniform::PixelU,
            Uniform::PixelV,
            Uniform::CameraCenter,
            Uniform::Samples,
            Uniform::MaxBounces,
            Uniform::Gamma,
            Uniform::BackgroundOpacity,
            Uniform::DefocusAngle,
        ] {
            assert!(bridge.uniform(uniform).is_some(), "{uniform} not published");
        }
    }

    #[test]
    fn menu_open_blocks_camera_motion() {
        let mut s = session(PathBuf::from("unused.png"));
        let start = s.camera().pose();

        s.push_input(key(Key::P, true));
        s.push_input(key(Key::W, true));
        s.step(0.1).unwrap();
        assert!(s.parameters().is_visible());
        assert_eq!(s.camera().pose().position, start.position);

        // close the menu again, W still held
        s.push_input(key(Key::P, false));
        s.step(0.1).unwrap();
        s.push_input(key(Key::P, true));
        s.step(0.1).unwrap();
        assert!(!s.parameters().is_visible());
        assert!(s.camera().pose().position.z < start.position.z);
    }

    #[test]
    fn menu_adjusts_fov_through_the_camera_pose() {
        let mut s = session(PathBuf::from("unused.png"));
        let fov = s.camera().pose().fov_y_degrees;
        s.push_input(key(Key::P, true));
        s.push_input(key(Key::Down, true));
        s.step(0.1).unwrap();
        s.step(0.1).unwrap();
        assert_eq!(s.camera().pose().fov_y_degrees, fov + 2.0);
    }

    #[test]
    fn pointer_motion_turns_camera() {
        let mut s = session(PathBuf::from("unused.png"));
        let before = s.camera().pose().forward();
        s.push_input(InputEvent::PointerMotion(Vector2::new(40.0, 0.0)));
        s.step(0.1).unwrap();
        let after = s.camera().pose().forward();
        assert!(after.x > before.x);
    }

    #[test]
    fn h_with_menu_closed_renders_a_still() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("render.png");
        let mut s = session(output.clone());

        s.push_input(key(Key::H, true));
        let outcome = s.step(0.1).unwrap();

        assert_eq!(outcome, Some(RenderOutcome::Completed { passes: 3 }));
        assert!(output.exists());
        assert_eq!(s.bridge().offscreen_renders, 3);
        assert_eq!(
            s.bridge().uniform(Uniform::Samples),
            Some(&UniformValue::Int(10))
        );
    }

    #[test]
    fn h_tapped_between_frames_still_renders() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("tap.png");
        let mut s = session(output.clone());

        s.push_input(key(Key::H, true));
        s.push_input(key(Key::H, false));
        let outcome = s.step(0.1).unwrap();

        assert_eq!(outcome, Some(RenderOutcome::Completed { passes: 3 }));
        assert!(output.exists());
    }

    #[test]
    fn h_with_menu_open_raises_gamma() {
        let mut s = session(PathBuf::from("unused.png"));
        s.push_input(key(Key::P, true));
        s.step(0.1).unwrap();
        s.push_input(key(Key::H, true));
        assert_eq!(s.step(0.1).unwrap(), None);
        assert!((s.parameters().params().gamma - 1.7).abs() < 1e-5);
        assert_eq!(s.bridge().offscreen_renders, 0);
    }
}
