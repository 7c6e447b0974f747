use serde::Deserialize;

use crate::camera::CameraPose;
use crate::handle_user_input::{Key, UserInputState};
use crate::render_system::bridge::{RendererBridge, Uniform, UniformValue};

pub const FOV_RANGE: (f32, f32) = (10.0, 160.0);
pub const MIN_SAMPLES: u32 = 1;
pub const MIN_GAMMA: f32 = -5.0;
pub const MAX_DEFOCUS_ANGLE: f32 = 10.0;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct RenderParameters {
    pub samples: u32,
    pub max_bounces: u32,
    pub gamma: f32,
    pub background_opacity: f32,
    pub defocus_angle: f32,
}

impl Default for RenderParameters {
    fn default() -> RenderParameters {
        RenderParameters {
            samples: 10,
            max_bounces: 3,
            gamma: 1.6,
            background_opacity: 1.0,
            defocus_angle: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tunable {
    FieldOfView,
    Samples,
    MaxBounces,
    Gamma,
    BackgroundOpacity,
    DefocusAngle,
}

// whether a key acts every frame it is held or once per press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Held,
    Pressed,
}

impl Tunable {
    pub const ALL: [Tunable; 6] = [
        Tunable::FieldOfView,
        Tunable::Samples,
        Tunable::MaxBounces,
        Tunable::Gamma,
        Tunable::BackgroundOpacity,
        Tunable::DefocusAngle,
    ];

    // (decrease, increase)
    pub fn keys(self) -> (Key, Key) {
        match self {
            Tunable::FieldOfView => (Key::Up, Key::Down),
            Tunable::Samples => (Key::Left, Key::Right),
            Tunable::MaxBounces => (Key::Z, Key::X),
            Tunable::Gamma => (Key::G, Key::H),
            Tunable::BackgroundOpacity => (Key::B, Key::N),
            Tunable::DefocusAngle => (Key::K, Key::L),
        }
    }

    // order the two keys are checked in within one frame; matters when both
    // are down at a bound
    pub fn order(self) -> [Direction; 2] {
        match self {
            Tunable::FieldOfView => [Direction::Increase, Direction::Decrease],
            _ => [Direction::Decrease, Direction::Increase],
        }
    }

    pub fn trigger(self) -> Trigger {
        match self {
            Tunable::FieldOfView | Tunable::Samples => Trigger::Held,
            _ => Trigger::Pressed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Decrease,
    Increase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adjustment {
    pub tunable: Tunable,
    pub direction: Direction,
}

impl Adjustment {
    pub fn new(tunable: Tunable, direction: Direction) -> Adjustment {
        Adjustment { tunable, direction }
    }
}

fn step_f32(value: f32, step: f32, direction: Direction, min: f32, max: f32) -> f32 {
    match direction {
        Direction::Decrease => (value - step).max(min),
        Direction::Increase => (value + step).min(max),
    }
}

fn step_u32(value: u32, direction: Direction, min: u32) -> u32 {
    match direction {
        Direction::Decrease => value.saturating_sub(1).max(min),
        Direction::Increase => value.saturating_add(1),
    }
}

pub fn adjust_fov(fov_y_degrees: f32, direction: Direction) -> f32 {
    step_f32(fov_y_degrees, 1.0, direction, FOV_RANGE.0, FOV_RANGE.1)
}

impl RenderParameters {
    /// Returns the parameters with one clamped step applied. Field of view
    /// lives on the camera pose and is left alone here.
    pub fn adjusted(self, adjustment: Adjustment) -> RenderParameters {
        let Adjustment { tunable, direction } = adjustment;
        match tunable {
            Tunable::FieldOfView => self,
            Tunable::Samples => RenderParameters {
                samples: step_u32(self.samples, direction, MIN_SAMPLES),
                ..self
            },
            Tunable::MaxBounces => RenderParameters {
                max_bounces: step_u32(self.max_bounces, direction, 0),
                ..self
            },
            Tunable::Gamma => RenderParameters {
                gamma: step_f32(self.gamma, 0.1, direction, MIN_GAMMA, f32::INFINITY),
                ..self
            },
            Tunable::BackgroundOpacity => RenderParameters {
                background_opacity: step_f32(self.background_opacity, 0.1, direction, 0.0, 1.0),
                ..self
            },
            Tunable::DefocusAngle => RenderParameters {
                defocus_angle: step_f32(
                    self.defocus_angle,
                    0.001,
                    direction,
                    0.0,
                    MAX_DEFOCUS_ANGLE,
                ),
                ..self
            },
        }
    }
}

/// The settings menu: render parameters plus whether the menu is open.
/// Adjustments only happen while it is open.
pub struct ParameterStore {
    params: RenderParameters,
    visible: bool,
}

impl ParameterStore {
    pub fn new(params: RenderParameters) -> ParameterStore {
        ParameterStore {
            params,
            visible: false,
        }
    }

    pub fn params(&self) -> RenderParameters {
        self.params
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    // the adjustments the current key state asks for
    pub fn pending_adjustments(&self, input: &UserInputState) -> Vec<Adjustment> {
        if !self.visible {
            return vec![];
        }
        let mut adjustments = vec![];
        for tunable in Tunable::ALL {
            let active = |key| match tunable.trigger() {
                Trigger::Held => input.held(key),
                Trigger::Pressed => input.pressed(key),
            };
            let (decrease, increase) = tunable.keys();
            for direction in tunable.order() {
                let key = match direction {
                    Direction::Decrease => decrease,
                    Direction::Increase => increase,
                };
                if active(key) {
                    adjustments.push(Adjustment::new(tunable, direction));
                }
            }
        }
        adjustments
    }

    pub fn apply(&mut self, adjustment: Adjustment, pose: CameraPose) -> CameraPose {
        match adjustment.tunable {
            Tunable::FieldOfView => {
                pose.with_fov(adjust_fov(pose.fov_y_degrees, adjustment.direction))
            }
            _ => {
                self.params = self.params.adjusted(adjustment);
                pose
            }
        }
    }

    /// Applies one frame of menu input. Takes the camera pose because the
    /// menu also owns the field of view control; returns the adjusted pose.
    pub fn update(&mut self, input: &UserInputState, pose: CameraPose) -> CameraPose {
        self.pending_adjustments(input)
            .into_iter()
            .fold(pose, |pose, adjustment| self.apply(adjustment, pose))
    }

    pub fn publish(&self, bridge: &mut dyn RendererBridge) {
        let p = &self.params;
        bridge.set_uniform(Uniform::Samples, UniformValue::count(p.samples));
        bridge.set_uniform(Uniform::MaxBounces, UniformValue::count(p.max_bounces));
        bridge.set_uniform(Uniform::Gamma, UniformValue::Float(p.gamma));
        bridge.set_uniform(
            Uniform::BackgroundOpacity,
            UniformValue::Float(p.background_opacity),
        );
        bridge.set_uniform(Uniform::DefocusAngle, UniformValue::Float(p.defocus_angle));
    }
}
