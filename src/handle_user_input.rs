use nalgebra::Vector2;
use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    // camera movement
    W,
    A,
    S,
    D,
    Q,
    E,
    // field of view and sample count
    Up,
    Down,
    Left,
    Right,
    // discrete settings
    Z,
    X,
    G,
    H,
    B,
    N,
    K,
    L,
    // menu visibility
    P,
}

impl Key {
    pub fn from_code(code: KeyCode) -> Option<Key> {
        match code {
            KeyCode::KeyW => Some(Key::W),
            KeyCode::KeyA => Some(Key::A),
            KeyCode::KeyS => Some(Key::S),
            KeyCode::KeyD => Some(Key::D),
            KeyCode::KeyQ => Some(Key::Q),
            KeyCode::KeyE => Some(Key::E),
            KeyCode::ArrowUp => Some(Key::Up),
            KeyCode::ArrowDown => Some(Key::Down),
            KeyCode::ArrowLeft => Some(Key::Left),
            KeyCode::ArrowRight => Some(Key::Right),
            KeyCode::KeyZ => Some(Key::Z),
            KeyCode::KeyX => Some(Key::X),
            KeyCode::KeyG => Some(Key::G),
            KeyCode::KeyH => Some(Key::H),
            KeyCode::KeyB => Some(Key::B),
            KeyCode::KeyN => Some(Key::N),
            KeyCode::KeyK => Some(Key::K),
            KeyCode::KeyL => Some(Key::L),
            KeyCode::KeyP => Some(Key::P),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InputEvent {
    Key { key: Key, pressed: bool },
    // raw pointer motion in pixels
    PointerMotion(Vector2<f32>),
}

impl InputEvent {
    pub fn from_window_event(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(kc),
                        state,
                        ..
                    },
                ..
            } => Key::from_code(*kc).map(|key| InputEvent::Key {
                key,
                pressed: *state == ElementState::Pressed,
            }),
            _ => None,
        }
    }

    pub fn from_device_event(event: &DeviceEvent) -> Option<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta: (dx, dy) } => Some(InputEvent::PointerMotion(
                Vector2::new(*dx as f32, *dy as f32),
            )),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct KeyboardState {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
    pub q: bool,
    pub e: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub z: bool,
    pub x: bool,
    pub g: bool,
    pub h: bool,
    pub b: bool,
    pub n: bool,
    pub k: bool,
    pub l: bool,
    pub p: bool,
}

impl KeyboardState {
    fn slot(&mut self, key: Key) -> &mut bool {
        match key {
            Key::W => &mut self.w,
            Key::A => &mut self.a,
            Key::S => &mut self.s,
            Key::D => &mut self.d,
            Key::Q => &mut self.q,
            Key::E => &mut self.e,
            Key::Up => &mut self.up,
            Key::Down => &mut self.down,
            Key::Left => &mut self.left,
            Key::Right => &mut self.right,
            Key::Z => &mut self.z,
            Key::X => &mut self.x,
            Key::G => &mut self.g,
            Key::H => &mut self.h,
            Key::B => &mut self.b,
            Key::N => &mut self.n,
            Key::K => &mut self.k,
            Key::L => &mut self.l,
            Key::P => &mut self.p,
        }
    }

    pub fn get(&self, key: Key) -> bool {
        match key {
            Key::W => self.w,
            Key::A => self.a,
            Key::S => self.s,
            Key::D => self.d,
            Key::Q => self.q,
            Key::E => self.e,
            Key::Up => self.up,
            Key::Down => self.down,
            Key::Left => self.left,
            Key::Right => self.right,
            Key::Z => self.z,
            Key::X => self.x,
            Key::G => self.g,
            Key::H => self.h,
            Key::B => self.b,
            Key::N => self.n,
            Key::K => self.k,
            Key::L => self.l,
            Key::P => self.p,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserInputState {
    pub current: KeyboardState,
    pub previous: KeyboardState,
    // keys that went down at some point during the last batch, even if they
    // were released again before it ended
    pub went_down: KeyboardState,
    // pointer motion accumulated over the last batch of events
    pub pointer_delta: Vector2<f32>,
}

impl UserInputState {
    pub fn new() -> UserInputState {
        Default::default()
    }

    // key is down this frame
    pub fn held(&self, key: Key) -> bool {
        self.current.get(key)
    }

    // key went down since the previous frame
    pub fn pressed(&self, key: Key) -> bool {
        self.went_down.get(key)
    }

    /// Starts a new frame from the events received since the last one.
    pub fn handle_input(&mut self, input: &[InputEvent]) {
        self.previous = self.current.clone();
        self.went_down = KeyboardState::default();
        self.pointer_delta = Vector2::zeros();
        for event in input {
            match *event {
                InputEvent::Key { key, pressed } => {
                    let slot = self.current.slot(key);
                    // os key repeat sends more presses while the key is down
                    if pressed && !*slot {
                        *self.went_down.slot(key) = true;
                    }
                    *slot = pressed;
                }
                InputEvent::PointerMotion(delta) => self.pointer_delta += delta,
            }
        }
    }
}
