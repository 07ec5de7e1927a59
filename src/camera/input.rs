//! Keyboard state: held movement keys and discrete commands.
//!
//! Key events arrive before the frame's update and only flip flags here;
//! the controller reads the flags once per tick.

use winit::keyboard::KeyCode;

/// Keys the world reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Space,
    C,
    F,
    Equal,
    Digit1,
    Escape,
}

impl Key {
    /// Map a physical key code, ignoring keys without a binding
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::KeyW => Self::W,
            KeyCode::KeyA => Self::A,
            KeyCode::KeyS => Self::S,
            KeyCode::KeyD => Self::D,
            KeyCode::ArrowUp => Self::Up,
            KeyCode::ArrowDown => Self::Down,
            KeyCode::Space => Self::Space,
            KeyCode::KeyC => Self::C,
            KeyCode::KeyF => Self::F,
            KeyCode::Equal => Self::Equal,
            KeyCode::Digit1 => Self::Digit1,
            KeyCode::Escape => Self::Escape,
            _ => return None,
        };
        Some(key)
    }
}

/// Key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Repeat,
    Release,
}

/// Modifier keys held during a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !(self.control || self.shift || self.alt)
    }
}

/// Discrete actions triggered by a key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleGravity,
    ToggleCameraMode,
    SkipTime,
    ToggleRain,
    Jump,
}

/// Movement keys currently held down
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Input flags accumulated between frames
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HeldKeys,
}

impl InputState {
    /// Apply one key transition
    ///
    /// Movement keys update the held set; everything else may yield a command.
    pub fn handle_key(&mut self, key: Key, action: KeyAction, mods: Modifiers) -> Option<Command> {
        match (key, action) {
            (Key::Escape, KeyAction::Press) => return Some(Command::Quit),
            (Key::F, KeyAction::Release) if mods.control => return Some(Command::ToggleGravity),
            (Key::C, KeyAction::Press | KeyAction::Repeat) => {
                return Some(Command::ToggleCameraMode)
            }
            (Key::Equal, KeyAction::Release) => return Some(Command::SkipTime),
            (Key::Digit1, KeyAction::Release) => return Some(Command::ToggleRain),
            _ => {}
        }

        if !mods.is_empty() {
            return None;
        }

        if key == Key::Space && action == KeyAction::Press {
            return Some(Command::Jump);
        }

        let held = match key {
            Key::W => &mut self.held.forward,
            Key::S => &mut self.held.back,
            Key::A => &mut self.held.left,
            Key::D => &mut self.held.right,
            Key::Up => &mut self.held.up,
            Key::Down => &mut self.held.down,
            _ => return None,
        };
        match action {
            KeyAction::Press => *held = true,
            KeyAction::Release => *held = false,
            KeyAction::Repeat => {}
        }
        None
    }

    /// Drop every held key (focus loss)
    pub fn release_all(&mut self) {
        self.held = HeldKeys::default();
    }

    pub fn held(&self) -> &HeldKeys {
        &self.held
    }
}
