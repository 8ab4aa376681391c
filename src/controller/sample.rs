//! Controller snapshots in the standard gamepad layout
//!
//! Every source projects its devices onto the same ordered button and axis
//! lists so the decoder only ever deals with indices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard button indices
pub mod buttons {
    pub const SOUTH: usize = 0;
    pub const EAST: usize = 1;
    pub const WEST: usize = 2;
    pub const NORTH: usize = 3;
    pub const LEFT_BUMPER: usize = 4;
    pub const RIGHT_BUMPER: usize = 5;
    pub const LEFT_TRIGGER: usize = 6;
    pub const RIGHT_TRIGGER: usize = 7;
    pub const SELECT: usize = 8;
    pub const START: usize = 9;
    pub const LEFT_STICK: usize = 10;
    pub const RIGHT_STICK: usize = 11;
    pub const DPAD_UP: usize = 12;
    pub const DPAD_DOWN: usize = 13;
    pub const DPAD_LEFT: usize = 14;
    pub const DPAD_RIGHT: usize = 15;
    pub const GUIDE: usize = 16;

    pub const COUNT: usize = 17;

    pub const CONFIRM: usize = SOUTH;
    pub const CANCEL: usize = EAST;
}

/// Standard axis indices, negative values point left/up
pub mod axes {
    pub const LEFT_STICK_X: usize = 0;
    pub const LEFT_STICK_Y: usize = 1;
    pub const RIGHT_STICK_X: usize = 2;
    pub const RIGHT_STICK_Y: usize = 3;

    pub const COUNT: usize = 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControllerId(pub usize);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pad#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    pub pressed: bool,
}

/// One controller, one tick
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadSample {
    pub controller: ControllerId,
    pub buttons: Vec<ButtonState>,
    pub axes: Vec<f32>,
}

impl GamepadSample {
    /// A sample with every button released and every axis centered
    pub fn neutral(controller: ControllerId) -> Self {
        Self {
            controller,
            buttons: vec![ButtonState::default(); buttons::COUNT],
            axes: vec![0.0; axes::COUNT],
        }
    }

    pub fn with_axis(mut self, index: usize, value: f32) -> Self {
        if index >= self.axes.len() {
            self.axes.resize(index + 1, 0.0);
        }
        self.axes[index] = value.clamp(-1.0, 1.0);
        self
    }

    pub fn with_button(mut self, index: usize) -> Self {
        if index >= self.buttons.len() {
            self.buttons.resize(index + 1, ButtonState::default());
        }
        self.buttons[index].pressed = true;
        self
    }

    /// Missing buttons read as released
    pub fn is_pressed(&self, index: usize) -> bool {
        self.buttons.get(index).is_some_and(|b| b.pressed)
    }

    /// Missing axes read as centered
    pub fn axis(&self, index: usize) -> f32 {
        self.axes.get(index).copied().unwrap_or(0.0)
    }

    pub fn any_pressed(&self) -> bool {
        self.buttons.iter().any(|b| b.pressed)
    }
}
