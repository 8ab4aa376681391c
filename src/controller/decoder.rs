//! Sample decoding into navigation intents
//!
//! Pure functions only. The decoder never looks at time; repetition is the
//! throttle's business.

use crate::config::DecoderSettings;
use crate::controller::sample::{axes, buttons, GamepadSample};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Confirm,
    Cancel,
}

/// Intents extracted from one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedIntents {
    pub direction: Option<Direction>,
    pub action: Option<Action>,
}

impl DecodedIntents {
    pub fn is_empty(&self) -> bool {
        self.direction.is_none() && self.action.is_none()
    }
}

// D-pad checked in this order when several are held
const DPAD: [(usize, Direction); 4] = [
    (buttons::DPAD_UP, Direction::Up),
    (buttons::DPAD_DOWN, Direction::Down),
    (buttons::DPAD_LEFT, Direction::Left),
    (buttons::DPAD_RIGHT, Direction::Right),
];

pub fn decode(sample: &GamepadSample, settings: &DecoderSettings) -> DecodedIntents {
    DecodedIntents {
        direction: decode_direction(sample, settings.navigation_deadzone),
        action: decode_action(sample),
    }
}

/// Digital input wins over the stick
pub fn decode_direction(sample: &GamepadSample, deadzone: f32) -> Option<Direction> {
    if let Some((_, direction)) = DPAD.iter().find(|(index, _)| sample.is_pressed(*index)) {
        return Some(*direction);
    }

    let x = sample.axis(axes::LEFT_STICK_X);
    let y = sample.axis(axes::LEFT_STICK_Y);

    let horizontal = if x < -deadzone {
        Some(Direction::Left)
    } else if x > deadzone {
        Some(Direction::Right)
    } else {
        None
    };
    let vertical = if y < -deadzone {
        Some(Direction::Up)
    } else if y > deadzone {
        Some(Direction::Down)
    } else {
        None
    };

    match (horizontal, vertical) {
        (Some(h), Some(v)) => {
            if x.abs() > y.abs() {
                Some(h)
            } else {
                Some(v)
            }
        }
        (h, v) => v.or(h),
    }
}

/// Confirm takes precedence when both action buttons are down
pub fn decode_action(sample: &GamepadSample) -> Option<Action> {
    if sample.is_pressed(buttons::CONFIRM) {
        Some(Action::Confirm)
    } else if sample.is_pressed(buttons::CANCEL) {
        Some(Action::Cancel)
    } else {
        None
    }
}

/// Whether the controller is being touched at all
///
/// Uses the permissive activity threshold, so drift below the navigation
/// deadzone still counts. `hysteresis` widens the analog threshold and is
/// passed as zero once the mode is already directional.
pub fn has_activity(sample: &GamepadSample, activity_deadzone: f32, hysteresis: f32) -> bool {
    let threshold = activity_deadzone + hysteresis;
    sample.any_pressed() || sample.axes.iter().any(|value| value.abs() > threshold)
}
