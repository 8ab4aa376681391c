//! Controller sources
//!
//! A source is polled once per frame and returns one sample per connected
//! device. Devices that disappear are simply missing from the next poll.

use crate::controller::sample::{axes, buttons, ButtonState, ControllerId, GamepadSample};
use gilrs::{Axis, Button, Event, EventType, Gamepad, Gilrs};
use tracing::{debug, error, info, warn};

pub trait ControllerSource: Send + 'static {
    fn poll(&mut self) -> Vec<GamepadSample>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to initialize gamepad backend: {0}")]
    InitializationError(String),
}

// Standard layout order, see `sample::buttons`
const BUTTON_LAYOUT: [(usize, Button); buttons::COUNT] = [
    (buttons::SOUTH, Button::South),
    (buttons::EAST, Button::East),
    (buttons::WEST, Button::West),
    (buttons::NORTH, Button::North),
    (buttons::LEFT_BUMPER, Button::LeftTrigger),
    (buttons::RIGHT_BUMPER, Button::RightTrigger),
    (buttons::LEFT_TRIGGER, Button::LeftTrigger2),
    (buttons::RIGHT_TRIGGER, Button::RightTrigger2),
    (buttons::SELECT, Button::Select),
    (buttons::START, Button::Start),
    (buttons::LEFT_STICK, Button::LeftThumb),
    (buttons::RIGHT_STICK, Button::RightThumb),
    (buttons::DPAD_UP, Button::DPadUp),
    (buttons::DPAD_DOWN, Button::DPadDown),
    (buttons::DPAD_LEFT, Button::DPadLeft),
    (buttons::DPAD_RIGHT, Button::DPadRight),
    (buttons::GUIDE, Button::Mode),
];

// gilrs reports up as positive Y, the standard layout as negative
const AXIS_LAYOUT: [(usize, Axis, f32); axes::COUNT] = [
    (axes::LEFT_STICK_X, Axis::LeftStickX, 1.0),
    (axes::LEFT_STICK_Y, Axis::LeftStickY, -1.0),
    (axes::RIGHT_STICK_X, Axis::RightStickX, 1.0),
    (axes::RIGHT_STICK_Y, Axis::RightStickY, -1.0),
];

/// Reads every connected gamepad through gilrs
#[derive(Debug)]
pub struct GilrsSource {
    gilrs: Gilrs,
}

impl GilrsSource {
    pub fn new() -> Result<Self, SourceError> {
        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => g,
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SourceError::InitializationError(e.to_string()));
            }
        };

        let connected: Vec<_> = gilrs.gamepads().collect();
        if connected.is_empty() {
            warn!("No gamepad connected, sampling continues in idle mode");
        }
        for (id, gamepad) in &connected {
            info!("  ID: {}, Name: {}", id, gamepad.name());
        }

        Ok(Self { gilrs })
    }

    // gilrs only refreshes gamepad state while its queue is drained
    fn drain_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => info!("Controller {} connected", id),
                EventType::Disconnected => warn!("Controller {} disconnected", id),
                _ => {}
            }
        }
    }
}

impl ControllerSource for GilrsSource {
    fn poll(&mut self) -> Vec<GamepadSample> {
        self.drain_events();
        self.gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected())
            .map(|(id, gamepad)| snapshot(ControllerId(usize::from(id)), &gamepad))
            .collect()
    }
}

fn snapshot(controller: ControllerId, gamepad: &Gamepad<'_>) -> GamepadSample {
    let mut sample = GamepadSample::neutral(controller);
    for (index, button) in BUTTON_LAYOUT {
        sample.buttons[index] = ButtonState {
            pressed: gamepad.is_pressed(button),
        };
    }
    for (index, axis, sign) in AXIS_LAYOUT {
        sample.axes[index] = (gamepad.value(axis) * sign).clamp(-1.0, 1.0);
    }
    debug!("Sampled {}: {:?}", controller, sample);
    sample
}
