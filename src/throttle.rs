//! Dual-rate throttle
//!
//! Two independent windows: holding a direction auto-repeats briskly, holding
//! confirm/cancel repeats far slower. A check that fails is simply dropped.

use crate::config::ThrottleSettings;
use chrono::{DateTime, Duration, Local};
use tracing::debug;

/// Minimum-interval gate
#[derive(Debug, Clone)]
pub struct ThrottleWindow {
    cooldown: Duration,
    last_fired_at: Option<DateTime<Local>>,
}

impl ThrottleWindow {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired_at: None,
        }
    }

    /// Fires if strictly more than the cooldown elapsed since the last fire
    pub fn try_fire(&mut self, now: DateTime<Local>) -> bool {
        let open = match self.last_fired_at {
            Some(last) => now - last > self.cooldown,
            None => true,
        };
        if open {
            self.last_fired_at = Some(now);
        }
        open
    }

    pub fn last_fired_at(&self) -> Option<DateTime<Local>> {
        self.last_fired_at
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn reset(&mut self) {
        self.last_fired_at = None;
    }
}

#[derive(Debug, Clone)]
pub struct DualRateThrottle {
    directional: ThrottleWindow,
    action: ThrottleWindow,
}

impl DualRateThrottle {
    pub fn new(settings: &ThrottleSettings) -> Self {
        Self {
            directional: ThrottleWindow::new(settings.directional_cooldown()),
            action: ThrottleWindow::new(settings.action_cooldown()),
        }
    }

    pub fn try_fire_directional(&mut self, now: DateTime<Local>) -> bool {
        let fired = self.directional.try_fire(now);
        if !fired {
            debug!("Directional intent throttled");
        }
        fired
    }

    pub fn try_fire_action(&mut self, now: DateTime<Local>) -> bool {
        let fired = self.action.try_fire(now);
        if !fired {
            debug!("Action intent throttled");
        }
        fired
    }

    pub fn directional(&self) -> &ThrottleWindow {
        &self.directional
    }

    pub fn action(&self) -> &ThrottleWindow {
        &self.action
    }

    pub fn reset(&mut self) {
        self.directional.reset();
        self.action.reset();
    }
}
