//! Input modality classification
//!
//! Tracks whether the user is currently driving the surface with a pointer or
//! with a directional device. Classification is last-writer-wins: whichever
//! class of input arrived most recently decides the mode.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Pointer,
    Directional,
}

impl Mode {
    /// Marker consumed by styling (cursor hiding, focus rings)
    pub fn body_class(self) -> &'static str {
        match self {
            Mode::Pointer => "input-mouse",
            Mode::Directional => "input-navigation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Pointer => write!(f, "pointer"),
            Mode::Directional => write!(f, "directional"),
        }
    }
}

/// Holds the current mode and broadcasts changes
///
/// Subscribers get one notification per actual transition; repeated activity
/// of the same class is silent.
#[derive(Debug)]
pub struct ModalityClassifier {
    mode_sender: watch::Sender<Mode>,
    keyboard_mode: Mode,
    transitions: u64,
}

impl ModalityClassifier {
    pub fn new(keyboard_mode: Mode) -> Self {
        let (mode_sender, _) = watch::channel(Mode::Pointer);
        Self {
            mode_sender,
            keyboard_mode,
            transitions: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        *self.mode_sender.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Mode> {
        self.mode_sender.subscribe()
    }

    /// Number of transitions since creation
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    /// Returns true if the mode changed
    pub fn on_pointer_activity(&mut self) -> bool {
        self.set(Mode::Pointer, "pointer")
    }

    /// Returns true if the mode changed
    pub fn on_key_activity(&mut self) -> bool {
        self.set(self.keyboard_mode, "keyboard")
    }

    /// Returns true if the mode changed
    pub fn on_controller_activity(&mut self) -> bool {
        self.set(Mode::Directional, "controller")
    }

    /// Back to pointer mode, as on a fresh mount
    pub fn reset(&mut self) {
        self.set(Mode::Pointer, "reset");
    }

    fn set(&mut self, mode: Mode, cause: &str) -> bool {
        let changed = self.mode_sender.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });

        if changed {
            self.transitions += 1;
            info!("Input mode -> {} ({} activity)", mode, cause);
        } else {
            debug!("Input mode stays {} ({} activity)", mode, cause);
        }
        changed
    }
}

impl Default for ModalityClassifier {
    fn default() -> Self {
        Self::new(Mode::Pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_pointer_mode() {
        let classifier = ModalityClassifier::default();
        assert_eq!(classifier.mode(), Mode::Pointer);
        assert_eq!(classifier.mode().body_class(), "input-mouse");
    }

    #[test]
    fn repeated_activity_is_idempotent() {
        let mut classifier = ModalityClassifier::default();
        let mut receiver = classifier.subscribe();

        assert!(!classifier.on_pointer_activity());
        assert!(!receiver.has_changed().unwrap());

        assert!(classifier.on_controller_activity());
        assert!(receiver.has_changed().unwrap());
        assert_eq!(*receiver.borrow_and_update(), Mode::Directional);

        assert!(!classifier.on_controller_activity());
        assert!(!receiver.has_changed().unwrap());
        assert_eq!(classifier.transitions(), 1);
    }

    #[test]
    fn last_writer_wins() {
        let mut classifier = ModalityClassifier::default();
        classifier.on_controller_activity();
        classifier.on_pointer_activity();
        classifier.on_controller_activity();
        assert_eq!(classifier.mode(), Mode::Directional);
        assert_eq!(classifier.mode().body_class(), "input-navigation");
        assert_eq!(classifier.transitions(), 3);
    }

    #[test]
    fn key_activity_follows_configured_mode() {
        let mut classifier = ModalityClassifier::default();
        classifier.on_controller_activity();
        assert!(classifier.on_key_activity());
        assert_eq!(classifier.mode(), Mode::Pointer);

        let mut remote = ModalityClassifier::new(Mode::Directional);
        assert!(remote.on_key_activity());
        assert_eq!(remote.mode(), Mode::Directional);
    }
}
