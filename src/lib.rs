//! Input-mode and directional-navigation engine for 10-foot interfaces
//!
//! The engine decides whether the user is driving the interface with a pointer
//! or a controller, turns controller frames into throttled focus moves and
//! synthetic Enter/Escape keys, and keeps focus inside stacked overlay scopes.
//!
//! Hosts plug in a [`focus::graph::FocusGraph`] and a [`router::KeySink`],
//! then either drive [`engine::NavigationEngine`] directly or run it through
//! [`engine::NavigatorHandle`].

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod focus;
pub mod modality;
pub mod router;
pub mod throttle;

#[cfg(test)]
mod testing;

pub use config::NavigatorSettings;
pub use engine::{InputSignal, NavigationEngine, NavigatorHandle};
pub use error::NavError;
pub use modality::Mode;
