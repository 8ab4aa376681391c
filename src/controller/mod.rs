//! Controller subsystem for gamepad input handling
//!
//! Implements a three-stage pipeline:
//!
//! 1. [`source`] - Raw controller snapshots (gilrs or any other backend)
//! 2. [`sampler`] - Frame-paced polling into the engine queue
//! 3. [`decoder`] - Snapshot to direction/action intents
//!
//! # Architecture
//!
//! ```text
//! Gamepad ──► Source ──► Sampler ──► engine queue ──► Decoder
//!             (Samples)  (per frame)                  (Intents)
//! ```
//!
//! Samples use the standard button/axis layout described in [`sample`].

pub mod decoder;
pub mod sample;
pub mod sampler;
pub mod source;
