//! Frame sampler
//!
//! Polls the controller source once per frame and forwards non-empty frames to
//! the engine queue. The loop never blocks: it awaits the next frame tick and
//! yields in between, so the cost stays bounded at one poll per frame.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──start──► Sampling ──cancel──► (task ends)
//! ```

use crate::config::SamplerSettings;
use crate::controller::source::ControllerSource;
use crate::engine::InputSignal;
use statum::{machine, state};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Engine queue full, dropped a frame with {0} controllers")]
    QueueFull(usize),

    #[error("Engine queue closed")]
    QueueClosed,
}

#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Initializing,
    Sampling,
}

#[machine]
pub struct FrameSampler<S: SamplerState> {
    source: Box<dyn ControllerSource>,
    settings: SamplerSettings,
    signal_sender: mpsc::Sender<InputSignal>,
    frames: u64,
    forwarded: u64,
}

impl<S: SamplerState> FrameSampler<S> {
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }
}

impl FrameSampler<Initializing> {
    pub fn create(
        source: Box<dyn ControllerSource>,
        settings: SamplerSettings,
        signal_sender: mpsc::Sender<InputSignal>,
    ) -> Self {
        debug!("Creating frame sampler with settings: {:?}", settings);
        Self::new(source, settings, signal_sender, 0, 0)
    }

    pub fn start(self) -> FrameSampler<Sampling> {
        info!(
            "Frame sampler starting at {}ms per frame",
            self.settings.frame_interval_ms
        );
        self.transition()
    }
}

impl FrameSampler<Sampling> {
    /// Polls once; returns the number of controllers forwarded
    pub fn sample_once(&mut self) -> Result<usize, SamplerError> {
        self.frames += 1;
        let samples = self.source.poll();
        if samples.is_empty() {
            return Ok(0);
        }

        let count = samples.len();
        match self.signal_sender.try_send(InputSignal::ControllerTick(samples)) {
            Ok(()) => {
                self.forwarded += 1;
                Ok(count)
            }
            Err(TrySendError::Full(_)) => Err(SamplerError::QueueFull(count)),
            Err(TrySendError::Closed(_)) => Err(SamplerError::QueueClosed),
        }
    }

    pub async fn run_until_cancelled(mut self, cancel: CancellationToken) {
        let mut ticker = interval(self.settings.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Frame sampler cancelled after {} frames", self.frames);
                    break;
                }

                _ = ticker.tick() => {
                    match self.sample_once() {
                        Ok(_) => {}
                        Err(SamplerError::QueueClosed) => {
                            error!("Engine queue closed, stopping frame sampler");
                            break;
                        }
                        Err(e) => warn!("{}", e),
                    }
                }
            }
        }
    }
}

/// Owns the running sampler task
///
/// Dropping the handle cancels the task as well; `stop` additionally waits
/// for it to finish.
#[derive(Debug)]
pub struct SamplerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SamplerHandle {
    pub fn spawn(
        source: Box<dyn ControllerSource>,
        settings: SamplerSettings,
        signal_sender: mpsc::Sender<InputSignal>,
    ) -> Self {
        let sampler = FrameSampler::create(source, settings, signal_sender).start();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(sampler.run_until_cancelled(cancel.clone()));
        info!("Frame sampler task spawned");

        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Frame sampler task panicked: {}", e);
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
