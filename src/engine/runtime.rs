//! Engine runtime
//!
//! Hosts the engine in its own task. The sampler and the host both feed the
//! same queue, so the engine sees one ordered stream of signals:
//!
//! ```text
//! FrameSampler ──┐
//!                ├─[InputSignal]─► engine task ──► FocusGraph / KeySink
//! host events ───┘    (mpsc)           │
//!                                      └─► watch<Mode>
//! ```
//!
//! Between signals the task sleeps until the next deferred callback is due.

use crate::config::NavigatorSettings;
use crate::controller::sampler::SamplerHandle;
use crate::controller::source::{ControllerSource, GilrsSource};
use crate::engine::{InputSignal, NavigationEngine};
use crate::error::NavError;
use crate::focus::graph::FocusGraph;
use crate::modality::Mode;
use crate::router::KeySink;
use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Wall-clock timestamps derived from the runtime's monotonic clock
#[derive(Debug, Clone, Copy)]
struct RuntimeClock {
    origin: Instant,
    origin_local: DateTime<Local>,
}

impl RuntimeClock {
    fn start() -> Self {
        Self {
            origin: Instant::now(),
            origin_local: Local::now(),
        }
    }

    fn now(&self) -> DateTime<Local> {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        match chrono::Duration::from_std(elapsed) {
            Ok(elapsed) => self.origin_local + elapsed,
            Err(_) => Local::now(),
        }
    }

    fn instant_at(&self, at: DateTime<Local>) -> Instant {
        match (at - self.origin_local).to_std() {
            Ok(offset) => self.origin + offset,
            Err(_) => self.origin,
        }
    }
}

/// Running navigator: engine task plus optional frame sampler
#[derive(Debug)]
pub struct NavigatorHandle {
    signal_sender: mpsc::Sender<InputSignal>,
    mode_receiver: watch::Receiver<Mode>,
    cancel: CancellationToken,
    engine_task: Option<JoinHandle<()>>,
    sampler: Option<SamplerHandle>,
}

impl NavigatorHandle {
    /// Starts the engine task, and the sampler if a source is given
    pub fn spawn<G, K>(
        settings: NavigatorSettings,
        graph: G,
        sink: K,
        source: Option<Box<dyn ControllerSource>>,
    ) -> Self
    where
        G: FocusGraph + Send + 'static,
        K: KeySink + Send + 'static,
    {
        info!("Spawning navigator");
        let (signal_sender, signal_receiver) = mpsc::channel(settings.sampler.queue_capacity);
        debug!(
            "Created signal queue with capacity {}",
            settings.sampler.queue_capacity
        );

        let engine = NavigationEngine::new(&settings, graph, sink);
        let mode_receiver = engine.subscribe_mode();
        let cancel = CancellationToken::new();
        let engine_task = tokio::spawn(run_engine(engine, signal_receiver, cancel.clone()));

        let sampler = source.map(|source| {
            SamplerHandle::spawn(source, settings.sampler.clone(), signal_sender.clone())
        });
        if sampler.is_none() {
            info!("No controller source, navigator only handles host signals");
        }

        Self {
            signal_sender,
            mode_receiver,
            cancel,
            engine_task: Some(engine_task),
            sampler,
        }
    }

    /// Same as [`NavigatorHandle::spawn`] with the gilrs backend as source
    pub fn spawn_with_gilrs<G, K>(
        settings: NavigatorSettings,
        graph: G,
        sink: K,
    ) -> Result<Self, NavError>
    where
        G: FocusGraph + Send + 'static,
        K: KeySink + Send + 'static,
    {
        let source = GilrsSource::new()?;
        Ok(Self::spawn(settings, graph, sink, Some(Box::new(source))))
    }

    /// Sender for host-side signals (pointer, keyboard, scope mounts)
    pub fn signals(&self) -> mpsc::Sender<InputSignal> {
        self.signal_sender.clone()
    }

    pub async fn send(&self, signal: InputSignal) -> Result<(), NavError> {
        self.signal_sender
            .send(signal)
            .await
            .map_err(|_| NavError::ChannelClosed)
    }

    pub fn mode(&self) -> watch::Receiver<Mode> {
        self.mode_receiver.clone()
    }

    /// Stops the sampler first, then the engine, and waits for both
    pub async fn shutdown(mut self) -> Result<(), NavError> {
        info!("Shutting down navigator");
        if let Some(sampler) = self.sampler.take() {
            sampler.stop().await;
        }
        self.cancel.cancel();

        match self.engine_task.take() {
            Some(task) => task.await.map_err(|e| {
                error!("Engine task panicked: {}", e);
                NavError::TaskFailed(e.to_string())
            }),
            None => Ok(()),
        }
    }
}

impl Drop for NavigatorHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_engine<G, K>(
    mut engine: NavigationEngine<G, K>,
    mut signals: mpsc::Receiver<InputSignal>,
    cancel: CancellationToken,
) where
    G: FocusGraph,
    K: KeySink,
{
    let clock = RuntimeClock::start();
    info!("Engine task running");

    loop {
        let deadline = engine.next_deadline().map(|at| clock.instant_at(at));

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Engine task cancelled");
                break;
            }

            signal = signals.recv() => {
                let Some(signal) = signal else {
                    info!("Signal queue closed, engine task ends");
                    break;
                };
                let now = clock.now();
                engine.advance(now);
                engine.handle(signal, now);
            }

            _ = sleep_until_deadline(deadline) => {
                engine.advance(clock.now());
            }
        }
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
