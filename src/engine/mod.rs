//! Navigation engine
//!
//! Single consumer of every input signal. All state (mode, throttle windows,
//! scope stack, deferred callbacks) lives in one engine value and is mutated
//! from one logical thread, so no locking is involved.
//!
//! # Tick Ordering
//!
//! ```text
//! ControllerTick ──► classify ──► decode ──► throttle ──► route
//!                    (mode)       (intents)  (windows)    (graph / key sink)
//! ```
//!
//! The engine never reads the clock itself; every entry point takes `now`.

pub mod deferred;
pub mod runtime;

use crate::config::{DecoderSettings, NavigatorSettings};
use crate::controller::decoder::{self, Action, Direction};
use crate::controller::sample::{ControllerId, GamepadSample};
use crate::engine::deferred::{Deferred, DeferredAction, DeferredQueue};
use crate::focus::graph::{FocusGraph, GraphError, ScopeId};
use crate::focus::scope::{ScopeError, ScopeSpec, ScopeStack, ScopeToken};
use crate::modality::{ModalityClassifier, Mode};
use crate::router::{action_target, EventRouter, KeySink};
use crate::throttle::DualRateThrottle;
use chrono::{DateTime, Duration, Local};
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub use runtime::NavigatorHandle;

/// Tries an initial focus gets before it is abandoned
const INITIAL_FOCUS_ATTEMPTS: u32 = 10;

/// Everything the engine consumes
#[derive(Debug, Clone)]
pub enum InputSignal {
    PointerActivity,
    KeyActivity,
    ControllerTick(Vec<GamepadSample>),
    MountScope(ScopeSpec),
    UnmountScope(ScopeId),
}

/// What a controller tick ended up doing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub controller: Option<ControllerId>,
    pub mode_changed: bool,
    pub moved: Option<Direction>,
    pub activated: Option<Action>,
}

pub struct NavigationEngine<G, K> {
    decoder: DecoderSettings,
    classifier: ModalityClassifier,
    throttle: DualRateThrottle,
    router: EventRouter,
    scopes: ScopeStack,
    deferred: DeferredQueue,
    focus_retry: Duration,
    active_controller: Option<ControllerId>,
    /// Tick at which each currently active controller became active
    activity_started: HashMap<ControllerId, u64>,
    ticks: u64,
    graph: G,
    sink: K,
}

impl<G: FocusGraph, K: KeySink> NavigationEngine<G, K> {
    pub fn new(settings: &NavigatorSettings, graph: G, sink: K) -> Self {
        info!("Creating navigation engine with settings: {:?}", settings);
        Self {
            decoder: settings.decoder.clone(),
            classifier: ModalityClassifier::new(settings.keyboard_activity_mode),
            throttle: DualRateThrottle::new(&settings.throttle),
            router: EventRouter::new(&settings.router),
            scopes: ScopeStack::new(),
            deferred: DeferredQueue::default(),
            focus_retry: Duration::milliseconds(settings.sampler.frame_interval_ms as i64),
            active_controller: None,
            activity_started: HashMap::new(),
            ticks: 0,
            graph,
            sink,
        }
    }

    pub fn mode(&self) -> Mode {
        self.classifier.mode()
    }

    pub fn subscribe_mode(&self) -> watch::Receiver<Mode> {
        self.classifier.subscribe()
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn throttle(&self) -> &DualRateThrottle {
        &self.throttle
    }

    pub fn active_controller(&self) -> Option<ControllerId> {
        self.active_controller
    }

    pub fn next_deadline(&self) -> Option<DateTime<Local>> {
        self.deferred.next_deadline()
    }

    pub fn handle(&mut self, signal: InputSignal, now: DateTime<Local>) {
        match signal {
            InputSignal::PointerActivity => {
                self.on_pointer_activity();
            }
            InputSignal::KeyActivity => {
                self.on_key_activity();
            }
            InputSignal::ControllerTick(samples) => {
                self.on_controller_tick(&samples, now);
            }
            InputSignal::MountScope(spec) => {
                if let Err(e) = self.mount_scope(spec, now) {
                    warn!("Ignoring scope mount: {}", e);
                }
            }
            InputSignal::UnmountScope(id) => {
                if let Err(e) = self.unmount_scope(&id) {
                    warn!("Ignoring scope unmount: {}", e);
                }
            }
        }
    }

    pub fn on_pointer_activity(&mut self) -> bool {
        self.classifier.on_pointer_activity()
    }

    pub fn on_key_activity(&mut self) -> bool {
        self.classifier.on_key_activity()
    }

    /// Runs one sampler tick through classify, decode, throttle and route
    pub fn on_controller_tick(
        &mut self,
        samples: &[GamepadSample],
        now: DateTime<Local>,
    ) -> TickReport {
        let mut report = TickReport::default();
        let Some(sample) = self.pick_sample(samples) else {
            return report;
        };
        report.controller = Some(sample.controller);
        if self.active_controller != Some(sample.controller) {
            info!("Controller {} is now driving navigation", sample.controller);
            self.active_controller = Some(sample.controller);
        }

        report.mode_changed = self.classifier.on_controller_activity();
        self.observe_focus();
        if self.classifier.mode() != Mode::Directional {
            return report;
        }

        let intents = decoder::decode(sample, &self.decoder);
        if intents.is_empty() {
            debug!("Controller activity without intent");
            return report;
        }
        let context = self.scopes.context();

        if let Some(direction) = intents.direction {
            if self.throttle.try_fire_directional(now) {
                let before = self.graph.focused();
                match self
                    .router
                    .route_direction(&mut self.graph, direction, &context)
                {
                    Ok(focused) if focused != before => {
                        debug!("Focus after {}: {:?}", direction, focused);
                        report.moved = Some(direction);
                    }
                    Ok(focused) => debug!("Focus stays on {:?} after {}", focused, direction),
                    Err(e) => warn!("Navigation {} skipped: {}", direction, e),
                }
                self.observe_focus();
            }
        }

        if let Some(action) = intents.action {
            if self.throttle.try_fire_action(now) {
                let target = action_target(&self.graph, &context);
                let release = self.router.press(&mut self.sink, action, target, now);
                self.deferred.schedule(Deferred {
                    due_at: release.due_at,
                    owner: self.scopes.active().token(),
                    action: DeferredAction::KeyRelease(release),
                });
                report.activated = Some(action);
            }
        }

        report
    }

    /// Pushes an overlay scope; its initial focus waits for the next tick
    pub fn mount_scope(
        &mut self,
        spec: ScopeSpec,
        now: DateTime<Local>,
    ) -> Result<ScopeToken, ScopeError> {
        self.observe_focus();
        let default_entry = spec.default_entry.clone();
        let token = self.scopes.push(spec, self.graph.focused())?;

        if let Some(entry) = default_entry {
            self.deferred.schedule(Deferred {
                due_at: now,
                owner: token.clone(),
                action: DeferredAction::InitialFocus {
                    node: entry,
                    attempt: 0,
                },
            });
        }
        Ok(token)
    }

    /// Pops an overlay scope, drops its callbacks and restores focus
    pub fn unmount_scope(&mut self, id: &ScopeId) -> Result<(), ScopeError> {
        self.observe_focus();
        let graph = &self.graph;
        let outcome = self.scopes.pop(id, |key| graph.contains(key))?;

        let dropped = self.deferred.cancel_owned_by(&outcome.token);
        if dropped > 0 {
            debug!("Dropped {} callbacks of scope {}", dropped, id);
        }

        if let Some(target) = outcome.restore {
            if let Err(e) = self.graph.focus(&target) {
                warn!("Focus restore to {} failed: {}", target, e);
            }
        }
        Ok(())
    }

    /// Fires deferred callbacks due at `now`; returns how many fired
    pub fn advance(&mut self, now: DateTime<Local>) -> usize {
        let mut fired = 0;
        for entry in self.deferred.take_due(now) {
            if !self.scopes.is_live(&entry.owner) {
                debug!("Skipping callback of destroyed scope {}", entry.owner.id);
                continue;
            }
            match entry.action {
                DeferredAction::KeyRelease(release) => {
                    self.router.release(&mut self.sink, &release);
                    fired += 1;
                }
                DeferredAction::InitialFocus { node, attempt } => {
                    let result = if self.graph.contains(&node) {
                        self.graph.focus(&node)
                    } else {
                        Err(GraphError::UnknownNode(node.clone()))
                    };
                    match result {
                        Ok(()) => fired += 1,
                        Err(GraphError::NotReady | GraphError::UnknownNode(_))
                            if attempt + 1 < INITIAL_FOCUS_ATTEMPTS =>
                        {
                            debug!("Initial focus on {} not possible yet, retrying", node);
                            self.deferred.schedule(Deferred {
                                due_at: now + self.focus_retry,
                                owner: entry.owner,
                                action: DeferredAction::InitialFocus {
                                    node,
                                    attempt: attempt + 1,
                                },
                            });
                        }
                        Err(e) => warn!("Initial focus on {} abandoned: {}", node, e),
                    }
                }
            }
        }
        if fired > 0 {
            self.observe_focus();
        }
        fired
    }

    /// Back to a freshly mounted state, as on unmount/remount of the host
    pub fn reset(&mut self) {
        info!("Resetting navigation engine");
        self.throttle.reset();
        self.deferred.clear();
        self.scopes.reset();
        self.classifier.reset();
        self.active_controller = None;
        self.activity_started.clear();
    }

    // The controller that most recently went from idle to active wins. Among
    // controllers waking up in the same tick one with an intent beats one that
    // only drifts, then sample order decides.
    fn pick_sample<'a>(&mut self, samples: &'a [GamepadSample]) -> Option<&'a GamepadSample> {
        let hysteresis = match self.classifier.mode() {
            Mode::Pointer => self.decoder.activity_hysteresis,
            Mode::Directional => 0.0,
        };
        let deadzone = self.decoder.activity_deadzone;
        let active: Vec<&GamepadSample> = samples
            .iter()
            .filter(|sample| decoder::has_activity(sample, deadzone, hysteresis))
            .collect();

        self.ticks += 1;
        let tick = self.ticks;
        self.activity_started
            .retain(|id, _| active.iter().any(|sample| sample.controller == *id));
        for sample in &active {
            self.activity_started.entry(sample.controller).or_insert(tick);
        }

        let mut newest: Option<(&'a GamepadSample, (u64, bool))> = None;
        for sample in active {
            let started = self
                .activity_started
                .get(&sample.controller)
                .copied()
                .unwrap_or(tick);
            let rank = (started, !decoder::decode(sample, &self.decoder).is_empty());
            if newest.map_or(true, |(_, best)| rank > best) {
                newest = Some((sample, rank));
            }
        }
        newest.map(|(sample, _)| sample)
    }

    fn observe_focus(&mut self) {
        let focused = self.graph.focused();
        let owner = focused.as_ref().and_then(|key| self.graph.scope_of(key));
        self.scopes.observe_focus(focused.as_ref(), owner.as_ref());
    }
}
