//! Test doubles for the host-facing seams

use crate::controller::decoder::Direction;
use crate::controller::sample::GamepadSample;
use crate::controller::source::ControllerSource;
use crate::focus::graph::{FocusGraph, GraphError, NodeKey, ScopeContext, ScopeId};
use crate::router::{KeySink, SyntheticKeyEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Graph whose moves are scripted instead of computed
#[derive(Debug, Default)]
pub struct FakeGraph {
    nodes: HashMap<NodeKey, ScopeId>,
    focused: Option<NodeKey>,
    moves: VecDeque<NodeKey>,
    pub route_calls: Vec<(Direction, ScopeContext)>,
    pub focus_calls: Vec<NodeKey>,
    pub not_ready: bool,
}

impl FakeGraph {
    pub fn not_ready() -> Self {
        Self {
            not_ready: true,
            ..Self::default()
        }
    }

    pub fn add(&mut self, key: &str, scope: &str) -> &mut Self {
        self.nodes.insert(NodeKey::from(key), ScopeId::from(scope));
        self
    }

    pub fn remove(&mut self, key: &str) {
        self.unregister_node(&NodeKey::from(key));
    }

    /// Focus change that did not go through the engine, e.g. a click
    pub fn focus_now(&mut self, key: &str) {
        self.focused = Some(NodeKey::from(key));
    }

    /// Node the next navigation lands on
    pub fn script_move(&mut self, key: &str) {
        self.moves.push_back(NodeKey::from(key));
    }

    pub fn directions(&self) -> Vec<Direction> {
        self.route_calls.iter().map(|(direction, _)| *direction).collect()
    }
}

impl FocusGraph for FakeGraph {
    fn navigate_by_direction(
        &mut self,
        direction: Direction,
        scope: &ScopeContext,
    ) -> Result<Option<NodeKey>, GraphError> {
        if self.not_ready {
            return Err(GraphError::NotReady);
        }
        self.route_calls.push((direction, scope.clone()));
        if let Some(next) = self.moves.pop_front() {
            self.focused = Some(next);
        }
        Ok(self.focused.clone())
    }

    fn focus(&mut self, key: &NodeKey) -> Result<(), GraphError> {
        if self.not_ready {
            return Err(GraphError::NotReady);
        }
        if !self.nodes.contains_key(key) {
            return Err(GraphError::UnknownNode(key.clone()));
        }
        self.focus_calls.push(key.clone());
        self.focused = Some(key.clone());
        Ok(())
    }

    fn focused(&self) -> Option<NodeKey> {
        self.focused.clone()
    }

    fn clear_focus(&mut self) {
        self.focused = None;
    }

    fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    fn scope_of(&self, key: &NodeKey) -> Option<ScopeId> {
        self.nodes.get(key).cloned()
    }

    fn register_node(&mut self, key: NodeKey, scope: ScopeId) -> Result<(), GraphError> {
        self.nodes.insert(key, scope);
        Ok(())
    }

    fn unregister_node(&mut self, key: &NodeKey) {
        self.nodes.remove(key);
        if self.focused.as_ref() == Some(key) {
            self.focused = None;
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SyntheticKeyEvent>,
}

impl KeySink for RecordingSink {
    fn dispatch(&mut self, event: &SyntheticKeyEvent) {
        self.events.push(event.clone());
    }
}

/// Replays prepared frames, then reports no controllers
#[derive(Debug, Default)]
pub struct ScriptedSource {
    frames: VecDeque<Vec<GamepadSample>>,
    polls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(frames: impl IntoIterator<Item = Vec<GamepadSample>>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn poll_counter(&self) -> Arc<AtomicUsize> {
        self.polls.clone()
    }
}

impl ControllerSource for ScriptedSource {
    fn poll(&mut self) -> Vec<GamepadSample> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        self.frames.pop_front().unwrap_or_default()
    }
}
