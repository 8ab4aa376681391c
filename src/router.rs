//! Event routing
//!
//! Directional intents are forwarded to the focus graph. Action intents become
//! synthetic key presses so that consumers written for a keyboard keep working:
//! a "down" goes out immediately, the matching "up" follows after a short delay.

use crate::config::RouterSettings;
use crate::controller::decoder::{Action, Direction};
use crate::focus::graph::{FocusGraph, GraphError, NodeKey, ScopeContext, ScopeId};
use chrono::{DateTime, Duration, Local};
use egui::{Key, Modifiers};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPhase {
    Down,
    Up,
}

/// Receiver of a synthetic key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyTarget {
    Node(NodeKey),
    /// Nothing focused, delivered to the root of the active scope
    ScopeRoot(ScopeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticKeyEvent {
    pub phase: KeyPhase,
    pub key: &'static str,
    pub code: u32,
    pub bubbles: bool,
    pub cancelable: bool,
    pub target: KeyTarget,
}

impl SyntheticKeyEvent {
    pub fn for_action(action: Action, phase: KeyPhase, target: KeyTarget) -> Self {
        let (key, code) = match action {
            Action::Confirm => ("Enter", 13),
            Action::Cancel => ("Escape", 27),
        };
        Self {
            phase,
            key,
            code,
            bubbles: true,
            cancelable: true,
            target,
        }
    }

    /// Same key, same target, "up" phase
    pub fn released(&self) -> Self {
        Self {
            phase: KeyPhase::Up,
            ..self.clone()
        }
    }

    /// Equivalent egui input event, for hosts built on egui
    pub fn to_egui(&self) -> Option<egui::Event> {
        let key = Key::from_name(self.key)?;
        Some(egui::Event::Key {
            key,
            physical_key: None,
            pressed: self.phase == KeyPhase::Down,
            repeat: false,
            modifiers: Modifiers::NONE,
        })
    }
}

/// Host side of the synthetic key path
///
/// Implementations must deliver with bubbling semantics so that listeners on a
/// common ancestor of the target observe the event.
pub trait KeySink {
    fn dispatch(&mut self, event: &SyntheticKeyEvent);
}

/// A release waiting for its delay to pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRelease {
    pub due_at: DateTime<Local>,
    pub event: SyntheticKeyEvent,
}

#[derive(Debug, Clone)]
pub struct EventRouter {
    release_delay: Duration,
}

impl EventRouter {
    pub fn new(settings: &RouterSettings) -> Self {
        Self {
            release_delay: settings.release_delay(),
        }
    }

    /// Asks the graph to move and keeps the result inside the active boundary
    ///
    /// Returns the node focused afterwards. A move that lands outside the
    /// boundary goes back to the previous node if that one is inside, else to
    /// the boundary's default entry, else focus is cleared.
    pub fn route_direction<G: FocusGraph>(
        &self,
        graph: &mut G,
        direction: Direction,
        context: &ScopeContext,
    ) -> Result<Option<NodeKey>, GraphError> {
        let previous = graph.focused();
        let resolved = graph.navigate_by_direction(direction, context)?;
        debug!(
            "Navigated {} in scope {}: {:?} -> {:?}",
            direction, context.active, previous, resolved
        );

        let Some(node) = resolved else {
            return Ok(previous);
        };
        if context.boundary.is_none() || inside(graph, context, &node) {
            return Ok(Some(node));
        }

        warn!(
            "Navigation {} resolved to {} in scope {:?}, outside boundary {:?}",
            direction,
            node,
            graph.scope_of(&node),
            context.boundary
        );
        let fallback = previous
            .filter(|previous| inside(graph, context, previous))
            .or_else(|| {
                context
                    .entry
                    .clone()
                    .filter(|entry| inside(graph, context, entry))
            });

        match fallback {
            Some(target) => {
                graph.focus(&target)?;
                Ok(Some(target))
            }
            None => {
                warn!("No node inside boundary {:?}, clearing focus", context.boundary);
                graph.clear_focus();
                Ok(None)
            }
        }
    }

    /// Dispatches the "down" half and hands back the delayed "up"
    pub fn press<K: KeySink>(
        &self,
        sink: &mut K,
        action: Action,
        target: KeyTarget,
        now: DateTime<Local>,
    ) -> PendingRelease {
        let down = SyntheticKeyEvent::for_action(action, KeyPhase::Down, target);
        info!("Synthetic {} down -> {:?}", down.key, down.target);
        sink.dispatch(&down);

        PendingRelease {
            due_at: now + self.release_delay,
            event: down.released(),
        }
    }

    pub fn release<K: KeySink>(&self, sink: &mut K, pending: &PendingRelease) {
        debug!(
            "Synthetic {} up -> {:?}",
            pending.event.key, pending.event.target
        );
        sink.dispatch(&pending.event);
    }
}

// Unknown owners count as outside
fn inside<G: FocusGraph>(graph: &G, context: &ScopeContext, key: &NodeKey) -> bool {
    graph
        .scope_of(key)
        .is_some_and(|owner| context.permits(&owner))
}

/// Picks the focused node, or the active scope root when nothing is focused
pub fn action_target<G: FocusGraph>(graph: &G, context: &ScopeContext) -> KeyTarget {
    match graph.focused() {
        Some(node) => KeyTarget::Node(node),
        None => KeyTarget::ScopeRoot(context.active.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeGraph, RecordingSink};

    fn router() -> EventRouter {
        EventRouter::new(&RouterSettings::default())
    }

    fn open_context() -> ScopeContext {
        ScopeContext {
            active: ScopeId::root(),
            boundary: None,
            reachable: vec![ScopeId::root()],
            entry: None,
        }
    }

    fn modal_context() -> ScopeContext {
        ScopeContext {
            active: ScopeId::from("modal"),
            boundary: Some(ScopeId::from("modal")),
            reachable: vec![ScopeId::from("modal")],
            entry: Some(NodeKey::from("modal-ok")),
        }
    }

    #[test]
    fn confirm_and_cancel_have_key_identities() {
        let confirm = SyntheticKeyEvent::for_action(
            Action::Confirm,
            KeyPhase::Down,
            KeyTarget::ScopeRoot(ScopeId::root()),
        );
        assert_eq!((confirm.key, confirm.code), ("Enter", 13));
        assert!(confirm.bubbles && confirm.cancelable);

        let cancel = SyntheticKeyEvent::for_action(
            Action::Cancel,
            KeyPhase::Down,
            KeyTarget::ScopeRoot(ScopeId::root()),
        );
        assert_eq!((cancel.key, cancel.code), ("Escape", 27));
    }

    #[test]
    fn egui_conversion_keeps_phase() {
        let down = SyntheticKeyEvent::for_action(
            Action::Cancel,
            KeyPhase::Down,
            KeyTarget::Node(NodeKey::from("ok")),
        );
        match down.released().to_egui() {
            Some(egui::Event::Key { key, pressed, .. }) => {
                assert_eq!(key, Key::Escape);
                assert!(!pressed);
            }
            other => panic!("unexpected conversion: {other:?}"),
        }
    }

    #[test]
    fn press_dispatches_down_and_defers_up() {
        let mut sink = RecordingSink::default();
        let now = Local::now();
        let pending = router().press(
            &mut sink,
            Action::Confirm,
            KeyTarget::Node(NodeKey::from("play")),
            now,
        );

        assert_eq!(sink.events.len(), 1);
        assert_eq!(sink.events[0].phase, KeyPhase::Down);
        assert_eq!(pending.event.phase, KeyPhase::Up);
        assert_eq!(pending.event.target, sink.events[0].target);
        assert_eq!(pending.due_at, now + Duration::milliseconds(100));
    }

    #[test]
    fn unbounded_moves_pass_through() {
        let mut graph = FakeGraph::default();
        graph.add("a", "ROOT").add("b", "elsewhere");
        graph.focus_now("a");
        graph.script_move("b");

        let focused = router()
            .route_direction(&mut graph, Direction::Right, &open_context())
            .unwrap();
        assert_eq!(focused, Some(NodeKey::from("b")));
        assert_eq!(graph.route_calls.len(), 1);
    }

    #[test]
    fn escaping_moves_are_undone() {
        let mut graph = FakeGraph::default();
        graph.add("modal-ok", "modal").add("sidebar", "ROOT");
        graph.focus_now("modal-ok");
        graph.script_move("sidebar");

        let focused = router()
            .route_direction(&mut graph, Direction::Left, &modal_context())
            .unwrap();
        assert_eq!(focused, Some(NodeKey::from("modal-ok")));
        assert_eq!(graph.focused(), Some(NodeKey::from("modal-ok")));
    }

    #[test]
    fn escape_from_outside_opener_lands_on_entry() {
        let mut graph = FakeGraph::default();
        graph.add("modal-ok", "modal").add("opener", "ROOT").add("sidebar", "ROOT");
        graph.focus_now("opener");
        graph.script_move("sidebar");

        let focused = router()
            .route_direction(&mut graph, Direction::Left, &modal_context())
            .unwrap();
        assert_eq!(focused, Some(NodeKey::from("modal-ok")));
        assert_eq!(graph.focused(), Some(NodeKey::from("modal-ok")));
    }

    #[test]
    fn escape_without_fallback_clears_focus() {
        let mut graph = FakeGraph::default();
        graph.add("sidebar", "ROOT");
        graph.script_move("sidebar");
        let context = ScopeContext {
            entry: None,
            ..modal_context()
        };

        let focused = router()
            .route_direction(&mut graph, Direction::Left, &context)
            .unwrap();
        assert_eq!(focused, None);
        assert_eq!(graph.focused(), None);
    }

    #[test]
    fn graph_errors_propagate() {
        let mut graph = FakeGraph::not_ready();
        let result = router().route_direction(&mut graph, Direction::Up, &open_context());
        assert_eq!(result, Err(GraphError::NotReady));
    }

    #[test]
    fn action_target_falls_back_to_scope_root() {
        let graph = FakeGraph::default();
        assert_eq!(
            action_target(&graph, &modal_context()),
            KeyTarget::ScopeRoot(ScopeId::from("modal"))
        );
    }
}
