//! Linear focus graph
//!
//! Nodes are kept in registration order. Up and Left step to the previous
//! candidate, Down and Right to the next one, clamped at both ends. Only
//! nodes whose scope the current context permits are candidates.

use crate::controller::decoder::Direction;
use crate::focus::graph::{FocusGraph, GraphError, NodeKey, ScopeContext, ScopeId};
use tracing::debug;

#[derive(Debug, Default)]
pub struct ListGraph {
    nodes: Vec<(NodeKey, ScopeId)>,
    focused: Option<NodeKey>,
}

impl ListGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn candidates<'a>(&'a self, scope: &'a ScopeContext) -> impl Iterator<Item = &'a NodeKey> {
        self.nodes
            .iter()
            .filter(move |(_, owner)| scope.permits(owner))
            .map(|(key, _)| key)
    }
}

impl FocusGraph for ListGraph {
    fn navigate_by_direction(
        &mut self,
        direction: Direction,
        scope: &ScopeContext,
    ) -> Result<Option<NodeKey>, GraphError> {
        let candidates: Vec<&NodeKey> = self.candidates(scope).collect();
        if candidates.is_empty() {
            return Ok(self.focused.clone());
        }

        let current = self
            .focused
            .as_ref()
            .and_then(|focused| candidates.iter().position(|key| *key == focused));
        let next = match (current, direction) {
            (None, _) => 0,
            (Some(index), Direction::Up | Direction::Left) => index.saturating_sub(1),
            (Some(index), Direction::Down | Direction::Right) => {
                (index + 1).min(candidates.len() - 1)
            }
        };

        let target = candidates[next].clone();
        debug!("List focus {} -> {}", direction, target);
        self.focused = Some(target);
        Ok(self.focused.clone())
    }

    fn focus(&mut self, key: &NodeKey) -> Result<(), GraphError> {
        if !self.contains(key) {
            return Err(GraphError::UnknownNode(key.clone()));
        }
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
        self.nodes.iter().any(|(node, _)| node == key)
    }

    fn scope_of(&self, key: &NodeKey) -> Option<ScopeId> {
        self.nodes
            .iter()
            .find(|(node, _)| node == key)
            .map(|(_, scope)| scope.clone())
    }

    fn register_node(&mut self, key: NodeKey, scope: ScopeId) -> Result<(), GraphError> {
        if self.contains(&key) {
            return Err(GraphError::Rejected(format!("{} already registered", key)));
        }
        self.nodes.push((key, scope));
        Ok(())
    }

    fn unregister_node(&mut self, key: &NodeKey) {
        self.nodes.retain(|(node, _)| node != key);
        if self.focused.as_ref() == Some(key) {
            self.focused = None;
        }
    }
}
