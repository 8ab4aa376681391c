//! Focus graph capability
//!
//! The spatial graph that picks "the next node in direction D" belongs to the
//! host. The engine only asks it to move, to focus a key, and about which
//! scope a node was registered under.

use crate::controller::decoder::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(String);

impl ScopeId {
    pub const ROOT: &'static str = "ROOT";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn root() -> Self {
        Self::new(Self::ROOT)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScopeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a navigation request is allowed to land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    /// Top of the scope stack
    pub active: ScopeId,

    /// Nearest boundary scope at or below the top, if any
    pub boundary: Option<ScopeId>,

    /// Scopes a move may resolve into, deepest first
    pub reachable: Vec<ScopeId>,

    /// Default entry of the boundary scope, where an escaped move lands
    pub entry: Option<NodeKey>,
}

impl ScopeContext {
    pub fn permits(&self, scope: &ScopeId) -> bool {
        self.boundary.is_none() || self.reachable.contains(scope)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Focus graph not ready")]
    NotReady,

    #[error("Unknown focus node: {0}")]
    UnknownNode(NodeKey),

    #[error("Focus graph rejected request: {0}")]
    Rejected(String),
}

/// Capability offered by the host's spatial navigation
pub trait FocusGraph {
    /// Moves focus one step and returns the node focused afterwards
    fn navigate_by_direction(
        &mut self,
        direction: Direction,
        scope: &ScopeContext,
    ) -> Result<Option<NodeKey>, GraphError>;

    fn focus(&mut self, key: &NodeKey) -> Result<(), GraphError>;

    fn focused(&self) -> Option<NodeKey>;

    /// Leaves no node focused
    fn clear_focus(&mut self);

    fn contains(&self, key: &NodeKey) -> bool;

    /// Scope the node was registered under
    fn scope_of(&self, key: &NodeKey) -> Option<ScopeId>;

    fn register_node(&mut self, key: NodeKey, scope: ScopeId) -> Result<(), GraphError>;

    fn unregister_node(&mut self, key: &NodeKey);
}
