//! Focus scope stack
//!
//! Overlays push a scope when they mount and pop it when they unmount. The top
//! of the stack is the active navigation domain.
//!
//! # Lifecycle
//!
//! ```text
//! created ──push──► active ──push(other)──► suspended
//!                     ▲                         │
//!                     └──────pop(other)─────────┘
//! active ──pop──► destroyed
//! ```
//!
//! On push the node focused at that moment is captured on the scope being
//! suspended. Popping a scope that remembers its last child hands focus back to
//! that capture, or to the parent's default entry when the capture is gone.

use crate::focus::graph::{NodeKey, ScopeContext, ScopeId};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("Scope {0} is already mounted")]
    AlreadyMounted(ScopeId),

    #[error("Scope {0} is not mounted")]
    UnknownScope(ScopeId),

    #[error("The root scope cannot be unmounted")]
    RootScope,
}

/// What an overlay declares when it mounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSpec {
    pub id: ScopeId,
    pub is_boundary: bool,
    pub remember_last_child: bool,
    pub default_entry: Option<NodeKey>,
}

impl ScopeSpec {
    pub fn new(id: impl Into<ScopeId>) -> Self {
        Self {
            id: id.into(),
            is_boundary: false,
            remember_last_child: false,
            default_entry: None,
        }
    }

    /// Typical modal: traps focus and hands it back on close
    pub fn modal(id: impl Into<ScopeId>, default_entry: impl Into<NodeKey>) -> Self {
        Self::new(id)
            .boundary()
            .remember_last_child()
            .default_entry(default_entry)
    }

    pub fn boundary(mut self) -> Self {
        self.is_boundary = true;
        self
    }

    pub fn remember_last_child(mut self) -> Self {
        self.remember_last_child = true;
        self
    }

    pub fn default_entry(mut self, key: impl Into<NodeKey>) -> Self {
        self.default_entry = Some(key.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Active,
    Suspended,
}

/// Identifies one particular mount of a scope
///
/// Ids can be reused after an unmount; the generation cannot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeToken {
    pub id: ScopeId,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct FocusScope {
    pub id: ScopeId,
    pub is_boundary: bool,
    pub remember_last_child: bool,
    pub default_entry: Option<NodeKey>,
    pub saved_focus_target: Option<NodeKey>,
    pub state: ScopeState,
    generation: u64,
}

impl FocusScope {
    fn from_spec(spec: ScopeSpec, generation: u64) -> Self {
        Self {
            id: spec.id,
            is_boundary: spec.is_boundary,
            remember_last_child: spec.remember_last_child,
            default_entry: spec.default_entry,
            saved_focus_target: None,
            state: ScopeState::Active,
            generation,
        }
    }

    pub fn token(&self) -> ScopeToken {
        ScopeToken {
            id: self.id.clone(),
            generation: self.generation,
        }
    }
}

/// Result of unmounting a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopOutcome {
    pub token: ScopeToken,

    /// Node to focus now, if the popped scope was on top
    pub restore: Option<NodeKey>,
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<FocusScope>,
    next_generation: u64,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        let root = ScopeSpec::new(ScopeId::root()).remember_last_child();
        Self {
            scopes: vec![FocusScope::from_spec(root, 0)],
            next_generation: 1,
        }
    }

    pub fn active(&self) -> &FocusScope {
        // The root is never removed
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn get(&self, id: &ScopeId) -> Option<&FocusScope> {
        self.scopes.iter().find(|scope| &scope.id == id)
    }

    pub fn is_live(&self, token: &ScopeToken) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.id == token.id && scope.generation == token.generation)
    }

    pub fn context(&self) -> ScopeContext {
        let boundary_index = self.scopes.iter().rposition(|scope| scope.is_boundary);
        let reachable_from = boundary_index.unwrap_or(0);
        ScopeContext {
            active: self.active().id.clone(),
            boundary: boundary_index.map(|index| self.scopes[index].id.clone()),
            reachable: self.scopes[reachable_from..]
                .iter()
                .rev()
                .map(|scope| scope.id.clone())
                .collect(),
            entry: boundary_index.and_then(|index| self.scopes[index].default_entry.clone()),
        }
    }

    /// Mounts a scope on top, capturing `focused` on the scope it suspends
    pub fn push(
        &mut self,
        spec: ScopeSpec,
        focused: Option<NodeKey>,
    ) -> Result<ScopeToken, ScopeError> {
        if self.get(&spec.id).is_some() {
            return Err(ScopeError::AlreadyMounted(spec.id));
        }

        let depth = self.scopes.len();
        let parent = &mut self.scopes[depth - 1];
        if focused.is_some() {
            parent.saved_focus_target = focused;
        }
        parent.state = ScopeState::Suspended;
        debug!(
            "Suspended scope {} with saved target {:?}",
            parent.id, parent.saved_focus_target
        );

        let scope = FocusScope::from_spec(spec, self.next_generation);
        self.next_generation += 1;
        let token = scope.token();
        info!(
            "Pushed focus scope {} (boundary: {}, remember: {}, depth: {})",
            scope.id,
            scope.is_boundary,
            scope.remember_last_child,
            depth + 1
        );
        self.scopes.push(scope);
        Ok(token)
    }

    /// Unmounts a scope; only popping the top produces a restore target
    pub fn pop(
        &mut self,
        id: &ScopeId,
        exists: impl Fn(&NodeKey) -> bool,
    ) -> Result<PopOutcome, ScopeError> {
        let index = self
            .scopes
            .iter()
            .position(|scope| &scope.id == id)
            .ok_or_else(|| ScopeError::UnknownScope(id.clone()))?;
        if index == 0 {
            return Err(ScopeError::RootScope);
        }

        let was_top = index == self.scopes.len() - 1;
        let removed = self.scopes.remove(index);
        let token = removed.token();

        if !was_top {
            warn!("Scope {} unmounted while suspended, no focus restore", id);
            return Ok(PopOutcome {
                token,
                restore: None,
            });
        }

        let depth = self.scopes.len();
        let parent = &mut self.scopes[depth - 1];
        parent.state = ScopeState::Active;

        let default_entry = parent.default_entry.clone().filter(|key| exists(key));
        let restore = if removed.remember_last_child {
            match parent.saved_focus_target.clone() {
                Some(saved) if exists(&saved) => Some(saved),
                Some(saved) => {
                    debug!(
                        "Saved target {} of scope {} is gone, using default entry",
                        saved, parent.id
                    );
                    default_entry
                }
                None => default_entry,
            }
        } else {
            default_entry
        };

        info!(
            "Popped focus scope {}, scope {} active again, restoring {:?}",
            removed.id, parent.id, restore
        );
        Ok(PopOutcome { token, restore })
    }

    /// Snapshots the focused node on the active scope if it belongs there
    pub fn observe_focus(&mut self, focused: Option<&NodeKey>, owner: Option<&ScopeId>) {
        let depth = self.scopes.len();
        let top = &mut self.scopes[depth - 1];
        if !top.remember_last_child {
            return;
        }
        if let (Some(node), Some(owner)) = (focused, owner) {
            if owner == &top.id && top.saved_focus_target.as_ref() != Some(node) {
                debug!("Scope {} now remembers {}", top.id, node);
                top.saved_focus_target = Some(node.clone());
            }
        }
    }

    /// Drops everything above the root
    pub fn reset(&mut self) {
        self.scopes.truncate(1);
        let root = &mut self.scopes[0];
        root.state = ScopeState::Active;
        root.saved_focus_target = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> NodeKey {
        NodeKey::new(name)
    }

    #[test]
    fn push_suspends_and_pop_reactivates() {
        let mut stack = ScopeStack::new();
        stack
            .push(ScopeSpec::new("drawer"), Some(key("menu-home")))
            .unwrap();
        assert_eq!(stack.active().id, ScopeId::from("drawer"));
        assert_eq!(
            stack.get(&ScopeId::root()).unwrap().state,
            ScopeState::Suspended
        );

        stack.pop(&ScopeId::from("drawer"), |_| true).unwrap();
        assert_eq!(stack.active().id, ScopeId::root());
        assert_eq!(stack.active().state, ScopeState::Active);
    }

    #[test]
    fn remembered_scope_restores_parent_capture() {
        let mut stack = ScopeStack::new();
        stack
            .push(
                ScopeSpec::modal("settings", "settings-general"),
                Some(key("sidebar-settings")),
            )
            .unwrap();

        let outcome = stack.pop(&ScopeId::from("settings"), |_| true).unwrap();
        assert_eq!(outcome.restore, Some(key("sidebar-settings")));
    }

    #[test]
    fn missing_capture_falls_back_to_default_entry() {
        let mut stack = ScopeStack::new();
        stack
            .push(ScopeSpec::new("page").default_entry("page-first"), None)
            .unwrap();
        stack
            .push(
                ScopeSpec::modal("settings", "settings-general"),
                Some(key("page-card-7")),
            )
            .unwrap();

        let outcome = stack
            .pop(&ScopeId::from("settings"), |node| node.as_str() != "page-card-7")
            .unwrap();
        assert_eq!(outcome.restore, Some(key("page-first")));
    }

    #[test]
    fn forgetful_scope_uses_default_entry() {
        let mut stack = ScopeStack::new();
        stack
            .push(ScopeSpec::new("page").default_entry("page-first"), None)
            .unwrap();
        stack
            .push(ScopeSpec::new("toast").boundary(), Some(key("page-card-3")))
            .unwrap();
        let outcome = stack.pop(&ScopeId::from("toast"), |_| true).unwrap();
        assert_eq!(outcome.restore, Some(key("page-first")));
    }

    #[test]
    fn boundary_limits_reachable_scopes() {
        let mut stack = ScopeStack::new();
        assert_eq!(stack.context().boundary, None);

        stack.push(ScopeSpec::new("page"), None).unwrap();
        stack
            .push(ScopeSpec::modal("modal", "modal-ok"), None)
            .unwrap();
        stack
            .push(ScopeSpec::new("picker").default_entry("picker-first"), None)
            .unwrap();

        let context = stack.context();
        assert_eq!(context.active, ScopeId::from("picker"));
        assert_eq!(context.entry, Some(key("modal-ok")));
        assert_eq!(context.boundary, Some(ScopeId::from("modal")));
        assert_eq!(
            context.reachable,
            vec![ScopeId::from("picker"), ScopeId::from("modal")]
        );
        assert!(!context.permits(&ScopeId::from("page")));
        assert!(!context.permits(&ScopeId::root()));
    }

    #[test]
    fn suspended_unmount_does_not_restore() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeSpec::new("a").remember_last_child(), None).unwrap();
        stack.push(ScopeSpec::new("b"), Some(key("a-1"))).unwrap();

        let outcome = stack.pop(&ScopeId::from("a"), |_| true).unwrap();
        assert_eq!(outcome.restore, None);
        assert_eq!(stack.active().id, ScopeId::from("b"));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn root_and_unknown_scopes_cannot_be_popped() {
        let mut stack = ScopeStack::new();
        assert_eq!(
            stack.pop(&ScopeId::root(), |_| true),
            Err(ScopeError::RootScope)
        );
        assert_eq!(
            stack.pop(&ScopeId::from("ghost"), |_| true),
            Err(ScopeError::UnknownScope(ScopeId::from("ghost")))
        );
    }

    #[test]
    fn duplicate_mount_is_rejected() {
        let mut stack = ScopeStack::new();
        stack.push(ScopeSpec::new("modal"), None).unwrap();
        assert_eq!(
            stack.push(ScopeSpec::new("modal"), None),
            Err(ScopeError::AlreadyMounted(ScopeId::from("modal")))
        );
    }

    #[test]
    fn remount_gets_a_fresh_generation() {
        let mut stack = ScopeStack::new();
        let first = stack.push(ScopeSpec::new("modal"), None).unwrap();
        stack.pop(&ScopeId::from("modal"), |_| true).unwrap();
        let second = stack.push(ScopeSpec::new("modal"), None).unwrap();

        assert_ne!(first, second);
        assert!(!stack.is_live(&first));
        assert!(stack.is_live(&second));
    }

    #[test]
    fn observe_focus_only_tracks_own_nodes() {
        let mut stack = ScopeStack::new();
        stack
            .push(ScopeSpec::new("modal").remember_last_child(), None)
            .unwrap();

        let modal = ScopeId::from("modal");
        stack.observe_focus(Some(&key("root-node")), Some(&ScopeId::root()));
        assert_eq!(stack.active().saved_focus_target, None);

        stack.observe_focus(Some(&key("modal-ok")), Some(&modal));
        assert_eq!(stack.active().saved_focus_target, Some(key("modal-ok")));
    }
}
