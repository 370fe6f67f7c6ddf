//! Patch application.
//!
//! Applies a patch set to a live tree: locate the patched positions through
//! the sparse index, then run each position's patches in order, threading a
//! possibly-replaced root forward. The engine holds no state across calls;
//! each invocation is a plain traversal parameterized by the patch set.

use std::fmt;
use std::rc::Rc;

use crate::backend::{Backend, LiveId};
use crate::collections::map::HashMap;
use crate::index::locate;
use crate::patch::{Moves, Patch, PatchSet};
use crate::tree::VNode;
use crate::widget::should_update;

/// Patch application failure. These are programming errors — a patch set
/// applied against a live tree it was not computed for — never transient
/// conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyError {
    /// A patched position resolved to no live node: the patch set is out of
    /// sync with the tree it is being applied to.
    MissingLiveNode { position: usize },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::MissingLiveNode { position } => {
                write!(f, "no live node at patched position {position}")
            }
        }
    }
}

impl std::error::Error for ApplyError {}

/// Applies `set` to the live tree rooted at `live_root`, returning the
/// (possibly new) root. The patch set must have been computed from the tree
/// value that `live_root` currently materializes.
pub fn apply(
    backend: &mut dyn Backend,
    live_root: LiveId,
    set: &PatchSet,
) -> Result<LiveId, ApplyError> {
    Ok(apply_set(backend, live_root, set)?.unwrap_or(live_root))
}

/// Inner apply that can report root removal; `EnterThunk` recursion needs
/// to distinguish "root replaced" from "root gone".
fn apply_set(
    backend: &mut dyn Backend,
    live_root: LiveId,
    set: &PatchSet,
) -> Result<Option<LiveId>, ApplyError> {
    let positions: Vec<usize> = set.positions().collect();
    if positions.is_empty() {
        return Ok(Some(live_root));
    }

    let located = locate(&*backend, live_root, set.root(), &positions);
    let mut root = Some(live_root);
    for position in positions {
        let Some(&node) = located.get(&position) else {
            return Err(ApplyError::MissingLiveNode { position });
        };
        if let Some(patches) = set.patches_at(position) {
            for patch in patches {
                let new_node = apply_patch(backend, patch, node)?;
                if root == Some(node) {
                    root = new_node;
                }
            }
        }
    }
    Ok(root)
}

/// Applies one patch to the live node at its position. Returns the node now
/// standing at that position, or `None` when the node was removed.
fn apply_patch(
    backend: &mut dyn Backend,
    patch: &Patch,
    node: LiveId,
) -> Result<Option<LiveId>, ApplyError> {
    match patch {
        Patch::Remove { prior } => {
            backend.detach(node);
            if let VNode::Widget(widget) = prior {
                widget.destroy(node, backend);
            }
            Ok(None)
        }
        Patch::Insert { next } => {
            let new = backend.materialize(next);
            backend.append_child(node, new);
            Ok(Some(node))
        }
        Patch::ReplaceText { next, .. } => {
            // In-place replacement keeps the live node's identity.
            if backend.set_text(node, &next.content) {
                Ok(Some(node))
            } else {
                let new = backend.materialize(&VNode::Text(Rc::clone(next)));
                splice(backend, node, new);
                Ok(Some(new))
            }
        }
        Patch::ReplaceNode { next, .. } => {
            let new = backend.materialize(&VNode::Element(Rc::clone(next)));
            splice(backend, node, new);
            Ok(Some(new))
        }
        Patch::UpdateWidget { prior, next } => {
            if let Some(prior) = prior {
                if should_update(&**prior, &**next) {
                    let new = next.update(&**prior, node, backend).unwrap_or(node);
                    if new != node {
                        splice(backend, node, new);
                    }
                    return Ok(Some(new));
                }
            }
            log::debug!("widget at live node {node} not update-compatible; replacing");
            let new = next.materialize(backend);
            if new != node {
                splice(backend, node, new);
            }
            if let Some(prior) = prior {
                prior.destroy(node, backend);
            }
            Ok(Some(new))
        }
        Patch::UpdateProps { prior, delta } => {
            backend.apply_props(node, delta, &prior.props);
            Ok(Some(node))
        }
        Patch::Reorder { moves } => {
            reorder_children(backend, node, moves);
            Ok(Some(node))
        }
        Patch::EnterThunk { nested } => {
            let new = apply_set(backend, node, nested)?;
            if let Some(new) = new {
                if new != node {
                    splice(backend, node, new);
                }
            }
            Ok(new)
        }
    }
}

/// Re-shuffles the children of `node`: removals against the shrinking child
/// list, keyed detachees remembered, then re-insertion at target positions.
fn reorder_children(backend: &mut dyn Backend, node: LiveId, moves: &Moves) {
    let mut remembered: HashMap<Rc<str>, LiveId> = HashMap::default();
    for removal in &moves.removes {
        let children = backend.children(node);
        // A removal referencing an already-removed child is a no-op.
        if let Some(&child) = children.get(removal.from) {
            if let Some(key) = &removal.key {
                remembered.insert(Rc::clone(key), child);
            }
            backend.detach(child);
        }
    }
    for insertion in &moves.inserts {
        // Keys with no remembered node arrived via a sibling insert patch
        // and already sit where they belong.
        if let Some(&child) = remembered.get(&insertion.key) {
            backend.insert_child(node, insertion.to, child);
        }
    }
}

/// Replaces `old` with `new` at the same position under `old`'s parent.
/// Detached nodes have no parent; the caller threads the root instead.
fn splice(backend: &mut dyn Backend, old: LiveId, new: LiveId) {
    let Some(parent) = backend.parent(old) else {
        return;
    };
    let index = backend.children(parent).iter().position(|&c| c == old);
    backend.detach(old);
    match index {
        Some(at) => backend.insert_child(parent, at, new),
        None => backend.append_child(parent, new),
    }
}
