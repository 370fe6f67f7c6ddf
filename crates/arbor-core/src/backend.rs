//! The live tree boundary.
//!
//! The engine never owns a live tree; it drives one through this trait.
//! A backend supplies the two renderer capabilities (materialization and
//! property application) plus the structural operations apply needs. Ids
//! stay valid while a node exists, attached or not, so patches computed
//! before any mutation can keep addressing nodes they detach along the way.

use std::any::Any;

use crate::props::{PropDelta, Props};
use crate::tree::VNode;

/// Identifies a live node within its backend.
pub type LiveId = usize;

pub trait Backend: Any {
    /// Produces a live node mirroring the tree value: matching tag with
    /// recursively materialized children for elements, a text node for text
    /// leaves, the widget's own capability for widgets, and the forced
    /// value for thunks.
    fn materialize(&mut self, tree: &VNode) -> LiveId;

    /// Merges a property delta into the live node. `prior` is the previous
    /// property map, consulted for unset semantics (hook detach).
    fn apply_props(&mut self, node: LiveId, delta: &PropDelta, prior: &Props);

    fn parent(&self, node: LiveId) -> Option<LiveId>;

    /// Immediate children in order. Empty for leaves and unknown ids.
    fn children(&self, node: LiveId) -> Vec<LiveId>;

    fn append_child(&mut self, parent: LiveId, child: LiveId);

    /// Inserts at `index`, clamping past-the-end indices to an append. A
    /// child attached elsewhere is detached first.
    fn insert_child(&mut self, parent: LiveId, index: usize, child: LiveId);

    /// Unlinks the node from its parent. A no-op for detached nodes.
    fn detach(&mut self, node: LiveId);

    /// Replaces text content in place. Returns false when the node is not
    /// text-kind, in which case the caller splices in a replacement.
    fn set_text(&mut self, node: LiveId, content: &str) -> bool;

    fn is_text(&self, node: LiveId) -> bool;

    fn as_any(&self) -> &dyn Any
    where
        Self: Sized,
    {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any
    where
        Self: Sized,
    {
        self
    }
}
