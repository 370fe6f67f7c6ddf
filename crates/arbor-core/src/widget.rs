//! Opaque externally-managed tree units.

use std::any::Any;

use crate::backend::{Backend, LiveId};
use crate::tree::VNode;

/// An externally-defined unit the diff engine never looks inside.
///
/// The engine only ever decides keep-and-update versus replace-and-destroy,
/// and it defers even that to apply time via [`should_update`]. Everything
/// the widget does to the live tree goes through the backend it is handed.
pub trait Widget: Any {
    /// Reconciliation key. Two widgets with equal keys are always update
    /// compatible, whatever their concrete types.
    fn key(&self) -> Option<&str> {
        None
    }

    /// Produces the live node for this widget.
    fn materialize(&self, backend: &mut dyn Backend) -> LiveId;

    /// Updates the live node produced by a compatible prior widget.
    /// Returning `None` keeps the existing live node.
    fn update(&self, prior: &dyn Widget, live: LiveId, backend: &mut dyn Backend)
        -> Option<LiveId>;

    /// Tears down the live node when this widget leaves the tree.
    fn destroy(&self, live: LiveId, backend: &mut dyn Backend);

    fn as_any(&self) -> &dyn Any;
}

/// Update gating: equal keys, or — absent keys on both sides — the same
/// concrete widget type (the analogue of "same materialize function").
pub fn should_update(prior: &dyn Widget, next: &dyn Widget) -> bool {
    match (prior.key(), next.key()) {
        (Some(a), Some(b)) => a == b,
        (None, None) => prior.as_any().type_id() == next.as_any().type_id(),
        _ => false,
    }
}

/// Widgets that survived the diff are carried in the patch set so apply can
/// run lifecycle methods against a live node reference.
pub(crate) fn as_widget(node: &VNode) -> Option<std::rc::Rc<dyn Widget>> {
    match node {
        VNode::Widget(w) => Some(std::rc::Rc::clone(w)),
        _ => None,
    }
}
