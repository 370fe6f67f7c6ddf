//! Deferred, memoized tree values.

use std::cell::OnceCell;
use std::rc::Rc;

use crate::tree::VNode;

/// A deferred tree value computation, evaluated at most once.
///
/// The render closure must be pure with respect to everything except this
/// memo: forcing a thunk a second time returns the cached value and never
/// re-invokes the closure. The forced value must not itself be a thunk.
pub struct Thunk {
    render: Box<dyn Fn(Option<&VNode>) -> VNode>,
    forced: OnceCell<VNode>,
}

impl Thunk {
    pub fn new(render: impl Fn(Option<&VNode>) -> VNode + 'static) -> Rc<Self> {
        Rc::new(Self {
            render: Box::new(render),
            forced: OnceCell::new(),
        })
    }

    /// Forces the thunk against the prior tree value it is replacing, or
    /// `None` when there is no predecessor. Idempotent after the first call.
    pub fn force(&self, prior: Option<&VNode>) -> VNode {
        self.forced
            .get_or_init(|| {
                let value = (self.render)(prior);
                debug_assert!(
                    !matches!(value, VNode::Thunk(_)),
                    "a thunk's render must produce a forced tree value"
                );
                value
            })
            .clone()
    }

    pub fn has_rendered(&self) -> bool {
        self.forced.get().is_some()
    }
}

/// Resolves a prior/next pair to forced tree values ahead of a nested diff.
///
/// The next side forces first and receives the raw prior value (forced or
/// not), so a render function can inspect what it is replacing; the prior
/// side then forces against `None`. Memoized thunks hand back their cache.
pub(crate) fn handle_thunk(a: &VNode, b: Option<&VNode>) -> (VNode, Option<VNode>) {
    let forced_b = b.map(|next| match next {
        VNode::Thunk(thunk) => thunk.force(Some(a)),
        _ => next.clone(),
    });
    let forced_a = match a {
        VNode::Thunk(thunk) => thunk.force(None),
        _ => a.clone(),
    };
    (forced_a, forced_b)
}
