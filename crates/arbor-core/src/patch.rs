//! Patch representation: the sparse edit set produced by diff and consumed
//! by apply.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smallvec::{smallvec, SmallVec};

use crate::props::PropDelta;
use crate::tree::{Element, Text, VNode};
use crate::widget::Widget;

/// One edit operation at a tree position.
///
/// Every variant except `Insert` and `Reorder` carries the prior tree value
/// it targets, so apply can run lifecycle effects (widget destroy, hook
/// unset) against the live node found at that position.
pub enum Patch {
    /// Detach the live node; destroy it if the prior value is a widget.
    Remove { prior: VNode },
    /// Materialize `next` and append it under the live node at this position.
    Insert { next: VNode },
    /// Swap text content in place when possible, else splice a new text node.
    ReplaceText { prior: VNode, next: Rc<Text> },
    /// Splice in a freshly materialized element.
    ReplaceNode { prior: VNode, next: Rc<Element> },
    /// Update-or-replace a widget; gating happens at apply time.
    UpdateWidget {
        prior: Option<Rc<dyn Widget>>,
        next: Rc<dyn Widget>,
    },
    /// Merge a property delta into the live node.
    UpdateProps { prior: Rc<Element>, delta: PropDelta },
    /// Re-shuffle keyed children of the live node at this position.
    Reorder { moves: Moves },
    /// Recurse into a nested patch set computed across a thunk boundary.
    EnterThunk { nested: PatchSet },
}

impl fmt::Debug for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Patch::Remove { prior } => f.debug_struct("Remove").field("prior", prior).finish(),
            Patch::Insert { next } => f.debug_struct("Insert").field("next", next).finish(),
            Patch::ReplaceText { next, .. } => f
                .debug_struct("ReplaceText")
                .field("next", &next.content)
                .finish(),
            Patch::ReplaceNode { next, .. } => f
                .debug_struct("ReplaceNode")
                .field("next", &next.tag)
                .finish(),
            Patch::UpdateWidget { prior, next } => f
                .debug_struct("UpdateWidget")
                .field("had_prior", &prior.is_some())
                .field("key", &next.key())
                .finish(),
            Patch::UpdateProps { delta, .. } => {
                f.debug_struct("UpdateProps").field("delta", delta).finish()
            }
            Patch::Reorder { moves } => f.debug_struct("Reorder").field("moves", moves).finish(),
            Patch::EnterThunk { nested } => f
                .debug_struct("EnterThunk")
                .field("positions", &nested.by_position.len())
                .finish(),
        }
    }
}

/// Remove/insert operations reaching a new sibling order, expressed against
/// the old live child ordering. Built once per diffed sibling list, consumed
/// once by apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Moves {
    pub removes: Vec<Removal>,
    pub inserts: Vec<Insertion>,
}

/// A removal against the live child list as it stands when the removal runs.
/// Keyed removals are remembered for re-insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Removal {
    pub from: usize,
    pub key: Option<Rc<str>>,
}

/// A re-insertion of a remembered keyed child at its target position in the
/// post-removal child list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insertion {
    pub key: Rc<str>,
    pub to: usize,
}

type PatchList = SmallVec<[Patch; 1]>;

/// The sparse edit set for one diff: the prior root it is defined against
/// plus an ordered map from pre-order position to that position's patches.
/// Positions with no change are absent.
#[derive(Debug)]
pub struct PatchSet {
    root: VNode,
    by_position: BTreeMap<usize, PatchList>,
}

impl PatchSet {
    pub(crate) fn new(root: VNode) -> Self {
        Self {
            root,
            by_position: BTreeMap::new(),
        }
    }

    /// The prior tree value this patch set's positions are defined against.
    pub fn root(&self) -> &VNode {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }

    /// Total number of patches across all positions.
    pub fn len(&self) -> usize {
        self.by_position.values().map(|list| list.len()).sum()
    }

    /// Patched positions in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_position.keys().copied()
    }

    pub fn patches_at(&self, position: usize) -> Option<&[Patch]> {
        self.by_position.get(&position).map(|list| list.as_slice())
    }

    pub(crate) fn push(&mut self, position: usize, patch: Patch) {
        self.by_position.entry(position).or_default().push(patch);
    }

    /// Installs `patch` as the only patch at `position`, discarding anything
    /// recorded there. Used when a thunk boundary collapses a position's
    /// edits into one nested patch set.
    pub(crate) fn replace(&mut self, position: usize, patch: Patch) {
        self.by_position.insert(position, smallvec![patch]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_iterate_ascending() {
        let mut set = PatchSet::new(VNode::text("root"));
        set.push(7, Patch::Insert { next: VNode::text("c") });
        set.push(2, Patch::Insert { next: VNode::text("a") });
        set.push(2, Patch::Insert { next: VNode::text("b") });
        assert_eq!(set.positions().collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.patches_at(2).map(|p| p.len()), Some(2));
    }

    #[test]
    fn replace_discards_earlier_patches() {
        let mut set = PatchSet::new(VNode::text("root"));
        set.push(0, Patch::Insert { next: VNode::text("a") });
        let nested = PatchSet::new(VNode::text("inner"));
        set.replace(0, Patch::EnterThunk { nested });
        let patches = set.patches_at(0).unwrap();
        assert_eq!(patches.len(), 1);
        assert!(matches!(patches[0], Patch::EnterThunk { .. }));
    }
}
