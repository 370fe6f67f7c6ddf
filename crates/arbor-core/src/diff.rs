//! Tree comparison.
//!
//! `diff` walks two immutable tree values in lockstep and produces a sparse
//! patch set addressed by pre-order position. Positions are defined only in
//! terms of the prior tree's shape, so the patch set can be interpreted
//! against any live tree materialized from that prior value.

use crate::patch::{Patch, PatchSet};
use crate::props::{diff_props, PropDelta};
use crate::reorder::reorder;
use crate::thunk::handle_thunk;
use crate::tree::{Element, VNode};
use crate::widget::as_widget;

/// Computes the edit set transforming `prior` into `next`.
pub fn diff(prior: &VNode, next: &VNode) -> PatchSet {
    diff_against(prior, Some(next))
}

/// Diff where the next side may be absent (a deletion of the whole subtree).
/// Nested thunk diffs and the teardown sweep use the absent form directly.
fn diff_against(prior: &VNode, next: Option<&VNode>) -> PatchSet {
    let mut set = PatchSet::new(prior.clone());
    walk(prior, next, &mut set, 0);
    set
}

fn walk(a: &VNode, b: Option<&VNode>, set: &mut PatchSet, position: usize) {
    if let Some(b) = b {
        if VNode::same(a, b) {
            return;
        }
    }

    // Thunks on either side collapse this position into one nested diff.
    if matches!(a, VNode::Thunk(_)) || matches!(b, Some(VNode::Thunk(_))) {
        diff_thunk(a, b, set, position);
        return;
    }

    match b {
        None => {
            // A widget's own removal carries its lifecycle; anything else
            // must first tear down the hooks and widgets inside it.
            if !matches!(a, VNode::Widget(_)) {
                clear_state(a, set, position);
            }
            set.push(position, Patch::Remove { prior: a.clone() });
        }
        Some(VNode::Element(next)) => match a {
            VNode::Element(prior) if prior.tag == next.tag && prior.key == next.key => {
                let delta = diff_props(&prior.props, &next.props);
                if !delta.is_empty() {
                    set.push(
                        position,
                        Patch::UpdateProps {
                            prior: prior.clone(),
                            delta,
                        },
                    );
                }
                diff_children(prior, next, set, position);
            }
            _ => {
                set.push(
                    position,
                    Patch::ReplaceNode {
                        prior: a.clone(),
                        next: next.clone(),
                    },
                );
                clear_state(a, set, position);
            }
        },
        Some(VNode::Text(next)) => match a {
            VNode::Text(prior) => {
                // Unchanged text emits nothing; node identity is preserved
                // without a patch. Covered by an explicit test.
                if prior.content != next.content {
                    set.push(
                        position,
                        Patch::ReplaceText {
                            prior: a.clone(),
                            next: next.clone(),
                        },
                    );
                }
            }
            _ => {
                set.push(
                    position,
                    Patch::ReplaceText {
                        prior: a.clone(),
                        next: next.clone(),
                    },
                );
                clear_state(a, set, position);
            }
        },
        Some(VNode::Widget(next)) => {
            let prior_widget = as_widget(a);
            let was_widget = prior_widget.is_some();
            set.push(
                position,
                Patch::UpdateWidget {
                    prior: prior_widget,
                    next: next.clone(),
                },
            );
            if !was_widget {
                clear_state(a, set, position);
            }
        }
        // Handled by the thunk check above.
        Some(VNode::Thunk(_)) => unreachable!("thunks are forced before variant dispatch"),
    }
}

/// Forces both sides across a thunk boundary and wraps the nested diff as a
/// single `EnterThunk` patch, replacing whatever was recorded here.
fn diff_thunk(a: &VNode, b: Option<&VNode>, set: &mut PatchSet, position: usize) {
    let (forced_a, forced_b) = handle_thunk(a, b);
    let nested = diff_against(&forced_a, forced_b.as_ref());
    if !nested.is_empty() {
        set.replace(position, Patch::EnterThunk { nested });
    }
}

fn diff_children(a: &Element, b: &Element, set: &mut PatchSet, parent: usize) {
    let ordered = reorder(&a.children, &b.children);
    let len = a.children.len().max(ordered.aligned.len());

    let mut position = parent;
    for i in 0..len {
        let left = a.children.get(i);
        let right = ordered.aligned.get(i).and_then(|slot| slot.as_ref());
        position += 1;
        match left {
            None => {
                // Excess new children attach under the parent.
                if let Some(right) = right {
                    set.push(
                        parent,
                        Patch::Insert {
                            next: right.clone(),
                        },
                    );
                }
            }
            Some(left) => walk(left, right, set, position),
        }
        if let Some(left) = left {
            position += left.descendant_count();
        }
    }

    if let Some(moves) = ordered.moves {
        set.push(parent, Patch::Reorder { moves });
    }
}

/// Teardown sweep run over a subtree that is leaving the live tree: unsets
/// hooks that demand it and records widget removals so apply can hand their
/// live nodes to `destroy`. Descends only where the construction-time flags
/// say there is work, which keeps deletions from re-walking whole subtrees.
fn clear_state(node: &VNode, set: &mut PatchSet, position: usize) {
    unhook(node, set, position);
    destroy_widgets(node, set, position);
}

fn unhook(node: &VNode, set: &mut PatchSet, position: usize) {
    match node {
        VNode::Element(element) => {
            if !element.local_hooks().is_empty() {
                set.push(
                    position,
                    Patch::UpdateProps {
                        prior: element.clone(),
                        delta: PropDelta::unset_all(element.local_hooks().to_vec()),
                    },
                );
            }
            if element.has_unhookable_descendant() || element.has_thunk_descendant() {
                descend(&element.children, position, |child, position| {
                    unhook(child, set, position)
                });
            }
        }
        VNode::Thunk(_) => diff_thunk(node, None, set, position),
        _ => {}
    }
}

fn destroy_widgets(node: &VNode, set: &mut PatchSet, position: usize) {
    match node {
        VNode::Widget(_) => set.push(
            position,
            Patch::Remove {
                prior: node.clone(),
            },
        ),
        VNode::Element(element)
            if element.has_widget_descendant() || element.has_thunk_descendant() =>
        {
            descend(&element.children, position, |child, position| {
                destroy_widgets(child, set, position)
            });
        }
        VNode::Thunk(_) => diff_thunk(node, None, set, position),
        _ => {}
    }
}

/// Visits children with the same position arithmetic as the main walk.
fn descend(children: &[VNode], parent: usize, mut visit: impl FnMut(&VNode, usize)) {
    let mut position = parent;
    for child in children {
        position += 1;
        visit(child, position);
        position += child.descendant_count();
    }
}
