//! Sparse node index.
//!
//! Positions are pre-order numbers derived from the prior tree's shape: the
//! root is 0 and a node's k-th child starts after the full ranges of the
//! children before it. Nothing stores these numbers; a traversal recomputes
//! them from the cached descendant counts, so they are always consistent
//! with whichever tree value is being interpreted.

use crate::backend::{Backend, LiveId};
use crate::collections::map::HashMap;
use crate::tree::VNode;

/// Resolves the requested positions to live nodes by co-walking the live
/// tree and the prior tree value it was materialized from.
///
/// Subtrees whose full position range contains none of the requested
/// positions are pruned without visiting their live nodes, so the cost is
/// proportional to the number of patched positions and tree depth, not to
/// total tree size. `positions` must be sorted ascending.
pub fn locate(
    backend: &dyn Backend,
    live_root: LiveId,
    tree: &VNode,
    positions: &[usize],
) -> HashMap<usize, LiveId> {
    let mut nodes = HashMap::default();
    if positions.is_empty() {
        return nodes;
    }
    debug_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    recurse(backend, live_root, tree, positions, &mut nodes, 0);
    nodes
}

fn recurse(
    backend: &dyn Backend,
    live: LiveId,
    tree: &VNode,
    positions: &[usize],
    nodes: &mut HashMap<usize, LiveId>,
    root_position: usize,
) {
    if index_in_range(positions, root_position, root_position) {
        nodes.insert(root_position, live);
    }

    let VNode::Element(element) = tree else {
        return;
    };
    if element.child_count() == 0 {
        return;
    }

    let live_children = backend.children(live);
    let mut position = root_position;
    for (i, child) in element.children.iter().enumerate() {
        position += 1;
        let end = position + child.descendant_count();
        if index_in_range(positions, position, end) {
            if let Some(&live_child) = live_children.get(i) {
                recurse(backend, live_child, child, positions, nodes, position);
            }
        }
        position = end;
    }
}

/// True when any requested position falls within `[left, right]`.
fn index_in_range(positions: &[usize], left: usize, right: usize) -> bool {
    match positions.binary_search(&left) {
        Ok(_) => true,
        Err(i) => positions.get(i).is_some_and(|&p| p <= right),
    }
}
