//! Keyed child reconciliation.
//!
//! Aligns a new sibling list against an old one so the diff walk can compare
//! position-by-position, and derives the remove/insert operations a live
//! tree must perform to reach the new order. Lists without keys on either
//! side skip reconciliation entirely and diff purely positionally.
//!
//! Duplicate keys within one sibling list are resolved last-one-wins in the
//! key index; the result is deterministic but such lists are malformed input.

use std::rc::Rc;

use crate::collections::map::HashMap;
use crate::patch::{Insertion, Moves, Removal};
use crate::tree::VNode;

pub(crate) struct Reordered {
    /// `new_children` permuted and padded with `None` deletion placeholders
    /// so slot *i* diffs against `old_children[i]`.
    pub aligned: Vec<Option<VNode>>,
    /// Live-tree move operations, or `None` when per-position patches
    /// already reach the target order.
    pub moves: Option<Moves>,
}

pub(crate) fn reorder(old_children: &[VNode], new_children: &[VNode]) -> Reordered {
    let (new_keys, new_free) = key_index(new_children);
    if new_free.len() == new_children.len() {
        return positional(new_children);
    }
    let (old_keys, old_free) = key_index(old_children);
    if old_free.len() == old_children.len() {
        return positional(new_children);
    }

    // Match old slots: keyed items pair with their key's new position,
    // unkeyed items consume the new list's free slots in order. Slots with
    // no match become deletion placeholders.
    let mut aligned: Vec<Option<VNode>> = Vec::with_capacity(old_children.len());
    let mut free_index = 0;
    let mut deleted = 0;
    for old_child in old_children {
        if let Some(key) = old_child.key() {
            if let Some(&idx) = new_keys.get(&key) {
                aligned.push(Some(new_children[idx].clone()));
            } else {
                deleted += 1;
                aligned.push(None);
            }
        } else if free_index < new_free.len() {
            aligned.push(Some(new_children[new_free[free_index]].clone()));
            free_index += 1;
        } else {
            deleted += 1;
            aligned.push(None);
        }
    }

    // Append new items with no old counterpart: never-seen keys, plus
    // unkeyed items beyond the free slots already consumed.
    let last_free_index = if free_index >= new_free.len() {
        new_children.len()
    } else {
        new_free[free_index]
    };
    for (j, new_child) in new_children.iter().enumerate() {
        if let Some(key) = new_child.key() {
            if !old_keys.contains_key(&key) {
                aligned.push(Some(new_child.clone()));
            }
        } else if j >= last_free_index {
            aligned.push(Some(new_child.clone()));
        }
    }

    let moves = simulate_moves(&aligned, new_children, &new_keys, deleted);
    Reordered { aligned, moves }
}

fn positional(new_children: &[VNode]) -> Reordered {
    Reordered {
        aligned: new_children.iter().cloned().map(Some).collect(),
        moves: None,
    }
}

/// Mutates a working copy of the aligned list into the exact new order,
/// recording every remove and insert it takes to get there.
fn simulate_moves(
    aligned: &[Option<VNode>],
    new_children: &[VNode],
    new_keys: &HashMap<Rc<str>, usize>,
    deleted: usize,
) -> Option<Moves> {
    let mut simulate: Vec<Option<VNode>> = aligned.to_vec();
    let mut simulate_index = 0usize;
    let mut removes: Vec<Removal> = Vec::new();
    let mut inserts: Vec<Insertion> = Vec::new();

    let mut k = 0usize;
    while k < new_children.len() {
        // Deletion placeholders at the cursor leave the live tree now.
        while simulate
            .get(simulate_index)
            .is_some_and(|slot| slot.is_none())
        {
            simulate.remove(simulate_index);
            removes.push(Removal {
                from: simulate_index,
                key: None,
            });
        }

        let wanted_key = new_children[k].key();
        let sim_present = simulate_index < simulate.len();
        let sim_key = simulate
            .get(simulate_index)
            .and_then(|slot| slot.as_ref())
            .and_then(|node| node.key());

        if !sim_present || sim_key != wanted_key {
            if let Some(wanted) = wanted_key {
                match sim_key {
                    // A keyed item blocks the slot. If it is wanted
                    // immediately next, insert in front of it; otherwise
                    // move it out of the way for later re-insertion.
                    Some(sim) if new_keys.get(&sim) != Some(&(k + 1)) => {
                        simulate.remove(simulate_index);
                        removes.push(Removal {
                            from: simulate_index,
                            key: Some(sim),
                        });
                        let now_key = simulate
                            .get(simulate_index)
                            .and_then(|slot| slot.as_ref())
                            .and_then(|node| node.key());
                        if now_key.as_ref() == Some(&wanted) {
                            simulate_index += 1;
                        } else {
                            inserts.push(Insertion { key: wanted, to: k });
                        }
                    }
                    _ => {
                        inserts.push(Insertion { key: wanted, to: k });
                    }
                }
                k += 1;
            } else if sim_key.is_some() {
                simulate.remove(simulate_index);
                removes.push(Removal {
                    from: simulate_index,
                    key: sim_key,
                });
            } else {
                // Unkeyed wanted item with nothing simulated left to
                // consume; it arrives via an insert patch instead.
                k += 1;
            }
        } else {
            simulate_index += 1;
            k += 1;
        }
    }

    // Whatever the simulation still holds has no place in the new order.
    while simulate_index < simulate.len() {
        let key = simulate[simulate_index]
            .as_ref()
            .and_then(|node| node.key());
        simulate.remove(simulate_index);
        removes.push(Removal {
            from: simulate_index,
            key,
        });
    }

    // Pure deletions are already covered by per-position remove patches.
    if inserts.is_empty() && removes.len() == deleted {
        log::trace!("reorder collapsed: {deleted} removals need no explicit moves");
        return None;
    }
    Some(Moves { removes, inserts })
}

fn key_index(children: &[VNode]) -> (HashMap<Rc<str>, usize>, Vec<usize>) {
    let mut keys = HashMap::default();
    let mut free = Vec::new();
    for (i, child) in children.iter().enumerate() {
        match child.key() {
            Some(key) => {
                keys.insert(key, i);
            }
            None => free.push(i),
        }
    }
    (keys, free)
}
