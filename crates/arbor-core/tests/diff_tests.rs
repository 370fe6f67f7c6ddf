use arbor_core::patch::Patch;
use arbor_core::props::{PropPatch, Props, PropValue};
use arbor_core::tree::VNode;
use arbor_core::{diff, diff_props};

use arbor_testing::{el, el_props, keyed, txt, CountingHook};

use std::cell::Cell;
use std::rc::Rc;

fn only_patch<'a>(set: &'a arbor_core::PatchSet, position: usize) -> &'a Patch {
    let patches = set
        .patches_at(position)
        .unwrap_or_else(|| panic!("no patches at position {position}"));
    assert_eq!(patches.len(), 1, "expected one patch at {position}");
    &patches[0]
}

#[test]
fn diff_against_self_is_empty() {
    let tree = el(
        "div",
        vec![el("span", vec![txt("a"), txt("b")]), txt("c")],
    );
    assert!(diff(&tree, &tree).is_empty());
}

#[test]
fn structurally_equal_trees_produce_no_patches() {
    let build = || {
        el_props(
            "div",
            Props::new().with("id", "root"),
            vec![el("span", vec![txt("a")])],
        )
    };
    assert!(diff(&build(), &build()).is_empty());
}

#[test]
fn unchanged_text_emits_no_patch() {
    // Deliberate behavior choice: equal text content is a no-op, not an
    // unconditional replace.
    let prior = el("div", vec![txt("same")]);
    let next = el("div", vec![txt("same")]);
    assert!(diff(&prior, &next).is_empty());
}

#[test]
fn changed_text_replaces_at_its_position() {
    let prior = el("div", vec![txt("old"), txt("keep")]);
    let next = el("div", vec![txt("new"), txt("keep")]);
    let set = diff(&prior, &next);
    assert_eq!(set.positions().collect::<Vec<_>>(), vec![1]);
    assert!(matches!(
        only_patch(&set, 1),
        Patch::ReplaceText { next, .. } if &*next.content == "new"
    ));
}

#[test]
fn tag_mismatch_replaces_the_node() {
    let prior = el("div", vec![]);
    let next = el("span", vec![]);
    let set = diff(&prior, &next);
    assert!(matches!(
        only_patch(&set, 0),
        Patch::ReplaceNode { next, .. } if &*next.tag == "span"
    ));
}

#[test]
fn key_mismatch_replaces_even_with_equal_tags() {
    let prior = keyed("li", "a", vec![]);
    let next = keyed("li", "b", vec![]);
    let set = diff(&prior, &next);
    assert!(matches!(only_patch(&set, 0), Patch::ReplaceNode { .. }));
}

#[test]
fn changed_props_update_in_place() {
    let prior = el_props("div", Props::new().with("color", "red"), vec![]);
    let next = el_props("div", Props::new().with("color", "blue"), vec![]);
    let set = diff(&prior, &next);
    let Patch::UpdateProps { delta, .. } = only_patch(&set, 0) else {
        panic!("expected a props update");
    };
    assert_eq!(
        delta.get("color"),
        Some(&PropPatch::Set(PropValue::from("blue")))
    );
}

#[test]
fn removed_prop_maps_to_unset_in_the_delta() {
    let prior = el_props("div", Props::new().with("color", "red"), vec![]);
    let next = el("div", vec![]);
    let set = diff(&prior, &next);
    let Patch::UpdateProps { delta, .. } = only_patch(&set, 0) else {
        panic!("expected a props update");
    };
    assert_eq!(delta.get("color"), Some(&PropPatch::Unset));
}

#[test]
fn extra_children_insert_under_the_parent() {
    let prior = el("div", vec![txt("a")]);
    let next = el("div", vec![txt("a"), txt("b"), txt("c")]);
    let set = diff(&prior, &next);
    let patches = set.patches_at(0).expect("inserts land on the parent");
    assert_eq!(patches.len(), 2);
    assert!(patches.iter().all(|p| matches!(p, Patch::Insert { .. })));
}

#[test]
fn missing_children_remove_at_their_positions() {
    let prior = el("div", vec![txt("a"), txt("b")]);
    let next = el("div", vec![txt("a")]);
    let set = diff(&prior, &next);
    assert_eq!(set.positions().collect::<Vec<_>>(), vec![2]);
    assert!(matches!(only_patch(&set, 2), Patch::Remove { .. }));
}

#[test]
fn keyed_shuffle_emits_a_reorder_on_the_parent() {
    let prior = el(
        "ul",
        vec![keyed("li", "a", vec![]), keyed("li", "b", vec![])],
    );
    let next = el(
        "ul",
        vec![keyed("li", "b", vec![]), keyed("li", "a", vec![])],
    );
    let set = diff(&prior, &next);
    let patches = set.patches_at(0).expect("reorder lands on the parent");
    assert!(patches
        .iter()
        .any(|p| matches!(p, Patch::Reorder { .. })));
}

#[test]
fn keyless_children_never_emit_reorder() {
    let prior = el("ul", vec![txt("a"), txt("b")]);
    let next = el("ul", vec![txt("b"), txt("a")]);
    let set = diff(&prior, &next);
    for position in set.positions().collect::<Vec<_>>() {
        for patch in set.patches_at(position).unwrap() {
            assert!(!matches!(patch, Patch::Reorder { .. }));
        }
    }
}

#[test]
fn replacing_a_subtree_tears_down_hooks_and_widgets() {
    use arbor_testing::{CountingWidget, WidgetStats};

    let (_, hook) = CountingHook::new(true);
    let stats = WidgetStats::shared();
    // Positions: div 0, span 1, widget 2.
    let prior = el(
        "div",
        vec![
            el_props("span", Props::new().with("focus", hook), vec![]),
            CountingWidget::node("w", None, &stats),
        ],
    );
    let next = txt("flat");
    let set = diff(&prior, &next);

    assert_eq!(set.positions().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(matches!(only_patch(&set, 0), Patch::ReplaceText { .. }));
    let Patch::UpdateProps { delta, .. } = only_patch(&set, 1) else {
        panic!("expected the hook unset sweep at the span");
    };
    assert_eq!(delta.get("focus"), Some(&PropPatch::Unset));
    assert!(matches!(only_patch(&set, 2), Patch::Remove { .. }));
}

#[test]
fn hooks_without_teardown_are_not_swept() {
    let (_, hook) = CountingHook::new(false);
    let prior = el(
        "div",
        vec![el_props("span", Props::new().with("probe", hook), vec![])],
    );
    let next = txt("flat");
    let set = diff(&prior, &next);
    assert_eq!(set.positions().collect::<Vec<_>>(), vec![0]);
}

#[test]
fn widget_diff_carries_the_prior_widget() {
    use arbor_testing::{CountingWidget, WidgetStats};

    let stats = WidgetStats::shared();
    let prior = el("div", vec![CountingWidget::node("w", Some("x"), &stats)]);
    let next = el("div", vec![CountingWidget::node("w", Some("x"), &stats)]);
    let set = diff(&prior, &next);
    let Patch::UpdateWidget { prior, .. } = only_patch(&set, 1) else {
        panic!("expected a widget update");
    };
    assert!(prior.is_some());
}

#[test]
fn widget_replacing_an_element_has_no_prior() {
    use arbor_testing::{CountingWidget, WidgetStats};

    let stats = WidgetStats::shared();
    let prior = el("div", vec![el("span", vec![])]);
    let next = el("div", vec![CountingWidget::node("w", None, &stats)]);
    let set = diff(&prior, &next);
    let Patch::UpdateWidget { prior, .. } = only_patch(&set, 1) else {
        panic!("expected a widget update");
    };
    assert!(prior.is_none());
}

#[test]
fn differing_thunks_wrap_their_edits_in_enter_thunk() {
    let prior = VNode::thunk(|_| txt("old"));
    let next = VNode::thunk(|_| txt("new"));
    let set = diff(&prior, &next);
    let Patch::EnterThunk { nested } = only_patch(&set, 0) else {
        panic!("expected a thunk patch");
    };
    assert!(!nested.is_empty());
}

#[test]
fn equal_thunk_renders_produce_no_patch() {
    let shared = txt("same");
    let a = shared.clone();
    let b = shared.clone();
    let prior = VNode::thunk(move |_| a.clone());
    let next = VNode::thunk(move |_| b.clone());
    assert!(diff(&prior, &next).is_empty());
}

#[test]
fn thunk_renders_at_most_once_across_diffs() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let prior = VNode::thunk(move |_| {
        counter.set(counter.get() + 1);
        txt("value")
    });
    let next = txt("value");
    diff(&prior, &next);
    diff(&prior, &next);
    diff(&prior, &next);
    assert_eq!(calls.get(), 1);
}

#[test]
fn nested_dict_prop_diff_reaches_the_patch() {
    let mut style_a = arbor_core::collections::map::HashMap::default();
    style_a.insert("width".to_string(), PropValue::from("10px"));
    let mut style_b = arbor_core::collections::map::HashMap::default();
    style_b.insert("width".to_string(), PropValue::from("20px"));

    let prior = Props::new().with("style", PropValue::Dict(style_a));
    let next = Props::new().with("style", PropValue::Dict(style_b));
    let delta = diff_props(&prior, &next);
    assert!(matches!(delta.get("style"), Some(PropPatch::Merge(_))));
}
