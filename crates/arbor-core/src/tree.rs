//! Immutable tree value model.
//!
//! A [`VNode`] is a cheap, structurally comparable description of a subtree.
//! It is a closed sum over four variants; the diff engine's case analysis is
//! an exhaustive match, so adding a variant is a deliberate API change.
//!
//! Element nodes cache their subtree shape at construction (`descendant_count`
//! and the widget/thunk/hook descendant flags). The count invariant — an
//! element's `descendant_count` equals the sum over children of
//! `1 + child.descendant_count()` — is what makes position-range pruning in
//! the sparse node index sound.

use std::fmt;
use std::rc::Rc;

use crate::props::Props;
use crate::thunk::Thunk;
use crate::widget::Widget;

/// An immutable tree value. Cloning clones the inner `Rc`, preserving the
/// reference identity that [`VNode::same`] tests.
#[derive(Clone)]
pub enum VNode {
    Element(Rc<Element>),
    Text(Rc<Text>),
    Widget(Rc<dyn Widget>),
    Thunk(Rc<Thunk>),
}

/// An element node: tag, properties, ordered children, optional sibling key.
#[derive(Debug)]
pub struct Element {
    pub tag: Rc<str>,
    pub key: Option<Rc<str>>,
    pub props: Props,
    pub children: Vec<VNode>,

    // Derived at construction, never recomputed.
    descendant_count: usize,
    has_widget_descendant: bool,
    has_thunk_descendant: bool,
    has_unhookable_descendant: bool,
    local_hooks: Vec<String>,
}

impl Element {
    pub fn new(tag: impl Into<Rc<str>>, props: Props, children: Vec<VNode>) -> Rc<Self> {
        Self::with_key(tag, props, children, None)
    }

    pub fn with_key(
        tag: impl Into<Rc<str>>,
        props: Props,
        children: Vec<VNode>,
        key: Option<Rc<str>>,
    ) -> Rc<Self> {
        let mut descendant_count = 0;
        let mut has_widget_descendant = false;
        let mut has_thunk_descendant = false;
        let mut has_unhookable_descendant = false;

        for child in &children {
            descendant_count += 1 + child.descendant_count();
            match child {
                VNode::Element(child) => {
                    has_widget_descendant |= child.has_widget_descendant;
                    has_thunk_descendant |= child.has_thunk_descendant;
                    has_unhookable_descendant |=
                        child.has_unhookable_descendant || !child.local_hooks.is_empty();
                }
                VNode::Widget(_) => has_widget_descendant = true,
                VNode::Thunk(_) => has_thunk_descendant = true,
                VNode::Text(_) => {}
            }
        }

        let local_hooks = props.unhookable_keys();

        Rc::new(Self {
            tag: tag.into(),
            key,
            props,
            children,
            descendant_count,
            has_widget_descendant,
            has_thunk_descendant,
            has_unhookable_descendant,
            local_hooks,
        })
    }

    /// Immediate child count.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Total nodes in this subtree, excluding the element itself.
    pub fn descendant_count(&self) -> usize {
        self.descendant_count
    }

    pub fn has_widget_descendant(&self) -> bool {
        self.has_widget_descendant
    }

    pub fn has_thunk_descendant(&self) -> bool {
        self.has_thunk_descendant
    }

    pub fn has_unhookable_descendant(&self) -> bool {
        self.has_unhookable_descendant
    }

    /// Keys of this node's own properties holding hooks that require
    /// explicit teardown.
    pub fn local_hooks(&self) -> &[String] {
        &self.local_hooks
    }
}

/// A text leaf.
#[derive(Debug)]
pub struct Text {
    pub content: Rc<str>,
    pub key: Option<Rc<str>>,
}

impl Text {
    pub fn new(content: impl Into<Rc<str>>) -> Rc<Self> {
        Rc::new(Self {
            content: content.into(),
            key: None,
        })
    }

    pub fn with_key(content: impl Into<Rc<str>>, key: impl Into<Rc<str>>) -> Rc<Self> {
        Rc::new(Self {
            content: content.into(),
            key: Some(key.into()),
        })
    }
}

impl VNode {
    pub fn element(tag: impl Into<Rc<str>>, props: Props, children: Vec<VNode>) -> Self {
        VNode::Element(Element::new(tag, props, children))
    }

    pub fn keyed_element(
        tag: impl Into<Rc<str>>,
        key: impl Into<Rc<str>>,
        props: Props,
        children: Vec<VNode>,
    ) -> Self {
        VNode::Element(Element::with_key(tag, props, children, Some(key.into())))
    }

    pub fn text(content: impl Into<Rc<str>>) -> Self {
        VNode::Text(Text::new(content))
    }

    pub fn widget(widget: Rc<dyn Widget>) -> Self {
        VNode::Widget(widget)
    }

    pub fn thunk(render: impl Fn(Option<&VNode>) -> VNode + 'static) -> Self {
        VNode::Thunk(Thunk::new(render))
    }

    /// Reference identity: true iff both values are the same allocation.
    /// This is the cheap "no change" signal for memoized subtrees.
    pub fn same(a: &VNode, b: &VNode) -> bool {
        match (a, b) {
            (VNode::Element(x), VNode::Element(y)) => Rc::ptr_eq(x, y),
            (VNode::Text(x), VNode::Text(y)) => Rc::ptr_eq(x, y),
            (VNode::Widget(x), VNode::Widget(y)) => Rc::ptr_eq(x, y),
            (VNode::Thunk(x), VNode::Thunk(y)) => Rc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// The reconciliation key, if any. Widget keys come from the widget's
    /// own capability; thunks are unkeyed.
    pub fn key(&self) -> Option<Rc<str>> {
        match self {
            VNode::Element(e) => e.key.clone(),
            VNode::Text(t) => t.key.clone(),
            VNode::Widget(w) => w.key().map(Rc::from),
            VNode::Thunk(_) => None,
        }
    }

    /// Width of this node's contiguous position range, excluding the node
    /// itself. Zero for every non-element variant.
    pub fn descendant_count(&self) -> usize {
        match self {
            VNode::Element(e) => e.descendant_count,
            _ => 0,
        }
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Element(e) => f
                .debug_struct("Element")
                .field("tag", &e.tag)
                .field("key", &e.key)
                .field("children", &e.children.len())
                .finish(),
            VNode::Text(t) => f.debug_tuple("Text").field(&t.content).finish(),
            VNode::Widget(w) => f.debug_tuple("Widget").field(&w.key()).finish(),
            VNode::Thunk(t) => f
                .debug_struct("Thunk")
                .field("rendered", &t.has_rendered())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendant_count_matches_subtree_size() {
        let tree = VNode::element(
            "div",
            Props::new(),
            vec![
                VNode::element(
                    "span",
                    Props::new(),
                    vec![VNode::text("a"), VNode::text("b")],
                ),
                VNode::text("c"),
            ],
        );
        let VNode::Element(root) = &tree else { unreachable!() };
        assert_eq!(root.child_count(), 2);
        assert_eq!(root.descendant_count(), 4);

        let VNode::Element(span) = &root.children[0] else { unreachable!() };
        assert_eq!(
            root.descendant_count(),
            root.children
                .iter()
                .map(|c| 1 + c.descendant_count())
                .sum::<usize>()
        );
        assert_eq!(span.descendant_count(), 2);
    }

    #[test]
    fn same_is_reference_identity() {
        let a = VNode::text("x");
        let b = a.clone();
        let c = VNode::text("x");
        assert!(VNode::same(&a, &b));
        assert!(!VNode::same(&a, &c));
    }

    #[test]
    fn descendant_flags_propagate() {
        let thunk_leaf = VNode::thunk(|_| VNode::text("t"));
        let tree = VNode::element(
            "div",
            Props::new(),
            vec![VNode::element("span", Props::new(), vec![thunk_leaf])],
        );
        let VNode::Element(root) = &tree else { unreachable!() };
        assert!(root.has_thunk_descendant());
        assert!(!root.has_widget_descendant());
        assert!(!root.has_unhookable_descendant());
    }
}
