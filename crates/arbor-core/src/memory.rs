//! In-memory live tree backend.
//!
//! Nodes live in a slot arena and keep parent/child links; detaching a node
//! unlinks it without invalidating its id, which is what patch application
//! relies on when it tears down subtrees it located earlier.

use std::rc::Rc;

use crate::backend::{Backend, LiveId};
use crate::collections::map::HashMap;
use crate::props::{PropDelta, PropPatch, PropValue, Props};
use crate::tree::VNode;

#[derive(Debug)]
pub enum MemoryNode {
    Element {
        tag: Rc<str>,
        props: Props,
        parent: Option<LiveId>,
        children: Vec<LiveId>,
    },
    Text {
        content: String,
        parent: Option<LiveId>,
    },
}

#[derive(Default)]
pub struct MemoryBackend {
    nodes: Vec<Option<MemoryNode>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: LiveId) -> Option<&MemoryNode> {
        self.nodes.get(id).and_then(|slot| slot.as_ref())
    }

    fn node_mut(&mut self, id: LiveId) -> Option<&mut MemoryNode> {
        self.nodes.get_mut(id).and_then(|slot| slot.as_mut())
    }

    /// Live nodes currently allocated, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn alloc(&mut self, node: MemoryNode) -> LiveId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        id
    }

    fn set_parent(&mut self, child: LiveId, parent: Option<LiveId>) {
        if let Some(node) = self.node_mut(child) {
            match node {
                MemoryNode::Element { parent: slot, .. } => *slot = parent,
                MemoryNode::Text { parent: slot, .. } => *slot = parent,
            }
        }
    }

    pub fn dump_tree(&self, root: Option<LiveId>) -> String {
        let mut output = String::new();
        if let Some(root) = root {
            self.dump_node(&mut output, root, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: LiveId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.node(id) {
            Some(MemoryNode::Element { tag, children, .. }) => {
                output.push_str(&format!("{indent}[{id}] <{tag}>\n"));
                for &child in children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            Some(MemoryNode::Text { content, .. }) => {
                output.push_str(&format!("{indent}[{id}] {content:?}\n"));
            }
            None => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }

    fn attach_hooks(&mut self, node: LiveId, props: &Props) {
        let hooks: Vec<(String, Rc<dyn crate::props::Hook>)> = props
            .iter()
            .filter_map(|(key, value)| match value {
                PropValue::Hook(hook) => Some((key.clone(), Rc::clone(hook))),
                _ => None,
            })
            .collect();
        for (key, hook) in hooks {
            hook.attach(self, node, &key);
        }
    }
}

impl Backend for MemoryBackend {
    fn materialize(&mut self, tree: &VNode) -> LiveId {
        match tree {
            VNode::Element(element) => {
                let id = self.alloc(MemoryNode::Element {
                    tag: Rc::clone(&element.tag),
                    props: element.props.clone(),
                    parent: None,
                    children: Vec::new(),
                });
                self.attach_hooks(id, &element.props);
                for child in &element.children {
                    let child_id = self.materialize(child);
                    self.append_child(id, child_id);
                }
                id
            }
            VNode::Text(text) => self.alloc(MemoryNode::Text {
                content: text.content.to_string(),
                parent: None,
            }),
            VNode::Widget(widget) => widget.materialize(self),
            VNode::Thunk(thunk) => {
                let forced = thunk.force(None);
                self.materialize(&forced)
            }
        }
    }

    fn apply_props(&mut self, node: LiveId, delta: &PropDelta, prior: &Props) {
        for (key, patch) in delta.iter() {
            match patch {
                PropPatch::Unset => {
                    if let Some(PropValue::Hook(hook)) = prior.get(key) {
                        if hook.must_unhook() {
                            let hook = Rc::clone(hook);
                            hook.detach(self, node, key);
                        }
                    }
                    if let Some(MemoryNode::Element { props, .. }) = self.node_mut(node) {
                        props.remove(key);
                    }
                }
                PropPatch::Set(value) => {
                    if let Some(MemoryNode::Element { props, .. }) = self.node_mut(node) {
                        props.set(key.clone(), value.clone());
                    }
                    if let PropValue::Hook(hook) = value {
                        let hook = Rc::clone(hook);
                        hook.attach(self, node, key);
                    }
                }
                PropPatch::Merge(entries) => {
                    if let Some(MemoryNode::Element { props, .. }) = self.node_mut(node) {
                        if let Some(PropValue::Dict(map)) = props.get_mut(key) {
                            for (entry, patch) in entries {
                                match patch {
                                    PropPatch::Set(value) => {
                                        map.insert(entry.clone(), value.clone());
                                    }
                                    PropPatch::Unset => {
                                        map.remove(entry);
                                    }
                                    // Merge entries are one level deep.
                                    PropPatch::Merge(_) => {}
                                }
                            }
                        } else {
                            let mut map = HashMap::default();
                            for (entry, patch) in entries {
                                if let PropPatch::Set(value) = patch {
                                    map.insert(entry.clone(), value.clone());
                                }
                            }
                            props.set(key.clone(), PropValue::Dict(map));
                        }
                    }
                }
            }
        }
    }

    fn parent(&self, node: LiveId) -> Option<LiveId> {
        match self.node(node)? {
            MemoryNode::Element { parent, .. } => *parent,
            MemoryNode::Text { parent, .. } => *parent,
        }
    }

    fn children(&self, node: LiveId) -> Vec<LiveId> {
        match self.node(node) {
            Some(MemoryNode::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn append_child(&mut self, parent: LiveId, child: LiveId) {
        self.detach(child);
        let attached = match self.node_mut(parent) {
            Some(MemoryNode::Element { children, .. }) => {
                children.push(child);
                true
            }
            _ => false,
        };
        if attached {
            self.set_parent(child, Some(parent));
        }
    }

    fn insert_child(&mut self, parent: LiveId, index: usize, child: LiveId) {
        self.detach(child);
        let attached = match self.node_mut(parent) {
            Some(MemoryNode::Element { children, .. }) => {
                let at = index.min(children.len());
                children.insert(at, child);
                true
            }
            _ => false,
        };
        if attached {
            self.set_parent(child, Some(parent));
        }
    }

    fn detach(&mut self, node: LiveId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Some(MemoryNode::Element { children, .. }) = self.node_mut(parent) {
            children.retain(|&child| child != node);
        }
        self.set_parent(node, None);
    }

    fn set_text(&mut self, node: LiveId, content: &str) -> bool {
        match self.node_mut(node) {
            Some(MemoryNode::Text { content: slot, .. }) => {
                *slot = content.to_string();
                true
            }
            _ => false,
        }
    }

    fn is_text(&self, node: LiveId) -> bool {
        matches!(self.node(node), Some(MemoryNode::Text { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::Props;

    #[test]
    fn materialize_mirrors_tree_structure() {
        let tree = VNode::element(
            "div",
            Props::new().with("id", "root"),
            vec![
                VNode::element("span", Props::new(), vec![VNode::text("hi")]),
                VNode::text("bye"),
            ],
        );
        let mut backend = MemoryBackend::new();
        let root = backend.materialize(&tree);

        let children = backend.children(root);
        assert_eq!(children.len(), 2);
        assert!(matches!(
            backend.node(children[1]),
            Some(MemoryNode::Text { content, .. }) if content == "bye"
        ));
        let grandchildren = backend.children(children[0]);
        assert_eq!(grandchildren.len(), 1);
        assert_eq!(backend.parent(children[0]), Some(root));
        assert_eq!(backend.len(), 4);
    }

    #[test]
    fn detach_unlinks_without_freeing() {
        let tree = VNode::element("div", Props::new(), vec![VNode::text("x")]);
        let mut backend = MemoryBackend::new();
        let root = backend.materialize(&tree);
        let child = backend.children(root)[0];

        backend.detach(child);
        assert!(backend.children(root).is_empty());
        assert_eq!(backend.parent(child), None);
        assert!(backend.node(child).is_some());

        // Detaching twice is a no-op.
        backend.detach(child);
        assert!(backend.node(child).is_some());
    }

    #[test]
    fn insert_child_clamps_past_the_end() {
        let tree = VNode::element("div", Props::new(), vec![VNode::text("a")]);
        let mut backend = MemoryBackend::new();
        let root = backend.materialize(&tree);
        let extra = backend.materialize(&VNode::text("b"));

        backend.insert_child(root, 99, extra);
        let children = backend.children(root);
        assert_eq!(children.len(), 2);
        assert_eq!(children[1], extra);
    }

    #[test]
    fn set_text_only_touches_text_nodes() {
        let mut backend = MemoryBackend::new();
        let text = backend.materialize(&VNode::text("a"));
        let element = backend.materialize(&VNode::element("div", Props::new(), vec![]));

        assert!(backend.set_text(text, "b"));
        assert!(!backend.set_text(element, "b"));
        assert!(backend.is_text(text));
        assert!(!backend.is_text(element));
    }
}
