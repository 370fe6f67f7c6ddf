//! Builders, counting collaborators, and structural assertions used across
//! the engine's tests.

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use arbor_core::backend::{Backend, LiveId};
use arbor_core::memory::{MemoryBackend, MemoryNode};
use arbor_core::props::{Hook, PropDelta, PropValue, Props};
use arbor_core::tree::VNode;
use arbor_core::widget::Widget;

// ---------------------------------------------------------------------------
// Tree builders

pub fn el(tag: &str, children: Vec<VNode>) -> VNode {
    VNode::element(tag, Props::new(), children)
}

pub fn el_props(tag: &str, props: Props, children: Vec<VNode>) -> VNode {
    VNode::element(tag, props, children)
}

pub fn keyed(tag: &str, key: &str, children: Vec<VNode>) -> VNode {
    VNode::keyed_element(tag, key, Props::new(), children)
}

pub fn txt(content: &str) -> VNode {
    VNode::text(content)
}

// ---------------------------------------------------------------------------
// Counting collaborators

/// Lifecycle counters shared with a [`CountingHook`].
#[derive(Default)]
pub struct HookStats {
    pub attached: Cell<usize>,
    pub detached: Cell<usize>,
}

/// A hook that records its attach/detach calls.
pub struct CountingHook {
    pub stats: Rc<HookStats>,
    pub unhook: bool,
}

impl CountingHook {
    pub fn new(unhook: bool) -> (Rc<HookStats>, Rc<dyn Hook>) {
        let stats = Rc::new(HookStats::default());
        let hook = Rc::new(Self {
            stats: Rc::clone(&stats),
            unhook,
        });
        (stats, hook)
    }
}

impl Hook for CountingHook {
    fn attach(&self, _backend: &mut dyn Backend, _node: LiveId, _key: &str) {
        self.stats.attached.set(self.stats.attached.get() + 1);
    }

    fn detach(&self, _backend: &mut dyn Backend, _node: LiveId, _key: &str) {
        self.stats.detached.set(self.stats.detached.get() + 1);
    }

    fn must_unhook(&self) -> bool {
        self.unhook
    }
}

/// Lifecycle counters shared with a [`CountingWidget`].
#[derive(Default)]
pub struct WidgetStats {
    pub materialized: Cell<usize>,
    pub updated: Cell<usize>,
    pub destroyed: Cell<usize>,
}

impl WidgetStats {
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::default())
    }
}

/// A widget that materializes a single element and counts its lifecycle.
/// `update` keeps the existing live node.
pub struct CountingWidget {
    pub tag: &'static str,
    pub key: Option<&'static str>,
    pub stats: Rc<WidgetStats>,
}

impl CountingWidget {
    pub fn node(tag: &'static str, key: Option<&'static str>, stats: &Rc<WidgetStats>) -> VNode {
        VNode::widget(Rc::new(Self {
            tag,
            key,
            stats: Rc::clone(stats),
        }))
    }
}

impl Widget for CountingWidget {
    fn key(&self) -> Option<&str> {
        self.key
    }

    fn materialize(&self, backend: &mut dyn Backend) -> LiveId {
        self.stats.materialized.set(self.stats.materialized.get() + 1);
        backend.materialize(&el(self.tag, vec![]))
    }

    fn update(
        &self,
        _prior: &dyn Widget,
        _live: LiveId,
        _backend: &mut dyn Backend,
    ) -> Option<LiveId> {
        self.stats.updated.set(self.stats.updated.get() + 1);
        None
    }

    fn destroy(&self, _live: LiveId, _backend: &mut dyn Backend) {
        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A second keyless widget type, for update gating on concrete type.
pub struct OtherWidget {
    pub stats: Rc<WidgetStats>,
}

impl OtherWidget {
    pub fn node(stats: &Rc<WidgetStats>) -> VNode {
        VNode::widget(Rc::new(Self {
            stats: Rc::clone(stats),
        }))
    }
}

impl Widget for OtherWidget {
    fn materialize(&self, backend: &mut dyn Backend) -> LiveId {
        self.stats.materialized.set(self.stats.materialized.get() + 1);
        backend.materialize(&el("other", vec![]))
    }

    fn update(
        &self,
        _prior: &dyn Widget,
        _live: LiveId,
        _backend: &mut dyn Backend,
    ) -> Option<LiveId> {
        self.stats.updated.set(self.stats.updated.get() + 1);
        None
    }

    fn destroy(&self, _live: LiveId, _backend: &mut dyn Backend) {
        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Recording backend

/// A [`MemoryBackend`] wrapper that counts structural reads, so tests can
/// assert how much of the live tree a traversal actually visited.
#[derive(Default)]
pub struct RecordingBackend {
    inner: MemoryBackend,
    children_reads: Cell<usize>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `children` reads since the last reset. The sparse index
    /// reads a node's children exactly once per visited element.
    pub fn children_reads(&self) -> usize {
        self.children_reads.get()
    }

    pub fn reset(&self) {
        self.children_reads.set(0);
    }

    pub fn inner(&self) -> &MemoryBackend {
        &self.inner
    }
}

impl Backend for RecordingBackend {
    fn materialize(&mut self, tree: &VNode) -> LiveId {
        self.inner.materialize(tree)
    }

    fn apply_props(&mut self, node: LiveId, delta: &PropDelta, prior: &Props) {
        self.inner.apply_props(node, delta, prior);
    }

    fn parent(&self, node: LiveId) -> Option<LiveId> {
        self.inner.parent(node)
    }

    fn children(&self, node: LiveId) -> Vec<LiveId> {
        self.children_reads.set(self.children_reads.get() + 1);
        self.inner.children(node)
    }

    fn append_child(&mut self, parent: LiveId, child: LiveId) {
        self.inner.append_child(parent, child);
    }

    fn insert_child(&mut self, parent: LiveId, index: usize, child: LiveId) {
        self.inner.insert_child(parent, index, child);
    }

    fn detach(&mut self, node: LiveId) {
        self.inner.detach(node);
    }

    fn set_text(&mut self, node: LiveId, content: &str) -> bool {
        self.inner.set_text(node, content)
    }

    fn is_text(&self, node: LiveId) -> bool {
        self.inner.is_text(node)
    }
}

// ---------------------------------------------------------------------------
// Structural comparison

/// Renders the live subtree as a canonical string: tags, sorted properties,
/// text content, and child order — everything structural, nothing about
/// node ids. Two live trees with equal shapes are equivalent for round-trip
/// assertions.
pub fn shape(backend: &MemoryBackend, id: LiveId) -> String {
    match backend.node(id) {
        Some(MemoryNode::Element { tag, props, children, .. }) => {
            let mut entries: Vec<String> = props
                .iter()
                .map(|(key, value)| format!("{key}={}", fmt_value(value)))
                .collect();
            entries.sort();
            let children: Vec<String> = children
                .iter()
                .map(|&child| shape(backend, child))
                .collect();
            format!("<{} {}>[{}]", tag, entries.join(" "), children.join(", "))
        }
        Some(MemoryNode::Text { content, .. }) => format!("{content:?}"),
        None => "(missing)".to_string(),
    }
}

fn fmt_value(value: &PropValue) -> String {
    match value {
        PropValue::Bool(v) => v.to_string(),
        PropValue::Number(v) => v.to_string(),
        PropValue::Text(v) => format!("{v:?}"),
        PropValue::Dict(map) => {
            let mut entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}:{}", fmt_value(value)))
                .collect();
            entries.sort();
            format!("{{{}}}", entries.join(" "))
        }
        PropValue::Hook(_) => "(hook)".to_string(),
    }
}

/// Materializes `tree` into a fresh backend and returns its shape.
pub fn shape_of(tree: &VNode) -> String {
    let mut backend = MemoryBackend::new();
    let root = backend.materialize(tree);
    shape(&backend, root)
}
