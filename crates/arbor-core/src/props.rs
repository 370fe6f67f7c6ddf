//! Property model: per-node property maps, hook capabilities, and the
//! field-wise delta produced by [`diff_props`].

use std::fmt;
use std::rc::Rc;

use crate::backend::{Backend, LiveId};
use crate::collections::map::HashMap;

/// A property value attached to an element node.
///
/// `Dict` covers nested sub-maps in the `attributes`/`style` shape, which are
/// diffed one level deep instead of replaced wholesale. `Hook` values carry
/// attach/detach behavior; they compare by identity and replace wholesale.
#[derive(Clone)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    Dict(HashMap<String, PropValue>),
    Hook(Rc<dyn Hook>),
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Text(a), PropValue::Text(b)) => a == b,
            (PropValue::Dict(a), PropValue::Dict(b)) => a == b,
            (PropValue::Hook(a), PropValue::Hook(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(v) => write!(f, "Bool({v})"),
            PropValue::Number(v) => write!(f, "Number({v})"),
            PropValue::Text(v) => write!(f, "Text({v:?})"),
            PropValue::Dict(map) => f.debug_tuple("Dict").field(map).finish(),
            PropValue::Hook(hook) => {
                write!(f, "Hook(must_unhook: {})", hook.must_unhook())
            }
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(Rc::from(value.as_str()))
    }
}

impl From<Rc<dyn Hook>> for PropValue {
    fn from(value: Rc<dyn Hook>) -> Self {
        PropValue::Hook(value)
    }
}

/// A property value with explicit attach/detach behavior against a live node.
///
/// `must_unhook` is a required discriminant rather than an optional callback:
/// the teardown sweep branches on it exhaustively, and only hooks answering
/// `true` are unset when their subtree is removed.
pub trait Hook {
    fn attach(&self, backend: &mut dyn Backend, node: LiveId, key: &str);
    fn detach(&self, backend: &mut dyn Backend, node: LiveId, key: &str);
    fn must_unhook(&self) -> bool;
}

/// An element node's property map.
#[derive(Clone, Debug, Default)]
pub struct Props {
    entries: HashMap<String, PropValue>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, convenient when constructing tree values.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.set(key, value.into());
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: PropValue) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PropValue> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys of this map's own hook values that require explicit teardown,
    /// sorted for deterministic patch content.
    pub(crate) fn unhookable_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter_map(|(key, value)| match value {
                PropValue::Hook(hook) if hook.must_unhook() => Some(key.clone()),
                _ => None,
            })
            .collect();
        keys.sort();
        keys
    }
}

/// One entry of a property delta.
///
/// `Merge` is the one-level nested dict delta; its entries are only ever
/// `Set` or `Unset`.
#[derive(Clone, Debug, PartialEq)]
pub enum PropPatch {
    Set(PropValue),
    Unset,
    Merge(HashMap<String, PropPatch>),
}

/// The added/changed/unset property map computed by [`diff_props`].
///
/// A key present in the prior map but absent in the next maps to an explicit
/// `Unset` marker; appliers must remove the property entirely, not blank it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropDelta {
    entries: HashMap<String, PropPatch>,
}

impl PropDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta that unsets exactly the given keys. Used by the teardown
    /// sweep to tear down a node's own hooks.
    pub(crate) fn unset_all(keys: impl IntoIterator<Item = String>) -> Self {
        let mut delta = Self::default();
        for key in keys {
            delta.set(key, PropPatch::Unset);
        }
        delta
    }

    pub fn set(&mut self, key: impl Into<String>, patch: PropPatch) {
        self.entries.insert(key.into(), patch);
    }

    pub fn get(&self, key: &str) -> Option<&PropPatch> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropPatch)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Field-wise map diff between two property maps.
///
/// Values equal by [`PropValue::eq`] produce no entry. Two `Dict` values diff
/// recursively one level; everything else that changed is replaced wholesale.
pub fn diff_props(prior: &Props, next: &Props) -> PropDelta {
    let mut delta = PropDelta::new();
    for (key, a) in prior.iter() {
        match next.get(key) {
            None => delta.set(key.clone(), PropPatch::Unset),
            Some(b) if a == b => {}
            Some(b) => match (a, b) {
                (PropValue::Dict(da), PropValue::Dict(db)) => {
                    let nested = diff_dict(da, db);
                    if !nested.is_empty() {
                        delta.set(key.clone(), PropPatch::Merge(nested));
                    }
                }
                _ => delta.set(key.clone(), PropPatch::Set(b.clone())),
            },
        }
    }
    for (key, b) in next.iter() {
        if !prior.contains(key) {
            delta.set(key.clone(), PropPatch::Set(b.clone()));
        }
    }
    delta
}

fn diff_dict(
    prior: &HashMap<String, PropValue>,
    next: &HashMap<String, PropValue>,
) -> HashMap<String, PropPatch> {
    let mut nested = HashMap::default();
    for (key, a) in prior {
        match next.get(key) {
            None => {
                nested.insert(key.clone(), PropPatch::Unset);
            }
            Some(b) if a == b => {}
            Some(b) => {
                nested.insert(key.clone(), PropPatch::Set(b.clone()));
            }
        }
    }
    for (key, b) in next {
        if !prior.contains_key(key) {
            nested.insert(key.clone(), PropPatch::Set(b.clone()));
        }
    }
    nested
}
