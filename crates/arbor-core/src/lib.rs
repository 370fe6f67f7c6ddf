//! Tree diff/patch engine.
//!
//! Callers describe UI state as cheap, immutable tree values ([`VNode`]) and
//! defer all expensive mutation of a real, stateful tree to this engine:
//! [`diff`] compares two snapshots into a sparse [`PatchSet`], and [`apply`]
//! replays that edit set against a live tree through an injected [`Backend`],
//! touching only the positions that changed and preserving live node
//! identity wherever possible.
//!
//! The two phases are strictly separated: `diff` is pure (modulo the benign
//! one-time thunk memo fill) and `apply` is the only place that mutates the
//! live tree. The same patch core works against any live-tree technology
//! that implements [`Backend`]; [`MemoryBackend`] is the in-memory
//! reference implementation.

pub mod backend;
pub mod collections;
mod diff;
mod index;
pub mod memory;
pub mod patch;
pub mod props;
mod reorder;
pub mod thunk;
pub mod tree;
pub mod widget;

mod apply;

pub use apply::{apply, ApplyError};
pub use backend::{Backend, LiveId};
pub use diff::diff;
pub use index::locate;
pub use memory::{MemoryBackend, MemoryNode};
pub use patch::{Insertion, Moves, Patch, PatchSet, Removal};
pub use props::{diff_props, Hook, PropDelta, PropPatch, PropValue, Props};
pub use thunk::Thunk;
pub use tree::{Element, Text, VNode};
pub use widget::{should_update, Widget};
