//! Incremental tree walking.
//!
//! A render pass describes its output as a flat sequence of
//! `open_element` / `text` / `close_element` calls against a
//! [`RenderContext`]. Backed by a [`DomWalker`], the pass reconciles the
//! calls against the nodes already under a host element, reusing what
//! matches and creating or removing the rest. Backed by a
//! [`StringRenderer`], the pass serializes to markup and has no live tree.

mod error;
mod string;
mod walker;

pub use crate::error::RenderError;
pub use crate::string::{StringRenderer, render_to_string};
pub use crate::walker::{DomWalker, patch};

use core_types::{DocId, NodeKey, NodeRef};
use std::collections::HashMap;

/// The next position a render pass will diff or insert at: before `next`
/// under `parent`, or at the end of `parent`'s children when `next` is `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub parent: NodeKey,
    pub next: Option<NodeKey>,
}

/// Raw access to the live tree at the walker's cursor.
///
/// Used by code that manages nodes the renderer does not describe itself.
/// Every operation leaves the cursor on a real sibling or at end of children.
pub trait LiveTree {
    fn doc_id(&self) -> DocId;

    fn cursor(&self) -> Cursor;

    /// The node at the cursor; `None` at end of children.
    fn current_node(&self) -> Option<NodeRef>;

    /// Advance past the node at the cursor without touching it.
    fn skip_node(&mut self) -> Result<(), RenderError>;

    /// Remove the node at the cursor; the following sibling moves into its place.
    fn remove_current(&mut self) -> Result<NodeKey, RenderError>;

    /// Insert a copy of `node` before the cursor. The cursor ends up after it.
    fn insert_before_cursor(&mut self, node: &html::Node) -> Result<NodeKey, RenderError>;

    fn contains(&self, key: NodeKey) -> bool;
}

/// Output sink of a render pass.
pub trait RenderContext {
    /// Capability probe: `Some` when rendering into a mutable node tree.
    fn live_tree(&mut self) -> Option<&mut dyn LiveTree>;

    /// `key` is the renderer's identity for the element, matched on reuse.
    fn open_element(
        &mut self,
        name: &str,
        key: Option<&str>,
        attributes: &[(String, Option<String>)],
    ) -> Result<(), RenderError>;

    fn close_element(&mut self, name: &str) -> Result<(), RenderError>;

    /// Plain text; escaped when serialized.
    fn text(&mut self, text: &str) -> Result<(), RenderError>;

    /// Text emitted as given. Serializing backends write it without escaping;
    /// tree backends store it as a text node.
    fn emit_verbatim(&mut self, text: &str) -> Result<(), RenderError>;

    /// Count one more instance of `scope` in this pass and return its index.
    /// Lets repeated renders of one template tell their call sites apart.
    fn next_instance(&mut self, scope: u64) -> usize;
}

/// Per-pass instance counts keyed by an opaque scope id.
#[derive(Debug, Default)]
pub struct InstanceCounter {
    seen: HashMap<u64, usize>,
}

impl InstanceCounter {
    pub fn next(&mut self, scope: u64) -> usize {
        let count = self.seen.entry(scope).or_insert(0);
        let index = *count;
        *count += 1;
        index
    }
}
