//! Mutation journal entries for the live tree.
//!
//! Every write the store performs is recorded (when journaling is on) as one
//! `DomPatch`, in the order it happened. Tests use the journal to prove that a
//! render pass performed no structural writes.
//!
//! Invariants:
//! - `key` values in create operations are fresh; all other keys refer to
//!   nodes that are live at the time of the operation.
//! - `RemoveNode` removes the whole subtree; keys in it are dead afterwards
//!   and are never reallocated.
//! - Element and attribute names are ASCII-lowercase.

use core_types::NodeKey;
use std::sync::Arc;

#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPatch {
    CreateElement {
        key: NodeKey,
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    CreateText {
        key: NodeKey,
        text: String,
    },
    CreateComment {
        key: NodeKey,
        text: String,
    },
    /// Append a child to the end of a parent's children list.
    AppendChild { parent: NodeKey, child: NodeKey },
    /// Insert a child before an existing sibling.
    InsertBefore {
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    },
    RemoveNode { key: NodeKey },
    /// Replace all attributes on an element node.
    SetAttributes {
        key: NodeKey,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    /// Replace the text content of a text node.
    SetText { key: NodeKey, text: String },
}

impl DomPatch {
    /// True for operations that change which nodes are attached where.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DomPatch::AppendChild { .. } | DomPatch::InsertBefore { .. } | DomPatch::RemoveNode { .. }
        )
    }
}
