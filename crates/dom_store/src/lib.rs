//! Mutable keyed node tree backing the live renderer.
//!
//! Nodes are addressed by [`NodeKey`]s that are never reused within a store.
//! Created nodes start detached; they become part of the document once
//! appended or inserted under a live parent. The store validates every
//! structural edit (no cycles, one parent per node, `before` must be a child
//! of `parent`) and records it in an optional [`DomPatch`] journal.

mod patch;

pub use crate::patch::DomPatch;
pub use core_types::{DocId, NodeKey, NodeRef};

use html::Node;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomPatchError {
    MissingKey(NodeKey),
    WrongNodeKind(NodeKey),
    InvalidParent(NodeKey),
    InvalidSibling { parent: NodeKey, before: NodeKey },
    CycleDetected { parent: NodeKey, child: NodeKey },
    /// The document node cannot be moved, removed or serialized as markup.
    DocumentNode,
}

impl fmt::Display for DomPatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomPatchError::MissingKey(key) => write!(f, "no live node {key}"),
            DomPatchError::WrongNodeKind(key) => write!(f, "node {key} has the wrong kind"),
            DomPatchError::InvalidParent(key) => write!(f, "node {key} cannot take this parent"),
            DomPatchError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            DomPatchError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            DomPatchError::DocumentNode => f.write_str("the document node cannot be edited"),
        }
    }
}

impl std::error::Error for DomPatchError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
        /// Identity the renderer matches keyed elements by; not an attribute.
        render_key: Option<Arc<str>>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    /// Created by the renderer, which may reuse it on a later pass.
    rendered: bool,
    parent: Option<NodeKey>,
    first_child: Option<NodeKey>,
    last_child: Option<NodeKey>,
    prev_sibling: Option<NodeKey>,
    next_sibling: Option<NodeKey>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            rendered: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document | NodeKind::Element { .. })
    }
}

/// A live subtree being copied out by [`DomStore::materialize`].
struct Pending {
    key: NodeKey,
    next_child: Option<NodeKey>,
    children: Vec<Node>,
}

pub struct DomStore {
    id: DocId,
    root: NodeKey,
    nodes: HashMap<NodeKey, NodeRecord>,
    next_key: u32,
    journal: Option<Vec<DomPatch>>,
}

impl DomStore {
    pub fn new() -> Self {
        let root = NodeKey(1);
        let mut nodes = HashMap::new();
        nodes.insert(root, NodeRecord::new(NodeKind::Document));
        Self {
            id: DocId::next(),
            root,
            nodes,
            next_key: 2,
            journal: None,
        }
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn node_ref(&self, key: NodeKey) -> NodeRef {
        NodeRef::new(self.id, key)
    }

    /// Start (or stop) recording writes. Turning recording on clears the journal.
    pub fn record_patches(&mut self, on: bool) {
        self.journal = on.then(Vec::new);
    }

    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        self.journal.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn push_patch(&mut self, patch: impl FnOnce() -> DomPatch) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(patch());
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        let key = NodeKey(self.next_key);
        self.next_key += 1;
        self.nodes.insert(key, NodeRecord::new(kind));
        key
    }

    pub fn create_element(&mut self, name: &str, attributes: &[(String, Option<String>)]) -> NodeKey {
        self.create_keyed_element(name, None, attributes)
    }

    pub fn create_keyed_element(
        &mut self,
        name: &str,
        render_key: Option<&str>,
        attributes: &[(String, Option<String>)],
    ) -> NodeKey {
        let name: Arc<str> = Arc::from(name.to_ascii_lowercase());
        let attributes = to_store_attributes(attributes);
        let key = self.alloc(NodeKind::Element {
            name: Arc::clone(&name),
            attributes: attributes.clone(),
            render_key: render_key.map(Arc::from),
        });
        self.push_patch(|| DomPatch::CreateElement {
            key,
            name,
            attributes,
        });
        key
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        let key = self.alloc(NodeKind::Text {
            text: text.to_string(),
        });
        self.push_patch(|| DomPatch::CreateText {
            key,
            text: text.to_string(),
        });
        key
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        let key = self.alloc(NodeKind::Comment {
            text: text.to_string(),
        });
        self.push_patch(|| DomPatch::CreateComment {
            key,
            text: text.to_string(),
        });
        key
    }

    /// Mark `key` as owned by the renderer. Only marked nodes are reused by
    /// later passes; bookkeeping only, so nothing is journaled.
    pub fn mark_rendered(&mut self, key: NodeKey) -> Result<(), DomPatchError> {
        self.record_mut(key)?.rendered = true;
        Ok(())
    }

    pub fn is_rendered(&self, key: NodeKey) -> bool {
        self.nodes.get(&key).is_some_and(|record| record.rendered)
    }

    fn create_detached(&mut self, node: &Node) -> NodeKey {
        match node {
            Node::Element {
                name, attributes, ..
            } => self.create_element(name, attributes),
            Node::Text { text } => self.create_text(text),
            Node::Comment { text } => self.create_comment(text),
        }
    }

    /// Create a detached copy of `node` and its descendants; returns the subtree root.
    pub fn build_subtree(&mut self, node: &Node) -> Result<NodeKey, DomPatchError> {
        let root = self.create_detached(node);
        let mut stack = vec![(root, node.children().iter())];
        while let Some((parent, children)) = stack.last_mut() {
            let parent = *parent;
            match children.next() {
                Some(child) => {
                    let key = self.create_detached(child);
                    self.append_child(parent, key)?;
                    stack.push((key, child.children().iter()));
                }
                None => {
                    stack.pop();
                }
            }
        }
        Ok(root)
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomPatchError> {
        self.check_attach(parent, child)?;
        let last = self.record(parent)?.last_child;
        {
            let record = self.record_mut(child)?;
            record.parent = Some(parent);
            record.prev_sibling = last;
            record.next_sibling = None;
        }
        match last {
            Some(last) => self.record_mut(last)?.next_sibling = Some(child),
            None => self.record_mut(parent)?.first_child = Some(child),
        }
        self.record_mut(parent)?.last_child = Some(child);
        self.push_patch(|| DomPatch::AppendChild { parent, child });
        Ok(())
    }

    /// Insert `child` before `before`; `None` appends.
    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: Option<NodeKey>,
    ) -> Result<(), DomPatchError> {
        let Some(before) = before else {
            return self.append_child(parent, child);
        };
        self.check_attach(parent, child)?;
        let before_record = self.record(before)?;
        if before_record.parent != Some(parent) {
            debug_assert!(false, "before is not a child of parent");
            return Err(DomPatchError::InvalidSibling { parent, before });
        }
        let prev = before_record.prev_sibling;
        {
            let record = self.record_mut(child)?;
            record.parent = Some(parent);
            record.prev_sibling = prev;
            record.next_sibling = Some(before);
        }
        self.record_mut(before)?.prev_sibling = Some(child);
        match prev {
            Some(prev) => self.record_mut(prev)?.next_sibling = Some(child),
            None => self.record_mut(parent)?.first_child = Some(child),
        }
        self.push_patch(|| DomPatch::InsertBefore {
            parent,
            child,
            before,
        });
        Ok(())
    }

    fn check_attach(&self, parent: NodeKey, child: NodeKey) -> Result<(), DomPatchError> {
        let parent_record = self.record(parent)?;
        let child_record = self.record(child)?;
        if parent == child || self.is_ancestor(child, parent) {
            debug_assert!(false, "cannot create cycle");
            return Err(DomPatchError::CycleDetected { parent, child });
        }
        if !parent_record.allows_children() {
            debug_assert!(false, "parent node cannot have children");
            return Err(DomPatchError::InvalidParent(parent));
        }
        if child == self.root {
            return Err(DomPatchError::DocumentNode);
        }
        if child_record.parent.is_some() {
            debug_assert!(false, "child already has a parent");
            return Err(DomPatchError::InvalidParent(child));
        }
        Ok(())
    }

    /// Splice `key` out of its parent's child list.
    fn unlink(&mut self, key: NodeKey) -> Result<(), DomPatchError> {
        let record = self.record_mut(key)?;
        let Some(parent) = record.parent.take() else {
            return Ok(());
        };
        let prev = record.prev_sibling.take();
        let next = record.next_sibling.take();
        match prev {
            Some(prev) => self.record_mut(prev)?.next_sibling = next,
            None => self.record_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.record_mut(next)?.prev_sibling = prev,
            None => self.record_mut(parent)?.last_child = prev,
        }
        Ok(())
    }

    /// Detach and drop `key` with its whole subtree.
    pub fn remove(&mut self, key: NodeKey) -> Result<(), DomPatchError> {
        if key == self.root {
            return Err(DomPatchError::DocumentNode);
        }
        self.unlink(key)?;
        let mut stack = vec![key];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.remove(&current) {
                removed += 1;
                let mut child = record.first_child;
                while let Some(next) = child {
                    stack.push(next);
                    child = self.next_sibling(next);
                }
            }
        }
        log::trace!(target: "dom_store", "removed {key} ({removed} nodes)");
        self.push_patch(|| DomPatch::RemoveNode { key });
        Ok(())
    }

    pub fn set_attributes(
        &mut self,
        key: NodeKey,
        attributes: &[(String, Option<String>)],
    ) -> Result<(), DomPatchError> {
        let new_attributes = to_store_attributes(attributes);
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => *attributes = new_attributes.clone(),
            _ => return Err(DomPatchError::WrongNodeKind(key)),
        }
        self.push_patch(|| DomPatch::SetAttributes {
            key,
            attributes: new_attributes,
        });
        Ok(())
    }

    pub fn set_text(&mut self, key: NodeKey, text: &str) -> Result<(), DomPatchError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text: existing } => {
                existing.clear();
                existing.push_str(text);
            }
            _ => return Err(DomPatchError::WrongNodeKind(key)),
        }
        self.push_patch(|| DomPatch::SetText {
            key,
            text: text.to_string(),
        });
        Ok(())
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.nodes.get(&key).map(|record| &record.kind)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|record| record.parent)
    }

    pub fn children(&self, key: NodeKey) -> Result<Vec<NodeKey>, DomPatchError> {
        let mut children = Vec::new();
        let mut child = self.record(key)?.first_child;
        while let Some(current) = child {
            children.push(current);
            child = self.next_sibling(current);
        }
        Ok(children)
    }

    pub fn first_child(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|record| record.first_child)
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(&key).and_then(|record| record.next_sibling)
    }

    fn record(&self, key: NodeKey) -> Result<&NodeRecord, DomPatchError> {
        self.nodes.get(&key).ok_or(DomPatchError::MissingKey(key))
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomPatchError> {
        self.nodes.get_mut(&key).ok_or(DomPatchError::MissingKey(key))
    }

    fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.parent(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.parent(key);
        }
        false
    }

    /// Copy a live subtree out as a detached [`Node`].
    pub fn materialize(&self, key: NodeKey) -> Result<Node, DomPatchError> {
        if key == self.root {
            return Err(DomPatchError::DocumentNode);
        }
        let mut stack = vec![Pending {
            key,
            next_child: self.record(key)?.first_child,
            children: Vec::new(),
        }];
        while let Some(mut pending) = stack.pop() {
            if let Some(child) = pending.next_child {
                pending.next_child = self.next_sibling(child);
                stack.push(pending);
                stack.push(Pending {
                    key: child,
                    next_child: self.first_child(child),
                    children: Vec::new(),
                });
                continue;
            }
            let node = self.detached_node(pending.key, pending.children)?;
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => return Ok(node),
            }
        }
        Err(DomPatchError::MissingKey(key))
    }

    fn detached_node(&self, key: NodeKey, children: Vec<Node>) -> Result<Node, DomPatchError> {
        let node = match &self.record(key)?.kind {
            NodeKind::Document => return Err(DomPatchError::DocumentNode),
            NodeKind::Element {
                name, attributes, ..
            } => Node::Element {
                name: name.to_string(),
                attributes: attributes
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                children,
            },
            NodeKind::Text { text } => Node::Text { text: text.clone() },
            NodeKind::Comment { text } => Node::Comment { text: text.clone() },
        };
        Ok(node)
    }

    pub fn materialize_children(&self, key: NodeKey) -> Result<Vec<Node>, DomPatchError> {
        self.children(key)?
            .into_iter()
            .map(|child| self.materialize(child))
            .collect()
    }

    pub fn inner_html(&self, key: NodeKey) -> Result<String, DomPatchError> {
        Ok(html::to_html(&self.materialize_children(key)?))
    }

    pub fn outer_html(&self, key: NodeKey) -> Result<String, DomPatchError> {
        Ok(html::to_html(&[self.materialize(key)?]))
    }
}

impl Default for DomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomStore")
            .field("id", &self.id)
            .field("nodes", &self.nodes.len())
            .field("journal", &self.journal.as_ref().map(Vec::len))
            .finish()
    }
}

fn to_store_attributes(attributes: &[(String, Option<String>)]) -> Vec<(Arc<str>, Option<String>)> {
    attributes
        .iter()
        .map(|(k, v)| (Arc::from(k.to_ascii_lowercase()), v.clone()))
        .collect()
}
