//! Ownership tags for injected nodes.
//!
//! A side table from node identity to `{region, content}`. The node itself is
//! never touched; nodes the renderer created simply have no entry.
//!
//! Invariants:
//! - Only the reconciler writes entries, and only for nodes it inserted.
//! - An entry missing either field reads as untagged.
//! - Entries for removed nodes are dropped by the reconciler on removal, or
//!   by [`RegionTags::prune`] when the renderer removed the node itself.

use core_types::{DocId, NodeKey, NodeRef, RegionKey};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeTag {
    pub region: Option<RegionKey>,
    pub content: Option<Arc<str>>,
}

impl NodeTag {
    fn complete(&self) -> Option<(&RegionKey, &str)> {
        match (&self.region, &self.content) {
            (Some(region), Some(content)) => Some((region, content)),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RegionTags {
    entries: HashMap<NodeRef, NodeTag>,
}

impl RegionTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `node`; re-tagging overwrites.
    pub fn tag(&mut self, node: NodeRef, region: &RegionKey, content: &Arc<str>) {
        self.entries.insert(
            node,
            NodeTag {
                region: Some(region.clone()),
                content: Some(Arc::clone(content)),
            },
        );
    }

    /// `None` is the end-of-children position and reads as untagged.
    pub fn read_region_key(&self, node: Option<NodeRef>) -> Option<&RegionKey> {
        self.read(node).map(|(region, _)| region)
    }

    pub fn read_content_identity(&self, node: Option<NodeRef>) -> Option<&str> {
        self.read(node).map(|(_, content)| content)
    }

    fn read(&self, node: Option<NodeRef>) -> Option<(&RegionKey, &str)> {
        let entry = self.entries.get(&node?)?;
        let complete = entry.complete();
        if complete.is_none() {
            log::debug!(target: "verbatim.tags", "incomplete tag on {:?}; treating as untagged", node);
        }
        complete
    }

    pub fn untag(&mut self, node: NodeRef) -> bool {
        self.entries.remove(&node).is_some()
    }

    /// Drop every entry of `doc` whose node `is_live` reports gone.
    pub fn prune(&mut self, doc: DocId, is_live: impl Fn(NodeKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|node, _| node.doc != doc || is_live(node.key));
        let pruned = before - self.entries.len();
        if pruned > 0 {
            log::trace!(target: "verbatim.tags", "pruned {pruned} stale tag(s)");
        }
        pruned
    }

    /// Drop every entry of `doc`, e.g. when the tree itself is discarded.
    pub fn forget_doc(&mut self, doc: DocId) {
        self.entries.retain(|node, _| node.doc != doc);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, node: NodeRef, tag: NodeTag) {
        self.entries.insert(node, tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(doc: u64, key: u32) -> NodeRef {
        NodeRef::new(DocId(doc), NodeKey(key))
    }

    #[test]
    fn untagged_and_end_sentinel_read_as_absent() {
        let tags = RegionTags::new();
        assert_eq!(tags.read_region_key(None), None);
        assert_eq!(tags.read_region_key(Some(node(1, 2))), None);
        assert_eq!(tags.read_content_identity(Some(node(1, 2))), None);
    }

    #[test]
    fn tag_overwrites() {
        let mut tags = RegionTags::new();
        let n = node(1, 2);
        tags.tag(n, &RegionKey::from("a"), &Arc::from("<p>1</p>"));
        tags.tag(n, &RegionKey::from("b"), &Arc::from("<p>2</p>"));
        assert_eq!(tags.read_region_key(Some(n)), Some(&RegionKey::from("b")));
        assert_eq!(tags.read_content_identity(Some(n)), Some("<p>2</p>"));
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn incomplete_entries_read_as_untagged() {
        let mut tags = RegionTags::new();
        tags.insert_raw(
            node(1, 2),
            NodeTag {
                region: Some(RegionKey::from("a")),
                content: None,
            },
        );
        tags.insert_raw(
            node(1, 3),
            NodeTag {
                region: None,
                content: Some(Arc::from("x")),
            },
        );
        assert_eq!(tags.read_region_key(Some(node(1, 2))), None);
        assert_eq!(tags.read_content_identity(Some(node(1, 3))), None);
    }

    #[test]
    fn prune_is_scoped_to_one_document() {
        let mut tags = RegionTags::new();
        let region = RegionKey::from("a");
        let content: Arc<str> = Arc::from("x");
        tags.tag(node(1, 2), &region, &content);
        tags.tag(node(1, 3), &region, &content);
        tags.tag(node(2, 2), &region, &content);

        assert_eq!(tags.prune(DocId(1), |key| key == NodeKey(3)), 1);
        assert_eq!(tags.read_region_key(Some(node(1, 2))), None);
        assert!(tags.read_region_key(Some(node(1, 3))).is_some());
        assert!(tags.read_region_key(Some(node(2, 2))).is_some());

        tags.forget_doc(DocId(2));
        assert_eq!(tags.len(), 1);
    }
}
