use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one live tree (`dom_store::DomStore`).
///
/// Allocated from a process-wide counter so keys from two stores never
/// compare equal once paired into a [`NodeRef`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocId(pub u64);

impl DocId {
    pub fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        DocId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable node identity within one document.
///
/// Keys are never reused inside a document, even after the node is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u32);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node key qualified by the document it lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub doc: DocId,
    pub key: NodeKey,
}

impl NodeRef {
    pub fn new(doc: DocId, key: NodeKey) -> Self {
        Self { doc, key }
    }
}

/// Opaque identity of one injection call site, assigned by the templating layer.
///
/// Compared by value only; the content of the string carries no meaning.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionKey(Arc<str>);

impl RegionKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        RegionKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegionKey {
    fn from(value: &str) -> Self {
        RegionKey::new(value)
    }
}

impl From<String> for RegionKey {
    fn from(value: String) -> Self {
        RegionKey::new(value)
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
