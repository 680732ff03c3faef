//! Region reconciliation.
//!
//! One call per occurrence of injected content per render pass. With a live
//! tree the reconciler either skips the region's tagged sibling run (content
//! unchanged) or removes it and splices in freshly sanitized nodes. Without a
//! live tree the content is emitted verbatim.
//!
//! The tagged run of a region always starts at the cursor when the call
//! happens: it was inserted right before the cursor on the previous pass, and
//! the renderer walks siblings in the same order every pass.

use crate::config::VerbatimConfig;
use crate::content::Content;
use crate::error::VerbatimError;
use crate::tags::RegionTags;
use core_types::{NodeRef, RegionKey};
use dom_store::DomStore;
use idom::{LiveTree, RenderContext};
use std::cell::{Ref, RefCell};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No live tree; the content was emitted as text.
    Fallback,
    /// The region matched and the cursor moved past `skipped` nodes.
    Unchanged { skipped: usize },
    /// The old run was removed and the new nodes inserted.
    Replaced { removed: usize, inserted: usize },
}

pub struct Verbatim {
    config: VerbatimConfig,
    tags: RefCell<RegionTags>,
}

impl Verbatim {
    pub fn new(config: VerbatimConfig) -> Self {
        Self {
            config,
            tags: RefCell::new(RegionTags::new()),
        }
    }

    pub fn config(&self) -> &VerbatimConfig {
        &self.config
    }

    pub fn tags(&self) -> Ref<'_, RegionTags> {
        self.tags.borrow()
    }

    /// Drop tags of nodes that are no longer in `dom`.
    pub fn prune(&self, dom: &DomStore) -> usize {
        self.tags
            .borrow_mut()
            .prune(dom.id(), |key| dom.contains(key))
    }

    pub fn reconcile(
        &self,
        ctx: &mut dyn RenderContext,
        content: &Content,
        region: &RegionKey,
    ) -> Result<ReconcileOutcome, VerbatimError> {
        if let Some(tree) = ctx.live_tree() {
            return self.reconcile_tree(tree, content, region);
        }
        if let Some(markup) = content.as_markup() {
            ctx.emit_verbatim(markup)?;
        }
        log::trace!(target: "verbatim.reconcile", "{region}: no live tree, emitted as text");
        Ok(ReconcileOutcome::Fallback)
    }

    pub fn reconcile_tree(
        &self,
        tree: &mut dyn LiveTree,
        content: &Content,
        region: &RegionKey,
    ) -> Result<ReconcileOutcome, VerbatimError> {
        let mut tags = self.tags.borrow_mut();
        let markup = content.as_markup();

        let current = tree.current_node();
        let unchanged = markup.is_some()
            && tags.read_region_key(current) == Some(region)
            && tags.read_content_identity(current) == markup;
        if unchanged {
            let mut skipped = 0;
            while tags.read_region_key(tree.current_node()) == Some(region) {
                tree.skip_node()?;
                skipped += 1;
            }
            log::trace!(target: "verbatim.reconcile", "{region}: unchanged, skipped {skipped}");
            return Ok(ReconcileOutcome::Unchanged { skipped });
        }

        let sanitizer = match markup {
            Some(_) => Some(
                self.config
                    .sanitizer
                    .as_deref()
                    .ok_or(VerbatimError::SanitizerMissing)?,
            ),
            None => None,
        };

        let doc = tree.doc_id();
        let mut removed = 0;
        while let Some(node) = tree.current_node() {
            if tags.read_region_key(Some(node)) != Some(region) {
                break;
            }
            tree.remove_current()?;
            tags.untag(node);
            removed += 1;
        }

        let (Some(markup), Some(sanitizer)) = (markup, sanitizer) else {
            log::debug!(target: "verbatim.reconcile", "{region}: emptied, removed {removed}");
            return Ok(ReconcileOutcome::Replaced {
                removed,
                inserted: 0,
            });
        };

        let clean = sanitizer.sanitize(markup)?;
        let nodes = self.config.fragment_builder.parse_to_nodes(&clean)?;
        let identity: Arc<str> = Arc::from(markup);
        for node in &nodes {
            let key = tree.insert_before_cursor(node)?;
            tags.tag(NodeRef::new(doc, key), region, &identity);
        }
        log::debug!(
            target: "verbatim.reconcile",
            "{region}: replaced {removed} node(s) with {}",
            nodes.len()
        );
        Ok(ReconcileOutcome::Replaced {
            removed,
            inserted: nodes.len(),
        })
    }
}

impl Default for Verbatim {
    fn default() -> Self {
        Self::new(VerbatimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::NodeTag;
    use core_types::NodeKey;
    use html::{FragmentBuilder, FragmentError, SanitizeError, Sanitizer};
    use idom::{DomWalker, StringRenderer};

    fn setup() -> (DomStore, NodeKey) {
        let mut dom = DomStore::new();
        let host = dom.create_element("div", &[]);
        let root = dom.root();
        dom.append_child(root, host).expect("append host");
        (dom, host)
    }

    fn pass(
        verbatim: &Verbatim,
        dom: &mut DomStore,
        host: NodeKey,
        content: &str,
        region: &str,
    ) -> Result<ReconcileOutcome, VerbatimError> {
        let mut walker = DomWalker::new(dom, host)?;
        let outcome = verbatim.reconcile(&mut walker, &Content::from(content), &region.into())?;
        walker.finish()?;
        Ok(outcome)
    }

    struct Failing;

    impl Sanitizer for Failing {
        fn sanitize(&self, markup: &str) -> Result<String, SanitizeError> {
            Err(SanitizeError::InputTooLarge {
                len: markup.len(),
                limit: 0,
            })
        }
    }

    struct TooDeep;

    impl FragmentBuilder for TooDeep {
        fn parse_to_nodes(&self, _markup: &str) -> Result<Vec<html::Node>, FragmentError> {
            Err(FragmentError::TooDeep { limit: 1 })
        }
    }

    #[test]
    fn inserts_then_skips() {
        let verbatim = Verbatim::default();
        let (mut dom, host) = setup();
        let content = "<h1>Hi</h1>text";
        assert_eq!(
            pass(&verbatim, &mut dom, host, content, "r").expect("first"),
            ReconcileOutcome::Replaced {
                removed: 0,
                inserted: 2
            }
        );
        assert_eq!(verbatim.tags().len(), 2);
        assert_eq!(
            pass(&verbatim, &mut dom, host, content, "r").expect("second"),
            ReconcileOutcome::Unchanged { skipped: 2 }
        );
        assert_eq!(dom.inner_html(host).expect("html"), "<h1>Hi</h1>text");
    }

    #[test]
    fn fallback_emits_unsanitized_text() {
        let verbatim = Verbatim::default();
        let mut out = StringRenderer::new();
        let markup = "<script>alert(1)</script><b>x</b>";
        assert_eq!(
            verbatim
                .reconcile(&mut out, &Content::from(markup), &"r".into())
                .expect("fallback"),
            ReconcileOutcome::Fallback
        );
        assert_eq!(out.finish().expect("finish"), markup);
        assert!(verbatim.tags().is_empty());
    }

    #[test]
    fn live_tree_without_sanitizer_is_an_error() {
        let verbatim = Verbatim::new(VerbatimConfig::default().without_sanitizer());
        let (mut dom, host) = setup();
        assert_eq!(
            pass(&verbatim, &mut dom, host, "<p>x</p>", "r"),
            Err(VerbatimError::SanitizerMissing)
        );
        assert_eq!(
            pass(&verbatim, &mut dom, host, "", "r").expect("empty needs no sanitizer"),
            ReconcileOutcome::Replaced {
                removed: 0,
                inserted: 0
            }
        );
    }

    #[test]
    fn collaborator_failure_leaves_region_empty() {
        let (mut dom, host) = setup();
        let ok = Verbatim::default();
        pass(&ok, &mut dom, host, "<p>old</p>", "r").expect("first");

        let failing = Verbatim::new(VerbatimConfig::default().with_sanitizer(Failing));
        *failing.tags.borrow_mut() = std::mem::take(&mut *ok.tags.borrow_mut());
        let mut walker = DomWalker::new(&mut dom, host).expect("walker");
        let err = failing
            .reconcile(&mut walker, &Content::from("<p>new</p>"), &"r".into())
            .expect_err("sanitizer fails");
        assert!(matches!(err, VerbatimError::Sanitize(_)));
        walker.finish().expect("finish");
        assert_eq!(dom.inner_html(host).expect("html"), "");

        let broken = Verbatim::new(VerbatimConfig::default().with_fragment_builder(TooDeep));
        assert_eq!(
            pass(&broken, &mut dom, host, "<p>new</p>", "r"),
            Err(VerbatimError::Fragment(FragmentError::TooDeep { limit: 1 }))
        );
    }

    #[test]
    fn incomplete_tag_is_treated_as_untagged() {
        let verbatim = Verbatim::default();
        let (mut dom, host) = setup();
        pass(&verbatim, &mut dom, host, "<p>x</p>", "r").expect("first");
        let p = dom.first_child(host).expect("p");
        verbatim.tags.borrow_mut().insert_raw(
            dom.node_ref(p),
            NodeTag {
                region: Some("r".into()),
                content: None,
            },
        );
        let mut walker = DomWalker::new(&mut dom, host).expect("walker");
        let outcome = verbatim
            .reconcile(&mut walker, &Content::from("<p>x</p>"), &"r".into())
            .expect("second");
        assert_eq!(
            outcome,
            ReconcileOutcome::Replaced {
                removed: 0,
                inserted: 1
            }
        );
    }

    #[test]
    fn prune_drops_tags_of_nodes_removed_by_the_renderer() {
        let verbatim = Verbatim::default();
        let (mut dom, host) = setup();
        pass(&verbatim, &mut dom, host, "<i>a</i><b>b</b>", "r").expect("first");
        idom::patch(&mut dom, host, |_: &mut DomWalker<'_>| {
            Ok::<(), idom::RenderError>(())
        })
        .expect("empty pass");
        assert_eq!(verbatim.tags().len(), 2);
        assert_eq!(verbatim.prune(&dom), 2);
        assert!(verbatim.tags().is_empty());
    }
}
