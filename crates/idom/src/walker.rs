use crate::{Cursor, InstanceCounter, LiveTree, RenderContext, RenderError};
use core_types::{DocId, NodeKey, NodeRef};
use dom_store::{DomPatchError, DomStore, NodeKind};

#[derive(Clone, Copy, Debug)]
struct Frame {
    parent: NodeKey,
    next: Option<NodeKey>,
}

/// Live-tree backend: reconciles a render pass against the children of `host`.
///
/// Only nodes this walker created are reused: an element when the node at
/// the cursor has the same tag name and render key, a text node by updating
/// it in place. Anything else, including nodes inserted through
/// [`LiveTree::insert_before_cursor`], is left where it is and the new node
/// is created before the cursor. Children left unvisited when an element
/// closes (or when the pass finishes) are removed.
pub struct DomWalker<'a> {
    dom: &'a mut DomStore,
    host: Frame,
    open: Vec<(String, Frame)>,
    instances: InstanceCounter,
}

impl<'a> DomWalker<'a> {
    pub fn new(dom: &'a mut DomStore, host: NodeKey) -> Result<Self, RenderError> {
        if !dom.contains(host) {
            return Err(DomPatchError::MissingKey(host).into());
        }
        let next = dom.first_child(host);
        Ok(Self {
            dom,
            host: Frame { parent: host, next },
            open: Vec::new(),
            instances: InstanceCounter::default(),
        })
    }

    pub fn dom(&self) -> &DomStore {
        self.dom
    }

    fn top(&self) -> Frame {
        self.open.last().map(|(_, frame)| *frame).unwrap_or(self.host)
    }

    fn top_mut(&mut self) -> &mut Frame {
        match self.open.last_mut() {
            Some((_, frame)) => frame,
            None => &mut self.host,
        }
    }

    /// Remove every child of the innermost open element from the cursor on.
    fn remove_rest(&mut self) -> Result<usize, RenderError> {
        let mut removed = 0;
        while let Some(next) = self.top().next {
            let after = self.dom.next_sibling(next);
            self.dom.remove(next)?;
            self.top_mut().next = after;
            removed += 1;
        }
        if removed > 0 {
            log::trace!(
                target: "idom.walker",
                "removed {removed} unvisited node(s) under {}",
                self.top().parent
            );
        }
        Ok(removed)
    }

    /// End the pass: every element must be closed; leftover host children are removed.
    pub fn finish(mut self) -> Result<(), RenderError> {
        if !self.open.is_empty() {
            return Err(RenderError::UnclosedElements(self.open.len()));
        }
        self.remove_rest()?;
        Ok(())
    }

    fn reusable_element(
        &self,
        candidate: NodeKey,
        name: &str,
        key: Option<&str>,
    ) -> Option<NodeKey> {
        if !self.dom.is_rendered(candidate) {
            return None;
        }
        match self.dom.kind(candidate) {
            Some(NodeKind::Element {
                name: existing,
                render_key,
                ..
            }) if existing.eq_ignore_ascii_case(name) && render_key.as_deref() == key => {
                Some(candidate)
            }
            _ => None,
        }
    }

    fn attributes_match(&self, el: NodeKey, attributes: &[(String, Option<String>)]) -> bool {
        match self.dom.kind(el) {
            Some(NodeKind::Element {
                attributes: existing,
                ..
            }) => {
                existing.len() == attributes.len()
                    && existing
                        .iter()
                        .zip(attributes)
                        .all(|((k, v), (ak, av))| k.eq_ignore_ascii_case(ak) && v == av)
            }
            _ => false,
        }
    }
}

impl RenderContext for DomWalker<'_> {
    fn live_tree(&mut self) -> Option<&mut dyn LiveTree> {
        Some(self)
    }

    fn open_element(
        &mut self,
        name: &str,
        key: Option<&str>,
        attributes: &[(String, Option<String>)],
    ) -> Result<(), RenderError> {
        let Frame { parent, next } = self.top();
        let reused = next.and_then(|candidate| self.reusable_element(candidate, name, key));
        let el = match reused {
            Some(el) => {
                if !self.attributes_match(el, attributes) {
                    self.dom.set_attributes(el, attributes)?;
                }
                el
            }
            None => {
                let el = self.dom.create_keyed_element(name, key, attributes);
                self.dom.mark_rendered(el)?;
                self.dom.insert_before(parent, el, next)?;
                log::trace!(target: "idom.walker", "created <{name}> {el} under {parent}");
                el
            }
        };
        self.top_mut().next = self.dom.next_sibling(el);
        let frame = Frame {
            parent: el,
            next: self.dom.first_child(el),
        };
        self.open.push((name.to_ascii_lowercase(), frame));
        Ok(())
    }

    fn close_element(&mut self, name: &str) -> Result<(), RenderError> {
        match self.open.last() {
            Some((open, _)) if open.eq_ignore_ascii_case(name) => {}
            other => {
                return Err(RenderError::UnbalancedClose {
                    expected: other.map(|(open, _)| open.clone()),
                    found: name.to_string(),
                });
            }
        }
        self.remove_rest()?;
        self.open.pop();
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), RenderError> {
        let Frame { parent, next } = self.top();
        if let Some(candidate) = next.filter(|key| self.dom.is_rendered(*key)) {
            let changed = match self.dom.kind(candidate) {
                Some(NodeKind::Text { text: existing }) => Some(existing != text),
                _ => None,
            };
            if let Some(changed) = changed {
                if changed {
                    self.dom.set_text(candidate, text)?;
                }
                self.top_mut().next = self.dom.next_sibling(candidate);
                return Ok(());
            }
        }
        let node = self.dom.create_text(text);
        self.dom.mark_rendered(node)?;
        self.dom.insert_before(parent, node, next)?;
        Ok(())
    }

    fn emit_verbatim(&mut self, text: &str) -> Result<(), RenderError> {
        self.text(text)
    }

    fn next_instance(&mut self, scope: u64) -> usize {
        self.instances.next(scope)
    }
}

impl LiveTree for DomWalker<'_> {
    fn doc_id(&self) -> DocId {
        self.dom.id()
    }

    fn cursor(&self) -> Cursor {
        let Frame { parent, next } = self.top();
        Cursor { parent, next }
    }

    fn current_node(&self) -> Option<NodeRef> {
        self.top().next.map(|key| self.dom.node_ref(key))
    }

    fn skip_node(&mut self) -> Result<(), RenderError> {
        let Frame { parent, next } = self.top();
        let Some(current) = next else {
            return Err(RenderError::CursorAtEnd { parent });
        };
        self.top_mut().next = self.dom.next_sibling(current);
        Ok(())
    }

    fn remove_current(&mut self) -> Result<NodeKey, RenderError> {
        let Frame { parent, next } = self.top();
        let Some(current) = next else {
            return Err(RenderError::CursorAtEnd { parent });
        };
        let after = self.dom.next_sibling(current);
        self.dom.remove(current)?;
        self.top_mut().next = after;
        Ok(current)
    }

    fn insert_before_cursor(&mut self, node: &html::Node) -> Result<NodeKey, RenderError> {
        let Frame { parent, next } = self.top();
        let key = self.dom.build_subtree(node)?;
        self.dom.insert_before(parent, key, next)?;
        Ok(key)
    }

    fn contains(&self, key: NodeKey) -> bool {
        self.dom.contains(key)
    }
}

/// Run one pass against the children of `host`, then drop unvisited leftovers.
pub fn patch<F, E>(dom: &mut DomStore, host: NodeKey, render: F) -> Result<(), E>
where
    F: FnOnce(&mut DomWalker<'_>) -> Result<(), E>,
    E: From<RenderError>,
{
    let mut walker = DomWalker::new(dom, host)?;
    render(&mut walker)?;
    walker.finish()?;
    Ok(())
}
