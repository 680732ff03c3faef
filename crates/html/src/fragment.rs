//! Fragment construction: markup string to an ordered list of detached nodes.
//!
//! Tree construction is best effort. End tags close the nearest matching open
//! element (implicitly closing anything opened after it); end tags with no
//! matching open element are dropped; elements still open at the end of input
//! are closed. Doctype tokens are ignored inside fragments.
use crate::tokenizer::tokenize;
use crate::types::{Node, Token};
use std::fmt;

/// Parses sanitized markup into insertable nodes.
pub trait FragmentBuilder {
    fn parse_to_nodes(&self, markup: &str) -> Result<Vec<Node>, FragmentError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FragmentError {
    /// Element nesting exceeded the configured limit.
    TooDeep { limit: usize },
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentError::TooDeep { limit } => {
                write!(f, "fragment nesting exceeds {limit} open elements")
            }
        }
    }
}

impl std::error::Error for FragmentError {}

#[derive(Clone, Copy, Debug)]
pub struct HtmlFragmentBuilder {
    pub max_depth: usize,
}

impl HtmlFragmentBuilder {
    pub const DEFAULT_MAX_DEPTH: usize = 512;

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Default for HtmlFragmentBuilder {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

impl FragmentBuilder for HtmlFragmentBuilder {
    fn parse_to_nodes(&self, markup: &str) -> Result<Vec<Node>, FragmentError> {
        build_fragment(&tokenize(markup), self.max_depth)
    }
}

/// Parse with the default depth limit.
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>, FragmentError> {
    HtmlFragmentBuilder::default().parse_to_nodes(markup)
}

pub fn build_fragment(tokens: &[Token], max_depth: usize) -> Result<Vec<Node>, FragmentError> {
    let mut arena = NodeArena::default();
    let mut open_elements: Vec<usize> = Vec::new();

    for token in tokens {
        let parent = open_elements.last().copied();
        match token {
            Token::Doctype(_) => {}
            Token::Comment(text) => {
                arena.add(parent, ArenaNode::Comment { text: text.clone() });
            }
            Token::Text(text) => {
                if text.is_empty() {
                    continue;
                }
                // Adjacent text tokens merge, the way a parsed fragment would.
                if !arena.append_text(parent, text) {
                    arena.add(parent, ArenaNode::Text { text: text.clone() });
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if !*self_closing && open_elements.len() >= max_depth {
                    return Err(FragmentError::TooDeep { limit: max_depth });
                }
                let index = arena.add(
                    parent,
                    ArenaNode::Element {
                        name: name.clone(),
                        attributes: attributes.clone(),
                        children: Vec::new(),
                    },
                );
                if !*self_closing {
                    open_elements.push(index);
                }
            }
            Token::EndTag(name) => {
                let Some(depth) = open_elements
                    .iter()
                    .rposition(|&index| arena.is_element_named(index, name))
                else {
                    log::trace!(target: "html.fragment", "dropping unmatched end tag </{name}>");
                    continue;
                };
                open_elements.truncate(depth);
            }
        }
    }

    Ok(arena.into_nodes())
}

#[derive(Debug)]
enum ArenaNode {
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

#[derive(Debug, Default)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
    roots: Vec<usize>,
}

impl NodeArena {
    fn add(&mut self, parent: Option<usize>, node: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match parent {
            Some(parent) => match &mut self.nodes[parent] {
                ArenaNode::Element { children, .. } => children.push(index),
                _ => unreachable!("only elements are pushed onto the open stack"),
            },
            None => self.roots.push(index),
        }
        index
    }

    fn last_child(&self, parent: Option<usize>) -> Option<usize> {
        match parent {
            Some(parent) => match &self.nodes[parent] {
                ArenaNode::Element { children, .. } => children.last().copied(),
                _ => None,
            },
            None => self.roots.last().copied(),
        }
    }

    fn append_text(&mut self, parent: Option<usize>, text: &str) -> bool {
        let Some(last) = self.last_child(parent) else {
            return false;
        };
        match &mut self.nodes[last] {
            ArenaNode::Text { text: existing } => {
                existing.push_str(text);
                true
            }
            _ => false,
        }
    }

    fn is_element_named(&self, index: usize, target: &str) -> bool {
        matches!(&self.nodes[index], ArenaNode::Element { name, .. } if name == target)
    }

    /// Iterative post-order build, so deep fragments never recurse.
    fn into_nodes(self) -> Vec<Node> {
        let mut nodes: Vec<Option<ArenaNode>> = self.nodes.into_iter().map(Some).collect();
        let mut built: Vec<Node> = Vec::with_capacity(nodes.len());
        let mut stack: Vec<(usize, bool)> = self.roots.iter().rev().map(|&i| (i, false)).collect();

        while let Some((index, visited)) = stack.pop() {
            if !visited {
                stack.push((index, true));
                if let Some(ArenaNode::Element { children, .. }) = &nodes[index] {
                    for &child in children.iter().rev() {
                        stack.push((child, false));
                    }
                }
                continue;
            }
            let node = match nodes[index].take() {
                Some(ArenaNode::Element {
                    name,
                    attributes,
                    children,
                }) => {
                    let at = built.len() - children.len();
                    Node::Element {
                        name,
                        attributes,
                        children: built.split_off(at),
                    }
                }
                Some(ArenaNode::Text { text }) => Node::Text { text },
                Some(ArenaNode::Comment { text }) => Node::Comment { text },
                None => unreachable!("arena node visited twice"),
            };
            built.push(node);
        }
        built
    }
}
