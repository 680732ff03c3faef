//! Template compilation.
//!
//! Markup is tokenized with the `html` tokenizer; text runs are then split on
//! `{{ ... }}` mustaches. A mustache holds a helper name followed by
//! whitespace-separated argument paths, or a single data path whose value is
//! rendered as text. Every mustache gets a site index, unique within the
//! template, which the environment turns into a region key.

use crate::error::TemplateError;
use html::{Token, is_void_element, tokenize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Attribute that sets an element's render key instead of being rendered.
pub const KEY_ATTRIBUTE: &str = "key";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instr {
    Open {
        name: String,
        key: Option<String>,
        attributes: Vec<(String, Option<String>)>,
    },
    Close {
        name: String,
    },
    Text(String),
    Mustache {
        site: usize,
        head: String,
        args: Vec<String>,
    },
}

#[derive(Clone, Debug)]
pub struct Template {
    id: u64,
    instrs: Vec<Instr>,
    sites: usize,
}

impl Template {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let mut instrs = Vec::new();
        let mut open: Vec<String> = Vec::new();
        let mut sites = 0usize;

        for token in tokenize(source) {
            match token {
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    let mut key = None;
                    let mut kept = Vec::with_capacity(attributes.len());
                    for (attr, value) in attributes {
                        if attr.contains("{{")
                            || value.as_deref().is_some_and(|v| v.contains("{{"))
                        {
                            return Err(TemplateError::MustacheInTag { tag: name });
                        }
                        if attr == KEY_ATTRIBUTE {
                            key = value;
                        } else {
                            kept.push((attr, value));
                        }
                    }
                    instrs.push(Instr::Open {
                        name: name.clone(),
                        key,
                        attributes: kept,
                    });
                    if self_closing || is_void_element(&name) {
                        instrs.push(Instr::Close { name });
                    } else {
                        open.push(name);
                    }
                }
                Token::EndTag(name) => {
                    if is_void_element(&name) {
                        continue;
                    }
                    match open.last() {
                        Some(top) if *top == name => {
                            open.pop();
                            instrs.push(Instr::Close { name });
                        }
                        top => {
                            return Err(TemplateError::UnbalancedTag {
                                expected: top.cloned(),
                                found: name,
                            });
                        }
                    }
                }
                Token::Text(text) => split_mustaches(&text, &mut sites, &mut instrs)?,
                Token::Comment(_) | Token::Doctype(_) => {}
            }
        }

        if let Some(name) = open.pop() {
            return Err(TemplateError::UnclosedTag(name));
        }

        Ok(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            instrs,
            sites,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Number of mustache call sites.
    pub fn sites(&self) -> usize {
        self.sites
    }

    /// Region key of call site `site` in the `instance`-th render of this
    /// template within one pass. Stable across passes that render the
    /// template the same number of times in the same order.
    pub fn region_key(&self, instance: usize, site: usize) -> core_types::RegionKey {
        core_types::RegionKey::from(format!("t{}#{}:{}", self.id, instance, site))
    }
}

fn split_mustaches(text: &str, sites: &mut usize, out: &mut Vec<Instr>) -> Result<(), TemplateError> {
    let mut rest = text;
    while let Some(start) = rest.find("{{") {
        if start > 0 {
            out.push(Instr::Text(rest[..start].to_string()));
        }
        let inner_start = start + 2;
        let Some(len) = rest[inner_start..].find("}}") else {
            return Err(TemplateError::UnterminatedMustache(
                rest[start..].chars().take(32).collect(),
            ));
        };
        let mut words = rest[inner_start..inner_start + len].split_whitespace();
        let Some(head) = words.next() else {
            return Err(TemplateError::EmptyMustache);
        };
        out.push(Instr::Mustache {
            site: *sites,
            head: head.to_string(),
            args: words.map(str::to_string).collect(),
        });
        *sites += 1;
        let consumed = inner_start + len + 2;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        out.push(Instr::Text(rest.to_string()));
    }
    Ok(())
}
