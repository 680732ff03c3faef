//! Allowlist sanitizer for untrusted markup.
//!
//! The sanitizer works on the token stream and re-serializes, so its output is
//! always well-formed: every emitted start tag is closed, text is escaped, and
//! nothing outside the allowlists survives.
//!
//! Rules, in order:
//! - Content-dropping elements (`script`, `style`, `iframe`, ...) are removed
//!   together with everything inside them.
//! - Other elements not on the tag allowlist are unwrapped: the tag goes, the
//!   children stay.
//! - Attributes must be on the attribute allowlist (or `data-*`/`aria-*` when
//!   enabled). Event handlers (`on*`) are never kept.
//! - URL-bearing attributes keep their value only for relative URLs or an
//!   allowed scheme.
//! - Comments and doctypes are dropped.
use crate::entities::escape_text;
use crate::serialize::{write_end_tag, write_start_tag};
use crate::tokenizer::tokenize;
use crate::types::{Token, is_void_element};
use std::collections::HashSet;
use std::fmt;

/// Strips executable and unsafe constructs from markup. Pure; no I/O.
pub trait Sanitizer {
    fn sanitize(&self, markup: &str) -> Result<String, SanitizeError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanitizeError {
    InputTooLarge { len: usize, limit: usize },
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanitizeError::InputTooLarge { len, limit } => {
                write!(f, "markup is {len} bytes, sanitizer limit is {limit}")
            }
        }
    }
}

impl std::error::Error for SanitizeError {}

const DEFAULT_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "b", "blockquote", "br", "caption", "cite", "code", "col",
    "colgroup", "dd", "del", "details", "div", "dl", "dt", "em", "figcaption", "figure", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "i", "img", "ins", "kbd", "li", "main",
    "mark", "nav", "ol", "p", "pre", "q", "s", "samp", "section", "small", "span", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "tfoot", "th", "thead", "time", "tr", "u", "ul",
];

const DEFAULT_ATTRIBUTES: &[&str] = &[
    "alt", "cite", "class", "colspan", "datetime", "dir", "height", "href", "id", "lang", "open",
    "rel", "rowspan", "src", "title", "width",
];

const DEFAULT_DROP_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "frame", "frameset",
    "applet", "svg", "math",
];

const DEFAULT_URL_ATTRIBUTES: &[&str] = &["href", "src", "cite", "action", "formaction", "poster"];

const DEFAULT_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Clone, Debug)]
pub struct SanitizerConfig {
    pub allowed_tags: HashSet<String>,
    pub allowed_attributes: HashSet<String>,
    pub allow_data_attributes: bool,
    pub url_attributes: HashSet<String>,
    pub allowed_schemes: HashSet<String>,
    pub drop_content_tags: HashSet<String>,
    pub max_input_bytes: usize,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            allowed_tags: to_set(DEFAULT_TAGS),
            allowed_attributes: to_set(DEFAULT_ATTRIBUTES),
            allow_data_attributes: true,
            url_attributes: to_set(DEFAULT_URL_ATTRIBUTES),
            allowed_schemes: to_set(DEFAULT_SCHEMES),
            drop_content_tags: to_set(DEFAULT_DROP_CONTENT),
            max_input_bytes: 1 << 20,
        }
    }
}

impl SanitizerConfig {
    pub fn allow_tag(mut self, name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        self.drop_content_tags.remove(&name);
        self.allowed_tags.insert(name);
        self
    }

    pub fn deny_tag(mut self, name: &str) -> Self {
        self.allowed_tags.remove(&name.to_ascii_lowercase());
        self
    }

    pub fn allow_attribute(mut self, name: &str) -> Self {
        self.allowed_attributes.insert(name.to_ascii_lowercase());
        self
    }

    pub fn allow_scheme(mut self, scheme: &str) -> Self {
        self.allowed_schemes.insert(scheme.to_ascii_lowercase());
        self
    }

    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = limit;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct AllowlistSanitizer {
    config: SanitizerConfig,
}

impl AllowlistSanitizer {
    pub fn new(config: SanitizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SanitizerConfig {
        &self.config
    }

    fn keep_attribute(&self, element: &str, name: &str, value: Option<&str>) -> bool {
        if name.starts_with("on") {
            return false;
        }
        let listed = self.config.allowed_attributes.contains(name)
            || (self.config.allow_data_attributes
                && (name.starts_with("data-") || name.starts_with("aria-")));
        if !listed {
            return false;
        }
        if self.config.url_attributes.contains(name) {
            let Some(value) = value else {
                return true;
            };
            if !self.url_is_allowed(value) {
                log::debug!(
                    target: "html.sanitize",
                    "dropping {element}[{name}]: disallowed URL {value:?}"
                );
                return false;
            }
        }
        true
    }

    fn url_is_allowed(&self, value: &str) -> bool {
        // Browsers ignore ASCII whitespace and control characters inside a
        // scheme, so `java\tscript:` must be judged as `javascript:`.
        let compact: String = value
            .chars()
            .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
            .collect();
        match url::Url::parse(&compact) {
            Ok(parsed) => self.config.allowed_schemes.contains(parsed.scheme()),
            Err(url::ParseError::RelativeUrlWithoutBase) => true,
            Err(_) => false,
        }
    }
}

impl Sanitizer for AllowlistSanitizer {
    fn sanitize(&self, markup: &str) -> Result<String, SanitizeError> {
        if markup.len() > self.config.max_input_bytes {
            return Err(SanitizeError::InputTooLarge {
                len: markup.len(),
                limit: self.config.max_input_bytes,
            });
        }

        let mut out = String::with_capacity(markup.len());
        let mut open: Vec<String> = Vec::new();
        // Name and nesting depth of the content-dropping element being skipped.
        let mut dropping: Option<(String, usize)> = None;

        for token in tokenize(markup) {
            if let Some((name, depth)) = dropping.as_mut() {
                match &token {
                    Token::StartTag {
                        name: start,
                        self_closing: false,
                        ..
                    } if *start == *name => *depth += 1,
                    Token::EndTag(end) if *end == *name => {
                        *depth -= 1;
                        if *depth == 0 {
                            dropping = None;
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match token {
                Token::Text(text) => escape_text(&text, &mut out),
                Token::Comment(_) | Token::Doctype(_) => {}
                Token::StartTag {
                    name,
                    attributes,
                    self_closing,
                } => {
                    if self.config.drop_content_tags.contains(&name) {
                        log::debug!(target: "html.sanitize", "dropping <{name}> and its content");
                        if !self_closing {
                            dropping = Some((name, 1));
                        }
                        continue;
                    }
                    if !self.config.allowed_tags.contains(&name) {
                        log::trace!(target: "html.sanitize", "unwrapping <{name}>");
                        continue;
                    }
                    let kept: Vec<(String, Option<String>)> = attributes
                        .into_iter()
                        .filter(|(attr, value)| self.keep_attribute(&name, attr, value.as_deref()))
                        .collect();
                    write_start_tag(&name, &kept, &mut out);
                    if !self_closing && !is_void_element(&name) {
                        open.push(name);
                    }
                }
                Token::EndTag(name) => {
                    let Some(depth) = open.iter().rposition(|n| *n == name) else {
                        continue;
                    };
                    for closing in open.drain(depth..).rev() {
                        write_end_tag(&closing, &mut out);
                    }
                }
            }
        }

        for closing in open.drain(..).rev() {
            write_end_tag(&closing, &mut out);
        }
        Ok(out)
    }
}
