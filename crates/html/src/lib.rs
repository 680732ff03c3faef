pub mod entities;
pub mod fragment;
pub mod sanitize;
pub mod serialize;

mod tokenizer;
mod types;

pub use crate::fragment::{
    FragmentBuilder, FragmentError, HtmlFragmentBuilder, build_fragment, parse_fragment,
};
pub use crate::sanitize::{AllowlistSanitizer, SanitizeError, Sanitizer, SanitizerConfig};
pub use crate::serialize::to_html;
pub use crate::tokenizer::tokenize;
pub use crate::types::{Node, Token, is_rawtext_element, is_void_element};
