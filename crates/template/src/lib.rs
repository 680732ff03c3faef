//! Minimal mustache templating over the incremental renderer.
//!
//! Templates are markup with `{{ helper arg.path }}` call sites. Rendering
//! drives a [`idom::RenderContext`], so one compiled template can render to a
//! string or patch a live tree.

mod compile;
mod env;
mod error;

pub use crate::compile::{Instr, KEY_ATTRIBUTE, Template};
pub use crate::env::{Environment, Helper, HelperEnv, HelperOptions, lookup};
pub use crate::error::{HelperError, TemplateError};
pub use serde_json::Value;
