//! Verbatim markup injection for the incremental renderer.
//!
//! [`Verbatim`] reconciles one region of foreign markup per call: unchanged
//! content is skipped without touching the tree, changed content is removed
//! and replaced with sanitized nodes, and text-only backends get the content
//! verbatim. Ownership of injected nodes is tracked in [`RegionTags`].

mod config;
mod content;
mod error;
mod helper;
mod reconcile;
pub mod tags;

pub use crate::config::{DEFAULT_HELPER_NAMES, NonStringContent, VerbatimConfig};
pub use crate::content::Content;
pub use crate::error::VerbatimError;
pub use crate::helper::{register_verbatim_helper, register_verbatim_helper_with};
pub use crate::reconcile::{ReconcileOutcome, Verbatim};
pub use crate::tags::{NodeTag, RegionTags};
