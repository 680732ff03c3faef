//! Inject sanitized, externally supplied markup into an incrementally
//! rendered tree without disturbing the renderer's own nodes.
//!
//! ```
//! use inc_verbatim::{DomStore, Environment, register_verbatim_helper};
//! use serde_json::json;
//!
//! let mut env = Environment::new();
//! register_verbatim_helper(&mut env);
//! let template = env.compile("<div>{{ idomVerbatim html }}</div>").unwrap();
//!
//! let mut dom = DomStore::new();
//! let host = dom.create_element("main", &[]);
//! let root = dom.root();
//! dom.append_child(root, host).unwrap();
//!
//! let data = json!({ "html": "<h1 onclick=\"x()\">Hi</h1>" });
//! env.patch(&mut dom, host, &template, &data).unwrap();
//! assert_eq!(dom.inner_html(host).unwrap(), "<div><h1>Hi</h1></div>");
//! ```

pub use core_types::{DocId, NodeKey, NodeRef, RegionKey};
pub use dom_store::{DomPatch, DomPatchError, DomStore, NodeKind};
pub use html::{
    AllowlistSanitizer, FragmentBuilder, FragmentError, HtmlFragmentBuilder, SanitizeError,
    Sanitizer, SanitizerConfig,
};
pub use idom::{
    Cursor, DomWalker, InstanceCounter, LiveTree, RenderContext, RenderError, StringRenderer,
};
pub use template::{Environment, Helper, HelperEnv, HelperOptions, Template, TemplateError};
pub use verbatim::{
    Content, NonStringContent, ReconcileOutcome, RegionTags, Verbatim, VerbatimConfig,
    VerbatimError, register_verbatim_helper, register_verbatim_helper_with,
};
