use html::{AllowlistSanitizer, FragmentBuilder, HtmlFragmentBuilder, Sanitizer};
use std::fmt;
use std::sync::Arc;

/// Helper names registered by [`crate::register_verbatim_helper`].
pub const DEFAULT_HELPER_NAMES: &[&str] = &["incVerbatim", "idomVerbatim"];

/// What to do with a non-empty content value that is not a string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonStringContent {
    /// Treat it as empty content.
    #[default]
    Ignore,
    /// Use its plain string form (`42`, `true`) as markup.
    Coerce,
}

#[derive(Clone)]
pub struct VerbatimConfig {
    /// Required on live trees; the text-only path never sanitizes.
    pub sanitizer: Option<Arc<dyn Sanitizer>>,
    pub fragment_builder: Arc<dyn FragmentBuilder>,
    pub non_string: NonStringContent,
    pub helper_names: Vec<String>,
}

impl Default for VerbatimConfig {
    fn default() -> Self {
        Self {
            sanitizer: Some(Arc::new(AllowlistSanitizer::default())),
            fragment_builder: Arc::new(HtmlFragmentBuilder::default()),
            non_string: NonStringContent::default(),
            helper_names: DEFAULT_HELPER_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VerbatimConfig {
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Some(Arc::new(sanitizer));
        self
    }

    pub fn without_sanitizer(mut self) -> Self {
        self.sanitizer = None;
        self
    }

    pub fn with_fragment_builder(mut self, builder: impl FragmentBuilder + 'static) -> Self {
        self.fragment_builder = Arc::new(builder);
        self
    }

    pub fn with_non_string(mut self, policy: NonStringContent) -> Self {
        self.non_string = policy;
        self
    }

    pub fn with_helper_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.helper_names = names.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Debug for VerbatimConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerbatimConfig")
            .field("sanitizer", &self.sanitizer.is_some())
            .field("non_string", &self.non_string)
            .field("helper_names", &self.helper_names)
            .finish_non_exhaustive()
    }
}
