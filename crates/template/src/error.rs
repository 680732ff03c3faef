use idom::RenderError;
use std::fmt;

pub type HelperError = Box<dyn std::error::Error>;

#[derive(Debug)]
pub enum TemplateError {
    /// `{{` without a closing `}}`; holds the start of the mustache.
    UnterminatedMustache(String),
    EmptyMustache,
    /// Mustaches are only allowed in text, not in tag names or attributes.
    MustacheInTag { tag: String },
    UnbalancedTag { expected: Option<String>, found: String },
    UnclosedTag(String),
    UnknownHelper(String),
    Helper { name: String, source: HelperError },
    Render(RenderError),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::UnterminatedMustache(near) => {
                write!(f, "unterminated mustache near `{near}`")
            }
            TemplateError::EmptyMustache => f.write_str("empty mustache"),
            TemplateError::MustacheInTag { tag } => {
                write!(f, "mustache inside <{tag}> is not supported")
            }
            TemplateError::UnbalancedTag {
                expected: Some(expected),
                found,
            } => write!(f, "found </{found}> while <{expected}> is open"),
            TemplateError::UnbalancedTag {
                expected: None,
                found,
            } => write!(f, "found </{found}> with no open element"),
            TemplateError::UnclosedTag(name) => write!(f, "<{name}> is never closed"),
            TemplateError::UnknownHelper(name) => write!(f, "no helper named `{name}`"),
            TemplateError::Helper { name, source } => write!(f, "helper `{name}` failed: {source}"),
            TemplateError::Render(err) => write!(f, "render failed: {err}"),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Helper { source, .. } => Some(source.as_ref()),
            TemplateError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RenderError> for TemplateError {
    fn from(err: RenderError) -> Self {
        TemplateError::Render(err)
    }
}
