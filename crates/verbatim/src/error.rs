use html::{FragmentError, SanitizeError};
use idom::RenderError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerbatimError {
    Sanitize(SanitizeError),
    Fragment(FragmentError),
    Tree(RenderError),
    /// Markup reached a live tree but no sanitizer is configured.
    SanitizerMissing,
}

impl fmt::Display for VerbatimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerbatimError::Sanitize(err) => write!(f, "sanitizer failed: {err}"),
            VerbatimError::Fragment(err) => write!(f, "fragment parse failed: {err}"),
            VerbatimError::Tree(err) => write!(f, "live tree update failed: {err}"),
            VerbatimError::SanitizerMissing => {
                f.write_str("no sanitizer configured for live-tree rendering")
            }
        }
    }
}

impl std::error::Error for VerbatimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VerbatimError::Sanitize(err) => Some(err),
            VerbatimError::Fragment(err) => Some(err),
            VerbatimError::Tree(err) => Some(err),
            VerbatimError::SanitizerMissing => None,
        }
    }
}

impl From<SanitizeError> for VerbatimError {
    fn from(err: SanitizeError) -> Self {
        VerbatimError::Sanitize(err)
    }
}

impl From<FragmentError> for VerbatimError {
    fn from(err: FragmentError) -> Self {
        VerbatimError::Fragment(err)
    }
}

impl From<RenderError> for VerbatimError {
    fn from(err: RenderError) -> Self {
        VerbatimError::Tree(err)
    }
}
