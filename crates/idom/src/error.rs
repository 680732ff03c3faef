use core_types::NodeKey;
use dom_store::DomPatchError;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    Dom(DomPatchError),
    /// `close_element` did not match the innermost open element.
    UnbalancedClose {
        expected: Option<String>,
        found: String,
    },
    /// The pass ended with elements still open.
    UnclosedElements(usize),
    /// The cursor was at end of children.
    CursorAtEnd { parent: NodeKey },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Dom(err) => write!(f, "tree update failed: {err}"),
            RenderError::UnbalancedClose {
                expected: Some(expected),
                found,
            } => write!(f, "closing </{found}> while <{expected}> is open"),
            RenderError::UnbalancedClose {
                expected: None,
                found,
            } => write!(f, "closing </{found}> with no open element"),
            RenderError::UnclosedElements(n) => write!(f, "{n} element(s) left open"),
            RenderError::CursorAtEnd { parent } => {
                write!(f, "cursor is at the end of {parent}'s children")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Dom(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DomPatchError> for RenderError {
    fn from(err: DomPatchError) -> Self {
        RenderError::Dom(err)
    }
}
