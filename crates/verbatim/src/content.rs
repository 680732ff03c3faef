use crate::config::NonStringContent;
use serde_json::Value;

/// The value supplied for one call site, reduced to what the reconciler needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    /// A non-empty markup string. Also the region's content identity.
    Markup(String),
    /// Missing, null, empty, or a value the policy ignores.
    Empty,
}

impl Content {
    pub fn from_value(value: &Value, non_string: NonStringContent) -> Self {
        match value {
            Value::String(s) => Content::from(s.as_str()),
            Value::Null => Content::Empty,
            Value::Bool(_) | Value::Number(_) => match non_string {
                NonStringContent::Ignore => Content::Empty,
                NonStringContent::Coerce => Content::Markup(value.to_string()),
            },
            Value::Array(_) | Value::Object(_) => {
                log::debug!(target: "verbatim.reconcile", "ignoring structured value as content");
                Content::Empty
            }
        }
    }

    /// The content identity, if any.
    pub fn as_markup(&self) -> Option<&str> {
        match self {
            Content::Markup(markup) => Some(markup),
            Content::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Empty)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Content::Empty
        } else {
            Content::Markup(value.to_string())
        }
    }
}

impl From<Option<&str>> for Content {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Content::Empty, Content::from)
    }
}
