use serde::{Deserialize, Serialize};
use std::fmt;

/// One product entry read from the shopping feed.
///
/// Only entries with an accepted detail-page URL become an `ItemRecord`;
/// `id` and `title` are optional and carried through to the output as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
}

impl ItemRecord {
    pub fn new(id: Option<String>, title: Option<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title,
            url: url.into(),
        }
    }

    /// Title used as a secondary signal source; empty when the feed had none.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Short label for log lines and progress messages.
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("No ID")
    }
}

impl fmt::Display for ItemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.label(), self.url)
    }
}
