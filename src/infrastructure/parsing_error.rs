//! Error types for feed parsing and attribute extraction
//!
//! Feed errors are fatal for a run. Processing errors are per item and end
//! up as the item's error marker.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedParseError {
    #[error("Malformed feed XML at byte {position}: {message}")]
    Malformed { position: usize, message: String },

    #[error("Mismatched closing tag at byte {position}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unbound namespace prefix '{prefix}' at byte {position}")]
    UnboundPrefix { prefix: String, position: usize },

    #[error("Feed ended with {open} unclosed element(s)")]
    UnclosedElements { open: usize },

    #[error("Feed contains no root element")]
    NoRootElement,
}

impl FeedParseError {
    pub fn malformed(position: usize, message: impl ToString) -> Self {
        Self::Malformed {
            position,
            message: message.to_string(),
        }
    }
}

/// Fault raised while extracting attributes from a fetched page.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid extraction pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("extractor panicked: {0}")]
    Panicked(String),
}

impl ProcessingError {
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_pattern(name: &str, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type FeedResult<T> = Result<T, FeedParseError>;
pub type ProcessingResult<T> = Result<T, ProcessingError>;
