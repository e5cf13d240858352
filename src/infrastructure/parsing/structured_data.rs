//! Identifier lookup in embedded JSON-LD script blocks

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::DocumentScanner;
use super::table_scan::parse_selector;
use crate::infrastructure::parsing_error::ProcessingResult;

const LINKED_DATA_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Identifier fields checked on each top-level JSON object, in order.
pub const IDENTIFIER_FIELDS: [&str; 3] = ["gtin", "gtin13", "sku"];

/// Outcome of looking at one script block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkedDataLookup {
    Found(String),
    NotFound,
    /// The payload was not valid JSON.
    Malformed(String),
}

/// Finds the first product identifier across all JSON-LD blocks.
#[derive(Debug, Clone)]
pub struct LinkedDataScanner {
    scripts: Selector,
}

impl LinkedDataScanner {
    pub fn new() -> ProcessingResult<Self> {
        Ok(Self {
            scripts: parse_selector(LINKED_DATA_SELECTOR)?,
        })
    }

    /// Look for an identifier in one payload. Only a top-level object is
    /// inspected; arrays and `@graph` wrappers are not descended into.
    pub fn lookup(payload: &str) -> LinkedDataLookup {
        let data: Value = match serde_json::from_str(payload) {
            Ok(data) => data,
            Err(e) => return LinkedDataLookup::Malformed(e.to_string()),
        };
        let Value::Object(object) = data else {
            return LinkedDataLookup::NotFound;
        };
        IDENTIFIER_FIELDS
            .iter()
            .filter_map(|field| object.get(*field))
            .find_map(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map_or(LinkedDataLookup::NotFound, LinkedDataLookup::Found)
    }
}

impl DocumentScanner for LinkedDataScanner {
    type Output = Option<String>;

    fn scan(&self, document: &Html) -> Self::Output {
        for script in document.select(&self.scripts) {
            let payload = script.text().collect::<String>();
            match Self::lookup(&payload) {
                LinkedDataLookup::Found(identifier) => return Some(identifier),
                LinkedDataLookup::NotFound => {}
                LinkedDataLookup::Malformed(reason) => {
                    debug!("Skipping malformed JSON-LD block: {}", reason);
                }
            }
        }
        None
    }
}
