//! Key/value extraction from literal `<table>` markup

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::DocumentScanner;
use crate::domain::keys;
use crate::infrastructure::parsing_error::{ProcessingError, ProcessingResult};

const TABLE_SELECTOR: &str = "table";
const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td, th";

/// Classify a row label. Checks run in this order; the first hit decides.
pub fn classify_label(label: &str) -> Option<&'static str> {
    let label = label.to_lowercase();
    if label.contains("dimension") || label.contains("size") {
        Some(keys::SIZE)
    } else if label.contains("weight") {
        Some(keys::WEIGHT)
    } else if label.contains("colour") || label.contains("color") {
        Some(keys::TABLE_COLOUR)
    } else if label.contains("material") {
        Some(keys::MATERIAL)
    } else {
        None
    }
}

/// Scans every table row with two or more cells. Rows are visited in
/// document order and a later row overwrites an earlier one for the same key.
#[derive(Debug, Clone)]
pub struct TableScanner {
    tables: Selector,
    rows: Selector,
    cells: Selector,
}

impl TableScanner {
    pub fn new() -> ProcessingResult<Self> {
        Ok(Self {
            tables: parse_selector(TABLE_SELECTOR)?,
            rows: parse_selector(ROW_SELECTOR)?,
            cells: parse_selector(CELL_SELECTOR)?,
        })
    }

    fn cell_text(cell: ElementRef<'_>) -> String {
        cell.text().collect::<String>().trim().to_string()
    }
}

impl DocumentScanner for TableScanner {
    type Output = IndexMap<String, String>;

    fn scan(&self, document: &Html) -> Self::Output {
        let mut found = IndexMap::new();
        for table in document.select(&self.tables) {
            for row in table.select(&self.rows) {
                let mut cells = row.select(&self.cells);
                let (Some(label), Some(value)) = (cells.next(), cells.next()) else {
                    continue;
                };
                let label = Self::cell_text(label);
                if let Some(key) = classify_label(&label) {
                    let value = Self::cell_text(value);
                    debug!("Table row '{}' -> {} = '{}'", label, key, value);
                    found.insert(key.to_string(), value);
                }
            }
        }
        found
    }
}

pub(crate) fn parse_selector(selector: &str) -> ProcessingResult<Selector> {
    Selector::parse(selector).map_err(|e| ProcessingError::invalid_selector(selector, format!("{e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scan(html: &str) -> IndexMap<String, String> {
        TableScanner::new().unwrap().scan(&Html::parse_document(html))
    }

    #[rstest]
    #[case("Dimensions", Some("size"))]
    #[case("Pack Size", Some("size"))]
    #[case("Net Weight", Some("weight"))]
    #[case("Colour", Some("colour"))]
    #[case("COLOR", Some("colour"))]
    #[case("Frame material", Some("material"))]
    #[case("Size / Weight", Some("size"))]
    #[case("Brand", None)]
    fn classifies_first_cell(#[case] label: &str, #[case] expected: Option<&str>) {
        assert_eq!(classify_label(label), expected);
    }

    #[test]
    fn last_qualifying_row_wins() {
        let found = scan(
            "<table>
               <tr><th>Weight</th><td>1 kg</td></tr>
               <tr><td>Colour</td><td> Navy </td></tr>
               <tr><td>Shipping weight</td><td>1.4 kg</td></tr>
             </table>",
        );
        assert_eq!(found.get("weight").map(String::as_str), Some("1.4 kg"));
        assert_eq!(found.get("colour").map(String::as_str), Some("Navy"));
        assert_eq!(found.keys().collect::<Vec<_>>(), vec!["weight", "colour"]);
    }

    #[test]
    fn later_tables_overwrite_earlier_ones() {
        let found = scan(
            "<table><tr><td>Material</td><td>Oak</td></tr></table>
             <table><tr><td>Material</td><td>Pine</td></tr></table>",
        );
        assert_eq!(found.get("material").map(String::as_str), Some("Pine"));
    }

    #[test]
    fn single_cell_rows_and_unknown_labels_are_ignored() {
        let found = scan(
            "<table>
               <tr><td>Weight</td></tr>
               <tr><td>Warranty</td><td>2 years</td></tr>
             </table>",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn page_without_tables_yields_nothing() {
        assert!(scan("<p>Weight: 2 kg</p>").is_empty());
    }
}
