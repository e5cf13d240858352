//! Ordered collection of processed items plus the tabular views built on it

use serde::{Deserialize, Serialize};

use super::attributes::{AttributeBag, keys};

/// One bag per processed feed item, in feed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    records: Vec<AttributeBag>,
}

/// Succeeded vs failed counts for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.succeeded as f64 / self.total as f64 * 100.0;
        rate
    }
}

/// How many records carry a given attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeCoverage {
    pub attribute: String,
    pub found: usize,
    pub percentage: f64,
}

/// A failed record's URL and literal error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedItem<'a> {
    pub url: &'a str,
    pub error: &'a str,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, bag: AttributeBag) {
        self.records.push(bag);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AttributeBag] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeBag> {
        self.records.iter()
    }

    /// Output columns: `id, title, url`, then every other key in first-seen
    /// order, then `error` when at least one record failed.
    ///
    /// Base columns are listed only when some record actually has them.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = keys::BASE
            .iter()
            .filter(|base| self.records.iter().any(|bag| bag.contains(base)))
            .map(|base| (*base).to_string())
            .collect();

        for bag in &self.records {
            for key in bag.extracted_keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.to_string());
                }
            }
        }

        if self.records.iter().any(AttributeBag::is_failed) {
            columns.push(keys::ERROR.to_string());
        }
        columns
    }

    /// Rows aligned to [`Self::columns`], missing values as empty strings.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let columns = self.columns();
        self.records
            .iter()
            .map(|bag| {
                columns
                    .iter()
                    .map(|column| bag.get(column).unwrap_or_default().to_string())
                    .collect()
            })
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        let failed = self.records.iter().filter(|bag| bag.is_failed()).count();
        RunSummary {
            total: self.records.len(),
            succeeded: self.records.len() - failed,
            failed,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = FailedItem<'_>> {
        self.records.iter().filter_map(|bag| {
            bag.error().map(|error| FailedItem {
                url: bag.url(),
                error,
            })
        })
    }

    /// Coverage of every extracted attribute column, in column order.
    pub fn coverage(&self) -> Vec<AttributeCoverage> {
        let total = self.records.len();
        self.columns()
            .into_iter()
            .filter(|column| !keys::is_base(column) && column != keys::ERROR)
            .map(|attribute| {
                let found = self
                    .records
                    .iter()
                    .filter(|bag| bag.contains(&attribute))
                    .count();
                #[allow(clippy::cast_precision_loss)]
                let percentage = if total == 0 {
                    0.0
                } else {
                    found as f64 / total as f64 * 100.0
                };
                AttributeCoverage {
                    attribute,
                    found,
                    percentage,
                }
            })
            .collect()
    }
}

impl FromIterator<AttributeBag> for ResultSet {
    fn from_iter<T: IntoIterator<Item = AttributeBag>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = AttributeBag;
    type IntoIter = std::vec::IntoIter<AttributeBag>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a AttributeBag;
    type IntoIter = std::slice::Iter<'a, AttributeBag>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
