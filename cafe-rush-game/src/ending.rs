//! Ending selection from the final run score.
use serde::{Deserialize, Serialize};

/// A single scored ending tier.
///
/// Score ranges come straight from configuration and may overlap or leave
/// gaps; resolution tolerates both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub score_min: i64,
    #[serde(default)]
    pub score_max: i64,
}

impl EndingRecord {
    fn fallback() -> Self {
        Self {
            id: "newbie".to_string(),
            name: "Novice Barista".to_string(),
            score_min: 0,
            score_max: 599,
        }
    }
}

/// Ending tiers pre-sorted ascending by `score_min`.
///
/// Sorting happens once at load so that resolution is a simple reverse scan.
/// The table is never empty: a missing or empty configuration installs the
/// built-in fallback tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EndingRecord>", into = "Vec<EndingRecord>")]
pub struct EndingTable {
    records: Vec<EndingRecord>,
}

impl Default for EndingTable {
    fn default() -> Self {
        Self::from_records(Vec::new())
    }
}

impl From<Vec<EndingRecord>> for EndingTable {
    fn from(records: Vec<EndingRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<EndingTable> for Vec<EndingRecord> {
    fn from(table: EndingTable) -> Self {
        table.records
    }
}

impl EndingTable {
    /// Build a table from configured records, sorting ascending by
    /// `score_min` and substituting the fallback tier when empty.
    #[must_use]
    pub fn from_records(mut records: Vec<EndingRecord>) -> Self {
        if records.is_empty() {
            records.push(EndingRecord::fallback());
        }
        records.sort_by_key(|record| record.score_min);
        Self { records }
    }

    /// All tiers, ascending by `score_min`.
    #[must_use]
    pub fn records(&self) -> &[EndingRecord] {
        &self.records
    }

    /// Select the ending for a final score.
    ///
    /// Scans from the highest threshold downward and returns the first tier
    /// whose `score_min` is at or below the score; when the score sits below
    /// every threshold the lowest tier is returned. Total for any score.
    #[must_use]
    pub fn resolve(&self, final_score: i64) -> &EndingRecord {
        self.records
            .iter()
            .rev()
            .find(|record| record.score_min <= final_score)
            .unwrap_or_else(|| &self.records[0])
    }
}
