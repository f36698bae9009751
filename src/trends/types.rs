use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sentinel bucket for cases with no symptom category.
pub const UNCLASSIFIED: &str = "unclassified";

/// `YYYY-MM` → (category or tag → count).
pub type MonthlyCounts = BTreeMap<String, BTreeMap<String, u32>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendVerdict {
    Rising,
    Stable,
    Absent,
}

impl TrendVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Stable => "stable",
            Self::Absent => "absent",
        }
    }
}

/// Rolling-window view of a case collection, keyed by tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub stats7: BTreeMap<String, u32>,
    pub stats30: BTreeMap<String, u32>,
    /// Earliest `YYYY-MM-DD` each tag was seen, over the whole corpus.
    pub first_appearance: BTreeMap<String, String>,
    pub verdicts: BTreeMap<String, TrendVerdict>,
    pub trend_summary: Vec<String>,
    /// Never empty.
    pub clinical_narrative: Vec<String>,
}
