use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::types::TrendAnalysis;

const BUNDLED_SIGNALS: &str = include_str!("../../resources/clinical_signals.json");

const FALLBACK_DEFAULT_LINE: &str = "No significant deterioration recorded this week.";

/// One named clinical signal: which tags it watches, when it fires,
/// and what it says. Templates accept `{tag}`, `{count7}` and `{count30}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSignal {
    /// Exact tag, or a prefix followed by `*`.
    pub tag_pattern: String,
    /// Fires when the 7-day count exceeds `threshold × 30-day count`.
    pub threshold: f64,
    pub narrative_template: String,
    /// Used when the tag has been seen exactly once, this week.
    #[serde(default)]
    pub first_seen_template: Option<String>,
}

impl ClinicalSignal {
    pub fn matches(&self, tag: &str) -> bool {
        match self.tag_pattern.strip_suffix('*') {
            Some(prefix) => tag.starts_with(prefix),
            None => tag == self.tag_pattern,
        }
    }
}

/// Externally supplied table of clinical signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalTable {
    pub signals: Vec<ClinicalSignal>,
    /// Emitted when nothing else fires, so the narrative is never empty.
    pub default_line: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SignalTableError {
    #[error("Failed to read signal table {0}: {1}")]
    Load(String, String),
    #[error("Failed to parse signal table {0}: {1}")]
    Parse(String, String),
}

impl SignalTable {
    /// Load a table from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SignalTableError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SignalTableError::Load(path.display().to_string(), e.to_string()))?;
        Self::from_json(&json)
            .map_err(|e| SignalTableError::Parse(path.display().to_string(), e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The table shipped in `resources/clinical_signals.json`.
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_SIGNALS).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Bundled clinical signal table is invalid");
            Self::empty()
        })
    }

    /// No signals; only the default line.
    pub fn empty() -> Self {
        Self {
            signals: Vec::new(),
            default_line: FALLBACK_DEFAULT_LINE.to_string(),
        }
    }

    /// Narrative lines for a trend analysis. `totals` is the all-time
    /// case count per tag, used to detect a first appearance.
    pub fn narrate(&self, analysis: &TrendAnalysis, totals: &BTreeMap<String, u32>) -> Vec<String> {
        let mut lines = Vec::new();
        for signal in &self.signals {
            let matching: Vec<&String> = analysis
                .stats30
                .keys()
                .chain(totals.keys())
                .filter(|tag| signal.matches(tag))
                .collect();
            let mut tags: Vec<&String> = matching;
            tags.sort();
            tags.dedup();
            if tags.is_empty() {
                continue;
            }

            let count7: u32 = tags.iter().filter_map(|t| analysis.stats7.get(*t)).sum();
            let count30: u32 = tags.iter().filter_map(|t| analysis.stats30.get(*t)).sum();
            let total: u32 = tags.iter().filter_map(|t| totals.get(*t)).sum();
            if count7 == 0 {
                continue;
            }

            let label = tags.first().map(|t| t.as_str()).unwrap_or(signal.tag_pattern.as_str());
            let template = if total == 1 {
                signal
                    .first_seen_template
                    .as_deref()
                    .unwrap_or(signal.narrative_template.as_str())
            } else if f64::from(count7) > signal.threshold * f64::from(count30) {
                signal.narrative_template.as_str()
            } else {
                continue;
            };
            lines.push(render(template, label, count7, count30));
        }

        if lines.is_empty() {
            lines.push(self.default_line.clone());
        }
        lines
    }
}

impl Default for SignalTable {
    fn default() -> Self {
        Self::bundled()
    }
}

fn render(template: &str, tag: &str, count7: u32, count30: u32) -> String {
    template
        .replace("{tag}", tag)
        .replace("{count7}", &count7.to_string())
        .replace("{count30}", &count30.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis(rows: &[(&str, u32, u32)]) -> TrendAnalysis {
        let mut a = TrendAnalysis::default();
        for (tag, c7, c30) in rows {
            a.stats7.insert(tag.to_string(), *c7);
            a.stats30.insert(tag.to_string(), *c30);
        }
        a
    }

    fn totals(rows: &[(&str, u32)]) -> BTreeMap<String, u32> {
        rows.iter().map(|(t, n)| (t.to_string(), *n)).collect()
    }

    fn table() -> SignalTable {
        SignalTable {
            signals: vec![ClinicalSignal {
                tag_pattern: "short-term-memory-loss".into(),
                threshold: 0.5,
                narrative_template: "{tag}: {count7}/{count30}".into(),
                first_seen_template: Some("first {tag}".into()),
            }],
            default_line: "quiet week".into(),
        }
    }

    #[test]
    fn bundled_table_parses_and_is_non_trivial() {
        let table = SignalTable::from_json(BUNDLED_SIGNALS).unwrap();
        assert!(table.signals.len() >= 4);
        assert!(!table.default_line.is_empty());
        assert!(table.signals.iter().any(|s| s.matches("semantic-confusion")));
    }

    #[test]
    fn default_line_when_nothing_fires() {
        let lines = table().narrate(&analysis(&[("fall", 1, 1)]), &totals(&[("fall", 1)]));
        assert_eq!(lines, vec!["quiet week"]);
    }

    #[test]
    fn fires_above_threshold() {
        let a = analysis(&[("short-term-memory-loss", 3, 4)]);
        let lines = table().narrate(&a, &totals(&[("short-term-memory-loss", 6)]));
        assert_eq!(lines, vec!["short-term-memory-loss: 3/4"]);
    }

    #[test]
    fn silent_at_or_below_threshold() {
        let a = analysis(&[("short-term-memory-loss", 2, 4)]);
        let lines = table().narrate(&a, &totals(&[("short-term-memory-loss", 9)]));
        assert_eq!(lines, vec!["quiet week"]);
    }

    #[test]
    fn first_appearance_uses_first_seen_template() {
        let a = analysis(&[("short-term-memory-loss", 1, 1)]);
        let lines = table().narrate(&a, &totals(&[("short-term-memory-loss", 1)]));
        assert_eq!(lines, vec!["first short-term-memory-loss"]);
    }

    #[test]
    fn prefix_patterns_aggregate_tags() {
        let signal = ClinicalSignal {
            tag_pattern: "memory-*".into(),
            threshold: 0.5,
            narrative_template: "{count7} of {count30}".into(),
            first_seen_template: None,
        };
        assert!(signal.matches("memory-decline"));
        assert!(!signal.matches("short-term-memory-loss"));
        let table = SignalTable { signals: vec![signal], default_line: "x".into() };
        let a = analysis(&[("memory-decline", 2, 2), ("memory-lapse", 1, 3)]);
        let lines = table.narrate(&a, &totals(&[("memory-decline", 4), ("memory-lapse", 3)]));
        assert_eq!(lines, vec!["3 of 5"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SignalTable::load(Path::new("/nonexistent/signals.json")).unwrap_err();
        assert!(matches!(err, SignalTableError::Load(_, _)));
    }

    #[test]
    fn load_reads_external_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("signals.json");
        std::fs::write(&path, serde_json::to_string(&table()).unwrap()).unwrap();
        assert_eq!(SignalTable::load(&path).unwrap(), table());

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SignalTable::load(&path), Err(SignalTableError::Parse(_, _))));
    }
}
