//! Clinical Summary Builder: one clinician-facing object per request.
//!
//! Windows the case list to the last `window_days`, enriches the window
//! with extractor output, and assembles aggregates plus trend and narrative
//! lines next to the profile. Pure: inputs are borrowed, never modified,
//! and an empty case list yields an all-zero summary.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::classify::categories_for_case;
use crate::models::case::CaseRecord;
use crate::models::case_profile::CaseProfile;
use crate::models::enums::Emotion;
use crate::normalize::DATETIME_FORMAT;
use crate::signals::{analyze_case, enrich_cases, MAX_SEVERITY};
use crate::trends::{
    analyze_trends, build_symptom_trend, build_tag_trend, within_days, MonthlyCounts, SignalTable,
};

/// Cases at or above this severity count as high-severity.
pub const HIGH_SEVERITY: u8 = 4;

const TOP_KEYWORDS: usize = 10;

// ─── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalAggregates {
    pub case_count: u32,
    /// Index = severity score 0..=5.
    pub severity_distribution: Vec<u32>,
    pub average_severity: f64,
    pub high_severity_case_count: u32,
    pub emotion_counts: BTreeMap<String, u32>,
    pub category_counts: BTreeMap<String, u32>,
    pub tag_counts: BTreeMap<String, u32>,
    pub symptom_trend: MonthlyCounts,
    pub tag_trend: MonthlyCounts,
    pub top_keywords: Vec<KeywordCount>,
}

impl Default for ClinicalAggregates {
    fn default() -> Self {
        Self {
            case_count: 0,
            severity_distribution: vec![0; usize::from(MAX_SEVERITY) + 1],
            average_severity: 0.0,
            high_severity_case_count: 0,
            emotion_counts: Emotion::ALL.iter().map(|e| (e.as_str().to_string(), 0)).collect(),
            category_counts: BTreeMap::new(),
            tag_counts: BTreeMap::new(),
            symptom_trend: MonthlyCounts::new(),
            tag_trend: MonthlyCounts::new(),
            top_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSummary {
    pub profile: CaseProfile,
    /// Enriched, newest first.
    pub windowed_cases: Vec<CaseRecord>,
    pub aggregates: ClinicalAggregates,
    pub trend_summary_lines: Vec<String>,
    pub clinical_narrative_lines: Vec<String>,
    pub window_days: u32,
    pub generated_at: String,
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Cases whose event date falls inside the trailing `window_days` window.
pub fn window_cases(cases: &[CaseRecord], window_days: u32, now: NaiveDateTime) -> Vec<CaseRecord> {
    let today = now.date();
    let mut windowed: Vec<CaseRecord> = cases
        .iter()
        .filter(|c| within_days(c, today, i64::from(window_days)))
        .cloned()
        .collect();
    windowed.sort_by(|a, b| b.event_datetime.cmp(&a.event_datetime));
    windowed
}

pub fn aggregate_cases(cases: &[CaseRecord]) -> ClinicalAggregates {
    let mut agg = ClinicalAggregates::default();
    let mut keyword_counts: BTreeMap<String, u32> = BTreeMap::new();
    let mut severity_total = 0u32;

    for case in cases {
        let signals = analyze_case(case);
        agg.case_count += 1;
        severity_total += u32::from(signals.severity);
        agg.severity_distribution[usize::from(signals.severity)] += 1;
        if signals.severity >= HIGH_SEVERITY {
            agg.high_severity_case_count += 1;
        }
        *agg
            .emotion_counts
            .entry(signals.emotion.emotion.as_str().to_string())
            .or_insert(0) += 1;
        for keyword in signals.keywords {
            *keyword_counts.entry(keyword).or_insert(0) += 1;
        }
        for category in categories_for_case(case) {
            *agg.category_counts.entry(category.as_str().to_string()).or_insert(0) += 1;
        }
        for tag in &case.tags {
            *agg.tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    if agg.case_count > 0 {
        agg.average_severity = f64::from(severity_total) / f64::from(agg.case_count);
    }
    agg.symptom_trend = build_symptom_trend(cases);
    agg.tag_trend = build_tag_trend(cases);

    let mut top: Vec<KeywordCount> = keyword_counts
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    top.truncate(TOP_KEYWORDS);
    agg.top_keywords = top;
    agg
}

pub fn build_clinical_summary(
    profile: &CaseProfile,
    cases: &[CaseRecord],
    window_days: u32,
    now: NaiveDateTime,
    table: &SignalTable,
) -> ClinicalSummary {
    let windowed = window_cases(cases, window_days, now);
    let trends = analyze_trends(&windowed, now, table);
    let aggregates = aggregate_cases(&windowed);

    tracing::debug!(
        case_id = profile.case_id,
        window_days,
        windowed = windowed.len(),
        "Built clinical summary"
    );

    ClinicalSummary {
        profile: profile.clone(),
        windowed_cases: enrich_cases(&windowed),
        aggregates,
        trend_summary_lines: trends.trend_summary,
        clinical_narrative_lines: trends.clinical_narrative,
        window_days,
        generated_at: now.format(DATETIME_FORMAT).to_string(),
    }
}

/// [`build_clinical_summary`] against the local wall clock.
pub fn build_clinical_summary_now(
    profile: &CaseProfile,
    cases: &[CaseRecord],
    window_days: u32,
    table: &SignalTable,
) -> ClinicalSummary {
    build_clinical_summary(profile, cases, window_days, Local::now().naive_local(), table)
}
