use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::classify::categories_for_case;
use crate::config::RISING_THRESHOLD;
use crate::models::case::CaseRecord;

use super::narrative::SignalTable;
use super::types::*;

pub const WEEK_DAYS: i64 = 7;
pub const MONTH_DAYS: i64 = 30;

/// Whole days between the event date and `today`; negative for future events.
pub fn days_ago(case: &CaseRecord, today: NaiveDate) -> Option<i64> {
    case.event_naive_date().map(|d| (today - d).num_days())
}

/// Inside the trailing `days`-day window ending today (inclusive).
pub fn within_days(case: &CaseRecord, today: NaiveDate, days: i64) -> bool {
    matches!(days_ago(case, today), Some(n) if (0..days).contains(&n))
}

/// Counts per month per primary symptom category. Every dated case is
/// counted exactly once: under its first category in declaration order,
/// or under [`UNCLASSIFIED`]. Undated cases are skipped.
pub fn build_symptom_trend(cases: &[CaseRecord]) -> MonthlyCounts {
    let mut trend = MonthlyCounts::new();
    for case in cases {
        let Some(month) = case.month_key() else {
            continue;
        };
        let bucket = categories_for_case(case)
            .into_iter()
            .min()
            .map(|c| c.as_str())
            .unwrap_or(UNCLASSIFIED);
        *trend
            .entry(month)
            .or_default()
            .entry(bucket.to_string())
            .or_insert(0) += 1;
    }
    trend
}

/// Counts per month per tag. Undated and untagged cases are skipped.
pub fn build_tag_trend(cases: &[CaseRecord]) -> MonthlyCounts {
    let mut trend = MonthlyCounts::new();
    for case in cases {
        let Some(month) = case.month_key() else {
            continue;
        };
        if case.tags.is_empty() {
            continue;
        }
        let bucket = trend.entry(month).or_default();
        for tag in &case.tags {
            *bucket.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    trend
}

/// Tag → number of cases carrying it, over the whole corpus.
pub fn tag_frequency(cases: &[CaseRecord]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for tag in cases.iter().flat_map(|c| c.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn verdict(count7: u32, count30: u32) -> TrendVerdict {
    if count7 == 0 {
        TrendVerdict::Absent
    } else if f64::from(count7) > RISING_THRESHOLD * f64::from(count30) {
        TrendVerdict::Rising
    } else {
        TrendVerdict::Stable
    }
}

/// Rolling 7/30-day tag statistics measured back from `now`.
pub fn analyze_trends(cases: &[CaseRecord], now: NaiveDateTime, table: &SignalTable) -> TrendAnalysis {
    let today = now.date();
    let mut analysis = TrendAnalysis::default();

    for case in cases {
        let date = case.event_date.as_ref();
        let in7 = within_days(case, today, WEEK_DAYS);
        let in30 = within_days(case, today, MONTH_DAYS);
        for tag in &case.tags {
            *analysis.stats7.entry(tag.clone()).or_insert(0) += u32::from(in7);
            *analysis.stats30.entry(tag.clone()).or_insert(0) += u32::from(in30);
            if let Some(date) = date {
                analysis
                    .first_appearance
                    .entry(tag.clone())
                    .and_modify(|seen| {
                        if date.as_str() < seen.as_str() {
                            *seen = date.clone();
                        }
                    })
                    .or_insert_with(|| date.clone());
            }
        }
    }

    for (tag, &count30) in &analysis.stats30 {
        let count7 = analysis.stats7.get(tag).copied().unwrap_or(0);
        let v = verdict(count7, count30);
        analysis.verdicts.insert(tag.clone(), v);
        if count30 > 0 {
            analysis.trend_summary.push(format!(
                "{tag}: {count7} in the last 7 days, {count30} in the last 30 days ({})",
                v.as_str()
            ));
        }
    }

    let totals = tag_frequency(cases);
    analysis.clinical_narrative = table.narrate(&analysis, &totals);
    analysis
}

/// [`analyze_trends`] against the local wall clock.
pub fn analyze_trends_now(cases: &[CaseRecord], table: &SignalTable) -> TrendAnalysis {
    analyze_trends(cases, Local::now().naive_local(), table)
}
