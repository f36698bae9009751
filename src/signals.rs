//! Signal Extractor: emotion polarity, severity, keyword hits and smart tags.
//!
//! A fixed rule table over substring matches. Matching is case-sensitive
//! and untokenized; diary text is Chinese so there is no case folding.
//! Outputs feed narrative text downstream, so the tables and weights here
//! are part of the observable contract.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::classify;
use crate::config::DANGER_WEIGHT;
use crate::models::case::CaseRecord;
use crate::models::enums::{Emotion, RiskLevel, SymptomCategory};

// ═══════════════════════════════════════════
// Keyword tables
// ═══════════════════════════════════════════

pub const POSITIVE_KEYWORDS: &[&str] = &[
    "開心", "微笑", "笑了", "平靜", "穩定", "愉快", "放鬆", "記得", "好轉", "配合", "胃口好",
    "睡得好", "感謝",
];

pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "生氣", "焦慮", "忘記", "哭", "煩躁", "混亂", "不安", "拒絕", "失眠", "害怕", "激動",
    "重複", "發脾氣", "懷疑",
];

/// Presence of any of these weighs far more than a plain negative keyword.
pub const DANGER_KEYWORDS: &[&str] = &[
    "走失", "跌倒", "摔倒", "急診", "受傷", "失蹤", "昏倒", "出血", "報警", "噎到",
];

/// Text longer than this (in characters) adds a severity point when
/// at least one negative keyword is present.
pub const LONG_TEXT_CHARS: usize = 200;

pub const MAX_SEVERITY: u8 = 5;

/// Keyword → tag suggestions, checked in order.
pub const SMART_TAG_RULES: &[(&str, &str)] = &[
    ("走失", "wandering"),
    ("迷路", "wandering"),
    ("跌倒", "fall"),
    ("摔倒", "fall"),
    ("忘記", "memory-decline"),
    ("剛剛說過", "short-term-memory-loss"),
    ("剛說過", "short-term-memory-loss"),
    ("重複問", "repetitive-questions"),
    ("叫錯", "semantic-confusion"),
    ("說不出", "semantic-confusion"),
    ("不會用", "executive-dysfunction"),
    ("不知道怎麼", "executive-dysfunction"),
    ("認不出", "object-recognition-difficulty"),
    ("失眠", "insomnia"),
    ("半夜", "night-waking"),
    ("發脾氣", "agitation"),
    ("生氣", "agitation"),
    ("拒絕吃", "appetite-refusal"),
    ("急診", "emergency-visit"),
];

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Emotion verdict with the raw score that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: Emotion,
    pub score: i32,
}

/// Everything the extractor derives from one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSignals {
    pub emotion: EmotionReading,
    pub severity: u8,
    pub keywords: Vec<String>,
    pub suggested_tags: Vec<String>,
}

// ═══════════════════════════════════════════
// Scoring
// ═══════════════════════════════════════════

/// Occurrences of `needle` in `haystack`, overlapping matches included.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        count += 1;
        let next = start + pos;
        // advance one char, not one match, so overlapping hits are counted
        start = next + haystack[next..].chars().next().map_or(1, char::len_utf8);
    }
    count
}

fn occurrences(text: &str, table: &[&str]) -> usize {
    table.iter().map(|k| count_occurrences(text, k)).sum()
}

fn presences(text: &str, table: &[&str]) -> usize {
    table.iter().filter(|k| text.contains(**k)).count()
}

/// Raw emotion score: +1 per positive hit, −1 per negative hit,
/// −`DANGER_WEIGHT` per danger keyword present.
pub fn emotion_score(text: &str) -> i32 {
    let positive = occurrences(text, POSITIVE_KEYWORDS) as i32;
    let negative = occurrences(text, NEGATIVE_KEYWORDS) as i32;
    let danger = presences(text, DANGER_KEYWORDS) as i32;
    positive - negative - DANGER_WEIGHT as i32 * danger
}

pub fn detect_emotion(text: &str) -> EmotionReading {
    let score = emotion_score(text);
    let emotion = match score {
        s if s >= 1 => Emotion::Positive,
        s if s <= -2 => Emotion::Negative,
        _ => Emotion::Neutral,
    };
    EmotionReading { emotion, score }
}

/// Severity on a 0..=5 scale.
pub fn score_severity(text: &str) -> u8 {
    let danger = presences(text, DANGER_KEYWORDS) as u32;
    let has_negative = NEGATIVE_KEYWORDS.iter().any(|k| text.contains(*k));

    let mut score = DANGER_WEIGHT * danger;
    if has_negative {
        score += 1;
        if text.chars().count() > LONG_TEXT_CHARS {
            score += 1;
        }
    }
    score.min(u32::from(MAX_SEVERITY)) as u8
}

/// Matched keywords from all three tables, ordered by first position in
/// the text (table order breaks ties), without duplicates.
pub fn extract_emotion_keywords(text: &str) -> Vec<String> {
    let mut hits: Vec<(usize, usize, &str)> = POSITIVE_KEYWORDS
        .iter()
        .chain(NEGATIVE_KEYWORDS)
        .chain(DANGER_KEYWORDS)
        .enumerate()
        .filter_map(|(rank, k)| text.find(*k).map(|pos| (pos, rank, *k)))
        .collect();
    hits.sort_unstable();

    let mut seen = BTreeSet::new();
    hits.into_iter()
        .filter(|(_, _, k)| seen.insert(*k))
        .map(|(_, _, k)| k.to_string())
        .collect()
}

/// Tags suggested by the rule table that the case does not already carry.
pub fn suggest_smart_tags(case: &CaseRecord) -> Vec<String> {
    let text = format!(
        "{}\n{}",
        case.signal_text(),
        case.short_sentence_zh.as_deref().unwrap_or_default()
    );
    let mut out: Vec<String> = Vec::new();
    for (keyword, tag) in SMART_TAG_RULES {
        if text.contains(*keyword) && !case.has_tag(tag) && !out.iter().any(|t| t.as_str() == *tag) {
            out.push(tag.to_string());
        }
    }
    out
}

pub fn analyze_case(case: &CaseRecord) -> CaseSignals {
    let text = case.signal_text();
    CaseSignals {
        emotion: detect_emotion(&text),
        severity: score_severity(&text),
        keywords: extract_emotion_keywords(&text),
        suggested_tags: suggest_smart_tags(case),
    }
}

// ═══════════════════════════════════════════
// Derived AI fields
// ═══════════════════════════════════════════

const SUMMARY_CHARS: usize = 60;

/// Return a copy of `case` with the derived `ai*` fields filled from the
/// rule tables. `previous` is the chronologically preceding case, used
/// for `aiSymptomShift`.
pub fn enrich_case(case: &CaseRecord, previous: Option<&CaseRecord>) -> CaseRecord {
    let signals = analyze_case(case);
    let risk = RiskLevel::from_severity(signals.severity);
    let categories = classify::categories_for_case(case);

    let mut out = case.clone();
    out.ai_keywords = signals.keywords;
    out.ai_score = Some(signals.severity);
    out.ai_risk = Some(risk.as_str().to_string());
    out.ai_summary = summary_line(case);
    out.ai_care_advice = Some(care_advice(risk, categories.first().copied()).to_string());
    out.ai_symptom_shift = previous.and_then(|prev| {
        let before = classify::categories_for_case(prev);
        let new: Vec<&str> = categories
            .iter()
            .filter(|c| !before.contains(*c))
            .map(|c| c.as_str())
            .collect();
        (!new.is_empty()).then(|| format!("new: {}", new.join(", ")))
    });
    out
}

/// Enrich a collection in chronological order; undated cases have no
/// predecessor. Output keeps the input order.
pub fn enrich_cases(cases: &[CaseRecord]) -> Vec<CaseRecord> {
    let mut order: Vec<usize> = (0..cases.len()).collect();
    order.sort_by(|a, b| cases[*a].event_datetime.cmp(&cases[*b].event_datetime));

    let mut enriched: Vec<Option<CaseRecord>> = vec![None; cases.len()];
    let mut previous: Option<&CaseRecord> = None;
    for idx in order {
        let case = &cases[idx];
        if case.event_datetime.is_none() {
            enriched[idx] = Some(enrich_case(case, None));
            continue;
        }
        enriched[idx] = Some(enrich_case(case, previous));
        previous = Some(case);
    }
    enriched.into_iter().flatten().collect()
}

fn summary_line(case: &CaseRecord) -> Option<String> {
    if let Some(short) = &case.short_sentence_zh {
        return Some(short.clone());
    }
    let text = case.signal_text();
    let line = text.lines().find(|l| !l.trim().is_empty())?.trim();
    let mut summary: String = line.chars().take(SUMMARY_CHARS).collect();
    if line.chars().count() > SUMMARY_CHARS {
        summary.push('…');
    }
    Some(summary)
}

fn care_advice(risk: RiskLevel, category: Option<SymptomCategory>) -> &'static str {
    match (risk, category) {
        (RiskLevel::High, _) => {
            "Check for injury and keep a close eye today; record what happened while it is fresh."
        }
        (RiskLevel::Moderate, Some(SymptomCategory::Orientation)) => {
            "Keep familiar routes and labels visible; consider an ID bracelet for outings."
        }
        (RiskLevel::Moderate, Some(SymptomCategory::Sleep)) => {
            "Keep a steady bedtime routine and limit daytime naps."
        }
        (RiskLevel::Moderate, Some(SymptomCategory::Emotion | SymptomCategory::Behavior)) => {
            "Stay calm, redirect gently, and note what preceded the episode."
        }
        (RiskLevel::Moderate, _) => "Note how often this happens and mention it at the next visit.",
        (RiskLevel::Low, _) => "Keep up the current routine.",
    }
}
