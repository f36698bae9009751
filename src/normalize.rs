//! Normalizer: coerces raw case and profile blobs into canonical records.
//!
//! Both entry points are total: malformed or missing input degrades to
//! defaults and never produces an error. Output is idempotent, so a record
//! that has already been normalized (and serialized) comes back unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::case::{CaseRecord, Photo, DEFAULT_CASE_ID};
use crate::models::case_profile::{
    ActivitySummary, CaseProfile, Caregiver, Diagnosis, HospitalInfo, ScaleResult, Stage,
};
use crate::models::enums::{
    AnonymizationLevel, PrivacyMode, ShareMode, StageLevel, SymptomCategory, Visibility,
};

/// Canonical storage format for `eventDatetime`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DEFAULT_DISPLAY_NAME: &str = "Unnamed";

// ═══════════════════════════════════════════
// Case records
// ═══════════════════════════════════════════

/// Normalize one raw case blob. Never fails.
pub fn normalize_case(raw: &Value) -> CaseRecord {
    let empty = serde_json::Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let id = text(obj.get("id")).unwrap_or_default();
    let case_id = first(obj, &["caseId", "case_id"])
        .and_then(as_u32)
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_CASE_ID);

    let event = resolve_event_datetime(obj);
    let event_datetime = event.map(|dt| dt.format(DATETIME_FORMAT).to_string());
    let event_date = event.map(|dt| dt.format("%Y-%m-%d").to_string());
    let event_time = event.map(|dt| dt.format("%H:%M").to_string());

    let slug = text(first(obj, &["slug"]))
        .map(|s| slugify(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default_slug(&id, event_date.as_deref()));

    let full_story_zh = text(first(obj, &["fullStoryZh", "full_story_zh"]));
    let content = text(obj.get("content"));
    let (full_story_zh, content) = match (full_story_zh, content) {
        (Some(story), None) => (Some(story.clone()), Some(story)),
        (None, Some(body)) => (Some(body.clone()), Some(body)),
        pair => pair,
    };

    CaseRecord {
        id,
        slug,
        case_id,
        event_datetime,
        event_date,
        event_time,
        title_zh: text(first(obj, &["titleZh", "title_zh", "title"])),
        short_sentence_zh: text(first(obj, &["shortSentenceZh", "short_sentence_zh"])),
        summary_zh: text(first(obj, &["summaryZh", "summary_zh", "summary"])),
        full_story_zh,
        content,
        ocr_text: text(first(obj, &["ocrText", "ocr_text"])),
        tags: string_list(obj.get("tags")),
        symptom_categories: categories(first(obj, &["symptomCategories", "symptom_categories"])),
        ai_summary: text(obj.get("aiSummary")),
        ai_risk: text(obj.get("aiRisk")),
        ai_care_advice: text(obj.get("aiCareAdvice")),
        ai_keywords: string_list(obj.get("aiKeywords")),
        ai_score: obj.get("aiScore").and_then(score),
        ai_symptom_shift: text(obj.get("aiSymptomShift")),
        photos: photos(obj.get("photos")),
        share_mode: text(first(obj, &["shareMode", "share_mode"]))
            .map(|s| ShareMode::canonicalize(&s))
            .unwrap_or(ShareMode::Private),
        share_token: text(first(obj, &["shareToken", "share_token"])),
        visibility: text(obj.get("visibility"))
            .map(|s| Visibility::canonicalize(&s))
            .unwrap_or(Visibility::Private),
        allow_photos_public: first(obj, &["allowPhotosPublic", "allow_photos_public"])
            .and_then(Value::as_bool)
            .unwrap_or(false),
        anonymization_level: text(first(obj, &["anonymizationLevel", "anonymization_level"]))
            .map(|s| AnonymizationLevel::canonicalize(&s))
            .unwrap_or(AnonymizationLevel::High),
    }
}

/// Normalize a batch, preserving order.
pub fn normalize_cases(raw: &[Value]) -> Vec<CaseRecord> {
    raw.iter().map(normalize_case).collect()
}

/// Parse a timestamp in any of the accepted input shapes.
pub fn parse_event_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in [
        DATETIME_FORMAT,
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    parse_date(s).and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

/// `eventDatetime` is authoritative; `eventDate` + `eventTime` are a fallback.
fn resolve_event_datetime(obj: &serde_json::Map<String, Value>) -> Option<NaiveDateTime> {
    if let Some(dt) = text(first(obj, &["eventDatetime", "event_datetime"]))
        .and_then(|s| parse_event_datetime(&s))
    {
        return Some(dt);
    }
    let date = text(first(obj, &["eventDate", "event_date"])).and_then(|s| parse_date(&s))?;
    let time = text(first(obj, &["eventTime", "event_time"])).and_then(|s| {
        ["%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|fmt| chrono::NaiveTime::parse_from_str(s.trim(), fmt).ok())
    });
    match time {
        Some(t) => Some(date.and_time(t)),
        None => date.and_hms_opt(0, 0, 0),
    }
}

/// URL-safe slug: lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn default_slug(id: &str, event_date: Option<&str>) -> String {
    let joined = match (event_date, id.is_empty()) {
        (Some(date), false) => format!("{date}-{id}"),
        (Some(date), true) => format!("{date}-case"),
        (None, false) => format!("case-{id}"),
        (None, true) => "case".to_string(),
    };
    slugify(&joined)
}

fn photos(value: Option<&Value>) -> Vec<Photo> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => non_empty(name).map(|filename| Photo {
                filename,
                caption: None,
            }),
            Value::Object(map) => {
                let filename = text(map.get("filename")).or_else(|| text(map.get("file")))?;
                Some(Photo {
                    filename,
                    caption: text(map.get("caption")),
                })
            }
            _ => None,
        })
        .collect()
}

/// Known categories only, de-duplicated, in declaration order.
fn categories(value: Option<&Value>) -> Vec<SymptomCategory> {
    let names = string_list(value);
    SymptomCategory::ALL
        .iter()
        .copied()
        .filter(|c| names.iter().any(|n| n.eq_ignore_ascii_case(c.as_str())))
        .collect()
}

fn score(value: &Value) -> Option<u8> {
    let n = value.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, 5.0) as u8)
}

// ═══════════════════════════════════════════
// Profiles
// ═══════════════════════════════════════════

/// Normalize a raw profile blob. Never fails.
///
/// When `cases` is supplied the activity block is recomputed from them;
/// when `scales` is non-empty `stage.auto` is recomputed from the latest
/// recognised scale result. Otherwise the stored values are kept.
pub fn normalize_profile(
    raw: &Value,
    cases: Option<&[CaseRecord]>,
    scales: Option<&[ScaleResult]>,
) -> CaseProfile {
    let empty = serde_json::Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let mut stage = match obj.get("stage") {
        Some(Value::Object(map)) => Stage {
            auto: text(map.get("auto"))
                .and_then(|s| StageLevel::parse(&s))
                .unwrap_or(StageLevel::Unknown),
            manual: text(map.get("manual")).and_then(|s| StageLevel::parse(&s)),
        },
        Some(Value::String(s)) => Stage {
            auto: StageLevel::Unknown,
            manual: StageLevel::parse(s.trim()),
        },
        _ => Stage::default(),
    };
    if let Some(level) = scales.and_then(stage_from_scales) {
        stage.auto = level;
    }

    let activity = match cases {
        Some(cases) => activity_from_cases(cases),
        None => obj.get("activity").map(activity_from_value).unwrap_or_default(),
    };

    CaseProfile {
        case_id: first(obj, &["caseId", "case_id"])
            .and_then(as_u32)
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_CASE_ID),
        display_name: text(first(obj, &["displayName", "display_name", "name"]))
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        legal_name: text(first(obj, &["legalName", "legal_name"])),
        birth_year: first(obj, &["birthYear", "birth_year"])
            .and_then(as_i64)
            .filter(|y| (1900..=2100).contains(y))
            .map(|y| y as i32),
        gender: text(obj.get("gender")),
        diagnosis: match obj.get("diagnosis") {
            Some(Value::Object(map)) => Diagnosis {
                name: text(map.get("name")),
                diagnosed_year: first(map, &["diagnosedYear", "year"])
                    .and_then(as_i64)
                    .map(|y| y as i32),
                notes: text(map.get("notes")),
            },
            Some(Value::String(name)) => Diagnosis {
                name: non_empty(name),
                ..Diagnosis::default()
            },
            _ => Diagnosis::default(),
        },
        stage,
        privacy_mode: text(first(obj, &["privacyMode", "privacy_mode", "privacyLevel"]))
            .map(|s| PrivacyMode::canonicalize(&s))
            .unwrap_or(PrivacyMode::Private),
        share_token: text(first(obj, &["shareToken", "share_token"])),
        caregivers: caregivers(obj.get("caregivers")),
        hospital: match obj.get("hospital") {
            Some(Value::Object(map)) => HospitalInfo {
                name: text(map.get("name")),
                department: text(map.get("department")),
                doctor: text(map.get("doctor")),
            },
            Some(Value::String(name)) => HospitalInfo {
                name: non_empty(name),
                ..HospitalInfo::default()
            },
            _ => HospitalInfo::default(),
        },
        notes: text(obj.get("notes")),
        activity,
    }
}

fn caregivers(value: Option<&Value>) -> Vec<Caregiver> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) => non_empty(name).map(|name| Caregiver {
                name,
                relation: None,
                phone: None,
            }),
            Value::Object(map) => Some(Caregiver {
                name: text(map.get("name"))?,
                relation: text(map.get("relation")),
                phone: text(map.get("phone")),
            }),
            _ => None,
        })
        .collect()
}

fn activity_from_cases(cases: &[CaseRecord]) -> ActivitySummary {
    let mut dates: Vec<&str> = cases.iter().filter_map(|c| c.event_date.as_deref()).collect();
    dates.sort_unstable();
    ActivitySummary {
        case_count: cases.len() as u32,
        first_event_date: dates.first().map(|d| d.to_string()),
        last_event_date: dates.last().map(|d| d.to_string()),
    }
}

fn activity_from_value(value: &Value) -> ActivitySummary {
    ActivitySummary {
        case_count: value.get("caseCount").and_then(as_u32).unwrap_or(0),
        first_event_date: text(value.get("firstEventDate")),
        last_event_date: text(value.get("lastEventDate")),
    }
}

/// Latest recognised scale wins; undated results sort before dated ones.
pub fn stage_from_scales(scales: &[ScaleResult]) -> Option<StageLevel> {
    scales
        .iter()
        .filter_map(|s| {
            let level = stage_from_scale(&s.scale, s.score)?;
            let date = s.date.as_deref().and_then(parse_date);
            Some((date, level))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, level)| level)
}

fn stage_from_scale(scale: &str, score: f64) -> Option<StageLevel> {
    if !score.is_finite() || score < 0.0 {
        return None;
    }
    let level = match scale.trim().to_ascii_uppercase().as_str() {
        "MMSE" => match score {
            s if s >= 27.0 => StageLevel::Normal,
            s if s >= 21.0 => StageLevel::Mild,
            s if s >= 10.0 => StageLevel::Moderate,
            _ => StageLevel::Severe,
        },
        "MOCA" => match score {
            s if s >= 26.0 => StageLevel::Normal,
            s if s >= 18.0 => StageLevel::Mild,
            s if s >= 10.0 => StageLevel::Moderate,
            _ => StageLevel::Severe,
        },
        "CDR" => match score {
            s if s < 0.5 => StageLevel::Normal,
            s if s < 1.0 => StageLevel::VeryMild,
            s if s < 2.0 => StageLevel::Mild,
            s if s < 3.0 => StageLevel::Moderate,
            _ => StageLevel::Severe,
        },
        _ => return None,
    };
    Some(level)
}

// ═══════════════════════════════════════════
// Field coercion helpers
// ═══════════════════════════════════════════

fn first<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// String fields; numbers are rendered, everything else is absent.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Array of strings, trimmed, empty entries dropped, first occurrence kept.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if let Some(s) = item.as_str().and_then(non_empty) {
            if !out.contains(&s) {
                out.push(s);
            }
        }
    }
    out
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    as_i64(value).and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roundtrip(case: &CaseRecord) -> CaseRecord {
        normalize_case(&serde_json::to_value(case).unwrap())
    }

    #[test]
    fn empty_input_gets_full_defaults() {
        let case = normalize_case(&json!({}));
        assert_eq!(case.id, "");
        assert_eq!(case.slug, "case");
        assert_eq!(case.case_id, 1);
        assert!(case.event_datetime.is_none());
        assert!(case.tags.is_empty());
        assert!(case.photos.is_empty());
        assert_eq!(case.share_mode, ShareMode::Private);
        assert_eq!(case.visibility, Visibility::Private);
        assert_eq!(case.anonymization_level, AnonymizationLevel::High);
        assert!(!case.allow_photos_public);
    }

    #[test]
    fn non_object_input_is_tolerated() {
        for raw in [json!(null), json!(42), json!("text"), json!([1, 2])] {
            let case = normalize_case(&raw);
            assert_eq!(case.case_id, 1);
            assert_eq!(roundtrip(&case), case);
        }
    }

    #[test]
    fn serialized_record_has_every_field() {
        let value = serde_json::to_value(normalize_case(&json!({}))).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id", "slug", "caseId", "eventDatetime", "eventDate", "eventTime", "titleZh",
            "shortSentenceZh", "summaryZh", "fullStoryZh", "content", "ocrText", "tags",
            "symptomCategories", "aiSummary", "aiRisk", "aiCareAdvice", "aiKeywords", "aiScore",
            "aiSymptomShift", "photos", "shareMode", "shareToken", "visibility",
            "allowPhotosPublic", "anonymizationLevel",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn legacy_disclosure_values_are_canonicalized() {
        let case = normalize_case(&json!({
            "shareMode": "protected",
            "visibility": "clinic",
            "anonymizationLevel": "LOW",
        }));
        assert_eq!(case.share_mode, ShareMode::Token);
        assert_eq!(case.visibility, Visibility::Clinician);
        assert_eq!(case.anonymization_level, AnonymizationLevel::Low);

        let case = normalize_case(&json!({ "shareMode": "world", "visibility": "public" }));
        assert_eq!(case.share_mode, ShareMode::Private);
        assert_eq!(case.visibility, Visibility::Anonymized);
    }

    #[test]
    fn photos_accept_strings_and_objects() {
        let case = normalize_case(&json!({
            "photos": [
                "a.jpg",
                { "file": "b.jpg" },
                { "filename": "c.jpg", "caption": "garden" },
                { "url": "ignored.jpg" },
                7,
                ""
            ]
        }));
        let names: Vec<_> = case.photos.iter().map(|p| p.filename.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(case.photos[2].caption.as_deref(), Some("garden"));
    }

    #[test]
    fn lists_are_coerced_and_deduplicated() {
        let case = normalize_case(&json!({
            "tags": ["wandering", " wandering ", 3, "", "fall"],
            "symptomCategories": ["sleep", "memory", "nonsense", "memory"],
            "aiKeywords": "not-a-list",
        }));
        assert_eq!(case.tags, vec!["wandering", "fall"]);
        assert_eq!(
            case.symptom_categories,
            vec![SymptomCategory::Memory, SymptomCategory::Sleep]
        );
        assert!(case.ai_keywords.is_empty());
    }

    #[test]
    fn event_datetime_is_authoritative() {
        let case = normalize_case(&json!({
            "eventDatetime": "2026-03-04T18:30:00+08:00",
            "eventDate": "1999-01-01",
        }));
        assert_eq!(case.event_datetime.as_deref(), Some("2026-03-04T18:30:00"));
        assert_eq!(case.event_date.as_deref(), Some("2026-03-04"));
        assert_eq!(case.event_time.as_deref(), Some("18:30"));
    }

    #[test]
    fn event_date_and_time_are_a_fallback() {
        let case = normalize_case(&json!({ "eventDate": "2026-03-04", "eventTime": "07:15" }));
        assert_eq!(case.event_datetime.as_deref(), Some("2026-03-04T07:15:00"));

        let case = normalize_case(&json!({ "eventDatetime": "garbage", "eventDate": "2026/03/05" }));
        assert_eq!(case.event_datetime.as_deref(), Some("2026-03-05T00:00:00"));
    }

    #[test]
    fn story_and_content_mirror_each_other() {
        let case = normalize_case(&json!({ "fullStoryZh": "今天很平靜" }));
        assert_eq!(case.content.as_deref(), Some("今天很平靜"));
        let case = normalize_case(&json!({ "content": "散步" }));
        assert_eq!(case.full_story_zh.as_deref(), Some("散步"));
    }

    #[test]
    fn slug_is_derived_and_url_safe() {
        let case = normalize_case(&json!({ "id": 12, "eventDate": "2026-01-02" }));
        assert_eq!(case.id, "12");
        assert_eq!(case.slug, "2026-01-02-12");

        let case = normalize_case(&json!({ "slug": "  Morning Walk!! 散步 " }));
        assert_eq!(case.slug, "morning-walk");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = vec![
            json!({}),
            json!({
                "id": "abc",
                "caseId": "3",
                "eventDatetime": "2026-05-01 09:00",
                "titleZh": "  走失  ",
                "content": "他今天走失了",
                "tags": ["wandering"],
                "symptomCategories": ["orientation"],
                "aiScore": 9,
                "photos": ["x.jpg", { "file": "y.jpg", "caption": "c" }],
                "shareMode": "protected",
                "shareToken": "tok",
                "visibility": "clinic",
                "allowPhotosPublic": true,
                "anonymizationLevel": "medium",
            }),
            json!({ "caseId": -5, "tags": {}, "photos": "nope", "eventDate": "bad" }),
        ];
        for raw in inputs {
            let once = normalize_case(&raw);
            assert_eq!(roundtrip(&once), once);
        }
    }

    #[test]
    fn ai_score_is_clamped() {
        assert_eq!(normalize_case(&json!({ "aiScore": 9 })).ai_score, Some(5));
        assert_eq!(normalize_case(&json!({ "aiScore": -2 })).ai_score, Some(0));
        assert_eq!(normalize_case(&json!({ "aiScore": "x" })).ai_score, None);
    }

    #[test]
    fn profile_defaults() {
        let profile = normalize_profile(&json!(null), None, None);
        assert_eq!(profile.case_id, 1);
        assert_eq!(profile.display_name, "Unnamed");
        assert_eq!(profile.privacy_mode, PrivacyMode::Private);
        assert_eq!(profile.stage.effective(), StageLevel::Unknown);
        assert!(profile.share_token.is_none());
        assert_eq!(profile.activity.case_count, 0);
    }

    #[test]
    fn profile_accepts_share_level_names() {
        let profile = normalize_profile(&json!({ "privacyLevel": "limited" }), None, None);
        assert_eq!(profile.privacy_mode, PrivacyMode::Masked);
    }

    #[test]
    fn profile_stage_from_latest_scale() {
        let scales = vec![
            ScaleResult { scale: "MMSE".into(), score: 28.0, date: Some("2025-01-01".into()) },
            ScaleResult { scale: "MMSE".into(), score: 19.0, date: Some("2026-02-01".into()) },
            ScaleResult { scale: "unknown".into(), score: 1.0, date: Some("2026-09-01".into()) },
        ];
        let profile = normalize_profile(
            &json!({ "stage": { "auto": "normal", "manual": null } }),
            None,
            Some(&scales),
        );
        assert_eq!(profile.stage.auto, StageLevel::Moderate);
        assert_eq!(profile.stage.manual, None);
    }

    #[test]
    fn profile_stage_kept_without_scales() {
        let profile = normalize_profile(
            &json!({ "stage": { "auto": "mild", "manual": "severe" } }),
            None,
            Some(&[]),
        );
        assert_eq!(profile.stage.auto, StageLevel::Mild);
        assert_eq!(profile.stage.effective(), StageLevel::Severe);
    }

    #[test]
    fn cdr_scale_mapping() {
        let scales = vec![ScaleResult { scale: "cdr".into(), score: 0.5, date: None }];
        assert_eq!(stage_from_scales(&scales), Some(StageLevel::VeryMild));
    }

    #[test]
    fn profile_activity_from_cases() {
        let cases = normalize_cases(&[
            json!({ "eventDate": "2026-02-01" }),
            json!({ "eventDate": "2026-01-15" }),
            json!({}),
        ]);
        let profile = normalize_profile(&json!({}), Some(&cases), None);
        assert_eq!(profile.activity.case_count, 3);
        assert_eq!(profile.activity.first_event_date.as_deref(), Some("2026-01-15"));
        assert_eq!(profile.activity.last_event_date.as_deref(), Some("2026-02-01"));
    }

    #[test]
    fn profile_normalization_is_idempotent() {
        let raw = json!({
            "caseId": 2,
            "displayName": "阿嬤",
            "legalName": "王美麗",
            "birthYear": "1941",
            "diagnosis": "Alzheimer's",
            "stage": "mild",
            "privacyMode": "masked",
            "shareToken": "abc",
            "caregivers": ["王小明", { "name": "李護理師", "relation": "aide" }, { "relation": "x" }],
            "hospital": { "name": "台大醫院", "doctor": "陳醫師" },
        });
        let once = normalize_profile(&raw, None, None);
        let twice = normalize_profile(&serde_json::to_value(&once).unwrap(), None, None);
        assert_eq!(once, twice);
        assert_eq!(once.caregivers.len(), 2);
        assert_eq!(once.birth_year, Some(1941));
        assert_eq!(once.stage.manual, Some(StageLevel::Mild));
    }
}
