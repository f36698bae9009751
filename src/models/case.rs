use serde::{Deserialize, Serialize};

use super::enums::{AnonymizationLevel, ShareMode, SymptomCategory, Visibility};

/// Default owner/profile grouping for records that do not carry one.
pub const DEFAULT_CASE_ID: u32 = 1;

/// One diary entry in canonical shape.
///
/// Every field is always present once a record has been through
/// [`crate::normalize::normalize_case`]; optional values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: String,
    pub slug: String,
    pub case_id: u32,

    /// Authoritative timestamp, `YYYY-MM-DDTHH:MM:SS` (local, no offset).
    pub event_datetime: Option<String>,
    /// Derived from `event_datetime`, `YYYY-MM-DD`.
    pub event_date: Option<String>,
    /// Derived from `event_datetime`, `HH:MM`.
    pub event_time: Option<String>,

    pub title_zh: Option<String>,
    pub short_sentence_zh: Option<String>,
    pub summary_zh: Option<String>,
    pub full_story_zh: Option<String>,
    pub content: Option<String>,
    pub ocr_text: Option<String>,

    pub tags: Vec<String>,
    pub symptom_categories: Vec<SymptomCategory>,

    pub ai_summary: Option<String>,
    pub ai_risk: Option<String>,
    pub ai_care_advice: Option<String>,
    pub ai_keywords: Vec<String>,
    pub ai_score: Option<u8>,
    pub ai_symptom_shift: Option<String>,

    pub photos: Vec<Photo>,

    pub share_mode: ShareMode,
    pub share_token: Option<String>,
    pub visibility: Visibility,
    pub allow_photos_public: bool,
    pub anonymization_level: AnonymizationLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub filename: String,
    pub caption: Option<String>,
}

impl CaseRecord {
    /// Text searched by the signal extractor: title, summary, story, OCR.
    pub fn signal_text(&self) -> String {
        [
            self.title_zh.as_deref(),
            self.summary_zh.as_deref(),
            self.content.as_deref(),
            self.ocr_text.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Event date as a calendar date, when one is known.
    pub fn event_naive_date(&self) -> Option<chrono::NaiveDate> {
        self.event_date
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// `YYYY-MM` bucket key for monthly aggregation.
    pub fn month_key(&self) -> Option<String> {
        self.event_naive_date().map(|d| d.format("%Y-%m").to_string())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}
