use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::case::{CaseRecord, Photo};
use crate::models::case_profile::{ActivitySummary, CaseProfile};
use crate::models::enums::{
    AnonymizationLevel, PrivacyLevel, ShareMode, StageLevel, SymptomCategory, Visibility,
};

// ═══════════════════════════════════════════════════════════
// Tiers & context
// ═══════════════════════════════════════════════════════════

/// Who is asking, from most to least trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisclosureTier {
    /// The owner. Nothing is redacted.
    Private,
    /// A share-link holder.
    Limited,
    /// Anyone. Redacted and masked.
    Anonymized,
}

/// Everything the filter needs to decide what leaves the system.
#[derive(Debug, Clone)]
pub struct PrivacyContext {
    pub tier: DisclosureTier,
    pub photo_base_url: String,
    redactor: Redactor,
}

impl PrivacyContext {
    pub fn owner(photo_base_url: &str) -> Self {
        Self {
            tier: DisclosureTier::Private,
            photo_base_url: photo_base_url.to_string(),
            redactor: Redactor::none(),
        }
    }

    /// Share-link tier. Profile identities are redacted.
    pub fn limited(profile: &CaseProfile, photo_base_url: &str) -> Self {
        Self {
            tier: DisclosureTier::Limited,
            photo_base_url: photo_base_url.to_string(),
            redactor: Redactor::for_profile(Some(profile), false),
        }
    }

    /// Public tier. Profile identities are redacted, and institution and
    /// clinician nouns are masked even when no profile is known.
    pub fn anonymized(profile: Option<&CaseProfile>, photo_base_url: &str) -> Self {
        Self {
            tier: DisclosureTier::Anonymized,
            photo_base_url: photo_base_url.to_string(),
            redactor: Redactor::for_profile(profile, true),
        }
    }

    /// Free-text rewrite for this tier.
    pub fn scrub(&self, text: &str) -> String {
        self.redactor.apply(text)
    }

    fn scrub_opt(&self, text: Option<&String>) -> Option<String> {
        text.map(|t| self.scrub(t))
    }

    /// Whether a case may leave the system at all at this tier.
    pub fn admits(&self, case: &CaseRecord) -> bool {
        match self.tier {
            DisclosureTier::Private => true,
            DisclosureTier::Limited => {
                case.share_mode != ShareMode::Private && case.visibility != Visibility::Private
            }
            DisclosureTier::Anonymized => {
                case.share_mode == ShareMode::Public && case.visibility == Visibility::Anonymized
            }
        }
    }

    fn photos_allowed(&self, case: &CaseRecord) -> bool {
        self.tier == DisclosureTier::Private || case.allow_photos_public
    }

    /// Owner URLs use the stored filename. Shared URLs use an opaque,
    /// stable name so filenames (which may carry names) never leave.
    fn photo_url(&self, case: &CaseRecord, photo: &Photo) -> String {
        let base = self.photo_base_url.trim_end_matches('/');
        if self.tier == DisclosureTier::Private {
            return format!("{base}/{}", photo.filename);
        }
        format!("{base}/{}", opaque_photo_name(case, photo))
    }
}

/// `<uuid-v5>.<ext>` derived from the case id and stored filename.
pub fn opaque_photo_name(case: &CaseRecord, photo: &Photo) -> String {
    let key = format!("{}/{}", case.id, photo.filename);
    let id = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes());
    let ext = photo
        .filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    match ext {
        Some(ext) => format!("{id}.{ext}"),
        None => id.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════
// Redaction
// ═══════════════════════════════════════════════════════════

static CLINICIAN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:Dr\.?|Doctor)\s+[A-Z][\w'-]*").unwrap());
static INSTITUTION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[A-Z][\w'-]*\s+)*(?:Hospital|Clinic|Medical Center)\b").unwrap()
});
static INSTITUTION_NOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:hospital|clinic|medical center)s?\b").unwrap());
static CLINICIAN_NOUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:doctor|physician)s?\b").unwrap());
// Han prefixes stop at particles, pronouns and movement verbs so the
// surrounding sentence survives: 帶她去榮總醫院 keeps 帶她去.
static HAN_INSTITUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Han}--[去到在從回往於的了和與跟帶看給她他我你們是說]]{0,4}(?:醫院|診所|醫學中心)")
        .unwrap()
});
static HAN_CLINICIAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Han}--[去到在從回往於的了和與跟帶看給她他我你們是說]]{1,3}(?:醫師|醫生)").unwrap()
});

/// Literal replacements for profile identities plus an optional masking pass.
#[derive(Debug, Clone, Default)]
struct Redactor {
    replacements: Vec<(String, String)>,
    mask_institutions: bool,
}

impl Redactor {
    fn none() -> Self {
        Self::default()
    }

    fn for_profile(profile: Option<&CaseProfile>, mask_institutions: bool) -> Self {
        let mut replacements: Vec<(String, String)> = Vec::new();
        if let Some(profile) = profile {
            let mut push = |term: Option<&String>, placeholder: &str| {
                if let Some(term) = term.map(|t| t.trim()).filter(|t| !t.is_empty()) {
                    replacements.push((term.to_string(), placeholder.to_string()));
                }
            };
            push(profile.legal_name.as_ref(), "[name]");
            push(profile.hospital.name.as_ref(), "[facility]");
            push(profile.hospital.doctor.as_ref(), "[clinician]");
            for (caregiver, pseudonym) in profile.caregivers.iter().zip(profile.caregiver_pseudonyms()) {
                push(Some(&caregiver.name), &pseudonym);
            }
        }
        // longest first so a name is not split by a shorter one it contains
        replacements.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        Self {
            replacements,
            mask_institutions,
        }
    }

    fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (term, placeholder) in &self.replacements {
            if out.contains(term.as_str()) {
                out = out.replace(term.as_str(), placeholder);
            }
        }
        if self.mask_institutions {
            out = mask_institutions(&out);
        }
        out
    }
}

/// Rewrite institution and clinician nouns to generic placeholders.
pub fn mask_institutions(text: &str) -> String {
    let out = CLINICIAN_NAME.replace_all(text, "[clinician]");
    let out = INSTITUTION_NAME.replace_all(&out, "[institution]");
    let out = INSTITUTION_NOUN.replace_all(&out, "[institution]");
    let out = CLINICIAN_NOUN.replace_all(&out, "[clinician]");
    let out = HAN_INSTITUTION.replace_all(&out, "[醫療機構]");
    let out = HAN_CLINICIAN.replace_all(&out, "[醫師]");
    out.into_owned()
}

// ═══════════════════════════════════════════════════════════
// Public shapes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicPhoto {
    pub url: String,
    pub caption: Option<String>,
}

/// A case as it may leave the system. Never carries `id`, `slug` or `tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCase {
    pub case_id: u32,
    pub event_datetime: Option<String>,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    /// `YYYY-MM`; the only time field at the `high` anonymization level.
    pub event_month: Option<String>,
    pub title_zh: Option<String>,
    pub short_sentence_zh: Option<String>,
    pub summary_zh: Option<String>,
    pub full_story_zh: Option<String>,
    pub symptom_categories: Vec<SymptomCategory>,
    pub ai_summary: Option<String>,
    pub ai_risk: Option<String>,
    pub ai_score: Option<u8>,
    pub photos: Vec<PublicPhoto>,
    pub visibility: Visibility,
    pub anonymization_level: AnonymizationLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCaregiver {
    pub label: String,
    pub relation: Option<String>,
}

/// Profile fields a share-link holder may see. Legal name, hospital,
/// doctor, caregiver names and notes are absent by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub case_id: u32,
    pub display_name: String,
    pub birth_year: Option<i32>,
    pub gender: Option<String>,
    pub diagnosis: Option<String>,
    pub stage: StageLevel,
    pub privacy: PrivacyLevel,
    pub caregivers: Vec<PublicCaregiver>,
    pub activity: ActivitySummary,
}

pub fn public_profile(profile: &CaseProfile, ctx: &PrivacyContext) -> PublicProfile {
    PublicProfile {
        case_id: profile.case_id,
        display_name: ctx.scrub(&profile.display_name),
        birth_year: profile.birth_year,
        gender: profile.gender.clone(),
        diagnosis: ctx.scrub_opt(profile.diagnosis.name.as_ref()),
        stage: profile.stage.effective(),
        privacy: profile.privacy_level(),
        caregivers: profile
            .caregivers
            .iter()
            .zip(profile.caregiver_pseudonyms())
            .map(|(c, label)| PublicCaregiver {
                label,
                relation: ctx.scrub_opt(c.relation.as_ref()),
            })
            .collect(),
        activity: profile.activity.clone(),
    }
}

// ═══════════════════════════════════════════════════════════
// Filtering
// ═══════════════════════════════════════════════════════════

pub fn public_case(case: &CaseRecord, ctx: &PrivacyContext) -> PublicCase {
    let mut out = PublicCase {
        case_id: case.case_id,
        event_datetime: case.event_datetime.clone(),
        event_date: case.event_date.clone(),
        event_time: case.event_time.clone(),
        event_month: case.month_key(),
        title_zh: ctx.scrub_opt(case.title_zh.as_ref()),
        short_sentence_zh: ctx.scrub_opt(case.short_sentence_zh.as_ref()),
        summary_zh: ctx.scrub_opt(case.summary_zh.as_ref()),
        full_story_zh: ctx.scrub_opt(case.full_story_zh.as_ref().or(case.content.as_ref())),
        symptom_categories: case.symptom_categories.clone(),
        ai_summary: ctx.scrub_opt(case.ai_summary.as_ref()),
        ai_risk: case.ai_risk.clone(),
        ai_score: case.ai_score,
        photos: Vec::new(),
        visibility: case.visibility,
        anonymization_level: case.anonymization_level,
    };

    if ctx.photos_allowed(case) {
        out.photos = case
            .photos
            .iter()
            .map(|p| PublicPhoto {
                url: ctx.photo_url(case, p),
                caption: ctx.scrub_opt(p.caption.as_ref()),
            })
            .collect();
    }

    if ctx.tier == DisclosureTier::Anonymized {
        apply_anonymization_level(&mut out, case.anonymization_level);
    }
    out
}

fn apply_anonymization_level(out: &mut PublicCase, level: AnonymizationLevel) {
    match level {
        AnonymizationLevel::Low => {}
        AnonymizationLevel::Medium => {
            out.full_story_zh = None;
            out.event_time = None;
            out.event_datetime = None;
        }
        AnonymizationLevel::High => {
            if out.short_sentence_zh.is_none() {
                out.short_sentence_zh = out.ai_summary.clone().or_else(|| out.title_zh.clone());
            }
            out.title_zh = None;
            out.summary_zh = None;
            out.full_story_zh = None;
            out.ai_summary = None;
            out.event_datetime = None;
            out.event_date = None;
            out.event_time = None;
        }
    }
}

/// Cases admitted at the context's tier, in input order, stripped of
/// identifiers and tags, with text rewritten for the tier.
pub fn public_filter_cases(cases: &[CaseRecord], ctx: &PrivacyContext) -> Vec<PublicCase> {
    cases
        .iter()
        .filter(|c| ctx.admits(c))
        .map(|c| public_case(c, ctx))
        .collect()
}
