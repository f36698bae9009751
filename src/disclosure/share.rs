use std::collections::BTreeMap;

use base64::Engine;
use chrono::NaiveDateTime;
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::clinical::{aggregate_cases, window_cases, ClinicalAggregates, KeywordCount};
use crate::classify::categories_for_case;
use crate::db::{load_profile_with_cases, CaseStore, DatabaseError};
use crate::models::case::CaseRecord;
use crate::models::case_profile::CaseProfile;
use crate::models::enums::PrivacyLevel;
use crate::profile_cache::ProfileCache;
use crate::trends::{analyze_trends, SignalTable};

use super::filter::{public_filter_cases, public_profile, PrivacyContext, PublicCase, PublicProfile};

/// Random bytes per share token (32 URL-safe characters once encoded).
const SHARE_TOKEN_BYTES: usize = 24;

// ═══════════════════════════════════════════════════════════
// Outcomes
// ═══════════════════════════════════════════════════════════

/// Terminal result of one share-link validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareOutcome {
    NotFound,
    Forbidden,
    AllowedLimited,
    AllowedFull,
}

impl ShareOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::AllowedLimited => "ALLOWED_LIMITED",
            Self::AllowedFull => "ALLOWED_FULL",
        }
    }

    pub fn is_allowed(self) -> bool {
        matches!(self, Self::AllowedLimited | Self::AllowedFull)
    }
}

/// Metrics a share-link holder may see. The trend fields are only
/// filled for `public` profiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareMetrics {
    pub case_count: u32,
    pub category_counts: BTreeMap<String, u32>,
    pub first_event_date: Option<String>,
    pub last_event_date: Option<String>,
    pub window_days: Option<u32>,
    pub aggregates: Option<ClinicalAggregates>,
    pub trend_summary_lines: Option<Vec<String>>,
    pub clinical_narrative_lines: Option<Vec<String>>,
}

/// `{allowed, reason, privacy, profile, events, metrics}`; denied results
/// carry only `allowed` and `reason`, the rest serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAccess {
    #[serde(skip)]
    pub outcome: ShareOutcome,
    pub allowed: bool,
    pub reason: Option<&'static str>,
    pub privacy: Option<PrivacyLevel>,
    pub profile: Option<PublicProfile>,
    pub events: Option<Vec<PublicCase>>,
    pub metrics: Option<ShareMetrics>,
}

impl ShareAccess {
    fn denied(outcome: ShareOutcome) -> Self {
        Self {
            outcome,
            allowed: false,
            reason: Some(outcome.as_str()),
            privacy: None,
            profile: None,
            events: None,
            metrics: None,
        }
    }

    pub fn not_found() -> Self {
        Self::denied(ShareOutcome::NotFound)
    }

    pub fn forbidden() -> Self {
        Self::denied(ShareOutcome::Forbidden)
    }
}

/// Request-scoped inputs that do not come from storage.
#[derive(Debug, Clone, Copy)]
pub struct ShareOptions<'a> {
    pub now: NaiveDateTime,
    pub window_days: u32,
    pub photo_base_url: &'a str,
    pub signals: &'a SignalTable,
}

// ═══════════════════════════════════════════════════════════
// Token lifecycle
// ═══════════════════════════════════════════════════════════

pub fn generate_share_token() -> String {
    let bytes: [u8; SHARE_TOKEN_BYTES] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// A copy of `profile` holding a fresh token. The previous token stops
/// matching as soon as the copy is saved.
pub fn issue_share_token(profile: &CaseProfile) -> CaseProfile {
    CaseProfile {
        share_token: Some(generate_share_token()),
        ..profile.clone()
    }
}

/// A copy of `profile` with no active token.
pub fn revoke_share_token(profile: &CaseProfile) -> CaseProfile {
    CaseProfile {
        share_token: None,
        ..profile.clone()
    }
}

/// Exact, constant-time token comparison.
pub fn tokens_match(presented: &str, active: Option<&str>) -> bool {
    match active {
        Some(active) => bool::from(presented.as_bytes().ct_eq(active.as_bytes())),
        None => false,
    }
}

// ═══════════════════════════════════════════════════════════
// Validation
// ═══════════════════════════════════════════════════════════

/// Decide a share request against an already-resolved profile.
///
/// `profile` is `None` when no profile owns the token. The profile's
/// privacy level is checked after the token, and `private` wins over
/// any token.
pub fn evaluate_share_access(
    token: &str,
    profile: Option<&CaseProfile>,
    cases: &[CaseRecord],
    opts: &ShareOptions<'_>,
) -> ShareAccess {
    let Some(profile) = profile else {
        return ShareAccess::not_found();
    };
    if !tokens_match(token, profile.share_token.as_deref()) {
        return ShareAccess::not_found();
    }

    let privacy = profile.privacy_level();
    let outcome = match privacy {
        PrivacyLevel::Private => return ShareAccess::forbidden(),
        PrivacyLevel::Limited => ShareOutcome::AllowedLimited,
        PrivacyLevel::Public => ShareOutcome::AllowedFull,
    };

    let ctx = PrivacyContext::limited(profile, opts.photo_base_url);
    let events = public_filter_cases(cases, &ctx);
    let shared: Vec<CaseRecord> = cases.iter().filter(|c| ctx.admits(c)).cloned().collect();

    let mut metrics = limited_metrics(&shared);
    if outcome == ShareOutcome::AllowedFull {
        let windowed = window_cases(&shared, opts.window_days, opts.now);
        let trends = analyze_trends(&windowed, opts.now, opts.signals);
        metrics.window_days = Some(opts.window_days);
        metrics.aggregates = Some(scrub_aggregates(aggregate_cases(&windowed), &ctx));
        metrics.trend_summary_lines = Some(scrub_lines(trends.trend_summary, &ctx));
        metrics.clinical_narrative_lines = Some(scrub_lines(trends.clinical_narrative, &ctx));
    }

    ShareAccess {
        outcome,
        allowed: true,
        reason: None,
        privacy: Some(privacy),
        profile: Some(public_profile(profile, &ctx)),
        events: Some(events),
        metrics: Some(metrics),
    }
}

/// Tags and keywords are free text; pass them through the same redactor
/// as the events. Keys that collapse onto one placeholder merge counts.
fn scrub_aggregates(agg: ClinicalAggregates, ctx: &PrivacyContext) -> ClinicalAggregates {
    let scrub_keys = |counts: BTreeMap<String, u32>| {
        let mut out: BTreeMap<String, u32> = BTreeMap::new();
        for (key, count) in counts {
            *out.entry(ctx.scrub(&key)).or_insert(0) += count;
        }
        out
    };
    let mut keywords: BTreeMap<String, u32> = BTreeMap::new();
    for k in &agg.top_keywords {
        *keywords.entry(ctx.scrub(&k.keyword)).or_insert(0) += k.count;
    }
    let mut top_keywords: Vec<KeywordCount> = keywords
        .into_iter()
        .map(|(keyword, count)| KeywordCount { keyword, count })
        .collect();
    top_keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword)));
    ClinicalAggregates {
        tag_counts: scrub_keys(agg.tag_counts),
        tag_trend: agg.tag_trend.into_iter().map(|(month, tags)| (month, scrub_keys(tags))).collect(),
        top_keywords,
        ..agg
    }
}

fn scrub_lines(lines: Vec<String>, ctx: &PrivacyContext) -> Vec<String> {
    lines.iter().map(|line| ctx.scrub(line)).collect()
}

fn limited_metrics(cases: &[CaseRecord]) -> ShareMetrics {
    let mut category_counts = BTreeMap::new();
    for category in cases.iter().flat_map(categories_for_case) {
        *category_counts.entry(category.as_str().to_string()).or_insert(0) += 1;
    }
    let mut dates: Vec<&str> = cases.iter().filter_map(|c| c.event_date.as_deref()).collect();
    dates.sort_unstable();
    ShareMetrics {
        case_count: cases.len() as u32,
        category_counts,
        first_event_date: dates.first().map(|d| d.to_string()),
        last_event_date: dates.last().map(|d| d.to_string()),
        window_days: None,
        aggregates: None,
        trend_summary_lines: None,
        clinical_narrative_lines: None,
    }
}

/// Resolve `token` through the store and decide the request.
///
/// Storage failures propagate; unknown tokens and private profiles are
/// ordinary outcomes.
pub fn validate_share_access(
    store: &dyn CaseStore,
    cache: &ProfileCache,
    token: &str,
    opts: &ShareOptions<'_>,
) -> Result<ShareAccess, DatabaseError> {
    if token.is_empty() {
        return Ok(ShareAccess::not_found());
    }
    let Some(case_id) = store.resolve_share_token(token)? else {
        tracing::info!(outcome = ShareOutcome::NotFound.as_str(), "Share access");
        return Ok(ShareAccess::not_found());
    };

    let (profile, cases) = load_profile_with_cases(store, cache, case_id)?;
    let access = evaluate_share_access(token, Some(&profile), &cases, opts);
    tracing::info!(case_id, outcome = access.outcome.as_str(), "Share access");
    Ok(access)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_case, normalize_profile};
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-03-15T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn opts(signals: &SignalTable) -> ShareOptions<'_> {
        ShareOptions {
            now: now(),
            window_days: 30,
            photo_base_url: "/uploads",
            signals,
        }
    }

    fn profile(mode: &str, token: Option<&str>) -> CaseProfile {
        normalize_profile(
            &json!({
                "caseId": 1,
                "displayName": "阿公",
                "legalName": "張志強",
                "privacyMode": mode,
                "shareToken": token,
                "hospital": { "name": "仁愛醫院", "doctor": "黃大夫" },
            }),
            None,
            None,
        )
    }

    fn cases() -> Vec<CaseRecord> {
        vec![
            normalize_case(&json!({
                "id": "a",
                "eventDatetime": "2026-03-14T08:00:00",
                "titleZh": "張志強在仁愛醫院跌倒",
                "shareMode": "token",
                "visibility": "family",
                "tags": ["fall"],
            })),
            normalize_case(&json!({
                "id": "b",
                "eventDatetime": "2026-03-10T08:00:00",
                "titleZh": "私密紀錄",
            })),
        ]
    }

    #[test]
    fn unknown_profile_is_not_found() {
        let table = SignalTable::empty();
        let access = evaluate_share_access("abc", None, &cases(), &opts(&table));
        assert_eq!(access.outcome, ShareOutcome::NotFound);
        assert!(!access.allowed);
    }

    #[test]
    fn mismatched_token_is_not_found() {
        let table = SignalTable::empty();
        let p = profile("public", Some("right-token"));
        for presented in ["wrong-token", "right-", "right-token-extra", "", " right-token", "right-token\n"] {
            let access = evaluate_share_access(presented, Some(&p), &cases(), &opts(&table));
            assert_eq!(access.outcome, ShareOutcome::NotFound, "{presented}");
        }
    }

    #[test]
    fn private_profile_is_forbidden_regardless_of_token() {
        let table = SignalTable::empty();
        let p = profile("private", Some("tok"));
        let access = evaluate_share_access("tok", Some(&p), &cases(), &opts(&table));
        assert_eq!(access.outcome, ShareOutcome::Forbidden);
        assert!(access.events.is_none());
        assert!(access.profile.is_none());
    }

    #[test]
    fn denied_shapes_are_identical_apart_from_reason() {
        let forbidden = serde_json::to_value(ShareAccess::forbidden()).unwrap();
        let not_found = serde_json::to_value(ShareAccess::not_found()).unwrap();
        let keys = |v: &serde_json::Value| v.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys(&forbidden), keys(&not_found));
        assert_eq!(not_found["events"], serde_json::Value::Null);
        assert_eq!(forbidden["reason"], "FORBIDDEN");
    }

    #[test]
    fn limited_profile_gets_reduced_metrics() {
        let table = SignalTable::empty();
        let p = profile("masked", Some("tok"));
        let access = evaluate_share_access("tok", Some(&p), &cases(), &opts(&table));
        assert_eq!(access.outcome, ShareOutcome::AllowedLimited);
        assert_eq!(access.privacy, Some(PrivacyLevel::Limited));
        let events = access.events.as_ref().unwrap();
        assert_eq!(events.len(), 1);
        let metrics = access.metrics.as_ref().unwrap();
        assert_eq!(metrics.case_count, 1);
        assert!(metrics.aggregates.is_none());
        assert!(metrics.trend_summary_lines.is_none());
    }

    #[test]
    fn public_profile_gets_full_metrics() {
        let table = SignalTable::bundled();
        let p = profile("public", Some("tok"));
        let access = evaluate_share_access("tok", Some(&p), &cases(), &opts(&table));
        assert_eq!(access.outcome, ShareOutcome::AllowedFull);
        let metrics = access.metrics.unwrap();
        assert_eq!(metrics.aggregates.unwrap().case_count, 1);
        assert!(!metrics.clinical_narrative_lines.unwrap().is_empty());
    }

    #[test]
    fn shared_payload_never_contains_identities() {
        let table = SignalTable::bundled();
        for mode in ["masked", "public"] {
            let p = profile(mode, Some("s3cr3t-share"));
            let access = evaluate_share_access("s3cr3t-share", Some(&p), &cases(), &opts(&table));
            let body = serde_json::to_string(&access).unwrap();
            for term in ["張志強", "仁愛醫院", "黃大夫", "s3cr3t-share"] {
                assert!(!body.contains(term), "{term} leaked");
            }
        }
    }

    #[test]
    fn tag_metrics_and_photo_names_never_carry_identities() {
        let table = SignalTable::bundled();
        let p = profile("public", Some("s3cr3t-share"));
        let tagged = normalize_case(&json!({
            "id": "c",
            "eventDatetime": "2026-03-12T10:00:00",
            "titleZh": "回診",
            "shareMode": "token",
            "visibility": "family",
            "tags": ["仁愛醫院", "張志強"],
            "photos": ["張志強-門診.jpg"],
            "allowPhotosPublic": true,
        }));
        let mut all = cases();
        all.push(tagged);
        let access = evaluate_share_access("s3cr3t-share", Some(&p), &all, &opts(&table));
        assert_eq!(access.outcome, ShareOutcome::AllowedFull);
        let body = serde_json::to_string(&access).unwrap();
        for term in ["張志強", "仁愛醫院"] {
            assert!(!body.contains(term), "{term} leaked in {body}");
        }

        let agg = access.metrics.unwrap().aggregates.unwrap();
        assert_eq!(agg.tag_counts.values().sum::<u32>(), 3);
        assert_eq!(agg.tag_counts["[facility]"], 1);
        assert_eq!(agg.tag_trend["2026-03"]["[name]"], 1);
        let photos: Vec<_> = access.events.unwrap().into_iter().flat_map(|e| e.photos).collect();
        assert_eq!(photos.len(), 1);
        assert!(photos[0].url.starts_with("/uploads/"));
        assert!(photos[0].url.ends_with(".jpg"));
    }

    #[test]
    fn revoked_token_resolves_to_not_found() {
        let table = SignalTable::empty();
        let issued = issue_share_token(&profile("public", None));
        let old = issued.share_token.clone().unwrap();
        assert_eq!(
            evaluate_share_access(&old, Some(&issued), &cases(), &opts(&table)).outcome,
            ShareOutcome::AllowedFull
        );
        let revoked = revoke_share_token(&issued);
        assert_eq!(
            evaluate_share_access(&old, Some(&revoked), &cases(), &opts(&table)).outcome,
            ShareOutcome::NotFound
        );
    }

    #[test]
    fn reissue_invalidates_previous_token() {
        let first = issue_share_token(&profile("public", None));
        let second = issue_share_token(&first);
        let old = first.share_token.unwrap();
        assert_ne!(second.share_token.as_deref(), Some(old.as_str()));
        assert!(!tokens_match(&old, second.share_token.as_deref()));
    }

    #[test]
    fn generated_tokens_are_url_safe() {
        let token = generate_share_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
