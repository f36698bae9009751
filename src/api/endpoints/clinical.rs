//! `GET /api/clinical-summary`: owner-tier clinical summary.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::clinical::{build_clinical_summary_now, ClinicalSummary};
use crate::db::load_profile_with_cases;
use crate::models::case::DEFAULT_CASE_ID;
use crate::models::case_profile::CaseProfile;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub case_id: Option<u32>,
    pub window_days: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub clinical_summary: ClinicalSummary,
    pub profile: CaseProfile,
}

pub async fn summary(
    State(ctx): State<ApiContext>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let case_id = query.case_id.filter(|id| *id > 0).unwrap_or(DEFAULT_CASE_ID);
    let window_days = match query.window_days {
        Some(0) => return Err(ApiError::BadRequest("windowDays must be positive".into())),
        Some(days) => days,
        None => ctx.config.window_days,
    };

    let (profile, cases) = load_profile_with_cases(ctx.store.as_ref(), &ctx.cache, case_id)?;
    let clinical_summary = build_clinical_summary_now(&profile, &cases, window_days, &ctx.signals);

    Ok(Json(SummaryResponse {
        clinical_summary,
        profile,
    }))
}
