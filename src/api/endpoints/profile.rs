//! Profile endpoints (owner tier).
//!
//! - `GET /api/profile`: normalized profile, materialized on first read
//! - `PUT /api/profile`: replace profile fields, optionally with scale results
//! - `POST /api/profile/share-token`: issue a fresh share token
//! - `DELETE /api/profile/share-token`: revoke the share token

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CaseQuery};
use crate::db::{load_profile_with_cases, save_profile_and_invalidate};
use crate::disclosure::{issue_share_token, revoke_share_token};
use crate::models::case_profile::{CaseProfile, ScaleResult};
use crate::normalize::{normalize_profile, stage_from_scales};

#[derive(Serialize)]
pub struct ProfileResponse {
    pub profile: CaseProfile,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTokenResponse {
    pub share_token: Option<String>,
}

pub async fn get(
    State(ctx): State<ApiContext>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let (profile, _) = load_profile_with_cases(ctx.store.as_ref(), &ctx.cache, query.case_id())?;
    Ok(Json(ProfileResponse { profile }))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Query(query): Query<CaseQuery>,
    body: Bytes,
) -> Result<Json<ProfileResponse>, ApiError> {
    let raw: Value = serde_json::from_slice(&body)
        .ok()
        .filter(Value::is_object)
        .ok_or_else(|| ApiError::BadRequest("Profile body must be a JSON object".into()))?;

    let scales: Option<Vec<ScaleResult>> = match raw.get("scales") {
        None | Some(Value::Null) => None,
        Some(value) => Some(serde_json::from_value(value.clone()).map_err(|_| {
            ApiError::BadRequest("scales must be a list of {scale, score, date}".into())
        })?),
    };

    let case_id = query.case_id();
    let (existing, cases) = load_profile_with_cases(ctx.store.as_ref(), &ctx.cache, case_id)?;

    let mut profile = normalize_profile(&raw, Some(&cases), scales.as_deref());
    profile.case_id = case_id;
    // tokens only change through the share-token routes
    profile.share_token = existing.share_token.clone();
    if scales.as_deref().and_then(stage_from_scales).is_none() {
        profile.stage.auto = existing.stage.auto;
    }

    save_profile_and_invalidate(ctx.store.as_ref(), &ctx.cache, &profile)?;
    tracing::info!(case_id, privacy = profile.privacy_mode.as_str(), "Profile saved");
    Ok(Json(ProfileResponse { profile }))
}

pub async fn issue_token(
    State(ctx): State<ApiContext>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ShareTokenResponse>, ApiError> {
    let case_id = query.case_id();
    let (existing, _) = load_profile_with_cases(ctx.store.as_ref(), &ctx.cache, case_id)?;
    let profile = issue_share_token(&existing);
    save_profile_and_invalidate(ctx.store.as_ref(), &ctx.cache, &profile)?;
    tracing::info!(case_id, "Share token issued");
    Ok(Json(ShareTokenResponse {
        share_token: profile.share_token,
    }))
}

pub async fn revoke_token(
    State(ctx): State<ApiContext>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<ShareTokenResponse>, ApiError> {
    let case_id = query.case_id();
    let (existing, _) = load_profile_with_cases(ctx.store.as_ref(), &ctx.cache, case_id)?;
    let profile = revoke_share_token(&existing);
    save_profile_and_invalidate(ctx.store.as_ref(), &ctx.cache, &profile)?;
    tracing::info!(case_id, "Share token revoked");
    Ok(Json(ShareTokenResponse { share_token: None }))
}
