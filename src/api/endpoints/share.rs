//! Public endpoints.
//!
//! - `GET /api/share/:token`: share-link view at the profile's privacy level
//! - `GET /api/public/cases`: anonymized feed across every profile

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::Local;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::load_or_create_profile;
use crate::disclosure::{
    public_case, validate_share_access, PrivacyContext, PublicCase, ShareAccess, ShareOptions,
};
use crate::models::case::CaseRecord;
use crate::normalize::normalize_cases;

#[derive(Serialize)]
pub struct PublicCasesResponse {
    pub cases: Vec<PublicCase>,
}

pub async fn view(
    State(ctx): State<ApiContext>,
    Path(token): Path<String>,
) -> Result<Json<ShareAccess>, ApiError> {
    let opts = ShareOptions {
        now: Local::now().naive_local(),
        window_days: ctx.config.window_days,
        photo_base_url: &ctx.config.photo_base_url,
        signals: &ctx.signals,
    };
    let access = validate_share_access(ctx.store.as_ref(), &ctx.cache, &token, &opts)?;
    if !access.allowed {
        return Err(ApiError::ShareDenied(access.outcome));
    }
    Ok(Json(access))
}

pub async fn public_cases(
    State(ctx): State<ApiContext>,
) -> Result<Json<PublicCasesResponse>, ApiError> {
    let cases = normalize_cases(&ctx.store.load_all_cases()?);

    let mut by_profile: BTreeMap<u32, Vec<CaseRecord>> = BTreeMap::new();
    for case in &cases {
        by_profile.entry(case.case_id).or_default().push(case.clone());
    }

    let mut contexts: BTreeMap<u32, PrivacyContext> = BTreeMap::new();
    for (case_id, group) in &by_profile {
        let profile = ctx.cache.get_or_load(*case_id, || {
            load_or_create_profile(ctx.store.as_ref(), *case_id, group)
        })?;
        contexts.insert(
            *case_id,
            PrivacyContext::anonymized(Some(&profile), &ctx.config.photo_base_url),
        );
    }

    let public = cases
        .iter()
        .filter_map(|case| {
            let privacy = contexts.get(&case.case_id)?;
            privacy.admits(case).then(|| public_case(case, privacy))
        })
        .collect();

    Ok(Json(PublicCasesResponse { cases: public }))
}
