//! Case endpoints.
//!
//! - `GET /api/cases`: owner view of every case, enriched
//! - `GET /api/cases/:id`: one case, enriched against its predecessor
//! - `POST /api/cases`: validate, normalize, enrich and store a new case

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CaseQuery};
use crate::db::load_case_records;
use crate::models::case::CaseRecord;
use crate::normalize::normalize_case;
use crate::signals::{enrich_case, enrich_cases, suggest_smart_tags};
use crate::validation::{validate_new_case, ValidationError};

#[derive(Serialize)]
pub struct CasesResponse {
    pub cases: Vec<CaseRecord>,
}

#[derive(Serialize)]
pub struct CaseResponse {
    pub case: CaseRecord,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCase {
    pub case: CaseRecord,
    pub suggested_tags: Vec<String>,
}

/// `GET /api/cases?caseId=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<CasesResponse>, ApiError> {
    let cases = load_case_records(ctx.store.as_ref(), query.case_id())?;
    Ok(Json(CasesResponse {
        cases: enrich_cases(&cases),
    }))
}

/// `GET /api/cases/:id`
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<CaseResponse>, ApiError> {
    let Some(raw) = ctx.store.load_case(&id)? else {
        return Err(ApiError::NotFound(format!("case {id}")));
    };
    let case = normalize_case(&raw);
    let siblings = load_case_records(ctx.store.as_ref(), case.case_id)?;
    let case = enrich_case(&case, previous_case(&siblings, &case));
    Ok(Json(CaseResponse { case }))
}

/// Latest dated case strictly before `case`, other than itself.
fn previous_case<'a>(cases: &'a [CaseRecord], case: &CaseRecord) -> Option<&'a CaseRecord> {
    cases
        .iter()
        .filter(|c| c.id != case.id && c.event_datetime.is_some())
        .filter(|c| c.event_datetime < case.event_datetime)
        .max_by(|a, b| a.event_datetime.cmp(&b.event_datetime))
}

/// `POST /api/cases`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<CreatedCase>), ApiError> {
    let mut raw: Value =
        serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidBody)?;
    validate_new_case(&raw)?;

    if let Some(obj) = raw.as_object_mut() {
        let has_id = obj
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.trim().is_empty());
        if !has_id {
            obj.insert("id".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        }
    }
    let case = normalize_case(&raw);

    let existing = load_case_records(ctx.store.as_ref(), case.case_id)?;
    let case = enrich_case(&case, previous_case(&existing, &case));
    let suggested_tags = suggest_smart_tags(&case);

    ctx.store.save_case(&case)?;
    // the profile's activity block is derived from cases
    ctx.cache.invalidate(case.case_id)?;

    tracing::info!(case_id = case.case_id, risk = ?case.ai_risk, "Case recorded");

    Ok((
        StatusCode::CREATED,
        Json(CreatedCase {
            case,
            suggested_tags,
        }),
    ))
}
