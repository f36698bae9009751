//! Tag listing and search.
//!
//! - `GET /api/tags/:tag`
//! - `GET /api/search?q=`

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, CaseQuery};
use crate::db::load_case_records;
use crate::feed::{cases_by_tag, search_cases, SearchResults, TagFeed};
use crate::models::case::CaseRecord;

pub async fn by_tag(
    State(ctx): State<ApiContext>,
    Path(tag): Path<String>,
    Query(query): Query<CaseQuery>,
) -> Result<Json<TagFeed<CaseRecord>>, ApiError> {
    let cases = load_case_records(ctx.store.as_ref(), query.case_id())?;
    Ok(Json(cases_by_tag(&cases, &tag)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub case_id: Option<u32>,
}

pub async fn search(
    State(ctx): State<ApiContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults<CaseRecord>>, ApiError> {
    let case_id = CaseQuery {
        case_id: query.case_id,
    }
    .case_id();
    let cases = load_case_records(ctx.store.as_ref(), case_id)?;
    Ok(Json(search_cases(&cases, &query.q)))
}
