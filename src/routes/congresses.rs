use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{error::AppResult, query::FilterSpec, state::AppState};

/// `GET /v1/congresses` — one sorted page of the directory plus facet counts
/// over the filtered set. Recognized parameters: q, ind, tier, region,
/// country, month, sort, dir, page, pageSize (comma-delimited multi-values).
pub async fn list_congresses(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<impl IntoResponse> {
    let spec = FilterSpec::from_query(&params);
    let page = state.store.query_page(&spec).await?;
    Ok(Json(page))
}
