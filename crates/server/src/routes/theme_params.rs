//! Debug endpoint exposing the design parameters a seed selects.

use axum::{
    Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::theme::DesignParams;
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ThemeParamsQuery {
    pub seed: Option<String>,
}

/// GET /api/themes/preview-params?seed=
pub async fn get_preview_params(
    State(state): State<AppState>,
    Query(query): Query<ThemeParamsQuery>,
) -> Result<ResponseJson<ApiResponse<DesignParams>>, ApiError> {
    let seed = query
        .seed
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("seed is required".to_string()))?;

    let params = state.preview().generator().design_for_seed(&seed)?;
    Ok(ResponseJson(ApiResponse::success(params)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/themes/preview-params", get(get_preview_params))
}
