//! `/.netlify/functions/randomthemePreview`: renders a seeded random theme
//! as a full HTML document.

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use services::services::theme_preview::PreviewRequest;
use tracing::{error, warn};

use super::internal_error;
use crate::AppState;

pub const PREVIEW_PATH: &str = "/.netlify/functions/randomthemePreview";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewParams {
    pub domain: Option<String>,
    pub seed: Option<String>,
    #[serde(alias = "post_id")]
    pub post_id: Option<String>,
}

impl PreviewParams {
    /// Fields set in `other` win.
    fn merged_with(self, other: PreviewParams) -> Self {
        Self {
            domain: other.domain.or(self.domain),
            seed: other.seed.or(self.seed),
            post_id: other.post_id.or(self.post_id),
        }
    }
}

/// A query string that does not deserialize (e.g. a repeated key) falls
/// back to defaults instead of a 400.
fn query_or_default(query: Result<Query<PreviewParams>, QueryRejection>) -> PreviewParams {
    match query {
        Ok(Query(params)) => params,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed preview query string");
            PreviewParams::default()
        }
    }
}

/// GET /.netlify/functions/randomthemePreview?domain=&seed=&postId=
pub async fn preview_get(
    State(state): State<AppState>,
    query: Result<Query<PreviewParams>, QueryRejection>,
) -> Response {
    render_preview(&state, query_or_default(query)).await
}

/// POST /.netlify/functions/randomthemePreview
/// JSON body `{domain?, seed?, postId?}`; body fields override the query.
pub async fn preview_post(
    State(state): State<AppState>,
    query: Result<Query<PreviewParams>, QueryRejection>,
    body: Bytes,
) -> Response {
    let query = query_or_default(query);
    let from_body = if body.iter().all(u8::is_ascii_whitespace) {
        PreviewParams::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring malformed preview request body");
            PreviewParams::default()
        })
    };
    render_preview(&state, query.merged_with(from_body)).await
}

/// OPTIONS /.netlify/functions/randomthemePreview
pub async fn preview_options() -> impl IntoResponse {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, Authorization",
            ),
        ],
    )
}

async fn render_preview(state: &AppState, params: PreviewParams) -> Response {
    let req = PreviewRequest::from_parts(params.domain, params.seed, params.post_id);

    match state.preview().render(&req).await {
        Ok(outcome) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            outcome.html,
        )
            .into_response(),
        Err(e) => {
            error!(domain = %req.domain, seed = %req.seed, error = %e, "Random theme preview failed");
            internal_error()
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        PREVIEW_PATH,
        get(preview_get).post(preview_post).options(preview_options),
    )
}
