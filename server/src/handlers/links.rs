use crate::{
    error::{AppError, AppResult},
    links,
    models::{CreatedLink, LinkPage, LinkStats},
    response::ApiResponse,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

// ── Request types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    target_url: Option<String>,
    custom_code: Option<String>,
}

/// Paging input is parsed leniently: anything that isn't a number falls back
/// to the default.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// POST /api/links
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> AppResult<ApiResponse<CreatedLink>> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let created = links::create_link(
        &state,
        req.target_url.as_deref(),
        req.custom_code.as_deref(),
    )
    .await?;

    Ok(ApiResponse::new(
        StatusCode::CREATED,
        created,
        "Link created successfully",
    ))
}

/// GET /api/links?page=&limit=&search=
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> AppResult<ApiResponse<LinkPage>> {
    let page = params.page.as_deref().and_then(|p| p.trim().parse().ok());
    let limit = params.limit.as_deref().and_then(|l| l.trim().parse().ok());

    let listing = links::list_links(&state, page, limit, params.search.as_deref()).await?;
    Ok(ApiResponse::ok(listing, "Links fetched successfully"))
}

/// GET /api/links/:code
pub async fn link_stats(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<LinkStats>> {
    let stats = links::link_stats(&state, &code).await?;
    Ok(ApiResponse::ok(stats, "Link stats fetched successfully"))
}

/// DELETE /api/links/:code
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<ApiResponse<()>> {
    links::delete_link(&state, &code).await?;
    Ok(ApiResponse::ok((), "Link deleted successfully"))
}
