use crate::{error::AppResult, links, AppState};
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use std::sync::Arc;

/// GET /api/:code
///
/// Counts the click (counter, timestamp and click row in one transaction)
/// before answering, then redirects to the stored target URL.
pub async fn redirect(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> AppResult<Redirect> {
    let target_url = links::record_redirect(&state, &code).await?;
    Ok(Redirect::to(&target_url))
}
