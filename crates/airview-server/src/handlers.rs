// HTTP request handlers
//
// Author views, cached post lookup, the most-viewed ranking and health checks

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use airview_config::is_valid_alias;
use airview_core::ViewTracker;

use crate::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub(crate) struct GotoParams {
    address: Option<String>,
}

/// Count a view of `address` without holding up the response.
pub(crate) fn record_view(tracker: &Arc<ViewTracker>, address: &str) {
    let tracker = Arc::clone(tracker);
    let address = address.to_string();
    tokio::spawn(async move {
        tracker.increment(&address);
    });
}

/// GET / - Most viewed authors
pub(crate) async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let top: Vec<_> = state
        .tracker
        .top_addresses(state.home_top)
        .into_iter()
        .filter(|record| !record.is_sentinel())
        .collect();

    Json(json!({ "top": top }))
}

/// GET /goto?address=A - Redirect to an author's page
pub(crate) async fn goto(Query(params): Query<GotoParams>) -> Result<Response, AppError> {
    let address = params
        .address
        .filter(|address| !address.is_empty())
        .ok_or_else(|| {
            AppError::with_status(
                StatusCode::BAD_REQUEST,
                anyhow::anyhow!("missing address parameter"),
            )
        })?;

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, format!("/view/{}", address))],
    )
        .into_response())
}

/// GET /view/:alias - Fetch an author's posts live
///
/// `views` is approximate: the view recorded for this request is counted on a
/// detached task and may land after the response is built.
pub(crate) async fn view_user(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Response, AppError> {
    if !is_valid_alias(&alias) {
        return Err(AppError::not_found("Could not find that user."));
    }

    counter!("airview.http.views").increment(1);
    record_view(&state.tracker, &alias);

    let posts = state.fetcher.fetch_posts(&alias).await?;
    debug!(alias = %alias, posts = posts.len(), "Rendering author view");

    Ok(Json(json!({
        "user": alias,
        "views": state.tracker.views(&alias),
        "posts": posts,
    }))
    .into_response())
}

/// GET /view/:alias/*name - Single post from the cache
pub(crate) async fn view_post(
    State(state): State<AppState>,
    Path((alias, name)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if !is_valid_alias(&alias) {
        return Err(AppError::not_found("Could not find that post."));
    }

    let post = state
        .fetcher
        .cache()
        .get_post(&alias, &name)
        .ok_or_else(|| AppError::not_found("Could not find that post."))?;

    Ok(Json(json!({
        "user": alias,
        "post": post,
    }))
    .into_response())
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// GET /ready - Readiness check with cache occupancy
pub(crate) async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.fetcher.cache();
    (
        StatusCode::OK,
        Json(json!({
            "status": "ready",
            "cached_posts": cache.post_count(),
            "cached_authors": cache.author_count(),
        })),
    )
}
