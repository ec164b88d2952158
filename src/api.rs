//! HTTP surface for the video endpoints.
//!
//! Handlers parse and normalize the request, then run the blocking provider
//! or aggregator call on the blocking pool. Search, video details and
//! trending go straight to the provider; channel listings go through the
//! aggregator and its snapshot cache.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tokio::task;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::aggregator::ChannelAggregator;
use crate::error::VideoError;
use crate::models::{ChannelInfo, PageToken, VideoSummary};
use crate::params::{
    CATALOGUE_LIMIT, CHANNEL_ID_LIMIT, CHANNEL_URL_LIMIT, SEARCH_LIMIT, TRENDING_LIMIT,
    parse_query_limit, trending_category,
};
use crate::provider::VideoProvider;
use crate::response::{
    CatalogueResponse, CatalogueVideosResponse, ChannelVideosResponse, TrendingResponse,
    VideoListResponse,
};

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn VideoProvider>,
    aggregator: Arc<ChannelAggregator>,
}

impl AppState {
    pub fn new(provider: Arc<dyn VideoProvider>, aggregator: Arc<ChannelAggregator>) -> Self {
        Self {
            provider,
            aggregator,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: String,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, details: impl Into<String>) -> Self {
        Self {
            status,
            error: error.to_string(),
            details: details.into(),
        }
    }

    fn bad_request(details: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid request", details)
    }

    fn internal(details: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error", details)
    }
}

impl From<VideoError> for ApiError {
    fn from(err: VideoError) -> Self {
        let details = err.to_string();
        if err.is_not_found() {
            return Self::new(StatusCode::NOT_FOUND, "not found", details);
        }
        match err {
            VideoError::InvalidReference(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid channel reference", details)
            }
            VideoError::Provider(_) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "video provider request failed",
                details,
            ),
            _ => Self::bad_request(details),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "details": self.details,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(health))
        .route("/api/youtube/search", post(search_videos))
        .route("/api/youtube/video", post(video_details))
        .route("/api/youtube/channel/videos", post(channel_videos))
        .route("/api/youtube/channel/url", post(channel_videos_by_url))
        .route("/api/youtube/channel/{channel_id}", get(channel_info))
        .route("/api/youtube/trending", get(trending_videos))
        .route("/api/youtube/channels", get(list_catalogue))
        .route("/api/youtube/channels/{slug}/videos", get(catalogue_videos))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, VideoError> + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|err| ApiError::internal(format!("task join error: {err}")))?
        .map_err(ApiError::from)
}

fn required(value: String, field: &str) -> ApiResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    max_results: Option<i64>,
    page_token: Option<String>,
}

async fn search_videos(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<VideoListResponse>> {
    let Json(request) = payload?;
    let query = required(request.query, "query")?;
    let limit = SEARCH_LIMIT.apply(request.max_results)?;
    let page_token = PageToken::from_request(request.page_token);
    debug!(%query, limit, "search");

    let provider = state.provider.clone();
    let page = run_blocking(move || provider.search(&query, limit, page_token.as_ref())).await?;
    Ok(Json(page.into()))
}

#[derive(Debug, Deserialize)]
struct VideoRequest {
    video_id: String,
}

async fn video_details(
    State(state): State<AppState>,
    payload: Result<Json<VideoRequest>, JsonRejection>,
) -> ApiResult<Json<VideoSummary>> {
    let Json(request) = payload?;
    let video_id = required(request.video_id, "video_id")?;

    let provider = state.provider.clone();
    let video = run_blocking(move || provider.video_details(&video_id)).await?;
    Ok(Json(video))
}

#[derive(Debug, Deserialize)]
struct ChannelVideosRequest {
    channel_id: String,
    max_results: Option<i64>,
    page_token: Option<String>,
}

async fn channel_videos(
    State(state): State<AppState>,
    payload: Result<Json<ChannelVideosRequest>, JsonRejection>,
) -> ApiResult<Json<VideoListResponse>> {
    let Json(request) = payload?;
    let channel_id = required(request.channel_id, "channel_id")?;
    let limit = CHANNEL_ID_LIMIT.apply(request.max_results)?;
    let page_token = PageToken::from_request(request.page_token);

    let aggregator = state.aggregator.clone();
    let listing = run_blocking(move || {
        aggregator.channel_videos(&channel_id, limit, page_token.as_ref())
    })
    .await?;
    Ok(Json(listing.into()))
}

#[derive(Debug, Deserialize)]
struct ChannelUrlRequest {
    channel_url: String,
    max_results: Option<i64>,
}

async fn channel_videos_by_url(
    State(state): State<AppState>,
    payload: Result<Json<ChannelUrlRequest>, JsonRejection>,
) -> ApiResult<Json<ChannelVideosResponse>> {
    let Json(request) = payload?;
    let channel_url = required(request.channel_url, "channel_url")?;
    let limit = CHANNEL_URL_LIMIT.apply(request.max_results)?;

    let aggregator = state.aggregator.clone();
    let (channel, listing) =
        run_blocking(move || aggregator.channel_by_reference(&channel_url, limit)).await?;
    Ok(Json(ChannelVideosResponse::assemble(channel, listing)))
}

async fn channel_info(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ChannelInfo>> {
    let Path(channel_id) = path?;
    let aggregator = state.aggregator.clone();
    let info = run_blocking(move || aggregator.channel_info(&channel_id)).await?;
    Ok(Json(info))
}

#[derive(Debug, Default, Deserialize)]
struct TrendingQuery {
    category: Option<String>,
    max_results: Option<String>,
}

async fn trending_videos(
    State(state): State<AppState>,
    query: Result<Query<TrendingQuery>, QueryRejection>,
) -> ApiResult<Json<TrendingResponse>> {
    let Query(query) = query?;
    let limit = TRENDING_LIMIT.apply(parse_query_limit(query.max_results.as_deref()))?;
    let category_id = trending_category(query.category.as_deref())?;

    let provider = state.provider.clone();
    let page = run_blocking({
        let category_id = category_id.clone();
        move || provider.trending(category_id.as_deref(), limit)
    })
    .await?;
    Ok(Json(TrendingResponse {
        category: category_id,
        videos: page.videos,
    }))
}

async fn list_catalogue(State(state): State<AppState>) -> Json<CatalogueResponse> {
    let channels = state.aggregator.catalogue().entries().to_vec();
    Json(CatalogueResponse {
        count: channels.len(),
        channels,
    })
}

#[derive(Debug, Default, Deserialize)]
struct CatalogueQuery {
    max_results: Option<String>,
}

async fn catalogue_videos(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<CatalogueQuery>, QueryRejection>,
) -> ApiResult<Json<CatalogueVideosResponse>> {
    let Path(slug) = path?;
    let Query(query) = query?;
    let limit = CATALOGUE_LIMIT.apply(parse_query_limit(query.max_results.as_deref()))?;

    let aggregator = state.aggregator.clone();
    let (entry, listing) = run_blocking(move || aggregator.catalogue_videos(&slug, limit)).await?;
    Ok(Json(CatalogueVideosResponse::assemble(entry, listing)))
}
