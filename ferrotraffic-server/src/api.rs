//! HTTP surface: report push, snapshot read-back, routing and health

use std::sync::Arc;

use axum::body::Bytes;
use axum::error_handling::HandleErrorLayer;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use chrono::{DateTime, Utc};
use ferrotraffic_core::prelude::*;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;

pub type Updater = TrafficUpdater<HttpFeedSource, StreetGraph>;

/// Street network dimensions, fixed once the network is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkSize {
    pub nodes: usize,
    pub edges: usize,
}

impl NetworkSize {
    pub fn of(graph: &StreetGraph) -> Self {
        Self {
            nodes: graph.node_count(),
            edges: graph.edge_count(),
        }
    }
}

/// Handlers must not lock the gate on an async worker, `route` reads it
/// from the blocking pool.
#[derive(Clone)]
pub struct AppState {
    pub updater: Arc<Updater>,
    pub network: NetworkSize,
}

impl AppState {
    pub fn new(updater: Arc<Updater>, network: NetworkSize) -> Self {
        Self { updater, network }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/datafeed", post(push_reports))
        .route("/roads", get(roads))
        .route("/route", get(route))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout())
                .concurrency_limit(config.max_concurrent_requests),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("unhandled internal error: {err}"),
        )
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Core(err) => {
                let status = match &err {
                    Error::Parse(_) | Error::InvalidEntry(_) => StatusCode::BAD_REQUEST,
                    Error::UnsupportedPolicy { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::NoPointsFound | Error::Unreachable => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    error!("Request failed: {err}");
                }
                (status, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Applies a pushed batch through the same path as the feed loop
async fn push_reports(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApplyStats>, ApiError> {
    let batch: ReportBatch = serde_json::from_slice(&body).map_err(|e| {
        warn!("Rejected traffic push: {e}");
        ApiError::BadRequest(e.to_string())
    })?;
    info!(entries = batch.len(), "Received traffic data");

    let stats = state.updater.feed(batch).await?;
    Ok(Json(stats))
}

async fn roads(State(state): State<AppState>) -> Response {
    let snapshot = state.updater.snapshot();
    Json(snapshot.as_ref()).into_response()
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
}

async fn route(
    State(state): State<AppState>,
    Query(query): Query<RouteQuery>,
) -> Result<Json<RouteSummary>, ApiError> {
    let from = Point::new(query.from_lat, query.from_lon);
    let to = Point::new(query.to_lat, query.to_lon);
    let gate = state.updater.gate().clone();

    let summary = tokio::task::spawn_blocking(move || {
        let graph = gate.read()?;
        fastest_route(&graph, &from, &to)
    })
    .await
    .map_err(|e| Error::TaskFailed(e.to_string()))??;

    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    #[serde(flatten)]
    network: NetworkSize,
    snapshot_entries: usize,
    last_update: Option<DateTime<Utc>>,
    last_stats: Option<ApplyStats>,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let last = state.updater.last_update();

    Json(Health {
        status: "ok",
        network: state.network,
        snapshot_entries: state.updater.snapshot().len(),
        last_update: last.as_ref().map(|summary| summary.applied_at),
        last_stats: last.map(|summary| summary.stats.clone()),
    })
}
