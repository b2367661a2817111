//! HTTP API for the dashboard: status, history, ingestion, live push,
//! health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::{error, info, warn};
use traffic_core::{
    classify,
    health::{Component, ComponentStatus, HealthRegistry},
    ingest::TopicMessage,
    ClassifyError, DashboardState, HistoryPeriod, IngestError, LiveSnapshot, Metric, Severity,
    TimeWindow,
};

/// Event name used on the live push channel
pub const UPDATE_EVENT: &str = "trafficUpdate";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardState,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(dashboard: DashboardState, health_registry: HealthRegistry) -> Self {
        Self {
            dashboard,
            health_registry,
        }
    }
}

/// Errors returned to API clients as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Ingest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal API error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    window: Option<String>,
}

/// Aggregate over a window; `count` is zero and the rest null when empty
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub window: TimeWindow,
    pub count: usize,
    pub latest: Option<Metric>,
    pub severity: Option<Severity>,
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| ApiError::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<LiveSnapshot> {
    Json(state.dashboard.snapshot().await)
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let period = match query.period.as_deref() {
        Some(p) => p
            .parse::<HistoryPeriod>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => HistoryPeriod::default(),
    };

    Ok(Json(state.dashboard.history(period, Utc::now()).await))
}

async fn aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let window = match query.window.as_deref() {
        Some(w) => w
            .parse::<TimeWindow>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => TimeWindow::Hour,
    };

    let response = match state.dashboard.aggregate(window, Utc::now()).await {
        Ok(result) => {
            let severity = match &result.latest {
                Some(latest) => Some(
                    classify(latest.value, &state.dashboard.thresholds())
                        .map_err(|e| ApiError::Internal(e.to_string()))?,
                ),
                None => None,
            };
            AggregateResponse {
                window,
                count: result.count,
                latest: result.latest,
                severity,
            }
        }
        Err(ClassifyError::EmptyWindow) => AggregateResponse {
            window,
            count: 0,
            latest: None,
            severity: None,
        },
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    Ok(Json(response))
}

async fn alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dashboard.alerts().await)
}

async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TopicMessage>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let message = match body {
        Ok(Json(message)) => message,
        Err(rejection) => {
            let reason = rejection.body_text();
            state
                .health_registry
                .set_degraded(Component::Ingest, format!("malformed message: {}", reason))
                .await;
            return Err(ApiError::BadRequest(reason));
        }
    };

    match state.dashboard.ingest(&message, Utc::now()).await {
        Ok(snapshot) => {
            state.health_registry.set_healthy(Component::Ingest).await;
            Ok((StatusCode::ACCEPTED, Json(snapshot)))
        }
        Err(e) => {
            state
                .health_registry
                .set_degraded(Component::Ingest, format!("{}: {}", message.topic, e))
                .await;
            Err(e.into())
        }
    }
}

fn snapshot_event(snapshot: &LiveSnapshot) -> Result<Event, axum::Error> {
    Event::default().event(UPDATE_EVENT).json_data(snapshot)
}

/// Live snapshot stream: the current snapshot first, then every update
async fn events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.dashboard.subscribe();
    let current = state.dashboard.snapshot().await;
    let health_registry = state.health_registry.clone();
    info!("Live update client connected");

    // Push is degraded from a lag until this client receives a snapshot again
    let mut lagging = false;
    let updates = BroadcastStream::new(receiver).filter_map(move |update| match update {
        Ok(snapshot) => {
            if std::mem::take(&mut lagging) {
                let health_registry = health_registry.clone();
                tokio::spawn(async move {
                    health_registry.set_healthy(Component::Push).await;
                });
            }
            Some(snapshot_event(&snapshot))
        }
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "Live update client lagged, skipping snapshots");
            lagging = true;
            let health_registry = health_registry.clone();
            tokio::spawn(async move {
                health_registry
                    .set_degraded(
                        Component::Push,
                        format!("live client skipped {} snapshots", skipped),
                    )
                    .await;
            });
            None
        }
    });

    Sse::new(tokio_stream::once(snapshot_event(&current)).chain(updates))
        .keep_alive(KeepAlive::default())
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/status", get(status))
        .route("/api/history", get(history))
        .route("/api/aggregate", get(aggregate))
        .route("/api/alerts", get(alerts))
        .route("/api/ingest", post(ingest))
        .route("/api/events", get(events))
        .with_state(state)
}

/// Start the API server and run until a shutdown signal arrives
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    mut shutdown: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    Ok(())
}
