//! HTTP boundary: job creation, status query, history, and the SSE stream.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use pipeline::StatusRefusal;

use crate::auth;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(create_analysis))
        .route("/status/:job_id", get(job_status))
        .route("/history", get(history))
        .route("/stream/:job_id", get(stream_status))
        .with_state(state)
}

/// Boundary-level error → HTTP status + plain message.
enum ApiError {
    Unauthorized,
    Forbidden,
    NotFound,
    Internal(String),
}

impl From<StatusRefusal> for ApiError {
    fn from(refusal: StatusRefusal) -> Self {
        match refusal {
            StatusRefusal::NotFound => Self::NotFound,
            StatusRefusal::NotAuthorized => Self::Forbidden,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "invalid or missing token".into()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "not authorized for this job".into()),
            Self::NotFound => (StatusCode::NOT_FOUND, "analysis not found".into()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(serde_json::json!({ "detail": message }))).into_response()
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    auth::bearer_token(headers)
        .and_then(|token| state.identity.resolve(token))
        .ok_or(ApiError::Unauthorized)
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    status: &'static str,
    job_id: Uuid,
}

/// Create a job and return immediately; the orchestration run is spawned
/// out-of-band and the client follows progress via /status or /stream.
async fn create_analysis(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers)?;

    let job = state
        .orchestrator
        .create_job(user, &request.url)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let orchestrator = Arc::clone(&state.orchestrator);
    let job_id = job.id;
    tokio::spawn(async move { orchestrator.run(job_id).await });

    info!(%job_id, "analysis dispatched");
    Ok((
        StatusCode::CREATED,
        Json(AnalyzeResponse {
            status: "processing",
            job_id,
        }),
    ))
}

async fn job_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers)?;
    let snapshot = state.publisher.snapshot(job_id, user).await?;
    Ok(Json(snapshot))
}

async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = authenticate(&state, &headers)?;
    Ok(Json(state.publisher.history(user).await))
}

#[derive(Deserialize)]
struct StreamParams {
    /// EventSource clients cannot set headers, so the token may ride in the
    /// query string instead.
    token: Option<String>,
}

/// Map the publisher's channel onto Server-Sent Events. Refusals surface as
/// plain HTTP status codes before any snapshot event is emitted.
async fn stream_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
    Query(params): Query<StreamParams>,
) -> Response {
    let token = params
        .token
        .as_deref()
        .or_else(|| auth::bearer_token(&headers));
    let Some(user) = token.and_then(|t| state.identity.resolve(t)) else {
        return ApiError::Unauthorized.into_response();
    };

    let mut rx = match state.publisher.subscribe(job_id, user).await {
        Ok(rx) => rx,
        Err(refusal) => {
            info!(%job_id, reason = %refusal, "stream refused");
            return ApiError::from(refusal).into_response();
        }
    };

    let stream = async_stream::stream! {
        while let Some(snapshot) = rx.recv().await {
            match Event::default().event("snapshot").json_data(&snapshot) {
                Ok(event) => yield Ok::<_, Infallible>(event),
                Err(err) => {
                    warn!(%job_id, error = %err, "snapshot serialization failed — closing stream");
                    break;
                }
            }
        }
        yield Ok(Event::default().event("close").data("terminal"));
    };

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("heartbeat"),
        )
        .into_response()
}
