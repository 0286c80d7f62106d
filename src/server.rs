//! JSON HTTP API over `NotificationService`.

use crate::dispatch::{DispatchReport, EmergencyType, Priority};
use crate::error::DispatchError;
use crate::i18n::{Language, MetricsReport};
use crate::ledger::DeliveryRecord;
use crate::security::require_api_key;
use crate::service::{JobStatus, NotificationService};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub service: NotificationService,
    pub api_key: Option<Arc<str>>,
}

/// Dispatch request DTO
#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub message: String,
    /// Language codes or English display names
    pub targets: Vec<String>,
    pub source: Option<String>,
    pub priority: Option<Priority>,
    /// Emergency category; implies urgent priority
    pub emergency_type: Option<EmergencyType>,
    /// Capped at the service's retry limit
    pub max_retries: Option<u32>,
}

/// Returned when a job is accepted, cancelled or resumed
#[derive(Debug, Serialize, Deserialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
}

/// Job status response DTO
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DispatchReport>,
}

/// Error response DTO
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// Map a `DispatchError` to its HTTP status and body
fn error_to_response(error: DispatchError) -> ApiError {
    let status = match &error {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        DispatchError::JobNotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::Ledger(_) | DispatchError::LedgerFormat(_) => {
            error!("Internal error: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: error.code().to_string(),
        }),
    )
}

pub fn router(service: NotificationService, api_key: Option<String>) -> Router {
    let state = AppState {
        service,
        api_key: api_key.map(Arc::from),
    };

    Router::new()
        .route("/health", get(health))
        .route("/languages", get(list_languages))
        .route("/metrics", get(metrics))
        .route("/dispatch", post(submit_dispatch))
        .route("/dispatch/:id", get(get_dispatch))
        .route("/dispatch/:id/history", get(history))
        .route("/dispatch/:id/cancel", post(cancel_dispatch))
        .route("/dispatch/:id/resume", post(resume_dispatch))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn list_languages(State(state): State<AppState>) -> Json<Vec<Language>> {
    Json(state.service.list_languages())
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.service.metrics())
}

async fn submit_dispatch(
    State(state): State<AppState>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    let Json(request) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: rejection.body_text(),
                code: "invalid_request".to_string(),
            }),
        )
    })?;

    let service = &state.service;
    let mut options = service.default_options().clone();
    if let Some(source) = request.source.as_deref() {
        let source = service
            .dispatcher()
            .catalog()
            .resolve(source)
            .map_err(error_to_response)?;
        options = options.with_source(source);
    }
    if let Some(priority) = request.priority {
        options = options.with_priority(priority);
    }
    if let Some(emergency_type) = request.emergency_type {
        options = options.with_emergency_type(emergency_type);
    }
    if let Some(max_retries) = request.max_retries {
        options = options.with_max_retries(max_retries);
    }

    let job_id = service
        .submit_dispatch(&request.message, request.targets.as_slice(), options)
        .map_err(error_to_response)?;
    info!("Accepted dispatch {} for {} targets", job_id, request.targets.len());

    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

async fn get_dispatch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobStatusResponse>> {
    let response = match state.service.get_report(job_id).map_err(error_to_response)? {
        JobStatus::Running => JobStatusResponse {
            job_id,
            state: "running",
            report: None,
        },
        JobStatus::Completed(report) => JobStatusResponse {
            job_id,
            state: "completed",
            report: Some(report),
        },
    };
    Ok(Json(response))
}

async fn history(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Vec<DeliveryRecord>>> {
    state
        .service
        .history(job_id)
        .map(Json)
        .map_err(error_to_response)
}

async fn cancel_dispatch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    state.service.cancel(job_id).map_err(error_to_response)?;
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}

async fn resume_dispatch(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<JobAccepted>)> {
    state.service.resume(job_id).map_err(error_to_response)?;
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })))
}
