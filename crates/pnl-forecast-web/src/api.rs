use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pnl_forecast::{
    AggregateRequest, CopyReport, CopyRequest, FillReport, FillRequest, ReconcileError,
    SectionAggregate,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub struct ApiError {
    status: StatusCode,
    error: String,
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        let status = match &err {
            ReconcileError::VersionNotFound { .. } => StatusCode::NOT_FOUND,
            ReconcileError::VersionLocked(_) => StatusCode::CONFLICT,
            ReconcileError::EmptySource(_) | ReconcileError::InvalidActualMonths(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ReconcileError::Store(err) => {
                tracing::error!("Store failure: {err:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError {
            status,
            error: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("{err:#}");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: format!("{err:#}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.error };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn fill_forecast(
    State(state): State<AppState>,
    payload: Result<Json<FillRequest>, JsonRejection>,
) -> Result<Json<FillReport>, ApiError> {
    let Json(request) = payload?;
    let report = pnl_forecast::fill_forecast(state.store.as_ref(), &request).await?;
    if report.updated_count > 0 || report.inserted_count > 0 {
        state.persist()?;
    }
    Ok(Json(report))
}

pub async fn copy_structure(
    State(state): State<AppState>,
    payload: Result<Json<CopyRequest>, JsonRejection>,
) -> Result<Json<CopyReport>, ApiError> {
    let Json(request) = payload?;
    let report = pnl_forecast::copy_structure(state.store.as_ref(), &request).await?;
    if report.inserted_count > 0 || report.reordered_count > 0 {
        state.persist()?;
    }
    Ok(Json(report))
}

pub async fn aggregate(
    State(state): State<AppState>,
    payload: Result<Json<AggregateRequest>, JsonRejection>,
) -> Result<Json<SectionAggregate>, ApiError> {
    let Json(request) = payload?;
    let aggregate = pnl_forecast::aggregate_section(state.store.as_ref(), &request).await?;
    Ok(Json(aggregate))
}
