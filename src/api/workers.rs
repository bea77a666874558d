//! Worker API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        alert::Alert,
        loan::LoanWithRefs,
        worker::{CreateWorker, UpdateWorker, Worker, WorkerQuery},
    },
};

use super::AuthenticatedUser;

/// List workers
#[utoipa::path(
    get,
    path = "/workers",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(WorkerQuery),
    responses(
        (status = 200, description = "Worker list", body = Vec<Worker>)
    )
)]
pub async fn list_workers(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(mut query): Query<WorkerQuery>,
) -> AppResult<Json<Vec<Worker>>> {
    // Site managers only ever see their own site
    query.site = claims
        .site_scope(query.site.as_deref())
        .map(str::to_string);
    let workers = state.services.workers.list(&query).await?;
    Ok(Json(workers))
}

/// Get worker by RUT
#[utoipa::path(
    get,
    path = "/workers/{rut}",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(("rut" = String, Path, description = "Worker RUT")),
    responses(
        (status = 200, description = "Worker details", body = Worker),
        (status = 404, description = "Worker not found")
    )
)]
pub async fn get_worker(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(rut): Path<String>,
) -> AppResult<Json<Worker>> {
    let worker = state.services.workers.get(&rut).await?;
    Ok(Json(worker))
}

/// Register worker
#[utoipa::path(
    post,
    path = "/workers",
    tag = "workers",
    security(("bearer_auth" = [])),
    request_body = CreateWorker,
    responses(
        (status = 201, description = "Worker registered", body = Worker),
        (status = 409, description = "RUT already registered")
    )
)]
pub async fn create_worker(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateWorker>,
) -> AppResult<(StatusCode, Json<Worker>)> {
    claims.require_worker_admin()?;
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let worker = state.services.workers.create(data).await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

/// Update worker
#[utoipa::path(
    put,
    path = "/workers/{rut}",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(("rut" = String, Path, description = "Worker RUT")),
    request_body = UpdateWorker,
    responses(
        (status = 200, description = "Worker updated", body = Worker),
        (status = 404, description = "Worker not found")
    )
)]
pub async fn update_worker(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(rut): Path<String>,
    Json(data): Json<UpdateWorker>,
) -> AppResult<Json<Worker>> {
    claims.require_worker_admin()?;
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let worker = state.services.workers.update(&rut, data).await?;
    Ok(Json(worker))
}

/// Terminate a worker. Irreversible through the API; active loans held by
/// the worker start surfacing as urgent alerts.
#[utoipa::path(
    put,
    path = "/workers/{rut}/terminate",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(("rut" = String, Path, description = "Worker RUT")),
    responses(
        (status = 200, description = "Worker terminated", body = Worker),
        (status = 404, description = "Worker not found")
    )
)]
pub async fn terminate_worker(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(rut): Path<String>,
) -> AppResult<Json<Worker>> {
    claims.require_hr()?;
    let worker = state.services.workers.terminate(&rut).await?;
    Ok(Json(worker))
}

/// Loan history of one worker
#[utoipa::path(
    get,
    path = "/workers/{rut}/loans",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(("rut" = String, Path, description = "Worker RUT")),
    responses(
        (status = 200, description = "Worker's loans, newest first", body = Vec<LoanWithRefs>),
        (status = 404, description = "Worker not found")
    )
)]
pub async fn get_worker_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(rut): Path<String>,
) -> AppResult<Json<Vec<LoanWithRefs>>> {
    let loans = state.services.loans.list_for_worker(&rut).await?;
    Ok(Json(loans))
}

/// Unresolved return issues of one worker
#[utoipa::path(
    get,
    path = "/workers/{rut}/alerts",
    tag = "workers",
    security(("bearer_auth" = [])),
    params(("rut" = String, Path, description = "Worker RUT")),
    responses(
        (status = 200, description = "Pending issues for the worker", body = Vec<Alert>),
        (status = 404, description = "Worker not found")
    )
)]
pub async fn get_worker_alerts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(rut): Path<String>,
) -> AppResult<Json<Vec<Alert>>> {
    let alerts = state.services.alerts.for_worker(&rut).await?;
    Ok(Json(alerts))
}
