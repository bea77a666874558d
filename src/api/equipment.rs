//! Equipment API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::ScanAction,
        equipment::{
            CreateEquipment, Equipment, EquipmentQuery, EquipmentWithLoan, SetOperationalState,
            UpdateEquipment,
        },
        loan::Loan,
    },
};

use super::AuthenticatedUser;

/// What a QR scan of an equipment label resolves to. Recomputed from the
/// ledger on every scan; clients must not cache the action.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResolution {
    pub equipment: Equipment,
    /// Next action for this device: lend it out, or take it back
    pub action: ScanAction,
    /// Present exactly when `action` is `return`
    pub active_loan: Option<Loan>,
    /// Holder of the active loan, for pre-filling the return sheet
    pub worker_name: Option<String>,
}

/// List equipment
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentQuery),
    responses(
        (status = 200, description = "Equipment list", body = Vec<Equipment>)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<Vec<Equipment>>> {
    let equipment = state.services.equipment.list(&query).await?;
    Ok(Json(equipment))
}

/// List equipment that can be handed out right now
#[utoipa::path(
    get,
    path = "/equipment/available",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available equipment", body = Vec<Equipment>)
    )
)]
pub async fn list_available_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Equipment>>> {
    claims.require_tech()?;
    let equipment = state.services.equipment.list_available().await?;
    Ok(Json(equipment))
}

/// Get equipment by ID, with its active and last returned loan
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Equipment details", body = EquipmentWithLoan),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<EquipmentWithLoan>> {
    let equipment = state.services.equipment.get_with_loan(id).await?;
    Ok(Json(equipment))
}

/// Register equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CreateEquipment,
    responses(
        (status = 201, description = "Equipment registered", body = Equipment),
        (status = 409, description = "Serial already registered")
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateEquipment>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    claims.require_tech()?;
    data.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let equipment = state.services.equipment.create(data).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = UpdateEquipment,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<UpdateEquipment>,
) -> AppResult<Json<Equipment>> {
    claims.require_tech()?;
    let equipment = state.services.equipment.update(id, data).await?;
    Ok(Json(equipment))
}

/// Set equipment operational state
#[utoipa::path(
    put,
    path = "/equipment/{id}/state",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    request_body = SetOperationalState,
    responses(
        (status = 200, description = "State updated", body = Equipment),
        (status = 409, description = "Equipment has an active loan")
    )
)]
pub async fn set_equipment_state(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(data): Json<SetOperationalState>,
) -> AppResult<Json<Equipment>> {
    claims.require_tech()?;
    let equipment = state
        .services
        .equipment
        .set_state(id, data.operational_state)
        .await?;
    Ok(Json(equipment))
}

/// Delete equipment without loan history
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 204, description = "Equipment deleted"),
        (status = 409, description = "Loans reference this equipment")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_tech()?;
    state.services.equipment.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a scanned QR label to the next action
#[utoipa::path(
    get,
    path = "/equipment/{id}/scan",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Scan resolution", body = ScanResolution),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn scan_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ScanResolution>> {
    let resolution = state.services.resolver.resolve(id).await?;
    Ok(Json(resolution))
}
