//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Dashboard aggregate response
#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    /// Zero-filled loan counts for the current month, day 1 through today
    pub loans_per_day: Vec<DailyLoans>,
    /// Least-squares trend over `loans_per_day`
    pub trend: TrendLine,
    /// Loans this month by equipment category
    pub loans_by_category: Vec<StatEntry>,
    /// Most-loaned equipment, all time
    pub top_equipment: Vec<TopEquipmentEntry>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_equipment: i64,
    pub equipment_operational: i64,
    pub equipment_maintenance: i64,
    pub equipment_retired: i64,
    pub active_loans: i64,
    pub active_workers: i64,
    pub returned_last_30_days: i64,
    pub pending_alerts: i64,
}

#[derive(Serialize, ToSchema)]
pub struct DailyLoans {
    /// Day of month, 1-based
    pub day: i32,
    pub count: i64,
}

/// Ordinary least squares fit over the daily series
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

#[derive(Serialize, ToSchema)]
pub struct StatEntry {
    /// Label
    pub label: String,
    /// Value
    pub value: i64,
}

#[derive(Serialize, ToSchema)]
pub struct TopEquipmentEntry {
    pub serial: String,
    pub category: String,
    pub loans: i64,
}

/// Dashboard aggregate read
#[utoipa::path(
    get,
    path = "/stats/dashboard",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardResponse)
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<DashboardResponse>> {
    let dashboard = state.services.stats.dashboard().await?;
    Ok(Json(dashboard))
}
