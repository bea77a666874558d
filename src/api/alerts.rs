//! Alert API endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::alert::Alert};

use super::AuthenticatedUser;

/// Alert list query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct AlertQuery {
    /// Filter by site
    pub site: Option<String>,
}

/// List current alerts, most urgent first
#[utoipa::path(
    get,
    path = "/alerts",
    tag = "alerts",
    security(("bearer_auth" = [])),
    params(AlertQuery),
    responses(
        (status = 200, description = "Derived alerts", body = Vec<Alert>)
    )
)]
pub async fn list_alerts(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<AlertQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    let site = claims.site_scope(query.site.as_deref());
    let alerts = state.services.alerts.list(site).await?;
    Ok(Json(alerts))
}
