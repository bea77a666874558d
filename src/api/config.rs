//! Vocabulary endpoints
//!
//! Sites and categories are open-vocabulary strings that register themselves
//! on first use; these are plain distinct-values queries, not stored
//! entities.

use axum::{extract::State, Json};

use crate::error::AppResult;

use super::AuthenticatedUser;

/// List distinct site names
#[utoipa::path(
    get,
    path = "/config/sites",
    tag = "config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Known sites", body = Vec<String>)
    )
)]
pub async fn list_sites(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let sites = state.services.workers.sites().await?;
    Ok(Json(sites))
}

/// List distinct equipment categories
#[utoipa::path(
    get,
    path = "/config/categories",
    tag = "config",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Known categories", body = Vec<String>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.equipment.categories().await?;
    Ok(Json(categories))
}
