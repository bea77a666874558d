//! Worker model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Worker record. Workers are keyed by RUT, the national identification
/// number, normalized to `NNNNNNNN-D` with an uppercase check digit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Worker {
    pub rut: String,
    pub name: String,
    /// Job site the worker is assigned to
    pub site: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// False once terminated; termination is irreversible through the API
    pub active: bool,
}

/// Create worker request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateWorker {
    #[validate(length(min = 1, message = "RUT is required"))]
    pub rut: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Site is required"))]
    pub site: String,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Update worker request. `active` is deliberately absent: termination goes
/// through its own endpoint and cannot be undone here.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateWorker {
    pub name: Option<String>,
    pub site: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Worker list query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct WorkerQuery {
    /// Filter by site
    pub site: Option<String>,
    /// Filter by active flag
    pub active: Option<bool>,
}
