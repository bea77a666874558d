//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::OperationalState;
use super::loan::Loan;

/// Equipment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    /// Serial number, unique, uppercase. The printed QR label resolves
    /// through this record's id.
    pub serial: String,
    pub brand: String,
    pub model: String,
    /// Open-vocabulary category ("NOTEBOOK", "TABLET", ...); a new string
    /// registers itself on first use
    pub category: String,
    pub operational_state: OperationalState,
    /// RAM in GB
    pub ram_gb: Option<i32>,
    /// Storage in GB
    pub ssd_gb: Option<i32>,
    /// Operating system
    pub os: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Equipment with its loan context, for detail views and the scan flow
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentWithLoan {
    #[serde(flatten)]
    pub equipment: Equipment,
    /// The single active loan, if the equipment is out
    pub active_loan: Option<Loan>,
    /// Most recent returned loan, for comparing conditions at the counter
    pub last_returned_loan: Option<Loan>,
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipment {
    #[validate(length(min = 1, message = "Serial is required"))]
    pub serial: String,
    #[validate(length(min = 1, message = "Brand is required"))]
    pub brand: String,
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    pub operational_state: Option<OperationalState>,
    pub ram_gb: Option<i32>,
    pub ssd_gb: Option<i32>,
    pub os: Option<String>,
    pub notes: Option<String>,
}

/// Update equipment request. The serial is immutable once registered.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEquipment {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub ram_gb: Option<i32>,
    pub ssd_gb: Option<i32>,
    pub os: Option<String>,
    pub notes: Option<String>,
}

/// Set operational state request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetOperationalState {
    pub operational_state: OperationalState,
}

/// Equipment list query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct EquipmentQuery {
    /// Filter by category
    pub category: Option<String>,
    /// Filter by operational state
    pub state: Option<OperationalState>,
    /// Free-text search over serial, brand, model and category
    pub search: Option<String>,
}
