//! Loan model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::LoanState;

/// One loan episode: a single piece of equipment handed to a single worker
/// for a bounded period, with condition attested at both ends.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub equipment_id: i32,
    pub worker_rut: String,
    /// Site captured at loan time; the worker may move later
    pub site: String,
    pub created_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub state: LoanState,
    /// Acting user recorded on every state change
    pub changed_by: Option<String>,
    pub handoff_condition_good: bool,
    pub handoff_has_charger: bool,
    pub handoff_notes: Option<String>,
    pub return_at: Option<DateTime<Utc>>,
    pub return_condition_good: Option<bool>,
    pub return_has_charger: Option<bool>,
    pub return_notes: Option<String>,
    /// A charger reported missing at return can be handed in later; this
    /// flag is additive and never rewrites `return_has_charger`
    pub charger_returned_later: bool,
}

impl Loan {
    /// A settled loan still carrying an unresolved problem: bad condition,
    /// or a charger that never came back.
    pub fn has_pending_issue(&self) -> bool {
        self.state == LoanState::Returned
            && (self.return_condition_good == Some(false)
                || (self.return_has_charger == Some(false) && !self.charger_returned_later))
    }

    /// Eligible for record deletion: settled cleanly, nothing left to chase.
    pub fn is_clean_return(&self) -> bool {
        self.state == LoanState::Returned
            && self.return_condition_good == Some(true)
            && (self.return_has_charger == Some(true) || self.charger_returned_later)
    }
}

/// Begin loan request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub equipment_id: i32,
    pub worker_rut: String,
    /// Must match the worker's current site
    pub site: String,
    pub handoff_condition_good: bool,
    pub handoff_has_charger: bool,
    pub handoff_notes: Option<String>,
    /// Defaults to now + the configured due window when omitted
    pub due_at: Option<DateTime<Utc>>,
}

/// Complete return request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnLoan {
    pub return_condition_good: bool,
    pub return_has_charger: bool,
    pub return_notes: Option<String>,
}

/// Loan list query parameters
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LoanQuery {
    pub equipment_id: Option<i32>,
    pub worker_rut: Option<String>,
    pub state: Option<LoanState>,
    pub site: Option<String>,
    /// 1-based page (default 1)
    pub page: Option<i64>,
    /// Page size (default 50, max 500)
    pub per_page: Option<i64>,
}

/// Loan joined with the bits of equipment and worker the alert deriver and
/// list views need
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct LoanWithRefs {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub loan: Loan,
    pub equipment_serial: String,
    pub equipment_category: String,
    pub worker_name: String,
    pub worker_active: bool,
}
