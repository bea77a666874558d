//! QR scan action resolver
//!
//! The printed code carries nothing but the equipment id; the same label is
//! scanned to hand a device out and to take it back. Which of the two the
//! scan means is decided here, from the ledger, on every scan. The result is
//! advisory only: a stale read is harmless because opening and closing a
//! loan each re-check the ledger atomically.

use crate::{
    api::equipment::ScanResolution,
    error::AppResult,
    models::{enums::ScanAction, loan::Loan},
    repository::Repository,
};

/// The scan decision itself: an active loan means the device is coming back.
pub fn action_for(active_loan: Option<&Loan>) -> ScanAction {
    match active_loan {
        Some(_) => ScanAction::Return,
        None => ScanAction::Lend,
    }
}

#[derive(Clone)]
pub struct ResolverService {
    repository: Repository,
}

impl ResolverService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Resolve a scanned equipment id to the next action
    pub async fn resolve(&self, equipment_id: i32) -> AppResult<ScanResolution> {
        let equipment = self.repository.equipment.get_by_id(equipment_id).await?;
        let active_loan = self.repository.loans.get_active_for(equipment_id).await?;
        let action = action_for(active_loan.as_ref());

        // Worker name pre-fills the return sheet
        let worker_name = match &active_loan {
            Some(loan) => Some(
                self.repository
                    .workers
                    .get_by_rut(&loan.worker_rut)
                    .await?
                    .name,
            ),
            None => None,
        };

        Ok(ScanResolution {
            equipment,
            action,
            active_loan,
            worker_name,
        })
    }
}
