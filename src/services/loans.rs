//! Loan ledger service
//!
//! Owns the loan lifecycle: IDLE ⇄ ON_LOAN per equipment, with condition
//! capture at both ends. Precondition failures surface immediately and are
//! never retried here; callers re-query and pick a new action.

use chrono::{Duration, Utc};

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::{
        enums::{LoanState, OperationalState},
        loan::{CreateLoan, Loan, LoanQuery, LoanWithRefs, ReturnLoan},
    },
    repository::Repository,
    services::workers::normalize_rut,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, config: LoansConfig) -> Self {
        Self { repository, config }
    }

    /// Begin a loan: the sole IDLE → ON_LOAN transition.
    ///
    /// The already-on-loan check is not done here; the insert itself is the
    /// check, through the ledger's partial unique index, so two simultaneous
    /// scans of an idle device cannot both win.
    pub async fn begin(&self, data: CreateLoan, changed_by: &str) -> AppResult<Loan> {
        let equipment = self.repository.equipment.get_by_id(data.equipment_id).await?;
        if equipment.operational_state == OperationalState::Retired {
            return Err(AppError::Conflict(format!(
                "Equipment {} is retired and cannot be loaned",
                equipment.serial
            )));
        }

        let rut = normalize_rut(&data.worker_rut)?;
        let worker = self.repository.workers.get_by_rut(&rut).await?;
        if !worker.active {
            return Err(AppError::WorkerInactive(format!(
                "Worker {} is terminated",
                worker.rut
            )));
        }
        if data.site.trim() != worker.site {
            return Err(AppError::Validation(format!(
                "Worker {} is assigned to site {}, not {}",
                worker.rut, worker.site, data.site
            )));
        }

        let due_at = data
            .due_at
            .unwrap_or_else(|| Utc::now() + Duration::days(self.config.default_due_days));

        tracing::info!(
            equipment = %equipment.serial,
            worker = %worker.rut,
            by = changed_by,
            "opening loan"
        );

        self.repository
            .loans
            .create(
                data.equipment_id,
                &worker.rut,
                &worker.site,
                data.handoff_condition_good,
                data.handoff_has_charger,
                data.handoff_notes.as_deref(),
                due_at,
                changed_by,
            )
            .await
    }

    /// Complete a return: the sole ON_LOAN → IDLE transition.
    ///
    /// `NotActive` covers both an unknown loan id and a loan somebody else
    /// already returned; the losing caller of a double scan lands here with
    /// nothing mutated.
    pub async fn complete_return(
        &self,
        loan_id: i32,
        data: &ReturnLoan,
        changed_by: &str,
    ) -> AppResult<Loan> {
        tracing::info!(loan = loan_id, by = changed_by, "completing return");
        self.repository
            .loans
            .complete_return(loan_id, data, changed_by)
            .await?
            .ok_or_else(|| AppError::NotActive(format!("Loan {} is not active", loan_id)))
    }

    /// Record that a charger reported missing at return was handed in later.
    /// Purely additive; never rewrites the return attestation.
    pub async fn mark_charger_returned(&self, loan_id: i32, changed_by: &str) -> AppResult<Loan> {
        if let Some(loan) = self
            .repository
            .loans
            .mark_charger_returned(loan_id, changed_by)
            .await?
        {
            return Ok(loan);
        }

        // The conditional update matched nothing; explain why
        match self.repository.loans.find_by_id(loan_id).await? {
            None => Err(AppError::NotActive(format!("Loan {} not found", loan_id))),
            Some(loan) if loan.state != LoanState::Returned => Err(AppError::NotEligible(format!(
                "Loan {} has not been returned yet",
                loan_id
            ))),
            Some(loan) if loan.return_has_charger != Some(false) => Err(AppError::NotEligible(
                format!("Loan {} has no missing charger on record", loan_id),
            )),
            Some(_) => Err(AppError::NotEligible(format!(
                "Charger for loan {} was already marked returned",
                loan_id
            ))),
        }
    }

    /// Delete a settled loan record. Only clean returns qualify: a record
    /// that still feeds an alert cannot be silently purged.
    pub async fn delete_record(&self, loan_id: i32) -> AppResult<()> {
        let loan = self
            .repository
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", loan_id)))?;

        if loan.state != LoanState::Returned {
            return Err(AppError::NotEligible(format!(
                "Loan {} is still active and cannot be deleted",
                loan_id
            )));
        }
        if !loan.is_clean_return() {
            return Err(AppError::NotEligible(format!(
                "Loan {} still has a pending return issue",
                loan_id
            )));
        }

        let deleted = self.repository.loans.delete(loan_id).await?;
        if deleted == 0 {
            return Err(AppError::NotEligible(format!(
                "Loan {} changed state and was not deleted",
                loan_id
            )));
        }
        Ok(())
    }

    pub async fn get(&self, loan_id: i32) -> AppResult<Loan> {
        self.repository
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", loan_id)))
    }

    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanWithRefs>> {
        self.repository.loans.list(query).await
    }

    /// Loan history for one worker, newest first
    pub async fn list_for_worker(&self, rut: &str) -> AppResult<Vec<LoanWithRefs>> {
        let rut = normalize_rut(rut)?;
        // Verify the worker exists so an unknown RUT is a 404, not an empty list
        self.repository.workers.get_by_rut(&rut).await?;
        self.repository.loans.list_for_worker(&rut).await
    }
}
