//! Loan ledger repository
//!
//! The "at most one ACTIVE loan per equipment" invariant lives here, enforced
//! by the `loans_one_active_per_equipment` partial unique index. Every state
//! transition is a single SQL statement carrying all of its companion fields,
//! so a loan can never be observed half-written.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanQuery, LoanWithRefs, ReturnLoan},
};

const LOAN_REFS_SELECT: &str = r#"
    SELECT l.*, e.serial AS equipment_serial, e.category AS equipment_category,
           w.name AS worker_name, w.active AS worker_active
    FROM loans l
    JOIN equipment e ON l.equipment_id = e.id
    JOIN workers w ON l.worker_rut = w.rut
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID, if it exists
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(loan)
    }

    /// The single active loan for a piece of equipment, if any
    pub async fn get_active_for(&self, equipment_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE equipment_id = $1 AND state = 'ACTIVE'",
        )
        .bind(equipment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Most recent returned loan for a piece of equipment
    pub async fn last_returned_for(&self, equipment_id: i32) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE equipment_id = $1 AND state = 'RETURNED'
            ORDER BY return_at DESC
            LIMIT 1
            "#,
        )
        .bind(equipment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Whether any loan, active or historical, references the equipment
    pub async fn any_for_equipment(&self, equipment_id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE equipment_id = $1)")
                .bind(equipment_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Open a loan. The insert races against concurrent scans of the same
    /// equipment; the partial unique index decides the winner and the loser
    /// surfaces as a Conflict, never a second ACTIVE row.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        equipment_id: i32,
        worker_rut: &str,
        site: &str,
        handoff_condition_good: bool,
        handoff_has_charger: bool,
        handoff_notes: Option<&str>,
        due_at: DateTime<Utc>,
        changed_by: &str,
    ) -> AppResult<Loan> {
        let result = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                equipment_id, worker_rut, site, created_at, due_at, state, changed_by,
                handoff_condition_good, handoff_has_charger, handoff_notes
            )
            VALUES ($1, $2, $3, $4, $5, 'ACTIVE', $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(equipment_id)
        .bind(worker_rut)
        .bind(site)
        .bind(Utc::now())
        .bind(due_at)
        .bind(changed_by)
        .bind(handoff_condition_good)
        .bind(handoff_has_charger)
        .bind(handoff_notes)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(loan) => Ok(loan),
            Err(sqlx::Error::Database(db))
                if db.constraint() == Some("loans_one_active_per_equipment") =>
            {
                Err(AppError::Conflict(format!(
                    "Equipment {} is already on loan",
                    equipment_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Close a loan. Conditional on `state = 'ACTIVE'`, so a second return of
    /// the same loan matches zero rows and mutates nothing.
    pub async fn complete_return(
        &self,
        loan_id: i32,
        data: &ReturnLoan,
        changed_by: &str,
    ) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET state = 'RETURNED',
                return_at = $2,
                return_condition_good = $3,
                return_has_charger = $4,
                return_notes = $5,
                changed_by = $6
            WHERE id = $1 AND state = 'ACTIVE'
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(Utc::now())
        .bind(data.return_condition_good)
        .bind(data.return_has_charger)
        .bind(&data.return_notes)
        .bind(changed_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Flip the charger-returned-later flag. Conditional on the full
    /// eligibility predicate; `return_has_charger` itself is never rewritten.
    pub async fn mark_charger_returned(
        &self,
        loan_id: i32,
        changed_by: &str,
    ) -> AppResult<Option<Loan>> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET charger_returned_later = TRUE, changed_by = $2
            WHERE id = $1
              AND state = 'RETURNED'
              AND return_has_charger = FALSE
              AND charger_returned_later = FALSE
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(changed_by)
        .fetch_optional(&self.pool)
        .await?;
        Ok(loan)
    }

    /// Delete a loan record. Eligibility is checked by the service; the
    /// state guard here only protects against racing returns.
    pub async fn delete(&self, loan_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM loans WHERE id = $1 AND state = 'RETURNED'")
            .bind(loan_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List loans with filters, newest first
    pub async fn list(&self, query: &LoanQuery) -> AppResult<Vec<LoanWithRefs>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;

        if query.equipment_id.is_some() {
            idx += 1;
            conditions.push(format!("l.equipment_id = ${}", idx));
        }
        if query.worker_rut.is_some() {
            idx += 1;
            conditions.push(format!("l.worker_rut = ${}", idx));
        }
        if query.state.is_some() {
            idx += 1;
            conditions.push(format!("l.state = ${}", idx));
        }
        if query.site.is_some() {
            idx += 1;
            conditions.push(format!("l.site = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let per_page = query.per_page.unwrap_or(50).clamp(1, 500);
        let offset = (query.page.unwrap_or(1).max(1) - 1) * per_page;
        let sql = format!(
            "{}{} ORDER BY l.created_at DESC LIMIT {} OFFSET {}",
            LOAN_REFS_SELECT, where_clause, per_page, offset
        );

        let mut builder = sqlx::query_as::<_, LoanWithRefs>(&sql);
        if let Some(equipment_id) = query.equipment_id {
            builder = builder.bind(equipment_id);
        }
        if let Some(ref worker_rut) = query.worker_rut {
            builder = builder.bind(worker_rut);
        }
        if let Some(state) = query.state {
            builder = builder.bind(state);
        }
        if let Some(ref site) = query.site {
            builder = builder.bind(site);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    /// Full loan history of one worker, newest first
    pub async fn list_for_worker(&self, rut: &str) -> AppResult<Vec<LoanWithRefs>> {
        let sql = format!(
            "{} WHERE l.worker_rut = $1 ORDER BY l.created_at DESC",
            LOAN_REFS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanWithRefs>(&sql)
            .bind(rut)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Every loan joined with its references, for the alert deriver
    pub async fn list_with_refs(&self) -> AppResult<Vec<LoanWithRefs>> {
        let rows = sqlx::query_as::<_, LoanWithRefs>(LOAN_REFS_SELECT)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
