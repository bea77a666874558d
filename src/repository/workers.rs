//! Workers repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::worker::{CreateWorker, UpdateWorker, Worker, WorkerQuery},
};

#[derive(Clone)]
pub struct WorkersRepository {
    pool: Pool<Postgres>,
}

impl WorkersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get worker by RUT
    pub async fn get_by_rut(&self, rut: &str) -> AppResult<Worker> {
        sqlx::query_as::<_, Worker>("SELECT * FROM workers WHERE rut = $1")
            .bind(rut)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", rut)))
    }

    /// List workers with optional filters
    pub async fn list(&self, query: &WorkerQuery) -> AppResult<Vec<Worker>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut idx = 0;

        if query.site.is_some() {
            idx += 1;
            conditions.push(format!("site = ${}", idx));
        }
        if query.active.is_some() {
            idx += 1;
            conditions.push(format!("active = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };
        let sql = format!("SELECT * FROM workers{} ORDER BY name", where_clause);

        let mut builder = sqlx::query_as::<_, Worker>(&sql);
        if let Some(ref site) = query.site {
            builder = builder.bind(site);
        }
        if let Some(active) = query.active {
            builder = builder.bind(active);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    /// Create worker. RUT arrives already normalized by the service.
    pub async fn create(&self, data: &CreateWorker) -> AppResult<Worker> {
        let result = sqlx::query_as::<_, Worker>(
            r#"
            INSERT INTO workers (rut, name, site, phone, email, active)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING *
            "#,
        )
        .bind(&data.rut)
        .bind(&data.name)
        .bind(&data.site)
        .bind(&data.phone)
        .bind(&data.email)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(worker) => Ok(worker),
            Err(sqlx::Error::Database(db)) if db.constraint() == Some("workers_pkey") => Err(
                AppError::Conflict(format!("RUT {} is already registered", data.rut)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Update worker contact details and site assignment
    pub async fn update(&self, rut: &str, data: &UpdateWorker) -> AppResult<Worker> {
        sqlx::query_as::<_, Worker>(
            r#"
            UPDATE workers
            SET name = COALESCE($2, name),
                site = COALESCE($3, site),
                phone = COALESCE($4, phone),
                email = COALESCE($5, email)
            WHERE rut = $1
            RETURNING *
            "#,
        )
        .bind(rut)
        .bind(&data.name)
        .bind(&data.site)
        .bind(&data.phone)
        .bind(&data.email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", rut)))
    }

    /// Mark a worker terminated. There is no inverse operation; the record
    /// stays queryable for history.
    pub async fn terminate(&self, rut: &str) -> AppResult<Worker> {
        sqlx::query_as::<_, Worker>(
            "UPDATE workers SET active = FALSE WHERE rut = $1 RETURNING *",
        )
        .bind(rut)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Worker {} not found", rut)))
    }

    /// Distinct site values across workers and loan history
    pub async fn sites(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT site FROM (
                SELECT site FROM workers
                UNION
                SELECT site FROM loans
            ) s
            ORDER BY site
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
